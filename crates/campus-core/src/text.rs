//! User-supplied text cleaning.

/// Strip ASCII control characters (keeping tab, LF and CR) and trim.
pub fn clean(input: &str) -> String {
  input
    .chars()
    .filter(|c| !is_stripped_control(*c))
    .collect::<String>()
    .trim()
    .to_owned()
}

fn is_stripped_control(c: char) -> bool {
  matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Length in Unicode scalar values.
pub fn char_len(s: &str) -> usize { s.chars().count() }

/// A single-line preview: newlines become spaces, whitespace runs collapse,
/// and anything past `max` chars is cut with a trailing ellipsis.
pub fn excerpt(body: &str, max: usize) -> String {
  let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
  if char_len(&flat) <= max {
    return flat;
  }
  let mut cut: String = flat.chars().take(max).collect();
  cut.push('…');
  cut
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_strips_controls_and_trims() {
    assert_eq!(clean("  he\u{0}llo\u{7F}\tworld\n "), "hello\tworld");
    assert_eq!(clean("\u{1B}\u{0B}"), "");
  }

  #[test]
  fn clean_keeps_newlines_inside() {
    assert_eq!(clean("line one\r\nline two"), "line one\r\nline two");
  }

  #[test]
  fn excerpt_flattens_and_truncates() {
    assert_eq!(excerpt("a\n\nb   c", 120), "a b c");
    assert_eq!(excerpt("あいうえお", 3), "あいう…");
    assert_eq!(excerpt("", 10), "");
  }
}
