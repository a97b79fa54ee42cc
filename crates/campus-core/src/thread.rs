//! Threads and their tag vocabulary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, FieldError, Result,
  id::{CommentId, ThreadId, UserId},
  page::Positioned,
  text,
};

pub const TITLE_MAX: usize = 60;
pub const BODY_MAX: usize = 2000;
pub const TAGS_MAX: usize = 4;

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The closed set of tag keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKey {
  /// Thread kind; value is one of [`KIND_VALUES`].
  #[serde(rename = "種別")]
  Kind,
  /// Free-text place, 1–50 chars.
  #[serde(rename = "場所")]
  Place,
  /// Deadline as `YYYY-MM-DD`.
  #[serde(rename = "締切")]
  Deadline,
  /// Course code, 1–32 chars.
  #[serde(rename = "授業コード")]
  CourseCode,
}

/// Allowed values for [`TagKey::Kind`].
pub const KIND_VALUES: [&str; 4] = ["question", "notice", "recruit", "chat"];

impl TagKey {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Kind => "種別",
      Self::Place => "場所",
      Self::Deadline => "締切",
      Self::CourseCode => "授業コード",
    }
  }

  fn parse(s: &str) -> Option<Self> {
    [Self::Kind, Self::Place, Self::Deadline, Self::CourseCode]
      .into_iter()
      .find(|k| k.as_str() == s)
  }

  fn accepts(self, value: &str) -> bool {
    let len = text::char_len(value);
    match self {
      Self::Kind => KIND_VALUES.contains(&value),
      Self::Place => (1..=50).contains(&len),
      Self::CourseCode => (1..=32).contains(&len),
      Self::Deadline => {
        value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub key:   TagKey,
  pub value: String,
}

impl Tag {
  /// Validate a raw key/value pair against the vocabulary.
  pub fn parse(key: &str, value: &str) -> Result<Self, &'static str> {
    let key = TagKey::parse(key).ok_or("UNKNOWN_KEY")?;
    if !key.accepts(value) {
      return Err("INVALID_VALUE");
    }
    Ok(Self { key, value: value.to_owned() })
  }
}

// ─── Thread ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
  pub id:                ThreadId,
  pub author_id:         UserId,
  pub title:             String,
  pub body:              String,
  pub tags:              Vec<Tag>,
  pub up_count:          i64,
  pub save_count:        i64,
  pub solved_comment_id: Option<CommentId>,
  pub created_at:        DateTime<Utc>,
  pub last_activity_at:  DateTime<Utc>,
  pub deleted_at:        Option<DateTime<Utc>>,
}

impl Thread {
  /// Question threads are the ones tagged `種別=question`.
  pub fn is_question(&self) -> bool {
    self
      .tags
      .iter()
      .any(|t| t.key == TagKey::Kind && t.value == "question")
  }

  pub fn is_solved(&self) -> bool { self.solved_comment_id.is_some() }
}

impl Positioned for Thread {
  fn position(&self) -> (DateTime<Utc>, &str) { (self.created_at, self.id.as_str()) }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Validated input for a new thread. Only constructible through
/// [`NewThread::parse`], so stores can trust its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct NewThread {
  title: String,
  body:  String,
  tags:  Vec<Tag>,
}

impl NewThread {
  /// Clean and validate raw input, collecting every field error.
  pub fn parse(title: &str, body: Option<&str>, tags: &[(String, String)]) -> Result<Self> {
    let mut errors = Vec::new();

    let title = text::clean(title);
    match text::char_len(&title) {
      0 => errors.push(FieldError::new("title", "REQUIRED")),
      n if n > TITLE_MAX => errors.push(FieldError::new("title", "TOO_LONG")),
      _ => {}
    }

    let body = text::clean(body.unwrap_or_default());
    if text::char_len(&body) > BODY_MAX {
      errors.push(FieldError::new("body", "TOO_LONG"));
    }

    if tags.len() > TAGS_MAX {
      errors.push(FieldError::new("tags", "TOO_MANY"));
    }
    let mut parsed: Vec<Tag> = Vec::with_capacity(tags.len());
    for (i, (key, value)) in tags.iter().enumerate() {
      match Tag::parse(key, value) {
        Ok(tag) if parsed.iter().any(|t| t.key == tag.key) => {
          errors.push(FieldError::new(format!("tags[{i}].key"), "DUPLICATE"));
        }
        Ok(tag) => parsed.push(tag),
        Err(reason) => {
          let field = if reason == "UNKNOWN_KEY" { "key" } else { "value" };
          errors.push(FieldError::new(format!("tags[{i}].{field}"), reason));
        }
      }
    }

    if errors.is_empty() {
      Ok(Self { title, body, tags: parsed })
    } else {
      Err(Error::Validation(errors))
    }
  }

  pub fn title(&self) -> &str { &self.title }

  pub fn body(&self) -> &str { &self.body }

  pub fn tags(&self) -> &[Tag] { &self.tags }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tag(k: &str, v: &str) -> (String, String) { (k.to_owned(), v.to_owned()) }

  #[test]
  fn parse_cleans_title_and_body() {
    let input = NewThread::parse("  Where is\u{7} room 101? ", Some(" ok \u{0}"), &[]).unwrap();
    assert_eq!(input.title(), "Where is room 101?");
    assert_eq!(input.body(), "ok");
    assert!(input.tags().is_empty());
  }

  #[test]
  fn title_length_is_bounded() {
    let err = NewThread::parse(" \u{1} ", None, &[]).unwrap_err();
    assert!(matches!(err, Error::Validation(f) if f == [FieldError::new("title", "REQUIRED")]));

    let long = "あ".repeat(61);
    assert!(NewThread::parse(&long, None, &[]).is_err());
    assert!(NewThread::parse(&"あ".repeat(60), None, &[]).is_ok());
  }

  #[test]
  fn body_length_is_bounded() {
    assert!(NewThread::parse("t", Some(&"x".repeat(2000)), &[]).is_ok());
    assert!(NewThread::parse("t", Some(&"x".repeat(2001)), &[]).is_err());
  }

  #[test]
  fn tags_follow_vocabulary() {
    let ok = NewThread::parse("t", None, &[
      tag("種別", "question"),
      tag("場所", "中央図書館"),
      tag("締切", "2024-07-31"),
      tag("授業コード", "CS101"),
    ])
    .unwrap();
    assert_eq!(ok.tags().len(), 4);

    let err = NewThread::parse("t", None, &[
      tag("種別", "rant"),
      tag("color", "red"),
      tag("締切", "31/07/2024"),
    ])
    .unwrap_err();
    let Error::Validation(fields) = err else { panic!("expected validation error") };
    assert_eq!(fields, vec![
      FieldError::new("tags[0].value", "INVALID_VALUE"),
      FieldError::new("tags[1].key", "UNKNOWN_KEY"),
      FieldError::new("tags[2].value", "INVALID_VALUE"),
    ]);
  }

  #[test]
  fn duplicate_and_excess_tags_are_rejected() {
    let dup = NewThread::parse("t", None, &[tag("種別", "chat"), tag("種別", "notice")]);
    assert!(matches!(dup, Err(Error::Validation(f)) if f[0].reason == "DUPLICATE"));

    let five = vec![tag("場所", "a"); 5];
    let err = NewThread::parse("t", None, &five).unwrap_err();
    assert!(matches!(err, Error::Validation(f) if f[0] == FieldError::new("tags", "TOO_MANY")));
  }

  #[test]
  fn question_classification_uses_kind_tag() {
    let mut thread = Thread {
      id:                ThreadId::generate(),
      author_id:         UserId::generate(),
      title:             "How do I register?".into(),
      body:              String::new(),
      tags:              vec![],
      up_count:          0,
      save_count:        0,
      solved_comment_id: None,
      created_at:        Utc::now(),
      last_activity_at:  Utc::now(),
      deleted_at:        None,
    };
    assert!(!thread.is_question(), "titles alone never classify");
    thread.tags.push(Tag::parse("種別", "question").unwrap());
    assert!(thread.is_question());
  }
}
