//! Forward-only page assembly for `(created_at, id)` ordered listings.
//!
//! Stores fetch `limit + 1` rows in the listing's total order; the extra row
//! only signals that another page exists and is never returned.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Result,
  cursor::{self, CursorRecord},
};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 200;

/// A page size clamped to `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(u32);

impl Limit {
  /// Clamp a caller-requested size. Oversized requests are capped, not
  /// rejected; a missing value means [`DEFAULT_LIMIT`].
  pub fn new(requested: Option<i64>) -> Self {
    let n = requested.unwrap_or(i64::from(DEFAULT_LIMIT));
    Self(n.clamp(1, i64::from(MAX_LIMIT)) as u32)
  }

  pub fn get(self) -> u32 { self.0 }

  /// Rows to fetch so that "more pages exist" is detectable.
  pub fn overfetch(self) -> u32 { self.0 + 1 }
}

impl Default for Limit {
  fn default() -> Self { Self(DEFAULT_LIMIT) }
}

/// An entity that can anchor a cursor.
pub trait Positioned {
  fn position(&self) -> (DateTime<Utc>, &str);
}

/// One page of results plus the token for the next one, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub next_cursor: Option<String>,
}

impl<T> Page<T> {
  pub fn empty() -> Self { Self { items: Vec::new(), next_cursor: None } }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:       self.items.into_iter().map(f).collect(),
      next_cursor: self.next_cursor,
    }
  }
}

impl<T: Positioned> Page<T> {
  /// Build a page from up to `limit + 1` ordered rows.
  ///
  /// When the extra row is present it is dropped and the cursor is anchored
  /// on the last row actually returned.
  pub fn from_overfetch(mut rows: Vec<T>, limit: Limit) -> Result<Self> {
    let limit = limit.get() as usize;
    if rows.len() <= limit {
      return Ok(Self { items: rows, next_cursor: None });
    }
    rows.truncate(limit);
    let next_cursor = match rows.last() {
      Some(last) => {
        let (created_at, id) = last.position();
        Some(cursor::encode(&CursorRecord::for_position(created_at, id))?)
      }
      None => None,
    };
    Ok(Self { items: rows, next_cursor })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::cursor::{CursorKind, parse_anchor};

  #[derive(Debug, PartialEq)]
  struct Row(DateTime<Utc>, String);

  impl Positioned for Row {
    fn position(&self) -> (DateTime<Utc>, &str) { (self.0, &self.1) }
  }

  fn rows(n: u32) -> Vec<Row> {
    (0..n)
      .map(|i| {
        Row(
          Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, i).unwrap(),
          format!("cmt_01ARYZ6S41TSV4RRFFQ69G5F{:02}", i),
        )
      })
      .collect()
  }

  #[test]
  fn limit_is_clamped() {
    assert_eq!(Limit::new(None).get(), 20);
    assert_eq!(Limit::new(Some(0)).get(), 1);
    assert_eq!(Limit::new(Some(-5)).get(), 1);
    assert_eq!(Limit::new(Some(50)).get(), 50);
    assert_eq!(Limit::new(Some(10_000)).get(), 200);
    assert_eq!(Limit::new(Some(200)).overfetch(), 201);
  }

  #[test]
  fn short_result_is_final_page() {
    let page = Page::from_overfetch(rows(3), Limit::new(Some(3))).unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.next_cursor.is_none());
  }

  #[test]
  fn empty_result_is_empty_final_page() {
    let page = Page::from_overfetch(Vec::<Row>::new(), Limit::default()).unwrap();
    assert_eq!(page, Page::empty());
  }

  #[test]
  fn overfetch_truncates_and_anchors_on_last_returned() {
    let page = Page::from_overfetch(rows(4), Limit::new(Some(3))).unwrap();
    assert_eq!(page.items.len(), 3);

    let token = page.next_cursor.expect("more rows exist");
    let anchor = parse_anchor(&token, CursorKind::Comment).unwrap();
    assert_eq!(anchor.id, page.items[2].1);
    assert_eq!(anchor.created_at, page.items[2].0);
  }
}
