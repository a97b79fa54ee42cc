//! Comments under a thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::{CommentId, ThreadId, UserId},
  page::Positioned,
  text,
};

pub const BODY_MAX: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         CommentId,
  pub thread_id:  ThreadId,
  pub author_id:  UserId,
  pub body:       String,
  pub up_count:   i64,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Positioned for Comment {
  fn position(&self) -> (DateTime<Utc>, &str) { (self.created_at, self.id.as_str()) }
}

/// A validated comment body.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
  body: String,
}

impl NewComment {
  pub fn parse(body: &str) -> Result<Self> {
    let body = text::clean(body);
    match text::char_len(&body) {
      0 => Err(Error::invalid("body", "REQUIRED")),
      n if n > BODY_MAX => Err(Error::invalid("body", "TOO_LONG")),
      _ => Ok(Self { body }),
    }
  }

  pub fn body(&self) -> &str { &self.body }
}
