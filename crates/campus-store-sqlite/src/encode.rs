//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored in the canonical second-precision RFC 3339 form.
//! Ids are stored as their prefixed text. Tags are stored as compact JSON.

use std::str::FromStr;

use campus_core::{
  clock::{format_timestamp, parse_timestamp},
  comment::Comment,
  reaction::{Reaction, ReactionKind, TargetType},
  thread::{Tag, Thread},
  user::Profile,
};
use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { format_timestamp(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  parse_timestamp(s).ok_or_else(|| Error::Decode(format!("bad timestamp: {s:?}")))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

pub fn decode_id<T>(s: String) -> Result<T>
where
  T: FromStr<Err = campus_core::Error>,
{
  s.parse()
    .map_err(|e: campus_core::Error| Error::Decode(e.to_string()))
}

pub fn encode_tags(tags: &[Tag]) -> Result<String> { Ok(serde_json::to_string(tags)?) }

pub fn decode_tags(s: &str) -> Result<Vec<Tag>> { Ok(serde_json::from_str(s)?) }

fn decode_target_type(s: &str) -> Result<TargetType> {
  match s {
    "thread" => Ok(TargetType::Thread),
    "comment" => Ok(TargetType::Comment),
    other => Err(Error::Decode(format!("unknown target type: {other:?}"))),
  }
}

fn decode_kind(s: &str) -> Result<ReactionKind> {
  match s {
    "up" => Ok(ReactionKind::Up),
    "save" => Ok(ReactionKind::Save),
    other => Err(Error::Decode(format!("unknown reaction kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `threads` row.
pub struct RawThread {
  pub id:                String,
  pub author_id:         String,
  pub title:             String,
  pub body:              String,
  pub tags:              String,
  pub up_count:          i64,
  pub save_count:        i64,
  pub solved_comment_id: Option<String>,
  pub created_at:        String,
  pub last_activity_at:  String,
  pub deleted_at:        Option<String>,
}

impl RawThread {
  pub const COLUMNS: &'static str = "id, author_id, title, body, tags, up_count, save_count, \
                             solved_comment_id, created_at, last_activity_at, deleted_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      author_id:         row.get(1)?,
      title:             row.get(2)?,
      body:              row.get(3)?,
      tags:              row.get(4)?,
      up_count:          row.get(5)?,
      save_count:        row.get(6)?,
      solved_comment_id: row.get(7)?,
      created_at:        row.get(8)?,
      last_activity_at:  row.get(9)?,
      deleted_at:        row.get(10)?,
    })
  }

  pub fn into_thread(self) -> Result<Thread> {
    Ok(Thread {
      id:                decode_id(self.id)?,
      author_id:         decode_id(self.author_id)?,
      title:             self.title,
      body:              self.body,
      tags:              decode_tags(&self.tags)?,
      up_count:          self.up_count,
      save_count:        self.save_count,
      solved_comment_id: self.solved_comment_id.map(decode_id).transpose()?,
      created_at:        decode_dt(&self.created_at)?,
      last_activity_at:  decode_dt(&self.last_activity_at)?,
      deleted_at:        decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub id:         String,
  pub thread_id:  String,
  pub author_id:  String,
  pub body:       String,
  pub up_count:   i64,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawComment {
  pub const COLUMNS: &'static str = "id, thread_id, author_id, body, up_count, created_at, deleted_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      thread_id:  row.get(1)?,
      author_id:  row.get(2)?,
      body:       row.get(3)?,
      up_count:   row.get(4)?,
      created_at: row.get(5)?,
      deleted_at: row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         decode_id(self.id)?,
      thread_id:  decode_id(self.thread_id)?,
      author_id:  decode_id(self.author_id)?,
      body:       self.body,
      up_count:   self.up_count,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw values read from the profile columns of a `users` row.
pub struct RawProfile {
  pub id:             String,
  pub faculty:        Option<String>,
  pub year:           Option<i64>,
  pub faculty_public: bool,
  pub year_public:    bool,
  pub created_at:     String,
}

impl RawProfile {
  pub const COLUMNS: &'static str = "id, faculty, year, faculty_public, year_public, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      faculty:        row.get(1)?,
      year:           row.get(2)?,
      faculty_public: row.get(3)?,
      year_public:    row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:        decode_id(self.id)?,
      faculty:        self.faculty,
      year:           self.year,
      faculty_public: self.faculty_public,
      year_public:    self.year_public,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `reactions` row.
pub struct RawReaction {
  pub id:          String,
  pub user_id:     String,
  pub target_type: String,
  pub target_id:   String,
  pub kind:        String,
  pub created_at:  String,
}

impl RawReaction {
  pub const COLUMNS: &'static str = "id, user_id, target_type, target_id, kind, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      user_id:     row.get(1)?,
      target_type: row.get(2)?,
      target_id:   row.get(3)?,
      kind:        row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_reaction(self) -> Result<Reaction> {
    Ok(Reaction {
      id:          decode_id(self.id)?,
      user_id:     decode_id(self.user_id)?,
      target_type: decode_target_type(&self.target_type)?,
      target_id:   self.target_id,
      kind:        decode_kind(&self.kind)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
