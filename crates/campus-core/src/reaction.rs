//! Reactions: a user's `up` or `save` on a thread or comment.
//!
//! A reaction either exists or it does not. Targets keep denormalised
//! counters (`up_count`, `save_count`) that must always equal the number of
//! matching reaction rows; stores maintain them by incrementing only when an
//! insert actually added a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::{CommentId, ReactionId, ThreadId, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
  Thread,
  Comment,
}

impl TargetType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Thread => "thread",
      Self::Comment => "comment",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
  Up,
  Save,
}

impl ReactionKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Up => "up",
      Self::Save => "save",
    }
  }

  /// `save` only applies to threads.
  pub fn allowed_on(self, target: TargetType) -> bool {
    !matches!((self, target), (Self::Save, TargetType::Comment))
  }
}

/// What a reaction points at. Ids are already format-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
  Thread(ThreadId),
  Comment(CommentId),
}

impl ReactionTarget {
  pub fn target_type(&self) -> TargetType {
    match self {
      Self::Thread(_) => TargetType::Thread,
      Self::Comment(_) => TargetType::Comment,
    }
  }

  pub fn id_str(&self) -> &str {
    match self {
      Self::Thread(id) => id.as_str(),
      Self::Comment(id) => id.as_str(),
    }
  }

  /// Parse a raw target id, failing fast on a malformed or mis-prefixed id.
  pub fn parse(target_type: TargetType, id: &str) -> Result<Self> {
    Ok(match target_type {
      TargetType::Thread => Self::Thread(id.parse()?),
      TargetType::Comment => Self::Comment(id.parse()?),
    })
  }

  /// Reject kinds that make no sense for this target.
  pub fn check_kind(&self, kind: ReactionKind) -> Result<()> {
    if kind.allowed_on(self.target_type()) {
      Ok(())
    } else {
      Err(Error::invalid("kind", "NOT_ALLOWED"))
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
  pub id:          ReactionId,
  pub user_id:     UserId,
  pub target_type: TargetType,
  pub target_id:   String,
  pub kind:        ReactionKind,
  pub created_at:  DateTime<Utc>,
}

/// Result of a react call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactOutcome {
  /// `false` when the user had already reacted; the counter is unchanged.
  pub created: bool,
}
