//! Prefixed, time-sortable identifiers.
//!
//! Every id has the form `{prefix}_{suffix}` where the 26-character suffix is
//! a ULID: a 48-bit millisecond timestamp followed by 80 random bits, written
//! in Crockford base32. Suffixes therefore sort lexicographically in creation
//! order (to the millisecond), which lets the id double as the tie-break in
//! `(created_at, id)` orderings.

use std::{
  fmt,
  str::FromStr,
  sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{Error, Result};

/// Crockford base32: digits and upper-case letters without `I L O U`.
pub const ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the ULID suffix.
pub const SUFFIX_LEN: usize = 26;

// ─── Prefix ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
  User,
  Credential,
  Session,
  Thread,
  Comment,
  Attachment,
  Reaction,
}

impl Prefix {
  pub const ALL: [Prefix; 7] = [
    Prefix::User,
    Prefix::Credential,
    Prefix::Session,
    Prefix::Thread,
    Prefix::Comment,
    Prefix::Attachment,
    Prefix::Reaction,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "usr",
      Self::Credential => "cre",
      Self::Session => "ses",
      Self::Thread => "thr",
      Self::Comment => "cmt",
      Self::Attachment => "att",
      Self::Reaction => "rcn",
    }
  }

  /// Mint a fresh id with this prefix.
  pub fn generate(self) -> String { format!("{}_{}", self.as_str(), next_ulid()) }
}

impl FromStr for Prefix {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Prefix::ALL
      .into_iter()
      .find(|p| p.as_str() == s)
      .ok_or_else(|| Error::InvalidPrefix(s.to_owned()))
  }
}

impl fmt::Display for Prefix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Highest millisecond timestamp handed out so far in this process.
static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

fn next_ulid() -> Ulid {
  let wall = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
  // Never step backwards if the wall clock does.
  let millis = LAST_MILLIS.fetch_max(wall, Ordering::Relaxed).max(wall);

  let mut tail = [0u8; 16];
  OsRng.fill_bytes(&mut tail[6..]);
  Ulid::from_parts(millis, u128::from_be_bytes(tail))
}

/// Generate an id for a textual prefix; fails for prefixes outside the set.
pub fn generate(prefix: &str) -> Result<String> {
  Ok(prefix.parse::<Prefix>()?.generate())
}

/// Check the overall shape of an id: known prefix, `_`, 26 alphabet chars.
pub fn is_valid(id: &str) -> bool { split_valid(id).is_some() }

fn split_valid(id: &str) -> Option<Prefix> {
  let (prefix, suffix) = id.split_once('_')?;
  let prefix = prefix.parse::<Prefix>().ok()?;
  let shaped = suffix.len() == SUFFIX_LEN
    && suffix.bytes().all(|b| ALPHABET.as_bytes().contains(&b));
  shaped.then_some(prefix)
}

/// True when `id` is well-formed and carries `prefix`.
pub fn has_prefix(id: &str, prefix: Prefix) -> bool { split_valid(id) == Some(prefix) }

// ─── Typed ids ───────────────────────────────────────────────────────────────

macro_rules! typed_id {
  ($(#[$meta:meta])* $name:ident => $prefix:expr) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(try_from = "String", into = "String")]
    pub struct $name(String);

    impl $name {
      pub const PREFIX: Prefix = $prefix;

      pub fn generate() -> Self { Self(Self::PREFIX.generate()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl FromStr for $name {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self> {
        if has_prefix(s, Self::PREFIX) {
          Ok(Self(s.to_owned()))
        } else {
          Err(Error::InvalidId(s.to_owned()))
        }
      }
    }

    impl TryFrom<String> for $name {
      type Error = Error;

      fn try_from(s: String) -> Result<Self> {
        if has_prefix(&s, Self::PREFIX) { Ok(Self(s)) } else { Err(Error::InvalidId(s)) }
      }
    }

    impl From<$name> for String {
      fn from(id: $name) -> String { id.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
    }
  };
}

typed_id!(
  /// A user account (`usr_…`).
  UserId => Prefix::User
);
typed_id!(
  /// A bearer session (`ses_…`).
  SessionId => Prefix::Session
);
typed_id!(
  /// A discussion thread (`thr_…`).
  ThreadId => Prefix::Thread
);
typed_id!(
  /// A comment under a thread (`cmt_…`).
  CommentId => Prefix::Comment
);
typed_id!(
  /// A single reaction row (`rcn_…`).
  ReactionId => Prefix::Reaction
);

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn generated_ids_are_valid_for_every_prefix() {
    for prefix in Prefix::ALL {
      let id = generate(prefix.as_str()).unwrap();
      assert!(is_valid(&id), "{id}");
      assert_eq!(id.len(), prefix.as_str().len() + 1 + SUFFIX_LEN);
      assert!(id.starts_with(&format!("{prefix}_")));
    }
  }

  #[test]
  fn thousand_ids_are_distinct() {
    let ids: HashSet<String> = (0..1000).map(|_| Prefix::Thread.generate()).collect();
    assert_eq!(ids.len(), 1000);
  }

  #[test]
  fn later_ids_sort_after_earlier_ones_across_milliseconds() {
    let first = Prefix::Comment.generate();
    std::thread::sleep(std::time::Duration::from_millis(3));
    let second = Prefix::Comment.generate();
    assert!(first < second);
  }

  #[test]
  fn unknown_prefix_is_rejected() {
    assert!(matches!(generate("abc"), Err(Error::InvalidPrefix(p)) if p == "abc"));
    assert!(matches!(generate(""), Err(Error::InvalidPrefix(_))));
  }

  #[test]
  fn is_valid_checks_shape() {
    let good = "thr_01ARYZ6S41TSV4RRFFQ69G5FAV";
    assert!(is_valid(good));
    // Wrong length.
    assert!(!is_valid("thr_01ARYZ6S41TSV4RRFFQ69G5FA"));
    // Excluded letters and lower case.
    assert!(!is_valid("thr_01ARYZ6S41TSV4RRFFQ69G5FAI"));
    assert!(!is_valid("thr_01ARYZ6S41TSV4RRFFQ69G5FAL"));
    assert!(!is_valid("thr_01aryz6s41tsv4rrffq69g5fav"));
    // Separator and prefix.
    assert!(!is_valid("thr-01ARYZ6S41TSV4RRFFQ69G5FAV"));
    assert!(!is_valid("xyz_01ARYZ6S41TSV4RRFFQ69G5FAV"));
    assert!(!is_valid(""));
  }

  #[test]
  fn typed_ids_check_prefix() {
    let thread: ThreadId = "thr_01ARYZ6S41TSV4RRFFQ69G5FAV".parse().unwrap();
    assert_eq!(thread.as_str(), "thr_01ARYZ6S41TSV4RRFFQ69G5FAV");
    assert!("cmt_01ARYZ6S41TSV4RRFFQ69G5FAV".parse::<ThreadId>().is_err());
    assert!(CommentId::generate().as_str().starts_with("cmt_"));
  }

  #[test]
  fn typed_ids_deserialize_with_validation() {
    let ok: UserId = serde_json::from_str("\"usr_01ARYZ6S41TSV4RRFFQ69G5FAV\"").unwrap();
    assert_eq!(ok.to_string(), "usr_01ARYZ6S41TSV4RRFFQ69G5FAV");
    assert!(serde_json::from_str::<UserId>("\"usr_nope\"").is_err());
  }
}
