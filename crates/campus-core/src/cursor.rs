//! Opaque pagination cursors.
//!
//! A cursor is a small JSON record, `{v, createdAt, id[, score, snapshotAt]}`,
//! wrapped in unpadded URL-safe base64. Nothing is stored server-side: the
//! record fully describes the anchor position a listing resumes from.
//!
//! Decoding is lenient about unknown fields (they are carried along in
//! [`CursorRecord::extra`]) but strict about the types of known ones.
//! Presence and format of the required fields are checked separately by
//! [`validate`], which reports every problem at once.

use base64::{
  Engine as _,
  alphabet,
  engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  Error, FieldError, Result,
  clock::{format_timestamp, parse_timestamp},
  id::{Prefix, has_prefix},
};

/// Current record schema version.
pub const VERSION: u32 = 1;

/// How long a ranked-listing snapshot stays usable, in hours.
pub const SNAPSHOT_TTL_HOURS: i64 = 24;

/// URL-safe alphabet; never emits padding, accepts it either way.
const CODEC: GeneralPurpose = GeneralPurpose::new(
  &alphabet::URL_SAFE,
  GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ─── Record ──────────────────────────────────────────────────────────────────

/// The decoded form of a cursor token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub v:           Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:          Option<String>,
  /// Rank score; only meaningful for ranked thread listings.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score:       Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub snapshot_at: Option<String>,
  /// Fields this version does not know about, preserved verbatim.
  #[serde(flatten)]
  pub extra:       Map<String, Value>,
}

impl CursorRecord {
  /// A current-version record pointing at `(created_at, id)`.
  pub fn for_position(created_at: DateTime<Utc>, id: &str) -> Self {
    Self {
      v: Some(VERSION),
      created_at: Some(format_timestamp(created_at)),
      id: Some(id.to_owned()),
      ..Self::default()
    }
  }
}

/// Serialise `record` into an opaque token.
pub fn encode(record: &CursorRecord) -> Result<String> {
  let json = serde_json::to_vec(record)?;
  Ok(CODEC.encode(json))
}

/// Reverse of [`encode`].
pub fn decode(token: &str) -> Result<CursorRecord> {
  let bytes = CODEC
    .decode(token)
    .map_err(|e| Error::CursorDecode(format!("not url-safe base64: {e}")))?;
  let value: Value = serde_json::from_slice(&bytes)
    .map_err(|e| Error::CursorDecode(format!("not json: {e}")))?;
  if !value.is_object() {
    return Err(Error::CursorDecode("not a json object".into()));
  }
  serde_json::from_value(value).map_err(|e| Error::CursorDecode(e.to_string()))
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Which listing a cursor is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
  /// Threads, newest first.
  Thread,
  /// Threads in ranked order; requires `score` and `snapshotAt`.
  HotThread,
  /// Comments under a thread, oldest first.
  Comment,
}

impl CursorKind {
  fn prefix(self) -> Prefix {
    match self {
      Self::Thread | Self::HotThread => Prefix::Thread,
      Self::Comment => Prefix::Comment,
    }
  }
}

/// Rank fields carried by ranked-listing cursors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rank {
  pub score:       f64,
  pub snapshot_at: DateTime<Utc>,
}

/// A validated resume position.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
  pub created_at: DateTime<Utc>,
  pub id:         String,
  pub rank:       Option<Rank>,
}

/// Check that `record` carries everything a `kind` listing needs.
///
/// All problems are reported together; nothing is defaulted or repaired.
pub fn validate(record: &CursorRecord, kind: CursorKind) -> Result<Anchor, Vec<FieldError>> {
  let mut errors = Vec::new();

  if record.v.is_some_and(|v| v != VERSION) {
    errors.push(FieldError::new("v", "UNSUPPORTED_VERSION"));
  }

  let created_at = required_timestamp(record.created_at.as_deref(), "createdAt", &mut errors);

  let id = match record.id.as_deref() {
    None => {
      errors.push(FieldError::new("id", "REQUIRED"));
      None
    }
    Some(id) if !has_prefix(id, kind.prefix()) => {
      errors.push(FieldError::new("id", "INVALID_ID"));
      None
    }
    Some(id) => Some(id.to_owned()),
  };

  let rank = if kind == CursorKind::HotThread {
    if record.score.is_none() {
      errors.push(FieldError::new("score", "REQUIRED"));
    }
    let snapshot_at =
      required_timestamp(record.snapshot_at.as_deref(), "snapshotAt", &mut errors);
    record
      .score
      .zip(snapshot_at)
      .map(|(score, snapshot_at)| Rank { score, snapshot_at })
  } else {
    None
  };

  match (created_at, id) {
    (Some(created_at), Some(id)) if errors.is_empty() => Ok(Anchor { created_at, id, rank }),
    _ => Err(errors),
  }
}

fn required_timestamp(
  raw: Option<&str>,
  field: &str,
  errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
  match raw {
    None => {
      errors.push(FieldError::new(field, "REQUIRED"));
      None
    }
    Some(raw) => {
      let parsed = parse_timestamp(raw);
      if parsed.is_none() {
        errors.push(FieldError::new(field, "INVALID_TIMESTAMP"));
      }
      parsed
    }
  }
}

/// Decode and validate a client token in one step.
///
/// Field errors are reported under a `cursor.` prefix.
pub fn parse_anchor(token: &str, kind: CursorKind) -> Result<Anchor> {
  let record = decode(token)?;
  validate(&record, kind).map_err(|fields| {
    Error::Validation(
      fields
        .into_iter()
        .map(|f| FieldError::new(format!("cursor.{}", f.field), f.reason))
        .collect(),
    )
  })
}

/// True when a ranked snapshot is older than [`SNAPSHOT_TTL_HOURS`].
/// Exactly 24 hours old still counts as fresh.
pub fn is_snapshot_expired(snapshot_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  now - snapshot_at > TimeDelta::hours(SNAPSHOT_TTL_HOURS)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  const THREAD: &str = "thr_01ARYZ6S41TSV4RRFFQ69G5FAV";
  const COMMENT: &str = "cmt_01ARYZ6S41TSV4RRFFQ69G5FAV";

  fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, h, m, s).unwrap()
  }

  fn token_of(value: Value) -> String { CODEC.encode(value.to_string()) }

  #[test]
  fn round_trip_preserves_record() {
    let mut record = CursorRecord::for_position(at(12, 0, 0), THREAD);
    record.score = Some(3.5);
    record.snapshot_at = Some("2024-04-01T11:00:00Z".into());
    record.extra.insert("sort".into(), json!("hot"));

    let token = encode(&record).unwrap();
    assert_eq!(decode(&token).unwrap(), record);
  }

  #[test]
  fn tokens_are_url_safe_and_unpadded() {
    // Vary the payload length so every padding remainder occurs.
    for extra in ["", "a", "ab", "abc"] {
      let mut record = CursorRecord::for_position(at(0, 0, 0), THREAD);
      record.extra.insert("pad".into(), json!(extra));
      let token = encode(&record).unwrap();
      assert!(!token.contains(['=', '+', '/']), "{token}");
    }
  }

  #[test]
  fn field_order_is_deterministic() {
    let token = encode(&CursorRecord::for_position(at(9, 30, 0), COMMENT)).unwrap();
    let json = String::from_utf8(CODEC.decode(token).unwrap()).unwrap();
    assert_eq!(json, format!(r#"{{"v":1,"createdAt":"2024-04-01T09:30:00Z","id":"{COMMENT}"}}"#));
  }

  #[test]
  fn decode_accepts_padded_input() {
    let token = encode(&CursorRecord::for_position(at(1, 2, 3), THREAD)).unwrap();
    let padded = format!("{token}{}", "=".repeat((4 - token.len() % 4) % 4));
    assert!(decode(&padded).is_ok());
  }

  #[test]
  fn decode_rejects_garbage() {
    assert!(matches!(decode("***"), Err(Error::CursorDecode(_))));
    assert!(matches!(decode(""), Err(Error::CursorDecode(_))));
    assert!(matches!(decode(&CODEC.encode("not json")), Err(Error::CursorDecode(_))));
    assert!(matches!(decode(&token_of(json!([1, 2]))), Err(Error::CursorDecode(_))));
  }

  #[test]
  fn decode_is_strict_about_known_field_types() {
    let token = token_of(json!({ "v": 1, "createdAt": "2024-04-01T00:00:00Z", "id": 42 }));
    assert!(matches!(decode(&token), Err(Error::CursorDecode(_))));
  }

  #[test]
  fn decode_keeps_unknown_fields() {
    let token = token_of(json!({ "createdAt": "2024-04-01T00:00:00Z", "id": THREAD, "page": 3 }));
    let record = decode(&token).unwrap();
    assert_eq!(record.extra.get("page"), Some(&json!(3)));
    assert!(validate(&record, CursorKind::Thread).is_ok());
  }

  #[test]
  fn validate_reports_every_missing_field() {
    let errors = validate(&CursorRecord::default(), CursorKind::HotThread).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["createdAt", "id", "score", "snapshotAt"]);
  }

  #[test]
  fn validate_checks_version_and_formats() {
    let record = CursorRecord {
      v: Some(2),
      created_at: Some("last tuesday".into()),
      id: Some(COMMENT.into()),
      ..CursorRecord::default()
    };
    let errors = validate(&record, CursorKind::Thread).unwrap_err();
    assert_eq!(errors, vec![
      FieldError::new("v", "UNSUPPORTED_VERSION"),
      FieldError::new("createdAt", "INVALID_TIMESTAMP"),
      FieldError::new("id", "INVALID_ID"),
    ]);
  }

  #[test]
  fn validate_yields_anchor() {
    let record = CursorRecord::for_position(at(8, 0, 0), COMMENT);
    let anchor = validate(&record, CursorKind::Comment).unwrap();
    assert_eq!(anchor, Anchor { created_at: at(8, 0, 0), id: COMMENT.into(), rank: None });
  }

  #[test]
  fn hot_cursor_carries_rank() {
    let mut record = CursorRecord::for_position(at(8, 0, 0), THREAD);
    record.score = Some(12.0);
    record.snapshot_at = Some("2024-04-01T07:00:00Z".into());
    let anchor = validate(&record, CursorKind::HotThread).unwrap();
    assert_eq!(anchor.rank, Some(Rank { score: 12.0, snapshot_at: at(7, 0, 0) }));
  }

  #[test]
  fn parse_anchor_prefixes_field_names() {
    let token = token_of(json!({ "v": 1, "id": THREAD }));
    let err = parse_anchor(&token, CursorKind::Thread).unwrap_err();
    assert_eq!(err.to_string(), "validation failed (1 field error(s))");
    assert!(matches!(err, Error::Validation(f) if f[0].field == "cursor.createdAt"));
  }

  #[test]
  fn snapshot_expiry_boundary() {
    let snapshot = at(0, 0, 0);
    assert!(!is_snapshot_expired(snapshot, snapshot + TimeDelta::hours(24)));
    assert!(is_snapshot_expired(snapshot, snapshot + TimeDelta::hours(24) + TimeDelta::seconds(1)));
    assert!(!is_snapshot_expired(snapshot, snapshot + TimeDelta::hours(1)));
  }
}
