//! Users, bearer sessions and profiles.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
  Error, FieldError, Result,
  id::{SessionId, UserId},
  text,
};

pub const FACULTY_MAX: usize = 50;
pub const YEAR_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:         UserId,
  pub role:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub id:         SessionId,
  pub user_id:    UserId,
  pub expires_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A freshly minted bearer token. Only its hash is ever persisted.
pub struct SessionToken(String);

impl SessionToken {
  /// 32 random bytes, URL-safe base64 without padding.
  pub fn generate() -> Self {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Self(URL_SAFE_NO_PAD.encode(bytes))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn hash(&self) -> String { hash_token(&self.0) }
}

/// Hex SHA-256 of a presented bearer token.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The owner's view of a profile: every field, plus visibility flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:        UserId,
  pub faculty:        Option<String>,
  pub year:           Option<i64>,
  pub faculty_public: bool,
  pub year_public:    bool,
  pub created_at:     DateTime<Utc>,
}

/// What anyone may see about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
  pub user_id:    UserId,
  pub faculty:    Option<String>,
  pub year:       Option<i64>,
  pub created_at: DateTime<Utc>,
}

impl Profile {
  pub fn public_view(&self) -> PublicProfile {
    PublicProfile {
      user_id:    self.user_id.clone(),
      faculty:    self.faculty.clone().filter(|_| self.faculty_public),
      year:       self.year.filter(|_| self.year_public),
      created_at: self.created_at,
    }
  }
}

/// A partial profile update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
  faculty:        Option<String>,
  year:           Option<i64>,
  faculty_public: Option<bool>,
  year_public:    Option<bool>,
}

impl ProfileUpdate {
  pub fn parse(
    faculty: Option<&str>,
    year: Option<i64>,
    faculty_public: Option<bool>,
    year_public: Option<bool>,
  ) -> Result<Self> {
    let mut errors = Vec::new();
    let faculty = faculty.map(text::clean);
    if faculty.as_deref().is_some_and(|f| text::char_len(f) > FACULTY_MAX) {
      errors.push(FieldError::new("faculty", "TOO_LONG"));
    }
    if year.is_some_and(|y| !YEAR_RANGE.contains(&y)) {
      errors.push(FieldError::new("year", "OUT_OF_RANGE"));
    }
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }
    Ok(Self { faculty, year, faculty_public, year_public })
  }

  pub fn faculty(&self) -> Option<&str> { self.faculty.as_deref() }

  pub fn year(&self) -> Option<i64> { self.year }

  pub fn faculty_public(&self) -> Option<bool> { self.faculty_public }

  pub fn year_public(&self) -> Option<bool> { self.year_public }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_random_and_hash_stably() {
    let a = SessionToken::generate();
    let b = SessionToken::generate();
    assert_ne!(a.as_str(), b.as_str());
    assert_eq!(a.as_str().len(), 43);
    assert_eq!(a.hash(), hash_token(a.as_str()));
    assert_eq!(a.hash().len(), 64);
  }

  #[test]
  fn public_view_respects_flags() {
    let profile = Profile {
      user_id:        UserId::generate(),
      faculty:        Some("工学部".into()),
      year:           Some(2),
      faculty_public: true,
      year_public:    false,
      created_at:     Utc::now(),
    };
    let public = profile.public_view();
    assert_eq!(public.faculty.as_deref(), Some("工学部"));
    assert_eq!(public.year, None);
  }

  #[test]
  fn update_is_validated() {
    assert!(ProfileUpdate::parse(Some("理学部"), Some(4), None, Some(true)).is_ok());
    let err = ProfileUpdate::parse(Some(&"x".repeat(51)), Some(11), None, None).unwrap_err();
    assert!(matches!(err, Error::Validation(f) if f.len() == 2));
    assert!(ProfileUpdate::parse(None, Some(0), None, None).is_err());
  }
}
