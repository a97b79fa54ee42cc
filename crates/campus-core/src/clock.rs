//! Time source and the canonical timestamp text format.
//!
//! Entity timestamps carry second precision and are rendered as fixed-width
//! RFC 3339 UTC strings (`2024-05-01T09:30:00Z`), so their lexical order is
//! their chronological order.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};

/// A source of "now", injected into stores so tests can pin time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now().trunc_subsecs(0) }
}

/// A manually driven clock for tests.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self { now: Mutex::new(start.trunc_subsecs(0)) }
  }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at.trunc_subsecs(0);
  }

  pub fn advance(&self, by: TimeDelta) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Render a timestamp in the canonical sortable form.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse any RFC 3339 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn canonical_format_is_second_precision_zulu() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    assert_eq!(format_timestamp(at), "2024-05-01T09:30:00Z");
  }

  #[test]
  fn parse_accepts_offsets() {
    let parsed = parse_timestamp("2024-05-01T18:30:00+09:00").unwrap();
    assert_eq!(format_timestamp(parsed), "2024-05-01T09:30:00Z");
    assert!(parse_timestamp("yesterday").is_none());
  }

  #[test]
  fn manual_clock_advances() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    clock.advance(TimeDelta::seconds(90));
    assert_eq!(clock.now(), start + TimeDelta::seconds(90));
  }
}
