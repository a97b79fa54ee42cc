//! Retry of inserts whose freshly generated primary key already exists.

use rusqlite::ffi;

/// Total attempts, each with a new id, before giving up.
pub const ID_ATTEMPTS: usize = 3;

pub fn is_primary_key_collision(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Run `insert` with ids from `make_id` until one does not collide.
///
/// Returns the id that was used together with `insert`'s value, or `None`
/// when every attempt hit a primary-key collision. Any other error is
/// returned as is.
pub fn with_fresh_id<I, T>(
  attempts: usize,
  mut make_id: impl FnMut() -> I,
  mut insert: impl FnMut(&I) -> rusqlite::Result<T>,
) -> rusqlite::Result<Option<(I, T)>> {
  for attempt in 1..=attempts {
    let id = make_id();
    match insert(&id) {
      Ok(value) => return Ok(Some((id, value))),
      Err(e) if is_primary_key_collision(&e) => {
        tracing::debug!(attempt, "primary key collision, regenerating id");
      }
      Err(e) => return Err(e),
    }
  }
  Ok(None)
}
