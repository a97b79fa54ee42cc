//! The `BoardStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `campus-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//! Backends own the clock: every timestamp written is taken from it.

use std::future::Future;

use chrono::TimeDelta;

use crate::{
  Classify,
  comment::{Comment, NewComment},
  cursor::Anchor,
  id::{CommentId, ThreadId, UserId},
  page::{Limit, Page},
  reaction::{ReactOutcome, Reaction, ReactionKind, ReactionTarget},
  thread::{NewThread, Thread},
  user::{Profile, ProfileUpdate, Session, User},
};

/// Abstraction over a campus board backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BoardStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Users & sessions ──────────────────────────────────────────────────

  /// Create a fresh student account and a session for it. Only the hash of
  /// the session token is handed to the store.
  fn bootstrap_user(
    &self,
    token_hash: String,
    ttl: TimeDelta,
  ) -> impl Future<Output = Result<(User, Session), Self::Error>> + Send + '_;

  /// Resolve an unexpired session by token hash.
  fn session_user(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<UserId>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Apply a partial update. Fails with `NotFound` for an unknown user.
  fn update_profile(
    &self,
    user: UserId,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  // ── Threads ───────────────────────────────────────────────────────────

  fn create_thread(
    &self,
    author: UserId,
    input: NewThread,
  ) -> impl Future<Output = Result<Thread, Self::Error>> + Send + '_;

  /// `None` when the thread is missing or soft-deleted.
  fn get_thread(
    &self,
    id: ThreadId,
  ) -> impl Future<Output = Result<Option<Thread>, Self::Error>> + Send + '_;

  /// Live threads, newest first, resuming strictly after `anchor`.
  fn list_threads_newest(
    &self,
    anchor: Option<Anchor>,
    limit: Limit,
  ) -> impl Future<Output = Result<Page<Thread>, Self::Error>> + Send + '_;

  /// Returns `false` when nothing changed: missing, already deleted, or not
  /// owned by `actor`.
  fn soft_delete_thread(
    &self,
    id: ThreadId,
    actor: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Fails with `NotFound` when the parent thread is missing or deleted.
  fn create_comment(
    &self,
    author: UserId,
    thread: ThreadId,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Live comments of a thread, oldest first, resuming strictly after
  /// `anchor`.
  fn list_comments(
    &self,
    thread: ThreadId,
    anchor: Option<Anchor>,
    limit: Limit,
  ) -> impl Future<Output = Result<Page<Comment>, Self::Error>> + Send + '_;

  fn soft_delete_comment(
    &self,
    id: CommentId,
    actor: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reactions ─────────────────────────────────────────────────────────

  /// Insert the reaction if absent and bump the matching counter, atomically.
  fn react(
    &self,
    user: UserId,
    target: ReactionTarget,
    kind: ReactionKind,
  ) -> impl Future<Output = Result<ReactOutcome, Self::Error>> + Send + '_;

  fn react_up(
    &self,
    user: UserId,
    target: ReactionTarget,
  ) -> impl Future<Output = Result<ReactOutcome, Self::Error>> + Send + '_ {
    self.react(user, target, ReactionKind::Up)
  }

  fn react_save(
    &self,
    user: UserId,
    thread: ThreadId,
  ) -> impl Future<Output = Result<ReactOutcome, Self::Error>> + Send + '_ {
    self.react(user, ReactionTarget::Thread(thread), ReactionKind::Save)
  }

  /// Every reaction row recorded against `target`, oldest first.
  fn list_reactions(
    &self,
    target: ReactionTarget,
  ) -> impl Future<Output = Result<Vec<Reaction>, Self::Error>> + Send + '_;

  // ── Solve ─────────────────────────────────────────────────────────────

  /// Mark `comment` as the accepted answer of a question thread.
  fn set_solved_comment(
    &self,
    thread: ThreadId,
    actor: UserId,
    comment: CommentId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn clear_solved_comment(
    &self,
    thread: ThreadId,
    actor: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
