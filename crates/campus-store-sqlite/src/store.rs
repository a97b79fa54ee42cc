//! SQLite implementation of [`BoardStore`].

use std::{path::Path, sync::Arc};

use campus_core::{
  Error as CoreError,
  clock::{Clock, SystemClock},
  comment::{Comment, NewComment},
  cursor::Anchor,
  id::{CommentId, ReactionId, SessionId, ThreadId, UserId},
  page::{Limit, Page},
  reaction::{ReactOutcome, Reaction, ReactionKind, ReactionTarget, TargetType},
  store::BoardStore,
  thread::{NewThread, Thread},
  user::{Profile, ProfileUpdate, Session, User},
};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, params};

use crate::{
  Result,
  encode::{RawComment, RawProfile, RawReaction, RawThread, decode_id, encode_dt, encode_tags},
  retry::{ID_ATTEMPTS, with_fresh_id},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A campus board backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and clock are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

/// What a write closure observed. Mapped to domain errors once back on the
/// async side.
enum Outcome<T> {
  Done(T),
  Missing,
  IdExhausted,
}

impl<T> Outcome<T> {
  fn into_result(self, what: &'static str) -> Result<T> {
    match self {
      Self::Done(value) => Ok(value),
      Self::Missing => Err(CoreError::NotFound(what).into()),
      Self::IdExhausted => Err(CoreError::IdCollision(what).into()),
    }
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the time source used for every written timestamp.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn now(&self) -> DateTime<Utc> { self.clock.now() }

  /// Load a live thread and check that `actor` may change it.
  async fn owned_thread(&self, id: ThreadId, actor: &UserId) -> Result<Thread> {
    let thread = self
      .get_thread(id)
      .await?
      .ok_or(CoreError::NotFound("thread"))?;
    if &thread.author_id != actor {
      return Err(CoreError::Forbidden("only the author can change the solution").into());
    }
    Ok(thread)
  }
}

/// The table and counter column a reaction bumps.
fn counter_column(target: TargetType, kind: ReactionKind) -> (&'static str, &'static str) {
  match (target, kind) {
    (TargetType::Thread, ReactionKind::Up) => ("threads", "up_count"),
    (TargetType::Thread, ReactionKind::Save) => ("threads", "save_count"),
    // `save` on comments never gets this far; see `ReactionTarget::check_kind`.
    (TargetType::Comment, _) => ("comments", "up_count"),
  }
}

/// Query answering whether a reaction target is live. A comment also needs
/// its thread to be live.
fn live_target_query(target: TargetType) -> &'static str {
  match target {
    TargetType::Thread => {
      "SELECT EXISTS(SELECT 1 FROM threads WHERE id = ?1 AND deleted_at IS NULL)"
    }
    TargetType::Comment => {
      "SELECT EXISTS(
         SELECT 1 FROM comments c JOIN threads t ON t.id = c.thread_id
         WHERE c.id = ?1 AND c.deleted_at IS NULL AND t.deleted_at IS NULL)"
    }
  }
}

// ─── BoardStore impl ─────────────────────────────────────────────────────────

impl BoardStore for SqliteStore {
  type Error = crate::Error;

  // ── Users & sessions ──────────────────────────────────────────────────────

  async fn bootstrap_user(&self, token_hash: String, ttl: TimeDelta) -> Result<(User, Session)> {
    let created_at = self.now();
    let expires_at = created_at + ttl;
    let at_str = encode_dt(created_at);
    let exp_str = encode_dt(expires_at);

    let ids = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let user = with_fresh_id(ID_ATTEMPTS, UserId::generate, |id| {
          tx.execute(
            "INSERT INTO users (id, role, created_at) VALUES (?1, 'student', ?2)",
            params![id.as_str(), at_str],
          )
        })?;
        let Some((user_id, _)) = user else {
          return Ok(Outcome::IdExhausted);
        };
        let session = with_fresh_id(ID_ATTEMPTS, SessionId::generate, |id| {
          tx.execute(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id.as_str(), user_id.as_str(), token_hash, exp_str, at_str],
          )
        })?;
        let Some((session_id, _)) = session else {
          return Ok(Outcome::IdExhausted);
        };
        tx.commit()?;
        Ok(Outcome::Done((user_id, session_id)))
      })
      .await?;
    let (user_id, session_id) = ids.into_result("user")?;

    let user = User { id: user_id.clone(), role: "student".to_owned(), created_at };
    let session = Session { id: session_id, user_id, expires_at, created_at };
    Ok((user, session))
  }

  async fn session_user(&self, token_hash: String) -> Result<Option<UserId>> {
    let now = encode_dt(self.now());
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
              params![token_hash, now],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(decode_id).transpose()
  }

  async fn get_profile(&self, user: UserId) -> Result<Option<Profile>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE id = ?1", RawProfile::COLUMNS),
              params![user.as_str()],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  /// An empty `faculty` clears the stored value.
  async fn update_profile(&self, user: UserId, update: ProfileUpdate) -> Result<Profile> {
    let faculty = update.faculty().map(str::to_owned);
    let year = update.year();
    let faculty_public = update.faculty_public();
    let year_public = update.year_public();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE users SET
             faculty        = CASE WHEN ?2 IS NULL THEN faculty ELSE NULLIF(?2, '') END,
             year           = COALESCE(?3, year),
             faculty_public = COALESCE(?4, faculty_public),
             year_public    = COALESCE(?5, year_public)
           WHERE id = ?1",
          params![user.as_str(), faculty, year, faculty_public, year_public],
        )?;
        if changed == 0 {
          return Ok(Outcome::Missing);
        }
        let raw = tx.query_row(
          &format!("SELECT {} FROM users WHERE id = ?1", RawProfile::COLUMNS),
          params![user.as_str()],
          RawProfile::from_row,
        )?;
        tx.commit()?;
        Ok(Outcome::Done(raw))
      })
      .await?;
    raw.into_result("user")?.into_profile()
  }

  // ── Threads ───────────────────────────────────────────────────────────────

  async fn create_thread(&self, author: UserId, input: NewThread) -> Result<Thread> {
    let created_at = self.now();
    let at_str = encode_dt(created_at);
    let tags_str = encode_tags(input.tags())?;
    let title = input.title().to_owned();
    let body = input.body().to_owned();
    let author_str = author.as_str().to_owned();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(with_fresh_id(ID_ATTEMPTS, ThreadId::generate, |id| {
          conn.execute(
            "INSERT INTO threads (id, author_id, title, body, tags, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id.as_str(), author_str, title, body, tags_str, at_str],
          )
        })?)
      })
      .await?;
    let (id, _) = inserted.ok_or(CoreError::IdCollision("thread"))?;
    tracing::debug!(%id, %author, "thread created");

    Ok(Thread {
      id,
      author_id: author,
      title: input.title().to_owned(),
      body: input.body().to_owned(),
      tags: input.tags().to_vec(),
      up_count: 0,
      save_count: 0,
      solved_comment_id: None,
      created_at,
      last_activity_at: created_at,
      deleted_at: None,
    })
  }

  async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM threads WHERE id = ?1 AND deleted_at IS NULL",
                RawThread::COLUMNS
              ),
              params![id.as_str()],
              RawThread::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawThread::into_thread).transpose()
  }

  async fn list_threads_newest(&self, anchor: Option<Anchor>, limit: Limit) -> Result<Page<Thread>> {
    let (after_at, after_id) = match anchor {
      Some(a) => (Some(encode_dt(a.created_at)), Some(a.id)),
      None => (None, None),
    };
    let fetch = limit.overfetch();

    let raws: Vec<RawThread> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM threads
           WHERE deleted_at IS NULL
             AND (?1 IS NULL OR (created_at, id) < (?1, ?2))
           ORDER BY created_at DESC, id DESC
           LIMIT ?3",
          RawThread::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![after_at, after_id, fetch], RawThread::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let threads = raws
      .into_iter()
      .map(RawThread::into_thread)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::from_overfetch(threads, limit)?)
  }

  async fn soft_delete_thread(&self, id: ThreadId, actor: UserId) -> Result<bool> {
    let now = encode_dt(self.now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE threads SET deleted_at = ?1
           WHERE id = ?2 AND author_id = ?3 AND deleted_at IS NULL",
          params![now, id.as_str(), actor.as_str()],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn create_comment(
    &self,
    author: UserId,
    thread: ThreadId,
    input: NewComment,
  ) -> Result<Comment> {
    let created_at = self.now();
    let at_str = encode_dt(created_at);
    let body = input.body().to_owned();
    let author_str = author.as_str().to_owned();
    let thread_str = thread.as_str().to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let live: bool = tx.query_row(
          "SELECT EXISTS(SELECT 1 FROM threads WHERE id = ?1 AND deleted_at IS NULL)",
          params![thread_str],
          |row| row.get(0),
        )?;
        if !live {
          return Ok(Outcome::Missing);
        }
        let inserted = with_fresh_id(ID_ATTEMPTS, CommentId::generate, |id| {
          tx.execute(
            "INSERT INTO comments (id, thread_id, author_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id.as_str(), thread_str, author_str, body, at_str],
          )
        })?;
        let Some((id, _)) = inserted else {
          return Ok(Outcome::IdExhausted);
        };
        tx.execute(
          "UPDATE threads SET last_activity_at = MAX(last_activity_at, ?2) WHERE id = ?1",
          params![thread_str, at_str],
        )?;
        tx.commit()?;
        Ok(Outcome::Done(id))
      })
      .await?;
    let what = if matches!(outcome, Outcome::Missing) { "thread" } else { "comment" };
    let id = outcome.into_result(what)?;

    Ok(Comment {
      id,
      thread_id: thread,
      author_id: author,
      body: input.body().to_owned(),
      up_count: 0,
      created_at,
      deleted_at: None,
    })
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM comments
                 WHERE id = ?1 AND deleted_at IS NULL
                   AND EXISTS(SELECT 1 FROM threads t
                              WHERE t.id = comments.thread_id AND t.deleted_at IS NULL)",
                RawComment::COLUMNS
              ),
              params![id.as_str()],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(
    &self,
    thread: ThreadId,
    anchor: Option<Anchor>,
    limit: Limit,
  ) -> Result<Page<Comment>> {
    let (after_at, after_id) = match anchor {
      Some(a) => (Some(encode_dt(a.created_at)), Some(a.id)),
      None => (None, None),
    };
    let fetch = limit.overfetch();

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM comments
           WHERE thread_id = ?1
             AND deleted_at IS NULL
             AND (?2 IS NULL OR (created_at, id) > (?2, ?3))
           ORDER BY created_at ASC, id ASC
           LIMIT ?4",
          RawComment::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            params![thread.as_str(), after_at, after_id, fetch],
            RawComment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let comments = raws
      .into_iter()
      .map(RawComment::into_comment)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::from_overfetch(comments, limit)?)
  }

  /// Deleting the accepted answer also clears it from its thread.
  async fn soft_delete_comment(&self, id: CommentId, actor: UserId) -> Result<bool> {
    let now = encode_dt(self.now());
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE comments SET deleted_at = ?1
           WHERE id = ?2 AND author_id = ?3 AND deleted_at IS NULL",
          params![now, id.as_str(), actor.as_str()],
        )?;
        if changed > 0 {
          tx.execute(
            "UPDATE threads SET solved_comment_id = NULL WHERE solved_comment_id = ?1",
            params![id.as_str()],
          )?;
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  async fn react(
    &self,
    user: UserId,
    target: ReactionTarget,
    kind: ReactionKind,
  ) -> Result<ReactOutcome> {
    target.check_kind(kind)?;
    let target_type = target.target_type();
    let (table, column) = counter_column(target_type, kind);
    let target_id = target.id_str().to_owned();
    let now = encode_dt(self.now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let live: bool = tx.query_row(
          live_target_query(target_type),
          params![target_id],
          |row| row.get(0),
        )?;
        if !live {
          return Ok(Outcome::Missing);
        }
        let inserted = with_fresh_id(ID_ATTEMPTS, ReactionId::generate, |id| {
          tx.execute(
            "INSERT INTO reactions (id, user_id, target_type, target_id, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, target_type, target_id, kind) DO NOTHING",
            params![
              id.as_str(),
              user.as_str(),
              target_type.as_str(),
              target_id,
              kind.as_str(),
              now
            ],
          )
        })?;
        let Some((_, rows)) = inserted else {
          return Ok(Outcome::IdExhausted);
        };
        let created = rows == 1;
        if created {
          tx.execute(
            &format!("UPDATE {table} SET {column} = {column} + 1 WHERE id = ?1"),
            params![target_id],
          )?;
        }
        tx.commit()?;
        Ok(Outcome::Done(ReactOutcome { created }))
      })
      .await?;

    let what = match (&outcome, target_type) {
      (Outcome::IdExhausted, _) => "reaction",
      (_, TargetType::Thread) => "thread",
      (_, TargetType::Comment) => "comment",
    };
    outcome.into_result(what)
  }

  async fn list_reactions(&self, target: ReactionTarget) -> Result<Vec<Reaction>> {
    let target_type = target.target_type();
    let target_id = target.id_str().to_owned();

    let raws: Vec<RawReaction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM reactions
           WHERE target_type = ?1 AND target_id = ?2
           ORDER BY created_at ASC, id ASC",
          RawReaction::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![target_type.as_str(), target_id], RawReaction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReaction::into_reaction).collect()
  }

  // ── Solve ─────────────────────────────────────────────────────────────────

  async fn set_solved_comment(
    &self,
    thread: ThreadId,
    actor: UserId,
    comment: CommentId,
  ) -> Result<()> {
    let current = self.owned_thread(thread.clone(), &actor).await?;
    if !current.is_question() {
      return Err(CoreError::invalid("thread.tags", "NOT_APPLICABLE").into());
    }

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE threads SET solved_comment_id = ?1
           WHERE id = ?2 AND author_id = ?3 AND deleted_at IS NULL
             AND EXISTS (
               SELECT 1 FROM comments
               WHERE id = ?1 AND thread_id = ?2 AND deleted_at IS NULL
             )",
          params![comment.as_str(), thread.as_str(), actor.as_str()],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::NotFound("comment").into());
    }
    Ok(())
  }

  async fn clear_solved_comment(&self, thread: ThreadId, actor: UserId) -> Result<()> {
    let current = self.owned_thread(thread.clone(), &actor).await?;
    if !current.is_solved() {
      return Err(CoreError::invalid("commentId", "NOT_SET").into());
    }

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE threads SET solved_comment_id = NULL
           WHERE id = ?1 AND author_id = ?2 AND deleted_at IS NULL",
          params![thread.as_str(), actor.as_str()],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::NotFound("thread").into());
    }
    Ok(())
  }
}
