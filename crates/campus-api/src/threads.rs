//! Handlers for `/threads` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/threads` | `?cursor&limit`; an unusable cursor restarts from the top |
//! | `POST`   | `/threads` | Body: `{"title", "body"?, "tags"?: [{"key","value"}]}` |
//! | `GET`    | `/threads/{id}` | 404 if missing or deleted |
//! | `DELETE` | `/threads/{id}` | Author only; 404 otherwise |
//! | `POST`   | `/threads/{id}/solve` | Body: `{"commentId": string \| null}` |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
};
use campus_core::{
  cursor::{CursorKind, parse_anchor},
  id::{CommentId, ThreadId, UserId},
  page::{Limit, Page},
  store::BoardStore,
  text,
  thread::{NewThread, Tag, Thread},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Excerpt length on thread cards, in chars.
const EXCERPT_CHARS: usize = 120;

// ─── Views ───────────────────────────────────────────────────────────────────

/// A thread as shown in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadCard {
  pub id:               ThreadId,
  pub author_id:        UserId,
  pub title:            String,
  pub excerpt:          String,
  pub tags:             Vec<Tag>,
  pub up_count:         i64,
  pub saves:            i64,
  /// Hot ranking is not computed; always zero.
  pub heat:             i64,
  pub solved:           bool,
  pub created_at:       DateTime<Utc>,
  pub last_activity_at: DateTime<Utc>,
}

impl From<Thread> for ThreadCard {
  fn from(t: Thread) -> Self {
    Self {
      excerpt:          text::excerpt(&t.body, EXCERPT_CHARS),
      solved:           t.is_solved(),
      id:               t.id,
      author_id:        t.author_id,
      title:            t.title,
      tags:             t.tags,
      up_count:         t.up_count,
      saves:            t.save_count,
      heat:             0,
      created_at:       t.created_at,
      last_activity_at: t.last_activity_at,
    }
  }
}

/// A single thread with its full body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
  pub id:                ThreadId,
  pub author_id:         UserId,
  pub title:             String,
  pub body:              String,
  pub tags:              Vec<Tag>,
  pub is_question:       bool,
  pub up_count:          i64,
  pub save_count:        i64,
  pub solved_comment_id: Option<CommentId>,
  pub created_at:        DateTime<Utc>,
  pub last_activity_at:  DateTime<Utc>,
}

impl From<Thread> for ThreadDetail {
  fn from(t: Thread) -> Self {
    Self {
      is_question:       t.is_question(),
      id:                t.id,
      author_id:         t.author_id,
      title:             t.title,
      body:              t.body,
      tags:              t.tags,
      up_count:          t.up_count,
      save_count:        t.save_count,
      solved_comment_id: t.solved_comment_id,
      created_at:        t.created_at,
      last_activity_at:  t.last_activity_at,
    }
  }
}

/// Body of a `201 Created` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created<I> {
  pub id:         I,
  pub created_at: DateTime<Utc>,
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub cursor: Option<String>,
  #[serde(default, deserialize_with = "saturating_limit")]
  pub limit:  Option<i64>,
}

/// Read `limit` as an integer, saturating values too large for `i64` so they
/// are capped like any other oversized limit.
fn saturating_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(raw) = Option::<String>::deserialize(deserializer)? else {
    return Ok(None);
  };
  let raw = raw.trim();
  let (negative, digits) = match raw.strip_prefix('-') {
    Some(rest) => (true, rest),
    None => (false, raw.strip_prefix('+').unwrap_or(raw)),
  };
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return Err(de::Error::custom(format!("limit: invalid integer `{raw}`")));
  }
  Ok(Some(raw.parse().unwrap_or(if negative { i64::MIN } else { i64::MAX })))
}

/// `GET /threads[?cursor=<token>&limit=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<ThreadCard>>, ApiError>
where
  S: BoardStore,
{
  let Query(params) = params?;
  let anchor = params
    .cursor
    .as_deref()
    .and_then(|token| match parse_anchor(token, CursorKind::Thread) {
      Ok(anchor) => Some(anchor),
      Err(e) => {
        tracing::debug!(error = %e, "ignoring unusable thread cursor");
        None
      }
    });

  let page = state
    .store
    .list_threads_newest(anchor, Limit::new(params.limit))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page.map(ThreadCard::from)))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TagInput {
  pub key:   String,
  pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title: String,
  pub body:  Option<String>,
  #[serde(default)]
  pub tags:  Vec<TagInput>,
}

/// `POST /threads`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(author): CurrentUser,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Created<ThreadId>>), ApiError>
where
  S: BoardStore,
{
  let Json(body) = body?;
  let tags: Vec<(String, String)> = body.tags.into_iter().map(|t| (t.key, t.value)).collect();
  let input = NewThread::parse(&body.title, body.body.as_deref(), &tags)?;

  let thread = state
    .store
    .create_thread(author, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(Created { id: thread.id, created_at: thread.created_at })))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /threads/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<ThreadDetail>, ApiError>
where
  S: BoardStore,
{
  let id: ThreadId = id.parse()?;
  let thread = state
    .store
    .get_thread(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("thread"))?;
  Ok(Json(thread.into()))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /threads/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  let id: ThreadId = id.parse()?;
  let deleted = state
    .store
    .soft_delete_thread(id, actor)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::not_found("thread"));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Solve ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveBody {
  /// `null` clears the accepted answer.
  pub comment_id: Option<String>,
}

/// `POST /threads/{id}/solve`
pub async fn solve<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
  body: Result<Json<SolveBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  let id: ThreadId = id.parse()?;
  let Json(body) = body?;

  let result = match body.comment_id {
    Some(comment) => {
      let comment: CommentId = comment.parse()?;
      state.store.set_solved_comment(id, actor, comment).await
    }
    None => state.store.clear_solved_comment(id, actor).await,
  };
  result.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
