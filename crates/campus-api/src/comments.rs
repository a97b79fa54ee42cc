//! Handlers for comment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/threads/{id}/comments` | `?cursor&limit`; an unusable cursor is a 400 |
//! | `POST`   | `/threads/{id}/comments` | Body: `{"body"}` |
//! | `DELETE` | `/comments/{id}` | Author only; 404 otherwise |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
};
use campus_core::{
  comment::{Comment, NewComment},
  cursor::{CursorKind, parse_anchor},
  id::{CommentId, ThreadId, UserId},
  page::{Limit, Page},
  store::BoardStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  threads::{Created, ListParams},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
  pub id:         CommentId,
  pub thread_id:  ThreadId,
  pub author_id:  UserId,
  pub body:       String,
  pub up_count:   i64,
  pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentView {
  fn from(c: Comment) -> Self {
    Self {
      id:         c.id,
      thread_id:  c.thread_id,
      author_id:  c.author_id,
      body:       c.body,
      up_count:   c.up_count,
      created_at: c.created_at,
    }
  }
}

/// `GET /threads/{id}/comments[?cursor=<token>&limit=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<CommentView>>, ApiError>
where
  S: BoardStore,
{
  let thread: ThreadId = id.parse()?;
  let Query(params) = params?;
  let anchor = params
    .cursor
    .as_deref()
    .map(|token| parse_anchor(token, CursorKind::Comment))
    .transpose()?;

  let live = state
    .store
    .get_thread(thread.clone())
    .await
    .map_err(ApiError::store)?;
  if live.is_none() {
    return Err(ApiError::not_found("thread"));
  }

  let page = state
    .store
    .list_comments(thread, anchor, Limit::new(params.limit))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page.map(CommentView::from)))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub body: String,
}

/// `POST /threads/{id}/comments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(author): CurrentUser,
  Path(id): Path<String>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Created<CommentId>>), ApiError>
where
  S: BoardStore,
{
  let thread: ThreadId = id.parse()?;
  let Json(body) = body?;
  let input = NewComment::parse(&body.body)?;

  let comment = state
    .store
    .create_comment(author, thread, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(Created { id: comment.id, created_at: comment.created_at })))
}

/// `DELETE /comments/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  let id: CommentId = id.parse()?;
  let deleted = state
    .store
    .soft_delete_comment(id, actor)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::not_found("comment"));
  }
  Ok(StatusCode::NO_CONTENT)
}
