//! Handlers for reaction endpoints.
//!
//! Body: `{"kind": "up" | "save"}`. A first reaction answers `204`; a repeat
//! answers `409` and leaves the counter alone.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
};
use campus_core::{
  id::UserId,
  reaction::{ReactionKind, ReactionTarget, TargetType},
  store::BoardStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReactBody {
  pub kind: ReactionKind,
}

/// `POST /threads/{id}/reactions`
pub async fn on_thread<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  body: Result<Json<ReactBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  react(&state, user, TargetType::Thread, &id, body).await
}

/// `POST /comments/{id}/reactions`
pub async fn on_comment<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  body: Result<Json<ReactBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  react(&state, user, TargetType::Comment, &id, body).await
}

async fn react<S>(
  state: &AppState<S>,
  user: UserId,
  target_type: TargetType,
  id: &str,
  body: Result<Json<ReactBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  let target = ReactionTarget::parse(target_type, id)?;
  let Json(ReactBody { kind }) = body?;
  target.check_kind(kind)?;

  let outcome = state
    .store
    .react(user, target, kind)
    .await
    .map_err(ApiError::store)?;
  if !outcome.created {
    return Err(campus_core::Error::Conflict("already reacted").into());
  }
  Ok(StatusCode::NO_CONTENT)
}
