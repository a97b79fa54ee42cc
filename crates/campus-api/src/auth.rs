//! Bearer-session extractor and the `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/bootstrap` | Creates a user and returns its session token once |
//! | `GET`  | `/auth/session` | Echoes the authenticated user id |

use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
};
use campus_core::{
  id::UserId,
  store::BoardStore,
  user::{SessionToken, hash_token},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// The user behind a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: BoardStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let user = state
      .store
      .session_user(hash_token(token))
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser(user))
  }
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
  pub user_id:    UserId,
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

/// `POST /auth/bootstrap`
pub async fn bootstrap<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<BootstrapResponse>, ApiError>
where
  S: BoardStore,
{
  let token = SessionToken::generate();
  let (user, session) = state
    .store
    .bootstrap_user(token.hash(), state.config.session_ttl)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user = %user.id, "bootstrapped user");

  Ok(Json(BootstrapResponse {
    user_id:    user.id,
    token:      token.as_str().to_owned(),
    expires_at: session.expires_at,
  }))
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
  pub user_id: UserId,
}

/// `GET /auth/session`
pub async fn session(CurrentUser(user_id): CurrentUser) -> Json<SessionResponse> {
  Json(SessionResponse { user_id })
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn bearer_token_is_extracted() {
    assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("Bearer  abc ")), Some("abc"));
  }

  #[test]
  fn other_schemes_are_ignored() {
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }
}
