//! Handlers for profile endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/me/profile` | Every field plus visibility flags |
//! | `PATCH` | `/me/profile` | Partial; omitted fields are kept |
//! | `GET`   | `/users/{id}/profile` | Private fields are `null` |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
};
use campus_core::{
  id::UserId,
  store::BoardStore,
  user::{Profile, ProfileUpdate, PublicProfile},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
  pub user_id:        UserId,
  pub faculty:        Option<String>,
  pub year:           Option<i64>,
  pub faculty_public: bool,
  pub year_public:    bool,
  pub created_at:     DateTime<Utc>,
}

impl From<Profile> for ProfileView {
  fn from(p: Profile) -> Self {
    Self {
      user_id:        p.user_id,
      faculty:        p.faculty,
      year:           p.year,
      faculty_public: p.faculty_public,
      year_public:    p.year_public,
      created_at:     p.created_at,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
  pub user_id:    UserId,
  pub faculty:    Option<String>,
  pub year:       Option<i64>,
  pub created_at: DateTime<Utc>,
}

impl From<PublicProfile> for PublicProfileView {
  fn from(p: PublicProfile) -> Self {
    Self { user_id: p.user_id, faculty: p.faculty, year: p.year, created_at: p.created_at }
  }
}

/// `GET /me/profile`
pub async fn get_mine<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileView>, ApiError>
where
  S: BoardStore,
{
  let profile = state
    .store
    .get_profile(user)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;
  Ok(Json(profile.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBody {
  pub faculty:        Option<String>,
  pub year:           Option<i64>,
  pub faculty_public: Option<bool>,
  pub year_public:    Option<bool>,
}

/// `PATCH /me/profile`
pub async fn update_mine<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<PatchBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore,
{
  let Json(body) = body?;
  let update =
    ProfileUpdate::parse(body.faculty.as_deref(), body.year, body.faculty_public, body.year_public)?;
  state
    .store
    .update_profile(user, update)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/profile`
pub async fn get_public<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<PublicProfileView>, ApiError>
where
  S: BoardStore,
{
  let user: UserId = id.parse()?;
  let profile = state
    .store
    .get_profile(user)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;
  Ok(Json(profile.public_view().into()))
}
