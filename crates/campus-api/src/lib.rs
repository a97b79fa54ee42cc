//! JSON REST API for the campus board.
//!
//! Exposes an axum [`Router`] backed by any [`campus_core::store::BoardStore`].
//! TLS and listening are the caller's responsibility; bearer-session auth is
//! handled here by the [`auth::CurrentUser`] extractor.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = campus_api::api_router(AppState::new(store, ApiConfig::default()));
//! ```

pub mod auth;
pub mod comments;
pub mod error;
pub mod profile;
pub mod reactions;
pub mod threads;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{delete, get, post},
};
use campus_core::store::BoardStore;
use chrono::TimeDelta;
use serde_json::{Value, json};
use tower_http::{
  request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
  trace::TraceLayer,
};

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime settings the handlers need.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Lifetime of sessions minted by `POST /auth/bootstrap`.
  pub session_ttl: TimeDelta,
}

impl Default for ApiConfig {
  fn default() -> Self { Self { session_ttl: TimeDelta::hours(168) } }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ApiConfig) -> Self {
    Self { store: Arc::new(store), config: Arc::new(config) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), config: self.config.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type. Every response carries an `x-request-id` header,
/// generated when the request did not bring one.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: BoardStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Auth
    .route("/auth/bootstrap", post(auth::bootstrap::<S>))
    .route("/auth/session", get(auth::session))
    // Threads
    .route("/threads", get(threads::list::<S>).post(threads::create::<S>))
    .route("/threads/{id}", get(threads::get_one::<S>).delete(threads::delete_one::<S>))
    .route("/threads/{id}/solve", post(threads::solve::<S>))
    .route("/threads/{id}/reactions", post(reactions::on_thread::<S>))
    // Comments
    .route("/threads/{id}/comments", get(comments::list::<S>).post(comments::create::<S>))
    .route("/comments/{id}", delete(comments::delete_one::<S>))
    .route("/comments/{id}/reactions", post(reactions::on_comment::<S>))
    // Profiles
    .route("/me/profile", get(profile::get_mine::<S>).patch(profile::update_mine::<S>))
    .route("/users/{id}/profile", get(profile::get_public::<S>))
    .with_state(state)
    .layer(PropagateRequestIdLayer::x_request_id())
    .layer(TraceLayer::new_for_http())
    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
