//! API Routes for modelvault
//!
//! This module combines all API routes into a single router.

mod account;
pub mod models;
mod status;

use axum::Router;

use crate::middleware::require_user;
use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /health, /health/ready - Health checks (public)
/// - /me - Current user (token-protected)
/// - /models/* - Model storage (token-protected)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .merge(protected_routes(state))
}

/// Protected routes that require an identity token.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(account::routes())
        .nest("/models", models::routes())
        .layer(axum::middleware::from_fn_with_state(state, require_user))
}
