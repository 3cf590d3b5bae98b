//! Account Routes
//!
//! Routes:
//! - GET /me - The authenticated user with a summary of their stored models

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::models::CurrentUser;
use crate::{AppState, Result};

/// Build account routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Current user response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: CurrentUser,
    pub model_count: i64,
    pub storage_bytes: i64,
}

/// GET /me
async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MeResponse>> {
    let store = state.library.store();
    let model_count = store.count_for_user(&user.id).await?;
    let storage_bytes = store.usage_for_user(&user.id).await?;

    Ok(Json(MeResponse {
        user,
        model_count,
        storage_bytes,
    }))
}
