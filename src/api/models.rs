//! Model Routes
//!
//! Upload, listing, download, deletion and promotion of the caller's models.
//! Every handler is scoped to the authenticated user; models owned by
//! someone else answer 404.
//!
//! Routes:
//! - GET /models - List models (newest first)
//! - POST /models - Upload a model (multipart field "file")
//! - GET /models/:id - Model metadata
//! - GET /models/:id/content - Download model bytes
//! - DELETE /models/:id - Delete model (idempotent)
//! - POST /models/:id/promote - Copy model to the remote archive
//! - GET /models/archived - List models promoted to the remote archive

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::StoredModelSummary;
use crate::models::{CurrentUser, ModelUpload};
use crate::services::{ArchivedModel, PromotedModel, Thumbnail, ValidationFailure, MAX_MODEL_SIZE};
use crate::{AppState, Error, Result};

/// Request body ceiling for uploads: the model ceiling plus room for
/// multipart framing, so the validation gate sees the real file size.
pub const UPLOAD_BODY_LIMIT: usize = MAX_MODEL_SIZE as usize + 1024 * 1024;

/// Build model routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_models)
                .post(upload_model)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/archived", get(list_archived_models))
        .route("/:id", get(get_model).delete(delete_model))
        .route("/:id/content", get(download_model))
        .route("/:id/promote", post(promote_model))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Model metadata response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    #[serde(flatten)]
    pub model: StoredModelSummary,
    pub display_size: String,
}

impl From<StoredModelSummary> for ModelResponse {
    fn from(model: StoredModelSummary) -> Self {
        let display_size = model.display_size();
        Self {
            model,
            display_size,
        }
    }
}

/// List models response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    pub models: Vec<ModelResponse>,
    pub total: usize,
    pub total_bytes: i64,
}

/// Archived models response.
#[derive(Debug, Serialize)]
pub struct ListArchivedResponse {
    pub models: Vec<ArchivedModel>,
    pub total: usize,
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub model: ModelResponse,
    /// SHA-256 of the stored bytes, hex encoded.
    pub checksum: String,
    pub message: String,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Promotion request.
#[derive(Debug, Default, Deserialize)]
pub struct PromoteRequest {
    #[serde(default)]
    pub thumbnail: Option<ThumbnailPayload>,
}

/// Thumbnail image, base64 encoded.
#[derive(Debug, Deserialize)]
pub struct ThumbnailPayload {
    pub name: String,
    pub data_base64: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's models.
///
/// GET /models
async fn list_models(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ListModelsResponse>> {
    let models = state.library.models_for(&user.id).await?;
    let total_bytes = models.iter().map(|m| m.size).sum();

    Ok(Json(ListModelsResponse {
        total: models.len(),
        total_bytes,
        models: models.into_iter().map(ModelResponse::from).collect(),
    }))
}

/// Upload a model.
///
/// POST /models
///
/// Accepts multipart/form-data with a single file field named "file".
/// The file's MIME type is stored as sent, possibly empty.
async fn upload_model(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();

        let data = field.bytes().await.map_err(multipart_error)?;
        let checksum = hex::encode(Sha256::digest(&data));

        let model = state
            .library
            .upload(ModelUpload::new(filename, content_type, data.to_vec()), &user.id)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                model: model.summary().into(),
                checksum,
                message: "Model uploaded successfully".into(),
            }),
        ));
    }

    Err(Error::InvalidInput("No file provided".into()))
}

/// Get model metadata.
///
/// GET /models/:id
async fn get_model(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ModelResponse>> {
    let model = state.library.summary_for(id, &user.id).await?;
    Ok(Json(model.into()))
}

/// Download model bytes.
///
/// GET /models/:id/content
///
/// Content-Type is the stored MIME type, or a guess from the file name when
/// the upload did not report one.
async fn download_model(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let model = state.library.model_for(id, &user.id).await?;

    let content_type = if model.file_type.is_empty() {
        mime_guess::from_path(&model.name)
            .first_or_octet_stream()
            .to_string()
    } else {
        model.file_type.clone()
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", model.name.replace('"', "")),
        )
        .header(header::CONTENT_LENGTH, model.data.len())
        .body(Body::from(model.data))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Delete a model.
///
/// DELETE /models/:id
///
/// Deleting an id that no longer exists succeeds with `deleted: false`.
async fn delete_model(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.library.remove(id, &user.id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// List the caller's archived models, newest first.
///
/// GET /models/archived
async fn list_archived_models(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ListArchivedResponse>> {
    let models = state.library.archived_models_for(&user.id).await?;

    Ok(Json(ListArchivedResponse {
        total: models.len(),
        models,
    }))
}

/// Promote a model to the remote archive.
///
/// POST /models/:id/promote
async fn promote_model(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<PromoteRequest>,
) -> Result<Json<PromotedModel>> {
    let thumbnail = request
        .thumbnail
        .map(|t| {
            base64::engine::general_purpose::STANDARD
                .decode(t.data_base64.as_bytes())
                .map(|data| Thumbnail { name: t.name, data })
                .map_err(|e| Error::InvalidInput(format!("Invalid thumbnail data: {}", e)))
        })
        .transpose()?;

    let promoted = state.library.promote(id, &user.id, thumbnail).await?;
    Ok(Json(promoted))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::Validation(ValidationFailure::TooLarge {
            size: UPLOAD_BODY_LIMIT as u64,
            limit: MAX_MODEL_SIZE,
        });
    }
    Error::InvalidInput(format!("Failed to read multipart field: {}", err))
}
