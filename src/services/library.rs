//! Model library service.
//!
//! Owner-aware operations on top of the local store: every call takes the
//! owner explicitly, runs uploads through the validation gate, and can
//! promote a stored model to the remote archive.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::archive::{archive_path, ArchiveKind, ArchiveRecord, ArchivedModel, ModelArchive};
use super::identity::IdentitySession;
use super::model_store::LocalModelStore;
use super::validation::validate_model_file;
use crate::db::{StoredModel, StoredModelSummary};
use crate::models::{ModelSource, ModelUpload};
use crate::{Error, Result};

/// Thumbnail image sent along with a promotion.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub name: String,
    pub data: Vec<u8>,
}

/// Result of promoting a model to the archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedModel {
    pub record_id: String,
    pub model_url: String,
    pub model_path: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_path: Option<String>,
}

/// Upload, listing and promotion of a user's models.
#[derive(Clone)]
pub struct ModelLibrary {
    store: LocalModelStore,
    archive: Option<Arc<dyn ModelArchive>>,
}

impl ModelLibrary {
    pub fn new(store: LocalModelStore, archive: Option<Arc<dyn ModelArchive>>) -> Self {
        Self { store, archive }
    }

    pub fn store(&self) -> &LocalModelStore {
        &self.store
    }

    pub fn has_archive(&self) -> bool {
        self.archive.is_some()
    }

    fn archive(&self) -> Result<&Arc<dyn ModelArchive>> {
        self.archive
            .as_ref()
            .ok_or_else(|| Error::Remote("archive not configured".into()))
    }

    /// Validate and persist an upload for `user_id`.
    ///
    /// The declared size is checked before reading and the real length
    /// again after, so rejected files never reach the store.
    pub async fn upload<S: ModelSource>(&self, source: S, user_id: &str) -> Result<StoredModel> {
        validate_model_file(source.name(), source.declared_size())?;

        let name = source.name().to_string();
        let mime_type = source.mime_type().to_string();
        let data = source
            .into_bytes()
            .await
            .map_err(|e| Error::Storage(sqlx::Error::Io(e)))?;

        validate_model_file(&name, data.len() as u64)?;

        self.store
            .persist(ModelUpload::new(name, mime_type, data), user_id)
            .await
    }

    /// Upload as whoever is signed in to `session`.
    pub async fn upload_as<S: ModelSource>(
        &self,
        session: &IdentitySession,
        source: S,
    ) -> Result<StoredModel> {
        let user_id = session.require_user_id()?;
        self.upload(source, &user_id).await
    }

    /// Metadata of every model owned by `user_id`, newest first.
    pub async fn models_for(&self, user_id: &str) -> Result<Vec<StoredModelSummary>> {
        self.store.list_summaries_for_user(user_id).await
    }

    /// Metadata of one model, only if owned by `user_id`.
    pub async fn summary_for(&self, id: i64, user_id: &str) -> Result<StoredModelSummary> {
        self.store
            .get_summary(id)
            .await?
            .filter(|m| m.user_id == user_id)
            .ok_or_else(|| not_found(id))
    }

    /// One model with its bytes, only if owned by `user_id`.
    pub async fn model_for(&self, id: i64, user_id: &str) -> Result<StoredModel> {
        self.store
            .get(id)
            .await?
            .filter(|m| m.user_id == user_id)
            .ok_or_else(|| not_found(id))
    }

    /// Delete a model owned by `user_id`.
    ///
    /// Absent ids are a no-op returning `false`. A model owned by someone
    /// else is reported as not found and left in place.
    pub async fn remove(&self, id: i64, user_id: &str) -> Result<bool> {
        match self.store.get_summary(id).await? {
            None => Ok(false),
            Some(model) if model.user_id != user_id => Err(not_found(id)),
            Some(_) => self.store.delete(id).await,
        }
    }

    /// Archived models owned by `user_id`, newest first.
    ///
    /// Records the archive returns for anyone else are dropped.
    pub async fn archived_models_for(&self, user_id: &str) -> Result<Vec<ArchivedModel>> {
        let mut records = self
            .archive()?
            .list_records(user_id)
            .await?
            .into_iter()
            .filter(|m| m.record.user_id == user_id)
            .collect::<Vec<_>>();

        records.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        Ok(records)
    }

    /// Copy a stored model (and optional thumbnail) to the archive and
    /// record its metadata.
    pub async fn promote(
        &self,
        id: i64,
        user_id: &str,
        thumbnail: Option<Thumbnail>,
    ) -> Result<PromotedModel> {
        let archive = self.archive()?;

        let model = self.model_for(id, user_id).await?;
        let timestamp = Utc::now().timestamp_millis();

        let model_path = archive_path(user_id, ArchiveKind::Model, timestamp, &model.name);
        let model_url = archive.upload(model.data, &model_path).await?;

        let (thumbnail_url, thumbnail_path) = match thumbnail {
            Some(thumb) => {
                let path = archive_path(user_id, ArchiveKind::Thumbnail, timestamp, &thumb.name);
                let url = archive.upload(thumb.data, &path).await?;
                (Some(url), Some(path))
            }
            None => (None, None),
        };

        let record_id = archive
            .record_metadata(ArchiveRecord {
                name: model.name.clone(),
                model_url: model_url.clone(),
                model_path: model_path.clone(),
                thumbnail_url: thumbnail_url.clone(),
                thumbnail_path: thumbnail_path.clone(),
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        info!(model_id = id, record_id = %record_id, "Promoted model {}", model.name);

        Ok(PromotedModel {
            record_id,
            model_url,
            model_path,
            thumbnail_url,
            thumbnail_path,
        })
    }
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Model not found: {}", id))
}
