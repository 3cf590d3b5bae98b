//! Local model store.
//!
//! Durable per-user storage of uploaded model files on SQLite. A store is
//! an explicitly opened handle; clones share the same connection pool.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::{self, DbPool, NewModel, StoredModel, StoredModelSummary};
use crate::models::ModelSource;
use crate::{Error, Result};

/// Handle to the local model store.
#[derive(Clone)]
pub struct LocalModelStore {
    db: DbPool,
}

impl LocalModelStore {
    /// Open (or create) the store at a database path and apply the schema.
    pub async fn open(path: &str) -> Result<Self> {
        let db = db::init_pool(path).await?;
        db::initialize_schema(&db).await?;
        Ok(Self { db })
    }

    /// Fresh, private in-memory store.
    pub async fn in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    /// Read the whole source and store it for `user_id`.
    ///
    /// Returns the record with its newly assigned id. Nothing is written
    /// when reading the source or the insert fails.
    pub async fn persist<S: ModelSource>(&self, source: S, user_id: &str) -> Result<StoredModel> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("owner identifier must not be empty".into()));
        }

        let name = source.name().to_string();
        let file_type = source.mime_type().to_string();
        let declared_size = source.declared_size();

        let data = source
            .into_bytes()
            .await
            .map_err(|e| Error::Storage(sqlx::Error::Io(e)))?;

        if data.len() as u64 != declared_size {
            warn!(
                name = %name,
                declared_size,
                actual_size = data.len(),
                "Upload size differs from declared size, recording actual size"
            );
        }

        let model = db::insert_model(
            &self.db,
            NewModel {
                name,
                file_type,
                data,
                created_at: Utc::now(),
                user_id: user_id.to_string(),
            },
        )
        .await?;

        info!(
            model_id = model.id,
            user_id = %model.user_id,
            size = model.size,
            "Persisted model {}",
            model.name
        );

        Ok(model)
    }

    /// Look up a record by id. `None` when absent.
    pub async fn get(&self, id: i64) -> Result<Option<StoredModel>> {
        let model = db::get_model(&self.db, id).await?;
        debug!(model_id = id, found = model.is_some(), "Model lookup");
        Ok(model)
    }

    /// Metadata of a record by id, without its bytes.
    pub async fn get_summary(&self, id: i64) -> Result<Option<StoredModelSummary>> {
        db::get_model_summary(&self.db, id).await
    }

    /// Every record owned by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredModel>> {
        db::list_user_models(&self.db, user_id).await
    }

    /// Metadata for every record owned by `user_id`, newest first.
    pub async fn list_summaries_for_user(&self, user_id: &str) -> Result<Vec<StoredModelSummary>> {
        db::list_user_model_summaries(&self.db, user_id).await
    }

    /// Remove a record. Deleting an absent id is a no-op returning `false`.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let removed = db::delete_model(&self.db, id).await?;
        if removed {
            info!(model_id = id, "Deleted model");
        } else {
            debug!(model_id = id, "Delete of absent model ignored");
        }
        Ok(removed)
    }

    /// Number of records owned by `user_id`.
    pub async fn count_for_user(&self, user_id: &str) -> Result<i64> {
        db::count_user_models(&self.db, user_id).await
    }

    /// Total bytes stored for `user_id`.
    pub async fn usage_for_user(&self, user_id: &str) -> Result<i64> {
        db::get_user_models_size(&self.db, user_id).await
    }

    /// Check that the underlying database answers.
    pub async fn health_check(&self) -> Result<()> {
        db::health_check(&self.db).await
    }
}
