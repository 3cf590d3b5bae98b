//! Model record queries.
//!
//! Each row holds one uploaded model file together with its owner.
//! Rows are never updated; they are inserted once and deleted by id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::DbPool;
use crate::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Model record from the database, including its bytes.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoredModel {
    pub id: i64,
    pub name: String,
    pub file_type: String,
    pub size: i64,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl StoredModel {
    /// Metadata view of this record.
    pub fn summary(&self) -> StoredModelSummary {
        StoredModelSummary {
            id: self.id,
            name: self.name.clone(),
            file_type: self.file_type.clone(),
            size: self.size,
            created_at: self.created_at,
            user_id: self.user_id.clone(),
        }
    }
}

/// Model record without its bytes, for listings.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredModelSummary {
    pub id: i64,
    pub name: String,
    pub file_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl StoredModelSummary {
    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

/// Input for inserting a model. Has no id: the database assigns one.
#[derive(Debug, Clone)]
pub struct NewModel {
    pub name: String,
    pub file_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

const SUMMARY_COLUMNS: &str = "id, name, file_type, size, created_at, user_id";

// ============================================================================
// Queries
// ============================================================================

/// Insert a model and return it with its assigned id.
///
/// The stored size is always the length of `data`.
pub async fn insert_model(pool: &DbPool, input: NewModel) -> Result<StoredModel> {
    let size = input.data.len() as i64;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO models (name, file_type, size, data, created_at, user_id)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&input.name)
    .bind(&input.file_type)
    .bind(size)
    .bind(&input.data)
    .bind(input.created_at)
    .bind(&input.user_id)
    .fetch_one(pool)
    .await
    .map_err(Error::Storage)?;

    Ok(StoredModel {
        id,
        name: input.name,
        file_type: input.file_type,
        size,
        data: input.data,
        created_at: input.created_at,
        user_id: input.user_id,
    })
}

/// Get a model by ID, `None` when absent.
pub async fn get_model(pool: &DbPool, id: i64) -> Result<Option<StoredModel>> {
    sqlx::query_as::<_, StoredModel>("SELECT * FROM models WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Storage)
}

/// Get a model's metadata by ID without reading its bytes.
pub async fn get_model_summary(pool: &DbPool, id: i64) -> Result<Option<StoredModelSummary>> {
    let query = format!("SELECT {} FROM models WHERE id = ?", SUMMARY_COLUMNS);
    sqlx::query_as::<_, StoredModelSummary>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Storage)
}

/// List every model owned by a user, newest first.
/// Uses idx_models_user index.
pub async fn list_user_models(pool: &DbPool, user_id: &str) -> Result<Vec<StoredModel>> {
    sqlx::query_as::<_, StoredModel>(
        r#"
        SELECT * FROM models
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Storage)
}

/// List metadata for every model owned by a user, newest first.
pub async fn list_user_model_summaries(
    pool: &DbPool,
    user_id: &str,
) -> Result<Vec<StoredModelSummary>> {
    let query = format!(
        r#"
        SELECT {} FROM models
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
        SUMMARY_COLUMNS
    );
    sqlx::query_as::<_, StoredModelSummary>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Storage)
}

/// Delete a model by ID. Returns whether a row was removed.
pub async fn delete_model(pool: &DbPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM models WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count models owned by a user.
pub async fn count_user_models(pool: &DbPool, user_id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM models WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Total bytes stored for a user.
pub async fn get_user_models_size(pool: &DbPool, user_id: &str) -> Result<i64> {
    let (size,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM models WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(size)
}
