//! Database layer for modelvault.
//!
//! Provides SQLite connection pooling and the model record queries.

mod models;
mod pool;

pub use models::*;
pub use pool::{create_pool_with_config, health_check, PoolConfig};

use crate::Result;
use tracing::info;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Initialize the database connection pool.
///
/// Creates parent directories if needed. `:memory:` paths get a single
/// pinned connection so every caller shares one database.
pub async fn init_pool(path: &str) -> Result<DbPool> {
    let pool = create_pool_with_config(path, PoolConfig::for_path(path)).await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    for statement in schema_statements(schema) {
        sqlx::query(&statement).execute(pool).await?;
    }

    info!("Database schema initialized");

    Ok(())
}

/// Split a schema script into statements.
///
/// Comment lines are dropped before splitting, so a `;` inside a comment
/// never ends a statement.
fn schema_statements(schema: &str) -> Vec<String> {
    let sql: String = schema
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
