//! SQLite connection pool configuration.
//!
//! File-backed stores get a small WAL-mode pool. In-memory stores are pinned
//! to a single connection that never idles out, since the database lives
//! only as long as that connection.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

/// Pool configuration options.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Timeout for acquiring a connection.
    pub acquire_timeout: Duration,
    /// Maximum idle time before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
    /// SQLite busy timeout.
    pub busy_timeout: Duration,
    /// Cache size in KB (negative values).
    pub cache_size_kb: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            busy_timeout: Duration::from_secs(30),
            cache_size_kb: 64000,
        }
    }
}

impl PoolConfig {
    /// Single long-lived connection, required for `:memory:` databases.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            busy_timeout: Duration::from_secs(5),
            cache_size_kb: 8000,
        }
    }

    /// Pick the configuration matching a database path.
    pub fn for_path(path: &str) -> Self {
        if is_in_memory(path) {
            Self::in_memory()
        } else {
            Self::default()
        }
    }

    /// Build the connection options for SQLite.
    pub fn build_connect_options(&self, path: &str) -> Result<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .pragma("cache_size", format!("-{}", self.cache_size_kb))
            .pragma("temp_store", "memory");

        Ok(options)
    }

    /// Build the pool options.
    pub fn build_pool_options(&self) -> SqlitePoolOptions {
        let mut opts = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime);

        if self.max_connections == 1 {
            opts = opts.test_before_acquire(false);
        }

        opts
    }
}

pub(crate) fn is_in_memory(path: &str) -> bool {
    matches!(path, ":memory:" | "sqlite::memory:" | "sqlite://:memory:")
}

/// Create a pool with custom configuration.
pub async fn create_pool_with_config(path: &str, config: PoolConfig) -> Result<super::DbPool> {
    // Create parent directories if they don't exist
    if !is_in_memory(path) {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Storage(sqlx::Error::Io(e)))?;
            }
        }
    }

    let options = config.build_connect_options(path)?;
    let pool = config.build_pool_options().connect_with(options).await?;

    Ok(pool)
}

/// Health check for the database connection.
pub async fn health_check(pool: &super::DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_for_path() {
        assert_eq!(PoolConfig::for_path(":memory:").max_connections, 1);
        assert_eq!(PoolConfig::for_path("./data/models.db").max_connections, 8);
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_pool_with_config(":memory:", PoolConfig::in_memory())
            .await
            .unwrap();
        health_check(&pool).await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 1);
    }
}
