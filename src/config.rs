//! Configuration management for modelvault.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present) with support for:
//! - Server bind address
//! - Local model database location
//! - Identity token verification
//! - Optional remote archive for promoted models

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Shared secret used to verify HS256 identity tokens.
    pub token_secret: String,
    /// True when no secret was configured and one was generated at startup.
    pub ephemeral_secret: bool,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Base URL of the remote archive. Promotion is disabled when unset.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8780").parse().unwrap_or(8780),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| default_database_path()),
            },
            identity: Self::parse_identity_config(),
            archive: ArchiveConfig {
                url: non_empty_var("ARCHIVE_URL"),
                api_key: non_empty_var("ARCHIVE_API_KEY"),
                timeout: Duration::from_secs(
                    env_or("ARCHIVE_TIMEOUT_SECS", "30").parse().unwrap_or(30),
                ),
            },
            logging: LoggingConfig {
                format: env_or("LOG_FORMAT", "pretty")
                    .parse()
                    .unwrap_or(LogFormat::Pretty),
            },
        }
    }

    /// Identity settings. Without a configured secret a random one is used,
    /// which makes every presented token fail verification.
    fn parse_identity_config() -> IdentityConfig {
        let configured = non_empty_var("IDENTITY_TOKEN_SECRET");
        let ephemeral_secret = configured.is_none();

        IdentityConfig {
            token_secret: configured.unwrap_or_else(|| nanoid::nanoid!(32)),
            ephemeral_secret,
            issuer: non_empty_var("IDENTITY_ISSUER"),
            audience: non_empty_var("IDENTITY_AUDIENCE"),
        }
    }

    /// Configuration for tests: in-memory database, fixed secret, no archive.
    pub fn for_tests(token_secret: &str) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            identity: IdentityConfig {
                token_secret: token_secret.to_string(),
                ephemeral_secret: false,
                issuer: None,
                audience: None,
            },
            archive: ArchiveConfig {
                url: None,
                api_key: None,
                timeout: Duration::from_secs(5),
            },
            logging: LoggingConfig {
                format: LogFormat::Pretty,
            },
        }
    }
}

/// Platform data directory when available, otherwise `./data`.
fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("modelvault").join("models.db"))
        .unwrap_or_else(|| PathBuf::from("./data/models.db"))
        .to_string_lossy()
        .into_owned()
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
