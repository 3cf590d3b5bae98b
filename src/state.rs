//! Application state for modelvault.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::services::{HttpModelArchive, LocalModelStore, ModelArchive, ModelLibrary, TokenVerifier};
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Owner-aware model operations over the local store.
    pub library: ModelLibrary,
    /// Bearer token verification for the identity provider.
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Create the application state from configuration, opening the store.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = LocalModelStore::open(&config.database.path).await?;

        let archive = HttpModelArchive::from_config(&config.archive)?
            .map(|archive| Arc::new(archive) as Arc<dyn ModelArchive>);
        if archive.is_none() {
            tracing::info!("ARCHIVE_URL not set, model promotion disabled");
        }

        Ok(Self::from_parts(
            ModelLibrary::new(store, archive),
            TokenVerifier::new(&config.identity),
        ))
    }

    /// Assemble state from already-built services.
    pub fn from_parts(library: ModelLibrary, verifier: TokenVerifier) -> Self {
        Self {
            library,
            verifier: Arc::new(verifier),
        }
    }
}
