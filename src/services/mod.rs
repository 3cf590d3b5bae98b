//! Service layer for modelvault.
//!
//! Contains business logic and external service integrations:
//! - Validation (upload gate by extension and size)
//! - ModelStore (local SQLite persistence of model files)
//! - Identity (signed-in session state and bearer token verification)
//! - Archive (remote object storage for promoted models)
//! - Library (owner-aware upload, listing, deletion and promotion)

pub mod archive;
pub mod identity;
mod library;
mod model_store;
pub mod validation;

pub use archive::{
    archive_path, ArchiveKind, ArchiveRecord, ArchivedModel, HttpModelArchive, ModelArchive,
};
pub use identity::{auth_error_message, AuthState, IdentityClaims, IdentitySession, TokenVerifier};
pub use library::{ModelLibrary, PromotedModel, Thumbnail};
pub use model_store::LocalModelStore;
pub use validation::{validate_model_file, ValidationFailure, ALLOWED_EXTENSIONS, MAX_MODEL_SIZE};
