//! Middleware for modelvault.
//!
//! - `identity_auth` - verifies identity-provider bearer tokens and injects
//!   the `CurrentUser` into request extensions

mod identity_auth;

pub use identity_auth::require_user;
