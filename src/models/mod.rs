//! Data models for modelvault.
//!
//! Types shared between the store, the identity adapters and the API:
//! upload sources and the signed-in user.

mod upload;
mod user;

pub use upload::*;
pub use user::*;
