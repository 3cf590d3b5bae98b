//! Signed-in user model.

use serde::{Deserialize, Serialize};

/// Identity issued by the identity provider.
///
/// Only `id` is used for ownership; the rest is passed through for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl CurrentUser {
    /// User with only an id, as used by tests and service accounts.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }
}
