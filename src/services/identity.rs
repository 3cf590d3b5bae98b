//! Identity provider adapters.
//!
//! Two views of the same external identity provider:
//! - `IdentitySession` holds the signed-in user for an in-process client and
//!   publishes every change (sign-in, sign-out, session restore).
//! - `TokenVerifier` turns a provider-issued bearer token into a
//!   `CurrentUser` for the HTTP API.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use crate::config::IdentityConfig;
use crate::models::CurrentUser;
use crate::{Error, Result};

// ============================================================================
// Session state
// ============================================================================

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<CurrentUser>,
    /// True until the provider reports the first state.
    pub loading: bool,
    /// User-facing message of the last failed attempt.
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }
}

/// Map a provider error code to the message shown to the user.
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/invalid-credential" | "auth/wrong-password" | "auth/user-not-found" => {
            "Invalid email or password."
        }
        "auth/email-already-in-use" => "Email already in use.",
        "auth/api-key-not-valid" => "Identity provider configuration is missing or invalid.",
        "auth/popup-blocked" => "Sign-in popup was blocked. Please allow popups and try again.",
        _ => "Failed to sign in. Please try again.",
    }
}

/// Current user plus a change stream.
#[derive(Clone)]
pub struct IdentitySession {
    state: watch::Sender<AuthState>,
}

impl Default for IdentitySession {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySession {
    /// New session in the loading state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { state }
    }

    /// Snapshot of the full state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state.borrow().user.clone()
    }

    /// Id of the signed-in user, or `Unauthenticated`.
    pub fn require_user_id(&self) -> Result<String> {
        self.state
            .borrow()
            .user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(Error::Unauthenticated)
    }

    /// Receiver that observes the current value and every later change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Stream of states, starting with the current one.
    pub fn changes(&self) -> WatchStream<AuthState> {
        WatchStream::new(self.subscribe())
    }

    /// Record a successful sign-in or a restored session.
    pub fn signed_in(&self, user: CurrentUser) {
        info!(user_id = %user.id, "Signed in");
        self.state.send_replace(AuthState {
            user: Some(user),
            loading: false,
            error: None,
        });
    }

    /// Record a sign-out, or a restore that found no session.
    pub fn signed_out(&self) {
        info!("Signed out");
        self.state.send_replace(AuthState {
            user: None,
            loading: false,
            error: None,
        });
    }

    /// Record a failed attempt. The user, if any, is kept.
    pub fn failed(&self, code: &str) {
        warn!(code, "Identity provider reported a failure");
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(auth_error_message(code).to_string());
        });
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }
}

// ============================================================================
// Bearer tokens
// ============================================================================

/// Claims read from an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl From<IdentityClaims> for CurrentUser {
    fn from(claims: IdentityClaims) -> Self {
        CurrentUser {
            id: claims.sub,
            display_name: claims.name,
            email: claims.email,
            photo_url: claims.picture,
        }
    }
}

/// Verifies HS256 identity tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and return the user it identifies.
    pub fn verify(&self, token: &str) -> Result<CurrentUser> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation)?;

        if data.claims.sub.trim().is_empty() {
            return Err(Error::InvalidToken);
        }

        Ok(data.claims.into())
    }
}
