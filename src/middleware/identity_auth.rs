//! Identity token authentication middleware.
//!
//! Accepts tokens issued by the identity provider via:
//! - `Authorization: Bearer {token}` headers (recommended)
//! - `?token={token}` query string parameters (for download links opened
//!   directly by the browser)

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{error::Error, AppState};

/// Extract token from Authorization header or query string.
///
/// Priority:
/// 1. Authorization: Bearer {token} header
/// 2. ?token={token} query parameter
fn extract_token_from_request(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(query) = req.uri().query() {
        for part in query.split('&') {
            if let Some(token) = part.strip_prefix("token=") {
                if let Ok(decoded) = urlencoding::decode(token) {
                    return Some(decoded.into_owned());
                }
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Middleware that requires a valid identity token.
///
/// Injects `CurrentUser` into request extensions.
///
/// # Errors
///
/// - 401 `UNAUTHENTICATED` when no token is present
/// - 401 `INVALID_TOKEN` / `TOKEN_EXPIRED` when verification fails
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token_from_request(&req).ok_or(Error::Unauthenticated)?;
    let user = state.verifier.verify(&token)?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
