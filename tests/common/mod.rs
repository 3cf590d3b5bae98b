//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use modelvault::api;
use modelvault::config::Config;
use modelvault::services::{
    IdentityClaims, LocalModelStore, ModelArchive, ModelLibrary, TokenVerifier,
};
use modelvault::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Mint an identity token for `user_id`, valid for an hour.
pub fn token_for(user_id: &str) -> String {
    sign(IdentityClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        name: Some(format!("User {}", user_id)),
        email: Some(format!("{}@example.com", user_id)),
        picture: None,
        iss: None,
        aud: None,
    })
}

/// Mint a token that expired an hour ago.
pub fn expired_token_for(user_id: &str) -> String {
    sign(IdentityClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        name: None,
        email: None,
        picture: None,
        iss: None,
        aud: None,
    })
}

fn sign(claims: IdentityClaims) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Bearer Authorization header value.
pub fn bearer_auth(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Application state over a fresh in-memory store.
pub async fn build_test_state(archive: Option<Arc<dyn ModelArchive>>) -> AppState {
    let config = Config::for_tests(TEST_SECRET);
    let store = LocalModelStore::open(&config.database.path)
        .await
        .expect("Failed to open test store");

    AppState::from_parts(
        ModelLibrary::new(store, archive),
        TokenVerifier::new(&config.identity),
    )
}

/// Test server with the full API router.
pub async fn build_test_app(archive: Option<Arc<dyn ModelArchive>>) -> (TestServer, AppState) {
    let state = build_test_state(archive).await;

    let app = Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state.clone());

    let server = TestServer::new(app).expect("Failed to create test server");

    (server, state)
}

/// Small binary glTF payload.
pub fn glb_bytes() -> Vec<u8> {
    let mut data = b"glTF".to_vec();
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 24]);
    data
}
