//! API-key guard for the protected routes.
//!
//! Keys are compared as HMAC-SHA256 tags under a per-process random key, so
//! the comparison time depends on neither the key contents nor their lengths.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use gbridge_protocol::API_KEY_HEADER;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use rand::RngCore;
use sha2::Sha256;

use crate::common::{AppError, AppResult};
use crate::proxy::AppState;

type HmacSha256 = Hmac<Sha256>;

static TAG_KEY: Lazy<[u8; 32]> = Lazy::new(|| {
    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
});

fn tag(value: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(TAG_KEY.as_slice()).ok()?;
    mac.update(value);
    Some(mac)
}

/// Constant-time equality of two API keys.
pub fn keys_match(expected: &str, provided: &str) -> bool {
    let (Some(expected_mac), Some(provided_mac)) = (tag(expected.as_bytes()), tag(provided.as_bytes())) else {
        return false;
    };
    let expected_tag = expected_mac.finalize().into_bytes();
    provided_mac.verify_slice(&expected_tag).is_ok()
}

/// Check the request headers against the configured key.
pub fn check(configured: Option<&str>, headers: &HeaderMap) -> AppResult<()> {
    let Some(expected) = configured else {
        return Err(AppError::config_missing("Server configuration error: API_KEY not set"));
    };

    let Some(value) = headers.get(API_KEY_HEADER) else {
        return Err(AppError::unauthorized("Unauthorized: Missing X-API-Key header"));
    };

    match value.to_str() {
        Ok(provided) if keys_match(expected, provided) => Ok(()),
        _ => Err(AppError::unauthorized("Unauthorized: Invalid API key")),
    }
}

/// Middleware rejecting requests before any protected handler runs.
pub async fn require_api_key(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    match check(state.config.api_key.as_deref(), request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
