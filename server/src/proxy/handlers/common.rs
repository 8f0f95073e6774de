//! Common Handler Utilities
//!
//! Extractors that report bad input as `{"detail": …}` and the credential
//! loading every Google-backed handler starts with.

use axum::extract::{FromRequest, FromRequestParts};

use crate::common::{AppError, AppResult};
use crate::google::{CalendarApi, GmailApi, GoogleError};
use crate::proxy::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Extractors
// ────────────────────────────────────────────────────────────────────────────

/// `Query` with rejections mapped to a 400 `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Json` with rejections mapped to a 400 `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` with rejections mapped to a 400 `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

// ────────────────────────────────────────────────────────────────────────────
// Google clients
// ────────────────────────────────────────────────────────────────────────────

/// Gmail client for the stored credentials. Fails with 401 when the token
/// file is absent, before anything is sent to Google.
pub async fn gmail_api(state: &AppState) -> AppResult<GmailApi> {
    let creds = state.tokens.load().await?;
    GmailApi::with_base_url(creds, &state.gmail_base).map_err(client_error)
}

pub async fn calendar_api(state: &AppState) -> AppResult<CalendarApi> {
    let creds = state.tokens.load().await?;
    CalendarApi::with_base_url(creds, &state.calendar_base).map_err(client_error)
}

fn client_error(err: GoogleError) -> AppError {
    AppError::internal(format!("Failed to create Google API client: {}", err))
}

/// Map a vendor failure to a 500 carrying `context`.
pub fn upstream(context: &'static str) -> impl Fn(GoogleError) -> AppError {
    move |err| AppError::upstream(context, err)
}
