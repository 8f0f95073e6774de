//! Google API Client Module
//!
//! Authenticated HTTP access to the Gmail v1 and Calendar v3 REST APIs.

pub mod calendar_api;
pub mod client;
pub mod common;
pub mod gmail;
pub mod mime;

pub use calendar_api::CalendarApi;
pub use client::{GoogleClient, GoogleError};
pub use gmail::GmailApi;

/// Macro to implement the standard Google API wrapper constructor pattern.
/// Each API struct wraps a `GoogleClient` plus the REST root it talks to;
/// the root comes from `AppState` so tests can point it at a local server.
macro_rules! google_api_wrapper {
    ($name:ident) => {
        impl $name {
            /// Create an API client from stored credentials against `base_url`
            pub fn with_base_url(
                credentials: crate::auth::Credentials,
                base_url: &str,
            ) -> Result<Self, crate::google::client::GoogleError> {
                let client = crate::google::client::GoogleClient::new(credentials)?;
                Ok(Self {
                    client,
                    base_url: base_url.trim_end_matches('/').to_string(),
                })
            }
        }
    };
}

pub(crate) use google_api_wrapper;
