//! Google API Authenticated HTTP Client
//!
//! Injects the stored OAuth access token, decodes Google's error envelope and
//! follows `nextPageToken` pagination. When Google answers 401 the client
//! performs one refresh grant and replays the request once; the refreshed
//! token lives only as long as the client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use crate::auth::provider::google::GoogleProvider;
use crate::auth::provider::OAuthProvider;
use crate::auth::Credentials;

#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited. Please try again later.")]
    RateLimited,

    /// Google's own error message, e.g. `Google API error 404: Not Found`
    #[error("{0}")]
    Api(String),

    #[error("Failed to parse JSON response: {0}")]
    Decode(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Response missing field '{0}'")]
    MissingField(String),

    #[error("Invalid attachment data: {0}")]
    Attachment(String),
}

/// Google API HTTP client with OAuth token injection
pub struct GoogleClient {
    client: Client,
    credentials: Credentials,
    access_token: RwLock<Zeroizing<String>>,
}

impl GoogleClient {
    pub fn new(credentials: Credentials) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GoogleError::Client(e.to_string()))?;

        let access_token = RwLock::new(Zeroizing::new(credentials.token.clone()));
        Ok(Self {
            client,
            credentials,
            access_token,
        })
    }

    /// Make an authenticated GET request
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value, GoogleError> {
        self.execute_request(self.client.get(url).query(query)).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, GoogleError> {
        self.execute_request(self.client.post(url).json(body)).await
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, url: &str) -> Result<Value, GoogleError> {
        self.execute_request(self.client.delete(url)).await
    }

    /// Send with the current token, refreshing once on 401.
    async fn execute_request(&self, builder: RequestBuilder) -> Result<Value, GoogleError> {
        debug!("Executing Google API request");

        let replay = builder.try_clone();
        let token = self.access_token.read().await.clone();
        let response = builder.bearer_auth(token.as_str()).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED && !self.credentials.refresh_token.is_empty() {
            if let Some(replay) = replay {
                warn!("Access token rejected, refreshing once");
                let fresh = self.refresh().await?;
                let response = replay.bearer_auth(fresh.as_str()).send().await?;
                return self.decode_response(response).await;
            }
        }

        self.decode_response(response).await
    }

    async fn refresh(&self) -> Result<Zeroizing<String>, GoogleError> {
        let provider = GoogleProvider::from_credentials(&self.credentials);
        let tokens = provider
            .refresh_token(&self.credentials.refresh_token)
            .await
            .map_err(GoogleError::Refresh)?;

        let fresh = Zeroizing::new(tokens.access_token);
        *self.access_token.write().await = fresh.clone();
        Ok(fresh)
    }

    /// Handle Google API response patterns
    async fn decode_response(&self, response: Response) -> Result<Value, GoogleError> {
        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Google API");
            return Err(GoogleError::RateLimited);
        }

        let body = response.text().await?;

        // Empty successful responses (e.g., DELETE)
        if status.is_success() && body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                let msg = format!("HTTP {} error", status);
                error!("Google API error: {}", msg);
                return Err(GoogleError::Api(msg));
            }
            Err(e) => return Err(GoogleError::Decode(format!("{} (body: {})", e, body))),
        };

        if !status.is_success() {
            let error_msg = extract_error_message(&parsed, status);
            error!("Google API error: {}", error_msg);
            return Err(GoogleError::Api(error_msg));
        }

        Ok(parsed)
    }

    /// Handle paginated requests with nextPageToken
    pub async fn get_paginated(
        &self,
        url: &str,
        base_query: &[(&str, String)],
        max_results: Option<usize>,
    ) -> Result<Vec<Value>, GoogleError> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;
        let remaining = max_results.unwrap_or(usize::MAX);

        loop {
            let mut query = base_query.to_vec();
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }
            if let Some(max) = max_results {
                query.push(("maxResults", max.to_string()));
            }

            let response = self.get(url, &query).await?;

            // Items live under "items" (Calendar) or "messages" (Gmail)
            if let Some(items) = response
                .get("items")
                .or_else(|| response.get("messages"))
                .and_then(|v| v.as_array())
            {
                all_items.extend(items.iter().cloned());

                if all_items.len() >= remaining {
                    all_items.truncate(remaining);
                    break;
                }
            }

            match response.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(next_token) => page_token = Some(next_token.to_string()),
                None => break,
            }
        }

        Ok(all_items)
    }
}

/// Extract error message from Google API error response
///
/// Google APIs return errors as
/// `{"error": {"code": 400, "message": "Invalid request", "errors": [...]}}`.
fn extract_error_message(response: &Value, status: StatusCode) -> String {
    if let Some(error_obj) = response.get("error") {
        if let Some(message) = error_obj.get("message").and_then(|v| v.as_str()) {
            let code = error_obj
                .get("code")
                .and_then(|v| v.as_i64())
                .unwrap_or(status.as_u16() as i64);

            return format!("Google API error {}: {}", code, message);
        }
    }

    format!("HTTP {} error", status)
}
