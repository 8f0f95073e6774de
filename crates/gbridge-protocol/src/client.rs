use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::types::{
    CreateReminderParams, CreateReminderResponse, DownloadAttachmentsResponse, EmailFilter,
    MessageResponse, ReadEmailsResponse, ReadRemindersResponse, ReminderQuery, SendEmailRequest,
    SendEmailResponse, API_KEY_HEADER,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API key header value")]
    InvalidApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP client for the gbridge REST surface, usually reached over loopback.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| ClientError::InvalidApiKey)?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn read_emails(&self, filter: &EmailFilter) -> Result<ReadEmailsResponse, ClientError> {
        let builder = self.http.get(self.url("/gmail/read-emails")).query(filter);
        self.execute(builder).await
    }

    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, ClientError> {
        let builder = self.http.post(self.url("/gmail/write-and-send-email")).json(request);
        self.execute(builder).await
    }

    pub async fn download_attachments(
        &self,
        message_id: &str,
    ) -> Result<DownloadAttachmentsResponse, ClientError> {
        let path = format!("/gmail/download-attachments/{}", urlencoding::encode(message_id));
        let builder = self.http.get(self.url(&path));
        self.execute(builder).await
    }

    pub async fn create_reminder(
        &self,
        params: &CreateReminderParams,
    ) -> Result<CreateReminderResponse, ClientError> {
        let builder = self.http.post(self.url("/calendar/create-reminder")).query(params);
        self.execute(builder).await
    }

    pub async fn read_reminders(&self, query: &ReminderQuery) -> Result<ReadRemindersResponse, ClientError> {
        let builder = self.http.get(self.url("/calendar/read-reminders")).query(query);
        self.execute(builder).await
    }

    pub async fn remove_reminder(&self, event_id: &str) -> Result<MessageResponse, ClientError> {
        let builder = self
            .http
            .delete(self.url("/calendar/remove-reminder"))
            .query(&[("event_id", event_id)]);
        self.execute(builder).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                detail: error_detail(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull `detail` out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
