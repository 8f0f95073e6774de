//! Gmail API v1 Client
//!
//! Provides methods for interacting with Gmail API:
//! - List/search messages
//! - Get message details and attachments
//! - Send raw RFC 2822 messages
//! - Manage labels

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine};
use gbridge_protocol::EmailFilter;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, required_str};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Deepest MIME nesting followed when looking for attachments.
const MAX_PART_DEPTH: usize = 32;

/// Gmail emits attachment data URL-safe, with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub struct GmailApi {
    client: GoogleClient,
    base_url: String,
}

super::google_api_wrapper!(GmailApi);

// ── Message types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub part_id: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl GmailMessage {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Leaf parts that carry a downloadable attachment, in document order.
    pub fn attachment_parts(&self) -> Vec<&MessagePart> {
        let mut out = Vec::new();
        if let Some(payload) = &self.payload {
            collect_attachments(payload, 0, &mut out);
        }
        out
    }
}

fn collect_attachments<'a>(part: &'a MessagePart, depth: usize, out: &mut Vec<&'a MessagePart>) {
    if depth > MAX_PART_DEPTH {
        return;
    }
    if !part.parts.is_empty() {
        for child in &part.parts {
            collect_attachments(child, depth + 1, out);
        }
    } else if !part.filename.is_empty() && part.body.attachment_id.is_some() {
        out.push(part);
    }
}

/// Translate filter criteria into a Gmail search string.
pub fn build_search_query(filter: &EmailFilter) -> String {
    let mut terms = Vec::new();
    if let Some(label) = present(&filter.label) {
        terms.push(format!("label:{}", label));
    }
    if let Some(label) = present(&filter.exclude_label) {
        terms.push(format!("-label:{}", label));
    }
    if let Some(subject) = present(&filter.subject) {
        terms.push(format!("subject:{}", subject));
    }
    if let Some(subject) = present(&filter.exact_subject) {
        terms.push(format!("subject:\"{}\"", subject));
    }
    if filter.has_attachment {
        terms.push("has:attachment".to_string());
    }
    if let Some(from) = present(&filter.from) {
        terms.push(format!("from:{}", from));
    }
    if let Some(text) = present(&filter.text) {
        terms.push(format!("\"{}\"", text));
    }
    terms.join(" ").trim().to_string()
}

/// Empty query parameters count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl GmailApi {
    /// List messages matching a search query
    ///
    /// Returns `{id, threadId}` stubs; fetch each with `get_message`.
    pub async fn list_messages(&self, query: Option<&str>, max_results: usize) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Gmail messages");

        let mut query_params = vec![];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            query_params.push(("q", q.to_string()));
        }

        let url = format!("{}/users/me/messages", self.base_url);
        let messages = self
            .client
            .get_paginated(&url, &query_params, Some(max_results))
            .await?;

        debug!("Retrieved {} messages", messages.len());
        Ok(messages)
    }

    /// Get a message by ID
    ///
    /// `format` is one of "full" (default), "metadata", "minimal". With
    /// "metadata", only `metadata_headers` are returned.
    pub async fn get_message(
        &self,
        id: &str,
        format: Option<&str>,
        metadata_headers: &[&str],
    ) -> Result<GmailMessage, GoogleError> {
        debug!("Fetching Gmail message: {}", id);

        let mut query_params = vec![];
        if let Some(fmt) = format {
            query_params.push(("format", fmt.to_string()));
        }
        for header in metadata_headers {
            query_params.push(("metadataHeaders", header.to_string()));
        }

        let url = format!("{}/users/me/messages/{}", self.base_url, urlencoding::encode(id));
        let message = self.client.get(&url, &query_params).await?;
        serde_json::from_value(message).map_err(|e| GoogleError::Decode(e.to_string()))
    }

    /// Download and decode one attachment body
    pub async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, GoogleError> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            self.base_url,
            urlencoding::encode(message_id),
            urlencoding::encode(attachment_id)
        );
        let response = self.client.get(&url, &[]).await?;
        let data = required_str(&response, "data")?;
        URL_SAFE_LENIENT
            .decode(data.trim())
            .map_err(|e| GoogleError::Attachment(e.to_string()))
    }

    /// Send a fully rendered RFC 2822 message
    ///
    /// Returns the sent message object with id and threadId.
    pub async fn send_raw(&self, rfc2822: &[u8]) -> Result<Value, GoogleError> {
        info!("Sending Gmail message");

        let request_body = json!({ "raw": base64_url_encode(rfc2822) });
        let url = format!("{}/users/me/messages/send", self.base_url);
        let response = self.client.post(&url, &request_body).await?;

        info!("Message sent successfully");
        Ok(response)
    }

    /// List all labels
    pub async fn list_labels(&self) -> Result<Vec<Value>, GoogleError> {
        let url = format!("{}/users/me/labels", self.base_url);
        let response = self.client.get(&url, &[]).await?;

        let labels = extract_array(&response, "labels");
        debug!("Retrieved {} labels", labels.len());
        Ok(labels)
    }

    /// Create a user label visible in both the label and message lists
    pub async fn create_label(&self, name: &str) -> Result<Value, GoogleError> {
        info!("Creating label: {}", name);

        let body = json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        let url = format!("{}/users/me/labels", self.base_url);
        self.client.post(&url, &body).await
    }

    /// ID of the label called `name`, creating it when absent
    pub async fn ensure_label(&self, name: &str) -> Result<String, GoogleError> {
        let labels = self.list_labels().await?;
        if let Some(existing) = labels
            .iter()
            .find(|l| l.get("name").and_then(|v| v.as_str()) == Some(name))
        {
            return Ok(required_str(existing, "id")?.to_string());
        }

        let created = self.create_label(name).await?;
        Ok(required_str(&created, "id")?.to_string())
    }

    /// Modify message labels (add/remove labels from a message)
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<Value, GoogleError> {
        info!("Modifying labels for message: {}", message_id);

        let mut body = json!({});
        if !add_label_ids.is_empty() {
            body["addLabelIds"] = json!(add_label_ids);
        }
        if !remove_label_ids.is_empty() {
            body["removeLabelIds"] = json!(remove_label_ids);
        }

        let url = format!(
            "{}/users/me/messages/{}/modify",
            self.base_url,
            urlencoding::encode(message_id)
        );
        self.client.post(&url, &body).await
    }
}

/// Base64url encode (no padding) per RFC 4648 §5
fn base64_url_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    URL_SAFE_NO_PAD.encode(data)
}
