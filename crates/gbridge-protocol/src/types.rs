//! Wire types for the gbridge HTTP surface.
//!
//! The server serializes these from its handlers and the MCP bridge (and the
//! attachment watcher) deserializes them, so both sides agree on one contract.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Header carrying the shared API secret (lowercase, as `http` header names are).
pub const API_KEY_HEADER: &str = "x-api-key";

/// Label applied to messages whose attachments were saved.
pub const DOWNLOADED_LABEL: &str = "Downloaded";

// ── Gmail ───────────────────────────────────────────────────────────────────

/// Search criteria for `GET /gmail/read-emails`.
///
/// Field names are the query parameter names of the HTTP surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailFilter {
    #[serde(rename = "Label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "ExcludeLabel", default, skip_serializing_if = "Option::is_none")]
    pub exclude_label: Option<String>,
    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "ExactSubject", default, skip_serializing_if = "Option::is_none")]
    pub exact_subject: Option<String>,
    #[serde(
        rename = "HasAttachment",
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "is_false"
    )]
    pub has_attachment: bool,
    #[serde(rename = "From", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    pub subject: String,
    pub from: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadEmailsResponse {
    #[serde(default)]
    pub emails: Vec<EmailSummary>,
}

/// JSON body of `POST /gmail/write-and-send-email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachment_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendDetails {
    pub to: String,
    pub subject: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub details: SendDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedAttachment {
    pub filename: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadAttachmentsResponse {
    #[serde(default)]
    pub attachments: Vec<DownloadedAttachment>,
    #[serde(default)]
    pub message: String,
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// Query parameters of `POST /calendar/create-reminder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderParams {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderResponse {
    pub message: String,
    pub event_id: String,
    #[serde(rename = "htmlLink", default)]
    pub html_link: String,
}

/// Query parameters of `GET /calendar/read-reminders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_max: Option<String>,
}

/// Events are relayed as Google returns them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadRemindersResponse {
    #[serde(default)]
    pub events: Vec<Value>,
}

// ── Misc ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHealth {
    pub status: String,
    pub token_file: String,
    pub scopes: Vec<String>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

// ── Captions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionsFound {
    pub success: bool,
    pub captions: String,
    pub format: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionsMissing {
    pub success: bool,
    pub error: String,
    pub video_id: String,
    pub tested_urls: Vec<String>,
}

/// Outcome of a caption lookup. Both variants are successful HTTP responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptionResult {
    Found(CaptionsFound),
    Missing(CaptionsMissing),
}

// ── serde helpers ───────────────────────────────────────────────────────────

fn default_timezone() -> String {
    "UTC".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Parse the boolean spellings accepted on query strings.
pub fn parse_lenient_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" | "" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Text(String),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(b) => Ok(b),
        BoolLike::Text(s) => parse_lenient_bool(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean: {}", s))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
