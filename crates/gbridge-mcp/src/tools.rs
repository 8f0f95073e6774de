use gbridge_protocol::{ApiClient, CreateReminderParams, EmailFilter, ReminderQuery, SendEmailRequest};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::format;
use crate::protocol::{McpTool, ToolAnnotations, ToolsCallResponse, ToolsListResponse};

const DEFAULT_EMAIL_LIMIT: u32 = 10;
const DEFAULT_EVENT_LIMIT: u32 = 30;

#[derive(Debug)]
pub enum ToolCallError {
    UnknownTool(String),
    InvalidParams(String),
}

/// The fixed set of tools exposed to agents, each forwarding to one gbridge endpoint.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<McpTool>,
    client: ApiClient,
    has_api_key: bool,
}

impl ToolRegistry {
    pub fn new(client: ApiClient, has_api_key: bool) -> Self {
        Self {
            tools: definitions(),
            client,
            has_api_key,
        }
    }

    pub fn list_response(&self) -> ToolsListResponse {
        ToolsListResponse {
            tools: self.tools.clone(),
            next_cursor: None,
        }
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolsCallResponse, ToolCallError> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolCallError::UnknownTool(name.to_string()));
        }

        let args = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ToolCallError::InvalidParams(format!(
                    "arguments must be an object, got {}",
                    other
                )))
            }
        };

        if !self.has_api_key {
            tracing::error!(tool = name, "API_KEY is not configured");
            return Ok(ToolsCallResponse::failure(
                "API_KEY is not configured; cannot call protected endpoints",
            ));
        }

        let outcome = match name {
            "read_emails" => {
                let filter = email_filter(args)?;
                self.client.read_emails(&filter).await.map(|r| format::emails(&r))
            }
            "send_email" => {
                let request: SendEmailRequest = parse_args(args)?;
                self.client.send_email(&request).await.map(|r| format::sent(&r))
            }
            "download_attachments" => {
                let message_id = required_str(&args, "message_id")?;
                self.client
                    .download_attachments(&message_id)
                    .await
                    .map(|r| format::downloads(&r))
            }
            "create_calendar_reminder" => {
                let params: CreateReminderParams = parse_args(args)?;
                self.client
                    .create_reminder(&params)
                    .await
                    .map(|r| format::reminder_created(&r))
            }
            "read_calendar_reminders" => {
                let mut query: ReminderQuery = parse_args(args)?;
                query.max_results.get_or_insert(DEFAULT_EVENT_LIMIT);
                query.time_min = query.time_min.filter(|s| !s.is_empty());
                query.time_max = query.time_max.filter(|s| !s.is_empty());
                self.client.read_reminders(&query).await.map(|r| format::events(&r))
            }
            "delete_calendar_reminder" => {
                let event_id = required_str(&args, "event_id")?;
                self.client.remove_reminder(&event_id).await.map(|r| format::removed(&r))
            }
            other => return Err(ToolCallError::UnknownTool(other.to_string())),
        };

        Ok(match outcome {
            Ok(text) => ToolsCallResponse::text(text),
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool call failed");
                ToolsCallResponse::failure(e)
            }
        })
    }
}

fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolCallError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolCallError::InvalidParams(e.to_string()))
}

fn required_str(args: &Map<String, Value>, key: &str) -> Result<String, ToolCallError> {
    match args.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ToolCallError::InvalidParams(format!("missing required argument: {}", key))),
    }
}

/// Empty strings and a false attachment flag are dropped rather than sent as filters.
fn email_filter(args: Map<String, Value>) -> Result<EmailFilter, ToolCallError> {
    let mut filter: EmailFilter = parse_args(args)?;
    for slot in [
        &mut filter.label,
        &mut filter.exclude_label,
        &mut filter.subject,
        &mut filter.exact_subject,
        &mut filter.from,
        &mut filter.text,
    ] {
        if slot.as_deref() == Some("") {
            *slot = None;
        }
    }
    filter.max_results = match filter.max_results {
        Some(0) => None,
        None => Some(DEFAULT_EMAIL_LIMIT),
        n => n,
    };
    Ok(filter)
}

fn tool(name: &str, description: &str, input_schema: Value, annotations: ToolAnnotations) -> McpTool {
    McpTool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
        annotations: Some(annotations),
    }
}

fn read_only() -> ToolAnnotations {
    ToolAnnotations {
        read_only_hint: Some(true),
        open_world_hint: Some(true),
        ..Default::default()
    }
}

fn definitions() -> Vec<McpTool> {
    vec![
        tool(
            "read_emails",
            "Search and read emails from Gmail with advanced filtering options. Supports filtering by label, subject, sender, attachments, and text content.",
            json!({
                "type": "object",
                "properties": {
                    "Label": {"type": "string", "description": "Filter emails by Gmail label (e.g., 'INBOX', 'UNREAD', 'SENT')"},
                    "ExcludeLabel": {"type": "string", "description": "Exclude emails with this label (e.g., 'SPAM', 'TRASH')"},
                    "Subject": {"type": "string", "description": "Filter emails containing this word in the subject"},
                    "ExactSubject": {"type": "string", "description": "Filter emails with exact subject match"},
                    "HasAttachment": {"type": "boolean", "description": "Filter only emails with attachments", "default": false},
                    "From": {"type": "string", "description": "Filter emails from specific sender email address"},
                    "Text": {"type": "string", "description": "Filter emails containing this text in the body"},
                    "max_results": {"type": "integer", "description": "Maximum number of emails to return (default 10)", "default": 10}
                }
            }),
            read_only(),
        ),
        tool(
            "send_email",
            "Send an email via Gmail with optional CC, BCC, and attachments from server file paths",
            json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Recipient email address"},
                    "subject": {"type": "string", "description": "Email subject line"},
                    "body": {"type": "string", "description": "Email body content (plain text)"},
                    "cc": {"type": "string", "description": "CC recipient email address (optional)"},
                    "bcc": {"type": "string", "description": "BCC recipient email address (optional)"},
                    "attachment_paths": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of absolute file paths on server to attach"
                    }
                },
                "required": ["to", "subject", "body"]
            }),
            ToolAnnotations {
                destructive_hint: Some(false),
                idempotent_hint: Some(false),
                open_world_hint: Some(true),
                ..Default::default()
            },
        ),
        tool(
            "download_attachments",
            "Download all attachments from a specific email by message ID and apply 'Downloaded' label to the email",
            json!({
                "type": "object",
                "properties": {
                    "message_id": {"type": "string", "description": "Gmail message ID (obtained from read_emails)"}
                },
                "required": ["message_id"]
            }),
            ToolAnnotations {
                destructive_hint: Some(false),
                idempotent_hint: Some(true),
                open_world_hint: Some(true),
                ..Default::default()
            },
        ),
        tool(
            "create_calendar_reminder",
            "Create a reminder event in Google Calendar with specified time and description",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Event title/summary"},
                    "description": {"type": "string", "description": "Event description (optional)"},
                    "start_time": {"type": "string", "description": "Start time in ISO 8601 format (e.g., '2025-10-07T10:00:00')"},
                    "end_time": {"type": "string", "description": "End time in ISO 8601 format (e.g., '2025-10-07T11:00:00')"},
                    "timezone": {"type": "string", "description": "Timezone identifier (default: 'UTC')", "default": "UTC"}
                },
                "required": ["title", "start_time", "end_time"]
            }),
            ToolAnnotations {
                destructive_hint: Some(false),
                idempotent_hint: Some(false),
                open_world_hint: Some(true),
                ..Default::default()
            },
        ),
        tool(
            "read_calendar_reminders",
            "List upcoming calendar events/reminders from Google Calendar",
            json!({
                "type": "object",
                "properties": {
                    "max_results": {"type": "integer", "description": "Maximum number of events to retrieve (default: 30)", "default": 30},
                    "time_min": {"type": "string", "description": "Minimum time in ISO 8601 format (optional, filters events after this time)"},
                    "time_max": {"type": "string", "description": "Maximum time in ISO 8601 format (optional, filters events before this time)"}
                }
            }),
            read_only(),
        ),
        tool(
            "delete_calendar_reminder",
            "Delete a calendar event/reminder by event ID from Google Calendar",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "Calendar event ID (obtained from read_calendar_reminders)"}
                },
                "required": ["event_id"]
            }),
            ToolAnnotations {
                destructive_hint: Some(true),
                idempotent_hint: Some(true),
                open_world_hint: Some(true),
                ..Default::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolContent;

    fn text(resp: &ToolsCallResponse) -> &str {
        match &resp.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    fn registry(base_url: &str, key: Option<&str>) -> ToolRegistry {
        ToolRegistry::new(ApiClient::new(base_url, key).unwrap(), key.is_some())
    }

    #[test]
    fn test_lists_six_tools() {
        let reg = registry("http://127.0.0.1:1", Some("k"));
        let names: Vec<String> = reg.list_response().tools.into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "read_emails",
                "send_email",
                "download_attachments",
                "create_calendar_reminder",
                "read_calendar_reminders",
                "delete_calendar_reminder"
            ]
        );
    }

    #[test]
    fn test_email_filter_drops_empty_values() {
        let args = json!({"Label": "", "Subject": "Invoice", "HasAttachment": false});
        let Value::Object(map) = args else { unreachable!() };
        let filter = email_filter(map).unwrap();
        assert_eq!(filter.label, None);
        assert_eq!(filter.subject.as_deref(), Some("Invoice"));
        assert!(!filter.has_attachment);
        assert_eq!(filter.max_results, Some(DEFAULT_EMAIL_LIMIT));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let reg = registry("http://127.0.0.1:1", Some("k"));
        let err = reg.call_tool("format_disk", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolCallError::UnknownTool(name) if name == "format_disk"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let reg = registry("http://127.0.0.1:1", Some("k"));
        let err = reg.call_tool("send_email", json!({"to": "a@example.com"})).await.unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams(_)));

        let err = reg.call_tool("delete_calendar_reminder", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams(msg) if msg.contains("event_id")));
    }

    #[tokio::test]
    async fn test_without_api_key_returns_error_text() {
        let reg = registry("http://127.0.0.1:1", None);
        let resp = reg.call_tool("read_emails", json!({})).await.unwrap();
        assert!(resp.is_error);
        assert!(text(&resp).starts_with("Error: API_KEY"));
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_error_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/calendar/remove-reminder")
            .match_query(mockito::Matcher::UrlEncoded("event_id".into(), "ev9".into()))
            .with_status(500)
            .with_body(r#"{"detail":"Error deleting event: Google API error 404: Not Found"}"#)
            .create_async()
            .await;

        let reg = registry(&server.url(), Some("k"));
        let resp = reg
            .call_tool("delete_calendar_reminder", json!({"event_id": "ev9"}))
            .await
            .unwrap();
        assert!(resp.is_error);
        assert!(text(&resp).contains("Google API error 404"));
    }

    #[tokio::test]
    async fn test_read_reminders_forwards_default_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/calendar/read-reminders")
            .match_header("x-api-key", "k")
            .match_query(mockito::Matcher::UrlEncoded("max_results".into(), "30".into()))
            .with_status(200)
            .with_body(r#"{"events":[]}"#)
            .create_async()
            .await;

        let reg = registry(&server.url(), Some("k"));
        let resp = reg.call_tool("read_calendar_reminders", json!({})).await.unwrap();
        mock.assert_async().await;
        assert!(!resp.is_error);
        assert_eq!(text(&resp), "No calendar events found.");
    }
}
