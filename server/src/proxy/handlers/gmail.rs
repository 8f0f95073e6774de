//! Gmail Handler
//!
//! Read, send and attachment-download endpoints over the Gmail v1 API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use gbridge_protocol::{
    DownloadAttachmentsResponse, DownloadedAttachment, EmailFilter, EmailSummary, ReadEmailsResponse,
    SendDetails, SendEmailRequest, SendEmailResponse, DOWNLOADED_LABEL,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::common::{gmail_api, upstream, ApiJson, ApiPath, ApiQuery};
use crate::common::{AppError, AppResult};
use crate::google::gmail::build_search_query;
use crate::google::mime::{Attachment, MimeError, OutgoingEmail};
use crate::proxy::AppState;

const DEFAULT_MAX_EMAILS: u32 = 10;

const READ_CONTEXT: &str = "Error reading emails";
const SEND_CONTEXT: &str = "Error sending email";
const DOWNLOAD_CONTEXT: &str = "Error downloading attachments";

// ── Read ────────────────────────────────────────────────────────────────────

pub async fn read_emails(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<EmailFilter>,
) -> AppResult<Json<ReadEmailsResponse>> {
    info!("Handling gmail read-emails");

    let gmail = gmail_api(&state).await?;
    let query = build_search_query(&filter);
    let max_results = filter.max_results.unwrap_or(DEFAULT_MAX_EMAILS) as usize;

    let stubs = gmail
        .list_messages(Some(&query), max_results)
        .await
        .map_err(upstream(READ_CONTEXT))?;

    let mut emails = Vec::with_capacity(stubs.len());
    for id in stubs.iter().filter_map(|m| m.get("id").and_then(|v| v.as_str())) {
        let message = gmail
            .get_message(id, Some("metadata"), &["Subject", "From"])
            .await
            .map_err(upstream(READ_CONTEXT))?;

        emails.push(EmailSummary {
            subject: message.header("Subject").unwrap_or("No Subject").to_string(),
            from: message.header("From").unwrap_or("Unknown Sender").to_string(),
            id: message.id,
            snippet: message.snippet,
            labels: message.label_ids,
        });
    }

    info!("Returning {} emails", emails.len());
    Ok(Json(ReadEmailsResponse { emails }))
}

// ── Send ────────────────────────────────────────────────────────────────────

/// Envelope fields shared by the send endpoints.
#[derive(Debug, Deserialize)]
pub struct SendFields {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
}

/// Query form of `/gmail/send-email`; `attachments` is a comma-separated
/// list of paths on the server.
#[derive(Debug, Deserialize)]
pub struct SendQuery {
    #[serde(flatten)]
    pub fields: SendFields,
    #[serde(default)]
    pub attachments: Option<String>,
}

pub async fn send_email(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SendQuery>,
) -> AppResult<Json<SendEmailResponse>> {
    info!("Handling gmail send-email");

    let paths: Vec<String> = query
        .attachments
        .as_deref()
        .map(|list| list.split(',').map(|p| p.to_string()).collect())
        .unwrap_or_default();
    let attachments = read_attachment_paths(&paths).await;
    deliver(&state, query.fields, attachments).await.map(Json)
}

pub async fn write_and_send_email(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SendEmailRequest>,
) -> AppResult<Json<SendEmailResponse>> {
    info!("Handling gmail write-and-send-email");

    let attachments = read_attachment_paths(&request.attachment_paths).await;
    let fields = SendFields {
        to: request.to,
        subject: request.subject,
        body: request.body,
        cc: request.cc,
        bcc: request.bcc,
    };
    deliver(&state, fields, attachments).await.map(Json)
}

pub async fn send_email_with_uploads(
    State(state): State<Arc<AppState>>,
    ApiQuery(fields): ApiQuery<SendFields>,
    mut multipart: Multipart,
) -> AppResult<Json<SendEmailResponse>> {
    info!("Handling gmail write-and-send-email-with-uploads");

    let mut attachments = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        let Some(filename) = field.file_name().map(String::from).filter(|n| !n.is_empty()) else {
            continue;
        };
        match field.bytes().await {
            Ok(bytes) => attachments.push(Attachment {
                filename,
                bytes: bytes.to_vec(),
            }),
            Err(e) => warn!("Skipping upload {}: {}", filename, e),
        }
    }

    deliver(&state, fields, attachments).await.map(Json)
}

/// Load server-side files; missing or unreadable ones are skipped.
async fn read_attachment_paths(paths: &[String]) -> Vec<Attachment> {
    let mut attachments = Vec::new();
    for raw in paths {
        let path = Path::new(raw.trim());
        if path.as_os_str().is_empty() {
            continue;
        }
        let Some(filename) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            warn!("Skipping attachment without a file name: {:?}", path);
            continue;
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => attachments.push(Attachment { filename, bytes }),
            Err(e) => warn!("Skipping attachment {:?}: {}", path, e),
        }
    }
    attachments
}

async fn deliver(state: &AppState, fields: SendFields, attachments: Vec<Attachment>) -> AppResult<SendEmailResponse> {
    let gmail = gmail_api(state).await?;

    let names: Vec<String> = attachments.iter().map(|a| a.filename.clone()).collect();
    let email = OutgoingEmail {
        to: fields.to,
        subject: fields.subject,
        body: fields.body,
        cc: fields.cc.filter(|s| !s.is_empty()),
        bcc: fields.bcc.filter(|s| !s.is_empty()),
        attachments,
    };

    let raw = email.render().map_err(|e| match e {
        MimeError::LineBreak(_) => AppError::bad_request(e.to_string()),
        MimeError::Write(_) => AppError::internal(e.to_string()),
    })?;
    let sent = gmail
        .send_raw(raw.as_bytes())
        .await
        .map_err(upstream(SEND_CONTEXT))?;
    let message_id = sent
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    info!("Sent message {} with {} attachment(s)", message_id, names.len());
    Ok(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        message_id,
        details: SendDetails {
            to: email.to.clone(),
            subject: email.subject.clone(),
            cc: email.cc.clone(),
            bcc: email.bcc.clone(),
            attachments: names,
            timestamp: chrono::Local::now().to_rfc3339(),
        },
    })
}

// ── Attachments ─────────────────────────────────────────────────────────────

pub async fn download_attachments(
    State(state): State<Arc<AppState>>,
    ApiPath(message_id): ApiPath<String>,
) -> AppResult<Json<DownloadAttachmentsResponse>> {
    info!("Handling gmail download-attachments for {}", message_id);

    let gmail = gmail_api(&state).await?;
    let message = gmail
        .get_message(&message_id, None, &[])
        .await
        .map_err(upstream(DOWNLOAD_CONTEXT))?;

    let parts = message.attachment_parts();
    let mut saved = Vec::new();
    if !parts.is_empty() {
        tokio::fs::create_dir_all(&state.config.attachment_dir)
            .await
            .map_err(|e| AppError::upstream(DOWNLOAD_CONTEXT, e))?;
    }

    for part in parts {
        let (Some(attachment_id), Some(filename)) = (part.body.attachment_id.as_deref(), safe_file_name(&part.filename))
        else {
            warn!("Skipping attachment with unusable name {:?}", part.filename);
            continue;
        };

        let bytes = gmail
            .get_attachment(&message_id, attachment_id)
            .await
            .map_err(upstream(DOWNLOAD_CONTEXT))?;

        let path: PathBuf = state.config.attachment_dir.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::upstream(DOWNLOAD_CONTEXT, e))?;

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        saved.push(DownloadedAttachment {
            filename: filename.to_string(),
            file_path: path.display().to_string(),
        });
    }

    if saved.is_empty() {
        return Ok(Json(DownloadAttachmentsResponse {
            attachments: saved,
            message: "No attachments found.".to_string(),
        }));
    }

    let label_id = gmail
        .ensure_label(DOWNLOADED_LABEL)
        .await
        .map_err(upstream(DOWNLOAD_CONTEXT))?;
    gmail
        .modify_message(&message_id, &[label_id], &[])
        .await
        .map_err(upstream(DOWNLOAD_CONTEXT))?;

    Ok(Json(DownloadAttachmentsResponse {
        attachments: saved,
        message: format!(
            "Attachments downloaded and '{}' label applied to the email.",
            DOWNLOADED_LABEL
        ),
    }))
}

/// Final path component of a Gmail-supplied name, if it is a usable one.
fn safe_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::router;
    use crate::proxy::test_support::{config, state, write_token};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mockito::Matcher;
    use tower::ServiceExt;

    async fn call(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("report.pdf"), Some("report.pdf"));
        assert_eq!(safe_file_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(safe_file_name("C:\\temp\\a.txt"), Some("a.txt"));
        assert_eq!(safe_file_name(".."), None);
        assert_eq!(safe_file_name("dir/"), None);
    }

    #[tokio::test]
    async fn test_read_emails_reshapes_messages() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "label:INBOX has:attachment".into()),
                Matcher::UrlEncoded("maxResults".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"messages":[{"id":"m1","threadId":"t1"},{"id":"m2","threadId":"t2"}]}"#)
            .create_async()
            .await;
        let _m1 = server
            .mock("GET", "/gmail/v1/users/me/messages/m1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id":"m1","snippet":"hello","labelIds":["INBOX"],"payload":{"headers":[{"name":"Subject","value":"Invoice"},{"name":"From","value":"a@example.com"}]}}"#)
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/gmail/v1/users/me/messages/m2")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id":"m2","payload":{"headers":[]}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let (status, body) = call(
            app,
            Request::builder()
                .uri("/gmail/read-emails?Label=INBOX&HasAttachment=true")
                .header("x-api-key", "k")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let emails = body["emails"].as_array().unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0]["subject"], "Invoice");
        assert_eq!(emails[0]["from"], "a@example.com");
        assert_eq!(emails[0]["labels"][0], "INBOX");
        assert_eq!(emails[1]["subject"], "No Subject");
        assert_eq!(emails[1]["from"], "Unknown Sender");
    }

    #[tokio::test]
    async fn test_google_failure_is_500_with_context() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"Insufficient Permission"}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let (status, body) = call(
            app,
            Request::builder()
                .uri("/gmail/read-emails")
                .header("x-api-key", "k")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error reading emails: "), "{}", detail);
        assert!(detail.contains("Insufficient Permission"));
    }

    #[tokio::test]
    async fn test_send_skips_missing_attachment_paths() {
        let mut server = mockito::Server::new_async().await;
        let send = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .match_body(Matcher::Regex(r#""raw":"#.into()))
            .with_status(200)
            .with_body(r#"{"id":"sent1","threadId":"t"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let attachment = dir.path().join("notes.txt");
        std::fs::write(&attachment, b"hello").unwrap();
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let request = serde_json::json!({
            "to": "to@example.com",
            "subject": "Notes",
            "body": "attached",
            "attachment_paths": [attachment.display().to_string(), "/does/not/exist.pdf"],
        });
        let (status, body) = call(
            app,
            Request::builder()
                .method("POST")
                .uri("/gmail/write-and-send-email")
                .header("x-api-key", "k")
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await;

        send.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message_id"], "sent1");
        assert_eq!(body["details"]["attachments"], serde_json::json!(["notes.txt"]));
    }

    #[tokio::test]
    async fn test_send_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), Some("k"), "http://127.0.0.1:9"), "http://127.0.0.1:9"));
        let (status, body) = call(
            app,
            Request::builder()
                .method("POST")
                .uri("/gmail/write-and-send-email")
                .header("x-api-key", "k")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"to":"x"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_send_refuses_header_line_breaks() {
        let mut server = mockito::Server::new_async().await;
        let send = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let request = serde_json::json!({
            "to": "to@example.com",
            "subject": "hi\r\nBcc: evil@attacker.com",
            "body": "b",
        });
        let (status, body) = call(
            app,
            Request::builder()
                .method("POST")
                .uri("/gmail/write-and-send-email")
                .header("x-api-key", "k")
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await;

        send.assert_async().await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("subject"));
    }

    #[tokio::test]
    async fn test_download_saves_files_and_labels_message() {
        let mut server = mockito::Server::new_async().await;
        let _message = server
            .mock("GET", "/gmail/v1/users/me/messages/m1")
            .with_status(200)
            .with_body(
                r#"{"id":"m1","payload":{"mimeType":"multipart/mixed","parts":[
                    {"mimeType":"text/plain","filename":"","body":{"size":5}},
                    {"mimeType":"multipart/alternative","parts":[
                        {"mimeType":"application/pdf","filename":"../report.pdf","body":{"attachmentId":"att1","size":5}}
                    ]}
                ]}}"#,
            )
            .create_async()
            .await;
        let _attachment = server
            .mock("GET", "/gmail/v1/users/me/messages/m1/attachments/att1")
            .with_status(200)
            .with_body(r#"{"data":"aGVsbG8","size":5}"#)
            .create_async()
            .await;
        let _labels = server
            .mock("GET", "/gmail/v1/users/me/labels")
            .with_status(200)
            .with_body(r#"{"labels":[{"id":"INBOX","name":"INBOX"}]}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/gmail/v1/users/me/labels")
            .match_body(Matcher::PartialJsonString(
                r#"{"name":"Downloaded","labelListVisibility":"labelShow","messageListVisibility":"show"}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"id":"Label_7","name":"Downloaded"}"#)
            .create_async()
            .await;
        let modify = server
            .mock("POST", "/gmail/v1/users/me/messages/m1/modify")
            .match_body(Matcher::Json(serde_json::json!({"addLabelIds": ["Label_7"]})))
            .with_status(200)
            .with_body(r#"{"id":"m1"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let (status, body) = call(
            app,
            Request::builder()
                .uri("/gmail/download-attachments/m1")
                .header("x-api-key", "k")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        create.assert_async().await;
        modify.assert_async().await;
        assert_eq!(body["attachments"][0]["filename"], "report.pdf");
        let saved = dir.path().join("attachments").join("report.pdf");
        assert_eq!(std::fs::read(saved).unwrap(), b"hello");
        assert_eq!(
            body["message"],
            "Attachments downloaded and 'Downloaded' label applied to the email."
        );
    }

    #[tokio::test]
    async fn test_download_without_attachments_leaves_labels_alone() {
        let mut server = mockito::Server::new_async().await;
        let _message = server
            .mock("GET", "/gmail/v1/users/me/messages/m2")
            .with_status(200)
            .with_body(r#"{"id":"m2","payload":{"mimeType":"text/plain","body":{"size":3}}}"#)
            .create_async()
            .await;
        let labels = server
            .mock("GET", "/gmail/v1/users/me/labels")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), &server.url());
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        let (status, body) = call(
            app,
            Request::builder()
                .uri("/gmail/download-attachments/m2")
                .header("x-api-key", "k")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "No attachments found.");
        assert!(body["attachments"].as_array().unwrap().is_empty());
        labels.assert_async().await;
    }
}
