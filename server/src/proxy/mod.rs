//! HTTP Surface
//!
//! axum router exposing Gmail, Calendar and caption endpoints. Everything but
//! the welcome page and the OAuth consent pair sits behind the API-key guard.

pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

pub use server::ProxyServer;

use crate::auth::api_key::require_api_key;
use crate::auth::TokenStore;
use crate::captions::CaptionFetcher;
use crate::config::Config;
use crate::google::calendar_api::CALENDAR_API_BASE;
use crate::google::gmail::GMAIL_API_BASE;

/// Largest multipart body accepted by the upload endpoint.
const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// State shared by every handler
pub struct AppState {
    pub config: Config,
    pub tokens: TokenStore,
    pub captions: CaptionFetcher,
    /// REST roots, replaceable in tests
    pub gmail_base: String,
    pub calendar_base: String,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, String> {
        let captions = CaptionFetcher::new(&config.youtube_base_url)?;
        Ok(Arc::new(Self {
            tokens: TokenStore::new(config.token_file.clone()),
            captions,
            gmail_base: GMAIL_API_BASE.to_string(),
            calendar_base: CALENDAR_API_BASE.to_string(),
            config,
        }))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    use handlers::{auth, captions, gmail, google_calendar};

    let protected = Router::new()
        .route("/health/token", get(auth::token_health))
        .route("/gmail/read-emails", get(gmail::read_emails))
        .route("/gmail/send-email", post(gmail::send_email))
        .route("/gmail/write-and-send-email", post(gmail::write_and_send_email))
        .route(
            "/gmail/write-and-send-email-with-uploads",
            post(gmail::send_email_with_uploads).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/gmail/download-attachments/{message_id}", get(gmail::download_attachments))
        .route("/calendar/create-reminder", post(google_calendar::create_reminder))
        .route("/calendar/read-reminders", get(google_calendar::read_reminders))
        .route("/calendar/remove-reminder", delete(google_calendar::remove_reminder))
        .route("/get-youtube-captions/{video_id}", get(captions::captions_by_id))
        .route("/get-youtube-captions-by-url", get(captions::captions_by_url))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/", get(auth::home))
        .route("/authenticate", get(auth::authenticate))
        .route("/oauth2callback", get(auth::oauth2callback))
        .merge(protected)
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn get(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_home_is_public() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), Some("k"), "http://127.0.0.1:9"), "http://127.0.0.1:9"));
        let (status, body) = send(app, get("/", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("Welcome"));
    }

    #[tokio::test]
    async fn test_missing_token_is_401_before_google() {
        let mut server = mockito::Server::new_async().await;
        let google = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), Some("k"), &server.url()), &server.url()));

        for uri in ["/gmail/read-emails", "/calendar/read-reminders", "/health/token"] {
            let (status, body) = send(app.clone(), get(uri, Some("k"))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["detail"], "Token not found. Authenticate via /authenticate.");
        }
        google.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_key_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), Some("s3cret"), "http://127.0.0.1:9"), "http://127.0.0.1:9"));

        let (status, body) = send(app.clone(), get("/gmail/read-emails", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Unauthorized: Missing X-API-Key header");

        for wrong in ["nope", "S3CRET", "s3cret!", "s3cre"] {
            let (status, body) = send(app.clone(), get("/gmail/read-emails", Some(wrong))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", wrong);
            assert_eq!(body["detail"], "Unauthorized: Invalid API key");
        }
    }

    #[tokio::test]
    async fn test_unconfigured_key_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), None, "http://127.0.0.1:9"), "http://127.0.0.1:9"));
        let (status, body) = send(app, get("/calendar/read-reminders", Some("anything"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Server configuration error: API_KEY not set");
    }

    #[tokio::test]
    async fn test_token_health_reports_scopes() {
        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), "http://127.0.0.1:9");
        let app = router(state(config(dir.path(), Some("k"), "http://127.0.0.1:9"), "http://127.0.0.1:9"));

        let (status, body) = send(app, get("/health/token", Some("k"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["scopes"].as_array().unwrap().len(), 6);
    }
}
