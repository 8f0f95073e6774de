//! Auth Handler
//!
//! Welcome page, the OAuth consent redirect and callback, and a token check.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use axum::Json;
use gbridge_protocol::{MessageResponse, TokenHealth};
use serde::Deserialize;
use tracing::info;

use super::common::ApiQuery;
use crate::auth::default_scopes;
use crate::auth::provider::google::{generate_state, GoogleProvider};
use crate::auth::provider::OAuthProvider;
use crate::common::{AppError, AppResult};
use crate::proxy::AppState;

pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Gmail API Web App!".to_string(),
    })
}

fn provider(state: &AppState, missing: &str) -> AppResult<GoogleProvider> {
    let raw = state
        .config
        .google_credentials
        .as_deref()
        .ok_or_else(|| AppError::config_missing(missing))?;
    GoogleProvider::from_client_secrets(raw).map_err(AppError::config_missing)
}

/// Redirect to Google's consent page.
pub async fn authenticate(State(state): State<Arc<AppState>>) -> AppResult<Redirect> {
    let google = provider(&state, "Missing credentials. Set GOOGLE_CREDENTIALS in .env.")?;
    let url = google.authorize_url(&default_scopes(), &generate_state(), &state.config.oauth_redirect_uri);

    info!("Redirecting to {} consent page", google.name());
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// Exchange the authorization code and write the token file.
pub async fn oauth2callback(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> AppResult<Json<MessageResponse>> {
    let google = provider(&state, "GOOGLE_CREDENTIALS not found in .env.")?;

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(AppError::bad_request(format!(
            "Authorization code not found. Error: {}",
            params.error.as_deref().unwrap_or("none given")
        )));
    };

    let tokens = google
        .exchange_code(&code, &state.config.oauth_redirect_uri)
        .await
        .map_err(|e| AppError::upstream("Error during OAuth callback", e))?;

    let creds = google.credentials_from(tokens, default_scopes());
    state.tokens.save(&creds).await?;

    Ok(Json(MessageResponse {
        message: format!(
            "Authentication completed successfully, token saved to {}",
            state.tokens.path().display()
        ),
    }))
}

/// Whether the token file is present and complete.
pub async fn token_health(State(state): State<Arc<AppState>>) -> AppResult<Json<TokenHealth>> {
    let creds = state.tokens.load().await?;
    Ok(Json(TokenHealth {
        status: "ok".to_string(),
        token_file: state.tokens.path().display().to_string(),
        scopes: creds.scopes.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::proxy::router;
    use crate::proxy::test_support::{config, state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn secrets(remote: &str) -> String {
        serde_json::json!({
            "web": {
                "client_id": "cid.apps.googleusercontent.com",
                "client_secret": "csecret",
                "auth_uri": format!("{}/auth", remote),
                "token_uri": format!("{}/token", remote),
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_authenticate_redirects_to_consent() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), Some("k"), "http://127.0.0.1:9");
        cfg.google_credentials = Some(secrets("https://accounts.test"));
        let app = router(state(cfg, "http://127.0.0.1:9"));

        let response = app
            .oneshot(Request::builder().uri("/authenticate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.test/auth?response_type=code"));
        assert!(location.contains("access_type=offline"));
        assert!(location.contains("prompt=consent"));
    }

    #[tokio::test]
    async fn test_authenticate_without_secrets_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(config(dir.path(), Some("k"), "http://127.0.0.1:9"), "http://127.0.0.1:9"));
        let response = app
            .oneshot(Request::builder().uri("/authenticate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_callback_without_code_names_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), Some("k"), "http://127.0.0.1:9");
        cfg.google_credentials = Some(secrets("https://accounts.test"));
        let app = router(state(cfg, "http://127.0.0.1:9"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/oauth2callback?error=access_denied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Authorization code not found. Error: access_denied");
    }

    #[tokio::test]
    async fn test_callback_writes_token_file() {
        let mut server = mockito::Server::new_async().await;
        let _token = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded("code".into(), "4/abc".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.new","refresh_token":"1//r","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), Some("k"), "http://127.0.0.1:9");
        cfg.google_credentials = Some(secrets(&server.url()));
        let app = router(state(cfg, "http://127.0.0.1:9"));

        let response = app
            .oneshot(Request::builder().uri("/oauth2callback?code=4/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("token.json")).unwrap()).unwrap();
        assert_eq!(saved["token"], "ya29.new");
        assert_eq!(saved["refresh_token"], "1//r");
        assert_eq!(saved["client_id"], "cid.apps.googleusercontent.com");
        assert_eq!(saved["scopes"].as_array().unwrap().len(), 6);
    }
}
