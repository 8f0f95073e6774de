//! Google OAuth2 Provider
//!
//! Authorization-code flow with offline access. Client credentials come from
//! the client-secret JSON downloaded from Google Cloud Console, or from a
//! stored credential record when refreshing.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{error, info};

use super::{OAuthProvider, OAuthTokens};
use crate::auth::Credentials;
use crate::common::create_http_client;

// ── Google OAuth endpoints ──────────────────────────────────────────────────

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: Option<ClientSecrets>,
    installed: Option<ClientSecrets>,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    AUTH_ENDPOINT.to_string()
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

/// Google OAuth2 provider.
pub struct GoogleProvider {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl GoogleProvider {
    /// Parse a client-secret document (`{"web": …}` or `{"installed": …}`).
    pub fn from_client_secrets(raw: &str) -> Result<Self, String> {
        let file: ClientSecretsFile =
            serde_json::from_str(raw).map_err(|e| format!("Invalid client secrets JSON: {}", e))?;
        let secrets = file
            .web
            .or(file.installed)
            .ok_or("Client secrets must contain a 'web' or 'installed' section")?;

        Ok(Self {
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            auth_uri: secrets.auth_uri,
            token_uri: secrets.token_uri,
        })
    }

    /// Provider bound to the client that issued a stored credential record.
    pub fn from_credentials(creds: &Credentials) -> Self {
        Self {
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            auth_uri: default_auth_uri(),
            token_uri: creds.token_uri.clone(),
        }
    }

    /// Assemble the record written to the token file after a code exchange.
    pub fn credentials_from(&self, tokens: OAuthTokens, fallback_scopes: Vec<String>) -> Credentials {
        Credentials {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
            token_uri: self.token_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: if tokens.scopes.is_empty() {
                fallback_scopes
            } else {
                tokens.scopes
            },
        }
    }
}

impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorize_url(&self, scopes: &[String], state: &str, redirect_uri: &str) -> String {
        let scope_str = scopes.join(" ");
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent&include_granted_scopes=true",
            self.auth_uri,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope_str),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<OAuthTokens, String> {
        info!("Exchanging authorization code for tokens");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("code", code);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", redirect_uri);

        let response = post_form(&self.token_uri, &params).await?;
        parse_token_response(&response)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, String> {
        info!("Refreshing access token");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("refresh_token", refresh_token);
        params.insert("grant_type", "refresh_token");

        let response = post_form(&self.token_uri, &params).await?;
        parse_token_response(&response)
    }
}

// ── HTTP utilities ──────────────────────────────────────────────────────────

/// POST a form-encoded request and return the response body.
async fn post_form(url: &str, params: &HashMap<&str, &str>) -> Result<String, String> {
    let client = create_http_client()?;

    let response = client
        .post(url)
        .form(params)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        error!("HTTP error {}: {}", status, body);
        return Err(format!("HTTP {} error: {}", status, body));
    }

    response
        .text()
        .await
        .map_err(|e| format!("Failed to read response body: {}", e))
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(body: &str) -> Result<OAuthTokens, String> {
    let parsed: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid JSON response: {}", e))?;

    if let Some(err) = parsed.get("error").and_then(|v| v.as_str()) {
        let desc = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        return Err(format!("{}: {}", err, desc));
    }

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or("Missing access_token in response")?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        scopes,
    })
}

/// Random `state` value for the consent redirect.
pub fn generate_state() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::RngCore;

    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::default_scopes;

    const WEB_SECRETS: &str = r#"{"web":{"client_id":"cid.apps.googleusercontent.com","client_secret":"csecret","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token","redirect_uris":["http://127.0.0.1:8011/oauth2callback"]}}"#;

    #[test]
    fn test_client_secrets_web_and_installed() {
        let p = GoogleProvider::from_client_secrets(WEB_SECRETS).unwrap();
        assert_eq!(p.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(p.token_uri, TOKEN_ENDPOINT);

        let installed = r#"{"installed":{"client_id":"i","client_secret":"s"}}"#;
        let p = GoogleProvider::from_client_secrets(installed).unwrap();
        assert_eq!(p.auth_uri, AUTH_ENDPOINT);

        assert!(GoogleProvider::from_client_secrets(r#"{"other":{}}"#).is_err());
        assert!(GoogleProvider::from_client_secrets("not json").is_err());
    }

    #[test]
    fn test_authorize_url_params() {
        let p = GoogleProvider::from_client_secrets(WEB_SECRETS).unwrap();
        let url = p.authorize_url(&default_scopes(), "st8", "http://127.0.0.1:8011/oauth2callback");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8011%2Foauth2callback"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("include_granted_scopes=true"));
        assert!(url.contains("state=st8"));
        assert!(url.contains("gmail.readonly%20https"));
    }

    #[test]
    fn test_state_is_random() {
        let a = generate_state();
        assert_eq!(a.len(), 32);
        assert_ne!(a, generate_state());
    }

    #[test]
    fn test_parse_token_response() {
        let body = r#"{
            "access_token": "ya29.test",
            "refresh_token": "1//0e.test",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/gmail.modify https://www.googleapis.com/auth/calendar"
        }"#;
        let tokens = parse_token_response(body).unwrap();
        assert_eq!(tokens.access_token, "ya29.test");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//0e.test"));
        assert_eq!(tokens.scopes.len(), 2);

        let err = parse_token_response(r#"{"error":"invalid_grant","error_description":"Token has been revoked"}"#);
        assert_eq!(err.unwrap_err(), "invalid_grant: Token has been revoked");
    }

    #[test]
    fn test_credentials_from_falls_back_to_requested_scopes() {
        let p = GoogleProvider::from_client_secrets(WEB_SECRETS).unwrap();
        let tokens = OAuthTokens {
            access_token: "a".into(),
            refresh_token: None,
            scopes: vec![],
        };
        let creds = p.credentials_from(tokens, default_scopes());
        assert_eq!(creds.scopes.len(), 6);
        assert_eq!(creds.refresh_token, "");
        assert_eq!(creds.client_secret, "csecret");
    }

    #[tokio::test]
    async fn test_refresh_posts_refresh_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "r1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","expires_in":3600,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let provider = GoogleProvider {
            client_id: "cid".into(),
            client_secret: "cs".into(),
            auth_uri: default_auth_uri(),
            token_uri: format!("{}/token", server.url()),
        };
        let tokens = provider.refresh_token("r1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(tokens.access_token, "fresh");
    }
}
