//! OAuth Provider Abstraction

pub mod google;

/// Tokens returned from an OAuth token exchange or refresh.
#[derive(Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth provider trait.
///
/// A provider builds the consent URL, exchanges the authorization code and
/// refreshes access tokens.
#[allow(async_fn_in_trait)]
pub trait OAuthProvider {
    /// Provider name (e.g. "google")
    fn name(&self) -> &str;

    /// Build the consent URL for the authorization-code flow.
    fn authorize_url(&self, scopes: &[String], state: &str, redirect_uri: &str) -> String;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<OAuthTokens, String>;

    /// Obtain a fresh access token from a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, String>;
}
