// Authorization-code flow against the client's token endpoint

use super::client_secret::ClientSecret;
use super::token::{Token, TokenResponse};
use crate::error::{YouTubeError, YouTubeResult};
use chrono::Utc;
use serde::Deserialize;
use url::Url;

/// Error body returned by OAuth2 token endpoints.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Builds consent URLs and talks to the token endpoint.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    http: reqwest::Client,
    secret: ClientSecret,
    scope: String,
}

impl OAuth2Client {
    pub fn new(http: reqwest::Client, secret: ClientSecret, scope: impl Into<String>) -> Self {
        Self {
            http,
            secret,
            scope: scope.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.secret.client_id
    }

    /// Consent URL the operator opens in a browser. Offline access is
    /// requested so that a refresh token is issued.
    pub fn authorization_url(&self, state: &str) -> YouTubeResult<Url> {
        Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("access_type", "offline"),
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", self.secret.redirect_uri()),
                ("response_type", "code"),
                ("scope", self.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| YouTubeError::Config(format!("invalid auth_uri {}: {}", self.secret.auth_uri, e)))
    }

    /// Exchange a one-time authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> YouTubeResult<Token> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.secret.redirect_uri()),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ];

        let response = self.request_token(&form).await?;
        Ok(response.into_token(Utc::now(), None))
    }

    /// Obtain a fresh access token using a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> YouTubeResult<Token> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ];

        let response = self.request_token(&form).await?;
        Ok(response.into_token(Utc::now(), Some(refresh_token)))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> YouTubeResult<TokenResponse> {
        tracing::debug!(token_uri = %self.secret.token_uri, "Requesting OAuth2 token");

        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| YouTubeError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| YouTubeError::Auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(YouTubeError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| YouTubeError::Auth(format!("unable to parse token response: {}", e)))
    }
}
