// Credential broker: picks API-key or OAuth2 mode and yields the single
// authenticated handle used for the rest of the process lifetime.

pub mod client_secret;
pub mod oauth;
pub mod token;

pub use client_secret::{ClientSecret, YOUTUBE_READONLY_SCOPE};
pub use oauth::OAuth2Client;
pub use token::Token;

use crate::config::Config;
use crate::error::{YouTubeError, YouTubeResult};
use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio::sync::RwLock;
use url::Url;

/// Which authentication mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    ApiKey,
    OAuth2,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey => write!(f, "api_key"),
            Self::OAuth2 => write!(f, "oauth2"),
        }
    }
}

/// Authenticated handle for upstream requests.
#[derive(Debug)]
pub enum Credentials {
    /// Public data access with an API key (no user identity).
    ApiKey(String),
    /// Requests on behalf of the user who completed the consent flow.
    OAuth2(OAuth2Session),
}

impl Credentials {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::ApiKey(_) => AuthMode::ApiKey,
            Self::OAuth2(_) => AuthMode::OAuth2,
        }
    }

    /// Attach credentials to an outgoing request. `operation` labels any
    /// failure to obtain a usable access token.
    pub async fn authorize(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> YouTubeResult<reqwest::RequestBuilder> {
        match self {
            Self::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            Self::OAuth2(session) => {
                let header = session.authorization_header(operation).await?;
                Ok(request.header(reqwest::header::AUTHORIZATION, header))
            }
        }
    }
}

/// OAuth2 client plus the token currently in use.
#[derive(Debug)]
pub struct OAuth2Session {
    client: OAuth2Client,
    token: RwLock<Token>,
}

impl OAuth2Session {
    pub fn new(client: OAuth2Client, token: Token) -> Self {
        Self {
            client,
            token: RwLock::new(token),
        }
    }

    pub async fn token(&self) -> Token {
        self.token.read().await.clone()
    }

    /// Current `Authorization` header value. An expired token with a refresh
    /// token is refreshed in memory first; the interactive flow is never
    /// re-entered from here.
    async fn authorization_header(&self, operation: &'static str) -> YouTubeResult<String> {
        {
            let token = self.token.read().await;
            if !token.is_expired(Utc::now()) || !token.can_refresh() {
                return Ok(token.authorization_header());
            }
        }

        let mut token = self.token.write().await;
        // Another request may have refreshed while we waited for the lock
        if token.is_expired(Utc::now()) {
            tracing::info!(client_id = %self.client.client_id(), "Refreshing expired OAuth2 access token");
            let refreshed = self
                .client
                .refresh(&token.refresh_token)
                .await
                .map_err(|e| YouTubeError::upstream(operation, format!("token refresh failed: {}", e)))?;
            *token = refreshed;
        }

        Ok(token.authorization_header())
    }
}

/// Operator interaction for the one-time consent step.
pub trait AuthorizationPrompt: Send {
    /// Show the consent URL to the operator.
    fn present(&mut self, url: &Url) -> std::io::Result<()>;

    /// Block until the operator supplies the authorization code.
    fn read_code(&mut self) -> std::io::Result<String>;
}

/// Prompts on stderr and reads the code from stdin.
///
/// stdout is left untouched because it carries the protocol stream.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl AuthorizationPrompt for ConsolePrompt {
    fn present(&mut self, url: &Url) -> std::io::Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(
            stderr,
            "Go to the following link in your browser then type the authorization code:\n{}",
            url
        )?;
        stderr.flush()
    }

    fn read_code(&mut self) -> std::io::Result<String> {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Resolves the authentication mode from configuration.
pub struct CredentialBroker {
    api_key: String,
    credentials_file: PathBuf,
    token_file: PathBuf,
    http: reqwest::Client,
}

impl CredentialBroker {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            api_key: config.youtube_api_key.clone(),
            credentials_file: config.oauth2_credentials_file.clone(),
            token_file: config.token_file.clone(),
            http,
        }
    }

    /// Produce the authenticated handle. The API key wins when it is usable;
    /// otherwise the OAuth2 path runs, prompting the operator only when no
    /// cached token exists. Every error returned here is fatal to startup.
    pub async fn acquire(&self, prompt: &mut dyn AuthorizationPrompt) -> YouTubeResult<Credentials> {
        if !self.api_key.is_empty() {
            match api_key_credentials(&self.api_key) {
                Ok(credentials) => {
                    tracing::info!(mode = %AuthMode::ApiKey, "Using YouTube API key");
                    return Ok(credentials);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to use API key, falling back to OAuth2");
                }
            }
        }

        self.oauth2_credentials(prompt).await
    }

    /// OAuth2 path only: load the client descriptor, then reuse the cached
    /// token or run the interactive exchange and persist its result.
    async fn oauth2_credentials(
        &self,
        prompt: &mut dyn AuthorizationPrompt,
    ) -> YouTubeResult<Credentials> {
        let client = self.oauth2_client()?;

        let token = match Token::load(&self.token_file)? {
            Some(token) => {
                tracing::info!(path = %self.token_file.display(), "Using cached OAuth2 token");
                token
            }
            None => self.authorize_and_save(&client, prompt).await?,
        };

        tracing::info!(mode = %AuthMode::OAuth2, "Using OAuth2 credentials");
        Ok(Credentials::OAuth2(OAuth2Session::new(client, token)))
    }

    /// Always run the interactive exchange, replacing any cached token.
    pub async fn reauthorize(&self, prompt: &mut dyn AuthorizationPrompt) -> YouTubeResult<Token> {
        let client = self.oauth2_client()?;
        self.authorize_and_save(&client, prompt).await
    }

    fn oauth2_client(&self) -> YouTubeResult<OAuth2Client> {
        let secret = ClientSecret::from_file(&self.credentials_file)?;
        Ok(OAuth2Client::new(self.http.clone(), secret, YOUTUBE_READONLY_SCOPE))
    }

    async fn authorize_and_save(
        &self,
        client: &OAuth2Client,
        prompt: &mut dyn AuthorizationPrompt,
    ) -> YouTubeResult<Token> {
        let token = self.authorize_interactively(client, prompt).await?;
        tracing::info!(path = %self.token_file.display(), "Saving OAuth2 token");
        token.save(&self.token_file)?;
        Ok(token)
    }

    async fn authorize_interactively(
        &self,
        client: &OAuth2Client,
        prompt: &mut dyn AuthorizationPrompt,
    ) -> YouTubeResult<Token> {
        let state = uuid::Uuid::new_v4().to_string();
        let url = client.authorization_url(&state)?;

        prompt
            .present(&url)
            .map_err(|e| YouTubeError::Auth(format!("unable to show authorization URL: {}", e)))?;
        let code = prompt
            .read_code()
            .map_err(|e| YouTubeError::Auth(format!("unable to read authorization code: {}", e)))?;

        if code.is_empty() {
            return Err(YouTubeError::Auth("no authorization code entered".to_string()));
        }

        client.exchange_code(&code).await
    }
}

/// API keys travel as a query parameter, so anything blank or containing
/// whitespace/control characters cannot be used.
fn api_key_credentials(key: &str) -> YouTubeResult<Credentials> {
    if key.trim().is_empty() {
        return Err(YouTubeError::Config("API key is blank".to_string()));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(YouTubeError::Config(
            "API key contains whitespace or control characters".to_string(),
        ));
    }
    Ok(Credentials::ApiKey(key.to_string()))
}
