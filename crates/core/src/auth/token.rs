// OAuth2 token record and its on-disk cache

use crate::error::{YouTubeError, YouTubeResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Tokens are treated as expired slightly ahead of their real expiry.
const EXPIRY_SKEW_SECS: i64 = 10;

/// Cached access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Expiry, ignoring the pre-epoch zero timestamps some tools write for
    /// "never expires".
    pub fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|expiry| expiry.timestamp() > 0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.effective_expiry() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Value for the `Authorization` header. Google always issues bearer tokens.
    pub fn authorization_header(&self) -> String {
        let token_type = match self.token_type.as_str() {
            "" => "Bearer",
            t if t.eq_ignore_ascii_case("bearer") => "Bearer",
            t => t,
        };
        format!("{} {}", token_type, self.access_token)
    }

    /// Read a cached token. A missing file is `Ok(None)`; a file that exists
    /// but cannot be read or parsed is an authorization error.
    pub fn load(path: &Path) -> YouTubeResult<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(YouTubeError::Auth(format!(
                    "unable to read token file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let token: Self = serde_json::from_str(&content).map_err(|e| {
            YouTubeError::Auth(format!(
                "unable to parse token file {}: {}",
                path.display(),
                e
            ))
        })?;

        if token.access_token.is_empty() {
            return Err(YouTubeError::Auth(format!(
                "token file {} has no access token",
                path.display()
            )));
        }

        Ok(Some(token))
    }

    /// Write the token, replacing any previous cache. Owner-only on unix.
    pub fn save(&self, path: &Path) -> YouTubeResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| save_error(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_error(path, e))?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(|e| save_error(path, e))?;
        file.write_all(json.as_bytes()).map_err(|e| save_error(path, e))?;
        file.flush().map_err(|e| save_error(path, e))?;

        Ok(())
    }
}

fn save_error(path: &Path, e: impl std::fmt::Display) -> YouTubeError {
    YouTubeError::Auth(format!("unable to cache oauth token to {}: {}", path.display(), e))
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Convert to a token record. A refresh response usually omits the
    /// refresh token, in which case `previous_refresh` is carried over.
    pub fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<&str>) -> Token {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default();

        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token,
            expiry: self
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| now + Duration::seconds(secs)),
        }
    }
}
