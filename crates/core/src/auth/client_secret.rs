// OAuth2 client descriptor as downloaded from the Google Cloud console

use crate::error::{YouTubeError, YouTubeResult};
use serde::Deserialize;
use std::path::Path;

/// Read-only access to the authorized account's YouTube data.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

/// Client id/secret and endpoint URIs for the authorization-code flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecret {
    /// Parse a client secret document. Either the `installed` or the `web`
    /// section must be present, with at least one redirect URI.
    pub fn from_json(bytes: &[u8]) -> YouTubeResult<Self> {
        let file: ClientSecretFile = serde_json::from_slice(bytes)
            .map_err(|e| YouTubeError::Config(format!("unable to parse client secret file: {}", e)))?;

        let secret = file.installed.or(file.web).ok_or_else(|| {
            YouTubeError::Config(
                "unable to parse client secret file: expected an \"installed\" or \"web\" section"
                    .to_string(),
            )
        })?;

        if secret.redirect_uris.is_empty() {
            return Err(YouTubeError::Config(
                "unable to parse client secret file: missing redirect URL".to_string(),
            ));
        }

        Ok(secret)
    }

    pub fn from_file(path: &Path) -> YouTubeResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            YouTubeError::Config(format!(
                "unable to read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&bytes)
    }

    /// The redirect URI sent with both the consent URL and the code exchange.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris.first().map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "123.apps.googleusercontent.com",
            "project_id": "demo",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "shh",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"]
        }
    }"#;

    #[test]
    fn test_parse_installed() {
        let secret = ClientSecret::from_json(INSTALLED.as_bytes()).unwrap();

        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shh");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
        assert_eq!(secret.redirect_uri(), "urn:ietf:wg:oauth:2.0:oob");
    }

    #[test]
    fn test_parse_web() {
        let json = INSTALLED.replace("installed", "web");
        let secret = ClientSecret::from_json(json.as_bytes()).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
    }

    #[test]
    fn test_missing_section() {
        let err = ClientSecret::from_json(br#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, YouTubeError::Config(_)));
    }

    #[test]
    fn test_missing_redirect_uri() {
        let json = r#"{"installed": {"client_id": "a", "client_secret": "b",
            "auth_uri": "https://a", "token_uri": "https://t"}}"#;
        let err = ClientSecret::from_json(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("redirect"));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecret::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, YouTubeError::Config(_)));
    }
}
