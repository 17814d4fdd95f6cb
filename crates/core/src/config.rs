// Server configuration: defaults, optional JSON or .env file, environment overrides

use crate::error::{YouTubeError, YouTubeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dotenv file read when no JSON config is requested.
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_CREDENTIALS_FILE: &str = "OAUTH2_CREDENTIALS_FILE";
pub const ENV_TOKEN_FILE: &str = "TOKEN_FILE";
pub const ENV_SERVER_NAME: &str = "SERVER_NAME";
pub const ENV_SERVER_VERSION: &str = "SERVER_VERSION";
pub const ENV_SERVER_DESCRIPTION: &str = "SERVER_DESCRIPTION";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enables API-key mode when non-empty.
    #[serde(default)]
    pub youtube_api_key: String,

    /// OAuth2 client secret file, used when no API key is usable.
    #[serde(default = "default_credentials_file")]
    pub oauth2_credentials_file: PathBuf,

    /// Where the OAuth2 token is cached between runs.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    #[serde(default = "default_server_name")]
    pub server_name: String,

    #[serde(default = "default_server_version")]
    pub server_version: String,

    #[serde(default = "default_server_description")]
    pub server_description: String,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("client_secret.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_server_name() -> String {
    "youtube-mcp-server".to_string()
}

fn default_server_version() -> String {
    "1.0.0".to_string()
}

fn default_server_description() -> String {
    "YouTube Data API v3 MCP Server for video search, channel info, and more".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: String::new(),
            oauth2_credentials_file: default_credentials_file(),
            token_file: default_token_file(),
            server_name: default_server_name(),
            server_version: default_server_version(),
            server_description: default_server_description(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment, optionally layered
    /// over a JSON file.
    pub fn load(config_file: Option<&Path>) -> YouTubeResult<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Load configuration using `env` to look up variables.
    ///
    /// A missing JSON file yields the defaults. Non-empty environment values
    /// override file values.
    pub fn load_with<F>(config_file: Option<&Path>, env: F) -> YouTubeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_file {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    YouTubeError::Config(format!(
                        "failed to read configuration file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    YouTubeError::Config(format!(
                        "failed to parse configuration file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            Some(path) => {
                tracing::info!(path = %path.display(), "Configuration file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(env);
        Ok(config)
    }

    /// Load configuration from an optional dotenv file and the process
    /// environment. Variables already set in the environment win.
    pub fn load_env_file(dotenv: &Path) -> YouTubeResult<Self> {
        Self::load_env_file_with(dotenv, |key| std::env::var(key).ok())
    }

    pub fn load_env_file_with<F>(dotenv: &Path, env: F) -> YouTubeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_env_file(dotenv)?;
        Self::load_with(None, |key| {
            env(key)
                .filter(|value| !value.is_empty())
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.youtube_api_key = api_key;
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_FILE) {
            self.oauth2_credentials_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE) {
            self.token_file = PathBuf::from(path);
        }
        if let Some(name) = lookup(ENV_SERVER_NAME) {
            self.server_name = name;
        }
        if let Some(version) = lookup(ENV_SERVER_VERSION) {
            self.server_version = version;
        }
        if let Some(description) = lookup(ENV_SERVER_DESCRIPTION) {
            self.server_description = description;
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> YouTubeResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| YouTubeError::Config(format!("failed to serialize configuration: {}", e)))?;
        std::fs::write(path, json).map_err(|e| {
            YouTubeError::Config(format!(
                "failed to write configuration file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.youtube_api_key.trim().is_empty()
    }

    /// Pre-flight check: at least one credential source must be available.
    pub fn has_credentials(&self) -> bool {
        self.has_api_key() || self.oauth2_credentials_file.exists()
    }
}

/// Variables from a dotenv file. A missing file is empty.
fn read_env_file(path: &Path) -> YouTubeResult<HashMap<String, String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "No .env file found");
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(YouTubeError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    entries
        .map(|entry| {
            entry.map_err(|e| {
                YouTubeError::Config(format!("failed to parse {}: {}", path.display(), e))
            })
        })
        .collect()
}
