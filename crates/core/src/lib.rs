// Core of the YouTube MCP server: configuration, credentials, the YouTube
// Data API gateway and the projections returned to tool callers.

pub mod auth;
pub mod config;
pub mod error;
pub mod projection;
pub mod youtube;

pub use auth::{AuthMode, AuthorizationPrompt, ConsolePrompt, CredentialBroker, Credentials};
pub use config::Config;
pub use error::{YouTubeError, YouTubeResult};
pub use youtube::{YouTubeApi, YouTubeClient};
