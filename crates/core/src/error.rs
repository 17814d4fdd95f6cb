// Error taxonomy shared by the credential broker, gateway and tool layer

/// Result type for YouTube MCP operations.
pub type YouTubeResult<T> = Result<T, YouTubeError>;

/// Errors that can occur while setting up credentials or serving a tool call.
///
/// `Config` and `Auth` are startup errors and are fatal to the process.
/// The remaining variants are per-call and are returned to the caller as a
/// failed tool result.
#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    /// Missing or malformed configuration / credentials file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Interactive authorization or token cache failure.
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Tool arguments failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or API failure, including quota and authorization rejections.
    #[error("error {operation}: {message}")]
    Upstream {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// A singular lookup returned zero results.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl YouTubeError {
    /// Name of the error category, stable for callers that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Auth(_) => "auth_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Upstream { .. } => "upstream_error",
            Self::NotFound { .. } => "not_found",
        }
    }

    /// Whether this error must abort process startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(_))
    }

    pub(crate) fn upstream(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            operation,
            status: None,
            message: message.into(),
        }
    }
}
