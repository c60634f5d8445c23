//! Error types for bloxport.

use thiserror::Error;

/// Primary error type for all bloxport operations.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not authenticated: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Remote API error (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record store error: {0}")]
    Persistence(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl PublishError {
    /// Create a remote API error from an HTTP status and raw body.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Whether this failure carries the invalid-token signature the
    /// Open Cloud API uses for expired or revoked access tokens.
    ///
    /// A 401 always qualifies; some gateways answer other statuses with a
    /// body that names the token, so the body is checked too.
    pub fn is_invalid_token(&self) -> bool {
        match self {
            Self::Remote { status: 401, .. } => true,
            Self::Remote { body, .. } => {
                let body = body.to_ascii_lowercase();
                body.contains("invalid token")
                    || body.contains("token is expired")
                    || body.contains("unauthenticated")
            }
            _ => false,
        }
    }

    /// Whether the error is worth swallowing inside a polling window.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Remote { status: 429 | 500..=599, .. }
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PublishError>;
