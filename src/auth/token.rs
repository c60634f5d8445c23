use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair carried by a session.
///
/// # Example
/// ```no_run
/// use bloxport::auth::Credential;
/// use chrono::{Duration, Utc};
///
/// let credential = Credential::new("access")
///     .with_refresh_token("refresh")
///     .with_expires_at(Utc::now() + Duration::minutes(15));
/// assert!(!credential.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the access token's known lifetime has elapsed.
    ///
    /// Tokens without a recorded expiry are treated as live; the remote API
    /// is the authority either way.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() >= at,
            None => false,
        }
    }
}
