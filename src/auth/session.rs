//! Signed session artifact.
//!
//! The browser-facing session is an HS256 JWT carrying the credential triple
//! plus the opaque `user` and `resources` payloads captured at login. After
//! a mid-pipeline token refresh the caller must re-sign and re-set the
//! cookie, otherwise the refreshed tokens are lost with the request.

use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PublishError, Result};

use super::token::Credential;

pub const COOKIE_NAME: &str = "rbx_session";

const SESSION_TTL_DAYS: i64 = 7;

/// Contents of the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPayload {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access-token expiry, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Userinfo payload as returned by the OAuth provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// Granted-resources payload, used for creator discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
}

impl SessionPayload {
    pub fn new(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            expires_at: credential.expires_at.map(|at| at.timestamp()),
            user: None,
            resources: None,
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_resources(mut self, resources: Value) -> Self {
        self.resources = Some(resources);
        self
    }

    /// The credential triple in pipeline form.
    pub fn credential(&self) -> Credential {
        Credential {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self
                .expires_at
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    /// Fold a refreshed credential back in, keeping user and resources.
    pub fn apply_refresh(&mut self, credential: &Credential) {
        self.access_token = credential.access_token.clone();
        self.refresh_token = credential.refresh_token.clone();
        self.expires_at = credential.expires_at.map(|at| at.timestamp());
    }

    /// Stable owner id for upload records: `user.sub`, then `user.userId`.
    pub fn owner_id(&self) -> String {
        let from_user = |key: &str| -> Option<String> {
            let value = self.user.as_ref()?.get(key)?;
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };
        from_user("sub")
            .or_else(|| from_user("userId"))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Serialize, Deserialize)]
struct Claims {
    exp: i64,
    iat: i64,
    #[serde(flatten)]
    session: SessionPayload,
}

/// Sign a session payload into a JWT valid for seven days.
pub fn sign_session(payload: &SessionPayload, secret: &[u8]) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        iat: now.timestamp(),
        session: payload.clone(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| PublishError::Session(e.to_string()))
}

/// Verify and read a session token. Bad signature or expired → `None`,
/// mirroring "not logged in" rather than an error.
pub fn read_session(token: &str, secret: &[u8]) -> Option<SessionPayload> {
    let validation = Validation::default();
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .ok()
        .map(|data| data.claims.session)
}

/// Render the `Set-Cookie` header value for a signed session token.
///
/// HttpOnly, SameSite=Lax, scoped to `/`; `Secure` when the app is served
/// over TLS.
pub fn set_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Render a `Set-Cookie` value that clears the session.
pub fn clear_cookie() -> String {
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
