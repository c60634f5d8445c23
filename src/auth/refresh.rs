use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{PublishError, Result};

use super::token::Credential;

/// Issues fresh credentials when the current access token is rejected.
///
/// The publish pipeline calls this at most once per submission; everything
/// else about the token's lifecycle belongs to the caller's session layer.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Exchange the refresh token for a new credential pair.
    async fn refresh(&self, current: &Credential) -> Result<Credential>;
}

/// [`TokenSource`] backed by the OAuth `refresh_token` grant.
///
/// # Example
/// ```no_run
/// use bloxport::auth::OAuthTokenSource;
/// use bloxport::Config;
///
/// let tokens = OAuthTokenSource::new(Config::default(), "client-id", "client-secret");
/// ```
pub struct OAuthTokenSource {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthTokenSource {
    pub fn new(
        config: Config,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: format!("{}/v1/token", config.oauth_base_url),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

#[async_trait]
impl TokenSource for OAuthTokenSource {
    async fn refresh(&self, current: &Credential) -> Result<Credential> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or_else(|| PublishError::Refresh("no refresh token in session".to_string()))?;

        debug!(token_url = %self.token_url, "refreshing access token");

        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Refresh(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let payload: RefreshResponse = resp.json().await?;
        let expires_at = payload
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(Credential {
            access_token: payload.access_token,
            // The issuer may rotate the refresh token; keep the old one when
            // it does not.
            refresh_token: payload
                .refresh_token
                .or_else(|| current.refresh_token.clone()),
            expires_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}
