//! Open Cloud assets API client.
//!
//! Stateless wrapper over the two remote calls the pipeline needs: multipart
//! asset submission and operation status reads. Retry policy lives in
//! [`publish`](crate::publish), not here.

pub mod operation;

pub use operation::{extract_asset_id, OperationHandle, OperationStatus};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use crate::auth::Credential;
use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::types::{AssetKind, Creator, CreatorKind};

/// One asset submission.
#[derive(Debug, Clone)]
pub struct CreateAssetRequest {
    pub creator: Creator,
    pub display_name: String,
    pub kind: AssetKind,
    pub content: Vec<u8>,
    pub file_name: String,
    pub expected_price: u64,
}

impl CreateAssetRequest {
    pub fn new(
        creator: Creator,
        display_name: impl Into<String>,
        kind: AssetKind,
        content: Vec<u8>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            creator,
            display_name: display_name.into(),
            kind,
            content,
            file_name: file_name.into(),
            expected_price: 0,
        }
    }

    pub fn with_expected_price(mut self, expected_price: u64) -> Self {
        self.expected_price = expected_price;
        self
    }
}

/// The remote calls the publish pipeline depends on.
///
/// Implemented by [`AssetsClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait AssetApi: Send + Sync {
    /// Submit an asset; returns the handle of the publish operation.
    async fn create_asset(
        &self,
        credential: &Credential,
        request: &CreateAssetRequest,
    ) -> Result<OperationHandle>;

    /// Read the current status of a publish operation.
    async fn get_operation(
        &self,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> Result<OperationStatus>;
}

/// HTTP client for the Open Cloud assets API.
///
/// # Example
/// ```no_run
/// use bloxport::client::AssetsClient;
/// use bloxport::Config;
///
/// let client = AssetsClient::new(Config::default());
/// ```
pub struct AssetsClient {
    config: Config,
    client: reqwest::Client,
}

impl AssetsClient {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { config, client }
    }

    fn request_part(&self, request: &CreateAssetRequest) -> Result<String> {
        let creator_id: u64 = request.creator.id.parse().map_err(|_| {
            PublishError::Validation(format!("creator id is not numeric: {}", request.creator.id))
        })?;
        let creator = match request.creator.kind {
            CreatorKind::User => serde_json::json!({ "userId": creator_id }),
            CreatorKind::Group => serde_json::json!({ "groupId": creator_id }),
        };
        let payload = serde_json::json!({
            "assetType": request.kind.as_str(),
            "displayName": request.display_name,
            "description": "",
            "creationContext": {
                "creator": creator,
                "expectedPrice": request.expected_price,
            }
        });
        Ok(payload.to_string())
    }
}

#[async_trait]
impl AssetApi for AssetsClient {
    async fn create_asset(
        &self,
        credential: &Credential,
        request: &CreateAssetRequest,
    ) -> Result<OperationHandle> {
        let url = format!("{}/v1/assets", self.config.assets_base_url);
        debug!(
            creator = %request.creator,
            kind = %request.kind,
            name = %request.display_name,
            "submitting asset"
        );

        let form = Form::new()
            .text("request", self.request_part(request)?)
            .part(
                "fileContent",
                Part::bytes(request.content.clone()).file_name(request.file_name.clone()),
            );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&credential.access_token)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(PublishError::remote(status, body));
        }

        let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let handle = ["path", "operationPath", "operation"]
            .iter()
            .find_map(|key| payload.get(key).and_then(Value::as_str))
            .map(OperationHandle::new);
        handle.ok_or_else(|| {
            PublishError::remote(status, format!("no operation path returned: {body}"))
        })
    }

    async fn get_operation(
        &self,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> Result<OperationStatus> {
        let url = handle.url(&self.config.assets_base_url);
        debug!(operation = %handle, "reading operation status");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(PublishError::remote(status, body));
        }

        let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        Ok(OperationStatus::from_value(payload))
    }
}
