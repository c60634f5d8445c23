//! Long-running operation handles and statuses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque reference to an asynchronous remote job, returned at submission.
///
/// The API has returned both absolute URLs and paths relative to the assets
/// base; [`OperationHandle::url`] resolves either form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for polling this operation.
    pub fn url(&self, assets_base_url: &str) -> String {
        if self.0.starts_with("http://") || self.0.starts_with("https://") {
            return self.0.clone();
        }
        let base = assets_base_url.trim_end_matches('/');
        if self.0.starts_with('/') {
            format!("{base}{}", self.0)
        } else {
            format!("{base}/{}", self.0)
        }
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observed status of a remote operation. Not persisted.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub done: bool,
    /// The `response` document, present once the operation completes.
    pub response: Option<Value>,
    /// Full response body, kept for diagnostics.
    pub raw: Value,
}

impl OperationStatus {
    pub fn from_value(raw: Value) -> Self {
        let done = raw.get("done").and_then(Value::as_bool).unwrap_or(false);
        let response = raw.get("response").cloned();
        Self { done, response, raw }
    }

    /// The published asset id, if the terminal response carries one.
    pub fn asset_id(&self) -> Option<u64> {
        extract_asset_id(self.response.as_ref()?)
    }
}

/// Field paths tried for the asset id, in priority order. The terminal
/// response shape is not uniform across asset types and API revisions.
const ASSET_ID_PATHS: &[&[&str]] = &[
    &["assetId"],
    &["asset", "assetId"],
    &["asset", "id"],
    &["id"],
];

/// First asset id found under the known field paths.
pub fn extract_asset_id(response: &Value) -> Option<u64> {
    ASSET_ID_PATHS
        .iter()
        .filter_map(|path| {
            path.iter()
                .try_fold(response, |node, key| node.get(key))
        })
        .find_map(as_numeric_id)
}

/// Ids arrive as JSON numbers or numeric strings depending on endpoint.
fn as_numeric_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
