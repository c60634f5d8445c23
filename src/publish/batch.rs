//! Batch submission surface: inputs, per-file results, naming.

use crate::auth::Credential;
use crate::store::UploadStatus;
use crate::types::{AssetKind, Creator};

/// One file handed to the pipeline.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

/// A batch of files published under one creator.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Record owner: the authenticated caller, not necessarily the creator.
    pub owner_id: String,
    pub creator: Creator,
    pub asset_kind: AssetKind,
    /// Optional prefix prepended to every derived asset name.
    pub name_prefix: Option<String>,
    pub files: Vec<UploadFile>,
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone)]
pub struct BatchItemResult {
    /// Record id; `None` when the insert itself failed.
    pub upload_id: Option<String>,
    pub asset_name: String,
    pub status: UploadStatus,
    pub asset_id: Option<u64>,
    pub error: Option<String>,
}

/// Outcome of a whole batch.
///
/// `refreshed_credential` is set when a mid-batch token refresh happened;
/// the caller must re-issue the session artifact from it or the refresh is
/// lost with this request.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub items: Vec<BatchItemResult>,
    pub refreshed_credential: Option<Credential>,
}

/// Outcome of a manual retry.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub upload_id: String,
    pub status: UploadStatus,
    pub asset_id: Option<u64>,
    pub error: Option<String>,
}

/// Display name for a file: optional prefix plus the file stem.
pub fn asset_name(prefix: Option<&str>, file_name: &str) -> String {
    let stem = file_stem(file_name);
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}{stem}"),
        _ => stem.to_string(),
    }
}

/// File name without its last extension; empty names become "asset".
fn file_stem(file_name: &str) -> &str {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => file_name,
    };
    if stem.is_empty() {
        "asset"
    } else {
        stem
    }
}
