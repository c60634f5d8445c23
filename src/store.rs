//! Durable upload records.
//!
//! The pipeline treats the record store as a row store with insert,
//! update-by-id, and select-by-owner. [`MemoryUploadStore`] backs tests and
//! single-process embedders; production callers implement [`UploadStore`]
//! over their database.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::OperationHandle;
use crate::error::{PublishError, Result};
use crate::types::{AssetKind, Creator};

/// Upload lifecycle state.
///
/// `Error` is not terminal for the human workflow: an explicit retry
/// re-polls the stored operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Processing,
    Done,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row per submitted file.
///
/// Invariants, maintained by the publisher and checked by tests:
/// `asset_id` is present iff `status == Done`; `error` is present iff
/// `status == Error`; `operation_handle`, once set, is never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub owner_id: String,
    pub creator: Creator,
    pub asset_name: String,
    pub asset_kind: AssetKind,
    pub status: UploadStatus,
    pub operation_handle: Option<OperationHandle>,
    pub asset_id: Option<u64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a fresh record; everything else is assigned at insert.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub owner_id: String,
    pub creator: Creator,
    pub asset_name: String,
    pub asset_kind: AssetKind,
}

/// Partial update applied to one record.
///
/// `operation_handle` can only be set, never cleared; `error` is cleared
/// explicitly via [`UploadPatch::clear_error`].
#[derive(Debug, Clone, Default)]
pub struct UploadPatch {
    pub status: Option<UploadStatus>,
    pub operation_handle: Option<OperationHandle>,
    pub asset_id: Option<u64>,
    pub error: Option<String>,
    pub clear_error: bool,
}

impl UploadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: UploadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn operation_handle(mut self, handle: OperationHandle) -> Self {
        self.operation_handle = Some(handle);
        self
    }

    pub fn asset_id(mut self, asset_id: u64) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.clear_error = true;
        self
    }
}

/// Listing options for [`UploadStore::select_by_owner`].
#[derive(Debug, Clone, Default)]
pub struct UploadFilter {
    /// Case-insensitive substring match on the asset name.
    pub name_contains: Option<String>,
    /// Row cap; defaults to 50.
    pub limit: Option<usize>,
}

const DEFAULT_LIMIT: usize = 50;

/// Durable store of upload records.
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn insert(&self, new_upload: NewUpload) -> Result<UploadRecord>;

    async fn update(&self, id: &str, patch: UploadPatch) -> Result<()>;

    /// Fetch one record, scoped to its owner.
    async fn find(&self, owner_id: &str, id: &str) -> Result<Option<UploadRecord>>;

    /// List an owner's records, newest first.
    async fn select_by_owner(
        &self,
        owner_id: &str,
        filter: &UploadFilter,
    ) -> Result<Vec<UploadRecord>>;
}

/// In-memory [`UploadStore`].
#[derive(Default)]
pub struct MemoryUploadStore {
    rows: RwLock<HashMap<String, UploadRecord>>,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStore for MemoryUploadStore {
    async fn insert(&self, new_upload: NewUpload) -> Result<UploadRecord> {
        let now = Utc::now();
        let record = UploadRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: new_upload.owner_id,
            creator: new_upload.creator,
            asset_name: new_upload.asset_name,
            asset_kind: new_upload.asset_kind,
            status: UploadStatus::Processing,
            operation_handle: None,
            asset_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        let mut rows = self
            .rows
            .write()
            .map_err(|_| PublishError::Persistence("store lock poisoned".into()))?;
        rows.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: UploadPatch) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| PublishError::Persistence("store lock poisoned".into()))?;
        let record = rows
            .get_mut(id)
            .ok_or_else(|| PublishError::Persistence(format!("no upload with id {id}")))?;
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(handle) = patch.operation_handle {
            record.operation_handle = Some(handle);
        }
        if let Some(asset_id) = patch.asset_id {
            record.asset_id = Some(asset_id);
        }
        if let Some(error) = patch.error {
            record.error = Some(error);
        }
        if patch.clear_error {
            record.error = None;
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find(&self, owner_id: &str, id: &str) -> Result<Option<UploadRecord>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| PublishError::Persistence("store lock poisoned".into()))?;
        Ok(rows
            .get(id)
            .filter(|record| record.owner_id == owner_id)
            .cloned())
    }

    async fn select_by_owner(
        &self,
        owner_id: &str,
        filter: &UploadFilter,
    ) -> Result<Vec<UploadRecord>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| PublishError::Persistence("store lock poisoned".into()))?;
        let needle = filter.name_contains.as_deref().map(str::to_lowercase);
        let mut matches: Vec<UploadRecord> = rows
            .values()
            .filter(|record| record.owner_id == owner_id)
            .filter(|record| match &needle {
                Some(needle) => record.asset_name.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(filter.limit.unwrap_or(DEFAULT_LIMIT));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Creator;

    fn new_upload(owner: &str, name: &str) -> NewUpload {
        NewUpload {
            owner_id: owner.to_string(),
            creator: Creator::group("555"),
            asset_name: name.to_string(),
            asset_kind: AssetKind::Audio,
        }
    }

    #[tokio::test]
    async fn insert_starts_processing_with_clean_fields() {
        let store = MemoryUploadStore::new();
        let record = store.insert(new_upload("u1", "clip")).await.unwrap();
        assert_eq!(record.status, UploadStatus::Processing);
        assert!(record.operation_handle.is_none());
        assert!(record.asset_id.is_none());
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn update_applies_partial_patch() {
        let store = MemoryUploadStore::new();
        let record = store.insert(new_upload("u1", "clip")).await.unwrap();

        store
            .update(
                &record.id,
                UploadPatch::new().operation_handle(OperationHandle::new("/v1/operations/abc")),
            )
            .await
            .unwrap();
        store
            .update(
                &record.id,
                UploadPatch::new()
                    .status(UploadStatus::Done)
                    .asset_id(999)
                    .clear_error(),
            )
            .await
            .unwrap();

        let stored = store.find("u1", &record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UploadStatus::Done);
        assert_eq!(stored.asset_id, Some(999));
        assert_eq!(
            stored.operation_handle.as_ref().map(|h| h.as_str()),
            Some("/v1/operations/abc")
        );
        assert!(stored.error.is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_is_persistence_error() {
        let store = MemoryUploadStore::new();
        let result = store.update("missing", UploadPatch::new()).await;
        assert!(matches!(result, Err(PublishError::Persistence(_))));
    }

    #[tokio::test]
    async fn find_is_owner_scoped() {
        let store = MemoryUploadStore::new();
        let record = store.insert(new_upload("u1", "clip")).await.unwrap();
        assert!(store.find("u1", &record.id).await.unwrap().is_some());
        assert!(store.find("u2", &record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn select_filters_by_name_case_insensitive() {
        let store = MemoryUploadStore::new();
        store.insert(new_upload("u1", "Walk Cycle")).await.unwrap();
        store.insert(new_upload("u1", "run cycle")).await.unwrap();
        store.insert(new_upload("u1", "jump")).await.unwrap();
        store.insert(new_upload("u2", "walk other")).await.unwrap();

        let filter = UploadFilter {
            name_contains: Some("CYCLE".to_string()),
            limit: None,
        };
        let rows = store.select_by_owner("u1", &filter).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.owner_id == "u1"));
    }

    #[tokio::test]
    async fn select_respects_limit() {
        let store = MemoryUploadStore::new();
        for i in 0..5 {
            store
                .insert(new_upload("u1", &format!("clip-{i}")))
                .await
                .unwrap();
        }
        let filter = UploadFilter {
            name_contains: None,
            limit: Some(3),
        };
        let rows = store.select_by_owner("u1", &filter).await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}
