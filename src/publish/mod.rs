//! The publish orchestrator.
//!
//! Drives one file through submit → poll → reconcile, refreshing the access
//! token at most once on an invalid-token rejection, and sequences whole
//! batches so that one file's failure never aborts its siblings.

pub mod batch;

pub use batch::{BatchItemResult, BatchOutcome, BatchRequest, RetryOutcome, UploadFile};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::{Credential, TokenSource};
use crate::client::{AssetApi, CreateAssetRequest, OperationHandle, OperationStatus};
use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::poll::Poller;
use crate::store::{NewUpload, UploadPatch, UploadRecord, UploadStatus, UploadStore};

/// Credential state for one batch request.
///
/// A refresh triggered by any file is kept in memory for the rest of the
/// batch and surfaced once at the end, so the caller can re-issue the
/// session artifact exactly once.
#[derive(Debug, Clone)]
pub struct PublishSession {
    credential: Credential,
    refreshed: bool,
}

impl PublishSession {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            refreshed: false,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The current credential, if it differs from the one the session
    /// started with.
    pub fn refreshed_credential(&self) -> Option<&Credential> {
        self.refreshed.then_some(&self.credential)
    }

    fn apply_refresh(&mut self, credential: Credential) {
        self.credential = credential;
        self.refreshed = true;
    }
}

/// Orchestrates asset publishing against the Open Cloud API.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use bloxport::auth::OAuthTokenSource;
/// use bloxport::client::AssetsClient;
/// use bloxport::publish::Publisher;
/// use bloxport::store::MemoryUploadStore;
/// use bloxport::Config;
///
/// let config = Config::from_env();
/// let publisher = Publisher::new(
///     config.clone(),
///     Arc::new(AssetsClient::new(config.clone())),
///     Arc::new(MemoryUploadStore::new()),
///     Arc::new(OAuthTokenSource::new(config, "client-id", "client-secret")),
/// );
/// ```
pub struct Publisher {
    api: Arc<dyn AssetApi>,
    store: Arc<dyn UploadStore>,
    tokens: Arc<dyn TokenSource>,
    poller: Poller,
    config: Config,
}

impl Publisher {
    pub fn new(
        config: Config,
        api: Arc<dyn AssetApi>,
        store: Arc<dyn UploadStore>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            api,
            store,
            tokens,
            poller: Poller::new(config.poll_interval),
            config,
        }
    }

    /// Publish a batch of files sequentially.
    ///
    /// Sequential on purpose: one refreshed credential stays consistent
    /// across the batch, and per-file progress is deterministic. The result
    /// always has one entry per submitted file.
    pub async fn publish_batch(
        &self,
        credential: Credential,
        request: BatchRequest,
    ) -> Result<BatchOutcome> {
        if request.files.is_empty() {
            return Err(PublishError::Validation("no files submitted".into()));
        }

        let mut session = PublishSession::new(credential);
        let mut items = Vec::with_capacity(request.files.len());

        for file in &request.files {
            let asset_name = batch::asset_name(request.name_prefix.as_deref(), &file.file_name);
            let record = match self
                .store
                .insert(NewUpload {
                    owner_id: request.owner_id.clone(),
                    creator: request.creator.clone(),
                    asset_name: asset_name.clone(),
                    asset_kind: request.asset_kind,
                })
                .await
            {
                Ok(record) => record,
                Err(e) => {
                    warn!(asset_name = %asset_name, error = %e, "upload record insert failed");
                    items.push(BatchItemResult {
                        upload_id: None,
                        asset_name,
                        status: UploadStatus::Error,
                        asset_id: None,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            items.push(self.publish_one(&mut session, &record, file).await);
        }

        Ok(BatchOutcome {
            items,
            refreshed_credential: session.refreshed_credential().cloned(),
        })
    }

    /// Publish one file against an already-inserted record.
    ///
    /// Every failure is caught here and recorded on the record; the batch
    /// loop never sees an error from a sibling file.
    pub async fn publish_one(
        &self,
        session: &mut PublishSession,
        record: &UploadRecord,
        file: &UploadFile,
    ) -> BatchItemResult {
        match self.run_publish(session, record, file).await {
            Ok((status, asset_id)) => BatchItemResult {
                upload_id: Some(record.id.clone()),
                asset_name: record.asset_name.clone(),
                status,
                asset_id,
                error: None,
            },
            Err(e) => {
                let message = e.to_string();
                self.record_error(&record.id, &message).await;
                BatchItemResult {
                    upload_id: Some(record.id.clone()),
                    asset_name: record.asset_name.clone(),
                    status: UploadStatus::Error,
                    asset_id: None,
                    error: Some(message),
                }
            }
        }
    }

    /// Re-poll an upload that already holds an operation handle.
    ///
    /// No resubmission happens here; a record without a handle has nothing
    /// to re-poll and is rejected. An upload already `Done` is returned
    /// as-is; its asset id is immutable and the submission endpoint is
    /// never re-contacted.
    pub async fn retry(
        &self,
        credential: &Credential,
        owner_id: &str,
        upload_id: &str,
    ) -> Result<RetryOutcome> {
        let record = self
            .store
            .find(owner_id, upload_id)
            .await?
            .ok_or_else(|| PublishError::Validation(format!("upload {upload_id} not found")))?;

        if record.status == UploadStatus::Done && record.asset_id.is_some() {
            return Ok(RetryOutcome {
                upload_id: record.id,
                status: UploadStatus::Done,
                asset_id: record.asset_id,
                error: None,
            });
        }

        let Some(handle) = record.operation_handle.clone() else {
            return Err(PublishError::Validation(
                "upload has no operation to retry".into(),
            ));
        };

        let polled = self
            .poller
            .poll(
                self.api.as_ref(),
                credential,
                &handle,
                self.config.retry_poll_timeout,
            )
            .await;

        match polled.status {
            Some(status) => {
                let (status, asset_id) = self.reconcile(&record.id, Some(status)).await;
                Ok(RetryOutcome {
                    upload_id: record.id,
                    status,
                    asset_id,
                    error: None,
                })
            }
            None => {
                // The whole retry window failed; unlike the submission poll,
                // this is the operation's terminal outcome for the user.
                let message = polled
                    .last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "operation status unavailable".to_string());
                self.record_error(&record.id, &message).await;
                Ok(RetryOutcome {
                    upload_id: record.id,
                    status: UploadStatus::Error,
                    asset_id: None,
                    error: Some(message),
                })
            }
        }
    }

    async fn run_publish(
        &self,
        session: &mut PublishSession,
        record: &UploadRecord,
        file: &UploadFile,
    ) -> Result<(UploadStatus, Option<u64>)> {
        let request = CreateAssetRequest::new(
            record.creator.clone(),
            record.asset_name.clone(),
            record.asset_kind,
            file.content.clone(),
            file.file_name.clone(),
        );

        let handle = self.submit_with_refresh(session, &request).await?;

        // Persisted before polling: a crash mid-poll must leave enough state
        // for a manual retry.
        if let Err(e) = self
            .store
            .update(
                &record.id,
                UploadPatch::new().operation_handle(handle.clone()),
            )
            .await
        {
            warn!(upload_id = %record.id, error = %e, "failed to persist operation handle");
        }

        let polled = self
            .poller
            .poll(
                self.api.as_ref(),
                session.credential(),
                &handle,
                self.config.submit_poll_timeout,
            )
            .await;

        Ok(self.reconcile(&record.id, polled.status).await)
    }

    /// Submit, refreshing the token at most once on an invalid-token
    /// rejection. Any second failure is final.
    async fn submit_with_refresh(
        &self,
        session: &mut PublishSession,
        request: &CreateAssetRequest,
    ) -> Result<OperationHandle> {
        match self.api.create_asset(session.credential(), request).await {
            Ok(handle) => Ok(handle),
            Err(e) if e.is_invalid_token() => {
                warn!(error = %e, "access token rejected; refreshing and retrying once");
                let refreshed = self.tokens.refresh(session.credential()).await?;
                session.apply_refresh(refreshed);
                self.api.create_asset(session.credential(), request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Fold a poll result into the record: `Done` with an asset id when the
    /// operation finished and named one, otherwise left in-flight. A slow
    /// publish is not a failure.
    async fn reconcile(
        &self,
        upload_id: &str,
        status: Option<OperationStatus>,
    ) -> (UploadStatus, Option<u64>) {
        let asset_id = status.as_ref().and_then(OperationStatus::asset_id);
        let done = status.as_ref().is_some_and(|s| s.done);

        let (next, patch) = match asset_id {
            Some(asset_id) if done => {
                debug!(upload_id, asset_id, "publish finished");
                (
                    (UploadStatus::Done, Some(asset_id)),
                    UploadPatch::new()
                        .status(UploadStatus::Done)
                        .asset_id(asset_id)
                        .clear_error(),
                )
            }
            _ => {
                debug!(upload_id, "operation still in flight");
                (
                    (UploadStatus::Processing, None),
                    UploadPatch::new()
                        .status(UploadStatus::Processing)
                        .clear_error(),
                )
            }
        };

        if let Err(e) = self.store.update(upload_id, patch).await {
            warn!(upload_id, error = %e, "failed to persist poll outcome");
        }
        next
    }

    async fn record_error(&self, upload_id: &str, message: &str) {
        if let Err(e) = self
            .store
            .update(
                upload_id,
                UploadPatch::new()
                    .status(UploadStatus::Error)
                    .error(message),
            )
            .await
        {
            warn!(upload_id, error = %e, "failed to persist error status");
        }
    }
}
