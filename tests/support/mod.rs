#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use bloxport::auth::{Credential, TokenSource};
use bloxport::client::{AssetApi, CreateAssetRequest, OperationHandle, OperationStatus};
use bloxport::error::{PublishError, Result};
use bloxport::publish::Publisher;
use bloxport::store::{MemoryUploadStore, UploadStore};
use bloxport::Config;

/// Config with short windows so real-clock tests finish quickly.
pub fn fast_config() -> Config {
    Config::default()
        .with_poll_interval(Duration::from_millis(5))
        .with_submit_poll_timeout(Duration::from_millis(200))
        .with_retry_poll_timeout(Duration::from_millis(200))
}

pub fn credential() -> Credential {
    Credential::new("access-1").with_refresh_token("refresh-1")
}

pub fn pending_status() -> OperationStatus {
    OperationStatus::from_value(json!({"done": false}))
}

pub fn done_status(asset_id: u64) -> OperationStatus {
    OperationStatus::from_value(json!({
        "done": true,
        "response": {"assetId": asset_id}
    }))
}

type Script<T> = Mutex<VecDeque<Result<T>>>;

/// Scripted [`AssetApi`]: replays queued results for each call, repeating
/// the configured fallback when a queue runs dry.
pub struct ScriptedAssetApi {
    submissions: Script<OperationHandle>,
    polls: Script<OperationStatus>,
    submission_count: AtomicUsize,
    poll_count: AtomicUsize,
    seen_tokens: Mutex<Vec<String>>,
}

impl ScriptedAssetApi {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(VecDeque::new()),
            polls: Mutex::new(VecDeque::new()),
            submission_count: AtomicUsize::new(0),
            poll_count: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_submission(&self, result: Result<OperationHandle>) {
        self.submissions.lock().unwrap().push_back(result);
    }

    pub fn queue_poll(&self, result: Result<OperationStatus>) {
        self.polls.lock().unwrap().push_back(result);
    }

    pub fn submissions(&self) -> usize {
        self.submission_count.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    /// Access tokens observed on submissions, in order.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }
}

impl Default for ScriptedAssetApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetApi for ScriptedAssetApi {
    async fn create_asset(
        &self,
        credential: &Credential,
        _request: &CreateAssetRequest,
    ) -> Result<OperationHandle> {
        self.submission_count.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(credential.access_token.clone());
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(OperationHandle::new("/v1/operations/default")))
    }

    async fn get_operation(
        &self,
        _credential: &Credential,
        _handle: &OperationHandle,
    ) -> Result<OperationStatus> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PublishError::remote(500, "poll script exhausted")))
    }
}

/// [`TokenSource`] handing out a fixed credential, counting calls.
pub struct CountingTokenSource {
    refreshed: Result<Credential>,
    calls: AtomicUsize,
}

impl CountingTokenSource {
    pub fn succeeding(refreshed: Credential) -> Self {
        Self {
            refreshed: Ok(refreshed),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            refreshed: Err(PublishError::Refresh(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for CountingTokenSource {
    async fn refresh(&self, _current: &Credential) -> Result<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.refreshed {
            Ok(credential) => Ok(credential.clone()),
            Err(PublishError::Refresh(message)) => Err(PublishError::Refresh(message.clone())),
            Err(_) => unreachable!("only Refresh errors are scripted"),
        }
    }
}

/// Publisher wired to in-memory fakes.
pub fn publisher(
    api: Arc<ScriptedAssetApi>,
    store: Arc<MemoryUploadStore>,
    tokens: Arc<CountingTokenSource>,
) -> Publisher {
    Publisher::new(fast_config(), api, store, tokens)
}

/// Publisher over any [`AssetApi`] / [`TokenSource`], for wiremock-backed
/// tests.
pub fn publisher_with(
    config: Config,
    api: Arc<dyn AssetApi>,
    store: Arc<dyn UploadStore>,
    tokens: Arc<dyn TokenSource>,
) -> Publisher {
    Publisher::new(config, api, store, tokens)
}
