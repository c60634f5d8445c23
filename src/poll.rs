//! Bounded polling of publish operations.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::auth::Credential;
use crate::client::{AssetApi, OperationHandle, OperationStatus};
use crate::error::PublishError;

/// What a polling window observed.
#[derive(Debug)]
pub struct PollResult {
    /// Last status successfully read; `None` if no poll ever succeeded.
    pub status: Option<OperationStatus>,
    /// Last swallowed failure, kept so a caller can surface it when the
    /// whole window produced nothing.
    pub last_error: Option<PublishError>,
}

impl PollResult {
    /// Whether the window ended on a terminal status.
    pub fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.done)
    }
}

/// Polls an operation until it is terminal or a deadline passes.
///
/// Poll failures inside the window are swallowed: a transient 5xx while the
/// asset is still processing must not abort the upload. The fixed inter-poll
/// delay bounds the request rate and applies after failures too. Deadlines
/// use `tokio::time`, so tests under a paused clock simulate the window
/// without real delay.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Poll until `done` or `timeout`. Never runs longer than `timeout`
    /// plus one interval.
    pub async fn poll(
        &self,
        api: &dyn AssetApi,
        credential: &Credential,
        handle: &OperationHandle,
        timeout: Duration,
    ) -> PollResult {
        let started = Instant::now();
        let mut result = PollResult {
            status: None,
            last_error: None,
        };

        while started.elapsed() < timeout {
            match api.get_operation(credential, handle).await {
                Ok(status) => {
                    let done = status.done;
                    result.status = Some(status);
                    if done {
                        return result;
                    }
                }
                Err(e) => {
                    debug!(operation = %handle, error = %e, "operation poll failed; continuing");
                    result.last_error = Some(e);
                }
            }
            sleep(self.interval).await;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CreateAssetRequest;
    use crate::error::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of poll results, then repeats a 500.
    struct ScriptedOps {
        script: Mutex<VecDeque<Result<OperationStatus>>>,
        polls: AtomicUsize,
    }

    impl ScriptedOps {
        fn new(script: Vec<Result<OperationStatus>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: AtomicUsize::new(0),
            }
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetApi for ScriptedOps {
        async fn create_asset(
            &self,
            _credential: &Credential,
            _request: &CreateAssetRequest,
        ) -> Result<OperationHandle> {
            Err(PublishError::Validation("not under test".into()))
        }

        async fn get_operation(
            &self,
            _credential: &Credential,
            _handle: &OperationHandle,
        ) -> Result<OperationStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(result) => result,
                None => Err(PublishError::remote(500, "script exhausted")),
            }
        }
    }

    fn pending() -> Result<OperationStatus> {
        Ok(OperationStatus::from_value(json!({"done": false})))
    }

    fn done(asset_id: u64) -> Result<OperationStatus> {
        Ok(OperationStatus::from_value(json!({
            "done": true,
            "response": {"assetId": asset_id}
        })))
    }

    fn handle() -> OperationHandle {
        OperationHandle::new("/v1/operations/abc")
    }

    fn credential() -> Credential {
        Credential::new("access")
    }

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_on_done() {
        let api = ScriptedOps::new(vec![done(999)]);
        let poller = Poller::new(Duration::from_millis(1500));
        let result = poller
            .poll(&api, &credential(), &handle(), Duration::from_secs(90))
            .await;
        assert!(result.is_done());
        assert_eq!(result.status.unwrap().asset_id(), Some(999));
        assert_eq!(api.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_through_pending_polls() {
        let api = ScriptedOps::new(vec![pending(), pending(), done(42)]);
        let poller = Poller::new(Duration::from_millis(1500));
        let result = poller
            .poll(&api, &credential(), &handle(), Duration::from_secs(90))
            .await;
        assert!(result.is_done());
        assert_eq!(result.status.unwrap().asset_id(), Some(42));
        assert_eq!(api.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_done_returns_last_status_within_timeout() {
        let api = ScriptedOps::new((0..200).map(|_| pending()).collect());
        let poller = Poller::new(Duration::from_millis(1500));
        let before = Instant::now();
        let result = poller
            .poll(&api, &credential(), &handle(), Duration::from_secs(60))
            .await;
        assert!(!result.is_done());
        assert!(result.status.is_some());
        // Bounded by timeout + one interval.
        assert!(before.elapsed() <= Duration::from_millis(61_500));
        // 60 s window at 1.5 s per iteration.
        assert_eq!(api.polls(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_swallowed() {
        let api = ScriptedOps::new(vec![
            Err(PublishError::remote(502, "bad gateway")),
            pending(),
            Err(PublishError::remote(503, "busy")),
            done(7),
        ]);
        let poller = Poller::new(Duration::from_millis(1500));
        let result = poller
            .poll(&api, &credential(), &handle(), Duration::from_secs(90))
            .await;
        assert!(result.is_done());
        assert_eq!(result.status.unwrap().asset_id(), Some(7));
        assert_eq!(api.polls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_keep_last_error() {
        let api = ScriptedOps::new(vec![]);
        let poller = Poller::new(Duration::from_millis(1500));
        let result = poller
            .poll(&api, &credential(), &handle(), Duration::from_secs(6))
            .await;
        assert!(result.status.is_none());
        let last_error = result.last_error.expect("kept last failure");
        assert!(matches!(last_error, PublishError::Remote { status: 500, .. }));
        assert_eq!(api.polls(), 4);
    }
}
