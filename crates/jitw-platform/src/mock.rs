//! An in-memory [`PlatformClient`] for tests: reconciliation logic can be
//! exercised end-to-end without a real access platform or network.

use async_trait::async_trait;
use jitw_core::{AccessRequest, Lock, PlatformClient, PlatformError, RequestState, SettableState};
use std::sync::Mutex;

/// One recorded `UpsertLock` call, kept for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLock {
    pub name: String,
    pub target_request_id: String,
    pub message: String,
}

/// One recorded `SetState` call, kept for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStateChange {
    pub request_id: String,
    pub new_state: SettableState,
    pub reason: String,
}

/// An in-memory platform double. Seed it with `requests`, drive a
/// reconciliation/adjudication pass against it, then inspect `locks()` /
/// `state_changes()` to assert on what the watcher did.
///
/// `ping` and `list_access_requests` never fail; `set_state` and
/// `upsert_lock` can be made to fail via [`MockPlatformClient::fail_calls`]
/// to exercise §7 kinds 3-4 (transient failures are logged and skipped, not
/// fatal).
pub struct MockPlatformClient {
    requests: Mutex<Vec<AccessRequest>>,
    locks: Mutex<Vec<RecordedLock>>,
    state_changes: Mutex<Vec<RecordedStateChange>>,
    fail_calls: std::sync::atomic::AtomicBool,
}

impl MockPlatformClient {
    /// Seed the double with the given requests.
    #[must_use]
    pub fn new(requests: Vec<AccessRequest>) -> Self {
        Self {
            requests: Mutex::new(requests),
            locks: Mutex::new(Vec::new()),
            state_changes: Mutex::new(Vec::new()),
            fail_calls: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make every subsequent `set_state`/`upsert_lock` call fail, to
    /// exercise the "transient failure" absorption paths.
    pub fn fail_calls(&self, fail: bool) {
        self.fail_calls.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Every lock upserted so far, in call order.
    #[must_use]
    pub fn locks(&self) -> Vec<RecordedLock> {
        self.locks.lock().unwrap().clone()
    }

    /// Every state change dispatched so far, in call order.
    #[must_use]
    pub fn state_changes(&self) -> Vec<RecordedStateChange> {
        self.state_changes.lock().unwrap().clone()
    }

    /// Current state of a request, by id, after all dispatched changes.
    #[must_use]
    pub fn request_state(&self, request_id: &str) -> Option<RequestState> {
        self.requests.lock().unwrap().iter().find(|r| r.id == request_id).map(|r| r.state.clone())
    }
}

#[async_trait]
impl PlatformClient for MockPlatformClient {
    async fn ping(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn list_access_requests(&self) -> Result<Vec<AccessRequest>, PlatformError> {
        Ok(self.requests.lock().unwrap().clone())
    }

    async fn set_state(
        &self,
        request_id: &str,
        new_state: SettableState,
        reason: &str,
    ) -> Result<(), PlatformError> {
        if self.fail_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PlatformError::Call {
                op: "SetAccessRequestState",
                message: "injected failure".to_string(),
                source: None,
            });
        }
        let mut requests = self.requests.lock().unwrap();
        if let Some(req) = requests.iter_mut().find(|r| r.id == request_id) {
            req.state = match new_state {
                SettableState::Approved => RequestState::Approved,
                SettableState::Denied => RequestState::Denied,
            };
        }
        drop(requests);
        self.state_changes.lock().unwrap().push(RecordedStateChange {
            request_id: request_id.to_string(),
            new_state,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn upsert_lock(&self, lock: &Lock) -> Result<(), PlatformError> {
        if self.fail_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PlatformError::Call {
                op: "UpsertLock",
                message: "injected failure".to_string(),
                source: None,
            });
        }
        let mut locks = self.locks.lock().unwrap();
        if let Some(existing) = locks.iter_mut().find(|l| l.name == lock.name) {
            existing.message = lock.message.clone();
        } else {
            locks.push(RecordedLock {
                name: lock.name.clone(),
                target_request_id: lock.target_request_id.clone(),
                message: lock.message.clone(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitw_core::ResourceRef;

    fn req(id: &str) -> AccessRequest {
        AccessRequest {
            id: id.to_string(),
            user: "alice".to_string(),
            roles: vec![],
            resources: vec![ResourceRef::new("node", "n1")],
            created_at_ms: 0,
            state: RequestState::Pending,
        }
    }

    #[tokio::test]
    async fn set_state_updates_snapshot_and_records_call() {
        let mock = MockPlatformClient::new(vec![req("r1")]);
        mock.set_state("r1", SettableState::Approved, "ok").await.unwrap();
        assert_eq!(mock.request_state("r1"), Some(RequestState::Approved));
        assert_eq!(mock.state_changes().len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_leaves_state_untouched() {
        let mock = MockPlatformClient::new(vec![req("r1")]);
        mock.fail_calls(true);
        assert!(mock.set_state("r1", SettableState::Approved, "ok").await.is_err());
        assert_eq!(mock.request_state("r1"), Some(RequestState::Pending));
    }

    #[tokio::test]
    async fn upsert_lock_is_idempotent_by_name() {
        let mock = MockPlatformClient::new(vec![req("r1")]);
        let lock = Lock::for_request("r1", "first", 0);
        mock.upsert_lock(&lock).await.unwrap();
        let lock2 = Lock::for_request("r1", "second", 0);
        mock.upsert_lock(&lock2).await.unwrap();
        assert_eq!(mock.locks().len(), 1);
        assert_eq!(mock.locks()[0].message, "second");
    }
}
