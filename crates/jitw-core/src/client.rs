//! The platform-client contract (component A): everything the rest of the
//! crate needs from the access platform, expressed as a trait so the real
//! gRPC facade (`jitw-platform`) and test doubles are interchangeable.

use crate::request::AccessRequest;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// One hour, the fixed lock lifetime mandated by §3: "expiresAt = now + 1 hour".
pub const LOCK_TTL: Duration = Duration::from_secs(60 * 60);

/// The two states the watcher is ever allowed to transition a PENDING
/// request into. Deliberately narrower than [`RequestState`](crate::RequestState) —
/// the watcher never sets `Other`, and never sets `Pending` (requests start
/// there).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettableState {
    /// Auto-approve.
    Approved,
    /// Auto-deny.
    Denied,
}

/// A platform lock, keyed by name, targeting exactly one access request.
///
/// Locks are never removed by the watcher (§3: "It never un-locks"); the
/// only mutation is re-upserting the same name, which refreshes `expires_at_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// `jit-watcher-<request-id>`, computed by [`Lock::for_request`].
    pub name: String,
    /// The request this lock revokes.
    pub target_request_id: String,
    /// Human-readable reason surfaced to operators.
    pub message: String,
    /// Absolute expiry, milliseconds since UNIX epoch.
    pub expires_at_ms: u64,
}

impl Lock {
    /// Build the lock for `request_id`, naming it per the fixed
    /// `jit-watcher-<request-id>` contract (§3, §6) and setting its expiry to
    /// `now_ms + `[`LOCK_TTL`].
    #[must_use]
    pub fn for_request(request_id: &str, message: impl Into<String>, now_ms: u64) -> Self {
        Self {
            name: lock_name(request_id),
            target_request_id: request_id.to_string(),
            message: message.into(),
            expires_at_ms: now_ms + u64::try_from(LOCK_TTL.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// The fixed lock-naming contract: `jit-watcher-<request-id>`.
#[must_use]
pub fn lock_name(request_id: &str) -> String {
    format!("jit-watcher-{request_id}")
}

/// Errors the platform facade can report (§7 kinds 2-4).
///
/// `Connect` is fatal (kind 2, only ever surfaced from startup `Ping`);
/// `Call` is always absorbed by the caller — logged and the affected
/// tick/decision skipped, never propagated as a process-fatal error.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to establish or verify the connection to the platform (fatal
    /// at startup).
    #[error("failed to connect to access platform: {source}")]
    Connect {
        /// Underlying transport/credential error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A single RPC failed (transient list failure or per-request mutation
    /// failure; never fatal).
    #[error("{op} failed: {message}")]
    Call {
        /// Name of the failing operation, e.g. `"ListAccessRequests"`.
        op: &'static str,
        /// Human-readable failure detail (status code/message).
        message: String,
        /// Underlying transport error, if any.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

/// Abstract facade over the access platform (component A). All methods are
/// cancellation-safe: a cancelled context returns promptly with no side
/// effect beyond any call already accepted by the server (§5).
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Verify connectivity. Called once at startup; failure is fatal.
    async fn ping(&self) -> Result<(), PlatformError>;

    /// List every access request the platform currently holds (filter=∅).
    async fn list_access_requests(&self) -> Result<Vec<AccessRequest>, PlatformError>;

    /// Transition `request_id` to `new_state`, recording `reason`.
    async fn set_state(
        &self,
        request_id: &str,
        new_state: SettableState,
        reason: &str,
    ) -> Result<(), PlatformError>;

    /// Idempotently create or refresh `lock`.
    async fn upsert_lock(&self, lock: &Lock) -> Result<(), PlatformError>;

    /// Release the underlying transport. Safe to call more than once.
    async fn close(&self) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_name_matches_contract() {
        assert_eq!(lock_name("req-123"), "jit-watcher-req-123");
    }

    #[test]
    fn lock_expiry_is_now_plus_one_hour() {
        let lock = Lock::for_request("r1", "because", 1_000);
        assert_eq!(lock.expires_at_ms, 1_000 + 60 * 60 * 1000);
        assert_eq!(lock.name, "jit-watcher-r1");
    }
}
