//! Pending request adjudication (component E): approve or deny `PENDING`
//! requests against the enabled policy evaluators.

use jitw_core::{AccessRequest, PlatformClient, RequestState, SettableState};
use jitw_policy::{PatternMatcher, ResourceLimit, RoleConflict};
use tracing::{info, instrument, warn};

/// Fixed reason string for auto-approved requests.
pub const APPROVE_REASON: &str = "Auto-approved: complies with access policies";

/// Which policies are enabled, and the thresholds they enforce. Shared by
/// the adjudicator and the reconciler so both phases honor the same
/// operator configuration.
#[derive(Debug, Clone, Copy)]
pub struct PolicySwitches {
    /// Whether the resource-count limit is enforced.
    pub check_resources: bool,
    /// Whether the role-conflict / environment-separation policy is enforced.
    pub check_conflicts: bool,
    /// Maximum resources an approved request (or group, for reconciliation) may hold.
    pub max_resources: usize,
}

/// Evaluate every `PENDING` request in `requests` against the enabled
/// evaluators and dispatch the decision through `client`.
///
/// On a successful `set_state`, the request's in-memory `state` is updated
/// so the caller can hand the slice straight to
/// [`crate::Reconciler::reconcile`] afterwards. On failure the request is
/// left `PENDING` and is therefore naturally excluded from reconciliation
/// this tick (§4.E: "drop the request from further consideration").
#[instrument(skip_all)]
pub async fn adjudicate(
    client: &dyn PlatformClient,
    requests: &mut [AccessRequest],
    switches: PolicySwitches,
    matcher: &PatternMatcher,
) {
    for req in requests.iter_mut() {
        if req.state != RequestState::Pending {
            continue;
        }

        let (settable, new_state, reason) = match deny_reason(req, switches, matcher) {
            Some(reason) => (SettableState::Denied, RequestState::Denied, reason),
            None => (SettableState::Approved, RequestState::Approved, APPROVE_REASON.to_string()),
        };

        match client.set_state(&req.id, settable, &reason).await {
            Ok(()) => {
                info!(request_id = %req.id, user = %req.user, %reason, "adjudicated pending request");
                req.state = new_state;
            }
            Err(error) => {
                warn!(request_id = %req.id, user = %req.user, %error, "set_state failed, skipping this tick");
            }
        }
    }
}

/// Resource-limit violations are reported before role-conflict violations
/// when both fire, per the fixed precedence for diagnostics.
fn deny_reason(
    req: &AccessRequest,
    switches: PolicySwitches,
    matcher: &PatternMatcher,
) -> Option<String> {
    if switches.check_resources {
        if let Some(violation) = ResourceLimit::evaluate(req, switches.max_resources) {
            return Some(violation.reason);
        }
    }
    if switches.check_conflicts {
        if let Some(violation) = RoleConflict::evaluate(req, matcher) {
            return Some(violation.reason);
        }
    }
    None
}
