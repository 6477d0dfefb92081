//! Policy Evaluators (component D): `ResourceLimit` and `RoleConflict`.
//! Both are pure — neither calls the platform nor consults any state beyond
//! the request and the configuration passed in.

use crate::matcher::PatternMatcher;
use jitw_core::AccessRequest;

/// A policy violation, carrying the human-readable reason that ends up in
/// the deny/lock message surfaced to operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Reason text, already formatted for direct inclusion in a decision.
    pub reason: String,
}

/// Resource-count limit evaluator.
pub struct ResourceLimit;

impl ResourceLimit {
    /// Violated iff `req` carries more resources than `max_resources`.
    #[must_use]
    pub fn evaluate(req: &AccessRequest, max_resources: usize) -> Option<Violation> {
        let count = req.resource_count();
        if count > max_resources {
            Some(Violation {
                reason: format!(
                    "Request contains {count} resources, exceeds limit of {max_resources}"
                ),
            })
        } else {
            None
        }
    }
}

/// Role-conflict / environment-separation evaluator.
pub struct RoleConflict;

impl RoleConflict {
    /// Violated iff classifying `req.roles` against `matcher` yields two or
    /// more populated patterns. The reason enumerates `pattern: [roles…]`
    /// pairs, joined by `, `, in the matcher's configured pattern order.
    #[must_use]
    pub fn evaluate(req: &AccessRequest, matcher: &PatternMatcher) -> Option<Violation> {
        let classification = matcher.classify(&req.roles);
        if !classification.is_conflict() {
            return None;
        }
        let reason = classification
            .populated()
            .map(|(pattern, roles)| format!("{pattern}: [{}]", roles.join(", ")))
            .collect::<Vec<_>>()
            .join(", ");
        Some(Violation { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitw_core::{RequestState, ResourceRef};

    fn req(roles: &[&str], resource_count: usize) -> AccessRequest {
        AccessRequest {
            id: "r1".to_string(),
            user: "alice".to_string(),
            roles: roles.iter().map(|s| (*s).to_string()).collect(),
            resources: (0..resource_count).map(|i| ResourceRef::new("node", i.to_string())).collect(),
            created_at_ms: 0,
            state: RequestState::Pending,
        }
    }

    #[test]
    fn resource_limit_passes_at_boundary() {
        assert!(ResourceLimit::evaluate(&req(&[], 3), 3).is_none());
    }

    #[test]
    fn resource_limit_violates_over_boundary() {
        let v = ResourceLimit::evaluate(&req(&[], 4), 3).unwrap();
        assert_eq!(v.reason, "Request contains 4 resources, exceeds limit of 3");
    }

    #[test]
    fn role_conflict_reason_enumerates_pattern_order() {
        let matcher = PatternMatcher::new(["prod", "research"]).unwrap();
        let v = RoleConflict::evaluate(&req(&["prod-admin", "research-lab"], 1), &matcher).unwrap();
        assert_eq!(v.reason, "prod: [prod-admin], research: [research-lab]");
    }

    #[test]
    fn role_conflict_silent_on_single_pattern() {
        let matcher = PatternMatcher::new(["prod", "research"]).unwrap();
        assert!(RoleConflict::evaluate(&req(&["prod-admin"], 1), &matcher).is_none());
    }
}
