//! Property tests for the two invariants SPEC_FULL §8 calls out as
//! specifically property-testable: resource-limit minimality and the
//! lock-newest guarantee for inter-request conflicts.

use jitw_core::{AccessRequest, RequestState, ResourceRef};
use jitw_platform::MockPlatformClient;
use jitw_policy::PatternMatcher;
use jitw_reconcile::{PolicySwitches, Reconciler};
use proptest::prelude::*;
use std::collections::HashSet;

fn approved(id: &str, roles: &[&str], resources: usize, created_at_ms: u64) -> AccessRequest {
    AccessRequest {
        id: id.to_string(),
        user: "proptest-user".to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        resources: (0..resources).map(|i| ResourceRef::new("node", format!("{id}-{i}"))).collect(),
        created_at_ms,
        state: RequestState::Approved,
    }
}

proptest! {
    /// After Pass 2, the sum of unlocked resource counts never exceeds the
    /// limit, and every locked request's resource count alone would have
    /// pushed the final unlocked sum over the limit — there is no locked
    /// request that could be un-locked without violating the budget.
    #[test]
    fn resource_limit_minimality(
        counts in proptest::collection::vec(0usize..6, 1..8),
        max_resources in 1usize..10,
    ) {
        let requests: Vec<AccessRequest> = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| approved(&format!("r{i}"), &["safe"], c, i as u64))
            .collect();

        let mock = MockPlatformClient::new(vec![]);
        let matcher = PatternMatcher::new(["prod", "research"]).unwrap();
        let switches = PolicySwitches { check_resources: true, check_conflicts: false, max_resources };
        let mut reconciler = Reconciler::new();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(reconciler.reconcile(&mock, requests.clone(), switches, &matcher, 0));

        let locked_ids: HashSet<String> =
            mock.locks().into_iter().map(|l| l.target_request_id).collect();
        let unlocked_sum: usize = requests
            .iter()
            .filter(|r| !locked_ids.contains(&r.id))
            .map(AccessRequest::resource_count)
            .sum();
        prop_assert!(unlocked_sum <= max_resources);

        for req in &requests {
            if locked_ids.contains(&req.id) {
                prop_assert!(unlocked_sum + req.resource_count() > max_resources);
            }
        }
    }

    /// For any user with an inter-request role conflict, the newest
    /// participant (the one with the highest `(created_at_ms, id)` order
    /// key among requests matching any conflict pattern) is never locked
    /// by Pass 1(b).
    #[test]
    fn lock_newest_participant_survives(tags in proptest::collection::vec(0usize..3, 2..8)) {
        // tag 0 => prod participant, 1 => research participant, 2 => bystander
        let participant_indices: Vec<usize> =
            tags.iter().enumerate().filter(|&(_, &t)| t < 2).map(|(i, _)| i).collect();
        let has_prod = tags.iter().any(|&t| t == 0);
        let has_research = tags.iter().any(|&t| t == 1);
        prop_assume!(has_prod && has_research);
        prop_assume!(participant_indices.len() >= 2);

        let requests: Vec<AccessRequest> = tags
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let role = match t {
                    0 => "prod-role",
                    1 => "research-role",
                    _ => "safe-role",
                };
                approved(&format!("r{i}"), &[role], 1, i as u64)
            })
            .collect();

        // Highest index == highest created_at_ms == newest, ids are unique so
        // no tie-break ambiguity.
        let newest_id = format!("r{}", participant_indices.iter().max().unwrap());

        let mock = MockPlatformClient::new(vec![]);
        let matcher = PatternMatcher::new(["prod", "research"]).unwrap();
        let switches =
            PolicySwitches { check_resources: false, check_conflicts: true, max_resources: 1_000 };
        let mut reconciler = Reconciler::new();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(reconciler.reconcile(&mock, requests, switches, &matcher, 0));

        let locked_ids: HashSet<String> =
            mock.locks().into_iter().map(|l| l.target_request_id).collect();
        prop_assert!(!locked_ids.contains(&newest_id));
    }
}
