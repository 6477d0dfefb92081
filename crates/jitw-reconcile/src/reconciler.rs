//! Approved-request reconciliation (component F): for each user, lock
//! approved requests that violate role-conflict or resource-limit policy,
//! leaving compliant requests untouched.

use crate::adjudicator::PolicySwitches;
use jitw_core::{group_by_user, sort_newest_first, sort_oldest_first, AccessRequest, Lock, PlatformClient};
use jitw_policy::PatternMatcher;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Reconciles approved requests across ticks. Owns the in-process
/// locked-this-session set (§5) so repeat ticks against an unchanged
/// platform state issue no redundant `UpsertLock` calls.
#[derive(Debug, Default)]
pub struct Reconciler {
    locked_this_session: HashSet<String>,
}

impl Reconciler {
    /// A reconciler with nothing locked yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request ids locked at any point during this reconciler's lifetime.
    #[must_use]
    pub fn locked_ids(&self) -> &HashSet<String> {
        &self.locked_this_session
    }

    /// Run one reconciliation pass over `approved`, grouped by user,
    /// enforcing role-conflict (Pass 1) then resource-limit (Pass 2) per
    /// §4.F. `now_ms` seeds each lock's expiry.
    #[instrument(skip_all)]
    pub async fn reconcile(
        &mut self,
        client: &dyn PlatformClient,
        approved: Vec<AccessRequest>,
        switches: PolicySwitches,
        matcher: &PatternMatcher,
        now_ms: u64,
    ) {
        for (user, mut requests) in group_by_user(approved) {
            sort_newest_first(&mut requests);
            self.reconcile_user(client, &user, &requests, switches, matcher, now_ms).await;
        }
    }

    async fn reconcile_user(
        &mut self,
        client: &dyn PlatformClient,
        user: &str,
        requests: &[AccessRequest],
        switches: PolicySwitches,
        matcher: &PatternMatcher,
        now_ms: u64,
    ) {
        let mut removed: HashSet<String> = HashSet::new();

        if switches.check_conflicts {
            self.intra_request_pass(client, user, requests, matcher, now_ms, &mut removed).await;

            let remaining: Vec<&AccessRequest> =
                requests.iter().filter(|r| !removed.contains(&r.id)).collect();
            self.inter_request_pass(client, user, &remaining, matcher, now_ms, &mut removed).await;
        }

        if switches.check_resources {
            let remaining: Vec<&AccessRequest> =
                requests.iter().filter(|r| !removed.contains(&r.id)).collect();
            self.resource_limit_pass(client, user, &remaining, switches.max_resources, now_ms).await;
        }
    }

    /// Pass 1(a): a single request whose own roles alone conflict is always
    /// locked; there is no salvageable subset of one request.
    async fn intra_request_pass(
        &mut self,
        client: &dyn PlatformClient,
        user: &str,
        requests: &[AccessRequest],
        matcher: &PatternMatcher,
        now_ms: u64,
        removed: &mut HashSet<String>,
    ) {
        for req in requests {
            let classification = matcher.classify(&req.roles);
            if classification.is_conflict() {
                // Exclude from the inter-request union regardless of whether the
                // upsert succeeds: a request that conflicts on its own roles must
                // never count toward another user's requests being flagged as
                // inter-request participants (design note: cyclic dependency
                // between evaluators and remedy). Lock success is tracked
                // separately via `locked_this_session`, which `self.lock` retries
                // next tick if the upsert failed.
                removed.insert(req.id.clone());
                let reason = format!(
                    "Single request contains conflicting roles: {}",
                    describe_classification(&classification)
                );
                self.lock(client, user, req, reason, now_ms).await;
            }
        }
    }

    /// Pass 1(b): over the surviving set, lock every participant but the
    /// newest if the union of roles still conflicts.
    async fn inter_request_pass(
        &mut self,
        client: &dyn PlatformClient,
        user: &str,
        remaining: &[&AccessRequest],
        matcher: &PatternMatcher,
        now_ms: u64,
        removed: &mut HashSet<String>,
    ) {
        let union_roles: Vec<String> = remaining.iter().flat_map(|r| r.roles.clone()).collect();
        if !matcher.classify(&union_roles).is_conflict() {
            return;
        }

        let mut participants: Vec<AccessRequest> = remaining
            .iter()
            .filter(|r| r.roles.iter().any(|role| matcher.matches_any(role)))
            .map(|r| (*r).clone())
            .collect();

        if participants.len() < 2 {
            // No multi-request entanglement: a single participant cannot
            // conflict with itself, regardless of how the union classified.
            return;
        }

        sort_oldest_first(&mut participants);
        let newest = participants.pop().expect("checked len >= 2 above");

        let reason = format!(
            "Multi-request environment conflict: user has conflicting access across requests ({})",
            matcher.pattern_names().join(" vs ")
        );
        for req in &participants {
            if self.lock(client, user, req, reason.clone(), now_ms).await {
                removed.insert(req.id.clone());
            }
        }
        let _ = newest; // newest participant is deliberately left unlocked
    }

    /// Pass 2: greedily keep requests in newest-first order until the
    /// cumulative resource count would exceed the limit; lock the rest.
    async fn resource_limit_pass(
        &mut self,
        client: &dyn PlatformClient,
        user: &str,
        remaining: &[&AccessRequest],
        max_resources: usize,
        now_ms: u64,
    ) {
        let mut cumulative = 0usize;
        for req in remaining {
            let count = req.resource_count();
            if cumulative + count > max_resources {
                let reason = format!("Exceeded maximum approved resources limit ({max_resources})");
                self.lock(client, user, req, reason, now_ms).await;
            } else {
                cumulative += count;
            }
        }
    }

    /// Upsert a lock for `req` unless it was already locked this session.
    /// Returns whether a lock now exists (either just-issued or pre-existing).
    async fn lock(
        &mut self,
        client: &dyn PlatformClient,
        user: &str,
        req: &AccessRequest,
        reason: String,
        now_ms: u64,
    ) -> bool {
        if self.locked_this_session.contains(&req.id) {
            return true;
        }
        let lock = Lock::for_request(&req.id, reason.clone(), now_ms);
        match client.upsert_lock(&lock).await {
            Ok(()) => {
                info!(request_id = %req.id, %user, lock_name = %lock.name, %reason, "locked approved request");
                self.locked_this_session.insert(req.id.clone());
                true
            }
            Err(error) => {
                warn!(request_id = %req.id, %user, %error, "upsert_lock failed, will retry next tick");
                false
            }
        }
    }
}

fn describe_classification(classification: &jitw_policy::Classification) -> String {
    classification
        .populated()
        .map(|(pattern, roles)| format!("{pattern}: [{}]", roles.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}
