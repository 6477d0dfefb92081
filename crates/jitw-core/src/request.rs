//! The access-request snapshot: a typed, platform-agnostic view of a single
//! JIT access request plus the grouping/ordering helpers the reconciler needs.

use std::cmp::Ordering;
use std::collections::HashMap;

/// A single resource targeted by an access request.
///
/// `cluster` and `sub_kind` are optional because not every resource kind
/// carries them (e.g. a `role` resource has neither); they are preserved
/// verbatim for diagnostics but never interpreted by the evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// Resource kind as reported by the platform (e.g. `"node"`, `"kube_cluster"`).
    pub kind: String,
    /// Resource name.
    pub name: String,
    /// Cluster the resource lives in, if the platform reported one.
    pub cluster: Option<String>,
    /// Finer-grained sub-kind, if the platform reported one.
    pub sub_kind: Option<String>,
}

impl ResourceRef {
    /// Construct a bare resource reference with no cluster/sub-kind detail.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), name: name.into(), cluster: None, sub_kind: None }
    }
}

/// Lifecycle state of an access request.
///
/// `Other` captures any platform state outside the three the watcher cares
/// about; snapshot construction drops `Other` requests before they ever
/// reach adjudication or reconciliation (§7 kind 5: ignored, not an error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Awaiting an auto-approve/auto-deny decision.
    Pending,
    /// Currently granted; subject to post-hoc lock enforcement.
    Approved,
    /// Already denied; no further action is taken.
    Denied,
    /// Any other platform state (e.g. an operator manually approved it through
    /// a path this watcher doesn't model). Carried for completeness, ignored
    /// by every evaluator.
    Other(String),
}

/// A platform-agnostic snapshot of one access request.
///
/// `roles` and `resources` are never mutated by the watcher; only `state`
/// transitions are ever requested, and only through the platform facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Stable, platform-unique identifier.
    pub id: String,
    /// Opaque user identifier the request was filed for.
    pub user: String,
    /// Ordered list of role names requested.
    pub roles: Vec<String>,
    /// Ordered list of resources requested.
    pub resources: Vec<ResourceRef>,
    /// Creation timestamp, milliseconds since UNIX epoch.
    pub created_at_ms: u64,
    /// Current lifecycle state.
    pub state: RequestState,
}

impl AccessRequest {
    /// Total number of resources on this request.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Sort key for "newest first": `(created_at_ms, id)` compared in reverse.
    /// Ties on `created_at_ms` break on `id` so the ordering is total, per the
    /// tie-breaking design note — always compare by `id` too, never by
    /// `created_at_ms` alone.
    fn order_key(&self) -> (u64, &str) {
        (self.created_at_ms, self.id.as_str())
    }
}

/// Sort `requests` descending by `(created_at_ms, id)` — newest, and among
/// ties the lexicographically-largest id, first.
pub fn sort_newest_first(requests: &mut [AccessRequest]) {
    requests.sort_by(|a, b| cmp_newest_first(a, b));
}

/// Sort `requests` ascending by `(created_at_ms, id)` — oldest, and among
/// ties the lexicographically-smallest id, first.
pub fn sort_oldest_first(requests: &mut [AccessRequest]) {
    requests.sort_by(|a, b| cmp_oldest_first(a, b));
}

fn cmp_oldest_first(a: &AccessRequest, b: &AccessRequest) -> Ordering {
    a.order_key().cmp(&b.order_key())
}

fn cmp_newest_first(a: &AccessRequest, b: &AccessRequest) -> Ordering {
    cmp_oldest_first(a, b).reverse()
}

/// Group `requests` by `user`, preserving each group's relative input order.
///
/// Iteration order across users is unspecified (callers treat users as
/// independent, per §5); within a group, order matches `requests`' order.
#[must_use]
pub fn group_by_user(requests: Vec<AccessRequest>) -> HashMap<String, Vec<AccessRequest>> {
    let mut groups: HashMap<String, Vec<AccessRequest>> = HashMap::new();
    for req in requests {
        groups.entry(req.user.clone()).or_default().push(req);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, created_at_ms: u64) -> AccessRequest {
        AccessRequest {
            id: id.to_string(),
            user: "alice".to_string(),
            roles: vec![],
            resources: vec![],
            created_at_ms,
            state: RequestState::Approved,
        }
    }

    #[test]
    fn newest_first_breaks_ties_by_id() {
        let mut reqs = vec![req("a", 100), req("b", 100), req("c", 200)];
        sort_newest_first(&mut reqs);
        let ids: Vec<&str> = reqs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn oldest_first_breaks_ties_by_id() {
        let mut reqs = vec![req("c", 200), req("b", 100), req("a", 100)];
        sort_oldest_first(&mut reqs);
        let ids: Vec<&str> = reqs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn group_by_user_preserves_relative_order() {
        let mut bob = req("x", 1);
        bob.user = "bob".to_string();
        let reqs = vec![req("a", 1), bob, req("b", 2)];
        let groups = group_by_user(reqs);
        let alice: Vec<&str> = groups["alice"].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(alice, vec!["a", "b"]);
        assert_eq!(groups["bob"].len(), 1);
    }
}
