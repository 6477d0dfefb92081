//! The control loop (component G): schedules reconciliation on a fixed
//! cadence, propagates cancellation, and surfaces fatal connectivity errors.

#![deny(unsafe_code)]

mod shutdown;

use jitw_core::{Config, PlatformClient};
use jitw_platform::GrpcPlatformClient;
use jitw_policy::PatternMatcher;
use jitw_reconcile::{adjudicate, PolicySwitches, Reconciler};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{error, info, info_span, warn, Instrument};

/// Everything that can abort startup before the first tick runs. Both
/// variants are fatal (§7 kinds 1-2); the caller exits with status 1.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] jitw_core::ConfigError),
    /// A configured conflict pattern failed to compile.
    #[error("failed to compile conflict patterns: {0}")]
    Pattern(#[from] regex::Error),
    /// Building the transport or the initial `Ping` failed.
    #[error(transparent)]
    Connect(#[from] jitw_core::PlatformError),
}

/// How long shutdown may take after cancellation before the process exits
/// anyway (§4.G).
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Validate `config`, connect the gRPC facade, compile patterns, and `Ping`
/// the platform — then run the control loop until an OS interrupt/terminate
/// signal arrives. This is the entry point the CLI binary calls.
pub async fn run(raw: jitw_core::RawConfig) -> Result<(), StartupError> {
    let config = Config::validate(raw)?;
    let client = GrpcPlatformClient::connect(&config.proxy, &config.identity_file).await?;
    run_with_client(Arc::new(client), config).await
}

/// Same startup sequence as [`run`], but against a caller-supplied facade —
/// the seam tests use to substitute a `MockPlatformClient`.
pub async fn run_with_client(
    client: Arc<dyn PlatformClient>,
    config: Config,
) -> Result<(), StartupError> {
    let matcher = PatternMatcher::new(config.conflict_patterns.iter().cloned())?;
    client.ping().await?;

    info!(
        proxy = %config.proxy,
        check_resources = config.check_resources,
        check_conflicts = config.check_conflicts,
        max_resources = config.max_resources,
        poll_interval_secs = config.poll_interval.as_secs(),
        conflict_patterns = ?config.conflict_patterns,
        "starting control loop"
    );

    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut reconciler = Reconciler::new();
    let switches = PolicySwitches {
        check_resources: config.check_resources,
        check_conflicts: config.check_conflicts,
        max_resources: config.max_resources,
    };

    let mut tick_id: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick_id += 1;
                run_tick(client.as_ref(), &mut reconciler, switches, &matcher, tick_id).await;
            }
            () = shutdown::signalled() => {
                info!("shutdown signal received, draining");
                break;
            }
        }
    }

    match timeout(SHUTDOWN_TIMEOUT, client.close()).await {
        Ok(Ok(())) => info!("facade closed cleanly"),
        Ok(Err(error)) => warn!(%error, "facade close returned an error"),
        Err(_) => error!("shutdown exceeded {:?}, exiting anyway", SHUTDOWN_TIMEOUT),
    }

    Ok(())
}

/// One pass: list → adjudicate pending → reconcile approved. A list
/// failure (§7 kind 3) is logged and the tick is abandoned; it does not
/// propagate.
async fn run_tick(
    client: &dyn PlatformClient,
    reconciler: &mut Reconciler,
    switches: PolicySwitches,
    matcher: &PatternMatcher,
    tick_id: u64,
) {
    let span = info_span!("tick", tick_id);
    async {
        let mut requests = match client.list_access_requests().await {
            Ok(requests) => requests,
            Err(error) => {
                error!(%error, "list_access_requests failed, skipping tick");
                return;
            }
        };

        adjudicate(client, &mut requests, switches, matcher).await;

        let approved: Vec<_> = requests
            .into_iter()
            .filter(|r| r.state == jitw_core::RequestState::Approved)
            .collect();
        reconciler.reconcile(client, approved, switches, matcher, now_ms()).await;
    }
    .instrument(span)
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitw_core::{AccessRequest, RequestState, ResourceRef};
    use jitw_platform::MockPlatformClient;

    fn pending(id: &str, user: &str, roles: &[&str]) -> AccessRequest {
        AccessRequest {
            id: id.to_string(),
            user: user.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            resources: vec![ResourceRef::new("node", "n1")],
            created_at_ms: 0,
            state: RequestState::Pending,
        }
    }

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(["prod", "research"]).unwrap()
    }

    fn switches() -> PolicySwitches {
        PolicySwitches { check_resources: true, check_conflicts: true, max_resources: 3 }
    }

    #[tokio::test]
    async fn one_tick_adjudicates_and_reconciles() {
        let mock = Arc::new(MockPlatformClient::new(vec![pending("r1", "alice", &["db-readonly"])]));
        let mut reconciler = Reconciler::new();
        run_tick(mock.as_ref(), &mut reconciler, switches(), &matcher(), 1).await;
        assert_eq!(mock.request_state("r1"), Some(RequestState::Approved));
        assert!(mock.locks().is_empty());
    }

    #[tokio::test]
    async fn set_state_failure_is_absorbed_not_propagated() {
        let mock = Arc::new(MockPlatformClient::new(vec![pending("r1", "alice", &["db-readonly"])]));
        mock.fail_calls(true);
        let mut reconciler = Reconciler::new();
        run_tick(mock.as_ref(), &mut reconciler, switches(), &matcher(), 1).await;
        assert_eq!(mock.request_state("r1"), Some(RequestState::Pending));
    }
}
