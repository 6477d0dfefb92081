//! CLI entry point for the JIT access watcher control loop.

#![deny(unsafe_code)]

use clap::Parser;
use jitw_core::RawConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;

/// Automated policy enforcement for just-in-time privileged access requests.
#[derive(Parser, Debug)]
#[command(name = "jit-watcher", about = "Reconciles JIT access requests against declarative policy")]
struct CliArgs {
    /// `host:port` of the access platform's gRPC proxy.
    #[arg(short = 'p', long)]
    proxy: Option<String>,

    /// Path to the identity-file credential bundle.
    #[arg(short = 'i', long)]
    identity_file: Option<PathBuf>,

    /// Maximum resources a user's approved requests may collectively hold.
    #[arg(short = 'm', long, default_value_t = jitw_core::Config::DEFAULT_MAX_RESOURCES)]
    max_resources: i64,

    /// Enforce the resource-count limit.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    resource_limit: bool,

    /// Enforce role-conflict / environment-separation checking.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    role_conflicts: bool,

    /// Comma-separated conflict patterns (trimmed; empty entries dropped).
    #[arg(long, default_value = "prod,research")]
    conflict_patterns: String,

    /// Reconciliation cadence, in seconds (minimum 1).
    #[arg(long, default_value_t = 30)]
    poll_interval: u64,

    /// Enable DEBUG-level logging.
    #[arg(short = 'd', long, default_value_t = false)]
    debug: bool,
}

impl CliArgs {
    fn into_raw_config(self) -> RawConfig {
        let conflict_patterns = self
            .conflict_patterns
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        RawConfig {
            proxy: self.proxy,
            identity_file: self.identity_file,
            max_resources: self.max_resources,
            check_resources: self.resource_limit,
            check_conflicts: self.role_conflicts,
            conflict_patterns,
            poll_interval: Duration::from_secs(self.poll_interval),
            debug: self.debug,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let debug = args.debug;
    let raw = args.into_raw_config();

    if jitw_telemetry::init_logging(debug).is_err() {
        eprintln!("warning: a tracing subscriber was already installed");
    }

    match jitw_watcher::run(raw).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "fatal startup error");
            ExitCode::FAILURE
        }
    }
}
