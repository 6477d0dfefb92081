//! Structured logging init (component I). Human-readable, not JSON: the
//! watcher promises three levels (INFO/DEBUG/ERROR) and no structured
//! schema (§6).

#![deny(unsafe_code)]

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Failures initializing the global tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A subscriber was already installed (e.g. a test harness installed one first).
    #[error("a global tracing subscriber is already set")]
    AlreadyInitialized,
}

/// Install the global `tracing` subscriber: human-readable `fmt` layer,
/// filtered by `RUST_LOG` if set, otherwise DEBUG when `debug` is true and
/// INFO otherwise.
pub fn init_logging(debug: bool) -> Result<(), TelemetryError> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)
}
