//! Telemetry initialization for the yocache daemon.
//!
//! Console-only `tracing` subscriber: human-readable logs to stdout,
//! filtered by `RUST_LOG` when set, otherwise by the configured level.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Call this once at startup, before any `tracing` events are emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
