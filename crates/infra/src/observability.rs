//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset: the posting engines at `debug`,
/// everything else at `info`.
const DEFAULT_FILTER: &str =
    "info,ledgerpost_accounts=debug,ledgerpost_journal=debug,ledgerpost_events=debug";

/// Initialize JSON log output for the process, honouring `RUST_LOG`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_target(false)
        .try_init();
}
