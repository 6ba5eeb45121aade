//! Logging
//!
//! Shared `tracing` initialization for all four worker binaries: an
//! env-filter driven subscriber, JSON-formatted so log aggregation can
//! parse it the same way regardless of which worker emitted the line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber. Safe to call once at the
/// start of each worker's `main`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();
}
