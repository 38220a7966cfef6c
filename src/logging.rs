//! Tracing subscriber bootstrap
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the embedding application's choice. This helper wires up the common case.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; subsequent calls are no-ops (relevant in
/// test binaries where several tests may race to initialize).
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
