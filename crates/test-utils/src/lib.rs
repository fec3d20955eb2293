//! # Test Utilities
//!
//! An in-memory [`DocumentStore`](support_store::DocumentStore) and entity
//! fixtures for integration tests.

pub mod fixtures;
mod store;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use self::store::MemoryStore;

static INIT: Once = Once::new();

/// Install a `tracing` subscriber that writes to the test harness. The level
/// is taken from `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
