//! Tracing subscriber setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TEST_TRACING: Once = Once::new();

/// Initializes the global tracing subscriber for a binary.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to `info`
/// otherwise.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

/// Initializes tracing for tests.
///
/// Safe to call from every test: initialization happens once, output goes
/// through the test writer so it is captured per test.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
            .with_test_writer()
            .init();
    });
}
