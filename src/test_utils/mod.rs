//! Test utilities for tagsync
//!
//! Shared helpers for unit tests (enabled by `cfg(test)`) and for the
//! integration suite (enabled by the `test-utils` feature).
//!
//! - [`FakeHost`] - scripted executor emulating git and the build tool
//! - [`TestGit`] - real git operations on temporary repositories
//! - [`init_test_logging`] - once-only tracing setup

pub mod fake_host;
pub mod git_helper;

pub use fake_host::FakeHost;
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, tests stay quiet.
///
/// ```bash
/// RUST_LOG=runner=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
