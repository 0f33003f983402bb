//! Test support for the Vela workspace
//!
//! Builders for domain events and aggregates with sensible defaults, plus a
//! tracing initializer for integration suites. Test-only code: builders
//! panic on invalid input rather than propagating errors.

pub mod builders;

pub use builders::{
    account, account_state, accepted, cancelled, fill, fill_for, market_order_initialized,
    submitted, working,
};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for a test binary (idempotent)
///
/// Honors `RUST_LOG`; defaults to warnings only so integrity-skip paths are
/// visible when tests exercise them.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
