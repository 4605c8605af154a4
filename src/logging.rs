//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events. Binaries and test suites that want
//! to see them call [`init`] once.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output down to debug level.
    Development,
    /// Warnings and errors only.
    Quiet,
    /// Output routed through the test harness capture.
    Test,
}

impl Profile {
    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "explicit_approvals=debug",
            Profile::Quiet => "explicit_approvals=warn",
            Profile::Test => "explicit_approvals=info",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Installs the global subscriber. `RUST_LOG` overrides the profile's level.
///
/// Only the first call has an effect. A subscriber installed elsewhere is left
/// in place.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);
        let _ = match profile {
            Profile::Test => builder.with_test_writer().try_init(),
            Profile::Development | Profile::Quiet => builder.with_writer(std::io::stderr).try_init(),
        };
    });
}
