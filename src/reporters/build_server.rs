use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::{ReportOutcome, Reporter};
use crate::environment::{is_build_server, HostEnvironment, NativeEnvironment};
use crate::errors::Result;

/// Runs the inner reporter only on a build server.
///
/// Detection happens once per reporter instance.
pub struct BuildServerReporter {
    inner: Arc<dyn Reporter>,
    env: Arc<dyn HostEnvironment>,
    detected: OnceCell<bool>,
}

impl BuildServerReporter {
    pub fn new(inner: Arc<dyn Reporter>) -> Self {
        Self::with_environment(inner, Arc::new(NativeEnvironment))
    }

    pub fn with_environment(inner: Arc<dyn Reporter>, env: Arc<dyn HostEnvironment>) -> Self {
        Self {
            inner,
            env,
            detected: OnceCell::new(),
        }
    }
}

impl Reporter for BuildServerReporter {
    fn name(&self) -> &str {
        "BuildServerReporter"
    }

    fn is_working_in_this_environment(&self, _received: &Path) -> bool {
        *self.detected.get_or_init(|| {
            let detected = is_build_server(self.env.as_ref());
            debug!(detected, "build server detection");
            detected
        })
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        self.inner.report(approved, received)
    }
}
