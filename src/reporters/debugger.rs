use std::path::Path;
use std::sync::Arc;

use super::{ReportOutcome, Reporter};
use crate::environment::{HostEnvironment, NativeEnvironment};
use crate::errors::Result;

/// Reports through the inner reporter, then stops in the attached debugger.
///
/// While a debugger is attached the failure counts as approved, so the test can
/// be resumed once the approved file has been updated by hand.
pub struct DebuggerStepReporter {
    inner: Arc<dyn Reporter>,
    env: Arc<dyn HostEnvironment>,
}

impl DebuggerStepReporter {
    pub fn new(inner: Arc<dyn Reporter>) -> Self {
        Self::with_environment(inner, Arc::new(NativeEnvironment))
    }

    pub fn with_environment(inner: Arc<dyn Reporter>, env: Arc<dyn HostEnvironment>) -> Self {
        Self { inner, env }
    }
}

impl Reporter for DebuggerStepReporter {
    fn name(&self) -> &str {
        "DebuggerStepReporter"
    }

    fn is_working_in_this_environment(&self, _received: &Path) -> bool {
        self.env.is_debugger_attached()
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        self.inner.report(approved, received)?;
        self.env.break_into_debugger();
        Ok(if self.env.is_debugger_attached() {
            ReportOutcome::Approved
        } else {
            ReportOutcome::Reported
        })
    }
}
