use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::{ReportOutcome, Reporter};
use crate::environment::{
    context_aware_enabled, DiffTool, DiffToolLauncher, HostEnvironment, HostKind,
    NativeEnvironment, ProcessLauncher,
};
use crate::errors::{ApprovalError, Result};

/// Opens the diff view of the editor or IDE that launched the tests.
///
/// Only applicable when `DiffEngine_UseContextAwareReporter=true` and a known
/// host was found among the test process and its ancestors.
pub struct ContextAwareDiffToolReporter {
    env: Arc<dyn HostEnvironment>,
    launcher: Arc<dyn DiffToolLauncher>,
    preferred: OnceCell<Option<DiffTool>>,
}

impl Default for ContextAwareDiffToolReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextAwareDiffToolReporter {
    pub fn new() -> Self {
        Self::with_environment(Arc::new(NativeEnvironment), Arc::new(ProcessLauncher))
    }

    pub fn with_environment(
        env: Arc<dyn HostEnvironment>,
        launcher: Arc<dyn DiffToolLauncher>,
    ) -> Self {
        Self {
            env,
            launcher,
            preferred: OnceCell::new(),
        }
    }

    /// The tool for the detected host, resolved once.
    pub fn preferred_tool(&self) -> Option<&DiffTool> {
        self.preferred
            .get_or_init(|| {
                let host = HostKind::detect(self.env.as_ref());
                debug!(?host, "detected test host");
                host.diff_tool()
            })
            .as_ref()
    }
}

impl Reporter for ContextAwareDiffToolReporter {
    fn name(&self) -> &str {
        "ContextAwareDiffToolReporter"
    }

    fn is_working_in_this_environment(&self, _received: &Path) -> bool {
        context_aware_enabled(self.env.as_ref()) && self.preferred_tool().is_some()
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        let tool = self.preferred_tool().ok_or(ApprovalError::DiffToolNotFound)?;
        self.launcher.launch(tool, received, approved)?;
        Ok(ReportOutcome::Reported)
    }
}
