//! # Failure Reporters
//!
//! A reporter decides what happens when a received snapshot does not match its
//! approved file. Reporters are queried in priority order through
//! [`FirstWorkingReporter`]; the first one that works in the current environment
//! handles the failure.
//!
//! | Reporter | Applicable when | Effect |
//! |---|---|---|
//! | [`BuildServerReporter`] | a CI marker variable is set | delegates (to the inline diff by default) |
//! | [`ContextAwareDiffToolReporter`] | opted in and a known editor launched the tests | opens the editor's diff view |
//! | [`InlineDiffReporter`] | always | fails with the rendered diff |
//! | [`DebuggerStepReporter`] | a debugger is attached | delegates, then breaks |
//! | [`AutoApprover`] | always (only selected on request) | copies received over approved |

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::Result;

mod auto_approve;
mod build_server;
mod debugger;
mod diff_tool;
mod first_working;
mod inline;

pub use auto_approve::AutoApprover;
pub use build_server::BuildServerReporter;
pub use debugger::DebuggerStepReporter;
pub use diff_tool::ContextAwareDiffToolReporter;
pub use first_working::FirstWorkingReporter;
pub use inline::InlineDiffReporter;

/// What a reporter did with a failed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The failure was surfaced; the snapshot is still not approved.
    Reported,
    /// The received content is now the approved content.
    Approved,
}

pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this reporter can run for `received` in the current environment.
    fn is_working_in_this_environment(&self, _received: &Path) -> bool {
        true
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome>;
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_working_in_this_environment(&self, received: &Path) -> bool {
        (**self).is_working_in_this_environment(received)
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        (**self).report(approved, received)
    }
}

static DEFAULT_REPORTER: Lazy<Arc<dyn Reporter>> = Lazy::new(|| {
    Arc::new(FirstWorkingReporter::new(vec![
        Arc::new(BuildServerReporter::new(Arc::new(InlineDiffReporter::new()))),
        Arc::new(ContextAwareDiffToolReporter::new()),
        Arc::new(InlineDiffReporter::new()),
    ]))
});

/// The process-wide default chain: build server, then editor diff tool, then inline diff.
pub fn default_reporter() -> Arc<dyn Reporter> {
    Arc::clone(&DEFAULT_REPORTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reporter_is_shared() {
        let first = default_reporter();
        let second = default_reporter();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "FirstWorkingReporter");
    }
}
