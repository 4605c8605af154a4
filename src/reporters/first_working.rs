use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{ReportOutcome, Reporter};
use crate::errors::{ApprovalError, Result};

/// Delegates to the first reporter that works in the current environment.
pub struct FirstWorkingReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl FirstWorkingReporter {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    /// The reporter that would handle a failure for `received`.
    pub fn select(&self, received: &Path) -> Option<&Arc<dyn Reporter>> {
        self.reporters
            .iter()
            .find(|reporter| reporter.is_working_in_this_environment(received))
    }
}

impl Reporter for FirstWorkingReporter {
    fn name(&self) -> &str {
        "FirstWorkingReporter"
    }

    fn is_working_in_this_environment(&self, received: &Path) -> bool {
        self.select(received).is_some()
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        match self.select(received) {
            Some(reporter) => {
                debug!(reporter = reporter.name(), "selected reporter");
                reporter.report(approved, received)
            }
            None => Err(ApprovalError::NotApproved {
                approved: approved.to_path_buf(),
                received: received.to_path_buf(),
            }),
        }
    }
}
