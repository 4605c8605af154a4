use std::fs;
use std::path::Path;

use tracing::info;

use super::{ReportOutcome, Reporter};
use crate::errors::{ApprovalError, Result};

/// Promotes the received file to the approved file.
///
/// Any existing approved file is deleted first, and each step is checked on
/// disk; a step that does not take effect fails the verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprover;

impl AutoApprover {
    fn integrity_error(approved: &Path, received: &Path, reason: &str) -> ApprovalError {
        ApprovalError::AutoApprovalFailed {
            approved: approved.to_path_buf(),
            received: received.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl Reporter for AutoApprover {
    fn name(&self) -> &str {
        "AutoApprover"
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        info!(
            "Will auto-copy \"{}\" to \"{}\"",
            received.display(),
            approved.display()
        );

        if !received.exists() {
            return Err(Self::integrity_error(approved, received, "received file does not exist"));
        }
        match fs::remove_file(approved) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ApprovalError::io(approved, e)),
        }
        if approved.exists() {
            return Err(Self::integrity_error(approved, received, "approved file could not be removed"));
        }
        fs::copy(received, approved).map_err(|e| ApprovalError::io(approved, e))?;
        if !approved.exists() {
            return Err(Self::integrity_error(approved, received, "approved file missing after copy"));
        }
        Ok(ReportOutcome::Approved)
    }
}
