//! Approval Error Handling
//!
//! Every failure a verification can end with is a variant of [`ApprovalError`].
//! None of them is recoverable from inside the library: they all surface to the
//! calling test, which is expected to fail with the rendered message.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApprovalError>;

/// Full context of a received snapshot that does not match its approved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMismatch {
    pub diff: String,
    pub received_content: String,
    pub approved_content: String,
    pub received_file: PathBuf,
    pub approved_file: PathBuf,
}

impl ContentMismatch {
    /// Headline naming both files.
    ///
    /// Files living in the same directory are named by file name only, with the
    /// shared directory mentioned once. Otherwise both full paths are printed.
    pub fn headline(&self) -> String {
        let received_dir = self.received_file.parent();
        let approved_dir = self.approved_file.parent();
        match (received_dir, approved_dir) {
            (Some(received_dir), Some(approved_dir)) if received_dir == approved_dir => format!(
                "Content of {} and {} in {} is different than expected:",
                file_name(&self.received_file),
                file_name(&self.approved_file),
                received_dir.display()
            ),
            _ => format!(
                "Content of {} and {} is different than expected:",
                self.received_file.display(),
                self.approved_file.display()
            ),
        }
    }
}

impl std::fmt::Display for ContentMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.headline())?;
        write!(f, "{}", self.diff)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Unified error type for every verification failure mode.
#[derive(Debug, Error, Diagnostic)]
pub enum ApprovalError {
    /// The payload handed to a JSON verification is not well-formed JSON.
    #[error("Payload is not valid JSON: {source}")]
    #[diagnostic(code(explicit_approvals::parse))]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// An ignored-path expression could not be evaluated.
    #[error("Invalid JSON path '{path}': {message}")]
    #[diagnostic(
        code(explicit_approvals::json_path),
        help("Paths follow the JSONPath syntax, for example `$.items[*].id` or `$..timestamp`")
    )]
    InvalidJsonPath { path: String, message: String },

    /// The same snapshot name was verified twice within one approver.
    #[error("Snapshot '{name}' already checked. You are trying to override snapshot that has been already checked within this test method")]
    #[diagnostic(
        code(explicit_approvals::snapshot_overridden),
        help("Use the `*_for_scenario` variant and give every snapshot within a single test method a unique scenario name")
    )]
    SnapshotOverridden { name: String },

    /// Received content differs from the approved content.
    #[error("{0}")]
    #[diagnostic(code(explicit_approvals::content_mismatch))]
    ContentMismatch(Box<ContentMismatch>),

    /// A reporter ran for a failed comparison without approving it.
    #[error("Failed approval: {} does not match {}", .received.display(), .approved.display())]
    #[diagnostic(code(explicit_approvals::not_approved))]
    NotApproved { approved: PathBuf, received: PathBuf },

    /// The context-aware reporter was selected but no diff tool fits the current host.
    #[error("Unable to find a preferred diff tool for the current host")]
    #[diagnostic(
        code(explicit_approvals::diff_tool_not_found),
        help("Unset DiffEngine_UseContextAwareReporter or run the tests from a supported editor")
    )]
    DiffToolNotFound,

    /// The diff tool process could not be started.
    #[error("Failed to launch diff tool '{program}': {source}")]
    #[diagnostic(code(explicit_approvals::diff_tool_launch))]
    DiffToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Copying the received file over the approved one did not verify.
    #[error("Auto-approval of {} failed: {reason}", .approved.display())]
    #[diagnostic(code(explicit_approvals::auto_approval))]
    AutoApprovalFailed {
        approved: PathBuf,
        received: PathBuf,
        reason: String,
    },

    /// Turning a value into JSON failed.
    #[error("Failed to serialize value to JSON: {0}")]
    #[diagnostic(code(explicit_approvals::serialize))]
    Serialize(#[source] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(explicit_approvals::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApprovalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApprovalError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn mismatch(mismatch: ContentMismatch) -> Self {
        ApprovalError::ContentMismatch(Box::new(mismatch))
    }

    /// The mismatch details, when this error is a content mismatch.
    pub fn as_mismatch(&self) -> Option<&ContentMismatch> {
        match self {
            ApprovalError::ContentMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }
}
