use std::path::Path;

use tracing::warn;

use super::{ReportOutcome, Reporter};
use crate::errors::{ApprovalError, ContentMismatch, Result};
use crate::inline_diff::render_inline_diff;
use crate::storage::read_or_empty;

/// Fails with a [`ContentMismatch`] carrying the rendered inline diff.
#[derive(Debug, Clone, Default)]
pub struct InlineDiffReporter {
    show_whitespace: bool,
}

impl InlineDiffReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitespace(mut self, show_whitespace: bool) -> Self {
        self.show_whitespace = show_whitespace;
        self
    }

    pub fn shows_whitespace(&self) -> bool {
        self.show_whitespace
    }
}

impl Reporter for InlineDiffReporter {
    fn name(&self) -> &str {
        "InlineDiffReporter"
    }

    fn report(&self, approved: &Path, received: &Path) -> Result<ReportOutcome> {
        let approved_content = read_or_empty(approved)?;
        let received_content = std::fs::read_to_string(received)
            .map_err(|e| ApprovalError::io(received, e))?;
        let diff = render_inline_diff(&approved_content, &received_content, self.show_whitespace);
        warn!(received = %received.display(), "snapshot mismatch");
        Err(ApprovalError::mismatch(ContentMismatch {
            diff,
            received_content,
            approved_content,
            received_file: received.to_path_buf(),
            approved_file: approved.to_path_buf(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_report_fails_with_mismatch() {
        let dir = tempdir().unwrap();
        let approved = dir.path().join("t.approved.txt");
        let received = dir.path().join("t.received.txt");
        fs::write(&approved, "a\nb\nc\n").unwrap();
        fs::write(&received, "a\nx\nc\n").unwrap();

        let err = InlineDiffReporter::new().report(&approved, &received).unwrap_err();
        let mismatch = err.as_mismatch().unwrap();
        assert_eq!(mismatch.approved_content, "a\nb\nc\n");
        assert_eq!(mismatch.received_content, "a\nx\nc\n");
        assert!(mismatch.diff.contains("From line 2:"));
        assert!(err.to_string().starts_with("Content of t.received.txt and t.approved.txt in "));
    }

    #[test]
    fn test_missing_approved_reads_as_empty() {
        let dir = tempdir().unwrap();
        let received = dir.path().join("t.received.txt");
        fs::write(&received, "new\n").unwrap();

        let err = InlineDiffReporter::new()
            .report(&dir.path().join("t.approved.txt"), &received)
            .unwrap_err();
        let mismatch = err.as_mismatch().unwrap();
        assert_eq!(mismatch.approved_content, "");
        assert!(mismatch.diff.contains("+ new"));
    }

    #[test]
    fn test_whitespace_flag_is_applied() {
        let dir = tempdir().unwrap();
        let approved = dir.path().join("t.approved.txt");
        let received = dir.path().join("t.received.txt");
        fs::write(&approved, "a b\n").unwrap();
        fs::write(&received, "a  b\n").unwrap();

        let err = InlineDiffReporter::new()
            .with_whitespace(true)
            .report(&approved, &received)
            .unwrap_err();
        assert!(err.as_mismatch().unwrap().diff.contains("a\u{00B7}\u{00B7}b"));
    }
}
