//! Approver configuration.
//!
//! Everything an [`Approver`](crate::Approver) needs beyond the snapshot name is
//! collected here and fixed when the approver is built.

use std::fmt;
use std::sync::Arc;

use crate::json_diff::{DefaultJsonDiffFormatter, JsonDiffFormatter};
use crate::reporters::{default_reporter, Reporter};
use crate::scrubbers::Scrubber;
use crate::serializer::{JsonSerializer, PrettyJsonSerializer};
use crate::storage::{FileSnapshotStore, SnapshotStore};

/// Environment variable enabling auto-approval for every approver built with
/// [`ApproverConfig::from_env`].
pub const AUTO_APPROVE_VARIABLE: &str = "APPROVALS_AUTO_APPROVE";

#[derive(Clone)]
pub struct ApproverConfig {
    pub serializer: Arc<dyn JsonSerializer>,
    pub reporter: Arc<dyn Reporter>,
    pub auto_approve: bool,
    /// Applied after the per-call scrubber on every verification.
    pub global_scrubber: Option<Arc<dyn Scrubber>>,
    pub diff_formatter: Arc<dyn JsonDiffFormatter>,
    pub store: Arc<dyn SnapshotStore>,
}

impl Default for ApproverConfig {
    fn default() -> Self {
        Self {
            serializer: Arc::new(PrettyJsonSerializer),
            reporter: default_reporter(),
            auto_approve: false,
            global_scrubber: None,
            diff_formatter: Arc::new(DefaultJsonDiffFormatter),
            store: Arc::new(FileSnapshotStore::new()),
        }
    }
}

impl fmt::Debug for ApproverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApproverConfig")
            .field("reporter", &self.reporter.name())
            .field("auto_approve", &self.auto_approve)
            .field("global_scrubber", &self.global_scrubber.is_some())
            .finish_non_exhaustive()
    }
}

impl ApproverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with auto-approval taken from `APPROVALS_AUTO_APPROVE`.
    pub fn from_env() -> Self {
        let auto_approve = std::env::var(AUTO_APPROVE_VARIABLE)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self::default().with_auto_approve(auto_approve)
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn JsonSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_global_scrubber(mut self, scrubber: Arc<dyn Scrubber>) -> Self {
        self.global_scrubber = Some(scrubber);
        self
    }

    pub fn with_diff_formatter(mut self, formatter: Arc<dyn JsonDiffFormatter>) -> Self {
        self.diff_formatter = formatter;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
