//! # Approver
//!
//! [`Approver`] is the entry point of a test: it names snapshots after the test,
//! scrubs candidates, compares them with approved files and hands failures to
//! the configured reporter.
//!
//! ```ignore
//! let mut approver = explicit_approvals::approver!();
//! approver.verify_json(&payload, &["$.createdAt"])?;
//! approver.verify_json_for_scenario("after update", &updated, &["$.createdAt"])?;
//! ```
//!
//! Each snapshot name may be verified once per approver; use the
//! `*_for_scenario` variants for several snapshots within one test.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::ApproverConfig;
use crate::errors::{ApprovalError, Result};
use crate::json_diff::{compute_json_diff, JsonDiffFormatter};
use crate::namer::{ExplicitNamer, SnapshotTracker};
use crate::reporters::{AutoApprover, ReportOutcome, Reporter};
use crate::scrubbers::{ComposedScrubber, JsonPathScrubber, Scrubber};
use crate::serializer::serialize_object;
use crate::storage::{ComparisonResult, SnapshotFiles};

const JSON_EXTENSION: &str = "json";

/// Result of a successful verification. Failures are returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The candidate matched the approved snapshot.
    Passed,
    /// The candidate differed and was approved by the reporter.
    AutoApproved,
}

/// Verifies snapshots for one test.
#[derive(Debug)]
pub struct Approver {
    namer: ExplicitNamer,
    config: ApproverConfig,
    tracker: SnapshotTracker,
}

impl Approver {
    /// An approver using [`ApproverConfig::from_env`].
    pub fn new(namer: ExplicitNamer) -> Self {
        Self {
            namer,
            config: ApproverConfig::from_env(),
            tracker: SnapshotTracker::new(),
        }
    }

    /// An approver for `test_method` defined in `test_file`.
    pub fn for_test(test_file: impl AsRef<Path>, test_method: &str) -> Self {
        Self::new(ExplicitNamer::for_test(test_file.as_ref(), test_method))
    }

    pub fn with_test_case(mut self, test_case: &str) -> Self {
        self.namer = self.namer.with_test_case(test_case);
        self
    }

    pub fn with_config(mut self, config: ApproverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.config.auto_approve = auto_approve;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.config.reporter = reporter;
        self
    }

    pub fn with_diff_formatter(mut self, formatter: Arc<dyn JsonDiffFormatter>) -> Self {
        self.config.diff_formatter = formatter;
        self
    }

    pub fn namer(&self) -> &ExplicitNamer {
        &self.namer
    }

    pub fn config(&self) -> &ApproverConfig {
        &self.config
    }

    /// Verifies plain text stored with the given file extension.
    pub fn verify_text(
        &mut self,
        text: &str,
        extension: &str,
        scrubber: Option<&dyn Scrubber>,
    ) -> Result<VerificationOutcome> {
        let namer = self.namer.clone();
        self.verify(namer, text, extension, scrubber)
    }

    pub fn verify_text_for_scenario(
        &mut self,
        scenario: &str,
        text: &str,
        extension: &str,
        scrubber: Option<&dyn Scrubber>,
    ) -> Result<VerificationOutcome> {
        let namer = self.namer.for_scenario(scenario);
        self.verify(namer, text, extension, scrubber)
    }

    /// Verifies a JSON payload, masking values at `ignored_paths`.
    pub fn verify_json(&mut self, payload: &str, ignored_paths: &[&str]) -> Result<VerificationOutcome> {
        let namer = self.namer.clone();
        self.verify_json_as(namer, payload, ignored_paths)
    }

    pub fn verify_json_for_scenario(
        &mut self,
        scenario: &str,
        payload: &str,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        let namer = self.namer.for_scenario(scenario);
        self.verify_json_as(namer, payload, ignored_paths)
    }

    /// Serializes `data` with the configured serializer and verifies it as JSON.
    pub fn verify_object<T>(&mut self, data: &T, ignored_paths: &[&str]) -> Result<VerificationOutcome>
    where
        T: Serialize + ?Sized,
    {
        let payload = serialize_object(self.config.serializer.as_ref(), data)?;
        self.verify_json(&payload, ignored_paths)
    }

    pub fn verify_object_for_scenario<T>(
        &mut self,
        scenario: &str,
        data: &T,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome>
    where
        T: Serialize + ?Sized,
    {
        let payload = serialize_object(self.config.serializer.as_ref(), data)?;
        self.verify_json_for_scenario(scenario, &payload, ignored_paths)
    }

    /// Verifies the structural delta between two JSON payloads.
    ///
    /// `ignored_paths` select nodes of the rendered delta, not of the inputs.
    pub fn verify_json_diff(
        &mut self,
        before: &str,
        after: &str,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        let namer = self.namer.clone();
        self.verify_json_diff_as(namer, before, after, ignored_paths)
    }

    pub fn verify_json_diff_for_scenario(
        &mut self,
        scenario: &str,
        before: &str,
        after: &str,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        let namer = self.namer.for_scenario(scenario);
        self.verify_json_diff_as(namer, before, after, ignored_paths)
    }

    pub fn verify_object_diff<A, B>(
        &mut self,
        before: &A,
        after: &B,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome>
    where
        A: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let before = serialize_object(self.config.serializer.as_ref(), before)?;
        let after = serialize_object(self.config.serializer.as_ref(), after)?;
        self.verify_json_diff(&before, &after, ignored_paths)
    }

    pub fn verify_object_diff_for_scenario<A, B>(
        &mut self,
        scenario: &str,
        before: &A,
        after: &B,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome>
    where
        A: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let before = serialize_object(self.config.serializer.as_ref(), before)?;
        let after = serialize_object(self.config.serializer.as_ref(), after)?;
        self.verify_json_diff_for_scenario(scenario, &before, &after, ignored_paths)
    }

    /// Verifies an already-fetched response body as JSON.
    pub fn verify_response_body(&mut self, body: &[u8], ignored_paths: &[&str]) -> Result<VerificationOutcome> {
        self.verify_json(&String::from_utf8_lossy(body), ignored_paths)
    }

    pub fn verify_response_body_for_scenario(
        &mut self,
        scenario: &str,
        body: &[u8],
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        self.verify_json_for_scenario(scenario, &String::from_utf8_lossy(body), ignored_paths)
    }

    /// Verifies the structural delta between two response bodies.
    pub fn verify_response_body_diff(
        &mut self,
        first: &[u8],
        second: &[u8],
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        self.verify_json_diff(
            &String::from_utf8_lossy(first),
            &String::from_utf8_lossy(second),
            ignored_paths,
        )
    }

    pub fn verify_response_body_diff_for_scenario(
        &mut self,
        scenario: &str,
        first: &[u8],
        second: &[u8],
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        self.verify_json_diff_for_scenario(
            scenario,
            &String::from_utf8_lossy(first),
            &String::from_utf8_lossy(second),
            ignored_paths,
        )
    }

    fn verify_json_as(
        &mut self,
        namer: ExplicitNamer,
        payload: &str,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        let scrubber = JsonPathScrubber::new(ignored_paths.iter().copied());
        self.verify(namer, payload, JSON_EXTENSION, Some(&scrubber))
    }

    fn verify_json_diff_as(
        &mut self,
        namer: ExplicitNamer,
        before: &str,
        after: &str,
        ignored_paths: &[&str],
    ) -> Result<VerificationOutcome> {
        let diff = compute_json_diff(before, after, self.config.diff_formatter.as_ref())?;
        self.verify_json_as(namer, &diff, ignored_paths)
    }

    fn verify(
        &mut self,
        namer: ExplicitNamer,
        text: &str,
        extension: &str,
        scrubber: Option<&dyn Scrubber>,
    ) -> Result<VerificationOutcome> {
        self.tracker.register(&namer)?;

        let global = self.config.global_scrubber.as_deref();
        let candidate = ComposedScrubber::new([scrubber, global]).scrub(text)?;

        let store = Arc::clone(&self.config.store);
        let files = store.locate(&namer, extension);
        debug!(snapshot = namer.name(), received = %files.received.display(), "verifying snapshot");

        match store.compare(&files, &candidate)? {
            ComparisonResult::Matched => {
                store.clean_up(&files)?;
                Ok(VerificationOutcome::Passed)
            }
            ComparisonResult::Mismatched => {
                let outcome = self.report_failure(&files)?;
                store.clean_up(&files)?;
                Ok(outcome)
            }
        }
    }

    /// Hands a mismatch to the reporter. Returns only when the reporter approved it.
    fn report_failure(&self, files: &SnapshotFiles) -> Result<VerificationOutcome> {
        let reporter: Arc<dyn Reporter> = if self.config.auto_approve {
            Arc::new(AutoApprover)
        } else {
            Arc::clone(&self.config.reporter)
        };

        let not_approved = || ApprovalError::NotApproved {
            approved: files.approved.clone(),
            received: files.received.clone(),
        };
        if !reporter.is_working_in_this_environment(&files.received) {
            return Err(not_approved());
        }
        match reporter.report(&files.approved, &files.received)? {
            ReportOutcome::Approved => Ok(VerificationOutcome::AutoApproved),
            ReportOutcome::Reported => Err(not_approved()),
        }
    }
}

/// Locates the test source named by `file!()`.
///
/// `file!()` is relative to the workspace root, which may be an ancestor of the
/// crate's manifest directory.
pub fn resolve_test_file(manifest_dir: &str, file: &str) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        return file.to_path_buf();
    }
    let manifest_dir = Path::new(manifest_dir);
    manifest_dir
        .ancestors()
        .map(|dir| dir.join(file))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| manifest_dir.join(file))
}

#[doc(hidden)]
pub fn type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Extracts the enclosing function name from the type name of a probe item
/// declared inside it.
#[doc(hidden)]
pub fn test_method_name(probe_type_name: &str) -> &str {
    let mut path = probe_type_name
        .strip_suffix("::__approver_probe")
        .unwrap_or(probe_type_name);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Builds an [`Approver`] named after the calling test function and its file.
#[macro_export]
macro_rules! approver {
    () => {{
        fn __approver_probe() {}
        $crate::Approver::for_test(
            $crate::approver::resolve_test_file(env!("CARGO_MANIFEST_DIR"), file!()),
            $crate::approver::test_method_name($crate::approver::type_name_of(__approver_probe)),
        )
    }};
}
