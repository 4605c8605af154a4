//! Reporter selection against a simulated host.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use explicit_approvals::environment::{DiffTool, DiffToolLauncher, HostEnvironment, CONTEXT_AWARE_FLAG};
use explicit_approvals::reporters::{
    AutoApprover, BuildServerReporter, ContextAwareDiffToolReporter, DebuggerStepReporter,
    FirstWorkingReporter, InlineDiffReporter, ReportOutcome, Reporter,
};
use explicit_approvals::{ApprovalError, Approver, ApproverConfig, ExplicitNamer};
use tempfile::tempdir;

#[derive(Default)]
struct Host {
    vars: HashMap<String, String>,
    processes: Vec<String>,
    debugger: bool,
}

impl Host {
    fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    fn launched_by(mut self, names: &[&str]) -> Self {
        self.processes = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

impl HostEnvironment for Host {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn process_names(&self) -> Vec<String> {
        self.processes.clone()
    }

    fn is_debugger_attached(&self) -> bool {
        self.debugger
    }

    fn break_into_debugger(&self) {}
}

#[derive(Default)]
struct Launches(Mutex<Vec<String>>);

impl DiffToolLauncher for Launches {
    fn launch(&self, tool: &DiffTool, _received: &Path, _approved: &Path) -> explicit_approvals::Result<()> {
        self.0.lock().unwrap().push(tool.program.clone());
        Ok(())
    }
}

/// The default chain, wired to a simulated host.
fn chain(host: Host, launches: Arc<Launches>) -> FirstWorkingReporter {
    let host: Arc<dyn HostEnvironment> = Arc::new(host);
    FirstWorkingReporter::new(vec![
        Arc::new(BuildServerReporter::with_environment(
            Arc::new(InlineDiffReporter::new()),
            Arc::clone(&host),
        )),
        Arc::new(ContextAwareDiffToolReporter::with_environment(
            Arc::clone(&host),
            launches,
        )),
        Arc::new(InlineDiffReporter::new()),
    ])
}

fn failing_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let approved = dir.join("t.approved.txt");
    let received = dir.join("t.received.txt");
    fs::write(&approved, "expected\n").unwrap();
    fs::write(&received, "actual\n").unwrap();
    (approved, received)
}

#[test]
fn build_server_gets_plain_text_diff_even_inside_an_editor() {
    let dir = tempdir().unwrap();
    let (approved, received) = failing_pair(dir.path());
    let launches = Arc::new(Launches::default());
    let host = Host::default()
        .with_var("CI", "true")
        .with_var(CONTEXT_AWARE_FLAG, "true")
        .launched_by(&["t", "code"]);

    let err = chain(host, launches.clone())
        .report(&approved, &received)
        .unwrap_err();
    assert!(err.as_mismatch().is_some());
    assert!(launches.0.lock().unwrap().is_empty());
}

#[test]
fn opted_in_editor_opens_its_diff_tool() {
    let dir = tempdir().unwrap();
    let (approved, received) = failing_pair(dir.path());
    let launches = Arc::new(Launches::default());
    let host = Host::default()
        .with_var(CONTEXT_AWARE_FLAG, "TRUE")
        .launched_by(&["t", "cargo", "rustrover64"]);

    let outcome = chain(host, launches.clone())
        .report(&approved, &received)
        .unwrap();
    assert_eq!(outcome, ReportOutcome::Reported);
    assert_eq!(*launches.0.lock().unwrap(), vec!["rustrover".to_string()]);
}

#[test]
fn without_opt_in_falls_back_to_inline_diff() {
    let dir = tempdir().unwrap();
    let (approved, received) = failing_pair(dir.path());
    let launches = Arc::new(Launches::default());
    let host = Host::default().launched_by(&["t", "zed"]);

    let err = chain(host, launches.clone())
        .report(&approved, &received)
        .unwrap_err();
    let mismatch = err.as_mismatch().unwrap();
    assert!(mismatch.diff.contains("- expected"));
    assert!(mismatch.diff.contains("+ actual"));
    assert!(launches.0.lock().unwrap().is_empty());
}

#[test]
fn diff_tool_reporter_in_approver_leaves_test_failing() {
    let dir = tempdir().unwrap();
    let launches = Arc::new(Launches::default());
    let host = Host::default()
        .with_var(CONTEXT_AWARE_FLAG, "true")
        .launched_by(&["code"]);
    let config = ApproverConfig::default().with_reporter(Arc::new(chain(host, launches.clone())));
    let mut approver = Approver::new(ExplicitNamer::new(dir.path(), "ui")).with_config(config);

    let err = approver.verify_text("new", "txt", None).unwrap_err();
    assert!(matches!(err, ApprovalError::NotApproved { .. }));
    assert_eq!(launches.0.lock().unwrap().len(), 1);
}

#[test]
fn debugger_step_approves_while_attached() {
    let dir = tempdir().unwrap();
    let (approved, received) = failing_pair(dir.path());
    let host = Host {
        debugger: true,
        ..Host::default()
    };
    let reporter = DebuggerStepReporter::with_environment(Arc::new(AutoApprover), Arc::new(host));

    assert!(reporter.is_working_in_this_environment(&received));
    assert_eq!(reporter.report(&approved, &received).unwrap(), ReportOutcome::Approved);
    assert_eq!(fs::read_to_string(&approved).unwrap(), "actual\n");
}

#[test]
fn auto_approval_preempts_configured_reporter() {
    let dir = tempdir().unwrap();
    let launches = Arc::new(Launches::default());
    let config = ApproverConfig::default()
        .with_reporter(Arc::new(chain(Host::default(), launches)))
        .with_auto_approve(true);
    let mut approver = Approver::new(ExplicitNamer::new(dir.path(), "auto")).with_config(config);

    approver.verify_text("content", "txt", None).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("auto.approved.txt")).unwrap(),
        "content"
    );
}
