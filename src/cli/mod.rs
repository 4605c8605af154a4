//! The `approvals` command-line tool.
//!
//! Maintenance commands for snapshot files left behind by failing tests:
//! listing them, approving them in bulk and printing their inline diff.

use std::path::Path;
use std::process;

use clap::Parser;
use termcolor::{StandardStream, WriteColor};
use tracing::debug;

use crate::cli::args::{ApprovalsArgs, Command};
use crate::errors::{ApprovalError, Result};
use crate::inline_diff::render_inline_diff;
use crate::logging::{self, Profile};
use crate::reporters::{AutoApprover, Reporter};
use crate::storage::{find_pending, read_or_empty};

pub mod args;
pub mod output;

/// Exit status when a diff found differences.
pub const EXIT_DIFFERENT: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// The main entry point for the CLI.
pub fn run() {
    let args = ApprovalsArgs::parse();
    logging::init(if args.verbose {
        Profile::Development
    } else {
        Profile::Quiet
    });

    let mut stdout = StandardStream::stdout(output::color_choice());
    match execute(&args.command, &mut stdout) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_DIFFERENT),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(EXIT_ERROR);
        }
    }
}

/// Runs one command. Returns `false` when a diff found differences.
pub fn execute(command: &Command, out: &mut dyn WriteColor) -> Result<bool> {
    match command {
        Command::Pending { dir } => handle_pending(dir, out),
        Command::Approve { dir } => handle_approve(dir, out),
        Command::Diff {
            approved,
            received,
            show_whitespace,
        } => handle_diff(approved, received, *show_whitespace, out),
    }
}

fn handle_pending(dir: &Path, out: &mut dyn WriteColor) -> Result<bool> {
    let pending = find_pending(dir)?;
    output::print_pending(out, dir, &pending).map_err(|e| ApprovalError::io(dir, e))?;
    Ok(true)
}

fn handle_approve(dir: &Path, out: &mut dyn WriteColor) -> Result<bool> {
    let pending = find_pending(dir)?;
    debug!(count = pending.len(), "approving pending snapshots");
    for files in &pending {
        AutoApprover.report(&files.approved, &files.received)?;
        std::fs::remove_file(&files.received).map_err(|e| ApprovalError::io(&files.received, e))?;
        output::print_approved(out, dir, files).map_err(|e| ApprovalError::io(dir, e))?;
    }
    Ok(true)
}

fn handle_diff(
    approved: &Path,
    received: &Path,
    show_whitespace: bool,
    out: &mut dyn WriteColor,
) -> Result<bool> {
    let approved_content = read_or_empty(approved)?;
    let received_content =
        std::fs::read_to_string(received).map_err(|e| ApprovalError::io(received, e))?;
    let diff = render_inline_diff(&approved_content, &received_content, show_whitespace);
    output::print_inline_diff(out, &diff).map_err(|e| ApprovalError::io(received, e))?;
    Ok(diff.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use termcolor::Buffer;

    #[test]
    fn test_approve_promotes_and_removes_received() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.received.txt"), "new").unwrap();
        fs::write(dir.path().join("a.approved.txt"), "old").unwrap();

        let mut buffer = Buffer::no_color();
        let clean = execute(
            &Command::Approve {
                dir: dir.path().to_path_buf(),
            },
            &mut buffer,
        )
        .unwrap();
        assert!(clean);
        assert_eq!(fs::read_to_string(dir.path().join("a.approved.txt")).unwrap(), "new");
        assert!(!dir.path().join("a.received.txt").exists());
    }

    #[test]
    fn test_diff_reports_differences() {
        let dir = tempdir().unwrap();
        let approved = dir.path().join("a.approved.txt");
        let received = dir.path().join("a.received.txt");
        fs::write(&approved, "a\nb\n").unwrap();
        fs::write(&received, "a\nc\n").unwrap();

        let mut buffer = Buffer::no_color();
        let command = Command::Diff {
            approved,
            received,
            show_whitespace: false,
        };
        assert!(!execute(&command, &mut buffer).unwrap());
        let out = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(out.contains("From line 2:"));
    }

    #[test]
    fn test_diff_of_missing_received_is_an_error() {
        let mut buffer = Buffer::no_color();
        let command = Command::Diff {
            approved: PathBuf::from("missing.approved.txt"),
            received: PathBuf::from("missing.received.txt"),
            show_whitespace: false,
        };
        assert!(matches!(
            execute(&command, &mut buffer),
            Err(ApprovalError::Io { .. })
        ));
    }
}
