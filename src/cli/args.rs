//! Command-line arguments of the `approvals` tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "approvals",
    version,
    about = "Inspect, diff and approve pending snapshot files."
)]
pub struct ApprovalsArgs {
    /// Log decisions at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List received snapshots that have not been approved.
    Pending {
        /// Directory searched recursively for `*.received.*` files.
        #[arg(default_value = "tests")]
        dir: PathBuf,
    },
    /// Promote every received snapshot under a directory to approved.
    Approve {
        #[arg(default_value = "tests")]
        dir: PathBuf,
    },
    /// Print the inline diff between an approved and a received file.
    Diff {
        #[arg(required = true)]
        approved: PathBuf,
        #[arg(required = true)]
        received: PathBuf,
        /// Render spaces, tabs and line endings visibly.
        #[arg(short = 'w', long)]
        show_whitespace: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diff() {
        let args = ApprovalsArgs::parse_from(["approvals", "diff", "a.approved.txt", "a.received.txt", "-w"]);
        match args.command {
            Command::Diff {
                approved,
                received,
                show_whitespace,
            } => {
                assert_eq!(approved, PathBuf::from("a.approved.txt"));
                assert_eq!(received, PathBuf::from("a.received.txt"));
                assert!(show_whitespace);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pending_defaults_to_tests_dir() {
        let args = ApprovalsArgs::parse_from(["approvals", "pending", "--verbose"]);
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Pending { ref dir } if dir == &PathBuf::from("tests")));
    }
}
