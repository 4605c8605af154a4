//! User-facing output of the `approvals` tool.
//!
//! Every printer writes to a [`WriteColor`] so commands can be rendered into a
//! plain buffer in tests.

use std::io::{self, Write};
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

use crate::storage::SnapshotFiles;

/// Colours only when stdout is a terminal.
pub fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub fn print_pending(out: &mut dyn WriteColor, root: &Path, pending: &[SnapshotFiles]) -> io::Result<()> {
    if pending.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "No pending snapshots under {}", root.display())?;
        return out.reset();
    }
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(out, "{} pending snapshot(s) under {}:", pending.len(), root.display())?;
    out.reset()?;
    for files in pending {
        let marker = if files.approved.exists() { "changed" } else { "new" };
        writeln!(out, "  [{}] {}", marker, display_relative(root, &files.received))?;
    }
    Ok(())
}

pub fn print_approved(out: &mut dyn WriteColor, root: &Path, files: &SnapshotFiles) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "approved")?;
    out.reset()?;
    writeln!(out, " {}", display_relative(root, &files.approved))
}

/// Prints an inline diff, colouring each line by its change prefix.
pub fn print_inline_diff(out: &mut dyn WriteColor, diff: &str) -> io::Result<()> {
    for line in diff.split_inclusive('\n') {
        let mut spec = ColorSpec::new();
        if line.starts_with("+ ") {
            spec.set_fg(Some(Color::Green));
        } else if line.starts_with("- ") {
            spec.set_fg(Some(Color::Red));
        } else if line.starts_with("M ") {
            spec.set_fg(Some(Color::Yellow));
        } else {
            spec.set_fg(Some(Color::Cyan)).set_bold(true);
        }
        out.set_color(&spec)?;
        write!(out, "{}", line)?;
        out.reset()?;
    }
    Ok(())
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
