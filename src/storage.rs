//! # Snapshot Storage
//!
//! Snapshots live next to the test source as a pair of files:
//!
//! - `{name}.approved.{ext}`: the accepted output, committed with the tests.
//! - `{name}.received.{ext}`: the output of the latest failing run.
//!
//! A received file only exists while a snapshot is failing; a passing
//! comparison removes it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{ApprovalError, Result};
use crate::namer::ExplicitNamer;

const APPROVED_MARKER: &str = ".approved.";
const RECEIVED_MARKER: &str = ".received.";

/// The approved/received file pair of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFiles {
    pub approved: PathBuf,
    pub received: PathBuf,
}

impl SnapshotFiles {
    pub fn new(dir: &Path, name: &str, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        Self {
            approved: dir.join(format!("{}{}{}", name, APPROVED_MARKER, extension)),
            received: dir.join(format!("{}{}{}", name, RECEIVED_MARKER, extension)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonResult {
    Matched,
    Mismatched,
}

impl ComparisonResult {
    pub fn is_match(self) -> bool {
        self == ComparisonResult::Matched
    }
}

/// Persists candidates and compares them with approved content.
pub trait SnapshotStore: Send + Sync {
    fn locate(&self, namer: &ExplicitNamer, extension: &str) -> SnapshotFiles;

    /// Writes `candidate` as the received file and compares it with the approved file.
    fn compare(&self, files: &SnapshotFiles, candidate: &str) -> Result<ComparisonResult>;

    /// Removes the received file after a successful comparison.
    fn clean_up(&self, files: &SnapshotFiles) -> Result<()>;
}

/// File-system store placing snapshots beside the test source.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    normalize_line_endings: bool,
}

impl Default for FileSnapshotStore {
    fn default() -> Self {
        Self {
            normalize_line_endings: true,
        }
    }
}

impl FileSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares bytes exactly instead of treating `\r\n` and `\n` as equal.
    pub fn with_exact_line_endings(mut self) -> Self {
        self.normalize_line_endings = false;
        self
    }

    fn normalize<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if self.normalize_line_endings && text.contains('\r') {
            text.replace("\r\n", "\n").into()
        } else {
            text.into()
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn locate(&self, namer: &ExplicitNamer, extension: &str) -> SnapshotFiles {
        SnapshotFiles::new(namer.source_dir(), namer.name(), extension)
    }

    fn compare(&self, files: &SnapshotFiles, candidate: &str) -> Result<ComparisonResult> {
        if let Some(dir) = files.received.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ApprovalError::io(dir, e))?;
        }
        fs::write(&files.received, candidate)
            .map_err(|e| ApprovalError::io(&files.received, e))?;

        // An unapproved snapshot never passes, even when the output is empty.
        if !files.approved.exists() {
            debug!(approved = %files.approved.display(), "no approved snapshot");
            return Ok(ComparisonResult::Mismatched);
        }

        let approved = read_or_empty(&files.approved)?;
        let matched = self.normalize(&approved) == self.normalize(candidate);
        debug!(
            approved = %files.approved.display(),
            matched,
            "compared snapshot"
        );
        Ok(if matched {
            ComparisonResult::Matched
        } else {
            ComparisonResult::Mismatched
        })
    }

    fn clean_up(&self, files: &SnapshotFiles) -> Result<()> {
        match fs::remove_file(&files.received) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApprovalError::io(&files.received, e)),
        }
    }
}

/// Reads a snapshot file, treating a missing file as empty content.
pub fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(ApprovalError::io(path, e)),
    }
}

/// Maps `x.received.ext` to `x.approved.ext`. Returns `None` for other files.
pub fn approved_path_for(received: &Path) -> Option<PathBuf> {
    let file_name = received.file_name()?.to_str()?;
    let index = file_name.rfind(RECEIVED_MARKER)?;
    let approved = format!(
        "{}{}{}",
        &file_name[..index],
        APPROVED_MARKER,
        &file_name[index + RECEIVED_MARKER.len()..]
    );
    Some(received.with_file_name(approved))
}

/// All pending received files under `root`, sorted by path.
pub fn find_pending(root: &Path) -> Result<Vec<SnapshotFiles>> {
    let mut pending = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ApprovalError::io(path, std::io::Error::other(e.to_string()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(approved) = approved_path_for(entry.path()) {
            pending.push(SnapshotFiles {
                approved,
                received: entry.path().to_path_buf(),
            });
        }
    }
    Ok(pending)
}
