//! Snapshot naming.
//!
//! A snapshot is identified by the directory of the test source file plus a
//! name built from the test file and method, optionally qualified by a test
//! case and a scenario. [`SnapshotTracker`] enforces that one approver never
//! verifies the same name twice.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{ApprovalError, Result};

/// Location and name of one snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplicitNamer {
    source_dir: PathBuf,
    name: String,
}

impl ExplicitNamer {
    pub fn new(source_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            name: name.into(),
        }
    }

    /// Builds `{file stem}.{method}` for a test defined in `test_file`.
    pub fn for_test(test_file: &Path, test_method: &str) -> Self {
        let class_name = test_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_dir = test_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(source_dir, format!("{}.{}", class_name, test_method))
    }

    /// Qualifies the name with a test case. Blank test cases are ignored.
    pub fn with_test_case(self, test_case: &str) -> Self {
        let test_case = test_case.trim();
        if test_case.is_empty() {
            return self;
        }
        Self {
            name: format!("{}.{}", self.name, test_case),
            ..self
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namer for a named scenario within the same test.
    pub fn for_scenario(&self, scenario: &str) -> Self {
        Self {
            source_dir: self.source_dir.clone(),
            name: format!(
                "{}.ForScenario.{}",
                self.name,
                normalize_scenario_name(scenario)
            ),
        }
    }
}

/// Makes a scenario title usable as a file name fragment.
pub fn normalize_scenario_name(scenario: &str) -> String {
    scenario.replace([' ', '\\', '/'], "_")
}

/// Names already verified by one approver.
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    seen: HashSet<String>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `namer`, failing if its name was recorded before.
    pub fn register(&mut self, namer: &ExplicitNamer) -> Result<()> {
        if self.seen.insert(namer.name().to_string()) {
            Ok(())
        } else {
            Err(ApprovalError::SnapshotOverridden {
                name: namer.name().to_string(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
