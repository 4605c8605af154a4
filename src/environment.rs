//! # Host Environment
//!
//! Reporters need to know a few things about the machine running the tests:
//! environment variables, which editor or IDE launched the test process, and
//! whether a debugger is attached. [`HostEnvironment`] answers these questions so
//! the reporters can be tested against a fake host.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::errors::{ApprovalError, Result};

/// Environment variables that mark a continuous-integration build.
pub const BUILD_SERVER_VARIABLES: &[&str] = &[
    "CI",
    "TF_BUILD",
    "TEAMCITY_VERSION",
    "APPVEYOR",
    "JENKINS_URL",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "BUILDKITE",
];

/// Opt-in flag for the context-aware diff tool reporter.
pub const CONTEXT_AWARE_FLAG: &str = "DiffEngine_UseContextAwareReporter";

pub trait HostEnvironment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Names of the current process and its ancestors, nearest first.
    fn process_names(&self) -> Vec<String>;

    fn is_debugger_attached(&self) -> bool;

    fn break_into_debugger(&self);
}

/// True when any build-server variable is set to a non-empty value.
pub fn is_build_server(env: &dyn HostEnvironment) -> bool {
    BUILD_SERVER_VARIABLES
        .iter()
        .any(|key| env.var(key).is_some_and(|value| !value.trim().is_empty()))
}

/// True when the context-aware reporter flag is set to `true`.
pub fn context_aware_enabled(env: &dyn HostEnvironment) -> bool {
    env.var(CONTEXT_AWARE_FLAG)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Editors and IDEs the context-aware reporter knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    VsCode,
    RustRover,
    Rider,
    VisualStudio,
    Zed,
    Unknown,
}

impl HostKind {
    pub fn from_process_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        let name = name.strip_suffix(".exe").unwrap_or(&name);
        match name {
            "code" | "code-insiders" | "codium" => HostKind::VsCode,
            "rustrover" | "rustrover64" => HostKind::RustRover,
            "rider" | "rider64" => HostKind::Rider,
            "devenv" => HostKind::VisualStudio,
            "zed" | "zed-editor" => HostKind::Zed,
            _ => HostKind::Unknown,
        }
    }

    /// First known host among the process ancestry.
    pub fn detect(env: &dyn HostEnvironment) -> Self {
        env.process_names()
            .iter()
            .map(|name| HostKind::from_process_name(name))
            .find(|kind| *kind != HostKind::Unknown)
            .unwrap_or(HostKind::Unknown)
    }

    pub fn diff_tool(self) -> Option<DiffTool> {
        let (program, args): (&str, &[&str]) = match self {
            HostKind::VsCode => ("code", &["--diff"]),
            HostKind::RustRover => ("rustrover", &["diff"]),
            HostKind::Rider => ("rider", &["diff"]),
            HostKind::VisualStudio => ("devenv", &["/diff"]),
            HostKind::Zed => ("zed", &["--diff"]),
            HostKind::Unknown => return None,
        };
        Some(DiffTool {
            program: program.to_string(),
            leading_args: args.iter().map(|a| a.to_string()).collect(),
        })
    }
}

/// A diff tool command line: `program [leading_args..] received approved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTool {
    pub program: String,
    pub leading_args: Vec<String>,
}

impl DiffTool {
    pub fn args_for(&self, received: &Path, approved: &Path) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(received.display().to_string());
        args.push(approved.display().to_string());
        args
    }
}

/// Starts diff tools.
pub trait DiffToolLauncher: Send + Sync {
    fn launch(&self, tool: &DiffTool, received: &Path, approved: &Path) -> Result<()>;
}

/// Spawns the tool as a detached child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl DiffToolLauncher for ProcessLauncher {
    fn launch(&self, tool: &DiffTool, received: &Path, approved: &Path) -> Result<()> {
        let args = tool.args_for(received, approved);
        debug!(program = %tool.program, ?args, "launching diff tool");
        Command::new(&tool.program)
            .args(&args)
            .spawn()
            .map(|_| ())
            .map_err(|source| ApprovalError::DiffToolLaunch {
                program: tool.program.clone(),
                source,
            })
    }
}

/// The real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEnvironment;

impl HostEnvironment for NativeEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn process_names(&self) -> Vec<String> {
        native::process_names()
    }

    fn is_debugger_attached(&self) -> bool {
        native::is_debugger_attached()
    }

    fn break_into_debugger(&self) {
        native::break_into_debugger()
    }
}

#[cfg(target_os = "linux")]
mod native {
    use std::fs;

    const MAX_ANCESTORS: usize = 64;

    /// Walks `/proc/{pid}/stat` up the parent chain.
    pub fn process_names() -> Vec<String> {
        let mut names = Vec::new();
        let mut pid = std::process::id();
        for _ in 0..MAX_ANCESTORS {
            let Some((name, parent)) = read_stat(pid) else {
                break;
            };
            names.push(name);
            if parent <= 1 || parent == pid {
                break;
            }
            pid = parent;
        }
        names
    }

    fn read_stat(pid: u32) -> Option<(String, u32)> {
        let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
        parse_stat(&stat)
    }

    /// Parses `pid (comm) state ppid ...`. `comm` may itself contain spaces or parens.
    pub(super) fn parse_stat(stat: &str) -> Option<(String, u32)> {
        let open = stat.find('(')?;
        let close = stat.rfind(')')?;
        let name = stat.get(open + 1..close)?.to_string();
        let mut rest = stat.get(close + 1..)?.split_whitespace();
        let _state = rest.next()?;
        let parent = rest.next()?.parse().ok()?;
        Some((name, parent))
    }

    pub fn is_debugger_attached() -> bool {
        fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| {
                status
                    .lines()
                    .find_map(|line| line.strip_prefix("TracerPid:"))
                    .and_then(|pid| pid.trim().parse::<u32>().ok())
            })
            .is_some_and(|pid| pid != 0)
    }

    pub fn break_into_debugger() {
        if is_debugger_attached() {
            super::trap()
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod native {
    pub fn process_names() -> Vec<String> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .into_iter()
            .collect()
    }

    pub fn is_debugger_attached() -> bool {
        false
    }

    pub fn break_into_debugger() {}
}

/// Raises a breakpoint trap for the attached tracer.
///
/// The only unsafe code in the crate. Callers must check that a tracer is
/// attached first, since an untraced `SIGTRAP` terminates the process.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
fn trap() {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    // SAFETY: `int3` touches no memory or registers; the tracer resumes after it.
    unsafe {
        std::arch::asm!("int3", options(nomem, nostack));
    };
    #[cfg(target_arch = "aarch64")]
    // SAFETY: as above, `brk` only signals the tracer.
    unsafe {
        std::arch::asm!("brk #0xf000", options(nomem, nostack));
    };
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::HostEnvironment;

    #[derive(Debug, Default)]
    pub struct FakeEnvironment {
        pub vars: HashMap<String, String>,
        pub processes: Vec<String>,
        pub debugger: bool,
        pub breaks: AtomicUsize,
    }

    impl FakeEnvironment {
        pub fn with_var(mut self, key: &str, value: &str) -> Self {
            self.vars.insert(key.to_string(), value.to_string());
            self
        }

        pub fn with_processes(mut self, names: &[&str]) -> Self {
            self.processes = names.iter().map(|n| n.to_string()).collect();
            self
        }
    }

    impl HostEnvironment for FakeEnvironment {
        fn var(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }

        fn process_names(&self) -> Vec<String> {
            self.processes.clone()
        }

        fn is_debugger_attached(&self) -> bool {
            self.debugger
        }

        fn break_into_debugger(&self) {
            self.breaks.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeEnvironment;
    use super::*;

    #[test]
    fn test_build_server_detection() {
        assert!(!is_build_server(&FakeEnvironment::default()));
        assert!(is_build_server(&FakeEnvironment::default().with_var("GITHUB_ACTIONS", "true")));
        assert!(!is_build_server(&FakeEnvironment::default().with_var("CI", " ")));
    }

    #[test]
    fn test_context_aware_flag() {
        let on = FakeEnvironment::default().with_var(CONTEXT_AWARE_FLAG, "True");
        let off = FakeEnvironment::default().with_var(CONTEXT_AWARE_FLAG, "1");
        assert!(context_aware_enabled(&on));
        assert!(!context_aware_enabled(&off));
    }

    #[test]
    fn test_host_kind_from_process_name() {
        assert_eq!(HostKind::from_process_name("Code.exe"), HostKind::VsCode);
        assert_eq!(HostKind::from_process_name("rustrover64"), HostKind::RustRover);
        assert_eq!(HostKind::from_process_name("devenv"), HostKind::VisualStudio);
        assert_eq!(HostKind::from_process_name("zed-editor"), HostKind::Zed);
        assert_eq!(HostKind::from_process_name("bash"), HostKind::Unknown);
    }

    #[test]
    fn test_detect_uses_nearest_known_ancestor() {
        let env = FakeEnvironment::default().with_processes(&["approver_tests", "cargo", "rider64", "code"]);
        assert_eq!(HostKind::detect(&env), HostKind::Rider);
        let none = FakeEnvironment::default().with_processes(&["cargo", "bash"]);
        assert_eq!(HostKind::detect(&none), HostKind::Unknown);
    }

    #[test]
    fn test_diff_tool_arguments() {
        let tool = HostKind::VsCode.diff_tool().unwrap();
        assert_eq!(
            tool.args_for(Path::new("a.received.txt"), Path::new("a.approved.txt")),
            vec!["--diff", "a.received.txt", "a.approved.txt"]
        );
        assert!(HostKind::Unknown.diff_tool().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_parse_stat_handles_parens_in_name() {
        assert_eq!(
            native::parse_stat("42 (my (odd) proc) S 7 42 42 0"),
            Some(("my (odd) proc".to_string(), 7))
        );
        assert_eq!(native::parse_stat("garbage"), None);
    }

    #[test]
    fn test_unsafe_code_is_confined_to_trap() {
        let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        let lib = std::fs::read_to_string(src.join("lib.rs")).unwrap();
        assert!(lib.contains("#![deny(unsafe_code)]"));

        let mut allowed = Vec::new();
        for entry in walkdir::WalkDir::new(&src) {
            let entry = entry.unwrap();
            if entry.path().extension().is_some_and(|ext| ext == "rs") {
                let text = std::fs::read_to_string(entry.path()).unwrap();
                let marker = concat!("#[allow(", "unsafe_code)]");
                allowed.extend(text.matches(marker).map(|_| entry.path().to_path_buf()));
            }
        }
        assert_eq!(allowed, vec![src.join("environment.rs")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_break_without_tracer_is_a_no_op() {
        if !native::is_debugger_attached() {
            NativeEnvironment.break_into_debugger();
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_native_process_names_start_with_current_process() {
        assert!(!NativeEnvironment.process_names().is_empty());
    }
}
