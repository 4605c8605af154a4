//! Explicit approval testing.
//!
//! Verifies text, JSON payloads and serializable values against approved
//! snapshot files stored next to the test source. Volatile content is scrubbed
//! before comparison, and failures are surfaced by a reporter chosen for the
//! current environment.

#![deny(unsafe_code)]

pub use crate::approver::{Approver, VerificationOutcome};
pub use crate::config::ApproverConfig;
pub use crate::errors::{ApprovalError, ContentMismatch, Result};
pub use crate::json_diff::{AlphabeticalJsonDiffFormatter, DefaultJsonDiffFormatter, JsonDiffFormatter};
pub use crate::namer::ExplicitNamer;
pub use crate::scrubbers::{
    ComposedScrubber, InlineScrubber, JsonPathScrubber, PatternRule, PatternScrubber, Scrubber,
    IGNORED_VALUE,
};

pub mod approver;
pub mod cli;
pub mod config;
pub mod environment;
pub mod errors;
pub mod inline_diff;
pub mod json_diff;
pub mod logging;
pub mod namer;
pub mod reporters;
pub mod scrubbers;
pub mod serializer;
pub mod storage;
