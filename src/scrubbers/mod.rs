//! # Scrubbers
//!
//! Scrubbers rewrite a candidate snapshot before it is compared, masking values
//! that change from run to run (timestamps, identifiers, machine names).
//!
//! - [`ComposedScrubber`] chains scrubbers, each one receiving the output of the previous.
//! - [`InlineScrubber`] wraps a plain closure.
//! - [`PatternScrubber`] replaces regex matches with stable numbered placeholders.
//! - [`JsonPathScrubber`] masks values selected by JSON paths.

use std::sync::Arc;

use crate::errors::Result;

mod json_path;
mod pattern;

pub use json_path::{JsonPathScrubber, IGNORED_VALUE};
pub use pattern::{PatternRule, PatternScrubber};

/// A deterministic text transformation applied before comparison.
pub trait Scrubber: Send + Sync {
    fn scrub(&self, input: &str) -> Result<String>;
}

impl<S: Scrubber + ?Sized> Scrubber for Arc<S> {
    fn scrub(&self, input: &str) -> Result<String> {
        (**self).scrub(input)
    }
}

impl<S: Scrubber + ?Sized> Scrubber for &S {
    fn scrub(&self, input: &str) -> Result<String> {
        (**self).scrub(input)
    }
}

/// Applies scrubbers in order. Absent scrubbers are skipped.
#[derive(Default)]
pub struct ComposedScrubber<'a> {
    scrubbers: Vec<&'a dyn Scrubber>,
}

impl<'a> ComposedScrubber<'a> {
    pub fn new<I>(scrubbers: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a dyn Scrubber>>,
    {
        Self {
            scrubbers: scrubbers.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.scrubbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrubbers.is_empty()
    }
}

impl Scrubber for ComposedScrubber<'_> {
    fn scrub(&self, input: &str) -> Result<String> {
        self.scrubbers
            .iter()
            .try_fold(input.to_string(), |current, scrubber| scrubber.scrub(&current))
    }
}

/// Adapts a closure into a [`Scrubber`].
pub struct InlineScrubber<F> {
    scrubber: F,
}

impl<F> InlineScrubber<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(scrubber: F) -> Self {
        Self { scrubber }
    }
}

impl<F> Scrubber for InlineScrubber<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn scrub(&self, input: &str) -> Result<String> {
        Ok((self.scrubber)(input))
    }
}
