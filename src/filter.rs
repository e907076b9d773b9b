//! Include, exclude and force-include pattern policy.
//!
//! A [`PatternSet`] carries the three pattern roles as the user wrote them;
//! [`PathFilter`] is its compiled form and decides, path by path, whether a
//! candidate is forced in, included, or dropped. Force-include always wins:
//! it overrides exclude here and classification and size limits later in
//! the selector.

use crate::error::Result;
use crate::glob::{PathPattern, normalize};

/// Pattern roles used by a single selection call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    /// Patterns a non-forced path must match when non-empty
    pub include: Vec<String>,

    /// Patterns that drop non-forced paths
    pub exclude: Vec<String>,

    /// Patterns that always include, even ignored, binary or oversized files
    pub force_include: Vec<String>,
}

impl PatternSet {
    /// Creates an empty set, which selects every listed file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the include patterns.
    #[must_use]
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Sets the exclude patterns.
    #[must_use]
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Sets the force-include patterns.
    #[must_use]
    pub fn force_include(mut self, patterns: Vec<String>) -> Self {
        self.force_include = patterns;
        self
    }

    /// Normally ignored files are only listed when something may force them in.
    #[must_use]
    pub fn needs_ignored(&self) -> bool {
        !self.force_include.is_empty()
    }

    /// True when the user named any include or force-include pattern.
    #[must_use]
    pub fn has_explicit_patterns(&self) -> bool {
        !self.include.is_empty() || !self.force_include.is_empty()
    }

    /// Include and force-include patterns, for diagnostics.
    #[must_use]
    pub fn explicit_patterns(&self) -> Vec<String> {
        self.include
            .iter()
            .chain(&self.force_include)
            .cloned()
            .collect()
    }
}

/// Outcome of matching one path against a [`PatternSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Matched a force-include pattern
    Forced,
    /// Passed include and exclude; still subject to classification and size
    Included,
    /// Rejected by the pattern policy
    Dropped,
}

#[derive(Debug, Clone)]
struct ExcludeRule {
    pattern: PathPattern,
    /// Normalized text with any trailing `/` removed, for the directory shortcut
    prefix: String,
}

impl ExcludeRule {
    fn new(source: &str) -> Result<Self> {
        let prefix = normalize(source).trim_end_matches('/').to_string();
        Ok(Self {
            pattern: PathPattern::new(source)?,
            prefix,
        })
    }

    /// Exact path, glob match, or anything below the pattern taken as a directory.
    fn excludes(&self, path: &str) -> bool {
        if path == self.prefix || self.pattern.matches(path) {
            return true;
        }

        !self.prefix.is_empty()
            && path.len() > self.prefix.len()
            && path.starts_with(&self.prefix)
            && path.as_bytes()[self.prefix.len()] == b'/'
    }
}

/// Compiled form of a [`PatternSet`].
#[derive(Debug, Clone)]
pub(crate) struct PathFilter {
    include: Vec<PathPattern>,
    exclude: Vec<ExcludeRule>,
    force_include: Vec<PathPattern>,
}

impl PathFilter {
    /// Compiles every pattern in `set`.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob.
    pub(crate) fn new(set: &PatternSet) -> Result<Self> {
        Ok(Self {
            include: Self::compile(&set.include)?,
            exclude: set
                .exclude
                .iter()
                .map(|p| ExcludeRule::new(p))
                .collect::<Result<_>>()?,
            force_include: Self::compile(&set.force_include)?,
        })
    }

    fn compile(patterns: &[String]) -> Result<Vec<PathPattern>> {
        patterns.iter().map(|p| PathPattern::new(p)).collect()
    }

    pub(crate) fn decide(&self, path: &str) -> Decision {
        let path = normalize(path);

        if self.force_include.iter().any(|p| p.matches(path)) {
            return Decision::Forced;
        }

        let wanted = if self.include.is_empty() {
            // a force-only selection suppresses the include-everything default
            self.force_include.is_empty()
        } else {
            self.include.iter().any(|p| p.matches(path))
        };

        if !wanted || self.exclude.iter().any(|rule| rule.excludes(path)) {
            return Decision::Dropped;
        }

        Decision::Included
    }
}
