//! Path pattern matching with recursive `**` segments.
//!
//! Patterns are split on `/`. Ordinary segments are matched as filename
//! globs (a `*` never crosses a directory boundary); a `**` segment stands
//! for zero or more whole directories and is tried against every rightward
//! sub-path of the remainder. Matching works on plain slash-separated path
//! strings and never touches the filesystem.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};

const RECURSIVE: &str = "**";

#[derive(Debug, Clone)]
enum Segment {
    /// Zero or more directories.
    AnyDepth,
    /// Exact segment text, compared without glob machinery.
    Literal(String),
    /// A single-segment filename glob.
    Glob(GlobMatcher),
}

impl Segment {
    fn matches(&self, part: &str) -> bool {
        match self {
            Self::AnyDepth => true,
            Self::Literal(text) => text == part,
            Self::Glob(matcher) => matcher.is_match(part),
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compiles a pattern such as `src/**/*.go` or `docs/*.md`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if a segment is not a valid glob.
    pub fn new(source: &str) -> Result<Self> {
        let normalized = normalize(source);
        let mut segments = Vec::new();

        for part in normalized.split('/') {
            if part == RECURSIVE {
                // `a/**/**/b` is the same as `a/**/b`
                if !matches!(segments.last(), Some(Segment::AnyDepth)) {
                    segments.push(Segment::AnyDepth);
                }
                continue;
            }

            if let Some(rest) = part.strip_prefix(RECURSIVE) {
                // `**.js` reads as `**/*.js`
                if !matches!(segments.last(), Some(Segment::AnyDepth)) {
                    segments.push(Segment::AnyDepth);
                }
                let tail = format!("*{}", rest.trim_start_matches('*'));
                segments.push(Self::compile_segment(source, &tail)?);
                continue;
            }

            let collapsed = part.replace(RECURSIVE, "*");
            segments.push(Self::compile_segment(source, &collapsed)?);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn compile_segment(source: &str, part: &str) -> Result<Segment> {
        if !has_glob_meta(part) {
            return Ok(Segment::Literal(part.to_string()));
        }

        let glob = GlobBuilder::new(part)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| Error::invalid_pattern(source, e.kind().to_string()))?;

        Ok(Segment::Glob(glob.compile_matcher()))
    }

    /// The pattern exactly as the user wrote it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `path` (relative, slash-separated) matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let normalized = normalize(path);
        let parts: Vec<&str> = normalized.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

/// Matches `segments` against `parts`, expanding `**` over every suffix.
fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return parts.is_empty();
    };

    if matches!(first, Segment::AnyDepth) {
        return (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]));
    }

    match parts.split_first() {
        Some((head, tail)) => first.matches(head) && match_segments(rest, tail),
        None => false,
    }
}

fn has_glob_meta(part: &str) -> bool {
    part.contains(['*', '?', '[', '{', '\\'])
}

/// Strips a leading `./` so `./src/a.rs` and `src/a.rs` are the same path.
pub(crate) fn normalize(path: &str) -> &str {
    let mut trimmed = path;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed
}
