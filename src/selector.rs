use crate::{
    error::Result,
    file::{CandidateFile, classify},
    filter::{Decision, PathFilter, PatternSet},
    mime::MimeDetector,
};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

/// Counters collected during one selection call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SelectionStats {
    /// Paths offered by the lister
    pub candidates: usize,

    /// Paths rejected by include/exclude policy
    pub filtered: usize,

    /// Paths matched by force-include
    pub forced: usize,

    /// Symlinks, devices and directories
    pub not_regular: usize,

    /// Non-forced files over the size limit
    pub oversized: usize,

    /// Non-forced files classified as binary
    pub binary: usize,

    /// Paths that could not be stat'ed
    pub errors: usize,

    /// Files in the result
    pub selected: usize,
}

/// Applies pattern policy, classification and the size limit to listed paths.
pub(crate) struct Selector<'a> {
    root: PathBuf,
    max_file_size: u64,
    mime: &'a dyn MimeDetector,
}

impl<'a> Selector<'a> {
    pub(crate) fn new(
        root: impl Into<PathBuf>,
        max_file_size: u64,
        mime: &'a dyn MimeDetector,
    ) -> Self {
        Self {
            root: root.into(),
            max_file_size,
            mime,
        }
    }

    /// Selects from `candidates` according to `patterns`.
    ///
    /// The result keeps the candidates' order. Unreadable paths, non-regular
    /// files, oversized and binary files are dropped without failing the
    /// call, unless force-included.
    ///
    /// # Errors
    ///
    /// Returns an error only if a pattern does not compile.
    pub(crate) fn select(
        &self,
        candidates: &[String],
        patterns: &PatternSet,
    ) -> Result<Vec<CandidateFile>> {
        let filter = PathFilter::new(patterns)?;
        let mut stats = SelectionStats {
            candidates: candidates.len(),
            ..SelectionStats::default()
        };
        let mut selected = Vec::new();

        for path in candidates {
            if let Some(file) = self.select_one(path, &filter, &mut stats) {
                selected.push(file);
            }
        }

        stats.selected = selected.len();
        debug!(
            "Selection complete: {} candidates, {} selected ({} forced), {} filtered, {} binary, {} oversized, {} not regular, {} errors",
            stats.candidates,
            stats.selected,
            stats.forced,
            stats.filtered,
            stats.binary,
            stats.oversized,
            stats.not_regular,
            stats.errors
        );

        Ok(selected)
    }

    fn select_one(
        &self,
        path: &str,
        filter: &PathFilter,
        stats: &mut SelectionStats,
    ) -> Option<CandidateFile> {
        let forced = match filter.decide(path) {
            Decision::Dropped => {
                stats.filtered += 1;
                return None;
            }
            Decision::Forced => true,
            Decision::Included => false,
        };

        trace!("Checking {} (forced: {})", path, forced);
        let absolute = self.root.join(path);

        let metadata = match fs::symlink_metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Could not stat {}: {}", path, e);
                stats.errors += 1;
                return None;
            }
        };

        if !metadata.file_type().is_file() {
            warn!("Skipping {}: not a regular file", path);
            stats.not_regular += 1;
            return None;
        }

        let size = metadata.len();

        if forced {
            stats.forced += 1;
            return Some(CandidateFile {
                path: path.to_string(),
                size,
                is_regular: true,
                forced: true,
                is_text: true,
            });
        }

        if size > self.max_file_size {
            info!(
                "Skipping large file: {} ({} bytes > {} bytes)",
                path, size, self.max_file_size
            );
            stats.oversized += 1;
            return None;
        }

        if !classify(&absolute, self.mime) {
            debug!("Skipping binary file: {}", path);
            stats.binary += 1;
            return None;
        }

        Some(CandidateFile {
            path: path.to_string(),
            size,
            is_regular: true,
            forced: false,
            is_text: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::path::Path;

    struct NoMime;

    impl MimeDetector for NoMime {
        fn detect(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn paths(files: &[CandidateFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    fn fixture() -> assert_fs::TempDir {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.go").write_str("package main\n").unwrap();
        temp.child("pkg/legacy/b.go").write_str("package legacy\n").unwrap();
        temp.child("README.md").write_str("# readme\n").unwrap();
        temp.child("binary.bin").write_binary(&[0x7f, b'E', 0, 1, 2]).unwrap();
        temp.child("big.txt").write_str(&"x".repeat(64)).unwrap();
        temp
    }

    #[test]
    fn test_include_and_exclude_scenario() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 1024, &NoMime);
        let set = PatternSet::new()
            .include(strings(&["*.go"]))
            .exclude(strings(&["pkg/legacy/*.go"]));

        let files = selector
            .select(&strings(&["README.md", "a.go", "pkg/legacy/b.go"]), &set)
            .unwrap();

        assert_eq!(paths(&files), vec!["a.go"]);
        assert!(!files[0].forced);
        assert!(files[0].is_text);
    }

    #[test]
    fn test_forced_binary_is_text() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 1024, &NoMime);
        let set = PatternSet::new().force_include(strings(&["binary.bin"]));

        let files = selector
            .select(&strings(&["a.go", "binary.bin"]), &set)
            .unwrap();

        assert_eq!(paths(&files), vec!["binary.bin"]);
        assert!(files[0].forced);
        assert!(files[0].is_text);
        assert_eq!(files[0].size, 5);
    }

    #[test]
    fn test_default_drops_binary_and_oversized() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 32, &NoMime);
        let all = strings(&["README.md", "a.go", "big.txt", "binary.bin", "pkg/legacy/b.go"]);

        let files = selector.select(&all, &PatternSet::new()).unwrap();

        assert_eq!(paths(&files), vec!["README.md", "a.go", "pkg/legacy/b.go"]);
    }

    #[test]
    fn test_force_bypasses_size_and_exclude() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 32, &NoMime);
        let set = PatternSet::new()
            .exclude(strings(&["big.txt"]))
            .force_include(strings(&["big.txt"]));

        let files = selector.select(&strings(&["big.txt"]), &set).unwrap();
        assert_eq!(paths(&files), vec!["big.txt"]);
        assert!(files[0].forced);
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 1024, &NoMime);

        let files = selector
            .select(&strings(&["a.go", "deleted.go"]), &PatternSet::new())
            .unwrap();

        assert_eq!(paths(&files), vec!["a.go"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_not_regular() {
        let temp = fixture();
        std::os::unix::fs::symlink(temp.path().join("a.go"), temp.path().join("link.go")).unwrap();
        let selector = Selector::new(temp.path(), 1024, &NoMime);
        let set = PatternSet::new().force_include(strings(&["link.go"]));

        let files = selector.select(&strings(&["link.go"]), &set).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 1024, &NoMime);
        let all = strings(&["README.md", "a.go", "big.txt", "binary.bin", "pkg/legacy/b.go"]);
        let set = PatternSet::new().include(strings(&["**/*.go", "*.md"]));

        let first = selector.select(&all, &set).unwrap();
        let second = selector.select(&all, &set).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let temp = fixture();
        let selector = Selector::new(temp.path(), 1024, &NoMime);
        let set = PatternSet::new().include(strings(&["[bad"]));

        assert!(selector.select(&strings(&["a.go"]), &set).is_err());
    }
}
