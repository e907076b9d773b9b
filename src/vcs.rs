use crate::error::{Error, Result};
use crate::process;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Source of candidate paths for selection.
pub trait FileLister {
    /// Fails unless the root is inside a version-controlled work tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWorkTree`] or [`Error::ToolMissing`].
    fn ensure_work_tree(&self) -> Result<()>;

    /// Lists tracked and untracked-but-not-ignored paths, sorted and
    /// de-duplicated. With `include_ignored` the normally ignored paths are
    /// merged in as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing tool fails.
    fn list(&self, include_ignored: bool) -> Result<Vec<String>>;
}

/// Lists files through `git ls-files`.
#[derive(Debug, Clone)]
pub struct GitLister {
    root: PathBuf,
}

impl GitLister {
    /// Creates a lister rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ls_files(&self, args: &[&str]) -> Result<Vec<String>> {
        let stdout = process::run("git", args, &self.root)?;
        Ok(split_nul(&stdout))
    }
}

impl FileLister for GitLister {
    fn ensure_work_tree(&self) -> Result<()> {
        match process::run("git", ["rev-parse", "--is-inside-work-tree"], &self.root) {
            Ok(stdout) if String::from_utf8_lossy(&stdout).trim() == "true" => Ok(()),
            Ok(_) => Err(Error::NotWorkTree {
                message: format!("{} is not inside a git work tree", self.root.display()),
            }),
            Err(Error::Command { message, .. }) => Err(Error::NotWorkTree { message }),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    fn list(&self, include_ignored: bool) -> Result<Vec<String>> {
        let mut paths = self.ls_files(&["ls-files", "-z", "-c", "-o", "--exclude-standard"])?;
        debug!("git reported {} tracked or untracked paths", paths.len());

        if include_ignored {
            let ignored = self.ls_files(&["ls-files", "-z", "-o", "-i", "--exclude-standard"])?;
            debug!("git reported {} ignored paths", ignored.len());
            paths.extend(ignored);
        }

        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

/// Splits NUL-terminated `git -z` output into paths.
fn split_nul(stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nul() {
        let raw = b"a.go\0pkg/legacy/b.go\0README.md\0";
        assert_eq!(split_nul(raw), vec!["a.go", "pkg/legacy/b.go", "README.md"]);
    }

    #[test]
    fn test_split_nul_keeps_spaces_and_newlines() {
        let raw = b"with space.txt\0line\nbreak.txt\0";
        assert_eq!(split_nul(raw), vec!["with space.txt", "line\nbreak.txt"]);
    }

    #[test]
    fn test_split_nul_empty() {
        assert!(split_nul(b"").is_empty());
    }

    #[test]
    fn test_plain_directory_is_not_work_tree() {
        let temp = assert_fs::TempDir::new().unwrap();
        let lister = GitLister::new(temp.path());

        // fails with NotWorkTree when git is installed, ToolMissing otherwise;
        // a temp dir nested inside some outer repository is the exception
        if let Err(err) = lister.ensure_work_tree() {
            assert!(matches!(
                err,
                Error::NotWorkTree { .. } | Error::ToolMissing { .. }
            ));
        }
    }
}
