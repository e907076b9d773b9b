use crate::error::{Error, Result};
use crate::process;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing::debug;

/// Directories pruned from the structure view.
const TREE_IGNORE: &str = ".git|node_modules|vendor|dist|build";

/// Produces the human-readable project structure shown in default mode.
pub trait TreeRenderer {
    /// Renders the structure as opaque text.
    ///
    /// # Errors
    ///
    /// Returns an error if the renderer is unavailable or fails; callers
    /// degrade to a placeholder line.
    fn render(&self) -> Result<String>;
}

/// Runs `tree -I '.git|node_modules|vendor|dist|build'`.
///
/// Whether `tree` is installed is checked on the first render only, so runs
/// that never show the structure never start it.
#[derive(Debug)]
pub struct TreeCommand {
    root: PathBuf,
    available: OnceCell<bool>,
}

impl TreeCommand {
    /// Creates a renderer for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            available: OnceCell::new(),
        }
    }

    /// Returns true if the `tree` program can be started.
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let found = process::is_available("tree");
            if !found {
                debug!(
                    "'tree' command not found, the project structure section will show an error notice"
                );
            }
            found
        })
    }
}

impl TreeRenderer for TreeCommand {
    fn render(&self) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ToolMissing {
                tool: "tree".to_string(),
            });
        }

        let stdout = process::run("tree", ["-I", TREE_IGNORE], &self.root)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_is_checked_on_first_use() {
        let temp = assert_fs::TempDir::new().unwrap();
        let tree = TreeCommand::new(temp.path());
        assert!(tree.available.get().is_none());

        let first = tree.is_available();
        assert_eq!(tree.available.get(), Some(&first));
        assert_eq!(tree.is_available(), first);
    }

    #[test]
    fn test_render_without_tree_is_tool_missing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let tree = TreeCommand::new(temp.path());
        tree.available.set(false).unwrap();

        let err = tree.render().unwrap_err();
        assert!(matches!(err, Error::ToolMissing { ref tool } if tool == "tree"));
    }
}
