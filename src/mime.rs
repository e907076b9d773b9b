use crate::process;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Best-effort MIME type lookup for files the extension table does not know.
pub trait MimeDetector {
    /// Returns the detected MIME type, or `None` when no information is available.
    fn detect(&self, path: &Path) -> Option<String>;
}

/// Asks `file -b --mime-type` about each path.
///
/// Whether `file` is installed is checked once per instance. When it is
/// missing, every lookup returns `None` and classification falls back to
/// content sniffing.
#[derive(Debug)]
pub struct FileCommand {
    dir: PathBuf,
    available: OnceCell<bool>,
}

impl FileCommand {
    /// Creates a detector that runs `file` from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            available: OnceCell::new(),
        }
    }

    /// Returns true if the `file` program can be started.
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let found = process::is_available("file");
            if !found {
                debug!("'file' command not found, using content sniffing for unknown types");
            }
            found
        })
    }
}

impl MimeDetector for FileCommand {
    fn detect(&self, path: &Path) -> Option<String> {
        if !self.is_available() {
            return None;
        }

        match process::run("file", [Path::new("-b"), Path::new("--mime-type"), path], &self.dir) {
            Ok(stdout) => {
                let mime = String::from_utf8_lossy(&stdout).trim().to_string();
                (!mime.is_empty()).then_some(mime)
            }
            Err(e) => {
                debug!("MIME detection failed for {}: {}", path.display(), e);
                None
            }
        }
    }
}
