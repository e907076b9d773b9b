use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// The system clipboard
    #[default]
    Clipboard,
    /// Standard output
    Stdout,
    /// A file, written atomically
    File(PathBuf),
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clipboard => f.write_str("clipboard"),
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Read and write access to a clipboard.
pub trait Clipboard {
    /// Returns the current clipboard text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if the clipboard cannot be read.
    fn read(&mut self) -> Result<String>;

    /// Replaces the clipboard text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if the clipboard cannot be written.
    fn write(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. The connection is opened lazily on first use.
#[derive(Default)]
pub struct SystemClipboard {
    #[cfg(feature = "clipboard-support")]
    context: Option<::clipboard::ClipboardContext>,
}

impl SystemClipboard {
    /// Creates a handle without touching the clipboard yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

#[cfg(feature = "clipboard-support")]
impl SystemClipboard {
    fn context(&mut self) -> Result<&mut ::clipboard::ClipboardContext> {
        use ::clipboard::ClipboardProvider;

        if self.context.is_none() {
            let context = ::clipboard::ClipboardContext::new()
                .map_err(|e| Error::clipboard(e.to_string()))?;
            self.context = Some(context);
        }

        self.context
            .as_mut()
            .ok_or_else(|| Error::clipboard("clipboard unavailable"))
    }
}

#[cfg(feature = "clipboard-support")]
impl Clipboard for SystemClipboard {
    fn read(&mut self) -> Result<String> {
        use ::clipboard::ClipboardProvider;

        self.context()?
            .get_contents()
            .map_err(|e| Error::clipboard(format!("failed to read: {e}")))
    }

    fn write(&mut self, text: &str) -> Result<()> {
        use ::clipboard::ClipboardProvider;

        self.context()?
            .set_contents(text.to_string())
            .map_err(|e| Error::clipboard(format!("failed to write: {e}")))
    }
}

#[cfg(not(feature = "clipboard-support"))]
impl Clipboard for SystemClipboard {
    fn read(&mut self) -> Result<String> {
        Err(Error::clipboard("built without clipboard support; use --stdout or --output"))
    }

    fn write(&mut self, _text: &str) -> Result<()> {
        Err(Error::clipboard("built without clipboard support; use --stdout or --output"))
    }
}
