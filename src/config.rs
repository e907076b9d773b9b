use crate::error::{Error, Result};
use std::path::PathBuf;

/// Largest non-forced file eligible for inclusion, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// How the final document is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Fixed scaffold: introduction, project tree, files, then questions
    #[default]
    Default,
    /// Only the content items, in the order they were given
    Raw,
}

impl RenderMode {
    /// Name used in logs and templates.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Raw => "raw",
        }
    }
}

/// Settings for selecting files and rendering a prompt.
///
/// Use [`GeneratorConfig::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GeneratorConfig {
    /// Project root; listed paths are relative to it
    pub root_dir: PathBuf,

    /// Document layout
    pub mode: RenderMode,

    /// Size limit for non-forced files
    pub max_file_size: u64,

    /// Preamble placed before the introduction (default mode only)
    pub role_message: Option<String>,

    /// Text placed after the file section (default mode only)
    pub extra_context: Option<String>,

    /// Text placed after the questions (default mode only)
    pub closing_text: Option<String>,

    /// Whether default mode shows the project structure
    pub include_tree: bool,

    /// Suppress the run summary
    pub quiet: bool,
}

impl GeneratorConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use project_prompt::{GeneratorConfig, RenderMode};
    ///
    /// let config = GeneratorConfig::builder()
    ///     .root_dir(".")
    ///     .mode(RenderMode::Raw)
    ///     .max_file_size(64 * 1024)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - The size limit is zero
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.max_file_size == 0 {
            return Err(Error::config("max file size must be greater than 0"));
        }

        Ok(())
    }

    fn has_scaffold_text(&self) -> bool {
        self.role_message.is_some() || self.extra_context.is_some() || self.closing_text.is_some()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            mode: RenderMode::Default,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            role_message: None,
            extra_context: None,
            closing_text: None,
            include_tree: true,
            quiet: false,
        }
    }
}

/// Builder for creating a [`GeneratorConfig`].
#[derive(Debug, Default)]
pub struct GeneratorConfigBuilder {
    root_dir: Option<PathBuf>,
    mode: Option<RenderMode>,
    max_file_size: Option<u64>,
    role_message: Option<String>,
    extra_context: Option<String>,
    closing_text: Option<String>,
    include_tree: Option<bool>,
    quiet: bool,
}

impl GeneratorConfigBuilder {
    /// Sets the project root.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Sets the render mode.
    #[must_use]
    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the size limit for non-forced files.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Sets the role preamble.
    #[must_use]
    pub fn role_message(mut self, text: Option<String>) -> Self {
        self.role_message = text;
        self
    }

    /// Sets the extra context block.
    #[must_use]
    pub fn extra_context(mut self, text: Option<String>) -> Self {
        self.extra_context = text;
        self
    }

    /// Sets the closing text.
    #[must_use]
    pub fn closing_text(mut self, text: Option<String>) -> Self {
        self.closing_text = text;
        self
    }

    /// Enables or disables the project structure section.
    #[must_use]
    pub fn include_tree(mut self, enabled: bool) -> Self {
        self.include_tree = Some(enabled);
        self
    }

    /// Enables quiet mode.
    #[must_use]
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// Empty role, extra-context and closing strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<GeneratorConfig> {
        let config = GeneratorConfig {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            mode: self.mode.unwrap_or_default(),
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            role_message: non_empty(self.role_message),
            extra_context: non_empty(self.extra_context),
            closing_text: non_empty(self.closing_text),
            include_tree: self.include_tree.unwrap_or(true),
            quiet: self.quiet,
        };

        config.validate()?;

        if config.mode == RenderMode::Raw && config.has_scaffold_text() {
            tracing::warn!(
                "--role-message, --extra-context and --last-words are ignored in raw mode"
            );
        }

        Ok(config)
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}
