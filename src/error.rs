use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Every fatal condition the prompt pipeline can report.
///
/// Non-fatal conditions (unreadable candidates, missing optional tools,
/// malformed alias lines) never become an `Error`; they are logged and the
/// run continues.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The working directory is not inside a git work tree.
    #[error("{message}\nThis tool uses 'git ls-files' to list files and respect .gitignore")]
    NotWorkTree {
        /// Diagnostic captured from git
        message: String,
    },

    /// A required external program could not be started.
    #[error("required command not found: {tool}\nPlease install it to use this tool")]
    ToolMissing {
        /// Program name
        tool: String,
    },

    /// An external program ran but reported failure.
    #[error("failed to run {command}: {message}")]
    Command {
        /// Command line that failed
        command: String,
        /// Captured stderr, or the exit status when stderr was empty
        message: String,
    },

    /// An `-a` invocation named an alias that no configuration file defines.
    #[error("alias '{name}' not found")]
    AliasNotFound {
        /// The requested alias name
        name: String,
    },

    /// A flag that takes a value was not followed by one.
    #[error("flag {flag} requires a value")]
    MissingValue {
        /// The flag as written on the command line
        flag: String,
    },

    /// A token looked like a flag but is not part of the CLI surface.
    #[error("unknown flag: {flag} (use -h for help)")]
    UnknownFlag {
        /// The flag as written on the command line
        flag: String,
    },

    /// A flag value could not be interpreted.
    #[error("invalid value '{value}' for {flag}: {reason}")]
    InvalidValue {
        /// The flag as written on the command line
        flag: String,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// `--stdout` and `--output` were both requested.
    #[error("cannot use both --stdout and --output options at the same time")]
    ConflictingSinks,

    /// The system clipboard could not be read or written.
    #[error("clipboard error: {message}")]
    Clipboard {
        /// Error message
        message: String,
    },

    /// A question source produced no usable text.
    #[error("{source_name} is empty; please provide a question")]
    EmptyQuestion {
        /// Human-readable name of the source (a file path or "clipboard")
        source_name: String,
    },

    /// Selection found nothing and no include or force-include patterns were given.
    #[error("no files found in the Git repository. Make sure you have committed or staged some files")]
    NoFilesInRepository,

    /// Selection found nothing for the given patterns.
    #[error("no files matched the specified patterns: [{}]\nTry using different patterns or check if the files exist", .patterns.join(", "))]
    NoMatches {
        /// The include and force-include patterns that were tried
        patterns: Vec<String>,
    },

    /// Assembly emitted zero file blocks.
    #[error("no files were included in the prompt. All matched files were either binary, too large, or couldn't be read")]
    NothingIncluded,

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid glob pattern.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }

        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a clipboard error.
    #[must_use]
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }

    /// Creates a command failure error.
    #[must_use]
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_no_matches_lists_patterns() {
        let err = Error::NoMatches {
            patterns: vec!["*.go".to_string(), "assets/*.bin".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("[*.go, assets/*.bin]"));
    }

    #[test]
    fn test_empty_repository_message_differs_from_no_matches() {
        let repo = Error::NoFilesInRepository.to_string();
        let matches = Error::NoMatches { patterns: vec![] }.to_string();
        assert!(repo.contains("no files found"));
        assert!(matches.contains("no files matched"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::AliasNotFound {
            name: "go_files".to_string(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert_eq!(cloned.to_string(), "alias 'go_files' not found");
    }
}
