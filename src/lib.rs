//! # project-prompt
//!
//! Bundles the files of a git repository and one or more questions into a
//! single prompt document for a language model.
//!
//! ## Features
//!
//! - File selection over `git ls-files` with include, exclude and force-include globs
//! - Text/binary classification and a per-file size limit
//! - Named argument aliases read from `.mpp.txt` files
//! - A templated default layout or a raw, argument-ordered layout
//! - Output to the clipboard, stdout, or a file written atomically
//!
//! ## Quick Start
//!
//! ```no_run
//! use project_prompt::{GeneratorConfig, OutputSink, Pipeline, args};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tokens: Vec<String> = ["-i", "**/*.rs", "-q", "Where is the config parsed?"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let invocation = args::parse(&tokens)?;
//!
//! let config = GeneratorConfig::builder().root_dir(".").build()?;
//!
//! Pipeline::new(config)?.run(&invocation, &OutputSink::Stdout, &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Aliases**: `-a NAME` tokens are spliced in from `.mpp.txt` files
//! 2. **Arguments**: tokens become ordered events plus global options
//! 3. **Selector**: listed paths pass pattern policy, classification and size checks
//! 4. **Assembler**: questions and file groups are rendered into one document
//! 5. **Writer**: the document goes to its sink

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

pub mod alias;
pub mod args;
mod config;
pub mod content;
mod error;
pub mod file;
mod filter;
pub mod glob;
mod mime;
mod pipeline;
mod process;
mod selector;
mod sink;
mod template;
mod tree;
mod vcs;
mod writer;

pub use alias::{Alias, AliasStore, CONFIG_FILE_NAME};
pub use args::{EventKind, Invocation, OrderEvent};
pub use config::{DEFAULT_MAX_FILE_SIZE, GeneratorConfig, GeneratorConfigBuilder, RenderMode};
pub use content::ContentItem;
pub use error::{Error, Result};
pub use file::CandidateFile;
pub use filter::PatternSet;
pub use mime::{FileCommand, MimeDetector};
pub use pipeline::{Collaborators, Pipeline, RunSummary, format_dry_run};
pub use sink::{Clipboard, OutputSink, SystemClipboard};
pub use template::{QUESTION_PLACEHOLDER, Rendered};
pub use tree::{TreeCommand, TreeRenderer};
pub use vcs::{FileLister, GitLister};

/// Runs one invocation against the system git, tree, file and clipboard.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The root is not inside a git work tree
/// - No file is selected or none can be read
/// - A question source is empty or unreadable
/// - The sink cannot be written
///
/// # Examples
///
/// ```no_run
/// use project_prompt::{GeneratorConfig, OutputSink, args, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let invocation = args::parse(&["-i".to_string(), "*.md".to_string()])?;
/// let config = GeneratorConfig::builder().root_dir(".").build()?;
///
/// run(config, &invocation, &OutputSink::Clipboard)?;
/// # Ok(())
/// # }
/// ```
pub fn run(
    config: GeneratorConfig,
    invocation: &Invocation,
    sink: &OutputSink,
) -> Result<RunSummary> {
    Pipeline::new(config)?.run(invocation, sink, &mut std::io::stdout())
}
