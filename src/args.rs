//! Order-preserving command-line interpretation.
//!
//! Repeated flags are recorded as an ordered log of [`OrderEvent`]s instead
//! of being collapsed into lists, because raw mode must lay the document out
//! in exactly the order the user gave its parts. The aggregated views used
//! by default mode (all include patterns, all questions) are derived from
//! the same log.
//!
//! Both `-flag` and `--flag` spellings are accepted. A value flag takes the
//! next token as its value; a value that itself starts with `-` cannot be
//! expressed and is reported as a missing value.

use crate::error::{Error, Result};
use crate::filter::PatternSet;
use crate::sink::OutputSink;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::warn;

/// Kinds of input whose position matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `-i pattern`
    Include,
    /// `-f pattern`
    ForceInclude,
    /// `-q text`
    Question,
    /// `-qf path`
    QuestionFile,
    /// `-c`
    Clipboard,
}

impl EventKind {
    /// True for the kinds that become content items holding files.
    #[must_use]
    pub const fn is_pattern(self) -> bool {
        matches!(self, Self::Include | Self::ForceInclude)
    }
}

/// One positional occurrence in the order log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    /// Strictly increasing sequence number
    pub position: usize,

    /// What kind of input this was
    pub kind: EventKind,

    /// Pattern, question text or file path; empty for `-c`
    pub value: String,
}

/// Everything the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Ordered include, force-include and question events
    pub events: Vec<OrderEvent>,

    /// Exclude patterns, in the order given
    pub exclude: Vec<String>,

    /// `--output`
    pub output: Option<PathBuf>,

    /// `--role-message`
    pub role_message: Option<String>,

    /// `--extra-context`
    pub extra_context: Option<String>,

    /// `--last-words`
    pub last_words: Option<String>,

    /// `--max-size`
    pub max_size: Option<u64>,

    /// `-h`
    pub help: bool,

    /// `--raw`
    pub raw: bool,

    /// `--list-aliases`
    pub list_aliases: bool,

    /// `--stdout`
    pub stdout: bool,

    /// `--quiet`
    pub quiet: bool,

    /// `--dry-run`
    pub dry_run: bool,

    /// `--no-tree`
    pub no_tree: bool,

    /// Number of `-v`
    pub verbosity: u8,

    /// Tokens that were skipped, with the reason; reported once logging is up
    pub ignored: Vec<(String, &'static str)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueFlag {
    Event(EventKind),
    Exclude,
    Output,
    RoleMessage,
    ExtraContext,
    LastWords,
    MaxSize,
    Alias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Value(ValueFlag),
    Help,
    Clipboard,
    Raw,
    ListAliases,
    Stdout,
    Quiet,
    DryRun,
    NoTree,
    Verbose(u8),
}

impl Flag {
    fn lookup(token: &str) -> Option<Self> {
        let name = token
            .strip_prefix("--")
            .or_else(|| token.strip_prefix('-'))?;

        let flag = match name {
            "i" => Self::Value(ValueFlag::Event(EventKind::Include)),
            "f" => Self::Value(ValueFlag::Event(EventKind::ForceInclude)),
            "q" => Self::Value(ValueFlag::Event(EventKind::Question)),
            "qf" => Self::Value(ValueFlag::Event(EventKind::QuestionFile)),
            "e" => Self::Value(ValueFlag::Exclude),
            "output" => Self::Value(ValueFlag::Output),
            "role-message" => Self::Value(ValueFlag::RoleMessage),
            "extra-context" => Self::Value(ValueFlag::ExtraContext),
            "last-words" => Self::Value(ValueFlag::LastWords),
            "max-size" => Self::Value(ValueFlag::MaxSize),
            "a" => Self::Value(ValueFlag::Alias),
            "h" | "help" => Self::Help,
            "c" => Self::Clipboard,
            "raw" => Self::Raw,
            "list-aliases" => Self::ListAliases,
            "stdout" => Self::Stdout,
            "quiet" => Self::Quiet,
            "dry-run" => Self::DryRun,
            "no-tree" => Self::NoTree,
            "v" | "verbose" => Self::Verbose(1),
            "vv" => Self::Verbose(2),
            _ => return None,
        };
        Some(flag)
    }
}

fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

/// Returns true if `--list-aliases` appears anywhere in `tokens`.
///
/// Checked before alias expansion so a broken alias reference cannot block it.
#[must_use]
pub fn wants_alias_list(tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|t| t == "-list-aliases" || t == "--list-aliases")
}

/// Interprets an alias-expanded token stream.
///
/// # Errors
///
/// Returns an error for unknown flags, value flags without a value and
/// unparsable `--max-size` values.
pub fn parse(tokens: &[String]) -> Result<Invocation> {
    let mut inv = Invocation::default();
    // Pattern role that keeps absorbing bare tokens (`-i a.go b.go`)
    let mut open_role: Option<ValueFlag> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if !is_flag(token) {
            match open_role {
                Some(role) => inv.apply(role, token)?,
                None => inv.ignored.push((token.clone(), "unexpected argument")),
            }
            continue;
        }

        let flag = Flag::lookup(token).ok_or_else(|| Error::UnknownFlag {
            flag: token.clone(),
        })?;
        open_role = None;

        let value_flag = match flag {
            Flag::Value(v) => v,
            Flag::Help => {
                inv.help = true;
                continue;
            }
            Flag::Clipboard => {
                inv.push_event(EventKind::Clipboard, String::new());
                continue;
            }
            Flag::Raw => {
                inv.raw = true;
                continue;
            }
            Flag::ListAliases => {
                inv.list_aliases = true;
                continue;
            }
            Flag::Stdout => {
                inv.stdout = true;
                continue;
            }
            Flag::Quiet => {
                inv.quiet = true;
                continue;
            }
            Flag::DryRun => {
                inv.dry_run = true;
                continue;
            }
            Flag::NoTree => {
                inv.no_tree = true;
                continue;
            }
            Flag::Verbose(n) => {
                inv.verbosity = inv.verbosity.saturating_add(n);
                continue;
            }
        };

        let value = match tokens.get(i) {
            Some(v) if !is_flag(v) => v,
            _ => {
                return Err(Error::MissingValue {
                    flag: token.clone(),
                });
            }
        };
        i += 1;

        if value_flag == ValueFlag::Alias {
            inv.ignored
                .push((format!("{token} {value}"), "aliases cannot reference other aliases"));
            continue;
        }

        inv.apply(value_flag, value)?;
        if matches!(
            value_flag,
            ValueFlag::Exclude
                | ValueFlag::Event(EventKind::Include)
                | ValueFlag::Event(EventKind::ForceInclude)
        ) {
            open_role = Some(value_flag);
        }
    }

    Ok(inv)
}

impl Invocation {
    fn push_event(&mut self, kind: EventKind, value: String) {
        let position = self.events.len();
        self.events.push(OrderEvent {
            position,
            kind,
            value,
        });
    }

    fn apply(&mut self, flag: ValueFlag, value: &str) -> Result<()> {
        match flag {
            ValueFlag::Event(kind) => self.push_event(kind, value.to_string()),
            ValueFlag::Exclude => self.exclude.push(value.to_string()),
            ValueFlag::Output => self.output = Some(PathBuf::from(value)),
            ValueFlag::RoleMessage => self.role_message = Some(value.to_string()),
            ValueFlag::ExtraContext => self.extra_context = Some(value.to_string()),
            ValueFlag::LastWords => self.last_words = Some(value.to_string()),
            ValueFlag::MaxSize => {
                let bytes = value.parse::<u64>().map_err(|e| Error::InvalidValue {
                    flag: "--max-size".to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
                self.max_size = Some(bytes);
            }
            ValueFlag::Alias => {}
        }
        Ok(())
    }

    /// Logs skipped tokens.
    pub fn report(&self) {
        for (token, reason) in &self.ignored {
            warn!("Ignoring '{}': {}", token, reason);
        }
    }

    fn values_of(&self, kind: EventKind) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.value.clone())
            .collect()
    }

    /// All `-i` patterns in order.
    #[must_use]
    pub fn include_patterns(&self) -> Vec<String> {
        self.values_of(EventKind::Include)
    }

    /// All `-f` patterns in order.
    #[must_use]
    pub fn force_include_patterns(&self) -> Vec<String> {
        self.values_of(EventKind::ForceInclude)
    }

    /// Question events (`-q`, `-qf`, `-c`) in order.
    pub fn question_sources(&self) -> impl Iterator<Item = &OrderEvent> {
        self.events.iter().filter(|e| !e.kind.is_pattern())
    }

    /// True when any `-i` or `-f` was given.
    #[must_use]
    pub fn has_pattern_events(&self) -> bool {
        self.events.iter().any(|e| e.kind.is_pattern())
    }

    /// The aggregated pattern view used by default mode.
    #[must_use]
    pub fn pattern_set(&self) -> PatternSet {
        PatternSet::new()
            .include(self.include_patterns())
            .exclude(self.exclude.clone())
            .force_include(self.force_include_patterns())
    }

    /// Resolves the output destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingSinks`] when both `--stdout` and `--output` are set.
    pub fn output_sink(&self) -> Result<OutputSink> {
        match (self.stdout, &self.output) {
            (true, Some(_)) => Err(Error::ConflictingSinks),
            (true, None) => Ok(OutputSink::Stdout),
            (false, Some(path)) => Ok(OutputSink::File(path.clone())),
            (false, None) => Ok(OutputSink::Clipboard),
        }
    }
}

/// Describes the flag set for `-h`.
///
/// Only used to render help; interpretation is done by [`parse`].
#[must_use]
pub fn help_command() -> Command {
    Command::new("make-project-prompt")
        .version(clap::crate_version!())
        .about("Generate a prompt for LLMs from the files of a git project")
        .override_usage(
            "make-project-prompt [-i <pattern>]... [-e <pattern>]... [-f <pattern>]... \
             [-q <text>]... [-qf <file>]... [-c] [-a <alias>]... [--raw] [--stdout | --output <file>] \
             [--dry-run] [--quiet] [-v]...",
        )
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("include")
                .short('i')
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Include matching files; repeatable, accepts bare shell-expanded paths"),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Exclude files matching the pattern or lying under it as a directory"),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Always include matching files, even if ignored, excluded, binary or large"),
        )
        .arg(
            Arg::new("question")
                .short('q')
                .value_name("TEXT")
                .action(ArgAction::Append)
                .help("Add a question; repeatable, kept in order"),
        )
        .arg(
            Arg::new("question-file")
                .long("qf")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Add the content of a file as a question (written -qf)"),
        )
        .arg(
            Arg::new("clipboard")
                .short('c')
                .action(ArgAction::Count)
                .help("Add the clipboard content as a question"),
        )
        .arg(
            Arg::new("alias")
                .short('a')
                .value_name("ALIAS")
                .action(ArgAction::Append)
                .help("Expand a named option bundle from .mpp.txt files"),
        )
        .arg(
            Arg::new("list-aliases")
                .long("list-aliases")
                .action(ArgAction::SetTrue)
                .help("List all available aliases and exit"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Emit only files and questions, in command-line order"),
        )
        .arg(
            Arg::new("role-message")
                .long("role-message")
                .value_name("TEXT")
                .help("Text placed before the introduction"),
        )
        .arg(
            Arg::new("extra-context")
                .long("extra-context")
                .value_name("TEXT")
                .help("Text placed after the file content"),
        )
        .arg(
            Arg::new("last-words")
                .long("last-words")
                .value_name("TEXT")
                .help("Text placed after the questions"),
        )
        .arg(
            Arg::new("max-size")
                .long("max-size")
                .value_name("BYTES")
                .help("Skip non-forced files larger than this [default: 1048576]"),
        )
        .arg(
            Arg::new("no-tree")
                .long("no-tree")
                .action(ArgAction::SetTrue)
                .help("Leave out the project structure section"),
        )
        .arg(
            Arg::new("stdout")
                .long("stdout")
                .action(ArgAction::SetTrue)
                .help("Print the prompt instead of copying it to the clipboard"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("FILE")
                .help("Write the prompt to a file instead of the clipboard"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("List the files that would be included and exit"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only report errors"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("More diagnostics (-v debug, -vv trace); MPP_LOG overrides"),
        )
        .arg(
            Arg::new("help")
                .short('h')
                .action(ArgAction::SetTrue)
                .help("Show this help"),
        )
        .after_help(
            "Aliases:\n  Define aliases in .mpp.txt files as `name: options`; files are searched \
             from the current directory up to the root and the closest definition wins.\n\n\
             Examples:\n  make-project-prompt -i 'src/**/*.go' -q 'How can I improve error handling?'\n  \
             make-project-prompt --raw -q 'Header' -i main.go -q 'Footer' --stdout\n  \
             make-project-prompt -a go_files -i 'docs/*.md' --output prompt.txt",
        )
}

/// Renders the `-h` text.
#[must_use]
pub fn render_help() -> String {
    help_command().render_help().to_string()
}
