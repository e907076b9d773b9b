//! Named option bundles loaded from `.mpp.txt` files.
//!
//! Every directory from the working directory up to the filesystem root may
//! hold a `.mpp.txt` file with `name: options` lines. When two files define
//! the same name, the one closest to the working directory wins and the
//! other definition is kept as a [`ShadowedAlias`] so it can be reported.
//!
//! [`AliasStore::from_sources`] is the pure resolver and takes the file
//! contents in search order; [`AliasStore::discover`] feeds it from disk.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration file name looked up in every ancestor directory.
pub const CONFIG_FILE_NAME: &str = ".mpp.txt";

/// A named option bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Name used with `-a`
    pub name: String,

    /// Raw option string, tokenized on expansion
    pub options: String,

    /// Configuration file that defined it
    pub source: PathBuf,
}

/// A definition hidden by a closer one with the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedAlias {
    /// Alias name
    pub name: String,

    /// File whose definition is in effect
    pub winner: PathBuf,

    /// File whose definition was hidden
    pub shadowed: PathBuf,
}

/// A line that is neither blank, a comment, nor `name: options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// File containing the line
    pub source: PathBuf,

    /// 1-based line number
    pub line: usize,

    /// What was wrong with it
    pub reason: &'static str,
}

/// Resolved aliases plus the provenance of every discarded definition.
#[derive(Debug, Clone, Default)]
pub struct AliasStore {
    aliases: HashMap<String, Alias>,
    shadowed: Vec<ShadowedAlias>,
    malformed: Vec<MalformedLine>,
    unreadable: Vec<(PathBuf, String)>,
}

/// The `.mpp.txt` candidates from `start` up to the root, closest first.
#[must_use]
pub fn search_paths(start: &Path) -> Vec<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .collect()
}

impl AliasStore {
    /// Loads every existing `.mpp.txt` between `start` and the root.
    ///
    /// Files that exist but cannot be read are recorded and skipped.
    #[must_use]
    pub fn discover(start: &Path) -> Self {
        let mut sources = Vec::new();
        let mut unreadable = Vec::new();

        for path in search_paths(start) {
            if !path.is_file() {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(content) => {
                    debug!("Loaded alias file {}", path.display());
                    sources.push((path, content));
                }
                Err(e) => unreadable.push((path, e.to_string())),
            }
        }

        let mut store = Self::from_sources(sources);
        store.unreadable = unreadable;
        store
    }

    /// Resolves aliases from `(path, content)` pairs given closest first.
    #[must_use]
    pub fn from_sources(sources: Vec<(PathBuf, String)>) -> Self {
        let mut store = Self::default();

        for (source, content) in sources {
            for (index, raw) in content.lines().enumerate() {
                let line = raw.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                let Some((name, options)) = line.split_once(':') else {
                    store.malformed.push(MalformedLine {
                        source: source.clone(),
                        line: index + 1,
                        reason: "expected format 'name: options'",
                    });
                    continue;
                };

                let name = name.trim();
                if name.is_empty() {
                    store.malformed.push(MalformedLine {
                        source: source.clone(),
                        line: index + 1,
                        reason: "empty alias name",
                    });
                    continue;
                }

                store.insert(Alias {
                    name: name.to_string(),
                    options: options.trim().to_string(),
                    source: source.clone(),
                });
            }
        }

        store
    }

    fn insert(&mut self, alias: Alias) {
        if let Some(existing) = self.aliases.get(&alias.name) {
            self.shadowed.push(ShadowedAlias {
                name: alias.name,
                winner: existing.source.clone(),
                shadowed: alias.source,
            });
            return;
        }
        self.aliases.insert(alias.name.clone(), alias);
    }

    /// Looks up an alias by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.aliases.get(name)
    }

    /// All aliases sorted by name.
    #[must_use]
    pub fn aliases(&self) -> Vec<&Alias> {
        let mut list: Vec<&Alias> = self.aliases.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Definitions hidden by closer ones.
    #[must_use]
    pub fn shadowed(&self) -> &[ShadowedAlias] {
        &self.shadowed
    }

    /// Lines that were skipped as malformed.
    #[must_use]
    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// Text printed by `--list-aliases`.
    #[must_use]
    pub fn listing(&self) -> String {
        let aliases = self.aliases();
        if aliases.is_empty() {
            return "No aliases found in .mpp.txt config files.\n".to_string();
        }

        let mut out = String::from("Available aliases:\n");
        for alias in aliases {
            out.push_str(&format!("  {}: {}\n", alias.name, alias.options));
            out.push_str(&format!("    (defined in {})\n", alias.source.display()));
        }
        out
    }

    /// Logs every non-fatal problem found while loading.
    pub fn report(&self) {
        for (path, message) in &self.unreadable {
            warn!("Failed to read config file {}: {}", path.display(), message);
        }
        for line in &self.malformed {
            warn!(
                "Invalid alias definition at {}:{} ({})",
                line.source.display(),
                line.line,
                line.reason
            );
        }
        for s in &self.shadowed {
            warn!(
                "alias [{}] is duplicated (first defined in {}, also in {})",
                s.name,
                s.winner.display(),
                s.shadowed.display()
            );
        }
    }

    /// Replaces every `-a NAME` / `--a NAME` with the alias's tokens.
    ///
    /// Expansion is a single pass: tokens produced by an alias are not
    /// scanned for further alias references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingValue`] when `-a` is the last token and
    /// [`Error::AliasNotFound`] for an unknown name.
    pub fn expand(&self, tokens: &[String]) -> Result<Vec<String>> {
        let mut expanded = Vec::with_capacity(tokens.len());
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            if token != "-a" && token != "--a" {
                expanded.push(token.clone());
                continue;
            }

            let name = iter.next().ok_or_else(|| Error::MissingValue {
                flag: token.clone(),
            })?;
            let alias = self.get(name).ok_or_else(|| Error::AliasNotFound {
                name: name.clone(),
            })?;

            debug!("Expanding alias '{}' from {}", alias.name, alias.source.display());
            expanded.extend(split_options(&alias.options));
        }

        Ok(expanded)
    }
}

/// Shell-like tokenization of an alias option string.
///
/// Spaces and tabs separate tokens; single or double quotes group text into
/// one token and are removed. An unmatched quote runs to the end of the
/// string. Empty quoted strings produce no token.
#[must_use]
pub fn split_options(options: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in options.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                ' ' | '\t' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(ch),
            },
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
