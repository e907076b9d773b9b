use crate::{
    args::{EventKind, Invocation, OrderEvent},
    config::{GeneratorConfig, RenderMode},
    content::{self, ContentItem},
    error::{Error, Result},
    file::CandidateFile,
    filter::PatternSet,
    mime::{FileCommand, MimeDetector},
    selector::Selector,
    sink::{Clipboard, OutputSink, SystemClipboard},
    template::{Assembler, QUESTION_PLACEHOLDER, Rendered},
    tree::{TreeCommand, TreeRenderer},
    vcs::{FileLister, GitLister},
    writer,
};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Label of the group that stands for "every listed file".
const ALL_FILES: &str = "*";

/// The external programs and devices a run talks to.
pub struct Collaborators {
    /// Candidate path source
    pub lister: Box<dyn FileLister>,
    /// Project structure view
    pub tree: Box<dyn TreeRenderer>,
    /// MIME lookups for unknown extensions
    pub mime: Box<dyn MimeDetector>,
    /// Question source for `-c` and default output sink
    pub clipboard: Box<dyn Clipboard>,
}

impl Collaborators {
    /// git, tree, file and the desktop clipboard, all working in `root`.
    #[must_use]
    pub fn system(root: &Path) -> Self {
        Self {
            lister: Box::new(GitLister::new(root)),
            tree: Box::new(TreeCommand::new(root)),
            mime: Box::new(FileCommand::new(root)),
            clipboard: Box::new(SystemClipboard::new()),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Files selected across all groups
    pub files_found: usize,

    /// File blocks written into the document
    pub files_included: usize,

    /// Where the document went
    pub sink: OutputSink,

    /// No question was given and the placeholder was used
    pub used_placeholder: bool,

    /// Size of the document in bytes
    pub document_bytes: usize,

    /// Total execution time
    pub duration: Duration,
}

impl RunSummary {
    /// Logs the summary at info level.
    pub fn log(&self) {
        match &self.sink {
            OutputSink::Clipboard => info!("Prompt generated and copied to clipboard!"),
            OutputSink::Stdout => info!("Prompt written to stdout"),
            OutputSink::File(path) => {
                info!("Prompt generated and written to {}!", path.display());
            }
        }
        info!(
            "Number of files included: {} of {} found ({} bytes, {:.2}s)",
            self.files_included,
            self.files_found,
            self.document_bytes,
            self.duration.as_secs_f64()
        );
        if self.used_placeholder {
            info!(
                "NOTE: No question specified with -q. Remember to replace '{}'.",
                QUESTION_PLACEHOLDER
            );
        }
    }
}

/// A file group before questions are merged in.
#[derive(Debug)]
struct GroupPlan {
    /// Index of the `-i`/`-f` event that produced it; `None` for the implicit group
    anchor: Option<usize>,
    pattern: String,
    files: Vec<CandidateFile>,
}

/// Drives one invocation from selection to the output sink.
pub struct Pipeline {
    config: GeneratorConfig,
    collaborators: Collaborators,
    assembler: Assembler,
    tracked: OnceCell<Vec<String>>,
    with_ignored: OnceCell<Vec<String>>,
}

impl Pipeline {
    /// Creates a pipeline using the system collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let collaborators = Collaborators::system(&config.root_dir);
        Self::with_collaborators(config, collaborators)
    }

    /// Creates a pipeline with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_collaborators(
        config: GeneratorConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;
        let assembler = Assembler::new(&config)?;

        Ok(Self {
            config,
            collaborators,
            assembler,
            tracked: OnceCell::new(),
            with_ignored: OnceCell::new(),
        })
    }

    /// Checks that the root is a work tree before anything else runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not inside a git work tree or git is missing.
    pub fn preflight(&self) -> Result<()> {
        self.collaborators.lister.ensure_work_tree()
    }

    fn listing(&self, include_ignored: bool) -> Result<&[String]> {
        let cell = if include_ignored {
            &self.with_ignored
        } else {
            &self.tracked
        };
        let paths = cell.get_or_try_init(|| self.collaborators.lister.list(include_ignored))?;
        Ok(paths.as_slice())
    }

    /// Runs one selection call.
    ///
    /// Normally ignored paths are considered only for force-include
    /// patterns; include patterns never reach them.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or a pattern is invalid.
    pub fn select(&self, patterns: &PatternSet) -> Result<Vec<CandidateFile>> {
        let selector = Selector::new(
            &self.config.root_dir,
            self.config.max_file_size,
            self.collaborators.mime.as_ref(),
        );

        let tracked = self.listing(false)?;
        let mut files = selector.select(tracked, patterns)?;

        if patterns.needs_ignored() {
            let known: HashSet<&str> = tracked.iter().map(String::as_str).collect();
            let ignored: Vec<String> = self
                .listing(true)?
                .iter()
                .filter(|p| !known.contains(p.as_str()))
                .cloned()
                .collect();

            if !ignored.is_empty() {
                let forced_only = PatternSet::new().force_include(patterns.force_include.clone());
                files.extend(selector.select(&ignored, &forced_only)?);
                files.sort_by(|a, b| a.path.cmp(&b.path));
            }
        }

        Ok(files)
    }

    fn plan_groups(&self, inv: &Invocation) -> Result<Vec<GroupPlan>> {
        let set = inv.pattern_set();
        let mut groups = Vec::new();

        match self.config.mode {
            RenderMode::Default => {
                let anchor = inv.events.iter().position(|e| e.kind.is_pattern());
                let pattern = if set.has_explicit_patterns() {
                    set.explicit_patterns().join(" ")
                } else {
                    ALL_FILES.to_string()
                };
                groups.push(GroupPlan {
                    anchor,
                    pattern,
                    files: self.select(&set)?,
                });
            }
            RenderMode::Raw => {
                if !inv.has_pattern_events() {
                    groups.push(GroupPlan {
                        anchor: None,
                        pattern: ALL_FILES.to_string(),
                        files: self.select(&PatternSet::new().exclude(inv.exclude.clone()))?,
                    });
                }

                for (index, event) in inv.events.iter().enumerate() {
                    let single = match event.kind {
                        EventKind::Include => {
                            PatternSet::new().include(vec![event.value.clone()])
                        }
                        EventKind::ForceInclude => {
                            PatternSet::new().force_include(vec![event.value.clone()])
                        }
                        _ => continue,
                    };
                    let files = self.select(&single.exclude(inv.exclude.clone()))?;
                    if files.is_empty() {
                        warn!("Pattern '{}' matched no files", event.value);
                    }
                    groups.push(GroupPlan {
                        anchor: Some(index),
                        pattern: event.value.clone(),
                        files,
                    });
                }
            }
        }

        let total: usize = groups.iter().map(|g| g.files.len()).sum();
        if total == 0 {
            return Err(if set.has_explicit_patterns() {
                Error::NoMatches {
                    patterns: set.explicit_patterns(),
                }
            } else {
                Error::NoFilesInRepository
            });
        }

        Ok(groups)
    }

    /// Files that a real run would select, without reading any question source.
    ///
    /// A file matched by several raw-mode groups is listed once, at its
    /// first position.
    ///
    /// # Errors
    ///
    /// Returns an error if selection fails or selects nothing.
    pub fn dry_run(&self, inv: &Invocation) -> Result<Vec<CandidateFile>> {
        let groups = self.plan_groups(inv)?;
        let mut seen = HashSet::new();

        Ok(groups
            .into_iter()
            .flat_map(|g| g.files)
            .filter(|file| seen.insert(file.path.clone()))
            .collect())
    }

    fn resolve_question(&mut self, event: &OrderEvent) -> Result<String> {
        match event.kind {
            EventKind::QuestionFile => {
                let path = self.config.root_dir.join(&event.value);
                let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
                if text.trim().is_empty() {
                    return Err(Error::EmptyQuestion {
                        source_name: event.value.clone(),
                    });
                }
                debug!("Using question from file {}", event.value);
                Ok(text.trim_end_matches(['\r', '\n']).to_string())
            }
            EventKind::Clipboard => {
                let text = self.collaborators.clipboard.read()?;
                if text.trim().is_empty() {
                    return Err(Error::EmptyQuestion {
                        source_name: "clipboard".to_string(),
                    });
                }
                debug!("Using question from clipboard");
                Ok(text)
            }
            _ => Ok(event.value.clone()),
        }
    }

    /// Selects files and resolves every question, in declared order.
    ///
    /// # Errors
    ///
    /// Returns an error if selection finds nothing or a question source fails.
    pub fn build_items(&mut self, inv: &Invocation) -> Result<Vec<ContentItem>> {
        let mut groups = self.plan_groups(inv)?.into_iter().peekable();
        let mut items = Vec::new();

        let push_group = |items: &mut Vec<ContentItem>, group: GroupPlan| {
            items.push(ContentItem::FileGroup {
                order: items.len(),
                pattern: group.pattern,
                files: group.files,
            });
        };

        let implicit_first = self.config.mode == RenderMode::Raw;
        if let Some(group) = groups.next_if(|g| implicit_first && g.anchor.is_none()) {
            push_group(&mut items, group);
        }

        for (index, event) in inv.events.iter().enumerate() {
            if event.kind.is_pattern() {
                if let Some(group) = groups.next_if(|g| g.anchor == Some(index)) {
                    push_group(&mut items, group);
                }
                continue;
            }

            let text = self.resolve_question(event)?;
            items.push(ContentItem::Question {
                order: items.len(),
                text,
            });
        }

        for group in groups {
            push_group(&mut items, group);
        }

        Ok(items)
    }

    /// Builds and renders the document without publishing it.
    ///
    /// # Errors
    ///
    /// Returns an error if selection fails, a question source fails, or no
    /// file made it into the document.
    pub fn generate(&mut self, inv: &Invocation) -> Result<(Rendered, usize)> {
        let items = self.build_items(inv)?;
        let files_found = content::files(&items).count();
        info!("Found {} files matching the specified patterns", files_found);

        let rendered = self
            .assembler
            .render(&items, self.collaborators.tree.as_ref())?;

        if rendered.file_count == 0 {
            return Err(Error::NothingIncluded);
        }

        Ok((rendered, files_found))
    }

    /// Executes the complete run and publishes the document to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails. Nothing is published after a failure.
    #[instrument(
        skip_all,
        fields(root_dir = %self.config.root_dir.display(), mode = self.config.mode.name())
    )]
    pub fn run(
        mut self,
        inv: &Invocation,
        sink: &OutputSink,
        stdout: &mut dyn Write,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();

        self.preflight()?;
        let (rendered, files_found) = self.generate(inv)?;

        writer::publish(
            &rendered.document,
            sink,
            self.collaborators.clipboard.as_mut(),
            stdout,
        )?;

        let summary = RunSummary {
            files_found,
            files_included: rendered.file_count,
            sink: sink.clone(),
            used_placeholder: rendered.used_placeholder,
            document_bytes: rendered.document.len(),
            duration: start_time.elapsed(),
        };

        if !self.config.quiet {
            summary.log();
        }

        Ok(summary)
    }
}

/// Text printed by `--dry-run`.
#[must_use]
pub fn format_dry_run(files: &[CandidateFile]) -> String {
    let mut out = String::from("The following files would be included in the prompt:\n");
    for file in files {
        let _ = writeln!(out, "- {}", file.path);
    }
    let _ = writeln!(out, "\nTotal files: {}", files.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use assert_fs::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StubLister {
        tracked: Vec<String>,
        ignored: Vec<String>,
        calls: Rc<RefCell<usize>>,
    }

    impl FileLister for StubLister {
        fn ensure_work_tree(&self) -> Result<()> {
            Ok(())
        }

        fn list(&self, include_ignored: bool) -> Result<Vec<String>> {
            *self.calls.borrow_mut() += 1;
            let mut paths = self.tracked.clone();
            if include_ignored {
                paths.extend(self.ignored.clone());
            }
            paths.sort();
            Ok(paths)
        }
    }

    struct NotARepo;

    impl FileLister for NotARepo {
        fn ensure_work_tree(&self) -> Result<()> {
            Err(Error::NotWorkTree {
                message: "fatal: not a git repository".to_string(),
            })
        }

        fn list(&self, _include_ignored: bool) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct BrokenLister;

    impl FileLister for BrokenLister {
        fn ensure_work_tree(&self) -> Result<()> {
            Ok(())
        }

        fn list(&self, _include_ignored: bool) -> Result<Vec<String>> {
            Err(Error::command(
                "git ls-files -z -c -o --exclude-standard",
                "fatal: index file corrupt",
            ))
        }
    }

    struct StubTree;

    impl TreeRenderer for StubTree {
        fn render(&self) -> Result<String> {
            Ok(".\n".to_string())
        }
    }

    struct NoMime;

    impl MimeDetector for NoMime {
        fn detect(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    #[derive(Clone, Default)]
    struct SharedClipboard(Rc<RefCell<String>>);

    impl Clipboard for SharedClipboard {
        fn read(&mut self) -> Result<String> {
            Ok(self.0.borrow().clone())
        }

        fn write(&mut self, text: &str) -> Result<()> {
            *self.0.borrow_mut() = text.to_string();
            Ok(())
        }
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn project() -> assert_fs::TempDir {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.go").write_str("package a").unwrap();
        temp.child("pkg/legacy/b.go").write_str("package legacy").unwrap();
        temp.child("README.md").write_str("# readme").unwrap();
        temp.child("docs/guide.md").write_str("guide").unwrap();
        temp.child("binary.bin").write_binary(&[1, 0, 2, 0]).unwrap();
        temp.child("question.txt").write_str("From a file?\n").unwrap();
        temp.child("empty.txt").write_str("  \n").unwrap();
        temp
    }

    fn pipeline_with(
        root: &Path,
        mode: RenderMode,
        clipboard: SharedClipboard,
    ) -> (Pipeline, Rc<RefCell<usize>>) {
        let calls = Rc::new(RefCell::new(0));
        let lister = StubLister {
            tracked: tokens(&[
                "README.md",
                "a.go",
                "docs/guide.md",
                "pkg/legacy/b.go",
                "question.txt",
                "empty.txt",
            ]),
            ignored: tokens(&["binary.bin"]),
            calls: Rc::clone(&calls),
        };
        let config = GeneratorConfig::builder()
            .root_dir(root)
            .mode(mode)
            .build()
            .unwrap();
        let collaborators = Collaborators {
            lister: Box::new(lister),
            tree: Box::new(StubTree),
            mime: Box::new(NoMime),
            clipboard: Box::new(clipboard),
        };
        (Pipeline::with_collaborators(config, collaborators).unwrap(), calls)
    }

    fn pipeline(root: &Path, mode: RenderMode) -> Pipeline {
        pipeline_with(root, mode, SharedClipboard::default()).0
    }

    fn invocation(items: &[&str]) -> Invocation {
        args::parse(&tokens(items)).unwrap()
    }

    fn paths(files: &[CandidateFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_include_exclude_scenario() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Default);
        let inv = invocation(&["-i", "*.go", "-e", "pkg/legacy/*.go"]);

        let files = p.dry_run(&inv).unwrap();
        assert_eq!(paths(&files), vec!["a.go"]);
    }

    #[test]
    fn test_force_include_reaches_ignored_binary() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Default);
        let inv = invocation(&["-f", "binary.bin"]);

        let files = p.dry_run(&inv).unwrap();
        assert_eq!(paths(&files), vec!["binary.bin"]);
        assert!(files[0].forced);
        assert!(files[0].is_text);
    }

    #[test]
    fn test_include_never_reaches_ignored_files() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Default);
        let inv = invocation(&["-i", "*", "-f", "docs/guide.md"]);

        let files = p.dry_run(&inv).unwrap();
        assert!(!paths(&files).contains(&"binary.bin"));
        assert!(paths(&files).contains(&"docs/guide.md"));
    }

    #[test]
    fn test_listing_is_cached() {
        let temp = project();
        let (p, calls) = pipeline_with(temp.path(), RenderMode::Raw, SharedClipboard::default());
        let inv = invocation(&["-i", "*.go", "-i", "*.md", "-i", "docs/*"]);

        p.dry_run(&inv).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_alias_union_scenario() {
        let temp = project();
        let store = crate::alias::AliasStore::from_sources(vec![(
            temp.path().join(".mpp.txt"),
            "go_files: -i **/*.go\n".to_string(),
        )]);
        let expanded = store.expand(&tokens(&["-a", "go_files", "-i", "docs/*.md"])).unwrap();
        let inv = args::parse(&expanded).unwrap();
        let p = pipeline(temp.path(), RenderMode::Default);

        let files = p.dry_run(&inv).unwrap();
        assert_eq!(paths(&files), vec!["a.go", "docs/guide.md", "pkg/legacy/b.go"]);
    }

    #[test]
    fn test_empty_repository() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = GeneratorConfig::builder().root_dir(temp.path()).build().unwrap();
        let collaborators = Collaborators {
            lister: Box::new(StubLister {
                tracked: Vec::new(),
                ignored: Vec::new(),
                calls: Rc::default(),
            }),
            tree: Box::new(StubTree),
            mime: Box::new(NoMime),
            clipboard: Box::new(SharedClipboard::default()),
        };
        let p = Pipeline::with_collaborators(config, collaborators).unwrap();

        let err = p.dry_run(&invocation(&[])).unwrap_err();
        assert!(matches!(err, Error::NoFilesInRepository));
    }

    #[test]
    fn test_patterns_matching_nothing() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Default);

        let err = p.dry_run(&invocation(&["-i", "*.rs"])).unwrap_err();
        assert!(matches!(err, Error::NoMatches { ref patterns } if patterns == &tokens(&["*.rs"])));
    }

    #[test]
    fn test_raw_mode_interleaves_in_argument_order() {
        let temp = project();
        let mut p = pipeline(temp.path(), RenderMode::Raw);
        let inv = invocation(&["-q", "A", "-i", "a.go", "-q", "B"]);

        let items = p.build_items(&inv).unwrap();
        assert!(matches!(&items[0], ContentItem::Question { text, .. } if text == "A"));
        assert!(matches!(&items[1], ContentItem::FileGroup { pattern, .. } if pattern == "a.go"));
        assert!(matches!(&items[2], ContentItem::Question { text, .. } if text == "B"));

        let (rendered, _) = p.generate(&inv).unwrap();
        assert_eq!(
            rendered.as_text(),
            "\nA\n\n--- FILE: a.go ---\npackage a\n--- END FILE: a.go ---\n\nB\n"
        );
    }

    #[test]
    fn test_raw_mode_without_patterns_puts_all_files_first() {
        let temp = project();
        let mut p = pipeline(temp.path(), RenderMode::Raw);
        let inv = invocation(&["-q", "Q", "-e", "docs", "-e", "*.txt"]);

        let items = p.build_items(&inv).unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            ContentItem::FileGroup { pattern, files, .. } => {
                assert_eq!(pattern, "*");
                assert_eq!(paths(files), vec!["README.md", "a.go", "pkg/legacy/b.go"]);
            }
            other => panic!("expected file group, got {other:?}"),
        }
        let orders: Vec<usize> = items.iter().map(ContentItem::order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_raw_mode_empty_group_is_not_fatal() {
        let temp = project();
        let mut p = pipeline(temp.path(), RenderMode::Raw);
        let inv = invocation(&["-i", "*.rs", "-i", "a.go"]);

        let items = p.build_items(&inv).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].files().is_empty());
        assert_eq!(items[1].files().len(), 1);
    }

    #[test]
    fn test_default_mode_accumulates_questions_in_order() {
        let temp = project();
        let clipboard = SharedClipboard::default();
        clipboard.0.replace("From the clipboard?".to_string());
        let (mut p, _) = pipeline_with(temp.path(), RenderMode::Default, clipboard);
        let inv = invocation(&["-q", "First?", "-c", "-i", "*.go", "-qf", "question.txt"]);

        let (rendered, files_found) = p.generate(&inv).unwrap();

        assert!(
            rendered
                .as_text()
                .ends_with("question:\n\nFirst?\nFrom the clipboard?\nFrom a file?\n")
        );
        assert_eq!(files_found, 1);
        assert_eq!(rendered.file_count, 1);
    }

    #[test]
    fn test_empty_question_sources_fail() {
        let temp = project();
        let mut p = pipeline(temp.path(), RenderMode::Default);
        let err = p.build_items(&invocation(&["-c"])).unwrap_err();
        assert!(matches!(
            err,
            Error::EmptyQuestion { ref source_name } if source_name == "clipboard"
        ));

        let err = p.build_items(&invocation(&["-qf", "empty.txt"])).unwrap_err();
        assert!(matches!(err, Error::EmptyQuestion { .. }));

        let err = p.build_items(&invocation(&["-qf", "missing.txt"])).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_run_publishes_to_stdout() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Raw);
        let inv = invocation(&["-i", "README.md", "-q", "Done?"]);
        let mut stdout = Vec::<u8>::new();

        let summary = p.run(&inv, &OutputSink::Stdout, &mut stdout).unwrap();

        let text = String::from_utf8(stdout).unwrap();
        assert!(text.contains("--- FILE: README.md ---\n# readme\n"));
        assert!(text.ends_with("\nDone?\n"));
        assert_eq!(summary.files_included, 1);
        assert_eq!(summary.sink, OutputSink::Stdout);
    }

    #[test]
    fn test_run_publishes_to_clipboard() {
        let temp = project();
        let clipboard = SharedClipboard::default();
        let (p, _) = pipeline_with(temp.path(), RenderMode::Default, clipboard.clone());

        let inv = invocation(&["-i", "a.go"]);

        let summary = p
            .run(&inv, &OutputSink::Clipboard, &mut Vec::<u8>::new())
            .unwrap();

        assert!(clipboard.0.borrow().contains("--- FILE: a.go ---"));
        assert!(summary.used_placeholder);
    }

    #[test]
    fn test_run_outside_work_tree_fails_before_publishing() {
        let temp = project();
        let config = GeneratorConfig::builder().root_dir(temp.path()).build().unwrap();
        let clipboard = SharedClipboard::default();
        let collaborators = Collaborators {
            lister: Box::new(NotARepo),
            tree: Box::new(StubTree),
            mime: Box::new(NoMime),
            clipboard: Box::new(clipboard.clone()),
        };
        let p = Pipeline::with_collaborators(config, collaborators).unwrap();

        let err = p
            .run(&invocation(&[]), &OutputSink::Clipboard, &mut Vec::<u8>::new())
            .unwrap_err();

        assert!(matches!(err, Error::NotWorkTree { .. }));
        assert!(clipboard.0.borrow().is_empty());
    }

    #[test]
    fn test_listing_failure_aborts_run() {
        let temp = project();
        let config = GeneratorConfig::builder().root_dir(temp.path()).build().unwrap();
        let clipboard = SharedClipboard::default();
        let collaborators = Collaborators {
            lister: Box::new(BrokenLister),
            tree: Box::new(StubTree),
            mime: Box::new(NoMime),
            clipboard: Box::new(clipboard.clone()),
        };
        let p = Pipeline::with_collaborators(config, collaborators).unwrap();

        let err = p
            .run(&invocation(&["-q", "Why?"]), &OutputSink::Clipboard, &mut Vec::<u8>::new())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Command { ref message, .. } if message == "fatal: index file corrupt"
        ));
        assert!(err.to_string().contains("fatal: index file corrupt"));
        assert!(clipboard.0.borrow().is_empty());
    }

    #[test]
    fn test_raw_dry_run_lists_each_file_once() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Raw);
        let inv = invocation(&["--raw", "-i", "*.go", "-i", "a.go", "-i", "README.md"]);

        let files = p.dry_run(&inv).unwrap();

        assert_eq!(paths(&files), vec!["a.go", "README.md"]);
        assert_eq!(
            format_dry_run(&files),
            "The following files would be included in the prompt:\n\
             - a.go\n- README.md\n\nTotal files: 2\n"
        );
    }

    #[test]
    fn test_forced_binary_bytes_reach_stdout_unchanged() {
        let temp = project();
        let p = pipeline(temp.path(), RenderMode::Raw);
        let mut stdout = Vec::<u8>::new();

        p.run(&invocation(&["-f", "binary.bin"]), &OutputSink::Stdout, &mut stdout)
            .unwrap();

        assert_eq!(
            stdout,
            b"\n--- FILE: binary.bin ---\n\x01\x00\x02\x00\n--- END FILE: binary.bin ---\n"
        );
    }

    #[test]
    fn test_vanished_file_is_not_selected() {
        let temp = project();
        let mut p = pipeline(temp.path(), RenderMode::Default);
        let inv = invocation(&["-i", "a.go"]);
        p.dry_run(&inv).unwrap();
        std::fs::remove_file(temp.path().join("a.go")).unwrap();

        // the cached listing still names a.go
        let err = p.generate(&inv).unwrap_err();
        assert!(matches!(err, Error::NoMatches { .. }));
    }

    #[test]
    fn test_format_dry_run() {
        let files = vec![CandidateFile {
            path: "a.go".to_string(),
            size: 9,
            is_regular: true,
            forced: false,
            is_text: true,
        }];

        assert_eq!(
            format_dry_run(&files),
            "The following files would be included in the prompt:\n- a.go\n\nTotal files: 1\n"
        );
    }
}
