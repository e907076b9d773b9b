use crate::{
    config::{GeneratorConfig, RenderMode},
    content::{self, ContentItem},
    error::{Error, Result},
    file::CandidateFile,
    tree::TreeRenderer,
};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Tera};
use tracing::{debug, warn};

const HEADER_TEMPLATE: &str = "header";
const FOOTER_TEMPLATE: &str = "footer";

/// Question text used when the user gave none.
pub const QUESTION_PLACEHOLDER: &str = "[YOUR QUESTION HERE]";

/// Tree section text when the renderer fails.
const TREE_ERROR: &str = "Error running tree command.\n";

#[derive(Serialize)]
struct ScaffoldContext<'a> {
    role: Option<&'a str>,
    include_tree: bool,
    tree: &'a str,
    extra: Option<&'a str>,
    questions: String,
    closing: Option<&'a str>,
}

/// A finished document.
///
/// File contents are copied byte for byte, so the document is only
/// guaranteed to be UTF-8 when every included file is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Full prompt
    pub document: Vec<u8>,

    /// Number of file blocks actually emitted
    pub file_count: usize,

    /// Default mode had no question and used the placeholder
    pub used_placeholder: bool,
}

impl Rendered {
    /// The document as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.document)
    }
}

/// Renders content items into the final document.
pub(crate) struct Assembler {
    tera: Tera,
    root: PathBuf,
    mode: RenderMode,
    include_tree: bool,
    role_message: Option<String>,
    extra_context: Option<String>,
    closing_text: Option<String>,
}

impl Assembler {
    /// Creates an assembler from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to parse.
    pub(crate) fn new(config: &GeneratorConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(HEADER_TEMPLATE, include_str!("../templates/header.tera"))
            .map_err(|e| Error::template(HEADER_TEMPLATE, &e))?;
        tera.add_raw_template(FOOTER_TEMPLATE, include_str!("../templates/footer.tera"))
            .map_err(|e| Error::template(FOOTER_TEMPLATE, &e))?;

        Ok(Self {
            tera,
            root: config.root_dir.clone(),
            mode: config.mode,
            include_tree: config.include_tree,
            role_message: config.role_message.clone(),
            extra_context: config.extra_context.clone(),
            closing_text: config.closing_text.clone(),
        })
    }

    /// Renders `items` in the configured mode.
    ///
    /// Items are never reordered. Files that cannot be read are skipped with
    /// a warning and do not count toward `file_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub(crate) fn render(
        &self,
        items: &[ContentItem],
        tree: &dyn TreeRenderer,
    ) -> Result<Rendered> {
        match self.mode {
            RenderMode::Default => self.render_default(items, tree),
            RenderMode::Raw => Ok(self.render_raw(items)),
        }
    }

    fn render_default(&self, items: &[ContentItem], tree: &dyn TreeRenderer) -> Result<Rendered> {
        let tree_text = if self.include_tree {
            tree.render().unwrap_or_else(|e| {
                warn!("Failed to get project tree: {}", e);
                TREE_ERROR.to_string()
            })
        } else {
            String::new()
        };

        let mut questions = String::new();
        for question in content::questions(items) {
            questions.push_str(question);
            questions.push('\n');
        }
        let used_placeholder = questions.is_empty();
        if used_placeholder {
            questions.push_str(QUESTION_PLACEHOLDER);
            questions.push('\n');
        }

        let scaffold = ScaffoldContext {
            role: self.role_message.as_deref(),
            include_tree: self.include_tree,
            tree: &tree_text,
            extra: self.extra_context.as_deref(),
            questions,
            closing: self.closing_text.as_deref(),
        };

        let mut context = Context::new();
        context.insert("ctx", &scaffold);

        let mut document = self
            .render_template(HEADER_TEMPLATE, &context)?
            .into_bytes();
        let mut file_count = 0;
        for file in content::files(items) {
            if self.write_file_block(&mut document, file) {
                file_count += 1;
            }
        }
        let footer = self.render_template(FOOTER_TEMPLATE, &context)?;
        document.extend_from_slice(footer.as_bytes());

        Ok(Rendered {
            document,
            file_count,
            used_placeholder,
        })
    }

    fn render_template(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| Error::template(name, &e))
    }

    fn render_raw(&self, items: &[ContentItem]) -> Rendered {
        let mut document = Vec::new();
        let mut file_count = 0;

        for item in items {
            match item {
                ContentItem::Question { text, .. } => {
                    document.push(b'\n');
                    document.extend_from_slice(text.as_bytes());
                    document.push(b'\n');
                }
                ContentItem::FileGroup { pattern, files, .. } => {
                    debug!("Rendering group '{}' ({} files)", pattern, files.len());
                    for file in files {
                        if self.write_file_block(&mut document, file) {
                            file_count += 1;
                        }
                    }
                }
            }
        }

        Rendered {
            document,
            file_count,
            used_placeholder: false,
        }
    }

    /// Appends one delimited file block; returns false if the file could not be read.
    fn write_file_block(&self, out: &mut Vec<u8>, file: &CandidateFile) -> bool {
        let bytes = match fs::read(file.absolute(&self.root)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read content of '{}': {}. Skipping.", file.path, e);
                return false;
            }
        };

        out.extend_from_slice(format!("\n--- FILE: {} ---\n", file.path).as_bytes());
        out.extend_from_slice(&bytes);
        out.extend_from_slice(format!("\n--- END FILE: {} ---\n", file.path).as_bytes());
        true
    }
}
