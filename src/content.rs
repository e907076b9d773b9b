use crate::file::CandidateFile;

/// A unit of the final document, carrying its declared position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// Literal question text
    Question {
        /// Declared position
        order: usize,
        /// Question text
        text: String,
    },
    /// Files resolved from one pattern (or the whole selection in default mode)
    FileGroup {
        /// Declared position
        order: usize,
        /// Pattern that produced the group, for diagnostics
        pattern: String,
        /// Selected files in listing order
        files: Vec<CandidateFile>,
    },
}

impl ContentItem {
    /// Declared position of the item.
    #[must_use]
    pub const fn order(&self) -> usize {
        match self {
            Self::Question { order, .. } | Self::FileGroup { order, .. } => *order,
        }
    }

    /// Files carried by the item; empty for questions.
    #[must_use]
    pub fn files(&self) -> &[CandidateFile] {
        match self {
            Self::Question { .. } => &[],
            Self::FileGroup { files, .. } => files,
        }
    }
}

/// Questions in declared order.
pub fn questions(items: &[ContentItem]) -> impl Iterator<Item = &str> {
    items.iter().filter_map(|item| match item {
        ContentItem::Question { text, .. } => Some(text.as_str()),
        ContentItem::FileGroup { .. } => None,
    })
}

/// Every file of every group, in declared order.
pub fn files(items: &[ContentItem]) -> impl Iterator<Item = &CandidateFile> {
    items.iter().flat_map(ContentItem::files)
}
