use crate::error::{Error, Result};
use crate::mime::MimeDetector;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Number of leading bytes inspected by the NUL-byte heuristic.
const SNIFF_LEN: usize = 512;

/// Build and dependency manifests that are always text, whatever their extension.
static BUILD_METADATA: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "go.mod",
        "go.sum",
        "go.work",
        "Makefile",
        "GNUmakefile",
        "Dockerfile",
        "Containerfile",
        "Jenkinsfile",
        "Vagrantfile",
        "Gemfile",
        "Rakefile",
        "Procfile",
        "CMakeLists.txt",
        "Cargo.lock",
        "LICENSE",
        ".gitignore",
        ".gitattributes",
        ".dockerignore",
        ".editorconfig",
        ".env",
    ]
    .into_iter()
    .collect()
});

/// Extension (lowercase, without the dot) to MIME type.
static EXTENSION_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // text
        ("txt", "text/plain"),
        ("md", "text/markdown"),
        ("markdown", "text/markdown"),
        ("rst", "text/x-rst"),
        ("csv", "text/csv"),
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("scss", "text/x-scss"),
        ("sass", "text/x-sass"),
        ("vue", "text/x-vue"),
        ("go", "text/x-go"),
        ("rs", "text/x-rust"),
        ("py", "text/x-python"),
        ("rb", "text/x-ruby"),
        ("c", "text/x-c"),
        ("h", "text/x-c"),
        ("cpp", "text/x-c++"),
        ("cc", "text/x-c++"),
        ("hpp", "text/x-c++"),
        ("java", "text/x-java"),
        ("kt", "text/x-kotlin"),
        ("scala", "text/x-scala"),
        ("swift", "text/x-swift"),
        ("cs", "text/x-csharp"),
        ("clj", "text/x-clojure"),
        ("ex", "text/x-elixir"),
        ("exs", "text/x-elixir"),
        ("erl", "text/x-erlang"),
        ("hs", "text/x-haskell"),
        ("lua", "text/x-lua"),
        ("pl", "text/x-perl"),
        ("pm", "text/x-perl"),
        ("r", "text/x-r"),
        ("dart", "text/x-dart"),
        ("gradle", "text/x-gradle"),
        ("sql", "text/x-sql"),
        ("proto", "text/x-protobuf"),
        ("ini", "text/plain"),
        ("cfg", "text/plain"),
        ("conf", "text/plain"),
        ("properties", "text/plain"),
        ("mod", "text/plain"),
        ("sum", "text/plain"),
        ("lock", "text/plain"),
        ("svg", "image/svg+xml"),
        // structured text
        ("json", "application/json"),
        ("xml", "application/xml"),
        ("js", "application/javascript"),
        ("mjs", "application/javascript"),
        ("jsx", "application/javascript"),
        ("ts", "application/javascript"),
        ("tsx", "application/javascript"),
        ("sh", "application/x-sh"),
        ("bash", "application/x-sh"),
        ("zsh", "application/x-sh"),
        ("php", "application/x-php"),
        ("toml", "application/toml"),
        ("yaml", "application/yaml"),
        ("yml", "application/yaml"),
        // binary
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("ico", "image/vnd.microsoft.icon"),
        ("webp", "image/webp"),
        ("mp3", "audio/mpeg"),
        ("wav", "audio/wav"),
        ("flac", "audio/flac"),
        ("mp4", "video/mp4"),
        ("mov", "video/quicktime"),
        ("avi", "video/x-msvideo"),
        ("mkv", "video/x-matroska"),
        ("pdf", "application/pdf"),
        ("zip", "application/zip"),
        ("gz", "application/gzip"),
        ("tar", "application/x-tar"),
        ("bz2", "application/x-bzip2"),
        ("xz", "application/x-xz"),
        ("7z", "application/x-7z-compressed"),
        ("rar", "application/vnd.rar"),
        ("wasm", "application/wasm"),
        ("exe", "application/vnd.microsoft.portable-executable"),
        ("dll", "application/vnd.microsoft.portable-executable"),
        ("so", "application/x-sharedlib"),
        ("dylib", "application/x-mach-binary"),
        ("a", "application/x-archive"),
        ("o", "application/x-object"),
        ("class", "application/java-vm"),
        ("jar", "application/java-archive"),
        ("pyc", "application/x-python-code"),
        ("woff", "font/woff"),
        ("woff2", "font/woff2"),
        ("ttf", "font/ttf"),
    ]
    .into_iter()
    .collect()
});

/// MIME types outside `text/` that still hold readable text.
const STRUCTURED_TEXT_MIME: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-sh",
    "application/x-shellscript",
    "application/x-python",
    "application/x-php",
    "application/x-ruby",
    "application/toml",
    "application/yaml",
    "image/svg+xml",
];

/// One path reported by the file lister, after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path relative to the project root, slash-separated
    pub path: String,

    /// Size in bytes at selection time
    pub size: u64,

    /// False for symlinks, devices and directories
    pub is_regular: bool,

    /// Matched a force-include pattern
    pub forced: bool,

    /// Text classification (always true for forced files)
    pub is_text: bool,
}

impl CandidateFile {
    /// Resolves the candidate against the project root.
    #[must_use]
    pub fn absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }
}

/// Returns true if `mime` names a textual format.
#[must_use]
pub fn is_text_mime(mime: &str) -> bool {
    let mime = mime.trim();
    mime.starts_with("text/") || STRUCTURED_TEXT_MIME.iter().any(|t| mime.starts_with(t))
}

/// Looks up the built-in MIME type for a path's extension.
#[must_use]
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_MIME.get(ext.as_str()).copied()
}

/// Returns true for build and dependency manifests such as `go.mod` or `Makefile`.
#[must_use]
pub fn is_build_metadata(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| BUILD_METADATA.contains(name))
}

/// Checks the first 512 bytes for a NUL byte. Empty files count as text.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn sniff_text(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| Error::io(path, e))?;

    Ok(memchr::memchr(0, &buffer).is_none())
}

/// Decides whether `path` is text.
///
/// Build metadata wins, then the extension table, then the external
/// detector, and finally the NUL-byte sniff when nothing else knows.
pub(crate) fn classify(path: &Path, detector: &dyn MimeDetector) -> bool {
    if is_build_metadata(path) {
        trace!("{} is build metadata", path.display());
        return true;
    }

    if let Some(mime) = mime_from_extension(path) {
        trace!("{} has extension type {}", path.display(), mime);
        return is_text_mime(mime);
    }

    if let Some(mime) = detector.detect(path) {
        trace!("{} detected as {}", path.display(), mime);
        return is_text_mime(&mime);
    }

    match sniff_text(path) {
        Ok(text) => text,
        Err(e) => {
            trace!("Sniff failed for {}: {}", path.display(), e);
            false
        }
    }
}
