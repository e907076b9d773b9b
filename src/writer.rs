use crate::{
    error::{Error, Result},
    sink::{Clipboard, OutputSink},
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Delivers the finished document to its sink.
///
/// Stdout and files receive the bytes unchanged. The clipboard only holds
/// text, so invalid UTF-8 is replaced there.
///
/// # Errors
///
/// Returns an error if the clipboard, stdout or the output file cannot be written.
pub(crate) fn publish(
    document: &[u8],
    sink: &OutputSink,
    clipboard: &mut dyn Clipboard,
    stdout: &mut dyn Write,
) -> Result<()> {
    match sink {
        OutputSink::Clipboard => clipboard.write(&String::from_utf8_lossy(document)),
        OutputSink::Stdout => {
            stdout
                .write_all(document)
                .and_then(|()| stdout.flush())
                .map_err(|e| Error::io("<stdout>", e))
        }
        OutputSink::File(path) => write_file_atomic(path, document),
    }
}

/// Writes a file atomically.
///
/// # Process
///
/// 1. Writes content to a temporary file next to the target
/// 2. Syncs the temporary file to disk
/// 3. Renames it over the target path
///
/// A reader never sees a half-written prompt file.
pub(crate) fn write_file_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path)?;

    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(path, e));
    }

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// `dir/name` becomes `dir/.name.tmp`.
fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let filename = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Invalid output path: {}", path.display())))?
        .to_string_lossy();

    Ok(path.with_file_name(format!(".{filename}.tmp")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[derive(Default)]
    struct MemoryClipboard {
        content: Option<String>,
    }

    impl Clipboard for MemoryClipboard {
        fn read(&mut self) -> Result<String> {
            Ok(self.content.clone().unwrap_or_default())
        }

        fn write(&mut self, text: &str) -> Result<()> {
            self.content = Some(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_publish_to_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        let mut stdout = Vec::<u8>::new();

        publish(b"doc", &OutputSink::Clipboard, &mut clipboard, &mut stdout).unwrap();

        assert_eq!(clipboard.content.as_deref(), Some("doc"));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_publish_to_stdout() {
        let mut clipboard = MemoryClipboard::default();
        let mut stdout = Vec::<u8>::new();

        publish(b"doc", &OutputSink::Stdout, &mut clipboard, &mut stdout).unwrap();

        assert_eq!(stdout, b"doc");
        assert!(clipboard.content.is_none());
    }

    #[test]
    fn test_publish_to_file_replaces_content() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("prompt.txt");
        target.write_str("old content").unwrap();
        let mut clipboard = MemoryClipboard::default();

        publish(
            b"new content",
            &OutputSink::File(target.path().to_path_buf()),
            &mut clipboard,
            &mut Vec::<u8>::new(),
        )
        .unwrap();

        target.assert("new content");
        assert!(!temp.child(".prompt.txt.tmp").path().exists());
    }

    #[test]
    fn test_non_utf8_bytes_reach_stdout_and_files_unchanged() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("prompt.bin");
        let document = b"head\n\xff\xfe\ntail";
        let mut clipboard = MemoryClipboard::default();
        let mut stdout = Vec::<u8>::new();

        publish(document, &OutputSink::Stdout, &mut clipboard, &mut stdout).unwrap();
        publish(
            document,
            &OutputSink::File(target.path().to_path_buf()),
            &mut clipboard,
            &mut Vec::<u8>::new(),
        )
        .unwrap();
        publish(document, &OutputSink::Clipboard, &mut clipboard, &mut Vec::<u8>::new()).unwrap();

        assert_eq!(stdout, document);
        assert_eq!(std::fs::read(target.path()).unwrap(), document);
        assert_eq!(clipboard.content.as_deref(), Some("head\n\u{fffd}\u{fffd}\ntail"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.path().join("missing/dir/prompt.txt");

        let err = write_file_atomic(&target, b"x").unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_temp_path_for() {
        assert_eq!(
            temp_path_for(Path::new("/out/prompt.md")).unwrap(),
            PathBuf::from("/out/.prompt.md.tmp")
        );
        assert!(temp_path_for(Path::new("/")).is_err());
    }
}
