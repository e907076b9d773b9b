//! Blocking subprocess helpers shared by the git, tree and file wrappers.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Runs `program` with `args` in `dir` and returns its stdout.
///
/// A program that cannot be started because it is not installed becomes
/// [`Error::ToolMissing`]; a non-zero exit becomes [`Error::Command`] carrying
/// the trimmed stderr.
pub(crate) fn run<I, S>(program: &str, args: I, dir: &Path) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let shown = command_line(program, &args);
    trace!("Running {} in {}", shown, dir.display());

    let output = Command::new(program)
        .args(&args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::ToolMissing {
                    tool: program.to_string(),
                }
            } else {
                Error::command(&shown, e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(Error::command(shown, message));
    }

    Ok(output.stdout)
}

/// Returns true if `program --version` can be started.
pub(crate) fn is_available(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

fn command_line<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}
