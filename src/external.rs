//! Spawning pipeline stages as external OS processes.

use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::ShellError;

/// Run `name` with `args`, feeding `input` to its stdin.
///
/// PATH resolution is left to the OS. Stdout becomes the next pipeline
/// buffer; stderr is captured separately and carried in the error when the
/// process exits non-zero.
pub fn run(name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let mut child = Command::new(name)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ShellError::CommandNotFound(name.to_string()),
            _ => ShellError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // a child that exits without reading its input is not an error
        if let Err(e) = stdin.write_all(input) {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(ShellError::Process {
            status: exit_code(output.status),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Exit code following shell conventions: 128+signal for a signal death.
#[cfg(unix)]
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map(|s| 128 + s).unwrap_or(-1),
    }
}

#[cfg(not(unix))]
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
