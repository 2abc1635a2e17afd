//! Script modules: discovery, interpreter dispatch and lifecycle.
//!
//! A module is nothing more than a file in the configured modules directory.
//! The file name is the module name, the extension selects the interpreter,
//! and the executable bit is set on demand. No manifest, no metadata.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::ShellError;
use crate::external::exit_code;

/// Interpreter selected from a module's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Shell,
    Python,
    Ruby,
    /// No interpreter mapping: the file is executed directly and must be
    /// runnable on its own (shebang line or native binary).
    Native,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "sh" | "bash" => Language::Shell,
            "py" | "python3" => Language::Python,
            "rb" | "ruby" => Language::Ruby,
            _ => Language::Native,
        }
    }

    /// The command that runs `path` under this interpreter.
    fn command(self, path: &Path) -> Command {
        match self {
            Language::Shell => {
                let mut cmd = Command::new("bash");
                cmd.arg(path);
                cmd
            }
            Language::Python => {
                let mut cmd = Command::new(python_binary());
                cmd.arg(path);
                cmd
            }
            Language::Ruby => {
                let mut cmd = Command::new("ruby");
                cmd.arg(path);
                cmd
            }
            Language::Native => Command::new(path),
        }
    }
}

fn python_binary() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// A module directory entry.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub size: u64,
}

/// First non-directory entry whose file name equals `name` or starts with it.
///
/// Directory-listing order is whatever the OS returns, so a prefix matching
/// several modules resolves to an arbitrary one of them. Known sharp edge;
/// kept as-is.
fn resolve(modules_dir: &Path, name: &str) -> Result<Option<PathBuf>, ShellError> {
    for entry in fs::read_dir(modules_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name == name || file_name.starts_with(name) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Run the module resolved from `name`, appending `args` to its argv.
///
/// The child inherits the parent's stdin/stdout/stderr so interactive
/// modules can talk to the user directly. A successful run therefore yields
/// an empty buffer: a module stage cannot feed a downstream pipeline stage.
pub fn run(modules_dir: &Path, name: &str, args: &[String]) -> Result<Vec<u8>, ShellError> {
    let Some(target) = resolve(modules_dir, name)? else {
        return Err(ShellError::NotFound(format!("module not found: {name}")));
    };
    make_executable(&target)?;

    let ext = target
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lang = Language::from_extension(&ext);
    log::debug!("running module {} via {:?}", target.display(), lang);

    let status = lang.command(&target).args(args).status()?;
    if !status.success() {
        return Err(ShellError::Process {
            status: exit_code(status),
            stderr: String::new(),
        });
    }
    Ok(Vec::new())
}

/// Create `<modules_dir>/<name>.<ext>` from the language template and mark
/// it executable. Returns the path of the new module file.
pub fn create(modules_dir: &Path, name: &str, lang: &str) -> Result<PathBuf, ShellError> {
    let body = template(lang, name)?;
    let path = modules_dir.join(format!("{}.{}", name, extension_for(lang)));
    fs::write(&path, body)?;
    make_executable(&path)?;
    Ok(path)
}

/// Delete every module matching `name` exactly or by prefix. Returns the
/// deleted file names; zero matches is an error.
pub fn delete(modules_dir: &Path, name: &str) -> Result<Vec<String>, ShellError> {
    let mut deleted = Vec::new();
    for entry in fs::read_dir(modules_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name == name || file_name.starts_with(name) {
            fs::remove_file(entry.path())?;
            log::debug!("deleted module {file_name}");
            deleted.push(file_name);
        }
    }
    if deleted.is_empty() {
        return Err(ShellError::NotFound(format!("module not found: {name}")));
    }
    Ok(deleted)
}

/// Module files with their sizes; directories excluded, order unspecified.
pub fn list(modules_dir: &Path) -> Result<Vec<ModuleInfo>, ShellError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(modules_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        out.push(ModuleInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: entry.metadata()?.len(),
        });
    }
    Ok(out)
}

/// Fixed template per language. This is the strict set: creation only knows
/// bash, python and ruby, while run-time extension dispatch accepts more
/// (anything unmapped executes natively).
fn template(lang: &str, name: &str) -> Result<String, ShellError> {
    match lang.to_ascii_lowercase().as_str() {
        "bash" | "sh" => Ok(format!(
            "#!/usr/bin/env bash\n# {name} - modsh module (bash)\necho \"Hello from {name} (bash)\"\n"
        )),
        "python" | "py" | "python3" => Ok(format!(
            "#!/usr/bin/env python3\n# {name} - modsh module (python)\nprint(\"Hello from {name} (python)\")\n"
        )),
        "ruby" | "rb" => Ok(format!(
            "#!/usr/bin/env ruby\n# {name} - modsh module (ruby)\nputs 'Hello from {name} (ruby)'\n"
        )),
        other => Err(ShellError::usage(
            format!("unsupported language: {other}"),
            "supported languages: bash, python, ruby",
        )),
    }
}

/// Extension table for module creation. Falls back to the lowercased
/// language string, which is deliberately wider than the template table.
fn extension_for(lang: &str) -> String {
    match lang.to_ascii_lowercase().as_str() {
        "bash" | "sh" => "sh".to_string(),
        "python" | "py" | "python3" => "py".to_string(),
        "ruby" | "rb" => "rb".to_string(),
        other => other.to_string(),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
