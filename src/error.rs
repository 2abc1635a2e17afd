use thiserror::Error;

/// Errors produced by the pipeline engine and its collaborators.
///
/// Builtins report most of their failures as structured JSON *payloads* so
/// downstream stages can consume them; a `ShellError` is reserved for
/// execution-level failures, which abort the pipeline at the failing stage.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Missing or malformed arguments to a command.
    #[error("{message}")]
    Argument {
        message: String,
        /// Usage hint shown to the user alongside the message.
        usage: String,
    },

    /// A file, module or directory alias lookup missed.
    #[error("{0}")]
    NotFound(String),

    /// An underlying filesystem or OS failure, message preserved verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Input that was required to be JSON failed to parse, or a value failed
    /// to serialize.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// No builtin is registered under this name and no external executable
    /// could be resolved.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A spawned module or external process exited non-zero or died on a
    /// signal. Captured stderr, when any, rides along for display.
    #[error("process exited with status {status}")]
    Process { status: i32, stderr: String },
}

impl ShellError {
    /// Shorthand for an argument error with a usage hint.
    pub fn usage(message: impl Into<String>, usage: impl Into<String>) -> Self {
        ShellError::Argument {
            message: message.into(),
            usage: usage.into(),
        }
    }
}
