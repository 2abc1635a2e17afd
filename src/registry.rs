//! The builtin registry and the JSON wire contract between pipeline stages.
//!
//! Builtins communicate through two stable JSON shapes: the success envelope
//! `{"success": true, "data": …}` and the [`ExecutionError`] payload. Both
//! are emitted with a trailing newline so a final stage prints cleanly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ShellError;

/// Handler signature shared by every builtin: own command name, argument
/// list and the piped input buffer in; the replacement buffer out.
///
/// A handler returns `Err` only when it failed to produce bytes at all;
/// failures a downstream stage could act on are serialized as an
/// [`ExecutionError`] payload and returned as `Ok` output.
pub type BuiltinFn = fn(&str, &[String], &[u8]) -> Result<Vec<u8>, ShellError>;

/// Structured error payload emitted by builtins as pipeable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub command: String,
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Name → handler mapping for builtin commands.
///
/// Built once during startup and read-only afterwards; the executor receives
/// it by injection rather than through process-wide state. The last
/// registration under a name wins.
pub struct Registry {
    commands: HashMap<String, BuiltinFn>,
}

impl Registry {
    /// An empty registry. See `builtins::default_registry` for the stock set.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a handler under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: BuiltinFn) {
        self.commands.insert(name.into(), handler);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Run the handler registered under `name`.
    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        input: &[u8],
    ) -> Result<Vec<u8>, ShellError> {
        match self.commands.get(name) {
            Some(handler) => handler(name, args, input),
            None => Err(ShellError::CommandNotFound(name.to_string())),
        }
    }

    /// Registered command names, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize `value` followed by a newline.
pub fn json_line<T: Serialize>(value: T) -> Result<Vec<u8>, ShellError> {
    let mut bytes = serde_json::to_vec(&value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Wrap `data` in the success envelope: `{"success": true, "data": …}`.
pub fn structured_output<T: Serialize>(data: T) -> Result<Vec<u8>, ShellError> {
    let mut map = serde_json::Map::new();
    map.insert("success".to_string(), Value::Bool(true));
    map.insert("data".to_string(), serde_json::to_value(data)?);
    json_line(Value::Object(map))
}

/// Serialize an [`ExecutionError`] payload.
///
/// This is a builtin's *successful* output: the error travels down the
/// pipeline as data, where a later stage may filter or display it.
pub fn structured_error(
    command: &str,
    code: i64,
    message: impl Into<String>,
    hints: &[&str],
) -> Result<Vec<u8>, ShellError> {
    let payload = ExecutionError {
        command: command.to_string(),
        code,
        message: message.into(),
        hints: if hints.is_empty() {
            None
        } else {
            Some(hints.iter().map(|h| h.to_string()).collect())
        },
        context: None,
    };
    json_line(payload)
}
