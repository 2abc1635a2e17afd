//! Tokenization of a submitted line into pipeline stages.
//!
//! The pipeline model is a flat left-to-right byte relay, and the tokenizer
//! is correspondingly flat: a line splits on every literal `|`, and each
//! stage splits on whitespace. There is no quoting, escaping or expansion.

/// One element of a pipeline: the raw stage text plus the resolved command
/// name and argument list. Stages are derived fresh for every line and
/// discarded after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub raw: String,
    pub name: String,
    pub args: Vec<String>,
}

impl Stage {
    /// Parse a single stage string.
    ///
    /// An all-whitespace stage yields an empty name; the executor treats
    /// such a stage as one to skip, not as an error.
    pub fn parse(raw: &str) -> Self {
        let (name, args) = parse_cmd(raw);
        Stage {
            raw: raw.trim().to_string(),
            name,
            args,
        }
    }
}

/// Split a line into stage strings on the literal `|` character.
///
/// No quote or escape awareness: a pipe inside a quoted argument still
/// separates stages. Documented limitation of the pipeline model.
pub fn split_pipeline(line: &str) -> Vec<&str> {
    line.split('|').collect()
}

/// Split a stage into command name and arguments on runs of whitespace.
pub fn parse_cmd(stage: &str) -> (String, Vec<String>) {
    let mut parts = stage.split_whitespace();
    match parts.next() {
        Some(name) => (name.to_string(), parts.map(str::to_string).collect()),
        None => (String::new(), Vec::new()),
    }
}

/// Tokenize a full line into its ordered stages.
pub fn parse_line(line: &str) -> Vec<Stage> {
    split_pipeline(line).into_iter().map(Stage::parse).collect()
}
