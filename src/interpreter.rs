//! The pipeline executor.
//!
//! One submitted line becomes one pipeline run: each stage is classified as
//! a builtin, a module invocation, a shell-state command or an external
//! process, and a single byte buffer is moved from stage to stage. The first
//! stage-level error aborts the run; only the final stage's output reaches
//! the terminal.

use std::io::Write;

use serde_json::json;

use crate::builtins;
use crate::config::Config;
use crate::error::ShellError;
use crate::external;
use crate::modules;
use crate::parser::{self, Stage};
use crate::registry::{Registry, json_line};

/// Prefix that forces a stage to dispatch as a module invocation, e.g.
/// `run:report 2024 | wc`.
const MODULE_MARKER: &str = "run:";

/// Executes submitted lines as pipelines of builtins, modules and external
/// processes.
///
/// Owns the builtin [`Registry`] (populated before the first run, read-only
/// afterwards) and the shell [`Config`]. Exactly one pipeline executes at a
/// time; the inter-stage buffer lives on the stack of [`Self::execute_line_to`]
/// and is never aliased.
pub struct Interpreter {
    registry: Registry,
    config: Config,
}

impl Interpreter {
    pub fn new(registry: Registry, config: Config) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute one line, writing the final stage's output to stdout.
    pub fn execute_line(&mut self, line: &str) -> Result<(), ShellError> {
        self.execute_line_to(line, &mut std::io::stdout())
    }

    /// Execute one line, writing the final stage's output to `out`.
    ///
    /// Fail-fast: a stage-level error aborts the remaining stages and the
    /// buffer accumulated so far is discarded, never printed.
    pub fn execute_line_to(&mut self, line: &str, out: &mut dyn Write) -> Result<(), ShellError> {
        let stages = parser::parse_line(line);
        if stages.iter().all(|s| s.name.is_empty()) {
            return Err(ShellError::usage(
                "empty pipeline",
                "usage: cmd1 | cmd2 | ...",
            ));
        }

        let mut buffer: Vec<u8> = Vec::new();
        for stage in &stages {
            if stage.name.is_empty() {
                continue;
            }
            log::debug!("stage: {}", stage.raw);
            buffer = self.execute_stage(stage, buffer)?;
        }

        if !buffer.is_empty() {
            out.write_all(&buffer)?;
            out.flush()?;
        }
        Ok(())
    }

    fn execute_stage(&mut self, stage: &Stage, input: Vec<u8>) -> Result<Vec<u8>, ShellError> {
        let name = stage.name.as_str();

        if self.registry.is_builtin(name) {
            return self.registry.execute(name, &stage.args, &input);
        }

        if let Some(module) = name.strip_prefix(MODULE_MARKER) {
            return modules::run(&self.config.modules_dir, module, &stage.args);
        }

        match name {
            "run" => self.run_module(&stage.args),
            "new" => self.new_module(&stage.args),
            "list" => self.list_modules(),
            "delete" => self.delete_module(&stage.args),
            "setdir" => self.set_dir(&stage.args),
            "gotodir" => self.goto_dir(&stage.args),
            _ => external::run(name, &stage.args, &input),
        }
    }

    fn run_module(&mut self, args: &[String]) -> Result<Vec<u8>, ShellError> {
        let Some(name) = args.first() else {
            return Err(ShellError::usage(
                "missing module name",
                "usage: run <name> [args]",
            ));
        };
        modules::run(&self.config.modules_dir, name, &args[1..])
    }

    fn new_module(&mut self, args: &[String]) -> Result<Vec<u8>, ShellError> {
        let (Some(name), Some(lang)) = (args.first(), args.get(1)) else {
            return Err(ShellError::usage(
                "missing name/lang",
                "usage: new <name> <lang>",
            ));
        };
        let path = modules::create(&self.config.modules_dir, name, lang)?;
        json_line(json!({"created": path.to_string_lossy()}))
    }

    fn list_modules(&self) -> Result<Vec<u8>, ShellError> {
        json_line(modules::list(&self.config.modules_dir)?)
    }

    fn delete_module(&mut self, args: &[String]) -> Result<Vec<u8>, ShellError> {
        let Some(name) = args.first() else {
            return Err(ShellError::usage(
                "missing module name",
                "usage: delete <name>",
            ));
        };
        modules::delete(&self.config.modules_dir, name)?;
        json_line(json!({}))
    }

    fn set_dir(&mut self, args: &[String]) -> Result<Vec<u8>, ShellError> {
        let (Some(alias), Some(path)) = (args.first(), args.get(1)) else {
            return Err(ShellError::usage(
                "missing alias/path",
                "usage: setdir <alias> <path>",
            ));
        };
        self.config.dirs.insert(alias.clone(), path.clone());
        if let Err(e) = self.config.save() {
            log::warn!("could not persist config: {e}");
        }
        json_line(json!({"set": alias}))
    }

    fn goto_dir(&mut self, args: &[String]) -> Result<Vec<u8>, ShellError> {
        let Some(alias) = args.first() else {
            return Err(ShellError::usage("missing alias", "usage: gotodir <alias>"));
        };
        let Some(path) = self.config.dirs.get(alias).cloned() else {
            return Err(ShellError::NotFound(format!("alias not found: {alias}")));
        };
        std::env::set_current_dir(&path)?;
        self.config.last_dir = std::env::current_dir()?.to_string_lossy().into_owned();
        if let Err(e) = self.config.save() {
            log::warn!("could not persist config: {e}");
        }
        json_line(json!({"cwd": self.config.last_dir}))
    }
}

impl Default for Interpreter {
    /// An interpreter with the stock builtin set and the on-disk config.
    fn default() -> Self {
        Self::new(
            builtins::default_registry(),
            Config::load().unwrap_or_default(),
        )
    }
}
