//! Interactive read-loop: prompt, history, reserved words, error display.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::colors::Palette;
use crate::config;
use crate::error::ShellError;
use crate::interpreter::Interpreter;

/// The interactive shell wrapping an [`Interpreter`].
///
/// Reserved lines (`exit`, `quit`, `help`) and empty input are handled here
/// and never reach the pipeline executor.
pub struct Repl {
    interp: Interpreter,
    palette: Palette,
}

impl Repl {
    pub fn new(interp: Interpreter) -> Self {
        let palette = Palette::from_theme(&interp.config().theme);
        Self { interp, palette }
    }

    /// Run the read loop until `exit`/`quit`, Ctrl-C or end of input.
    ///
    /// Ctrl-C aborts the current prompt read only; it does not kill a child
    /// process that is already running.
    pub fn run(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let history = config::history_file();
        // first run has no history yet
        let _ = rl.load_history(&history);

        println!(
            "{}",
            self.palette
                .info("modsh - modular scripting shell (type 'help')")
        );
        let prompt = self.prompt();
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line)?;
                    match line {
                        "exit" | "quit" => {
                            println!("bye");
                            break;
                        }
                        "help" => self.print_help(),
                        _ => {
                            if let Err(err) = self.interp.execute_line(line) {
                                self.report(&err);
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let _ = rl.save_history(&history);
        Ok(())
    }

    fn prompt(&self) -> String {
        let cfg = self.interp.config();
        if !cfg.workspace.is_empty() {
            return format!("{}> ", cfg.workspace);
        }
        let base = cfg
            .modules_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "modsh".to_string());
        format!("{base}> ")
    }

    /// Print an executor error; usage hints and captured stderr go on their
    /// own indented lines so the error line itself stays short.
    fn report(&self, err: &ShellError) {
        println!("{} {err}", self.palette.error("error:"));
        match err {
            ShellError::Argument { usage, .. } if !usage.is_empty() => {
                println!("  {}", self.palette.warn(usage));
            }
            ShellError::Process { stderr, .. } if !stderr.is_empty() => {
                for line in stderr.lines() {
                    println!("  {}", self.palette.warn(line));
                }
            }
            _ => {}
        }
    }

    fn print_help(&self) {
        println!("\nModule commands:");
        println!("  new <name> <lang>       create a module (bash, python, ruby)");
        println!("  run <name> [args]       run a module (run:<name> inside pipelines)");
        println!("  list                    list modules");
        println!("  delete <name>           delete modules matching a name or prefix");
        println!("\nDirectory commands:");
        println!("  setdir <alias> <path>   remember a directory under an alias");
        println!("  gotodir <alias>         jump to a remembered directory");
        println!("\nBuiltins:");
        let mut names = self.interp.registry().names();
        names.sort();
        for name in names {
            println!("  {name}");
        }
        println!("\nPiping:");
        println!("  cmd1 | cmd2 | cmd3      pipe JSON output between commands");
        println!("  ls | select name,size   keep only the named fields");
        println!("\nOther:");
        println!("  help                    show this help");
        println!("  exit, quit              leave the shell");
        println!();
    }
}
