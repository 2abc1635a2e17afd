use anyhow::Result;
use argh::FromArgs;

use modsh::config::Config;
use modsh::interpreter::Interpreter;
use modsh::repl::Repl;

#[derive(FromArgs)]
/// modsh - a modular scripting shell with JSON pipelines.
struct Args {
    /// execute a single pipeline and exit instead of starting the shell
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// override the configured modules directory
    #[argh(option)]
    modules_dir: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = Config::load()?;
    if let Some(dir) = args.modules_dir {
        config.modules_dir = dir.into();
    }

    let mut interp = Interpreter::new(modsh::builtins::default_registry(), config);

    if let Some(line) = args.command {
        if let Err(err) = interp.execute_line(&line) {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        return Ok(());
    }

    Repl::new(interp).run()
}
