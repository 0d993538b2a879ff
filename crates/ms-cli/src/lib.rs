use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use ms_core::ScriptError;
use ms_runtime::{ScriptEngine, ScriptEngineOptions, VariableStore};
use tracing::debug;

mod cli_args;
mod error_map;
mod session;
mod source_loader;
mod state_store;

pub(crate) use cli_args::{CheckArgs, Cli, Command, ListArgs, RunArgs};
pub(crate) use error_map::{
    emit_error, map_cli_session_io, map_cli_source_read, map_cli_state_invalid,
    map_cli_state_read, map_cli_state_write,
};
pub(crate) use session::{ConsoleDispatcher, SessionDispatcher};
pub(crate) use source_loader::{find_scripts, read_script_source};
pub(crate) use state_store::JsonFileStore;

/// Install the process-wide log subscriber. Events go to stderr so the
/// display channel on stdout stays clean; level is driven by RUST_LOG.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return error.exit_code(),
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, ScriptError> {
    match cli.command {
        Command::Run(args) => run_script(args),
        Command::Check(args) => check_script(args),
        Command::List(args) => list_scripts(args),
    }
}

fn run_script(args: RunArgs) -> Result<i32, ScriptError> {
    let source = read_script_source(&args.script)?;
    let program = ms_api::compile_source(&source)?;
    debug!(script = %args.script.display(), instructions = program.len(), "program loaded");

    let store: Option<Arc<dyn VariableStore>> = args
        .state
        .map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn VariableStore>);

    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        program,
        store,
        max_steps: args.max_steps,
    });

    match args.connect {
        Some(address) => {
            let mut dispatcher = SessionDispatcher::connect(&address)?;
            engine.run(&mut dispatcher)?;
            if let Some(error) = dispatcher.take_error() {
                return Err(error);
            }
        }
        None => {
            engine.run(&mut ConsoleDispatcher)?;
        }
    }
    Ok(0)
}

fn check_script(args: CheckArgs) -> Result<i32, ScriptError> {
    let source = read_script_source(&args.script)?;
    let program = ms_api::compile_source(&source)?;
    println!(
        "ok: {} instructions, {} labels",
        program.len(),
        program.labels.len()
    );
    Ok(0)
}

fn list_scripts(args: ListArgs) -> Result<i32, ScriptError> {
    for path in find_scripts(&args.dir)? {
        println!("{}", path.display());
    }
    Ok(0)
}
