use std::sync::Arc;

use ms_core::{Program, ScriptError};
use ms_runtime::{RecordingDispatcher, ScriptEngine, ScriptEngineOptions, VariableStore};

pub use ms_compiler::compile_source;

#[derive(Clone, Default)]
pub struct RunOptions {
    pub store: Option<Arc<dyn VariableStore>>,
    pub max_steps: Option<usize>,
}

/// A completed (or aborted) run: everything each channel observed, in order,
/// plus the terminal error if one ended the run. Output emitted before a
/// failure is preserved alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub displayed: Vec<String>,
    pub transmitted: Vec<String>,
    pub error: Option<ScriptError>,
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run a loaded program to completion, collecting both output channels.
pub fn run_program(program: Program, options: RunOptions) -> RunReport {
    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        program,
        store: options.store,
        max_steps: options.max_steps,
    });
    let mut dispatcher = RecordingDispatcher::new();
    let error = engine.run(&mut dispatcher).err();
    RunReport {
        displayed: dispatcher.displayed,
        transmitted: dispatcher.transmitted,
        error,
    }
}

/// Compile and run script source in one call. Load errors are returned as
/// `Err` because execution never begins; runtime errors land in the report
/// next to the output already produced.
pub fn run_source(source: &str, options: RunOptions) -> Result<RunReport, ScriptError> {
    let program = compile_source(source)?;
    Ok(run_program(program, options))
}
