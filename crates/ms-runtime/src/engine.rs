use std::sync::Arc;

use ms_core::{Program, ScriptError, ScriptValue};
use tracing::debug;

use crate::dispatch::OutputDispatcher;
use crate::environment::Environment;
use crate::store::VariableStore;

mod control;
mod eval;
mod step;

pub struct ScriptEngineOptions {
    pub program: Program,
    pub store: Option<Arc<dyn VariableStore>>,
    /// Instruction budget checked between steps. `None` runs unbounded;
    /// hosts that need preemption set a limit or drive `step` themselves.
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Done,
}

/// The fetch/execute loop over a loaded program. Owns the instruction
/// pointer, the call stack, and the variable environment; every observable
/// output leaves through the dispatcher handed to `run`/`step`.
pub struct ScriptEngine {
    program: Program,
    environment: Environment,
    call_stack: Vec<usize>,
    ip: usize,
    halted: bool,
    steps_taken: usize,
    max_steps: Option<usize>,
}

impl ScriptEngine {
    pub fn new(options: ScriptEngineOptions) -> Self {
        Self {
            program: options.program,
            environment: Environment::new(options.store),
            call_stack: Vec::new(),
            ip: 0,
            halted: false,
            steps_taken: 0,
            max_steps: options.max_steps,
        }
    }

    /// Execute from the current position until the program ends, `halt`
    /// executes, or a runtime error aborts the run. Output already handed to
    /// the dispatcher before an error is never retracted.
    pub fn run(&mut self, dispatcher: &mut dyn OutputDispatcher) -> Result<(), ScriptError> {
        loop {
            if let StepOutcome::Done = self.step(dispatcher)? {
                debug!(steps = self.steps_taken, "run complete");
                return Ok(());
            }
        }
    }

    /// Execute at most one instruction. Hosts interleaving script execution
    /// with their own scheduling loop over this instead of `run`.
    pub fn step(&mut self, dispatcher: &mut dyn OutputDispatcher) -> Result<StepOutcome, ScriptError> {
        if self.halted || self.ip >= self.program.len() {
            return Ok(StepOutcome::Done);
        }

        if let Some(limit) = self.max_steps {
            if self.steps_taken >= limit {
                return Err(ScriptError::new(
                    "ENGINE_STEP_BUDGET",
                    format!("Execution exceeded the {} instruction budget.", limit),
                ));
            }
        }
        self.steps_taken += 1;

        let instruction = self.program.instructions[self.ip].clone();
        self.execute(&instruction, dispatcher).map_err(|mut error| {
            if error.line.is_none() {
                error.line = Some(instruction.line);
            }
            error
        })?;
        Ok(StepOutcome::Running)
    }

    /// Current value of a variable, empty string if never written. Lets a
    /// host inspect script state after a run without reaching into the
    /// environment.
    pub fn variable(&self, name: &str) -> ScriptValue {
        self.environment.get(name)
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}
