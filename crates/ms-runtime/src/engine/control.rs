use ms_core::ScriptError;
use tracing::debug;

use super::ScriptEngine;

impl ScriptEngine {
    /// Targets are resolved at the moment a jump executes, not at load time,
    /// so forward references across skipped code stay legal.
    pub(super) fn jump_to(&mut self, label: &str) -> Result<(), ScriptError> {
        let Some(index) = self.program.label_index(label) else {
            return Err(ScriptError::new(
                "ENGINE_LABEL_UNRESOLVED",
                format!("Label \"{}\" is not defined.", label),
            ));
        };
        self.ip = index;
        Ok(())
    }

    pub(super) fn call_subroutine(&mut self, label: &str) -> Result<(), ScriptError> {
        let resume = self.ip + 1;
        self.jump_to(label)?;
        self.call_stack.push(resume);
        debug!(label, depth = self.call_stack.len(), "gosub");
        Ok(())
    }

    /// Pop-on-empty is a script defect (control fell into subroutine code
    /// without a call), so it aborts the run rather than degrading to a
    /// no-op.
    pub(super) fn return_from_subroutine(&mut self) -> Result<(), ScriptError> {
        let Some(resume) = self.call_stack.pop() else {
            return Err(ScriptError::new(
                "ENGINE_RETURN_UNDERFLOW",
                "return executed with an empty call stack.",
            ));
        };
        debug!(resume, depth = self.call_stack.len(), "return");
        self.ip = resume;
        Ok(())
    }
}
