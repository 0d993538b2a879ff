use ms_core::{ArithOp, Instruction, Op, ScriptError, ScriptValue};
use tracing::debug;

use crate::dispatch::OutputDispatcher;

use super::ScriptEngine;

impl ScriptEngine {
    pub(super) fn execute(
        &mut self,
        instruction: &Instruction,
        dispatcher: &mut dyn OutputDispatcher,
    ) -> Result<(), ScriptError> {
        match &instruction.op {
            Op::Echo { parts } => {
                let text = self.render_parts(parts)?;
                dispatcher.display(&text);
                self.ip += 1;
            }
            Op::Send { parts } => {
                let text = self.render_parts(parts)?;
                dispatcher.transmit(&text);
                self.ip += 1;
            }
            Op::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                self.environment.set(name, value);
                self.ip += 1;
            }
            Op::Arith { op, name, operand } => {
                let current = self.environment.get(name).as_number()?;
                let operand = self.eval_expr(operand)?.as_number()?;
                let result = match op {
                    ArithOp::Add => current + operand,
                    ArithOp::Subtract => current - operand,
                    ArithOp::Multiply => current * operand,
                };
                self.environment.set(name, ScriptValue::Number(result));
                self.ip += 1;
            }
            Op::Goto { label } => self.jump_to(label)?,
            Op::Gosub { label } => self.call_subroutine(label)?,
            Op::Return => self.return_from_subroutine()?,
            Op::BranchFalsy { test, label } => {
                if self.eval_expr(test)?.is_truthy() {
                    self.ip += 1;
                } else {
                    self.jump_to(label)?;
                }
            }
            Op::SaveVar { name } => {
                self.environment.save(name)?;
                self.ip += 1;
            }
            Op::LoadVar { name } => {
                self.environment.load(name)?;
                self.ip += 1;
            }
            Op::Halt => {
                debug!(ip = self.ip, "halt");
                self.halted = true;
            }
        }
        Ok(())
    }
}
