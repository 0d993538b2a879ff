use std::cmp::Ordering;

use ms_core::{CompareOp, Expr, ScriptError, ScriptValue};

use super::ScriptEngine;

impl ScriptEngine {
    pub(super) fn eval_expr(&self, expr: &Expr) -> Result<ScriptValue, ScriptError> {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Var { name } => Ok(self.environment.get(name)),
            Expr::Concat { parts } => Ok(ScriptValue::String(self.render_parts(parts)?)),
            Expr::Compare { op, lhs, rhs } => self.eval_compare(*op, lhs, rhs),
        }
    }

    pub(super) fn render_parts(&self, parts: &[Expr]) -> Result<String, ScriptError> {
        let mut output = String::new();
        for part in parts {
            output.push_str(&self.eval_expr(part)?.render());
        }
        Ok(output)
    }

    /// Numeric comparison when both sides coerce to numbers, byte-wise text
    /// comparison otherwise. The result is number 1 or 0 so it plugs into
    /// the truthiness rules.
    fn eval_compare(
        &self,
        op: CompareOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<ScriptValue, ScriptError> {
        let lhs = self.eval_expr(lhs)?;
        let rhs = self.eval_expr(rhs)?;

        let ordering = match (lhs.as_number(), rhs.as_number()) {
            // partial_cmp only fails on NaN, which arithmetic overflow can
            // manufacture; fall back to text ordering rather than panic.
            (Ok(left), Ok(right)) => match left.partial_cmp(&right) {
                Some(ordering) => ordering,
                None => lhs.render().cmp(&rhs.render()),
            },
            _ => lhs.render().cmp(&rhs.render()),
        };

        let matched = match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        };
        Ok(ScriptValue::Number(if matched { 1.0 } else { 0.0 }))
    }
}
