use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// Runtime value: exactly one of the two tags is active. Values are replaced
/// wholesale on every variable write, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Number(f64),
    String(String),
}

impl ScriptValue {
    pub fn empty() -> Self {
        Self::String(String::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Canonical text form. Integral numbers render without a fractional
    /// part so a counter stepped from `1` echoes as `"1"`, not `"1.0"`.
    pub fn render(&self) -> String {
        match self {
            Self::String(text) => text.clone(),
            Self::Number(number) => {
                if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
                    format!("{}", *number as i64)
                } else {
                    format!("{}", number)
                }
            }
        }
    }

    /// Numeric coercion: numbers pass through, strings must parse as a
    /// base-10 real number. Non-finite results count as unparseable.
    pub fn as_number(&self) -> Result<f64, ScriptError> {
        match self {
            Self::Number(number) => Ok(*number),
            Self::String(text) => {
                let parsed = text.trim().parse::<f64>().ok().filter(|n| n.is_finite());
                parsed.ok_or_else(|| {
                    ScriptError::new(
                        "ENGINE_OPERAND_NOT_NUMERIC",
                        format!("Value \"{}\" is not a number.", text),
                    )
                })
            }
        }
    }

    /// Falsy is numeric zero or the empty string; every other value,
    /// including negative numbers and non-numeric text, is truthy. Strings
    /// are duck-typed here: text that parses as the number zero tests falsy
    /// exactly like the number itself.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(number) => *number != 0.0,
            Self::String(text) => {
                if text.is_empty() {
                    return false;
                }
                match text.trim().parse::<f64>() {
                    Ok(number) => number != 0.0,
                    Err(_) => true,
                }
            }
        }
    }
}
