use thiserror::Error;

/// Error currency for every layer of the workspace. `code` is a stable,
/// namespaced identifier (`COMPILE_*`, `ENGINE_*`, `STORE_*`, `CLI_*`);
/// `line` is the 1-based source line when the failure can be pinned to one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ScriptError {
    pub code: String,
    pub message: String,
    pub line: Option<usize>,
}

impl ScriptError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(code: impl Into<String>, message: impl Into<String>, line: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: Some(line),
        }
    }
}
