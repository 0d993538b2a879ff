use std::fmt::Display;

use ms_core::ScriptError;

fn map_error(code: &'static str, error: impl Display) -> ScriptError {
    ScriptError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ScriptError) -> i32 {
    match error.line {
        Some(line) => eprintln!("error[{}] line {}: {}", error.code, line, error.message),
        None => eprintln!("error[{}]: {}", error.code, error.message),
    }
    exit_code_for(&error)
}

/// Load errors, runtime errors, and host errors get distinct exit codes so
/// wrappers can tell a broken script from a broken run.
pub(crate) fn exit_code_for(error: &ScriptError) -> i32 {
    if error.code.starts_with("COMPILE_") {
        2
    } else if error.code.starts_with("ENGINE_") {
        3
    } else {
        1
    }
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> ScriptError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> ScriptError {
    map_error("CLI_STATE_INVALID", error)
}

pub(crate) fn map_cli_session_io(error: std::io::Error) -> ScriptError {
    map_error("CLI_SESSION_IO", error)
}
