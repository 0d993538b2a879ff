mod lower;
mod source_parse;

pub use lower::lower_statements;
pub use source_parse::parse_source;

use ms_core::{Program, ScriptError};

/// Parse line-oriented script source and lower it to an executable program.
/// All structural defects (bad tokens, unmatched blocks, duplicate labels)
/// surface here; the engine never starts on a program that failed to load.
pub fn compile_source(source: &str) -> Result<Program, ScriptError> {
    let statements = parse_source(source)?;
    lower_statements(&statements)
}
