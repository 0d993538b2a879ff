pub mod error;
pub mod program;
pub mod value;

pub use error::ScriptError;
pub use program::*;
pub use value::*;
