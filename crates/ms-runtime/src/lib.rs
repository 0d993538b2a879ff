pub mod dispatch;
pub mod engine;
pub mod environment;
pub mod store;

pub use dispatch::{NullDispatcher, OutputDispatcher, RecordingDispatcher};
pub use engine::{ScriptEngine, ScriptEngineOptions, StepOutcome};
pub use environment::Environment;
pub use store::{MemoryStore, VariableStore};
