use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ms_core::{ScriptError, ScriptValue};

/// External keyed storage that survives the engine instance. Multiple engines
/// may point at one store; writes are last-write-wins and a load reflects
/// whatever the store holds at call time. "Not found" is `Ok(None)`, never an
/// error, so callers can map absence to the empty string.
pub trait VariableStore: Send + Sync {
    fn save_variable(&self, name: &str, value: &ScriptValue) -> Result<(), ScriptError>;
    fn load_variable(&self, name: &str) -> Result<Option<ScriptValue>, ScriptError>;
}

/// Process-local shared store. Clones share the same backing map, so two
/// engine instances handed clones of one `MemoryStore` observe each other's
/// saves exactly like two processes sharing a store file.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, ScriptValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, ScriptValue>>, ScriptError> {
        self.entries
            .lock()
            .map_err(|_| ScriptError::new("STORE_POISONED", "Store mutex was poisoned."))
    }
}

impl VariableStore for MemoryStore {
    fn save_variable(&self, name: &str, value: &ScriptValue) -> Result<(), ScriptError> {
        self.lock()?.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn load_variable(&self, name: &str) -> Result<Option<ScriptValue>, ScriptError> {
        Ok(self.lock()?.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_backing_map() {
        let store = MemoryStore::new();
        let other = store.clone();

        store
            .save_variable("$credits", &ScriptValue::Number(250.0))
            .expect("save should pass");
        assert_eq!(
            other.load_variable("$credits").expect("load should pass"),
            Some(ScriptValue::Number(250.0))
        );
    }

    #[test]
    fn missing_entry_loads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.load_variable("$ghost").expect("load should pass"), None);
    }

    #[test]
    fn later_save_wins() {
        let store = MemoryStore::new();
        store
            .save_variable("$x", &ScriptValue::String("first".to_string()))
            .expect("save should pass");
        store
            .save_variable("$x", &ScriptValue::String("second".to_string()))
            .expect("save should pass");
        assert_eq!(
            store.load_variable("$x").expect("load should pass"),
            Some(ScriptValue::String("second".to_string()))
        );
    }
}
