use std::collections::BTreeMap;
use std::sync::Arc;

use ms_core::{ScriptError, ScriptValue};
use tracing::debug;

use crate::store::VariableStore;

/// The variable table of one interpreter instance. Variables come into being
/// on first write and read as the empty string before that; nothing is ever
/// deleted. Names are matched case-insensitively, and the normalized name is
/// also the key used against the persistent store.
pub struct Environment {
    vars: BTreeMap<String, ScriptValue>,
    store: Option<Arc<dyn VariableStore>>,
}

impl Environment {
    pub fn new(store: Option<Arc<dyn VariableStore>>) -> Self {
        Self {
            vars: BTreeMap::new(),
            store,
        }
    }

    pub fn get(&self, name: &str) -> ScriptValue {
        self.vars
            .get(&normalize(name))
            .cloned()
            .unwrap_or_else(ScriptValue::empty)
    }

    pub fn set(&mut self, name: &str, value: ScriptValue) {
        self.vars.insert(normalize(name), value);
    }

    /// Copy the variable's current value into the persistent store.
    pub fn save(&self, name: &str) -> Result<(), ScriptError> {
        let key = normalize(name);
        let store = self.store.as_ref().ok_or_else(|| {
            ScriptError::new(
                "ENGINE_STORE_UNATTACHED",
                format!("Cannot save \"{}\": no variable store attached.", key),
            )
        })?;

        let value = self.get(&key);
        store.save_variable(&key, &value).map_err(|error| {
            ScriptError::new(
                "ENGINE_STORE_SAVE",
                format!("Saving \"{}\" failed: {}", key, error),
            )
        })?;
        debug!(name = %key, "variable saved to store");
        Ok(())
    }

    /// Overwrite the in-memory value with the store's entry for this name.
    /// A name the store has never seen loads as the empty string; absence is
    /// not failure.
    pub fn load(&mut self, name: &str) -> Result<(), ScriptError> {
        let key = normalize(name);
        let store = self.store.as_ref().ok_or_else(|| {
            ScriptError::new(
                "ENGINE_STORE_UNATTACHED",
                format!("Cannot load \"{}\": no variable store attached.", key),
            )
        })?;

        let loaded = store.load_variable(&key).map_err(|error| {
            ScriptError::new(
                "ENGINE_STORE_LOAD",
                format!("Loading \"{}\" failed: {}", key, error),
            )
        })?;
        debug!(name = %key, found = loaded.is_some(), "variable loaded from store");
        self.vars.insert(key, loaded.unwrap_or_else(ScriptValue::empty));
        Ok(())
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn unset_variable_reads_as_empty_string() {
        let environment = Environment::new(None);
        assert_eq!(environment.get("$never"), ScriptValue::empty());
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut environment = Environment::new(None);
        environment.set("$Counter", ScriptValue::Number(3.0));
        assert_eq!(environment.get("$counter"), ScriptValue::Number(3.0));
        assert_eq!(environment.get("$COUNTER"), ScriptValue::Number(3.0));
    }

    #[test]
    fn save_and_load_round_trip_through_the_store() {
        let store = MemoryStore::new();
        let mut environment = Environment::new(Some(Arc::new(store.clone())));

        environment.set("$hull", ScriptValue::Number(400.0));
        environment.save("$hull").expect("save should pass");

        environment.set("$hull", ScriptValue::Number(0.0));
        environment.load("$hull").expect("load should pass");
        assert_eq!(environment.get("$hull"), ScriptValue::Number(400.0));
    }

    #[test]
    fn load_of_unsaved_name_yields_empty_string() {
        let mut environment = Environment::new(Some(Arc::new(MemoryStore::new())));
        environment.set("$stale", ScriptValue::Number(9.0));
        environment.load("$stale").expect("load should pass");
        assert_eq!(environment.get("$stale"), ScriptValue::empty());
    }

    #[test]
    fn persistence_without_a_store_is_an_error() {
        let mut environment = Environment::new(None);
        let error = environment.save("$x").expect_err("save should fail");
        assert_eq!(error.code, "ENGINE_STORE_UNATTACHED");
        let error = environment.load("$x").expect_err("load should fail");
        assert_eq!(error.code, "ENGINE_STORE_UNATTACHED");
    }
}
