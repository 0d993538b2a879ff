use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ms_core::{ScriptError, ScriptValue};
use ms_runtime::VariableStore;

use crate::{map_cli_state_invalid, map_cli_state_read, map_cli_state_write};

/// Variable store backed by one JSON object file. Every save re-reads the
/// file, updates the entry, and writes the whole map back, so concurrent
/// writers degrade to last-write-wins — the sharing contract the engine
/// assumes. A missing file reads as an empty store.
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, ScriptValue>, ScriptError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(map_cli_state_read)?;
        serde_json::from_str(&raw).map_err(map_cli_state_invalid)
    }
}

impl VariableStore for JsonFileStore {
    fn save_variable(&self, name: &str, value: &ScriptValue) -> Result<(), ScriptError> {
        let mut entries = self.read_entries()?;
        entries.insert(name.to_string(), value.clone());

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(map_cli_state_write)?;

        let payload =
            serde_json::to_string_pretty(&entries).expect("state map should serialize");
        fs::write(&self.path, payload).map_err(map_cli_state_write)
    }

    fn load_variable(&self, name: &str) -> Result<Option<ScriptValue>, ScriptError> {
        Ok(self.read_entries()?.get(name).cloned())
    }
}

#[cfg(test)]
mod state_store_tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips_both_tags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("state.json"));

        store
            .save_variable("$credits", &ScriptValue::Number(1200.0))
            .expect("save should pass");
        store
            .save_variable("$ship", &ScriptValue::String("corvette".to_string()))
            .expect("save should pass");

        assert_eq!(
            store.load_variable("$credits").expect("load should pass"),
            Some(ScriptValue::Number(1200.0))
        );
        assert_eq!(
            store.load_variable("$ship").expect("load should pass"),
            Some(ScriptValue::String("corvette".to_string()))
        );
    }

    #[test]
    fn missing_file_reads_as_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("never-written.json"));
        assert_eq!(store.load_variable("$x").expect("load should pass"), None);
    }

    #[test]
    fn two_stores_on_one_path_see_each_others_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shared.json");

        let writer = JsonFileStore::new(&path);
        let reader = JsonFileStore::new(&path);

        writer
            .save_variable("$flag", &ScriptValue::String("up".to_string()))
            .expect("save should pass");
        assert_eq!(
            reader.load_variable("$flag").expect("load should pass"),
            Some(ScriptValue::String("up".to_string()))
        );
    }

    #[test]
    fn corrupt_state_file_is_a_distinct_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").expect("write");

        let store = JsonFileStore::new(&path);
        let error = store.load_variable("$x").expect_err("load should fail");
        assert_eq!(error.code, "CLI_STATE_INVALID");
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/state.json");

        let store = JsonFileStore::new(&path);
        store
            .save_variable("$x", &ScriptValue::Number(1.0))
            .expect("save should pass");
        assert!(path.exists());
    }
}
