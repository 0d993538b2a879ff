use std::fs;
use std::path::{Path, PathBuf};

use ms_core::ScriptError;
use walkdir::WalkDir;

use crate::map_cli_source_read;

pub(crate) fn read_script_source(path: &Path) -> Result<String, ScriptError> {
    if !path.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("Script does not exist: {}", path.display()),
        ));
    }
    fs::read_to_string(path).map_err(map_cli_source_read)
}

/// All `.mscript` files under `root`, sorted for stable output.
pub(crate) fn find_scripts(root: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    if !root.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("Directory does not exist: {}", root.display()),
        ));
    }
    if !root.is_dir() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("Not a directory: {}", root.display()),
        ));
    }

    let mut scripts: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|extension| extension == "mscript")
                .unwrap_or(false)
        })
        .collect();
    scripts.sort();
    Ok(scripts)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;

    #[test]
    fn read_script_source_reports_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = read_script_source(&dir.path().join("nope.mscript"))
            .expect_err("missing file should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");
    }

    #[test]
    fn find_scripts_filters_by_extension_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).expect("nested dir");
        fs::write(dir.path().join("b.mscript"), "halt\n").expect("write");
        fs::write(nested.join("a.mscript"), "halt\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let scripts = find_scripts(dir.path()).expect("scan should pass");
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].ends_with("b.mscript") || scripts[0].ends_with("nested/a.mscript"));
        assert!(scripts.iter().all(|path| {
            path.extension().map(|e| e == "mscript").unwrap_or(false)
        }));
    }

    #[test]
    fn find_scripts_validates_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = find_scripts(&dir.path().join("missing")).expect_err("missing should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");

        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").expect("write");
        let error = find_scripts(&file).expect_err("file root should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_DIR");
    }
}
