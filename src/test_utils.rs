//! Shared test utilities.
//!
//! Only compiled when running tests.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::config::Settings;
use crate::engine::EngineContext;

/// Creates a temporary mod directory for testing.
///
/// Returns the `TempDir` handle (keep it alive for the test duration) and
/// the path of a non-hidden `mod` subdirectory. Temp directories can live
/// under hidden paths such as `/tmp/.tmpXXXXX`, which the workspace scan
/// skips, so files must go into the subdirectory.
///
/// ```ignore
/// let (_temp_dir, mod_dir) = create_test_mod_dir();
/// std::fs::write(mod_dir.join("trader.unit"), "{}").unwrap();
/// ```
pub fn create_test_mod_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mod_dir = temp_dir.path().join("mod");
    fs::create_dir(&mod_dir).expect("Failed to create mod subdirectory");
    (temp_dir, mod_dir)
}

/// Game schema directory used by [`test_settings`]: a sibling of the mod
/// directory, so schemas are not indexed as mod files.
pub fn schema_dir_for(mod_dir: &Path) -> PathBuf {
    mod_dir
        .parent()
        .map(|parent| parent.join("schemas"))
        .unwrap_or_else(|| mod_dir.join("schemas"))
}

/// Writes a game schema that [`test_context`] will pick up.
pub fn write_game_schema(mod_dir: &Path, file_name: &str, schema: &Value) {
    let dir = schema_dir_for(mod_dir);
    fs::create_dir_all(&dir).expect("Failed to create schema directory");
    fs::write(dir.join(file_name), schema.to_string()).expect("Failed to write schema");
}

pub fn test_settings(mod_dir: &Path) -> Settings {
    Settings {
        schema_dir: schema_dir_for(mod_dir).to_string_lossy().to_string(),
        ..Settings::default()
    }
}

/// Builds a ready engine context over `mod_dir` with default settings.
pub fn test_context(mod_dir: &Path) -> EngineContext {
    EngineContext::build(mod_dir, test_settings(mod_dir))
}
