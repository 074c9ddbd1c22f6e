use std::{
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde_json::Value;
use tracing::warn;
use walkdir::WalkDir;

/// Every file under the mod root, in a deterministic order.
#[derive(Debug, Clone, Default)]
pub struct ModFiles {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl ModFiles {
    /// Walks `root`, skipping hidden files and directories.
    pub fn scan(root: &Path) -> ModFiles {
        let files = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect_vec();

        ModFiles {
            root: root.to_path_buf(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Files whose extension is `extension`, ignoring ASCII case.
    pub fn with_extension<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = &'a Path> {
        self.iter().filter(move |path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
    }

    /// Files called exactly `file_name`.
    pub fn named<'a>(&'a self, file_name: &'a str) -> impl Iterator<Item = &'a Path> {
        self.iter()
            .filter(move |path| path.file_name().and_then(|name| name.to_str()) == Some(file_name))
    }
}

/// Lower-cased file name without its last extension.
pub fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
}

/// Lower-cased file name, extension included.
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_lowercase)
}

/// Reads and parses a JSON file, logging instead of failing.
pub fn read_json(path: &Path) -> Option<Value> {
    let text = fs::read_to_string(path)
        .map_err(|err| warn!(path = %path.display(), "unreadable file: {}", err))
        .ok()?;
    serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|err| warn!(path = %path.display(), "malformed JSON: {}", err))
        .ok()
}
