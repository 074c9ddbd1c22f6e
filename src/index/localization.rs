use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use serde_json::Value;

use super::files::{self, ModFiles};

#[derive(Debug, Clone, Default, PartialEq)]
struct LanguageFile {
    path: PathBuf,
    entries: HashMap<String, String>,
}

/// Every `<language>.localized_text` file: language → key → text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalizationTable(BTreeMap<String, LanguageFile>);

impl LocalizationTable {
    pub fn build(files: &ModFiles) -> LocalizationTable {
        let mut languages = BTreeMap::new();
        for path in files.with_extension("localized_text") {
            let Some(language) = files::stem(path) else {
                continue;
            };
            if languages.contains_key(&language) {
                continue;
            }
            let entries = match files::read_json(path) {
                Some(Value::Object(entries)) => entries
                    .into_iter()
                    .filter_map(|(key, value)| value.as_str().map(|text| (key, text.to_string())))
                    .collect(),
                _ => HashMap::new(),
            };
            languages.insert(
                language,
                LanguageFile {
                    path: path.to_path_buf(),
                    entries,
                },
            );
        }
        LocalizationTable(languages)
    }

    pub fn get(&self, language: &str, key: &str) -> Option<&str> {
        self.0
            .get(&language.to_lowercase())?
            .entries
            .get(key)
            .map(String::as_str)
    }

    pub fn path(&self, language: &str) -> Option<&Path> {
        self.0
            .get(&language.to_lowercase())
            .map(|file| file.path.as_path())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn entry_count(&self, language: &str) -> usize {
        self.0
            .get(&language.to_lowercase())
            .map(|file| file.entries.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_utils::create_test_mod_dir;

    #[test]
    fn test_every_language_is_loaded() {
        let (_temp, dir) = create_test_mod_dir();
        fs::write(dir.join("en.localized_text"), r#"{"greeting": "Hello"}"#).unwrap();
        fs::write(dir.join("de.localized_text"), r#"{"greeting": "Hallo"}"#).unwrap();

        let table = LocalizationTable::build(&ModFiles::scan(&dir));
        assert_eq!(table.get("en", "greeting"), Some("Hello"));
        assert_eq!(table.get("de", "greeting"), Some("Hallo"));
        assert_eq!(table.get("fr", "greeting"), None);
        assert_eq!(table.languages().collect::<Vec<_>>(), vec!["de", "en"]);
        assert_eq!(table.path("en"), Some(dir.join("en.localized_text").as_path()));
    }

    #[test]
    fn test_non_string_entries_are_skipped() {
        let (_temp, dir) = create_test_mod_dir();
        fs::write(dir.join("en.localized_text"), r#"{"a": "x", "b": 3}"#).unwrap();

        let table = LocalizationTable::build(&ModFiles::scan(&dir));
        assert_eq!(table.entry_count("en"), 1);
        assert_eq!(table.get("en", "b"), None);
    }
}
