use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use super::{
    existence::CategorySets,
    files::{self, ModFiles},
};
use crate::pointer::PointerType;

/// Identifiers registered in `<category>.entity_manifest` files.
///
/// A value can exist on disk and still be missing here; that is reported as a
/// warning, never as an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestRoster {
    sets: CategorySets,
}

impl ManifestRoster {
    pub fn build(files: &ModFiles) -> ManifestRoster {
        let mut sets = CategorySets::default();

        for path in files.with_extension("entity_manifest") {
            let Some(category) = files::stem(path).and_then(|stem| PointerType::from_str(&stem).ok())
            else {
                debug!(path = %path.display(), "manifest for an unknown category");
                continue;
            };

            let Some(Value::Array(ids)) = files::read_json(path).and_then(|json| json.get("ids").cloned())
            else {
                continue;
            };
            for id in ids.iter().filter_map(Value::as_str) {
                sets.insert(category, id.to_lowercase());
            }
        }

        ManifestRoster { sets }
    }

    pub fn contains(&self, category: PointerType, identifier: &str) -> bool {
        self.sets.contains(category, &identifier.to_lowercase())
    }

    /// Registered identifiers of a category, sorted.
    pub fn members(&self, category: PointerType) -> impl Iterator<Item = &str> {
        self.sets.members(category)
    }

    pub fn sets(&self) -> &CategorySets {
        &self.sets
    }
}
