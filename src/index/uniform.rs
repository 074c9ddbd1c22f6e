use serde_json::Value;

use super::{
    existence::CategorySets,
    files::{self, ModFiles},
};
use crate::pointer::PointerType;

/// A singleton aggregate file and the identifiers it declares.
struct UniformSource {
    file_name: &'static str,
    list: &'static str,
    field: &'static str,
    category: PointerType,
}

const UNIFORM_SOURCES: [UniformSource; 1] = [UniformSource {
    file_name: "weapon.uniforms",
    list: "weapon_tags",
    field: "name",
    category: PointerType::WeaponTag,
}];

/// Identifiers declared inside `*.uniforms` files, kept as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    sets: CategorySets,
}

impl UniformSet {
    pub fn build(files: &ModFiles) -> UniformSet {
        let mut sets = CategorySets::default();

        for source in &UNIFORM_SOURCES {
            let Some(json) = files.named(source.file_name).next().and_then(files::read_json) else {
                continue;
            };
            let Some(Value::Array(entries)) = json.get(source.list) else {
                continue;
            };
            for name in entries
                .iter()
                .filter_map(|entry| entry.get(source.field))
                .filter_map(Value::as_str)
            {
                sets.insert(source.category, name.to_string());
            }
        }

        UniformSet { sets }
    }

    pub fn contains(&self, category: PointerType, identifier: &str) -> bool {
        self.sets.contains(category, identifier)
    }

    pub fn members(&self, category: PointerType) -> impl Iterator<Item = &str> {
        self.sets.members(category)
    }

    pub fn sets(&self) -> &CategorySets {
        &self.sets
    }
}
