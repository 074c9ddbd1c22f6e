use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Deref,
};

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};

use super::files::{self, ModFiles};
use crate::pointer::PointerType;

/// Category → identifiers, shared by the existence, manifest and uniform
/// indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySets(BTreeMap<PointerType, BTreeSet<String>>);

impl Deref for CategorySets {
    type Target = BTreeMap<PointerType, BTreeSet<String>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<BTreeMap<PointerType, BTreeSet<String>>> for CategorySets {
    fn from(value: BTreeMap<PointerType, BTreeSet<String>>) -> Self {
        CategorySets(value)
    }
}

impl CategorySets {
    pub fn insert(&mut self, category: PointerType, identifier: String) {
        self.0.entry(category).or_default().insert(identifier);
    }

    /// Replaces a whole category.
    pub fn set(&mut self, category: PointerType, identifiers: BTreeSet<String>) {
        self.0.insert(category, identifiers);
    }

    /// Exact lookup. A category that was never populated contains nothing.
    pub fn contains(&self, category: PointerType, identifier: &str) -> bool {
        self.0
            .get(&category)
            .map(|set| set.contains(identifier))
            .unwrap_or(false)
    }

    pub fn members(&self, category: PointerType) -> impl Iterator<Item = &str> {
        self.0
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn total(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }
}

struct FileBacked {
    category: PointerType,
    extension: &'static str,
    /// Also register `name.ext` next to the bare stem.
    with_extension: bool,
}

const fn backed(category: PointerType, extension: &'static str) -> FileBacked {
    FileBacked {
        category,
        extension,
        with_extension: false,
    }
}

const FILE_BACKED: [FileBacked; 22] = [
    backed(PointerType::Player, "player"),
    FileBacked {
        category: PointerType::Brush,
        extension: "png",
        with_extension: true,
    },
    FileBacked {
        category: PointerType::Texture,
        extension: "dds",
        with_extension: true,
    },
    backed(PointerType::Mesh, "mesh"),
    backed(PointerType::MeshMaterial, "mesh_material"),
    backed(PointerType::TtfFont, "ttf"),
    backed(PointerType::Unit, "unit"),
    backed(PointerType::UnitSkin, "unit_skin"),
    backed(PointerType::UnitItem, "unit_item"),
    backed(PointerType::Weapon, "weapon"),
    backed(PointerType::Ability, "ability"),
    backed(PointerType::Buff, "buff"),
    backed(PointerType::ActionDataSource, "action_data_source"),
    backed(PointerType::ResearchSubject, "research_subject"),
    backed(PointerType::StartMode, "start_mode"),
    backed(PointerType::NpcReward, "npc_reward"),
    backed(PointerType::Formation, "formation"),
    backed(PointerType::FlightPattern, "flight_pattern"),
    backed(PointerType::Exotic, "exotic"),
    backed(PointerType::ParticleEffect, "particle_effect"),
    backed(PointerType::BeamEffect, "beam_effect"),
    backed(PointerType::GravityWellProps, "gravity_well_props"),
];

/// Identifiers known to exist on disk, per category.
///
/// File-backed categories hold lower-cased file stems. `localized_text` holds
/// the keys of the active language's `<language>.localized_text` file, with
/// their case preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistenceCache {
    sets: CategorySets,
}

impl ExistenceCache {
    pub fn build(files: &ModFiles, language: &str) -> ExistenceCache {
        let mut sets: CategorySets = FILE_BACKED
            .par_iter()
            .map(|backed| {
                let mut set = BTreeSet::new();
                for path in files.with_extension(backed.extension) {
                    if let Some(stem) = files::stem(path) {
                        set.insert(stem);
                    }
                    if backed.with_extension {
                        if let Some(name) = files::file_name(path) {
                            set.insert(name);
                        }
                    }
                }
                (backed.category, set)
            })
            .collect::<BTreeMap<_, _>>()
            .into();

        sets.set(PointerType::LocalizedText, localization_keys(files, language));
        debug!(total = sets.total(), "existence cache built");
        ExistenceCache { sets }
    }

    /// Whether the category has a source of identifiers at all. Categories
    /// without one are never validated.
    pub fn tracks(category: PointerType) -> bool {
        category == PointerType::LocalizedText
            || FILE_BACKED.iter().any(|backed| backed.category == category)
    }

    pub fn contains(&self, category: PointerType, identifier: &str) -> bool {
        match category {
            PointerType::LocalizedText => self.sets.contains(category, identifier),
            _ => self.sets.contains(category, &identifier.to_lowercase()),
        }
    }

    pub fn members(&self, category: PointerType) -> impl Iterator<Item = &str> {
        self.sets.members(category)
    }

    pub fn sets(&self) -> &CategorySets {
        &self.sets
    }
}

fn localization_keys(files: &ModFiles, language: &str) -> BTreeSet<String> {
    let file_name = format!("{}.localized_text", language);
    let Some(path) = files.named(&file_name).next() else {
        warn!(language, "no {} in the workspace", file_name);
        return BTreeSet::new();
    };

    match files::read_json(path) {
        Some(Value::Object(entries)) => entries.keys().cloned().collect(),
        _ => BTreeSet::new(),
    }
}
