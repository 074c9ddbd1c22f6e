use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use super::files::ModFiles;

/// Extensions of the JSON entity files the path index knows about.
pub const JSON_EXTENSIONS: [&str; 45] = [
    "ability",
    "action_data_source",
    "beam_effect",
    "brush",
    "buff",
    "button_style",
    "cursor",
    "death_sequence",
    "drop_box_style",
    "entity_manifest",
    "exhaust_trail_effect",
    "exotic",
    "flight_pattern",
    "font",
    "formation",
    "gdpr_accept_data",
    "gravity_well_props",
    "gui",
    "label_style",
    "list_box_style",
    "localized_text",
    "mesh_material",
    "named_colors",
    "npc_reward",
    "particle_effect",
    "player_color_group",
    "player_icon",
    "player_portrait",
    "player",
    "playtime_message",
    "reflect_box_style",
    "research_subject",
    "scroll_bar_style",
    "shield_effect",
    "skybox",
    "sound",
    "start_mode",
    "text_entry_box_style",
    "texture_animation",
    "uniforms",
    "unit_item",
    "unit_skin",
    "unit",
    "weapon",
    "welcome_message",
];

pub fn is_json_extension(extension: &str) -> bool {
    JSON_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

/// Identifier → every file path carrying it, in discovery order.
///
/// The identifier is the file name up to its first `.`, lower-cased. The same
/// identifier may back entities of several categories, so paths are never
/// deduplicated across extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathIndex(HashMap<String, Vec<PathBuf>>);

impl PathIndex {
    pub fn build(files: &ModFiles) -> PathIndex {
        let mut index: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for path in files.iter() {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let known = Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(is_json_extension)
                .unwrap_or(false);
            if !known {
                continue;
            }

            let identifier = identifier_of(name);
            index.entry(identifier).or_default().push(path.to_path_buf());
        }
        PathIndex(index)
    }

    /// Every path for `identifier`, regardless of category.
    pub fn get(&self, identifier: &str) -> &[PathBuf] {
        self.0
            .get(&identifier.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Paths for `identifier` whose extension is exactly `category`.
    pub fn get_in_category(&self, identifier: &str, category: &str) -> Vec<&Path> {
        self.get(identifier)
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(category))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = (&String, &Vec<PathBuf>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn identifier_of(file_name: &str) -> String {
    file_name
        .split_once('.')
        .map(|(identifier, _)| identifier)
        .unwrap_or(file_name)
        .to_lowercase()
}
