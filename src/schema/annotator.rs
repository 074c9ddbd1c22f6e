//! Builds the annotated schema set.
//!
//! Every call to [`SchemaAnnotator::configure`] reloads the base schemas, so
//! running it twice yields identical configurations.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::{json, Map, Value};
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use super::{
    families::{
        entity_families, EntityFamily, Patch, SchemaSource, MANIFEST_SCHEMA, SHARED_DEF_POINTERS,
        UNKNOWN_SCHEMA,
    },
    fragment::AnnotatedSchema,
};
use crate::pointer::PointerType;

const BUNDLED_SCHEME: &str = "jabberwocky://schemas-dev";
const GAME_SCHEME: &str = "jabberwocky://schemas";

/// Schemas authored for this server.
pub fn bundled_schema(file_name: &str) -> Option<&'static str> {
    match file_name {
        "entity-manifest-schema.json" => Some(include_str!(
            "../../resources/schemas-dev/entity-manifest-schema.json"
        )),
        "localized-text-schema.json" => Some(include_str!(
            "../../resources/schemas-dev/localized-text-schema.json"
        )),
        "font-schema.json" => Some(include_str!("../../resources/schemas-dev/font-schema.json")),
        "named-colors-schema.json" => Some(include_str!(
            "../../resources/schemas-dev/named-colors-schema.json"
        )),
        "unknown-schema.json" => Some(include_str!(
            "../../resources/schemas-dev/unknown-schema.json"
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfiguration {
    /// `*.ext` matches by suffix, anything else by exact file name.
    pub file_match: Vec<String>,
    pub uri: String,
    pub schema: Arc<AnnotatedSchema>,
}

impl SchemaConfiguration {
    pub fn matches(&self, file_name: &str) -> bool {
        self.file_match.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => file_name.ends_with(suffix),
            None => file_name == pattern,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SchemaAnnotator {
    schema_dir: PathBuf,
}

impl SchemaAnnotator {
    pub fn new(schema_dir: impl Into<PathBuf>) -> SchemaAnnotator {
        SchemaAnnotator {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// One configuration per family, followed by one manifest configuration
    /// per manifest category.
    pub fn configure(&self) -> Vec<SchemaConfiguration> {
        let mut configurations: Vec<SchemaConfiguration> = entity_families()
            .iter()
            .map(|family| self.configure_family(family))
            .collect();

        configurations.extend(
            PointerType::MANIFEST_CATEGORIES
                .iter()
                .map(|category| self.configure_manifest(*category)),
        );

        debug!(count = configurations.len(), "configured schemas");
        configurations
    }

    fn configure_family(&self, family: &EntityFamily) -> SchemaConfiguration {
        let mut raw = self.load_base(family.source);
        let mut markers = Vec::new();

        for patch in &family.patches {
            apply_patch(&mut raw, patch, &mut markers);
        }
        for (path, pointer) in SHARED_DEF_POINTERS {
            apply_patch(&mut raw, &Patch::Pointer(path, pointer), &mut markers);
        }

        SchemaConfiguration {
            file_match: vec![family.file_match.to_string()],
            uri: self.uri_for(family.source, family.source.file_name()),
            schema: Arc::new(AnnotatedSchema::compile(raw, &markers)),
        }
    }

    fn configure_manifest(&self, category: PointerType) -> SchemaConfiguration {
        let source = SchemaSource::Bundled(MANIFEST_SCHEMA);
        let mut raw = self.load_base(source);
        let mut markers = Vec::new();
        apply_patch(&mut raw, &Patch::Pointer("/properties/ids", category), &mut markers);

        let stem = MANIFEST_SCHEMA.trim_end_matches(".json");
        SchemaConfiguration {
            file_match: vec![format!("{}.entity_manifest", category)],
            uri: self.uri_for(source, &format!("{}-{}.json", stem, category)),
            schema: Arc::new(AnnotatedSchema::compile(raw, &markers)),
        }
    }

    fn uri_for(&self, source: SchemaSource, file_name: &str) -> String {
        match source {
            SchemaSource::Game(_) => Url::from_file_path(self.schema_dir.join(file_name))
                .map(|url| url.to_string())
                .unwrap_or_else(|_| format!("{}/{}", GAME_SCHEME, file_name)),
            SchemaSource::Bundled(_) => format!("{}/{}", BUNDLED_SCHEME, file_name),
        }
    }

    fn load_base(&self, source: SchemaSource) -> Value {
        let loaded = match source {
            SchemaSource::Game(name) => {
                let path = self.schema_dir.join(name);
                match fs::read_to_string(&path) {
                    Ok(content) if !content.trim().is_empty() => {
                        serde_json::from_str(&content).map_err(|err| err.to_string())
                    }
                    Ok(_) => Err("empty schema file".to_string()),
                    Err(err) => Err(err.to_string()),
                }
                .map_err(|err| {
                    warn!(path = %path.display(), "falling back to the unknown schema: {}", err);
                })
                .ok()
            }
            SchemaSource::Bundled(name) => bundled_schema(name)
                .and_then(|content| serde_json::from_str(content).ok()),
        };

        loaded.unwrap_or_else(unknown_schema)
    }
}

fn unknown_schema() -> Value {
    bundled_schema(UNKNOWN_SCHEMA)
        .and_then(|content| serde_json::from_str(content).ok())
        .unwrap_or_else(|| json!({}))
}

fn apply_patch(raw: &mut Value, patch: &Patch, markers: &mut Vec<(String, PointerType)>) {
    match patch {
        Patch::Pointer(path, pointer) => {
            create_path(raw, path);
            markers.push((path.to_string(), *pointer));
        }
        Patch::Merge(path, Value::Object(source)) => {
            create_path(raw, path);
            if let Some(node) = raw.pointer_mut(path) {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                if let Value::Object(target) = node {
                    for (key, value) in source {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Patch::Merge(path, _) => warn!(path = %path, "ignoring merge patch without an object"),
        Patch::Replace(path, value) => {
            create_path(raw, path);
            if let Some(node) = raw.pointer_mut(path) {
                *node = value.clone();
            }
        }
    }
}

/// Makes sure every node along a JSON Pointer exists, creating missing ones
/// as `{}`. A scalar in the way is replaced by an object.
fn create_path(root: &mut Value, path: &str) {
    let mut prefix = String::new();
    for token in path.split('/').skip(1) {
        let parent = prefix.clone();
        prefix.push('/');
        prefix.push_str(token);
        if root.pointer(&prefix).is_some() {
            continue;
        }

        let key = token.replace("~1", "/").replace("~0", "~");
        if let Some(node) = root.pointer_mut(&parent) {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                map.insert(key, json!({}));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_utils::create_test_mod_dir;

    fn write_weapon_schema(dir: &Path) {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "bombing_damage": { "$ref": "#/$defs/does_not_exist" }
            },
            "$defs": {
                "mesh_ptr": { "type": "string" }
            }
        });
        fs::write(dir.join("weapon-schema.json"), schema.to_string()).unwrap();
    }

    fn find<'a>(configs: &'a [SchemaConfiguration], file_name: &str) -> &'a SchemaConfiguration {
        configs.iter().find(|c| c.matches(file_name)).unwrap()
    }

    #[test]
    fn test_weapon_family_is_annotated() {
        let (_temp, dir) = create_test_mod_dir();
        write_weapon_schema(&dir);

        let configs = SchemaAnnotator::new(&dir).configure();
        let weapon = &find(&configs, "laser.weapon").schema;

        let tags = weapon.fragment_at("/properties/tags").unwrap();
        assert_eq!(weapon.fragment(tags).pointer, PointerType::WeaponTag);
        assert_eq!(weapon.raw["properties"]["tags"]["uniqueItems"], json!(true));
        assert_eq!(weapon.raw["properties"]["bombing_damage"], json!({ "type": "number" }));

        let mesh = weapon.fragment_at("/$defs/mesh_ptr").unwrap();
        assert_eq!(weapon.fragment(mesh).pointer, PointerType::Mesh);
    }

    #[test]
    fn test_missing_patch_targets_are_created() {
        let (_temp, dir) = create_test_mod_dir();
        write_weapon_schema(&dir);

        let configs = SchemaAnnotator::new(&dir).configure();
        let weapon = &find(&configs, "laser.weapon").schema;

        // Shared definitions absent from the base schema still get a marker.
        let brush = weapon.fragment_at("/$defs/brush_ptr").unwrap();
        assert_eq!(weapon.fragment(brush).pointer, PointerType::Brush);
    }

    #[test]
    fn test_missing_game_schema_falls_back_to_unknown() {
        let (_temp, dir) = create_test_mod_dir();
        let configs = SchemaAnnotator::new(&dir).configure();
        let unit = &find(&configs, "trader.unit").schema;

        assert!(unit.raw.get("properties").is_none());
        let skins = unit
            .fragment_at("/$defs/unit_skin_definition_group/items/properties/skins")
            .unwrap();
        assert_eq!(unit.fragment(skins).pointer, PointerType::UnitSkin);
    }

    #[test]
    fn test_manifest_is_expanded_per_category() {
        let (_temp, dir) = create_test_mod_dir();
        let configs = SchemaAnnotator::new(&dir).configure();

        let manifests: Vec<_> = configs
            .iter()
            .filter(|c| c.file_match[0].ends_with(".entity_manifest"))
            .collect();
        assert_eq!(manifests.len(), PointerType::MANIFEST_CATEGORIES.len());

        let weapon = find(&configs, "weapon.entity_manifest");
        assert_eq!(
            weapon.uri,
            "jabberwocky://schemas-dev/entity-manifest-schema-weapon.json"
        );
        let ids = weapon.schema.fragment_at("/properties/ids").unwrap();
        assert_eq!(weapon.schema.fragment(ids).pointer, PointerType::Weapon);

        let unit = find(&configs, "unit.entity_manifest");
        let ids = unit.schema.fragment_at("/properties/ids").unwrap();
        assert_eq!(unit.schema.fragment(ids).pointer, PointerType::Unit);

        // Manifests do not receive the shared definitions.
        assert!(unit.schema.fragment_at("/$defs/brush_ptr").is_none());
    }

    #[test]
    fn test_localized_text_pattern_is_annotated() {
        let (_temp, dir) = create_test_mod_dir();
        let configs = SchemaAnnotator::new(&dir).configure();
        let text = &find(&configs, "en.localized_text").schema;

        let root = text.fragment(text.root());
        let pattern = &root.pattern_properties[0];
        assert_eq!(pattern.pattern, ".*");
        assert_eq!(text.fragment(pattern.fragment).pointer, PointerType::LocalizedText);
    }

    #[test]
    fn test_configure_is_idempotent() {
        let (_temp, dir) = create_test_mod_dir();
        write_weapon_schema(&dir);

        let annotator = SchemaAnnotator::new(&dir);
        let first = annotator.configure();
        let second = annotator.configure();
        assert_eq!(first, second);

        // No marker leaks into the raw schema handed to structural validation.
        for config in &second {
            assert!(!config.schema.raw.to_string().contains("\"pointer\""));
        }
    }

    #[test]
    fn test_file_match_rules() {
        let (_temp, dir) = create_test_mod_dir();
        let configs = SchemaAnnotator::new(&dir).configure();

        let galaxy = find(&configs, "galaxy_generator.uniforms");
        assert!(!galaxy.matches("weapon.uniforms"));
        assert!(configs.iter().all(|c| !c.matches("readme.md")));
    }
}
