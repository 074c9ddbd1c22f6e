//! The entity families handled by the annotator.
//!
//! Each family names the files it applies to, where its base schema comes
//! from, and the patches that turn the base schema into an annotated one.

use serde_json::{json, Value};

use crate::pointer::PointerType;

/// Base schema of the entity manifest family; expanded once per manifest
/// category instead of being listed in [`entity_families`].
pub const MANIFEST_SCHEMA: &str = "entity-manifest-schema.json";

/// Permissive schema used when a base schema is unknown or unreadable.
pub const UNKNOWN_SCHEMA: &str = "unknown-schema.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    /// Shipped with the game; read from the configured schema directory.
    Game(&'static str),
    /// Authored for this server and compiled into the binary.
    Bundled(&'static str),
}

impl SchemaSource {
    pub fn file_name(&self) -> &'static str {
        match self {
            SchemaSource::Game(name) | SchemaSource::Bundled(name) => name,
        }
    }
}

/// An edit applied to a base schema, addressed by JSON Pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Attach a pointer marker to the fragment at the path.
    Pointer(&'static str, PointerType),
    /// Shallow-merge an object into the node at the path.
    Merge(&'static str, Value),
    /// Replace the node at the path.
    Replace(&'static str, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityFamily {
    pub name: &'static str,
    pub file_match: &'static str,
    pub source: SchemaSource,
    pub patches: Vec<Patch>,
}

/// `$defs` markers applied to every family except the entity manifest.
pub const SHARED_DEF_POINTERS: [(&str, PointerType); 22] = [
    ("/$defs/death_sequence_group_definition_ptr", PointerType::DeathSequenceGroup),
    ("/$defs/mesh_material_ptr", PointerType::MeshMaterial),
    ("/$defs/exotic_type", PointerType::Exotic),
    ("/$defs/special_operation_unit_kind", PointerType::SpecialOperationUnitKind),
    ("/$defs/mesh_ptr", PointerType::Mesh),
    ("/$defs/gravity_well_props_definition_ptr", PointerType::GravityWellProps),
    ("/$defs/localized_text_ptr", PointerType::LocalizedText),
    ("/$defs/file_texture_ptr", PointerType::Texture),
    ("/$defs/unit_skin_definition_ptr", PointerType::UnitSkin),
    ("/$defs/npc_reward_definition_ptr", PointerType::NpcReward),
    ("/$defs/particle_effect_definition_ptr", PointerType::ParticleEffect),
    ("/$defs/beam_effect_definition_ptr", PointerType::BeamEffect),
    ("/$defs/action_data_source_definition_ptr", PointerType::ActionDataSource),
    ("/$defs/brush_ptr", PointerType::Brush),
    ("/$defs/unit_definition_ptr", PointerType::Unit),
    ("/$defs/buff_definition_ptr", PointerType::Buff),
    ("/$defs/action_value_id", PointerType::ActionValueId),
    ("/$defs/research_subject_definition_ptr", PointerType::ResearchSubject),
    ("/$defs/ability_definition_ptr", PointerType::Ability),
    ("/$defs/unit_item_definition_ptr", PointerType::UnitItem),
    ("/$defs/buff_unit_factory_modifier_id", PointerType::BuffUnitFactoryModifier),
    ("/$defs/buff_unit_modifier_id", PointerType::BuffUnitModifier),
];

fn plain(name: &'static str, schema: &'static str) -> EntityFamily {
    EntityFamily {
        name,
        file_match: file_match_for(name),
        source: SchemaSource::Game(schema),
        patches: Vec::new(),
    }
}

fn file_match_for(name: &'static str) -> &'static str {
    match name {
        "unit" => "*.unit",
        "weapon" => "*.weapon",
        "unit_skin" => "*.unit_skin",
        "ability" => "*.ability",
        "buff" => "*.buff",
        "action_data_source" => "*.action_data_source",
        "exotic" => "*.exotic",
        "player" => "*.player",
        "research_subject" => "*.research_subject",
        "unit_item" => "*.unit_item",
        "flight_pattern" => "*.flight_pattern",
        "formation" => "*.formation",
        "npc_reward" => "*.npc_reward",
        "start_mode" => "*.start_mode",
        "named_colors" => "*.named_colors",
        "font" => "*.font",
        "localized_text" => "*.localized_text",
        _ => "",
    }
}

/// All non-manifest families, in registration order.
pub fn entity_families() -> Vec<EntityFamily> {
    vec![
        EntityFamily {
            patches: vec![
                Patch::Pointer(
                    "/$defs/unit_skin_definition_group/items/properties/skins",
                    PointerType::UnitSkin,
                ),
                Patch::Merge(
                    "/$defs/unit_skin_definition_group/items/properties/skins",
                    json!({ "uniqueItems": true }),
                ),
                Patch::Pointer(
                    "/$defs/unit_weapons_definition/properties/weapons/items/properties/weapon",
                    PointerType::Weapon,
                ),
            ],
            ..plain("unit", "unit-schema.json")
        },
        EntityFamily {
            patches: vec![
                Patch::Pointer("/properties/name", PointerType::LocalizedText),
                Patch::Pointer("/properties/tags", PointerType::WeaponTag),
                Patch::Merge("/properties/tags", json!({ "uniqueItems": true })),
                Patch::Replace("/properties/bombing_damage", json!({ "type": "number" })),
            ],
            ..plain("weapon", "weapon-schema.json")
        },
        plain("unit_skin", "unit-skin-schema.json"),
        plain("ability", "ability-schema.json"),
        plain("buff", "buff-schema.json"),
        plain("action_data_source", "action-data-source-schema.json"),
        EntityFamily {
            patches: vec![
                Patch::Pointer("/properties/name", PointerType::LocalizedText),
                Patch::Pointer("/properties/description", PointerType::LocalizedText),
                Patch::Pointer("/properties/tooltip_icon", PointerType::Brush),
                Patch::Pointer("/properties/small_icon", PointerType::Brush),
                Patch::Pointer("/properties/large_icon", PointerType::Brush),
                Patch::Pointer("/properties/picture", PointerType::Brush),
            ],
            ..plain("exotic", "exotic-schema.json")
        },
        EntityFamily {
            patches: vec![Patch::Pointer("/properties/buildable_units", PointerType::Unit)],
            ..plain("player", "player-schema.json")
        },
        plain("research_subject", "research-subject-schema.json"),
        plain("unit_item", "unit-item-schema.json"),
        plain("flight_pattern", "flight-pattern-schema.json"),
        plain("formation", "formation-schema.json"),
        plain("npc_reward", "npc-reward-schema.json"),
        EntityFamily {
            source: SchemaSource::Bundled(UNKNOWN_SCHEMA),
            ..plain("start_mode", "")
        },
        EntityFamily {
            name: "galaxy_generator",
            file_match: "galaxy_generator.uniforms",
            source: SchemaSource::Game("galaxy-generator-uniforms-schema.json"),
            patches: vec![Patch::Replace("/properties/fillings", json!({ "type": "object" }))],
        },
        EntityFamily {
            source: SchemaSource::Bundled("named-colors-schema.json"),
            ..plain("named_colors", "")
        },
        EntityFamily {
            source: SchemaSource::Bundled("font-schema.json"),
            patches: vec![Patch::Pointer("/$defs/ttf_ptr", PointerType::TtfFont)],
            ..plain("font", "")
        },
        EntityFamily {
            source: SchemaSource::Bundled("localized-text-schema.json"),
            patches: vec![Patch::Pointer(
                "/patternProperties/.*",
                PointerType::LocalizedText,
            )],
            ..plain("localized_text", "")
        },
    ]
}
