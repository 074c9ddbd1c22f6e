//! The closed registry of semantic reference categories.
//!
//! A [`PointerType`] says that a JSON string value is a cross-reference into
//! another identifier namespace: a weapon file, a texture, a localization key,
//! a tag declared in a uniforms file. Every schema annotation and every index
//! category key is one of these tags; [`PointerType::None`] means "no
//! semantic reference".

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerType {
    #[default]
    None,
    Ability,
    ActionDataSource,
    ActionValueId,
    BeamEffect,
    Brush,
    Buff,
    BuffUnitFactoryModifier,
    BuffUnitModifier,
    DeathSequenceGroup,
    Exotic,
    FlightPattern,
    Formation,
    GravityWellProps,
    LocalizedText,
    Mesh,
    MeshMaterial,
    NpcReward,
    ParticleEffect,
    Player,
    ResearchSubject,
    SpecialOperationUnitKind,
    StartMode,
    Texture,
    TtfFont,
    Unit,
    UnitItem,
    UnitSkin,
    Weapon,
    WeaponTag,
}

impl PointerType {
    pub const ALL: [PointerType; 30] = [
        PointerType::None,
        PointerType::Ability,
        PointerType::ActionDataSource,
        PointerType::ActionValueId,
        PointerType::BeamEffect,
        PointerType::Brush,
        PointerType::Buff,
        PointerType::BuffUnitFactoryModifier,
        PointerType::BuffUnitModifier,
        PointerType::DeathSequenceGroup,
        PointerType::Exotic,
        PointerType::FlightPattern,
        PointerType::Formation,
        PointerType::GravityWellProps,
        PointerType::LocalizedText,
        PointerType::Mesh,
        PointerType::MeshMaterial,
        PointerType::NpcReward,
        PointerType::ParticleEffect,
        PointerType::Player,
        PointerType::ResearchSubject,
        PointerType::SpecialOperationUnitKind,
        PointerType::StartMode,
        PointerType::Texture,
        PointerType::TtfFont,
        PointerType::Unit,
        PointerType::UnitItem,
        PointerType::UnitSkin,
        PointerType::Weapon,
        PointerType::WeaponTag,
    ];

    /// Categories that own an `<category>.entity_manifest` file. The schema
    /// annotator emits one manifest schema per entry.
    pub const MANIFEST_CATEGORIES: [PointerType; 14] = [
        PointerType::Weapon,
        PointerType::UnitSkin,
        PointerType::UnitItem,
        PointerType::Unit,
        PointerType::StartMode,
        PointerType::ResearchSubject,
        PointerType::Player,
        PointerType::NpcReward,
        PointerType::Formation,
        PointerType::FlightPattern,
        PointerType::Exotic,
        PointerType::Buff,
        PointerType::ActionDataSource,
        PointerType::Ability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PointerType::None => "none",
            PointerType::Ability => "ability",
            PointerType::ActionDataSource => "action_data_source",
            PointerType::ActionValueId => "action_value_id",
            PointerType::BeamEffect => "beam_effect",
            PointerType::Brush => "brush",
            PointerType::Buff => "buff",
            PointerType::BuffUnitFactoryModifier => "buff_unit_factory_modifier",
            PointerType::BuffUnitModifier => "buff_unit_modifier",
            PointerType::DeathSequenceGroup => "death_sequence_group",
            PointerType::Exotic => "exotic",
            PointerType::FlightPattern => "flight_pattern",
            PointerType::Formation => "formation",
            PointerType::GravityWellProps => "gravity_well_props",
            PointerType::LocalizedText => "localized_text",
            PointerType::Mesh => "mesh",
            PointerType::MeshMaterial => "mesh_material",
            PointerType::NpcReward => "npc_reward",
            PointerType::ParticleEffect => "particle_effect",
            PointerType::Player => "player",
            PointerType::ResearchSubject => "research_subject",
            PointerType::SpecialOperationUnitKind => "special_operation_unit_kind",
            PointerType::StartMode => "start_mode",
            PointerType::Texture => "texture",
            PointerType::TtfFont => "ttf_font",
            PointerType::Unit => "unit",
            PointerType::UnitItem => "unit_item",
            PointerType::UnitSkin => "unit_skin",
            PointerType::Weapon => "weapon",
            PointerType::WeaponTag => "weapon_tag",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == PointerType::None
    }

    /// Whether values of this category must also be registered in the
    /// category's entity manifest.
    pub fn has_manifest_roster(&self) -> bool {
        matches!(
            self,
            PointerType::UnitSkin | PointerType::Unit | PointerType::Weapon | PointerType::UnitItem
        )
    }

    /// The entity category of a document, taken from its extension.
    ///
    /// `trader_frigate.unit` is a `unit`, `en.localized_text` is a
    /// `localized_text`; anything unrecognized is `none`.
    pub fn from_file_name(file_name: &str) -> PointerType {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPointerType(pub String);

impl fmt::Display for UnknownPointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pointer type '{}'", self.0)
    }
}

impl std::error::Error for UnknownPointerType {}

impl FromStr for PointerType {
    type Err = UnknownPointerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointerType::ALL
            .iter()
            .find(|pointer| pointer.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownPointerType(s.to_string()))
    }
}
