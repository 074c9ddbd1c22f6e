//! Custom client requests.
//!
//! The method names are part of the client protocol and must not change.
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `soase/entity/player_ids` | none | `string[]` |
//! | `soase/entity/file_path` | `{ identifier }` | path or `null` |
//! | `soase/entity/localization` | `{ language, key }` | text or `null` |

use serde::Deserialize;
use tracing::warn;

use crate::{engine::EngineContext, pointer::PointerType};

pub const PLAYER_IDS: &str = "soase/entity/player_ids";
pub const ENTITY_PATH: &str = "soase/entity/file_path";
pub const LOCALIZATION: &str = "soase/entity/localization";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EntityPathParams {
    pub identifier: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LocalizationParams {
    pub language: String,
    pub key: String,
}

/// Identifiers of every `.player` file.
pub fn player_ids(engine: &EngineContext) -> Vec<String> {
    engine
        .index
        .existence
        .members(PointerType::Player)
        .map(str::to_string)
        .collect()
}

/// Path of the first file named after `identifier`, whatever its extension.
pub fn entity_path(engine: &EngineContext, params: &EntityPathParams) -> Option<String> {
    let paths = engine.index.paths.get(&params.identifier);
    match paths {
        [] => {
            warn!(identifier = %params.identifier, "no file for identifier");
            None
        }
        [path] => Some(path.to_string_lossy().to_string()),
        [first, ..] => {
            warn!(
                identifier = %params.identifier,
                count = paths.len(),
                "several files share this identifier, using {}",
                first.display()
            );
            Some(first.to_string_lossy().to_string())
        }
    }
}

pub fn localization(engine: &EngineContext, params: &LocalizationParams) -> Option<String> {
    engine
        .index
        .localization
        .get(&params.language, &params.key)
        .map(str::to_string)
}
