//! Hover provider.
//!
//! # Hover Targets
//!
//! | Category | Shows |
//! |----------|-------|
//! | `localized_text` | The text for the key in the active language |
//! | `weapon` | Localized weapon name and a stat table |
//! | `weapon_tag` | Localized tag name from `weapon.uniforms` |
//! | `brush` | Texture preview, when the client renders markdown images |
//! | anything else | The schema description of the property |
//!
//! Weapon and tag hovers read the target file from disk on every request.
//!
//! # Configuration
//!
//! Hover can be disabled with `hover = false`, the texture preview alone
//! with `texture_preview = false`.

use std::fs;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Url};
use tracing::{debug, warn};

use crate::{
    context,
    engine::EngineContext,
    index::files,
    json::{JsonDocument, NodeId},
    pointer::PointerType,
    schema::MatchingSchema,
};

const SEPARATOR: &str = "------------";

pub fn hover(
    engine: &EngineContext,
    file_name: &str,
    document: &JsonDocument,
    cursor_position: Position,
) -> Option<Hover> {
    if !engine.settings.hover {
        return None;
    }

    let node = document.node_at_offset(document.offset_at(cursor_position))?;
    let matches = engine.matching_schemas(file_name, document);
    let pointer = context::resolve_with(document, &matches, Some(node));
    debug!(context = %pointer, "hover");

    let markdown = document
        .string_value(node)
        .filter(|value| !value.is_empty() && context::is_string_value(document, node))
        .and_then(|value| reference_markdown(engine, pointer, value))
        .or_else(|| description_markdown(document, &matches, node))?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: Some(document.node_range(node)),
    })
}

fn reference_markdown(engine: &EngineContext, pointer: PointerType, value: &str) -> Option<String> {
    match pointer {
        PointerType::Brush if engine.settings.texture_preview => texture_preview(engine, value),
        PointerType::LocalizedText => localized_text(engine, value),
        PointerType::Weapon => weapon(engine, value),
        PointerType::WeaponTag => weapon_tag(engine, value),
        _ => None,
    }
}

/// Unknown keys get no hover at all.
fn localized_text(engine: &EngineContext, key: &str) -> Option<String> {
    let index = &engine.index;
    if !index.existence.contains(PointerType::LocalizedText, key) {
        return None;
    }
    let text = index.localization.get(&index.language, key)?;

    Some(
        [
            format!("**Localized Text** - *{}.localized_text*", index.language),
            "\n".to_string(),
            SEPARATOR.to_string(),
            "\n".to_string(),
            text.to_string(),
        ]
        .join("\n"),
    )
}

fn weapon(engine: &EngineContext, identifier: &str) -> Option<String> {
    let index = &engine.index;
    let path = *index
        .paths
        .get_in_category(identifier, PointerType::Weapon.as_str())
        .first()?;
    let contents = files::read_json(path)?;

    let name = contents
        .get("name")
        .and_then(Value::as_str)
        .map(|key| index.localization.get(&index.language, key).unwrap_or(key))
        .unwrap_or(identifier);
    let tags = contents
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    Some(
        [
            format!("**{}**", name),
            "\n".to_string(),
            SEPARATOR.to_string(),
            "\n".to_string(),
            "| Damage | Range | Cooldown | Tags".to_string(),
            "| :---- | :---- | :---- | :----".to_string(),
            format!(
                "| {} | {} | {} | {}",
                stat(&contents, "damage"),
                stat(&contents, "range"),
                stat(&contents, "cooldown_duration"),
                tags
            ),
        ]
        .join("\n"),
    )
}

fn stat(contents: &Value, key: &str) -> String {
    match contents.get(key) {
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => "-".to_string(),
    }
}

fn weapon_tag(engine: &EngineContext, tag: &str) -> Option<String> {
    let index = &engine.index;
    let path = *index.paths.get_in_category("weapon", "uniforms").first()?;
    let contents = files::read_json(path)?;

    let localized_name = contents
        .get("weapon_tags")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(tag))?
        .get("localized_name")?
        .as_str()?;
    let text = index
        .localization
        .get(&index.language, localized_name)
        .unwrap_or(localized_name);

    Some(
        [
            "**Tag**".to_string(),
            "\n".to_string(),
            SEPARATOR.to_string(),
            "\n".to_string(),
            text.to_string(),
        ]
        .join("\n"),
    )
}

/// The png behind a brush, inlined as a data URI.
fn texture_preview(engine: &EngineContext, brush: &str) -> Option<String> {
    let path = engine.index.textures.get(brush)?;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), "could not read texture: {}", err);
            return None;
        }
    };
    let file_url = Url::from_file_path(path).ok()?;

    Some(
        [
            "**Texture Preview**".to_string(),
            format!("[{}]({})", path.display(), file_url),
            format!("![{}](data:image/png;base64,{})", brush, STANDARD.encode(bytes)),
        ]
        .join("\n\n"),
    )
}

/// Schema description of the property the node belongs to.
fn description_markdown(
    document: &JsonDocument,
    matches: &[MatchingSchema],
    node: NodeId,
) -> Option<String> {
    let property = document.enclosing_property(node)?;
    let key = document.property_key(property)?;

    matches
        .iter()
        .filter(|matching| matching.owns_property(document, property))
        .find_map(|matching| {
            let declared = matching.fragment().property(key)?;
            matching.schema.effective_description(declared)
        })
        .map(str::to_string)
}
