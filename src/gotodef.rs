use std::{fs, path::Path};

use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::warn;

use crate::{context, engine::EngineContext, json::JsonDocument, pointer::PointerType};

pub fn goto_definition(
    engine: &EngineContext,
    file_name: &str,
    document: &JsonDocument,
    cursor_position: Position,
) -> Option<Vec<Location>> {
    let node = document.node_at_offset(document.offset_at(cursor_position))?;
    if !context::is_string_value(document, node) {
        return None;
    }
    let identifier = document.string_value(node)?;

    let matches = engine.matching_schemas(file_name, document);
    let pointer = context::resolve_with(document, &matches, Some(node));

    definitions(engine, pointer, identifier)
}

/// Files defining `identifier` in `category`. Only files of that category
/// are returned, whatever else shares the identifier.
pub fn definitions(
    engine: &EngineContext,
    category: PointerType,
    identifier: &str,
) -> Option<Vec<Location>> {
    let index = &engine.index;
    let locations: Vec<Location> = match category {
        PointerType::None => return None,
        PointerType::LocalizedText => return localized_text_definition(engine, identifier),
        category => index
            .paths
            .get_in_category(identifier, category.as_str())
            .into_iter()
            .filter_map(|path| location(path, Range::default()))
            .collect(),
    };

    (!locations.is_empty()).then_some(locations)
}

/// Localization keys live in `<language>.localized_text`; the location
/// points at the first line quoting the key.
fn localized_text_definition(engine: &EngineContext, key: &str) -> Option<Vec<Location>> {
    let index = &engine.index;
    if !index.existence.contains(PointerType::LocalizedText, key) {
        return None;
    }

    let paths = index
        .paths
        .get_in_category(&index.language, PointerType::LocalizedText.as_str());
    let first = paths.first()?;

    let range = match fs::read_to_string(first) {
        Ok(text) => find_quoted(&text, key).unwrap_or_default(),
        Err(err) => {
            warn!(path = %first.display(), "could not read localization file: {}", err);
            Range::default()
        }
    };

    Some(
        paths
            .into_iter()
            .filter_map(|path| location(path, range))
            .collect(),
    )
}

/// Range of the first `"key"` in `text`, quotes included. Columns are
/// UTF-16 code units.
fn find_quoted(text: &str, key: &str) -> Option<Range> {
    let needle = format!("\"{}\"", key);
    text.split('\n').enumerate().find_map(|(line, content)| {
        let idx = content.find(&needle)?;
        let start = content[..idx].encode_utf16().count() as u32;
        let width = needle.encode_utf16().count() as u32;
        Some(Range {
            start: Position::new(line as u32, start),
            end: Position::new(line as u32, start + width),
        })
    })
}

fn location(path: &Path, range: Range) -> Option<Location> {
    Some(Location {
        uri: Url::from_file_path(path).ok()?,
        range,
    })
}
