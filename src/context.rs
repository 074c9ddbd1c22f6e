//! Context resolution: which pointer category governs a cursor position.

use tower_lsp::lsp_types::Url;

use crate::{
    engine::EngineContext,
    json::{JsonDocument, NodeId, NodeKind},
    pointer::PointerType,
    schema::MatchingSchema,
};

/// The file name of a document URI, which decides its entity family.
pub fn document_file_name(uri: &Url) -> String {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|name| name.to_string())
        .unwrap_or_default()
}

/// The entity category of the document being edited.
pub fn entity_category(file_name: &str) -> PointerType {
    PointerType::from_file_name(file_name)
}

/// Resolves the pointer category of `node` inside `document`.
pub fn resolve_context(
    context: &EngineContext,
    file_name: &str,
    document: &JsonDocument,
    node: Option<NodeId>,
) -> PointerType {
    let Some(node) = node else {
        return PointerType::None;
    };
    if document.is_property_key(node) || document.enclosing_property(node).is_none() {
        return PointerType::None;
    }

    let matches = context.matching_schemas(file_name, document);
    resolve_with(document, &matches, Some(node))
}

/// Resolution against an already computed list of matching schemas.
///
/// Only schemas governing the object that holds the enclosing property are
/// considered. The first of them that marks the property wins; otherwise
/// its `patternProperties` entries are scanned in declaration order.
pub fn resolve_with(
    document: &JsonDocument,
    matches: &[MatchingSchema],
    node: Option<NodeId>,
) -> PointerType {
    let Some(node) = node else {
        return PointerType::None;
    };
    if document.is_property_key(node) {
        return PointerType::None;
    }
    let Some(property) = document.enclosing_property(node) else {
        return PointerType::None;
    };
    let Some(key) = document.property_key(property) else {
        return PointerType::None;
    };

    let offset = document.node(node).offset;
    for matching in matches {
        if !matching.covers(document, offset) || !matching.owns_property(document, property) {
            continue;
        }

        let schema = &matching.schema;
        let fragment = matching.fragment();

        if let Some(declared) = fragment.property(key) {
            let pointer = schema.effective_pointer(declared);
            if !pointer.is_none() {
                return pointer;
            }
        }

        if let Some(pointer) = fragment
            .pattern_properties
            .iter()
            .map(|pattern| schema.effective_pointer(pattern.fragment))
            .find(|pointer| !pointer.is_none())
        {
            return pointer;
        }
    }

    PointerType::None
}

/// Whether `node` is a string in value position, the only place providers
/// act on.
pub fn is_string_value(document: &JsonDocument, node: NodeId) -> bool {
    matches!(document.node(node).kind, NodeKind::String(_)) && document.is_value(node)
}
