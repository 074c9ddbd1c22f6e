//! Symbol providers.
//!
//! - `textDocument/documentSymbol` - the property tree of the current file
//! - `workspace/symbol` - fuzzy search over every indexed entity file
//!
//! # Document Symbols
//!
//! | Value | LSP Kind | Detail |
//! |-------|----------|--------|
//! | Object | `Module` | |
//! | Array | `Array` | |
//! | String | `String` | the string |
//! | Number | `Number` | the number |
//! | Boolean | `Boolean` | `true` / `false` |
//! | `null` | `Null` | |
//!
//! Properties are named by their key, array items by their index.
//!
//! # Workspace Symbols
//!
//! One symbol per file of the Path Index, named by its identifier and
//! contained in its extension, ranked by [`nucleo_matcher`] score.

use std::path::Path;

use itertools::Itertools;
use nucleo_matcher::{
    pattern::{self, Normalization},
    Matcher,
};
use tower_lsp::lsp_types::{
    DocumentSymbol, DocumentSymbolResponse, Location, Range, SymbolInformation, SymbolKind, Url,
};

use crate::{
    index::PathIndex,
    json::{JsonDocument, NodeId, NodeKind},
};

fn compute_match_score(
    matcher: &mut Matcher,
    pattern: &pattern::Pattern,
    symbol: SymbolInformation,
) -> (u32, SymbolInformation) {
    let mut buf = Vec::new();
    (
        pattern
            .score(
                nucleo_matcher::Utf32Str::new(symbol.name.as_str(), &mut buf),
                matcher,
            )
            .unwrap_or_default(),
        symbol,
    )
}

/// Search entity files by identifier. An empty query lists every file.
pub fn workspace_symbol(paths: &PathIndex, query: &str) -> Vec<SymbolInformation> {
    let symbols = paths
        .identifiers()
        .flat_map(|(identifier, paths)| {
            paths
                .iter()
                .filter_map(move |path| to_symbol_information(identifier, path))
        })
        .sorted_by(|a, b| a.name.cmp(&b.name));

    if query.is_empty() {
        return symbols.collect_vec();
    }

    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = pattern::Pattern::parse(query, pattern::CaseMatching::Smart, Normalization::Smart);

    symbols
        .map(|symbol| compute_match_score(&mut matcher, &pattern, symbol))
        .filter(|(score, _)| *score > 0)
        .sorted_by(|(a, _), (b, _)| Ord::cmp(b, a))
        .map(|(_score, symbol)| symbol)
        .collect_vec()
}

#[allow(deprecated)]
fn to_symbol_information(identifier: &str, path: &Path) -> Option<SymbolInformation> {
    Some(SymbolInformation {
        name: identifier.to_string(),
        kind: SymbolKind::FILE,
        tags: None,
        deprecated: None,
        location: Location {
            uri: Url::from_file_path(path).ok()?,
            range: Range::default(),
        },
        container_name: path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string),
    })
}

/// The outline of a document, or `None` when it has no properties.
pub fn document_symbol(document: &JsonDocument) -> Option<DocumentSymbolResponse> {
    let root = document.root()?;
    let symbols = children_symbols(document, root);
    if symbols.is_empty() {
        return None;
    }
    Some(DocumentSymbolResponse::Nested(symbols))
}

fn children_symbols(document: &JsonDocument, container: NodeId) -> Vec<DocumentSymbol> {
    let node = document.node(container);
    match node.kind {
        NodeKind::Object => node
            .children
            .iter()
            .filter_map(|&property| property_symbol(document, property))
            .collect(),
        NodeKind::Array => node
            .children
            .iter()
            .enumerate()
            .map(|(idx, &item)| {
                let range = document.node_range(item);
                symbol(document, idx.to_string(), item, range, range)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn property_symbol(document: &JsonDocument, property: NodeId) -> Option<DocumentSymbol> {
    let key_node = *document.node(property).children.first()?;
    let key = document.string_value(key_node)?;
    let value = document.property_value(property)?;
    Some(symbol(
        document,
        key.to_string(),
        value,
        document.node_range(property),
        document.node_range(key_node),
    ))
}

#[allow(deprecated)]
fn symbol(
    document: &JsonDocument,
    name: String,
    value: NodeId,
    range: Range,
    selection_range: Range,
) -> DocumentSymbol {
    let (kind, detail) = match &document.node(value).kind {
        NodeKind::Object => (SymbolKind::MODULE, None),
        NodeKind::Array => (SymbolKind::ARRAY, None),
        NodeKind::String(text) => (SymbolKind::STRING, Some(text.clone())),
        NodeKind::Number(number) => (SymbolKind::NUMBER, Some(number.to_string())),
        NodeKind::Boolean(flag) => (SymbolKind::BOOLEAN, Some(flag.to_string())),
        NodeKind::Null | NodeKind::Property => (SymbolKind::NULL, None),
    };
    let children = children_symbols(document, value);

    DocumentSymbol {
        name,
        detail,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: (!children.is_empty()).then_some(children),
    }
}
