//! Offset-carrying JSON syntax tree.
//!
//! Every provider works on [`JsonDocument`]: a tolerant tree-sitter parse of
//! the editor buffer, lowered so that each node knows its byte range, its
//! parent and its children.
//! Positions are converted to and from LSP coordinates (UTF-16 columns)
//! through a [`Rope`] kept next to the text.

mod ast;
mod parser;

pub use ast::{AstNode, NodeId, NodeKind, SyntaxError};

use ropey::Rope;
use serde_json::{Map, Number, Value};
use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Clone)]
pub struct JsonDocument {
    text: String,
    rope: Rope,
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
    errors: Vec<SyntaxError>,
}

impl JsonDocument {
    pub fn parse(text: &str) -> JsonDocument {
        let output = parser::parse(text);
        JsonDocument {
            text: text.to_string(),
            rope: Rope::from_str(text),
            nodes: output.nodes,
            root: output.root,
            errors: output.errors,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Panics if `id` was not produced by this document.
    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id]
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &AstNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn string_value(&self, id: NodeId) -> Option<&str> {
        self.node(id).as_str()
    }

    /// The innermost node whose range contains `offset`.
    pub fn node_at_offset(&self, offset: usize) -> Option<NodeId> {
        let mut current = self.root?;
        if !self.node(current).contains(offset) {
            return None;
        }

        'descend: loop {
            for &child in &self.node(current).children {
                if self.node(child).contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    pub fn is_property_key(&self, id: NodeId) -> bool {
        self.node(id)
            .parent
            .map(|parent| {
                let parent = self.node(parent);
                parent.kind == NodeKind::Property && parent.children.first() == Some(&id)
            })
            .unwrap_or(false)
    }

    /// Whether the node sits in value position: the document root, an array
    /// item or the right-hand side of a property.
    pub fn is_value(&self, id: NodeId) -> bool {
        match self.node(id).parent {
            None => true,
            Some(parent) => match self.node(parent).kind {
                NodeKind::Array => true,
                NodeKind::Property => self.node(parent).children.get(1) == Some(&id),
                _ => false,
            },
        }
    }

    /// The nearest property node at or above `id`.
    pub fn enclosing_property(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.kind == NodeKind::Property {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    pub fn property_key(&self, property: NodeId) -> Option<&str> {
        let key = *self.node(property).children.first()?;
        self.string_value(key)
    }

    pub fn property_value(&self, property: NodeId) -> Option<NodeId> {
        self.node(property).children.get(1).copied()
    }

    /// Every property named `key`, anywhere in the document, in document order.
    pub fn find_properties(&self, key: &str) -> Vec<NodeId> {
        self.nodes()
            .filter(|(id, node)| node.kind == NodeKind::Property && self.property_key(*id) == Some(key))
            .map(|(id, _)| id)
            .collect()
    }

    /// Member `key` of an object node.
    pub fn object_member(&self, object: NodeId, key: &str) -> Option<NodeId> {
        self.node(object)
            .children
            .iter()
            .find(|&&property| self.property_key(property) == Some(key))
            .and_then(|&property| self.property_value(property))
    }

    /// Resolves an RFC 6901 JSON Pointer against the tree.
    pub fn node_at_pointer(&self, pointer: &str) -> Option<NodeId> {
        let mut current = self.root?;
        if pointer.is_empty() {
            return Some(current);
        }

        for token in pointer.strip_prefix('/')?.split('/') {
            let token = token.replace("~1", "/").replace("~0", "~");
            let node = self.node(current);
            current = match node.kind {
                NodeKind::Object => self.object_member(current, &token)?,
                NodeKind::Array => {
                    let index: usize = token.parse().ok()?;
                    *node.children.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Converts a subtree to a `serde_json::Value`. Properties without a
    /// value are dropped; on duplicate keys the last one wins.
    pub fn to_value(&self, id: NodeId) -> Value {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Object => {
                let mut map = Map::new();
                for &property in &node.children {
                    if let (Some(key), Some(value)) =
                        (self.property_key(property), self.property_value(property))
                    {
                        map.insert(key.to_string(), self.to_value(value));
                    }
                }
                Value::Object(map)
            }
            NodeKind::Array => {
                Value::Array(node.children.iter().map(|&item| self.to_value(item)).collect())
            }
            NodeKind::Property => self
                .property_value(id)
                .map(|value| self.to_value(value))
                .unwrap_or(Value::Null),
            NodeKind::String(value) => Value::String(value.clone()),
            NodeKind::Number(number) => {
                if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
                    Value::from(*number as i64)
                } else {
                    Number::from_f64(*number).map(Value::Number).unwrap_or(Value::Null)
                }
            }
            NodeKind::Boolean(value) => Value::Bool(*value),
            NodeKind::Null => Value::Null,
        }
    }

    /// Byte offset of an LSP position, clamped to the line and the text.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.rope.len_lines() {
            return self.text.len();
        }

        let line_start = self.rope.line_to_char(line);
        let mut line_end = line_start + self.rope.line(line).len_chars();
        while line_end > line_start && matches!(self.rope.char(line_end - 1), '\n' | '\r') {
            line_end -= 1;
        }

        let target = self.rope.char_to_utf16_cu(line_start) + position.character as usize;
        let char_idx = self
            .rope
            .utf16_cu_to_char(target.min(self.rope.len_utf16_cu()))
            .min(line_end);
        self.rope.char_to_byte(char_idx)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let char_idx = self.rope.byte_to_char(offset);
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        let character =
            self.rope.char_to_utf16_cu(char_idx) - self.rope.char_to_utf16_cu(line_start);
        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    pub fn range(&self, start: usize, end: usize) -> Range {
        Range {
            start: self.position_at(start),
            end: self.position_at(end),
        }
    }

    pub fn node_range(&self, id: NodeId) -> Range {
        let node = self.node(id);
        self.range(node.offset, node.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> JsonDocument {
        JsonDocument::parse(text)
    }

    #[test]
    fn test_parse_well_formed_document() {
        let doc = parse(r#"{"name": "trader", "tags": ["a", "b"], "hp": 12.5, "x": null}"#);
        assert!(doc.errors().is_empty(), "{:?}", doc.errors());

        let root = doc.root().unwrap();
        assert_eq!(doc.node(root).kind, NodeKind::Object);
        assert_eq!(doc.node(root).children.len(), 4);

        let tags = doc.node_at_pointer("/tags").unwrap();
        assert_eq!(doc.node(tags).kind, NodeKind::Array);
        let second = doc.node_at_pointer("/tags/1").unwrap();
        assert_eq!(doc.string_value(second), Some("b"));

        let hp = doc.node_at_pointer("/hp").unwrap();
        assert_eq!(doc.node(hp).kind, NodeKind::Number(12.5));
        assert!(doc.node(doc.node_at_pointer("/x").unwrap()).is_null());
    }

    #[test]
    fn test_to_value_matches_serde() {
        let text = r#"{"a": [1, 2.5, "x"], "b": {"c": null, "d": false}}"#;
        let doc = parse(text);
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(doc.to_value(doc.root().unwrap()), expected);
    }

    #[test]
    fn test_string_node_covers_quotes() {
        let text = r#"{"a": "xyz"}"#;
        let doc = parse(text);
        let value = doc.node_at_pointer("/a").unwrap();
        let node = doc.node(value);
        assert_eq!(&text[node.offset..node.end()], "\"xyz\"");
    }

    #[test]
    fn test_escapes_are_decoded() {
        let doc = parse(r#"{"a": "line\nbreak é \"q\""}"#);
        let value = doc.node_at_pointer("/a").unwrap();
        assert_eq!(doc.string_value(value), Some("line\nbreak é \"q\""));
    }

    #[test]
    fn test_comments_are_skipped() {
        let doc = parse("// header\n{ /* inline */ \"a\": 1 }");
        assert!(doc.errors().is_empty(), "{:?}", doc.errors());
        assert!(doc.node_at_pointer("/a").is_some());
    }

    #[test]
    fn test_partial_document_keeps_parsed_prefix() {
        let doc = parse(r#"{"weapon": "laser", "tags": ["pla"#);
        assert!(!doc.errors().is_empty());
        let weapon = doc.node_at_pointer("/weapon").unwrap();
        assert_eq!(doc.string_value(weapon), Some("laser"));
        assert!(doc.node_at_pointer("/tags").is_some());
    }

    #[test]
    fn test_missing_comma_recovers() {
        let doc = parse(r#"{"a": 1 "b": 2}"#);
        assert!(!doc.errors().is_empty());
        assert!(doc.node_at_pointer("/a").is_some());
        assert!(doc.node_at_pointer("/b").is_some());
    }

    #[test]
    fn test_array_items_after_a_missing_comma_are_kept() {
        let doc = parse("[1 2, 3]");
        assert!(!doc.errors().is_empty());

        let root = doc.root().unwrap();
        assert_eq!(doc.node(root).kind, NodeKind::Array);
        let numbers: Vec<_> = doc
            .nodes()
            .filter_map(|(_, node)| match node.kind {
                NodeKind::Number(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0]);
        for (id, node) in doc.nodes() {
            if matches!(node.kind, NodeKind::Number(_)) {
                assert_eq!(node.parent, Some(root), "item {} detached", id);
            }
        }
    }

    #[test]
    fn test_property_without_value() {
        let doc = parse(r#"{"a": }"#);
        assert!(!doc.errors().is_empty());
        let property = doc.find_properties("a")[0];
        assert_eq!(doc.property_value(property), None);
        assert!(doc.is_property_key(doc.node(property).children[0]));
    }

    #[test]
    fn test_trailing_comma_is_named() {
        let doc = parse(r#"{"tags": ["plasma",]}"#);
        assert!(doc.errors().iter().any(|e| e.message == "Trailing comma"));
        let first = doc.node_at_pointer("/tags/0").unwrap();
        assert_eq!(doc.string_value(first), Some("plasma"));
    }

    #[test]
    fn test_trailing_garbage_is_reported() {
        let doc = parse("{} {}");
        assert_eq!(doc.errors().len(), 1);
        assert_eq!(doc.errors()[0].message, "End of file expected");
    }

    #[test]
    fn test_empty_text_has_no_root_and_no_errors() {
        let doc = parse("  ");
        assert!(doc.root().is_none());
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn test_node_at_offset_finds_innermost_node() {
        let text = r#"{"skin": {"name": "abc"}}"#;
        let doc = parse(text);
        let offset = text.find("abc").unwrap();
        let node = doc.node_at_offset(offset).unwrap();
        assert_eq!(doc.string_value(node), Some("abc"));
        assert!(doc.is_value(node));
        assert!(!doc.is_property_key(node));

        let key_offset = text.find("name").unwrap();
        let key = doc.node_at_offset(key_offset).unwrap();
        assert!(doc.is_property_key(key));
        assert!(!doc.is_value(key));

        let property = doc.enclosing_property(node).unwrap();
        assert_eq!(doc.property_key(property), Some("name"));
    }

    #[test]
    fn test_offset_past_end_has_no_node() {
        let doc = parse("{}");
        assert_eq!(doc.node_at_offset(2), None);
    }

    #[test]
    fn test_find_properties_recurses_into_arrays() {
        let doc = parse(r#"{"weapon": "a", "list": [{"weapon": "b"}, {"other": {"weapon": "c"}}]}"#);
        let values: Vec<_> = doc
            .find_properties("weapon")
            .into_iter()
            .filter_map(|p| doc.property_value(p))
            .filter_map(|v| doc.string_value(v))
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pointer_tokens_are_unescaped() {
        let doc = parse(r#"{"a/b": {"c~d": true}}"#);
        let node = doc.node_at_pointer("/a~1b/c~0d").unwrap();
        assert_eq!(doc.node(node).kind, NodeKind::Boolean(true));
        assert!(doc.node_at_pointer("/missing").is_none());
    }

    #[test]
    fn test_positions_use_utf16_columns() {
        let text = "{\n  \"é😀\": \"x\"\n}";
        let doc = parse(text);
        let offset = text.find("\"x\"").unwrap();
        let position = doc.position_at(offset);
        // 2 spaces + quote + é (1) + 😀 (2) + quote + colon + space
        assert_eq!(position, Position::new(1, 9));
        assert_eq!(doc.offset_at(position), offset);
    }

    #[test]
    fn test_offset_at_clamps_to_line_and_text() {
        let text = "{\n\"a\": 1\n}";
        let doc = parse(text);
        assert_eq!(doc.offset_at(Position::new(1, 100)), text.find("\n}").unwrap());
        assert_eq!(doc.offset_at(Position::new(40, 0)), text.len());
    }

    #[test]
    fn test_offset_at_stops_before_crlf() {
        let text = "{\r\n\"a\": 1\r\n}";
        let doc = parse(text);
        assert_eq!(doc.offset_at(Position::new(1, 100)), text.find("\r\n}").unwrap());
        assert_eq!(doc.offset_at(Position::new(1, 3)), text.find(':').unwrap());
        assert_eq!(doc.offset_at(Position::new(2, 5)), text.len());
    }
}
