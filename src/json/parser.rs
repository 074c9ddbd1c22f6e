//! Error-tolerant parsing on top of tree-sitter.
//!
//! tree-sitter-json yields a concrete syntax tree for any buffer state. It is
//! lowered here into the arena of [`AstNode`]s the rest of the crate walks,
//! and its `ERROR`/`MISSING` nodes become [`SyntaxError`]s. Members caught
//! inside `ERROR` nodes are recovered, so one typo does not hide the rest of
//! a container.

use tree_sitter::{Language, Node, Parser};
use tracing::warn;

use super::ast::{AstNode, NodeId, NodeKind, SyntaxError};

const MAX_DEPTH: usize = 512;

const VALUE_KINDS: [&str; 7] = ["object", "array", "string", "number", "true", "false", "null"];

pub(super) struct ParseOutput {
    pub nodes: Vec<AstNode>,
    pub root: Option<NodeId>,
    pub errors: Vec<SyntaxError>,
}

pub(super) fn parse(text: &str) -> ParseOutput {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_json::LANGUAGE.into();
    if let Err(err) = parser.set_language(&language) {
        warn!("could not load the JSON grammar: {}", err);
        return ParseOutput {
            nodes: Vec::new(),
            root: None,
            errors: Vec::new(),
        };
    }
    let Some(tree) = parser.parse(text, None) else {
        warn!("tree-sitter returned no tree");
        return ParseOutput {
            nodes: Vec::new(),
            root: None,
            errors: Vec::new(),
        };
    };

    let mut lowering = Lowering {
        text,
        depth: 0,
        nodes: Vec::new(),
        errors: Vec::new(),
    };
    let document = tree.root_node();
    let root = lowering.document(document);
    lowering.collect_errors(document);
    lowering.errors.sort_by_key(|error| error.offset);

    ParseOutput {
        nodes: lowering.nodes,
        root,
        errors: lowering.errors,
    }
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn is_value(node: &Node) -> bool {
    node.is_named() && !node.is_missing() && VALUE_KINDS.contains(&node.kind())
}

fn opens_container(node: &Node) -> bool {
    !node.is_missing() && matches!(node.kind(), "{" | "[")
}

fn decode_string(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| {
        let inner = raw.strip_prefix('"').unwrap_or(raw);
        inner.strip_suffix('"').unwrap_or(inner).to_string()
    })
}

struct Lowering<'a> {
    text: &'a str,
    depth: usize,
    nodes: Vec<AstNode>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lowering<'a> {
    fn slice(&self, node: Node) -> &'a str {
        self.text.get(node.start_byte()..node.end_byte()).unwrap_or("")
    }

    fn push(&mut self, kind: NodeKind, start: usize, end: usize, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(AstNode {
            kind,
            offset: start,
            length: end.saturating_sub(start),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn extend(&mut self, id: NodeId, end: usize) {
        let node = &mut self.nodes[id];
        node.length = node.length.max(end.saturating_sub(node.offset));
    }

    /// The first value of the document. Anything after it is reported by
    /// [`Lowering::collect_errors`].
    fn document(&mut self, document: Node) -> Option<NodeId> {
        let kids = children(document);
        let mut idx = 0;
        while idx < kids.len() {
            let before = idx;
            if !kids[idx].is_extra() {
                if let Some(root) = self.sequence_value(&kids, &mut idx, None) {
                    return Some(root);
                }
            }
            if idx == before {
                idx += 1;
            }
        }
        None
    }

    fn value(&mut self, node: Node, parent: Option<NodeId>) -> Option<NodeId> {
        if node.is_missing() {
            return None;
        }
        let (start, end) = (node.start_byte(), node.end_byte());
        let kind = match node.kind() {
            "object" | "array" => {
                let is_object = node.kind() == "object";
                let kind = if is_object { NodeKind::Object } else { NodeKind::Array };
                let id = self.push(kind, start, end, parent);
                // Skip the opening bracket.
                self.members(&children(node), &mut 1, id, is_object);
                return Some(id);
            }
            "string" => NodeKind::String(decode_string(self.slice(node))),
            "number" => NodeKind::Number(self.slice(node).parse().unwrap_or(0.0)),
            "true" => NodeKind::Boolean(true),
            "false" => NodeKind::Boolean(false),
            "null" => NodeKind::Null,
            "ERROR" => return self.recover_value(node, parent),
            _ => return None,
        };
        Some(self.push(kind, start, end, parent))
    }

    /// Builds the value starting at `nodes[*idx]`, advancing past whatever
    /// it consumed. A bare `{` or `[` token opens a container made of the
    /// following siblings.
    fn sequence_value(
        &mut self,
        nodes: &[Node],
        idx: &mut usize,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let node = *nodes.get(*idx)?;
        if opens_container(&node) {
            *idx += 1;
            let is_object = node.kind() == "{";
            let kind = if is_object { NodeKind::Object } else { NodeKind::Array };
            let id = self.push(kind, node.start_byte(), node.end_byte(), parent);
            self.members(nodes, idx, id, is_object);
            return Some(id);
        }
        if is_value(&node) || node.is_error() {
            *idx += 1;
            return self.value(node, parent);
        }
        None
    }

    fn recover_value(&mut self, error: Node, parent: Option<NodeId>) -> Option<NodeId> {
        let kids = children(error);
        let mut idx = 0;
        while idx < kids.len() {
            let before = idx;
            if let Some(id) = self.sequence_value(&kids, &mut idx, parent) {
                return Some(id);
            }
            if idx == before {
                idx += 1;
            }
        }
        None
    }

    /// Adds the members found in `nodes[*idx..]` to `container`, stopping
    /// after its closing bracket.
    fn members(&mut self, nodes: &[Node], idx: &mut usize, container: NodeId, is_object: bool) {
        if self.depth >= MAX_DEPTH {
            return;
        }
        self.depth += 1;

        while let Some(&node) = nodes.get(*idx) {
            let before = *idx;
            match node.kind() {
                _ if node.is_extra() => {}
                "}" | "]" if !node.is_missing() => {
                    *idx += 1;
                    self.extend(container, node.end_byte());
                    break;
                }
                "pair" if is_object => self.pair(node, container),
                "string" if is_object => {
                    *idx += 1;
                    self.loose_property(node, nodes, idx, container);
                }
                "ERROR" => {
                    self.members(&children(node), &mut 0, container, is_object);
                }
                _ if !is_object => {
                    self.sequence_value(nodes, idx, Some(container));
                }
                _ => {}
            }
            if *idx == before {
                *idx += 1;
            }
            self.extend(container, nodes[*idx - 1].end_byte());
        }

        self.depth -= 1;
    }

    fn pair(&mut self, pair: Node, object: NodeId) {
        let property = self.push(
            NodeKind::Property,
            pair.start_byte(),
            pair.end_byte(),
            Some(object),
        );
        if let Some(key) = pair.child_by_field_name("key") {
            self.key(key, property);
        }
        if let Some(value) = pair.child_by_field_name("value") {
            self.value(value, Some(property));
        }
    }

    fn key(&mut self, key: Node, property: NodeId) {
        let raw = self.slice(key);
        let text = match key.kind() {
            "string" => decode_string(raw),
            _ => raw.to_string(),
        };
        self.push(
            NodeKind::String(text),
            key.start_byte(),
            key.end_byte(),
            Some(property),
        );
    }

    /// A key found outside of a `pair`, followed by an optional `:` and value.
    fn loose_property(&mut self, key: Node, nodes: &[Node], idx: &mut usize, object: NodeId) {
        let property = self.push(
            NodeKind::Property,
            key.start_byte(),
            key.end_byte(),
            Some(object),
        );
        self.key(key, property);

        while nodes.get(*idx).is_some_and(|node| node.is_extra()) {
            *idx += 1;
        }
        let Some(colon) = nodes.get(*idx).filter(|node| node.kind() == ":") else {
            return;
        };
        *idx += 1;
        self.extend(property, colon.end_byte());

        while nodes.get(*idx).is_some_and(|node| node.is_extra()) {
            *idx += 1;
        }
        if let Some(value) = self.sequence_value(nodes, idx, Some(property)) {
            let end = self.nodes[value].end();
            self.extend(property, end);
        }
    }

    fn collect_errors(&mut self, node: Node) {
        if node.is_missing() {
            let message = if self.is_trailing_comma(node) {
                "Trailing comma".to_string()
            } else if node.is_named() {
                "Value expected".to_string()
            } else {
                format!("Expected '{}'", node.kind())
            };
            self.error(node, message);
        } else if node.is_error() {
            let message = self.error_message(node);
            self.error(node, message);
        } else if node.kind() == "document" {
            let mut seen_value = false;
            for child in children(node) {
                if child.is_extra() {
                    continue;
                }
                if seen_value {
                    self.error(child, "End of file expected".to_string());
                    continue;
                }
                let holds_value = children(child)
                    .iter()
                    .any(|kid| is_value(kid) || opens_container(kid));
                if child.is_error() && !holds_value {
                    self.error(child, "Expected a JSON object, array or literal".to_string());
                } else {
                    self.collect_errors(child);
                }
                seen_value = true;
            }
        } else if node.has_error() {
            for child in children(node) {
                self.collect_errors(child);
            }
        }
    }

    fn error_message(&self, node: Node) -> String {
        if self.is_trailing_comma(node) {
            return "Trailing comma".to_string();
        }

        let first = children(node).into_iter().find(|kid| !kid.is_extra());
        let starts_value = first.is_some_and(|kid| is_value(&kid) || opens_container(&kid));
        let before = self.text[..node.start_byte()].trim_end().chars().last();
        if starts_value && before.is_some_and(|ch| !matches!(ch, ',' | '[' | '{' | ':')) {
            return "Expected comma".to_string();
        }

        if node.end_byte() >= self.text.trim_end().len() {
            return "Unexpected end of file".to_string();
        }
        "Unexpected token".to_string()
    }

    /// A lone `,` right before a closing bracket, or the gap left by one.
    fn is_trailing_comma(&self, node: Node) -> bool {
        let body = self.slice(node).trim();
        let before = self.text[..node.start_byte()].trim_end().chars().last();
        let after = self.text[node.end_byte()..].trim_start().chars().next();
        matches!(after, Some(']') | Some('}'))
            && (body == "," || (body.is_empty() && before == Some(',')))
    }

    fn error(&mut self, node: Node, message: String) {
        self.errors.push(SyntaxError {
            message,
            offset: node.start_byte(),
            length: node.end_byte() - node.start_byte(),
        });
    }
}
