//! Pairs schema fragments with the syntax nodes they govern.
//!
//! The walk descends the document and the schema together. Every visited
//! `(fragment, node)` pair is emitted after its children, so for any node the
//! innermost governing fragments come first in the result.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::json::{JsonDocument, NodeId, NodeKind};

use super::{
    annotator::SchemaConfiguration,
    fragment::{AnnotatedSchema, FragmentId, Items, SchemaFragment},
    structural::{StructuralError, StructuralSchema},
};

/// A schema fragment together with the node it governs.
#[derive(Debug, Clone)]
pub struct MatchingSchema {
    pub schema: Arc<AnnotatedSchema>,
    pub fragment: FragmentId,
    pub node: NodeId,
}

impl MatchingSchema {
    pub fn fragment(&self) -> &SchemaFragment {
        self.schema.fragment(self.fragment)
    }

    /// Whether `offset` falls inside the governed node, end inclusive.
    pub fn covers(&self, document: &JsonDocument, offset: usize) -> bool {
        let node = document.node(self.node);
        offset >= node.offset && offset <= node.end()
    }

    /// Whether `property` is a direct member of the governed object.
    pub fn owns_property(&self, document: &JsonDocument, property: NodeId) -> bool {
        let node = document.node(property);
        node.kind == NodeKind::Property
            && node.parent == Some(self.node)
            && self.covers(document, node.offset)
    }
}

/// The configured schemas, ready to be matched against documents.
pub struct SchemaSet {
    configurations: Vec<SchemaConfiguration>,
    structural: Vec<Option<StructuralSchema>>,
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet")
            .field("configurations", &self.configurations.len())
            .finish()
    }
}

impl SchemaSet {
    pub fn new(configurations: Vec<SchemaConfiguration>) -> SchemaSet {
        let structural = configurations
            .iter()
            .map(|config| StructuralSchema::compile(&config.schema.raw))
            .collect();
        SchemaSet {
            configurations,
            structural,
        }
    }

    pub fn configurations(&self) -> &[SchemaConfiguration] {
        &self.configurations
    }

    /// Configurations whose file match accepts `file_name`, in order.
    pub fn configurations_for<'a>(
        &'a self,
        file_name: &'a str,
    ) -> impl Iterator<Item = (usize, &'a SchemaConfiguration)> + 'a {
        self.configurations
            .iter()
            .enumerate()
            .filter(move |(_, config)| config.matches(file_name))
    }

    pub fn matching_schemas(&self, file_name: &str, document: &JsonDocument) -> Vec<MatchingSchema> {
        let Some(root) = document.root() else {
            return Vec::new();
        };

        let mut matches = Vec::new();
        for (_, config) in self.configurations_for(file_name) {
            let mut walker = Walker {
                schema: &config.schema,
                document,
                visited: HashSet::new(),
                matches: &mut matches,
            };
            walker.walk(config.schema.root(), root);
        }
        matches
    }

    pub fn structural_errors(&self, file_name: &str, document: &JsonDocument) -> Vec<StructuralError> {
        self.configurations_for(file_name)
            .filter_map(|(idx, _)| self.structural[idx].as_ref())
            .flat_map(|schema| schema.validate(document))
            .collect()
    }
}

struct Walker<'a> {
    schema: &'a Arc<AnnotatedSchema>,
    document: &'a JsonDocument,
    visited: HashSet<(FragmentId, NodeId)>,
    matches: &'a mut Vec<MatchingSchema>,
}

impl Walker<'_> {
    fn walk(&mut self, fragment_id: FragmentId, node_id: NodeId) {
        if !self.visited.insert((fragment_id, node_id)) {
            return;
        }

        let document = self.document;
        let schema = Arc::clone(self.schema);
        let fragment = schema.fragment(fragment_id);

        if let Some(reference) = fragment.reference {
            self.walk(reference, node_id);
        }
        for &member in &fragment.all_of {
            self.walk(member, node_id);
        }
        for &member in fragment.any_of.iter().chain(&fragment.one_of) {
            if self.accepts(member, node_id) {
                self.walk(member, node_id);
            }
        }

        let node = document.node(node_id);
        match node.kind {
            NodeKind::Object => {
                for &property in &node.children {
                    let (Some(key), Some(value)) = (
                        document.property_key(property),
                        document.property_value(property),
                    ) else {
                        continue;
                    };
                    for member in member_fragments(fragment, key) {
                        self.walk(member, value);
                    }
                }
            }
            NodeKind::Array => match &fragment.items {
                Some(Items::Single(items)) => {
                    for &item in &node.children {
                        self.walk(*items, item);
                    }
                }
                Some(Items::Tuple(items)) => {
                    for (&item, &items) in node.children.iter().zip(items) {
                        self.walk(items, item);
                    }
                }
                None => {}
            },
            _ => {}
        }

        self.matches.push(MatchingSchema {
            schema,
            fragment: fragment_id,
            node: node_id,
        });
    }

    fn accepts(&self, fragment: FragmentId, node: NodeId) -> bool {
        let kind = &self.document.node(node).kind;
        let types = self.schema.effective_types(fragment);
        types.is_empty() || types.iter().any(|ty| type_matches(ty, kind))
    }
}

/// Fragments governing the member `key` of an object: the named property,
/// otherwise every matching pattern, otherwise `additionalProperties`.
fn member_fragments(fragment: &SchemaFragment, key: &str) -> Vec<FragmentId> {
    if let Some(property) = fragment.property(key) {
        return vec![property];
    }

    let patterns: Vec<FragmentId> = fragment
        .pattern_properties
        .iter()
        .filter(|pattern| pattern.matches(key))
        .map(|pattern| pattern.fragment)
        .collect();
    if !patterns.is_empty() {
        return patterns;
    }

    fragment.additional_properties.into_iter().collect()
}

fn type_matches(ty: &str, kind: &NodeKind) -> bool {
    match (ty, kind) {
        ("integer", NodeKind::Number(number)) => number.fract() == 0.0,
        (ty, kind) => ty == kind.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pointer::PointerType;

    fn schema_set(raw: serde_json::Value, markers: &[(String, PointerType)]) -> SchemaSet {
        SchemaSet::new(vec![SchemaConfiguration {
            file_match: vec!["*.unit".to_string()],
            uri: "jabberwocky://schemas/test.json".to_string(),
            schema: Arc::new(AnnotatedSchema::compile(raw, markers)),
        }])
    }

    fn unit_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "weapons": { "$ref": "#/$defs/unit_weapons_definition" },
                "skins": { "type": "array", "items": { "type": "string" } }
            },
            "$defs": {
                "unit_weapons_definition": {
                    "type": "object",
                    "properties": {
                        "weapons": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": { "weapon": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_matches_follow_references_and_items() {
        let set = schema_set(unit_schema(), &[]);
        let text = r#"{"weapons": {"weapons": [{"weapon": "laser"}]}, "skins": ["a"]}"#;
        let doc = JsonDocument::parse(text);

        let matches = set.matching_schemas("trader.unit", &doc);
        let item = doc.node_at_pointer("/weapons/weapons/0").unwrap();
        let item_match = matches.iter().find(|m| m.node == item).unwrap();
        assert!(item_match.fragment().property("weapon").is_some());

        let skin = doc.node_at_pointer("/skins/0").unwrap();
        assert!(matches.iter().any(|m| m.node == skin));
    }

    #[test]
    fn test_innermost_matches_come_first() {
        let set = schema_set(unit_schema(), &[]);
        let doc = JsonDocument::parse(r#"{"skins": ["a"]}"#);
        let matches = set.matching_schemas("trader.unit", &doc);

        let root = doc.root().unwrap();
        assert_eq!(matches.last().unwrap().node, root);
        assert_ne!(matches.first().unwrap().node, root);
    }

    #[test]
    fn test_other_file_types_do_not_match() {
        let set = schema_set(unit_schema(), &[]);
        let doc = JsonDocument::parse(r#"{"skins": ["a"]}"#);
        assert!(set.matching_schemas("laser.weapon", &doc).is_empty());
    }

    #[test]
    fn test_one_of_members_are_filtered_by_type() {
        let raw = json!({
            "type": "object",
            "properties": {
                "value": {
                    "oneOf": [
                        { "type": "string", "description": "as text" },
                        { "type": "object", "properties": { "id": { "type": "string" } } }
                    ]
                }
            }
        });
        let set = schema_set(raw, &[]);
        let doc = JsonDocument::parse(r#"{"value": "abc"}"#);
        let value = doc.node_at_pointer("/value").unwrap();

        let descriptions: Vec<_> = set
            .matching_schemas("x.unit", &doc)
            .iter()
            .filter(|m| m.node == value)
            .filter_map(|m| m.fragment().description.clone())
            .collect();
        assert_eq!(descriptions, vec!["as text".to_string()]);
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let raw = json!({
            "$ref": "#",
            "type": "object",
            "additionalProperties": { "$ref": "#" }
        });
        let set = schema_set(raw, &[]);
        let doc = JsonDocument::parse(r#"{"a": {"b": {"c": {}}}}"#);
        let matches = set.matching_schemas("x.unit", &doc);
        // The root once, every nested object through both fragments.
        assert_eq!(matches.len(), 7);
    }

    #[test]
    fn test_covers_includes_end_offset() {
        let set = schema_set(unit_schema(), &[]);
        let text = r#"{"skins": []}"#;
        let doc = JsonDocument::parse(text);
        let root_match = set
            .matching_schemas("x.unit", &doc)
            .into_iter()
            .find(|m| m.node == doc.root().unwrap())
            .unwrap();
        assert!(root_match.covers(&doc, 0));
        assert!(root_match.covers(&doc, text.len()));
        assert!(!root_match.covers(&doc, text.len() + 1));
    }
}
