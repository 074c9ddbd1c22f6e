//! Typed view over a raw JSON Schema.
//!
//! A schema document is compiled once into an arena of [`SchemaFragment`]s.
//! Every fragment remembers the JSON Pointer it was compiled from, so pointer
//! markers attached by the annotator can be addressed by path, and local
//! `$ref`s resolve to the fragment compiled for the referenced path.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::pointer::PointerType;

pub type FragmentId = usize;

const MAX_REF_CHAIN: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    Single(FragmentId),
    Tuple(Vec<FragmentId>),
}

#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub pattern: String,
    /// `None` when the pattern is not a valid regex; such entries never match
    /// a property name but still take part in context resolution.
    pub regex: Option<Regex>,
    pub fragment: FragmentId,
}

impl PartialEq for PatternProperty {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.fragment == other.fragment
    }
}

impl PatternProperty {
    pub fn matches(&self, key: &str) -> bool {
        self.regex.as_ref().map(|re| re.is_match(key)).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFragment {
    /// JSON Pointer of this fragment inside the schema document.
    pub path: String,
    pub pointer: PointerType,
    pub types: Vec<String>,
    /// In declaration order.
    pub properties: Vec<(String, FragmentId)>,
    pub pattern_properties: Vec<PatternProperty>,
    pub additional_properties: Option<FragmentId>,
    pub items: Option<Items>,
    pub all_of: Vec<FragmentId>,
    pub any_of: Vec<FragmentId>,
    pub one_of: Vec<FragmentId>,
    pub reference: Option<FragmentId>,
    pub required: Vec<String>,
    pub enum_values: Vec<Value>,
    pub description: Option<String>,
}

impl SchemaFragment {
    pub fn property(&self, key: &str) -> Option<FragmentId> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, id)| *id)
    }
}

/// A compiled schema document with its pointer annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSchema {
    pub raw: Value,
    fragments: Vec<SchemaFragment>,
    root: FragmentId,
    by_path: HashMap<String, FragmentId>,
}

impl AnnotatedSchema {
    /// Compiles `raw` and marks the fragments found at the given paths.
    ///
    /// Marker paths that do not address a node of `raw` are ignored.
    pub fn compile(raw: Value, markers: &[(String, PointerType)]) -> AnnotatedSchema {
        let mut compiler = Compiler {
            raw: &raw,
            fragments: Vec::new(),
            by_path: HashMap::new(),
        };

        let root = compiler.compile("");
        for defs in ["$defs", "definitions"] {
            if let Some(Value::Object(entries)) = raw.get(defs) {
                for name in entries.keys() {
                    compiler.compile(&format!("/{}/{}", defs, escape_token(name)));
                }
            }
        }
        for (path, _) in markers {
            if raw.pointer(path).is_some() {
                compiler.compile(path);
            }
        }
        for (path, pointer) in markers {
            if let Some(&id) = compiler.by_path.get(path) {
                compiler.fragments[id].pointer = *pointer;
            }
        }

        let Compiler {
            fragments, by_path, ..
        } = compiler;

        AnnotatedSchema {
            raw,
            fragments,
            root,
            by_path,
        }
    }

    pub fn root(&self) -> FragmentId {
        self.root
    }

    pub fn fragment(&self, id: FragmentId) -> &SchemaFragment {
        &self.fragments[id]
    }

    pub fn fragments(&self) -> impl Iterator<Item = (FragmentId, &SchemaFragment)> {
        self.fragments.iter().enumerate()
    }

    pub fn fragment_at(&self, path: &str) -> Option<FragmentId> {
        self.by_path.get(path).copied()
    }

    /// The marker of a fragment, looking through `$ref` when the fragment
    /// itself carries none.
    pub fn effective_pointer(&self, id: FragmentId) -> PointerType {
        self.ref_chain(id)
            .map(|fragment| fragment.pointer)
            .find(|pointer| !pointer.is_none())
            .unwrap_or_default()
    }

    /// The first description along the `$ref` chain.
    pub fn effective_description(&self, id: FragmentId) -> Option<&str> {
        self.ref_chain(id)
            .find_map(|fragment| fragment.description.as_deref())
    }

    /// The first non-empty `enum` along the `$ref` chain.
    pub fn effective_enum(&self, id: FragmentId) -> &[Value] {
        self.ref_chain(id)
            .map(|fragment| fragment.enum_values.as_slice())
            .find(|values| !values.is_empty())
            .unwrap_or(&[])
    }

    /// The declared types, looking through `$ref`.
    pub fn effective_types(&self, id: FragmentId) -> &[String] {
        self.ref_chain(id)
            .map(|fragment| fragment.types.as_slice())
            .find(|types| !types.is_empty())
            .unwrap_or(&[])
    }

    fn ref_chain(&self, id: FragmentId) -> impl Iterator<Item = &SchemaFragment> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let fragment = self.fragment(next?);
            next = fragment.reference;
            Some(fragment)
        })
        .take(MAX_REF_CHAIN)
    }
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

struct Compiler<'a> {
    raw: &'a Value,
    fragments: Vec<SchemaFragment>,
    by_path: HashMap<String, FragmentId>,
}

impl Compiler<'_> {
    fn compile(&mut self, path: &str) -> FragmentId {
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }

        let id = self.fragments.len();
        self.fragments.push(SchemaFragment {
            path: path.to_string(),
            ..Default::default()
        });
        self.by_path.insert(path.to_string(), id);

        let raw = self.raw;
        let Some(Value::Object(schema)) = raw.pointer(path) else {
            // Boolean schemas and dangling paths accept anything.
            return id;
        };

        let mut fragment = SchemaFragment {
            path: path.to_string(),
            ..Default::default()
        };

        fragment.types = match schema.get("type") {
            Some(Value::String(ty)) => vec![ty.clone()],
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(|ty| ty.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        if let Some(Value::Object(properties)) = schema.get("properties") {
            let names: Vec<String> = properties.keys().cloned().collect();
            for name in names {
                let child = self.compile(&format!("{}/properties/{}", path, escape_token(&name)));
                fragment.properties.push((name, child));
            }
        }

        if let Some(Value::Object(patterns)) = schema.get("patternProperties") {
            let patterns: Vec<String> = patterns.keys().cloned().collect();
            for pattern in patterns {
                let child =
                    self.compile(&format!("{}/patternProperties/{}", path, escape_token(&pattern)));
                let regex = match Regex::new(&pattern) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        tracing::warn!(pattern = %pattern, "invalid patternProperties regex: {}", err);
                        None
                    }
                };
                fragment.pattern_properties.push(PatternProperty {
                    pattern,
                    regex,
                    fragment: child,
                });
            }
        }

        if let Some(Value::Object(_)) = schema.get("additionalProperties") {
            fragment.additional_properties =
                Some(self.compile(&format!("{}/additionalProperties", path)));
        }

        if let Some(Value::Array(prefix)) = schema.get("prefixItems") {
            let ids = (0..prefix.len())
                .map(|idx| self.compile(&format!("{}/prefixItems/{}", path, idx)))
                .collect();
            fragment.items = Some(Items::Tuple(ids));
        } else {
            match schema.get("items") {
                Some(Value::Object(_)) => {
                    fragment.items = Some(Items::Single(self.compile(&format!("{}/items", path))));
                }
                Some(Value::Array(tuple)) => {
                    let ids = (0..tuple.len())
                        .map(|idx| self.compile(&format!("{}/items/{}", path, idx)))
                        .collect();
                    fragment.items = Some(Items::Tuple(ids));
                }
                _ => {}
            }
        }

        fragment.all_of = self.compile_list(schema.get("allOf"), path, "allOf");
        fragment.any_of = self.compile_list(schema.get("anyOf"), path, "anyOf");
        fragment.one_of = self.compile_list(schema.get("oneOf"), path, "oneOf");

        if let Some(Value::String(reference)) = schema.get("$ref") {
            match reference.strip_prefix('#') {
                Some(target) if raw.pointer(target).is_some() => {
                    fragment.reference = Some(self.compile(target));
                }
                _ => tracing::debug!(reference = %reference, "unresolved $ref"),
            }
        }

        if let Some(Value::Array(required)) = schema.get("required") {
            fragment.required = required
                .iter()
                .filter_map(|name| name.as_str().map(str::to_string))
                .collect();
        }

        if let Some(Value::Array(values)) = schema.get("enum") {
            fragment.enum_values = values.clone();
        } else if let Some(value) = schema.get("const") {
            fragment.enum_values = vec![value.clone()];
        }

        fragment.description = schema
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        self.fragments[id] = fragment;
        id
    }

    fn compile_list(&mut self, list: Option<&Value>, path: &str, keyword: &str) -> Vec<FragmentId> {
        match list {
            Some(Value::Array(members)) => (0..members.len())
                .map(|idx| self.compile(&format!("{}/{}/{}", path, keyword, idx)))
                .collect(),
            _ => Vec::new(),
        }
    }
}
