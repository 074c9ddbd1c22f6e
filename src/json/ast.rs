//! Node types of the JSON syntax tree.

/// Index of a node inside its [`super::JsonDocument`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object,
    Array,
    /// A `"key": value` pair. Children are `[key]` or `[key, value]`.
    Property,
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl NodeKind {
    /// The JSON Schema type name of this node.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Property => "property",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Boolean(_) => "boolean",
            NodeKind::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Byte offset of the first character of the node.
    pub offset: usize,
    /// Length in bytes, delimiters included.
    pub length: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl AstNode {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Whether `offset` lies inside `[offset, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == NodeKind::Null
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
    pub length: usize,
}
