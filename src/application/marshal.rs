//! Marshaler adapter: turns a finished pack into what the encoder consumes.

use crate::domain::{normalize_keys, Fragment, Node, PackNode, Value};

/// A compiled pack in the representation of its output mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Canonical(Value),
    Preserve(Node),
}

impl Document {
    /// Node tree for the YAML emitter. Canonical values get quoting styles
    /// that read back as the same types.
    pub fn into_yaml_node(self) -> Node {
        match self {
            Document::Canonical(value) => Node::from_value(value),
            Document::Preserve(node) => node,
        }
    }

    /// Plain values for the JSON encoder, with every key a string.
    ///
    /// Preserve-mode metadata has no JSON form and is dropped.
    pub fn into_json_value(self) -> Value {
        let value = match self {
            Document::Canonical(value) => value,
            Document::Preserve(node) => node.into_value(),
        };
        normalize_keys(value)
    }
}

/// Fragment types that can be handed to the encoder.
pub trait IntoDocument: Fragment {
    fn into_document(self) -> Document;
}

impl IntoDocument for Value {
    fn into_document(self) -> Document {
        Document::Canonical(self)
    }
}

impl IntoDocument for Node {
    fn into_document(self) -> Document {
        Document::Preserve(self)
    }
}

/// Collapse the root level into a document; an empty pack stays `None`.
pub fn marshal<F: IntoDocument>(root: Option<PackNode<F>>) -> Option<Document> {
    root.map(|level| level.into_fragment().into_document())
}
