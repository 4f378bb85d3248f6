//! The capability set the merge algorithm and the tree builder work against.
//!
//! Both output modes share one merge implementation; `Value` (canonical) and
//! `Node` (preserve) only provide map access and key construction.

use std::fmt;

use indexmap::IndexMap;

use crate::domain::node::{Entry, Node, NodeKind};
use crate::domain::scalar::Scalar;
use crate::domain::value::Value;

/// Mapping entries keyed by resolved key, each with its representation-specific
/// key (a bare scalar, or a key node carrying comments).
pub type Entries<F> = IndexMap<Scalar, (<F as Fragment>::Key, F)>;

pub trait Fragment: Clone + Sized + fmt::Debug {
    type Key: Clone + fmt::Debug;

    /// Lower a parsed syntax node into this representation.
    fn from_node(node: Node) -> Self;

    /// Key for an entry derived from a file or directory name.
    fn name_key(name: &str) -> Self::Key;

    fn is_mapping(&self) -> bool;

    /// Split a mapping into its entries, or hand the value back unchanged.
    fn into_entries(self) -> Result<Entries<Self>, Self>;

    fn from_entries(entries: Entries<Self>) -> Self;

    /// Remove and return comments trailing the whole fragment.
    fn take_foot(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Append comments trailing the whole fragment.
    fn append_foot(&mut self, _foot: Vec<String>) {}
}

impl Fragment for Value {
    type Key = Scalar;

    fn from_node(node: Node) -> Self {
        node.into_value()
    }

    fn name_key(name: &str) -> Scalar {
        Scalar::String(name.to_string())
    }

    fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    fn into_entries(self) -> Result<Entries<Self>, Self> {
        match self {
            Value::Mapping(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key.clone(), (key, value)))
                .collect()),
            other => Err(other),
        }
    }

    fn from_entries(entries: Entries<Self>) -> Self {
        Value::Mapping(entries.into_values().collect())
    }
}

impl Fragment for Node {
    type Key = Node;

    fn from_node(node: Node) -> Self {
        node
    }

    fn name_key(name: &str) -> Node {
        Node::name_key(name)
    }

    fn is_mapping(&self) -> bool {
        Node::is_mapping(self)
    }

    fn into_entries(self) -> Result<Entries<Self>, Self> {
        match self.kind {
            NodeKind::Mapping(entries) => Ok(entries
                .into_iter()
                .map(|(id, entry)| (id, (entry.key, entry.value)))
                .collect()),
            kind => Err(Node { kind, ..self }),
        }
    }

    fn from_entries(entries: Entries<Self>) -> Self {
        Node::new(NodeKind::Mapping(
            entries
                .into_iter()
                .map(|(id, (key, value))| (id, Entry { key, value }))
                .collect(),
        ))
    }

    fn take_foot(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments.foot)
    }

    fn append_foot(&mut self, mut foot: Vec<String>) {
        self.comments.foot.append(&mut foot);
    }
}
