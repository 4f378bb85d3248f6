//! Preserve representation: a syntax-node tree that keeps authored order,
//! comments, scalar styles and tags.

use indexmap::IndexMap;

use crate::domain::scalar::{resolve_plain, Scalar};
use crate::domain::value::Value;

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    pub fn is_quoted(self) -> bool {
        !matches!(self, ScalarStyle::Plain)
    }
}

/// Comments attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Full-line comments directly above the node, `#` included.
    pub head: Vec<String>,
    /// Trailing comment on the node's line, `#` included.
    pub line: Option<String>,
    /// Comments after the node's last child (document level only).
    pub foot: Vec<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.line.is_none() && self.foot.is_empty()
    }
}

/// One mapping entry. The key node keeps its own comments and style.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Node,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar { text: String, style: ScalarStyle },
    Sequence(Vec<Node>),
    /// Entries keyed by the resolved key, in authored order.
    Mapping(IndexMap<Scalar, Entry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Tag as written, e.g. `!include` or `!!str`.
    pub tag: Option<String>,
    pub comments: Comments,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            comments: Comments::default(),
        }
    }

    pub fn scalar(text: impl Into<String>, style: ScalarStyle) -> Self {
        Self::new(NodeKind::Scalar {
            text: text.into(),
            style,
        })
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::scalar(text, ScalarStyle::Plain)
    }

    pub fn empty_mapping() -> Self {
        Self::new(NodeKind::Mapping(IndexMap::new()))
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    /// Node for a key derived from a file or directory name.
    pub fn name_key(name: &str) -> Self {
        let style = if needs_quotes(name) {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::Plain
        };
        Self::scalar(name, style)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<Scalar, Entry>> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a string key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()
            .and_then(|entries| entries.get(&Scalar::String(key.to_string())))
            .map(|entry| &entry.value)
    }

    pub fn scalar_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Resolve a scalar node to its typed value.
    ///
    /// Quoted and block scalars are strings. Plain scalars follow the core
    /// schema unless a standard tag forces the type.
    pub fn resolve(&self) -> Option<Scalar> {
        let NodeKind::Scalar { text, style } = &self.kind else {
            return None;
        };
        let forced = match self.tag.as_deref() {
            Some("!!str") => Some(Scalar::String(text.clone())),
            Some("!!null") => Some(Scalar::Null),
            Some("!!bool") | Some("!!int") | Some("!!float") => Some(resolve_plain(text)),
            _ => None,
        };
        if let Some(scalar) = forced {
            return Some(scalar);
        }
        if style.is_quoted() {
            Some(Scalar::String(text.clone()))
        } else {
            Some(resolve_plain(text))
        }
    }

    /// Short type name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Scalar { .. } => match self.resolve() {
                Some(Scalar::Null) => "null",
                Some(Scalar::Bool(_)) => "bool",
                Some(Scalar::Int(_)) => "int",
                Some(Scalar::Float(_)) => "float",
                _ => "string",
            },
        }
    }

    /// Lower into a plain value, dropping comments, styles and order.
    pub fn into_value(self) -> Value {
        match self.kind {
            NodeKind::Scalar { .. } => Value::Scalar(self.resolve().unwrap_or(Scalar::Null)),
            NodeKind::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Node::into_value).collect())
            }
            NodeKind::Mapping(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, entry)| (key, entry.value.into_value()))
                    .collect(),
            ),
        }
    }

    /// Build a node from a plain value. Styles are chosen so the value reads back
    /// unchanged.
    pub fn from_value(value: Value) -> Node {
        match value {
            Value::Scalar(scalar) => scalar_node(&scalar),
            Value::Sequence(items) => {
                Node::new(NodeKind::Sequence(items.into_iter().map(Node::from_value).collect()))
            }
            Value::Mapping(map) => Node::new(NodeKind::Mapping(
                map.into_iter()
                    .map(|(key, value)| {
                        let entry = Entry {
                            key: scalar_node(&key),
                            value: Node::from_value(value),
                        };
                        (key, entry)
                    })
                    .collect(),
            )),
        }
    }
}

/// Build the node for a resolved scalar.
pub fn scalar_node(scalar: &Scalar) -> Node {
    match scalar {
        Scalar::String(s) if s.contains('\n') => Node::scalar(s.clone(), ScalarStyle::Literal),
        Scalar::String(s) if needs_quotes(s) => Node::scalar(s.clone(), ScalarStyle::DoubleQuoted),
        Scalar::String(s) => Node::plain(s.clone()),
        other => Node::plain(other.to_plain_text()),
    }
}

/// Whether a string must be quoted to read back as the same string.
///
/// YAML 1.1 boolean spellings are quoted as well, so older readers do not
/// take them for booleans.
pub fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || !resolve_plain(s).is_string() {
        return true;
    }
    if crate::domain::scalar::legacy_boolean(s).is_some() {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    let last = s.chars().last().unwrap_or(' ');
    if first.is_whitespace() || last.is_whitespace() {
        return true;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }
    s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
        || s.chars().any(|c| c.is_control())
        || s.starts_with("<<")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_quoted_scalar_when_resolving_then_is_string() {
        let node = Node::scalar("42", ScalarStyle::DoubleQuoted);
        assert_eq!(node.resolve(), Some(Scalar::String("42".into())));
    }

    #[test]
    fn given_str_tag_when_resolving_then_is_string() {
        let node = Node::plain("true").with_tag(Some("!!str".into()));
        assert_eq!(node.resolve(), Some(Scalar::String("true".into())));
    }

    #[test]
    fn given_plain_number_when_resolving_then_is_int() {
        assert_eq!(Node::plain("123").resolve(), Some(Scalar::Int(123)));
    }

    #[test]
    fn given_ambiguous_strings_when_checking_quotes_then_quotes_them() {
        assert!(needs_quotes("123"));
        assert!(needs_quotes("yes"));
        assert!(needs_quotes(""));
        assert!(needs_quotes("a: b"));
        assert!(needs_quotes("- item"));
        assert!(!needs_quotes("us-east-1"));
        assert!(!needs_quotes("hello world"));
    }

    #[test]
    fn given_value_when_round_tripping_through_node_then_is_unchanged() {
        let node = Node::from_value(Value::string("0x10"));
        assert_eq!(node.clone().into_value(), Value::string("0x10"));
        assert!(matches!(
            node.kind,
            NodeKind::Scalar {
                style: ScalarStyle::DoubleQuoted,
                ..
            }
        ));
    }
}
