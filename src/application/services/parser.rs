//! Fragment parser: one file's text to a syntax-node tree.
//!
//! YAML goes through the `yaml-rust2` event parser and JSON through
//! `serde_json`; both produce the same `Node` tree. Canonical mode lowers that
//! tree to plain values afterwards, so anchors, tags and scalar styles are
//! interpreted in exactly one place.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use tracing::instrument;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::application::services::comments::SourceLines;
use crate::application::services::include::IncludeResolver;
use crate::application::{ApplicationResult, IoResultExt, PackOptions};
use crate::domain::{
    normalize_booleans, Comments, DomainError, Entry, Node, NodeKind, Scalar, ScalarStyle,
};
use crate::infrastructure::traits::FileSystem;

/// Grammar of a fragment file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// `.yml`/`.yaml` and `.json`; anything else is not a fragment.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(SourceFormat::Yaml),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// Parse source text into a node tree.
///
/// Returns `None` for an empty document (empty file, comments only).
pub fn parse_source(
    text: &str,
    format: SourceFormat,
    path: &Path,
) -> Result<Option<Node>, DomainError> {
    match format {
        SourceFormat::Yaml => parse_yaml(text, path),
        SourceFormat::Json => parse_json(text, path),
    }
}

/// Reads, decodes and post-processes fragment files for one compile run.
pub struct FragmentParser<'a> {
    fs: &'a dyn FileSystem,
    options: &'a PackOptions,
}

impl<'a> FragmentParser<'a> {
    pub fn new(fs: &'a dyn FileSystem, options: &'a PackOptions) -> Self {
        Self { fs, options }
    }

    /// Parse one fragment file.
    ///
    /// Includes are resolved first, then the top level is checked to be a
    /// mapping, then boolean spellings are normalized. An empty or null
    /// document yields `None`.
    #[instrument(level = "trace", skip(self))]
    pub fn parse_file(&self, path: &Path) -> ApplicationResult<Option<Node>> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read fragment", path)?;
        let format = SourceFormat::from_path(path).unwrap_or(SourceFormat::Yaml);

        let Some(mut node) = parse_source(&text, format, path)? else {
            return Ok(None);
        };

        if self.options.enable_includes {
            let mut resolver = IncludeResolver::new(self.fs, &self.options.pack_root)?;
            resolver.resolve_file(path, &mut node)?;
        }

        if is_null_document(&node) {
            return Ok(None);
        }
        if !node.is_mapping() {
            return Err(DomainError::Shape {
                path: path.to_path_buf(),
                found: node.kind_name().to_string(),
            }
            .into());
        }

        if self.options.convert_booleans {
            normalize_booleans(&mut node);
        }
        Ok(Some(node))
    }
}

fn is_null_document(node: &Node) -> bool {
    node.tag.is_none() && node.resolve() == Some(Scalar::Null)
}

// ============================================================
// YAML
// ============================================================

fn parse_yaml(text: &str, path: &Path) -> Result<Option<Node>, DomainError> {
    let mut builder = NodeBuilder::new(text);
    let mut parser = Parser::new_from_str(text);
    parser
        .load(&mut builder, false)
        .map_err(|e| DomainError::syntax(path, e.to_string()))?;
    builder.finish().map_err(|message| DomainError::syntax(path, message))
}

/// Where the next node lands in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Key,
    Value,
    Item,
}

enum Frame {
    Sequence {
        anchor: usize,
        tag: Option<String>,
        comments: Comments,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        tag: Option<String>,
        comments: Comments,
        entries: IndexMap<Scalar, Entry>,
        pending_key: Option<Node>,
        /// Entries inherited through a `<<` merge key, with the position of
        /// the merge key among the explicit entries.
        merged: Option<(usize, IndexMap<Scalar, Entry>)>,
    },
}

/// Event receiver building a `Node` tree, with anchors expanded and comments
/// matched back from the source lines.
struct NodeBuilder<'s> {
    lines: SourceLines<'s>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
    error: Option<String>,
}

impl<'s> NodeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            lines: SourceLines::new(source),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            error: None,
        }
    }

    fn finish(self) -> Result<Option<Node>, String> {
        match self.error {
            Some(message) => Err(message),
            None => Ok(self.root),
        }
    }

    fn position(&self) -> Position {
        match self.stack.last() {
            None => Position::Root,
            Some(Frame::Sequence { .. }) => Position::Item,
            Some(Frame::Mapping {
                pending_key: None, ..
            }) => Position::Key,
            Some(Frame::Mapping { .. }) => Position::Value,
        }
    }

    /// Comments for a node starting at `marker`. Keys and scalar items take
    /// the trailing comment of their line; collection items only the head.
    fn start_comments(&mut self, marker: &Marker, is_scalar: bool) -> Comments {
        let line = self.lines.line_of(marker.index());
        match self.position() {
            Position::Key => Comments {
                head: self.lines.take_head(line),
                line: self.lines.take_line_comment(line),
                foot: Vec::new(),
            },
            Position::Item => Comments {
                head: self.lines.take_head(line),
                line: if is_scalar {
                    self.lines.take_line_comment(line)
                } else {
                    None
                },
                foot: Vec::new(),
            },
            Position::Root | Position::Value => Comments::default(),
        }
    }

    fn complete(&mut self, node: Node, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        self.attach(node);
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                merged,
                ..
            }) => match pending_key.take() {
                None => {
                    if matches!(node.kind, NodeKind::Scalar { .. }) {
                        *pending_key = Some(node);
                    } else {
                        self.error = Some(format!(
                            "a {} cannot be used as a mapping key",
                            node.kind_name()
                        ));
                    }
                }
                Some(key) if is_merge_key(&key) => {
                    if merged.is_some() {
                        self.error = Some("duplicate key '<<'".to_string());
                        return;
                    }
                    match merge_sources(node) {
                        Ok(mut inherited) => {
                            if let Some((_, first)) = inherited.get_index_mut(0) {
                                let mut head = key.comments.head;
                                head.append(&mut first.key.comments.head);
                                first.key.comments.head = head;
                            }
                            *merged = Some((entries.len(), inherited));
                        }
                        Err(message) => self.error = Some(message),
                    }
                }
                Some(key) => {
                    let id = key.resolve().unwrap_or(Scalar::Null);
                    if entries.contains_key(&id) {
                        self.error = Some(format!("duplicate key '{id}'"));
                    } else {
                        entries.insert(id, Entry { key, value: node });
                    }
                }
            },
        }
    }
}

/// A plain, untagged `<<` key (or one tagged `!!merge`).
fn is_merge_key(key: &Node) -> bool {
    let NodeKind::Scalar { text, style } = &key.kind else {
        return false;
    };
    text == "<<"
        && match key.tag.as_deref() {
            None => *style == ScalarStyle::Plain,
            Some(tag) => tag == "!!merge",
        }
}

/// Entries a merge key contributes. With a sequence of mappings, earlier
/// mappings win.
fn merge_sources(value: Node) -> Result<IndexMap<Scalar, Entry>, String> {
    let found = value.kind_name();
    let sources = match value.kind {
        NodeKind::Mapping(entries) => vec![entries],
        NodeKind::Sequence(items) => items
            .into_iter()
            .map(|item| {
                let found = item.kind_name();
                match item.kind {
                    NodeKind::Mapping(entries) => Ok(entries),
                    _ => Err(format!("merge key '<<' expects mappings, found a {found}")),
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
        NodeKind::Scalar { .. } => {
            return Err(format!(
                "merge key '<<' expects a mapping or a sequence of mappings, found {found}"
            ))
        }
    };

    let mut merged = IndexMap::new();
    for entries in sources {
        for (id, entry) in entries {
            merged.entry(id).or_insert(entry);
        }
    }
    Ok(merged)
}

/// Splice inherited entries in at the merge key's position. Explicit keys
/// win over inherited ones.
fn with_merged(
    entries: IndexMap<Scalar, Entry>,
    merged: Option<(usize, IndexMap<Scalar, Entry>)>,
) -> IndexMap<Scalar, Entry> {
    let Some((at, inherited)) = merged else {
        return entries;
    };
    let mut inherited: Vec<(Scalar, Entry)> = inherited
        .into_iter()
        .filter(|(id, _)| !entries.contains_key(id))
        .collect();

    let mut result = IndexMap::with_capacity(entries.len() + inherited.len());
    for (index, (id, entry)) in entries.into_iter().enumerate() {
        if index == at {
            result.extend(inherited.drain(..));
        }
        result.insert(id, entry);
    }
    result.extend(inherited);
    result
}

impl MarkedEventReceiver for NodeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(text, style, anchor, tag) => {
                let comments = self.start_comments(&marker, true);
                let style = scalar_style(style);
                if matches!(style, ScalarStyle::Literal | ScalarStyle::Folded) {
                    let line = self.lines.line_of(marker.index());
                    self.lines.mark_block_scalar(line);
                }
                let node = Node {
                    kind: NodeKind::Scalar { text, style },
                    tag: tag.as_ref().map(tag_text),
                    comments,
                };
                self.complete(node, anchor);
            }
            Event::SequenceStart(anchor, tag) => {
                let comments = self.start_comments(&marker, false);
                self.stack.push(Frame::Sequence {
                    anchor,
                    tag: tag.as_ref().map(tag_text),
                    comments,
                    items: Vec::new(),
                });
            }
            Event::MappingStart(anchor, tag) => {
                let comments = self.start_comments(&marker, false);
                self.stack.push(Frame::Mapping {
                    anchor,
                    tag: tag.as_ref().map(tag_text),
                    comments,
                    entries: IndexMap::new(),
                    pending_key: None,
                    merged: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (anchor, node) = match self.stack.pop() {
                    Some(Frame::Sequence {
                        anchor,
                        tag,
                        comments,
                        items,
                    }) => (
                        anchor,
                        Node {
                            kind: NodeKind::Sequence(items),
                            tag,
                            comments,
                        },
                    ),
                    Some(Frame::Mapping {
                        anchor,
                        tag,
                        comments,
                        entries,
                        merged,
                        ..
                    }) => (
                        anchor,
                        Node {
                            kind: NodeKind::Mapping(with_merged(entries, merged)),
                            tag,
                            comments,
                        },
                    ),
                    None => {
                        self.error = Some("unbalanced collection end".to_string());
                        return;
                    }
                };
                self.complete(node, anchor);
            }
            Event::Alias(id) => {
                let comments = self.start_comments(&marker, true);
                match self.anchors.get(&id).cloned() {
                    Some(mut node) => {
                        node.comments = comments;
                        self.attach(node);
                    }
                    None => self.error = Some(format!("unknown anchor {id}")),
                }
            }
            Event::DocumentEnd => {
                let foot = self.lines.take_foot();
                if let Some(root) = self.root.as_mut() {
                    root.comments.foot = foot;
                }
            }
            _ => {}
        }
    }
}

fn scalar_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

/// Tag as it would be written in a document: `!!str`, `!include`.
fn tag_text(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "!!" | "tag:yaml.org,2002:" => format!("!!{}", tag.suffix),
        "" => format!("!<{}>", tag.suffix),
        handle => format!("{handle}{}", tag.suffix),
    }
}

// ============================================================
// JSON
// ============================================================

fn parse_json(text: &str, path: &Path) -> Result<Option<Node>, DomainError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DomainError::syntax(path, e.to_string()))?;
    Ok(Some(json_to_node(value)))
}

/// JSON strings count as quoted scalars; everything else is plain.
fn json_to_node(value: serde_json::Value) -> Node {
    use serde_json::Value as Json;

    match value {
        Json::Null => Node::plain("null"),
        Json::Bool(b) => Node::plain(b.to_string()),
        Json::Number(n) => Node::plain(n.to_string()),
        Json::String(s) => Node::scalar(s, ScalarStyle::DoubleQuoted),
        Json::Array(items) => {
            Node::new(NodeKind::Sequence(items.into_iter().map(json_to_node).collect()))
        }
        Json::Object(map) => Node::new(NodeKind::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let entry = Entry {
                        key: Node::scalar(key.clone(), ScalarStyle::DoubleQuoted),
                        value: json_to_node(value),
                    };
                    (Scalar::String(key), entry)
                })
                .collect(),
        )),
    }
}
