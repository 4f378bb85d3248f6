//! Byte-level encoder: documents to YAML or JSON text.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::application::{Document, OutputFormat};
use crate::domain::{Entry, Node, NodeKind, Scalar, ScalarStyle, Value};
use crate::infrastructure::{InfraError, InfraResult};

/// What an empty pack renders as, in either format.
pub const EMPTY_DOCUMENT: &str = "{}\n";

/// Encode a compiled pack. `None` (no content) renders as an empty mapping.
pub fn encode(document: Option<Document>, format: OutputFormat, indent: usize) -> InfraResult<String> {
    let Some(document) = document else {
        return Ok(EMPTY_DOCUMENT.to_string());
    };
    match format {
        OutputFormat::Yaml => Ok(YamlEmitter::new(indent).emit(&document.into_yaml_node())),
        OutputFormat::Json => encode_json(&document.into_json_value(), indent),
    }
}

// ============================================================
// JSON
// ============================================================

/// Pretty-print a value as JSON with `indent` spaces per level.
pub fn encode_json(value: &Value, indent: usize) -> InfraResult<String> {
    let spaces = vec![b' '; indent.max(1)];
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&spaces));
    to_json(value)
        .serialize(&mut serializer)
        .map_err(|e| InfraError::Encode(e.to_string()))?;
    let mut text = String::from_utf8(buf).map_err(|e| InfraError::Encode(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

/// NaN and infinities have no JSON form and become `null`.
fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Scalar(Scalar::Null) => Json::Null,
        Value::Scalar(Scalar::Bool(b)) => Json::Bool(*b),
        Value::Scalar(Scalar::Int(i)) => Json::from(*i),
        Value::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Scalar(Scalar::String(s)) => Json::String(s.clone()),
        Value::Sequence(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Mapping(map) => Json::Object(
            map.iter()
                .map(|(key, value)| (key.to_plain_text(), to_json(value)))
                .collect(),
        ),
    }
}

// ============================================================
// YAML
// ============================================================

/// Block-style YAML emitter for node trees.
///
/// Mappings and sequences are always written in block style, in the order the
/// tree holds them. Comments, tags and scalar styles on the nodes are
/// reproduced where block style can carry them.
#[derive(Debug, Clone, Copy)]
pub struct YamlEmitter {
    indent: usize,
}

impl YamlEmitter {
    pub fn new(indent: usize) -> Self {
        Self {
            indent: indent.max(1),
        }
    }

    pub fn emit(&self, root: &Node) -> String {
        let mut out = String::new();
        push_comments(&mut out, &root.comments.head, 0);
        match &root.kind {
            NodeKind::Mapping(entries) if !entries.is_empty() => {
                if let Some(tag) = &root.tag {
                    out.push_str(tag);
                    out.push('\n');
                }
                self.emit_mapping(&mut out, entries, 0);
            }
            NodeKind::Sequence(items) if !items.is_empty() => {
                if let Some(tag) = &root.tag {
                    out.push_str(tag);
                    out.push('\n');
                }
                self.emit_sequence(&mut out, items, 0);
            }
            _ => {
                out.push_str(&inline(root));
                push_line_comment(&mut out, root.comments.line.as_deref());
                out.push('\n');
            }
        }
        push_comments(&mut out, &root.comments.foot, 0);
        out
    }

    fn emit_mapping(&self, out: &mut String, entries: &indexmap::IndexMap<Scalar, Entry>, col: usize) {
        for entry in entries.values() {
            push_comments(out, &entry.key.comments.head, col);
            pad(out, col);
            out.push_str(&key_text(&entry.key));
            out.push(':');
            let comment = entry
                .key
                .comments
                .line
                .as_deref()
                .or(entry.value.comments.line.as_deref());
            self.emit_value(out, &entry.value, col + self.indent, comment, true);
        }
    }

    fn emit_sequence(&self, out: &mut String, items: &[Node], col: usize) {
        for item in items {
            push_comments(out, &item.comments.head, col);
            pad(out, col);
            out.push('-');

            // compact form: the first line of a nested block shares the dash line
            let nested = match &item.kind {
                NodeKind::Mapping(entries) if !entries.is_empty() && item.tag.is_none() => {
                    let mut block = String::new();
                    self.emit_mapping(&mut block, entries, col + 2);
                    Some(block)
                }
                NodeKind::Sequence(inner) if !inner.is_empty() && item.tag.is_none() => {
                    let mut block = String::new();
                    self.emit_sequence(&mut block, inner, col + 2);
                    Some(block)
                }
                _ => None,
            };
            match nested {
                Some(block) => {
                    out.push(' ');
                    out.push_str(&block[col + 2..]);
                    push_comments(out, &item.comments.foot, col + 2);
                }
                None => self.emit_value(out, item, col + 2, item.comments.line.as_deref(), false),
            }
        }
    }

    /// Write a value after `key:` or `-` on the current line. Nested blocks
    /// and block scalar bodies go at `child_col`; `in_mapping` tells whether a
    /// block scalar may use an indentation indicator.
    fn emit_value(
        &self,
        out: &mut String,
        value: &Node,
        child_col: usize,
        comment: Option<&str>,
        in_mapping: bool,
    ) {
        let tag = value.tag.as_deref();
        match &value.kind {
            NodeKind::Mapping(entries) if !entries.is_empty() => {
                push_tag(out, tag);
                push_line_comment(out, comment);
                out.push('\n');
                self.emit_mapping(out, entries, child_col);
                push_comments(out, &value.comments.foot, child_col);
            }
            NodeKind::Sequence(items) if !items.is_empty() => {
                push_tag(out, tag);
                push_line_comment(out, comment);
                out.push('\n');
                self.emit_sequence(out, items, child_col);
                push_comments(out, &value.comments.foot, child_col);
            }
            NodeKind::Scalar { text, style } => match self.block_scalar(text, *style, in_mapping) {
                Some(block) => {
                    push_tag(out, tag);
                    out.push(' ');
                    out.push_str(&block.header);
                    push_line_comment(out, comment);
                    out.push('\n');
                    for line in &block.lines {
                        if !line.is_empty() {
                            pad(out, child_col);
                            out.push_str(line);
                        }
                        out.push('\n');
                    }
                }
                None => {
                    push_tag(out, tag);
                    let text = inline(value);
                    if !text.is_empty() {
                        out.push(' ');
                        out.push_str(&text);
                    }
                    push_line_comment(out, comment);
                    out.push('\n');
                }
            },
            _ => {
                push_tag(out, tag);
                out.push(' ');
                out.push_str(&inline(value));
                push_line_comment(out, comment);
                out.push('\n');
            }
        }
    }

    /// Header and body lines for a literal or folded scalar, or `None` when
    /// the text cannot be written in block style and must be quoted.
    fn block_scalar(&self, text: &str, style: ScalarStyle, in_mapping: bool) -> Option<BlockScalar> {
        if !matches!(style, ScalarStyle::Literal | ScalarStyle::Folded) {
            return None;
        }
        if text.trim_matches('\n').is_empty()
            || text.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
        {
            return None;
        }

        let body = text.trim_end_matches('\n');
        let chomp = match text.len() - body.len() {
            0 => "-",
            1 => "",
            _ => "+",
        };
        let source: Vec<&str> = body.split('\n').collect();

        let leading_space = source
            .iter()
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with([' ', '\t']));
        let indicator = if leading_space {
            if !in_mapping || self.indent > 9 {
                return None;
            }
            self.indent.to_string()
        } else {
            String::new()
        };

        let folded = style == ScalarStyle::Folded
            && !source.iter().any(|line| line.starts_with([' ', '\t']));
        let mut lines: Vec<String> = Vec::with_capacity(source.len());
        for (idx, line) in source.iter().enumerate() {
            lines.push((*line).to_string());
            // a single break between two folded lines needs an empty line
            if folded && !line.is_empty() && idx + 1 < source.len() {
                lines.push(String::new());
            }
        }
        if chomp == "+" {
            let extra = text.len() - body.len() - 1;
            lines.extend(std::iter::repeat(String::new()).take(extra));
        }

        let marker = if folded { '>' } else { '|' };
        Some(BlockScalar {
            header: format!("{marker}{indicator}{chomp}"),
            lines,
        })
    }
}

struct BlockScalar {
    header: String,
    lines: Vec<String>,
}

fn pad(out: &mut String, col: usize) {
    out.extend(std::iter::repeat(' ').take(col));
}

fn push_comments(out: &mut String, comments: &[String], col: usize) {
    for comment in comments {
        pad(out, col);
        out.push_str(comment);
        out.push('\n');
    }
}

fn push_line_comment(out: &mut String, comment: Option<&str>) {
    if let Some(comment) = comment {
        out.push(' ');
        out.push_str(comment);
    }
}

fn push_tag(out: &mut String, tag: Option<&str>) {
    if let Some(tag) = tag {
        out.push(' ');
        out.push_str(tag);
    }
}

fn key_text(key: &Node) -> String {
    match &key.tag {
        Some(tag) => format!("{tag} {}", inline(key)),
        None => inline(key),
    }
}

/// Single-line form of a scalar or an empty collection.
fn inline(node: &Node) -> String {
    match &node.kind {
        NodeKind::Mapping(_) => "{}".to_string(),
        NodeKind::Sequence(_) => "[]".to_string(),
        NodeKind::Scalar { text, style } => match style {
            ScalarStyle::Plain if !text.contains('\n') => text.clone(),
            ScalarStyle::SingleQuoted if !text.chars().any(char::is_control) => {
                format!("'{}'", text.replace('\'', "''"))
            }
            _ => double_quoted(text),
        },
    }
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
