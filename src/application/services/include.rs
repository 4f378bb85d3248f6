//! Include resolver: `!include`, `!include-text` and `<<include(path)>>`.
//!
//! Every target is resolved against the directory of the file that names it
//! and must stay inside the pack root, checked lexically before anything is
//! opened and again on the canonical path so symlinks cannot escape.

use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::debug;

use crate::application::services::parser::{parse_source, SourceFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::node::scalar_node;
use crate::domain::{Comments, DomainError, IncludeFailure, Node, NodeKind, Scalar};
use crate::infrastructure::traits::FileSystem;
use crate::util::path::{is_within, lexical_normalize};

/// Tag that merges the parsed target into the tagged position.
pub const INCLUDE_TAG: &str = "!include";
/// Tag that substitutes the target's text as a string.
pub const INCLUDE_TEXT_TAG: &str = "!include-text";

const LEGACY_PATTERN: &str = r"<<include\(\s*([^()]*?)\s*\)>>";

pub struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
    canonical_root: PathBuf,
    legacy: Regex,
    /// Canonical paths of the files currently being resolved, outermost first.
    stack: Vec<PathBuf>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, pack_root: &Path) -> ApplicationResult<Self> {
        let legacy =
            Regex::new(LEGACY_PATTERN).map_err(|e| ApplicationError::OperationFailed {
                context: "compile include pattern".to_string(),
                source: Box::new(e),
            })?;
        let root = lexical_normalize(pack_root);
        let canonical_root = fs.canonicalize(pack_root).unwrap_or_else(|_| root.clone());
        Ok(Self {
            fs,
            root,
            canonical_root,
            legacy,
            stack: Vec::new(),
        })
    }

    /// Resolve every directive in `node`, which was parsed from `file`.
    pub fn resolve_file(&mut self, file: &Path, node: &mut Node) -> ApplicationResult<()> {
        let canonical = self
            .fs
            .canonicalize(file)
            .unwrap_or_else(|_| lexical_normalize(file));
        self.stack.push(canonical);
        let result = self.resolve_node(node, file);
        self.stack.pop();
        result
    }

    fn resolve_node(&mut self, node: &mut Node, file: &Path) -> ApplicationResult<()> {
        match node.tag.as_deref() {
            Some(INCLUDE_TAG) => {
                let included = self.include_structured(node, file)?;
                *node = included;
                return Ok(());
            }
            Some(INCLUDE_TEXT_TAG) => {
                let included = self.include_text(node, file)?;
                *node = included;
                return Ok(());
            }
            _ => {}
        }

        if matches!(node.kind, NodeKind::Scalar { .. }) {
            return self.expand_legacy(node, file);
        }
        match &mut node.kind {
            NodeKind::Scalar { .. } => Ok(()),
            NodeKind::Sequence(items) => items
                .iter_mut()
                .try_for_each(|item| self.resolve_node(item, file)),
            NodeKind::Mapping(entries) => entries
                .values_mut()
                .try_for_each(|entry| self.resolve_node(&mut entry.value, file)),
        }
    }

    fn include_structured(&mut self, directive: &Node, file: &Path) -> ApplicationResult<Node> {
        let (target, canonical) = self.target(directive, file)?;
        if self.stack.contains(&canonical) {
            return Err(DomainError::include(target, IncludeFailure::CycleDetected).into());
        }
        debug!("include {} from {}", target.display(), file.display());

        let text = self
            .fs
            .read_to_string(&target)
            .with_path_context("read include", &target)?;
        let format = SourceFormat::from_path(&target).unwrap_or(SourceFormat::Yaml);
        let mut included = parse_source(&text, format, &target)?.unwrap_or_else(|| Node::plain("null"));

        self.stack.push(canonical);
        let result = self.resolve_node(&mut included, &target);
        self.stack.pop();
        result?;

        included.comments = position_comments(&directive.comments, included.comments.foot);
        Ok(included)
    }

    fn include_text(&mut self, directive: &Node, file: &Path) -> ApplicationResult<Node> {
        let (target, _) = self.target(directive, file)?;
        debug!("include text {} from {}", target.display(), file.display());

        let text = self
            .fs
            .read_to_string(&target)
            .with_path_context("read include", &target)?;
        let mut node = scalar_node(&Scalar::String(text));
        node.comments = directive.comments.clone();
        Ok(node)
    }

    /// Substitute every `<<include(path)>>` inside a string scalar.
    fn expand_legacy(&self, node: &mut Node, file: &Path) -> ApplicationResult<()> {
        let NodeKind::Scalar { text, style } = &node.kind else {
            return Ok(());
        };
        if !self.legacy.is_match(text) {
            return Ok(());
        }

        let mut failure = None;
        let expanded = self
            .legacy
            .replace_all(text, |caps: &Captures| {
                let relative = caps.get(1).map_or("", |m| m.as_str());
                match self.read_text_target(relative, file) {
                    Ok(content) => content,
                    Err(e) => {
                        failure.get_or_insert(e);
                        String::new()
                    }
                }
            })
            .into_owned();
        if let Some(e) = failure {
            return Err(e);
        }

        let style = *style;
        let replaced = if style.is_quoted() && !expanded.contains('\n') {
            Node::scalar(expanded, style)
        } else {
            scalar_node(&Scalar::String(expanded))
        };
        node.kind = replaced.kind;
        Ok(())
    }

    fn read_text_target(&self, relative: &str, file: &Path) -> ApplicationResult<String> {
        let (target, _) = self.locate(relative, file)?;
        debug!("include text {} from {}", target.display(), file.display());
        self.fs
            .read_to_string(&target)
            .with_path_context("read include", &target)
    }

    fn target(&self, directive: &Node, file: &Path) -> ApplicationResult<(PathBuf, PathBuf)> {
        match &directive.kind {
            NodeKind::Scalar { text, .. } if !text.trim().is_empty() => self.locate(text.trim(), file),
            _ => Err(DomainError::syntax(
                file,
                format!(
                    "{} expects a file path, found {}",
                    directive.tag.as_deref().unwrap_or(INCLUDE_TAG),
                    directive.kind_name()
                ),
            )
            .into()),
        }
    }

    /// Resolve `relative` against the directory of `file` and enforce the
    /// pack boundary. Returns the lexical and the canonical target path.
    fn locate(&self, relative: &str, file: &Path) -> ApplicationResult<(PathBuf, PathBuf)> {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let target = lexical_normalize(&dir.join(relative));
        if !is_within(&target, &self.root) {
            return Err(DomainError::include(target, IncludeFailure::OutsidePackRoot).into());
        }
        // a directory is not an includable file
        if !self.fs.exists(&target) || self.fs.is_dir(&target) {
            return Err(DomainError::include(target, IncludeFailure::NotFound).into());
        }
        let canonical = self
            .fs
            .canonicalize(&target)
            .with_path_context("resolve include", &target)?;
        if !canonical.starts_with(&self.canonical_root) {
            return Err(DomainError::include(target, IncludeFailure::OutsidePackRoot).into());
        }
        Ok((target, canonical))
    }
}

/// Comments for a node that replaces a directive: the directive's own
/// position comments, the replacement's foot.
fn position_comments(directive: &Comments, foot: Vec<String>) -> Comments {
    Comments {
        head: directive.head.clone(),
        line: directive.line.clone(),
        foot,
    }
}
