//! Tree builder: walks a pack directory and merges its fragments level by level.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::application::services::parser::{FragmentParser, SourceFormat};
use crate::application::{ApplicationResult, IoResultExt, PackOptions};
use crate::domain::{Fragment, PackChild, PackNode, Scalar};
use crate::infrastructure::traits::{DirEntry, EntryKind, FileSystem};

/// Prefix of entries that merge into the current level instead of nesting.
pub const COLLAPSE_PREFIX: char = '@';

/// How a directory entry contributes to its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// `@name/`: subtree merges into the current level.
    CollapseDir,
    /// `@name.yml`: mapping merges into the current level.
    CollapseFile,
    /// `name/`: nested level under key `name`.
    Dir(String),
    /// `name.yml`: fragment under key `name`.
    File(String),
    Ignored,
}

impl Contribution {
    pub fn classify(entry: &DirEntry) -> Self {
        if entry.name.starts_with('.') {
            return Contribution::Ignored;
        }
        let collapse = entry.name.starts_with(COLLAPSE_PREFIX);
        match entry.kind {
            EntryKind::Dir if collapse => Contribution::CollapseDir,
            EntryKind::Dir => Contribution::Dir(entry.name.clone()),
            EntryKind::File if SourceFormat::from_path(&entry.path).is_some() => {
                if collapse {
                    Contribution::CollapseFile
                } else {
                    Contribution::File(file_stem(&entry.name).to_string())
                }
            }
            _ => Contribution::Ignored,
        }
    }
}

/// Name without its final extension: `a.b.yml` gives `a.b`.
fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// Processing order within a level: `@`-entries first, then byte-wise by name.
///
/// Names are unique within a directory, so the order is total and does not
/// depend on how the filesystem lists entries.
pub fn processing_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_plain = !a.name.starts_with(COLLAPSE_PREFIX);
    let b_plain = !b.name.starts_with(COLLAPSE_PREFIX);
    a_plain
        .cmp(&b_plain)
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
}

/// Builds a `PackNode` tree from a directory, in either representation.
pub struct PackBuilder<'a> {
    fs: &'a dyn FileSystem,
    options: &'a PackOptions,
    parser: FragmentParser<'a>,
}

impl<'a> PackBuilder<'a> {
    pub fn new(fs: &'a dyn FileSystem, options: &'a PackOptions) -> Self {
        Self {
            fs,
            options,
            parser: FragmentParser::new(fs, options),
        }
    }

    /// Build the pack rooted at `dir`.
    ///
    /// Returns `None` when no fragment anywhere below `dir` contributes a key.
    #[instrument(level = "debug", skip(self))]
    pub fn build<F: Fragment>(&self, dir: &Path) -> ApplicationResult<Option<PackNode<F>>> {
        let canonical = self
            .fs
            .canonicalize(dir)
            .with_path_context("read directory", dir)?;
        let mut ancestors = vec![canonical];
        let level = self.build_level::<F>(dir, &mut ancestors)?;

        if level.is_empty() {
            self.options
                .logger
                .warn(&format!("pack {} has no content", dir.display()));
            return Ok(None);
        }
        Ok(Some(level))
    }

    fn build_level<F: Fragment>(
        &self,
        dir: &Path,
        ancestors: &mut Vec<PathBuf>,
    ) -> ApplicationResult<PackNode<F>> {
        let mut entries = self
            .fs
            .read_dir(dir)
            .with_path_context("read directory", dir)?;
        entries.sort_by(processing_order);

        let policy = self.options.merge;
        let mut level = PackNode::<F>::new();
        for entry in entries {
            match Contribution::classify(&entry) {
                Contribution::Ignored => continue,
                Contribution::CollapseDir => {
                    let Some(child) = self.build_subdir::<F>(&entry.path, ancestors)? else {
                        continue;
                    };
                    level.absorb(child, policy);
                }
                Contribution::Dir(name) => {
                    let Some(child) = self.build_subdir::<F>(&entry.path, ancestors)? else {
                        continue;
                    };
                    level.merge_child(
                        Scalar::String(name.clone()),
                        F::name_key(&name),
                        PackChild::Level(child),
                        policy,
                    );
                }
                Contribution::CollapseFile => {
                    let Some(fragment) = self.load_fragment::<F>(&entry.path)? else {
                        continue;
                    };
                    // the parser only hands out mappings
                    if level.merge_fragment(fragment, policy).is_err() {
                        continue;
                    }
                }
                Contribution::File(name) => {
                    let Some(fragment) = self.load_fragment::<F>(&entry.path)? else {
                        continue;
                    };
                    level.merge_child(
                        Scalar::String(name.clone()),
                        F::name_key(&name),
                        PackChild::Value(fragment),
                        policy,
                    );
                }
            }
            level.add_source(&entry.path);
        }
        Ok(level)
    }

    /// Build a subdirectory, or `None` if it is empty or loops back to an ancestor.
    fn build_subdir<F: Fragment>(
        &self,
        dir: &Path,
        ancestors: &mut Vec<PathBuf>,
    ) -> ApplicationResult<Option<PackNode<F>>> {
        let canonical = self
            .fs
            .canonicalize(dir)
            .with_path_context("read directory", dir)?;
        if ancestors.contains(&canonical) {
            self.options.logger.warn(&format!(
                "skipping {}: symlink loop back to {}",
                dir.display(),
                canonical.display()
            ));
            return Ok(None);
        }

        ancestors.push(canonical);
        let level = self.build_level::<F>(dir, ancestors);
        ancestors.pop();

        let level = level?;
        Ok((!level.is_empty()).then_some(level))
    }

    fn load_fragment<F: Fragment>(&self, path: &Path) -> ApplicationResult<Option<F>> {
        self.options
            .logger
            .debug(&format!("processing {}", path.display()));
        Ok(self.parser.parse_file(path)?.map(F::from_node))
    }
}
