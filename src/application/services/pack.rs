//! Pack service: the entry point that compiles a directory into a document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::marshal::{marshal, Document};
use crate::application::services::builder::PackBuilder;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, OutputMode, PackOptions};
use crate::domain::{Node, PackNode, Value};
use crate::infrastructure::traits::FileSystem;

/// Service compiling pack directories.
pub struct PackService {
    fs: Arc<dyn FileSystem>,
}

impl PackService {
    /// Create a new pack service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Compile `dir` into a document in the mode chosen by `options`.
    ///
    /// Returns `None` for a pack without content; rendering that is up to
    /// the caller.
    #[instrument(level = "debug", skip(self, options))]
    pub fn compile(&self, dir: &Path, options: &PackOptions) -> ApplicationResult<Option<Document>> {
        let (dir, options) = self.prepare(dir, options)?;
        let builder = PackBuilder::new(self.fs.as_ref(), &options);
        let document = match options.mode {
            OutputMode::Canonical => marshal(builder.build::<Value>(&dir)?),
            OutputMode::Preserve => marshal(builder.build::<Node>(&dir)?),
        };
        debug!("compiled {}: empty={}", dir.display(), document.is_none());
        Ok(document)
    }

    /// Build the level structure of `dir` without collapsing it, for display.
    pub fn structure(&self, dir: &Path, options: &PackOptions) -> ApplicationResult<Option<PackNode<Value>>> {
        let (dir, options) = self.prepare(dir, options)?;
        PackBuilder::new(self.fs.as_ref(), &options).build::<Value>(&dir)
    }

    /// Resolve the pack directory and the pack root to canonical paths so
    /// include boundary checks compare like with like.
    fn prepare(&self, dir: &Path, options: &PackOptions) -> ApplicationResult<(PathBuf, PackOptions)> {
        let dir = self
            .fs
            .canonicalize(dir)
            .with_path_context("read directory", dir)?;
        if !self.fs.is_dir(&dir) {
            return Err(ApplicationError::Io {
                context: format!("read directory: {}", dir.display()),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
        let pack_root = self.fs.canonicalize(&options.pack_root).map_err(|e| {
            ApplicationError::config(format!(
                "pack root {}: {e}",
                options.pack_root.display()
            ))
        })?;

        let mut options = options.clone();
        options.pack_root = pack_root;
        Ok((dir, options))
    }
}
