//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use yamlpack::application::{ApplicationResult, Document, PackOptions};
use yamlpack::application::services::{parse_source, SourceFormat};
use yamlpack::domain::Value;
use yamlpack::infrastructure::traits::{DirEntry, FileSystem, Logger, RealFileSystem};
use yamlpack::util::testing::init_test_setup;
use yamlpack::PackService;

/// Write `content` to `dir/rel`, creating parent directories.
pub fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Parse a YAML snippet into a canonical value for comparisons.
pub fn yaml_value(text: &str) -> Value {
    parse_source(text, SourceFormat::Yaml, Path::new("expected.yml"))
        .unwrap()
        .map(|node| node.into_value())
        .unwrap_or_else(Value::empty_mapping)
}

pub fn compile(dir: &Path, options: &PackOptions) -> ApplicationResult<Option<Document>> {
    init_test_setup();
    PackService::new(Arc::new(RealFileSystem)).compile(dir, options)
}

/// Compile in canonical mode and return the value, panicking on empty packs.
pub fn compile_value(dir: &Path, options: &PackOptions) -> ApplicationResult<Value> {
    match compile(dir, options)? {
        Some(Document::Canonical(value)) => Ok(value),
        other => panic!("expected a canonical document, got {other:?}"),
    }
}

/// Logger that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    pub debugs: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn debugs(&self) -> Vec<String> {
        self.debugs.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.debugs.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

/// Real filesystem whose directory listings come back in a different order
/// on every call.
#[derive(Debug)]
pub struct PermutingFileSystem {
    calls: AtomicUsize,
    seed: usize,
}

impl PermutingFileSystem {
    pub fn new(seed: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seed,
        }
    }
}

impl FileSystem for PermutingFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = RealFileSystem.read_dir(path)?;
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + self.seed;
        entries.sort_by(|a, b| b.name.cmp(&a.name));
        if !entries.is_empty() {
            let len = entries.len();
            entries.rotate_left(call % len);
        }
        if call % 2 == 1 {
            entries.reverse();
        }
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        RealFileSystem.read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        RealFileSystem.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        RealFileSystem.is_dir(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        RealFileSystem.canonicalize(path)
    }
}
