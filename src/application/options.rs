//! Options for one compile run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::MergePolicy;
use crate::infrastructure::traits::{Logger, NoopLogger};

/// Which in-memory representation the pack is built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Sorted keys, no comments, fully resolved scalars.
    #[default]
    Canonical,
    /// Authored order, comments, scalar styles and tags.
    Preserve,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Canonical => f.write_str("canonical"),
            OutputMode::Preserve => f.write_str("preserve"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(OutputMode::Canonical),
            "preserve" => Ok(OutputMode::Preserve),
            other => Err(format!(
                "invalid mode '{other}' (expected canonical or preserve)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("invalid format '{other}' (expected yaml or json)")),
        }
    }
}

/// Immutable snapshot of everything the compiler needs for one run.
#[derive(Clone)]
pub struct PackOptions {
    pub enable_includes: bool,
    /// Absolute directory that include directives may not escape.
    pub pack_root: PathBuf,
    pub convert_booleans: bool,
    pub mode: OutputMode,
    pub merge: MergePolicy,
    pub logger: Arc<dyn Logger>,
}

impl PackOptions {
    /// Defaults with a silent logger: includes and boolean conversion off,
    /// canonical mode, shallow merge.
    pub fn new(pack_root: impl Into<PathBuf>) -> Self {
        Self {
            enable_includes: false,
            pack_root: pack_root.into(),
            convert_booleans: false,
            mode: OutputMode::default(),
            merge: MergePolicy::default(),
            logger: Arc::new(NoopLogger),
        }
    }

    pub fn with_includes(mut self, enabled: bool) -> Self {
        self.enable_includes = enabled;
        self
    }

    pub fn with_convert_booleans(mut self, enabled: bool) -> Self {
        self.convert_booleans = enabled;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }
}

impl fmt::Debug for PackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackOptions")
            .field("enable_includes", &self.enable_includes)
            .field("pack_root", &self.pack_root)
            .field("convert_booleans", &self.convert_booleans)
            .field("mode", &self.mode)
            .field("merge", &self.merge)
            .finish_non_exhaustive()
    }
}
