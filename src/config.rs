//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/yamlpack/yamlpack.toml`
//! 3. Local config: `<pack_dir>/.yamlpack.toml`
//! 4. Environment variables: `YAMLPACK_*` prefix
//!
//! Command-line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, OutputFormat, OutputMode};
use crate::domain::MergePolicy;

/// Name of the pack-local config file.
pub const LOCAL_CONFIG_FILE: &str = ".yamlpack.toml";

/// Build defaults for yamlpack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Output format: yaml or json
    pub format: OutputFormat,
    /// Output mode: canonical or preserve
    pub mode: OutputMode,
    /// Merge strategy: shallow or deep
    pub merge: MergePolicy,
    /// Indent width of the output
    pub indent: usize,
    /// Resolve include directives
    pub includes: bool,
    /// Convert y/yes/on and n/no/off to booleans
    pub convert_booleans: bool,
    /// Include boundary (default: the pack directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Yaml,
            mode: OutputMode::Canonical,
            merge: MergePolicy::Shallow,
            indent: 2,
            includes: false,
            convert_booleans: false,
            pack_root: None,
        }
    }
}

/// Settings as read from one file: `None` means "not specified, inherit".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    format: Option<String>,
    mode: Option<String>,
    merge: Option<String>,
    indent: Option<i64>,
    includes: Option<bool>,
    convert_booleans: Option<bool>,
    pack_root: Option<PathBuf>,
}

/// Get the XDG config directory for yamlpack.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "yamlpack").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("yamlpack.toml"))
}

/// Get the path to the local config file of a pack directory.
pub fn local_config_path(pack_dir: &Path) -> PathBuf {
    pack_dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_field<T: FromStr<Err = String>>(value: &str) -> Result<T, ApplicationError> {
    value.parse::<T>().map_err(ApplicationError::config)
}

fn parse_indent(value: i64) -> Result<usize, ApplicationError> {
    usize::try_from(value)
        .ok()
        .filter(|&indent| indent >= 1)
        .ok_or_else(|| ApplicationError::config(format!("invalid indent {value} (must be >= 1)")))
}

impl Settings {
    /// Apply a file layer: specified values replace, unspecified ones inherit.
    ///
    /// A relative `pack_root` is taken relative to `base`, the directory that
    /// holds the file.
    fn merge_with(mut self, overlay: RawSettings, base: Option<&Path>) -> Result<Self, ApplicationError> {
        if let Some(format) = overlay.format {
            self.format = parse_field(&format)?;
        }
        if let Some(mode) = overlay.mode {
            self.mode = parse_field(&mode)?;
        }
        if let Some(merge) = overlay.merge {
            self.merge = parse_field(&merge)?;
        }
        if let Some(indent) = overlay.indent {
            self.indent = parse_indent(indent)?;
        }
        if let Some(includes) = overlay.includes {
            self.includes = includes;
        }
        if let Some(convert) = overlay.convert_booleans {
            self.convert_booleans = convert;
        }
        if let Some(root) = overlay.pack_root {
            self.pack_root = Some(match base {
                Some(base) if root.is_relative() && !root.starts_with("~") => base.join(root),
                _ => root,
            });
        }
        Ok(self)
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `pack_dir` - Optional pack directory for the local config file
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/yamlpack/yamlpack.toml`
    /// 3. Local config: `<pack_dir>/.yamlpack.toml`
    /// 4. Environment variables: `YAMLPACK_*` prefix
    pub fn load(pack_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|path| path.exists());
        Self::load_from(global.as_deref(), pack_dir)
    }

    /// Same as [`Settings::load`] with an explicit global config file.
    pub fn load_from(global: Option<&Path>, pack_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global {
            let raw = load_raw_settings(global_path)?;
            current = current.merge_with(raw, None)?;
        }

        // 3. Pack-local config
        if let Some(dir) = pack_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(raw, Some(dir))?;
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths()?;
        current.validate()?;
        Ok(current)
    }

    /// Apply YAMLPACK_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("YAMLPACK").try_parsing(true))
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            format: config.get_string("format").ok(),
            mode: config.get_string("mode").ok(),
            merge: config.get_string("merge").ok(),
            indent: optional(config.get_int("indent"))?,
            includes: optional(config.get_bool("includes"))?,
            convert_booleans: optional(config.get_bool("convert_booleans"))?,
            pack_root: config.get_string("pack_root").ok().map(PathBuf::from),
        };
        settings.merge_with(raw, None)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the pack root.
    fn expand_paths(&mut self) -> Result<(), ApplicationError> {
        if let Some(root) = &self.pack_root {
            let raw = root.to_string_lossy();
            let expanded = shellexpand::full(&raw).map_err(|e| ApplicationError::Config {
                message: format!("pack_root {raw}: {e}"),
            })?;
            self.pack_root = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Reject values that would make a build meaningless.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.indent < 1 {
            return Err(ApplicationError::config(format!(
                "invalid indent {} (must be >= 1)",
                self.indent
            )));
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# yamlpack configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/yamlpack/yamlpack.toml
#   Local:  <pack_dir>/.yamlpack.toml
#   Env:    YAMLPACK_* environment variables
#   Flags:  command-line options win over everything

# Output format: "yaml" or "json"
# format = "yaml"

# Output mode: "canonical" (sorted, no comments) or "preserve"
# (authored order, comments and styles kept)
# mode = "canonical"

# Merge strategy for repeated keys: "shallow" or "deep"
# merge = "shallow"

# Indent width of the output
# indent = 2

# Resolve !include, !include-text and <<include(path)>>
# includes = false

# Convert unquoted y/yes/on and n/no/off to true/false
# convert_booleans = false

# Directory includes may not escape (default: the pack directory).
# Relative paths in a local config are relative to the pack directory.
# pack_root = "~/packs"
"#
        .to_string()
    }
}

/// A missing key is `None`; a present but malformed one is an error.
fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
