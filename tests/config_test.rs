//! Environment overrides for settings.
//!
//! Kept in its own test binary with a single test: it mutates the process
//! environment.

use tempfile::TempDir;

use yamlpack::application::{OutputFormat, OutputMode};
use yamlpack::config::{Settings, LOCAL_CONFIG_FILE};
use yamlpack::domain::MergePolicy;

#[test]
fn given_env_vars_when_loading_then_override_files_and_bad_values_fail() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let global = temp.path().join("global.toml");
    std::fs::write(&global, "format = \"yaml\"\nindent = 3\n").unwrap();
    std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), "mode = \"preserve\"\n").unwrap();
    std::env::set_var("YAMLPACK_FORMAT", "json");
    std::env::set_var("YAMLPACK_MERGE", "deep");
    std::env::set_var("YAMLPACK_INCLUDES", "true");

    // Act
    let settings = Settings::load_from(Some(&global), Some(temp.path())).unwrap();

    // Assert
    assert_eq!(settings.format, OutputFormat::Json);
    assert_eq!(settings.merge, MergePolicy::Deep);
    assert_eq!(settings.mode, OutputMode::Preserve);
    assert_eq!(settings.indent, 3);
    assert!(settings.includes);

    // Act: an invalid override is a config error, not a silent default
    std::env::set_var("YAMLPACK_MERGE", "union");
    let result = Settings::load_from(Some(&global), Some(temp.path()));

    // Assert
    assert!(result.is_err());

    std::env::remove_var("YAMLPACK_FORMAT");
    std::env::remove_var("YAMLPACK_MERGE");
    std::env::remove_var("YAMLPACK_INCLUDES");
}
