//! Tree builder behavior through the PackService entry point:
//! - `@`-entries collapse into the current level
//! - shallow and deep merge of repeated keys
//! - non-map fragments are rejected
//! - empty subtrees are dropped

mod common;

use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use common::{compile, compile_value, write, yaml_value, RecordingLogger};
use yamlpack::application::{ApplicationError, PackOptions};
use yamlpack::domain::{DomainError, MergePolicy, Value};

// ============================================================
// collapse
// ============================================================

#[test]
fn given_shared_collapse_file_when_building_then_keys_merge_into_level() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("entities");
    write(&dir, "@shared.yml", "region: us-east-1\n");
    write(&dir, "item1.yml", "entity:\n  id: e1\n");

    // Act
    let value = compile_value(&dir, &PackOptions::new(&dir)).unwrap();

    // Assert
    assert_eq!(
        value,
        yaml_value("region: us-east-1\nitem1:\n  entity:\n    id: e1\n")
    );
    assert!(value.get("shared").is_none());
    assert!(value.get("@shared").is_none());
}

#[test]
fn given_collapse_directory_when_building_then_subtree_lands_in_parent() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "@common/region.yml", "name: eu\n");
    write(dir, "@common/nested/deep.yml", "x: 1\n");
    write(dir, "app.yml", "port: 80\n");

    // Act
    let value = compile_value(dir, &PackOptions::new(dir)).unwrap();

    // Assert
    assert_eq!(
        value,
        yaml_value("region:\n  name: eu\nnested:\n  deep:\n    x: 1\napp:\n  port: 80\n")
    );
}

#[test]
fn given_collapse_dir_and_file_with_same_name_when_building_then_file_wins() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "@common/settings.yml", "a: 1\n");
    write(dir, "@common.yml", "settings:\n  b: 2\n");

    // Act
    let value = compile_value(dir, &PackOptions::new(dir)).unwrap();

    // Assert
    assert_eq!(value, yaml_value("settings:\n  b: 2\n"));
}

#[test]
fn given_nested_directories_when_building_then_levels_are_keyed_by_name() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "services/api/limits.yaml", "rps: 10\n");
    write(dir, "services/web.json", "{\"replicas\": 2}");

    let value = compile_value(dir, &PackOptions::new(dir)).unwrap();

    assert_eq!(
        value,
        yaml_value("services:\n  api:\n    limits:\n      rps: 10\n  web:\n    replicas: 2\n")
    );
}

#[test]
fn given_hidden_and_foreign_files_when_building_then_ignored() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, ".git/config.yml", "core: x\n");
    write(dir, ".hidden.yml", "secret: 1\n");
    write(dir, ".yamlpack.toml", "merge = \"deep\"\n");
    write(dir, "README.md", "# docs\n");
    write(dir, "app.yml", "port: 80\n");

    let value = compile_value(dir, &PackOptions::new(dir)).unwrap();

    assert_eq!(value, yaml_value("app:\n  port: 80\n"));
}

// ============================================================
// merge strategy
// ============================================================

fn merge_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "@1-base.yml", "config:\n  a: 1\n  nested:\n    x: 1\n");
    write(temp.path(), "@2-override.yml", "config:\n  b: 2\n  nested:\n    y: 2\n");
    temp
}

#[rstest]
#[case(MergePolicy::Shallow, "config:\n  b: 2\n  nested:\n    y: 2\n")]
#[case(MergePolicy::Deep, "config:\n  a: 1\n  b: 2\n  nested:\n    x: 1\n    y: 2\n")]
fn given_two_contributions_when_merging_then_policy_decides(
    #[case] policy: MergePolicy,
    #[case] expected: &str,
) {
    // Arrange
    let temp = merge_fixture();
    let options = PackOptions::new(temp.path()).with_merge(policy);

    // Act
    let value = compile_value(temp.path(), &options).unwrap();

    // Assert
    assert_eq!(value, yaml_value(expected));
}

#[test]
fn given_same_basename_across_extensions_when_deep_merging_then_combined() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "db.json", "{\"host\": \"localhost\", \"ports\": [1, 2]}");
    write(dir, "db.yml", "user: admin\nports: [3]\n");
    let options = PackOptions::new(dir).with_merge(MergePolicy::Deep);

    let value = compile_value(dir, &options).unwrap();

    // json sorts before yml, so the yml sequence replaces the json one
    assert_eq!(
        value,
        yaml_value("db:\n  host: localhost\n  user: admin\n  ports: [3]\n")
    );
}

// ============================================================
// shape and syntax errors
// ============================================================

#[rstest]
#[case("hello\n")]
#[case("42\n")]
#[case("true\n")]
#[case("- a\n- b\n")]
fn given_non_map_fragment_when_building_then_shape_error(#[case] content: &str) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let bad = write(temp.path(), "bad.yml", content);

    // Act
    let err = compile(temp.path(), &PackOptions::new(temp.path())).unwrap_err();

    // Assert
    match err {
        ApplicationError::Domain(DomainError::Shape { path, .. }) => {
            assert_eq!(path.file_name(), bad.file_name());
        }
        other => panic!("expected shape error, got {other:?}"),
    }
}

#[test]
fn given_malformed_yaml_when_building_then_syntax_error_names_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "broken.yml", "a: [1, 2\n");

    let err = compile(temp.path(), &PackOptions::new(temp.path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(DomainError::Syntax { .. })));
    assert!(err.to_string().contains("broken.yml"));
}

#[test]
fn given_duplicate_key_when_building_then_syntax_error() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "dup.yml", "a: 1\na: 2\n");

    let err = compile(temp.path(), &PackOptions::new(temp.path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(DomainError::Syntax { .. })));
}

#[test]
fn given_missing_directory_when_building_then_io_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");

    let err = compile(&missing, &PackOptions::new(temp.path())).unwrap_err();

    assert!(err.is_not_found());
}

// ============================================================
// empty trees
// ============================================================

#[test]
fn given_only_empty_subdirectories_when_building_then_none_and_warning() {
    // Arrange
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("a")).unwrap();
    std::fs::create_dir_all(temp.path().join("b/c")).unwrap();
    let logger = Arc::new(RecordingLogger::default());
    let options = PackOptions::new(temp.path()).with_logger(logger.clone());

    // Act
    let document = compile(temp.path(), &options).unwrap();

    // Assert
    assert!(document.is_none());
    assert_eq!(logger.warnings().len(), 1);
    assert!(logger.warnings()[0].contains("no content"));
}

#[test]
fn given_empty_subdirectory_next_to_content_when_building_then_dropped() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("empty/deeper")).unwrap();
    write(temp.path(), "comments-only.yml", "# nothing here\n");
    write(temp.path(), "app.yml", "port: 80\n");

    let value = compile_value(temp.path(), &PackOptions::new(temp.path())).unwrap();

    assert_eq!(value, yaml_value("app:\n  port: 80\n"));
}

#[test]
fn given_explicit_empty_map_when_building_then_key_is_kept() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "placeholder.yml", "{}\n");

    let value = compile_value(temp.path(), &PackOptions::new(temp.path())).unwrap();

    assert_eq!(value.get("placeholder"), Some(&Value::empty_mapping()));
}

#[test]
fn given_fragments_when_building_then_logs_each_processed_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.yml", "x: 1\n");
    write(temp.path(), "sub/b.yml", "y: 2\n");
    let logger = Arc::new(RecordingLogger::default());
    let options = PackOptions::new(temp.path()).with_logger(logger.clone());

    compile(temp.path(), &options).unwrap();

    let debugs = logger.debugs();
    assert_eq!(debugs.iter().filter(|m| m.starts_with("processing")).count(), 2);
    assert!(debugs.iter().any(|m| m.ends_with("a.yml")));
    assert!(debugs.iter().any(|m| m.ends_with("b.yml")));
}

#[cfg(unix)]
#[test]
fn given_symlink_to_ancestor_when_building_then_skipped_with_warning() {
    // Arrange
    let temp = TempDir::new().unwrap();
    write(temp.path(), "sub/a.yml", "x: 1\n");
    std::os::unix::fs::symlink(temp.path(), temp.path().join("sub/loop")).unwrap();
    let logger = Arc::new(RecordingLogger::default());
    let options = PackOptions::new(temp.path()).with_logger(logger.clone());

    // Act
    let value = compile_value(temp.path(), &options).unwrap();

    // Assert
    assert_eq!(value, yaml_value("sub:\n  a:\n    x: 1\n"));
    assert!(logger.warnings().iter().any(|w| w.contains("symlink loop")));
}
