//! Include directives resolved during a pack build.

mod common;

use tempfile::TempDir;

use common::{compile, compile_value, write, yaml_value};
use yamlpack::application::{ApplicationError, Document, OutputFormat, OutputMode, PackOptions};
use yamlpack::domain::{DomainError, IncludeFailure, Value};
use yamlpack::infrastructure::encode;

fn include_failure(err: ApplicationError) -> IncludeFailure {
    match err {
        ApplicationError::Domain(DomainError::Include { reason, .. }) => reason,
        other => panic!("expected include error, got {other:?}"),
    }
}

#[test]
fn given_structured_include_when_building_then_target_is_merged_in_place() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pack = root.join("pack");
    write(&pack, "app.yml", "name: api\ndb: !include ../shared/db.yml\n");
    write(root, "shared/db.yml", "host: localhost\nport: 5432\n");
    let options = PackOptions::new(root).with_includes(true);

    // Act
    let value = compile_value(&pack, &options).unwrap();

    // Assert
    assert_eq!(
        value,
        yaml_value("app:\n  name: api\n  db:\n    host: localhost\n    port: 5432\n")
    );
}

#[test]
fn given_transitive_include_when_building_then_resolved_relative_to_each_file() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "app.yml", "outer: !include .inc/a.yml\n");
    write(dir, ".inc/a.yml", "inner: !include nested/b.json\n");
    write(dir, ".inc/nested/b.json", "{\"leaf\": 1}");
    let options = PackOptions::new(dir).with_includes(true);

    let value = compile_value(dir, &options).unwrap();

    assert_eq!(
        value,
        yaml_value("app:\n  outer:\n    inner:\n      leaf: 1\n")
    );
}

#[test]
fn given_text_includes_when_building_then_substitutes_verbatim_text() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "motd.txt", "hello\nworld\n");
    write(
        dir,
        "app.yml",
        "motd: !include-text motd.txt\nbanner: \"<<include(motd.txt)>>\"\nmixed: \"[<<include( motd.txt )>>]\"\n",
    );
    let options = PackOptions::new(dir).with_includes(true);

    // Act
    let value = compile_value(dir, &options).unwrap();

    // Assert
    let app = value.get("app").unwrap();
    assert_eq!(app.get("motd"), Some(&Value::string("hello\nworld\n")));
    assert_eq!(app.get("banner"), Some(&Value::string("hello\nworld\n")));
    assert_eq!(app.get("mixed"), Some(&Value::string("[hello\nworld\n]")));
}

#[test]
fn given_legacy_include_escaping_pack_root_when_building_then_include_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    let pack = project.join("pack");
    write(temp.path(), "etc/passwd", "root:x:0:0\n");
    write(&pack, "leak.yml", "secret: \"<<include(../../etc/passwd)>>\"\n");
    let options = PackOptions::new(&pack).with_includes(true);

    // Act
    let err = compile(&pack, &options).unwrap_err();

    // Assert
    assert!(err.to_string().contains("could not open include"));
    assert_eq!(include_failure(err), IncludeFailure::OutsidePackRoot);
}

#[cfg(unix)]
#[test]
fn given_symlink_escaping_pack_root_when_including_then_include_error() {
    let temp = TempDir::new().unwrap();
    let pack = temp.path().join("pack");
    write(temp.path(), "outside.yml", "x: 1\n");
    write(&pack, "app.yml", "v: !include link.yml\n");
    std::os::unix::fs::symlink(temp.path().join("outside.yml"), pack.join("link.yml")).unwrap();
    let options = PackOptions::new(&pack).with_includes(true);

    let err = compile(&pack, &options).unwrap_err();

    assert_eq!(include_failure(err), IncludeFailure::OutsidePackRoot);
}

#[test]
fn given_missing_target_when_including_then_not_found() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "app.yml", "db: !include nope.yml\n");
    let options = PackOptions::new(temp.path()).with_includes(true);

    let err = compile(temp.path(), &options).unwrap_err();

    assert_eq!(include_failure(err), IncludeFailure::NotFound);
}

#[test]
fn given_include_cycle_when_building_then_cycle_detected() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "app.yml", "start: !include .inc/a.yml\n");
    write(dir, ".inc/a.yml", "next: !include b.yml\n");
    write(dir, ".inc/b.yml", "back: !include a.yml\n");
    let options = PackOptions::new(dir).with_includes(true);

    // Act
    let err = compile(dir, &options).unwrap_err();

    // Assert
    assert_eq!(include_failure(err), IncludeFailure::CycleDetected);
}

#[test]
fn given_same_file_included_twice_when_building_then_not_a_cycle() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "app.yml", "a: !include .inc/x.yml\nb: !include .inc/x.yml\n");
    write(dir, ".inc/x.yml", "v: 1\n");
    let options = PackOptions::new(dir).with_includes(true);

    let value = compile_value(dir, &options).unwrap();

    assert_eq!(value, yaml_value("app:\n  a:\n    v: 1\n  b:\n    v: 1\n"));
}

#[test]
fn given_includes_disabled_when_building_then_directives_are_plain_content() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    write(dir, "app.yml", "db: !include db.yml\nbanner: \"<<include(motd.txt)>>\"\n");
    let canonical = PackOptions::new(dir);
    let preserve = PackOptions::new(dir).with_mode(OutputMode::Preserve);

    // Act
    let value = compile_value(dir, &canonical).unwrap();
    let document = compile(dir, &preserve).unwrap();
    let text = encode(document.clone(), OutputFormat::Yaml, 2).unwrap();

    // Assert
    assert_eq!(
        value,
        yaml_value("app:\n  db: db.yml\n  banner: \"<<include(motd.txt)>>\"\n")
    );
    assert!(matches!(document, Some(Document::Preserve(_))));
    assert!(text.contains("db: !include db.yml"));
}

#[test]
fn given_include_naming_directory_when_building_then_not_found() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), ".inc/shared/x.yml", "v: 1\n");
    write(temp.path(), "app.yml", "db: !include .inc/shared\nnote: \"<<include(.inc)>>\"\n");
    let options = PackOptions::new(temp.path()).with_includes(true);

    let err = compile(temp.path(), &options).unwrap_err();

    assert_eq!(include_failure(err), IncludeFailure::NotFound);
}
