#![allow(non_snake_case)]

use super::*;
use protogen_core::ProtoType;
use std::fs;
use tempfile::TempDir;

const SAMPLE: &str = r#"
[mappings."chrono::DateTime"]
schema_name = "google.protobuf.Timestamp"
import_path = "google/protobuf/timestamp.proto"

[mappings.i64]
schema_name = "sint64"
"#;

#[test]
fn Config___parse___reads_mappings() {
    let config = Config::parse(SAMPLE).unwrap();

    assert_eq!(config.mappings.len(), 2);
    assert_eq!(
        config.mappings.get("chrono::DateTime"),
        Some(&ProtoType::message(
            "google.protobuf.Timestamp",
            "google/protobuf/timestamp.proto"
        ))
    );
    assert_eq!(config.mappings.get("i64"), Some(&ProtoType::scalar("sint64")));
}

#[test]
fn Config___parse___empty_is_default() {
    let config = Config::parse("").unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn Config___parse___rejects_unknown_sections() {
    let result = Config::parse("[plugins]\nname = \"gogo\"\n");

    assert!(result.is_err());
}

#[test]
fn Config___parse___rejects_malformed_toml() {
    let result = Config::parse("[mappings.\"i64\"\nschema_name = ");

    assert!(result.is_err());
}

#[test]
fn Config___transformer___rejects_invalid_mapping() {
    let config = Config::parse("[mappings.i64]\nschema_name = \"not valid\"\n").unwrap();

    let err = config.transformer().unwrap_err();

    assert!(format!("{err:#}").contains("i64"));
}

#[test]
fn Config___transformer___accepts_sample() {
    let config = Config::parse(SAMPLE).unwrap();

    assert!(config.transformer().is_ok());
}

#[test]
fn Config___from_file___reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("protogen.toml");
    fs::write(&path, SAMPLE).unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.mappings.len(), 2);
}

#[test]
fn Config___from_file___missing_file_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::from_file(&path).unwrap_err();

    assert!(err.to_string().contains("absent.toml"));
}
