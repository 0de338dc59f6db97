//! Conformance tests that run YAML fixtures against weft
//!
//! Run with: cargo test -p weft-test --test conformance --features weft-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};
use weft_test::fixture::Fixture;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {e}", path.display());
    });
    assert!(!fixtures.is_empty(), "{} has no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_basic_pointcuts() {
    run_fixture_file("basic.yaml");
}

#[test]
fn test_patterns() {
    run_fixture_file("patterns.yaml");
}

#[test]
fn test_composition() {
    run_fixture_file("composition.yaml");
}

#[test]
fn test_control_flow() {
    run_fixture_file("control_flow.yaml");
}

#[test]
fn test_config_errors() {
    run_fixture_file("errors.yaml");
}

#[test]
fn every_fixture_file_is_covered() {
    let mut files: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml"))
        .collect();
    files.sort();
    assert_eq!(
        files,
        ["basic.yaml", "composition.yaml", "control_flow.yaml", "errors.yaml", "patterns.yaml"]
    );
}
