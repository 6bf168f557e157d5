//! App descriptor parsing, error-message and validation integration tests.

use assert_fs::prelude::*;
use cartographer_core::{
    apps, types::DestinationName, types::SourceName, AppDescriptor, ConfigError,
};
use predicates::prelude::*;
use rstest::rstest;

const FULL_APP: &str = r#"
sources:
  - name: platform
    github: acme/platform-config
    path: shared
    branch: release
    files:
      - config.yaml
      - policies/limits.yaml
destinations:
  - name: billing
    github: acme/billing
    path: deploy
  - name: search
    github: acme/search
routes:
  - sources: [platform]
    destination: billing
    objectTypes: [ConfigMap]
"#;

// ---------------------------------------------------------------------------
// 1. Parsing
// ---------------------------------------------------------------------------

#[test]
fn full_descriptor_parses_every_field() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("platform.yaml");
    file.write_str(FULL_APP).expect("write");

    let app = apps::load_app_at(file.path()).expect("load");

    assert_eq!(app.sources.len(), 1);
    let source = &app.sources[0];
    assert_eq!(source.name, SourceName::from("platform"));
    assert_eq!(source.repo.to_string(), "acme/platform-config");
    assert_eq!(source.path, "shared");
    assert_eq!(source.reference(), Some("release"));
    assert_eq!(source.files, vec!["config.yaml", "policies/limits.yaml"]);

    assert_eq!(app.destinations.len(), 2);
    assert_eq!(app.destinations[1].path, "");
    assert_eq!(app.destinations[1].branch(), None);

    assert_eq!(app.routes[0].destination, DestinationName::from("billing"));
    assert_eq!(app.routes[0].object_types, vec!["ConfigMap"]);
}

#[test]
fn routes_restrict_pairings() {
    let app: AppDescriptor = serde_yaml::from_str(FULL_APP).expect("parse");
    let pairs = app.pairings();
    assert_eq!(pairs.len(), 1, "search is not routed");
    assert_eq!(pairs[0].1.name, DestinationName::from("billing"));
}

// ---------------------------------------------------------------------------
// 2. Error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("broken.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = apps::load_app_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(predicate::str::contains("broken.yaml").eval(&err.to_string()));
}

#[rstest]
#[case::no_slash("sources:\n  - name: a\n    github: acme\n")]
#[case::empty_repo("sources:\n  - name: a\n    github: \"acme/\"\n")]
#[case::too_deep("destinations:\n  - name: d\n    github: acme/x/y\n")]
fn bad_locator_is_a_parse_error(#[case] yaml: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("app.yaml");
    file.write_str(yaml).expect("write");

    let err = apps::load_app_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(
        err.to_string().contains("owner/repo"),
        "locator hint missing: {err}"
    );
}

#[rstest]
#[case::unknown_source(
    "routes:\n  - sources: [ghost]\n    destination: d\n",
    "undeclared source 'ghost'"
)]
#[case::unknown_destination(
    "sources:\n  - name: a\n    github: acme/a\nroutes:\n  - sources: [a]\n    destination: nowhere\n",
    "undeclared destination 'nowhere'"
)]
fn unresolvable_routes_are_rejected(#[case] yaml: &str, #[case] message: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("app.yaml");
    file.write_str(yaml).expect("write");

    let err = apps::load_app_at(file.path()).unwrap_err();
    assert!(err.to_string().contains(message), "got: {err}");
}

#[rstest]
#[case::absolute("/srv/cartographer/secret/token")]
#[case::parent_dir("../secret/token")]
#[case::nested_parent_dir("policies/../../secret/token")]
fn source_files_must_stay_in_the_repository(#[case] file: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let app = dir.child("app.yaml");
    app.write_str(&format!(
        "sources:\n  - name: a\n    github: acme/a\n    files: [config.yaml, \"{file}\"]\n"
    ))
    .expect("write");

    let err = apps::load_app_at(app.path()).unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidSourceFile { file: ref f, .. } if f == file),
        "got: {err}"
    );
}

// ---------------------------------------------------------------------------
// 3. Discovery
// ---------------------------------------------------------------------------

#[test]
fn discovery_returns_stem_names_in_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("search.yml").write_str("{}\n").expect("write");
    dir.child("billing.yaml").write_str("{}\n").expect("write");
    dir.child("README.md").write_str("docs\n").expect("write");

    let files = apps::list_app_files_at(dir.path()).expect("list");
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["billing", "search"]);
    dir.child("billing.yaml").assert(predicate::path::is_file());
}
