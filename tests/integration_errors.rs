//! Fatal error paths: every failure surfaces a typed error with context
//! and no partial graph.

mod common;

use common::TestProject;
use polybuild::core::error::PolybuildError;
use polybuild::graph::Parser;

fn parse_err(project: &TestProject, targets: &[&str]) -> anyhow::Error {
    let mut parser: Parser<'_> = project.parser();
    parser
        .parse(project.input(targets))
        .expect_err("parse should fail")
}

#[test]
fn duplicate_target_in_one_file_is_fatal() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "d",
            r#"[
                {"cc_library": {"name": "x", "cc_sources": ["a.cc"]}},
                {"cc_library": {"name": "x", "cc_sources": ["b.cc"]}}
            ]"#,
        )
        .unwrap();

    let err = parse_err(&project, &["//d:x"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::DuplicateTarget { target }) => assert_eq!(target, "//d:x"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_build_rule_is_fatal() {
    let project = TestProject::new().unwrap();
    project
        .write_build("d", r#"[{"go_library": {"name": "g"}}]"#)
        .unwrap();

    let err = parse_err(&project, &["//d:g"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::UnknownKind { key, file }) => {
            assert_eq!(key, "go_library");
            assert_eq!(file, "d/BUILD");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn dependency_on_undeclared_target_is_fatal() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "app",
            r#"[{"cc_binary": {"name": "main", "deps": ["//lib:missing"]}}]"#,
        )
        .unwrap();
    project
        .write_build("lib", r#"[{"cc_library": {"name": "util"}}]"#)
        .unwrap();

    let err = parse_err(&project, &["//app:main"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::UnresolvedDependency { target, .. }) => {
            assert_eq!(target, "//lib:missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_specification_reports_location() {
    let project = TestProject::new().unwrap();
    project.write_build("d", "[{\"cc_library\": }]").unwrap();

    let err = parse_err(&project, &["//d:x"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::Parse { file, .. }) => assert_eq!(file, "d/BUILD"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn wrong_attribute_type_is_a_schema_error() {
    let project = TestProject::new().unwrap();
    project
        .write_build("d", r#"[{"cc_library": {"name": "x", "cc_sources": "a.cc"}}]"#)
        .unwrap();

    let err = parse_err(&project, &["//d:x"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::Schema { file, message }) => {
            assert_eq!(file, "d/BUILD");
            assert!(message.contains("cc_sources"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_string_name_is_a_schema_error() {
    let project = TestProject::new().unwrap();
    project
        .write_build("d", r#"[{"cc_library": {"name": 3}}]"#)
        .unwrap();

    let err = parse_err(&project, &["//d:auto_0"]);
    assert!(matches!(
        err.downcast_ref::<PolybuildError>(),
        Some(PolybuildError::Schema { .. })
    ));
}

#[test]
fn missing_specification_file_is_fatal() {
    let project = TestProject::new().unwrap();

    let err = parse_err(&project, &["//nowhere:x"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::SourceUnavailable { path }) => {
            assert_eq!(path, "nowhere/BUILD");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn mutual_dependency_is_a_cycle_error() {
    let project = TestProject::new().unwrap();
    project
        .write_build("a", r#"[{"cc_library": {"name": "x", "deps": ["//b:y"]}}]"#)
        .unwrap();
    project
        .write_build("b", r#"[{"cc_library": {"name": "y", "deps": ["//a:x"]}}]"#)
        .unwrap();

    let err = parse_err(&project, &["//a:x"]);
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::DependencyCycle { cycle }) => {
            assert!(cycle.contains("//a:x"));
            assert!(cycle.contains("//b:y"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
