//! Plugin registration, attribute-block rewriting, and fixpoint expansion.

mod common;

use common::TestProject;
use polybuild::core::error::PolybuildError;
use polybuild::nodes::cc_library::CCLibraryNode;

#[test]
fn plugin_rewrites_a_block_before_the_second_pass() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "d",
            r#"[{
                "plugin": {
                    "name": "p",
                    "key": "my_rule",
                    "rewrite_to": "cc_library",
                    "inject": {"cc_compile_args": ["-Wall"]}
                },
                "my_rule": {"name": "r"}
            }]"#,
        )
        .unwrap();

    let mut parser = project.parser();
    project.parse(&mut parser, &["//d:r"]);

    let node = parser.node("//d:r").unwrap();
    assert_eq!(node.kind(), "cc_library");
    let lib = node.as_any().downcast_ref::<CCLibraryNode>().unwrap();
    assert!(lib.compile_args().contains(&"-Wall".to_string()));

    // The plugin itself is not on the dependency chain.
    assert!(parser.node("//d:p").is_none());
}

#[test]
fn chained_plugins_expand_to_a_fixpoint() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "d",
            r#"[
                {"plugin": {"name": "outer", "key": "my_rule", "rewrite_to": "mid_rule"}},
                {"plugin": {"name": "inner", "key": "mid_rule", "rewrite_to": "cc_library"}},
                {"my_rule": {"name": "r"}}
            ]"#,
        )
        .unwrap();

    let mut parser = project.parser();
    project.parse(&mut parser, &["//d:r"]);

    assert_eq!(parser.node("//d:r").unwrap().kind(), "cc_library");
}

#[test]
fn plugin_registrations_inherit_down_the_tree() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "",
            r#"[{"plugin": {"name": "p", "key": "my_rule", "rewrite_to": "cc_library"}}]"#,
        )
        .unwrap();
    project
        .write_build("sub", r#"[{"my_rule": {"name": "r"}}]"#)
        .unwrap();

    let mut parser = project.parser();
    project.parse(&mut parser, &["//sub:r"]);

    assert_eq!(parser.node("//sub:r").unwrap().kind(), "cc_library");
}

#[test]
fn non_converging_expansion_is_a_plugin_loop() {
    let project = TestProject::new().unwrap();
    project
        .write_build(
            "d",
            r#"[
                {"plugin": {"name": "p", "key": "loop_rule", "rewrite_to": "loop_rule"}},
                {"loop_rule": {"name": "r"}}
            ]"#,
        )
        .unwrap();

    let mut parser = project.parser();
    let err = parser.parse(project.input(&["//d:r"])).unwrap_err();
    match err.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::PluginLoop { file, key }) => {
            assert_eq!(file, "d/BUILD");
            assert_eq!(key, "loop_rule");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
