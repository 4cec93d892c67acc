//! Graph construction and the public [`Parser`] facade.
//!
//! [`Parser::parse`] runs the whole pipeline over an [`Input`] and keeps
//! the resolved graph: the user-visible input nodes, every node keyed by
//! canonical target path, a stable insertion-ordered node list for
//! deterministic emitter walks, and every loaded specification. The Parser
//! owns all of it; downstream emitters borrow.

mod builder;
mod cycles;

pub use builder::ResolvedGraph;

use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::FileHandle;
use crate::input::Input;
use crate::nodes::registry::NodeBuilderSet;
use crate::nodes::BuildNode;
use crate::source::SourceProvider;

pub struct Parser<'a> {
    builder_set: &'a NodeBuilderSet,
    source: &'a dyn SourceProvider,
    input: Option<Rc<Input>>,
    graph: Option<ResolvedGraph>,
}

impl<'a> Parser<'a> {
    pub fn new(builder_set: &'a NodeBuilderSet, source: &'a dyn SourceProvider) -> Self {
        Self {
            builder_set,
            source,
            input: None,
            graph: None,
        }
    }

    /// Discards any prior graph and resolves `input` from scratch.
    pub fn parse(&mut self, input: Input) -> Result<()> {
        self.reset();
        let input = Rc::new(input);
        let graph = builder::GraphBuilder::build(Rc::clone(&input), self.builder_set, self.source)?;
        self.input = Some(input);
        self.graph = Some(graph);
        Ok(())
    }

    /// Drops every owned node and specification.
    pub fn reset(&mut self) {
        self.input = None;
        self.graph = None;
    }

    /// The user-requested roots plus their required-parent promotions, in
    /// insertion order.
    pub fn input_nodes(&self) -> &[String] {
        self.graph.as_ref().map(|g| g.input_nodes.as_slice()).unwrap_or(&[])
    }

    /// Every resolved node path, in insertion order.
    pub fn node_order(&self) -> &[String] {
        self.graph.as_ref().map(|g| g.node_order.as_slice()).unwrap_or(&[])
    }

    /// Looks up one node by canonical target path.
    pub fn node(&self, full_path: &str) -> Option<&dyn BuildNode> {
        self.graph
            .as_ref()
            .and_then(|g| g.nodes.get(full_path))
            .map(|boxed| boxed.as_ref())
    }

    /// Deterministic walk over all nodes, insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &dyn BuildNode> {
        self.node_order().iter().filter_map(|fp| self.node(fp))
    }

    /// Looks up one loaded specification by filename.
    pub fn build_file(&self, filename: &str) -> Option<FileHandle> {
        self.graph
            .as_ref()
            .and_then(|g| g.build_files.get(filename))
            .map(Rc::clone)
    }

    pub fn build_file_count(&self) -> usize {
        self.graph.as_ref().map(|g| g.build_files.len()).unwrap_or(0)
    }

    pub fn input(&self) -> Option<&Input> {
        self.input.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::core::error::PolybuildError;

    /// In-memory source for unit tests; integration tests use `DiskSource`.
    struct MapSource {
        files: HashMap<String, String>,
    }

    impl MapSource {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl SourceProvider for MapSource {
        fn initialize_for_file(&self, path: &str) -> Result<()> {
            if self.files.contains_key(path) {
                Ok(())
            } else {
                Err(PolybuildError::SourceUnavailable {
                    path: path.to_string(),
                }
                .into())
            }
        }

        fn read_to_string(&self, path: &str) -> Result<String> {
            Ok(self.files[path].clone())
        }
    }

    fn input_for(targets: &[&str]) -> Input {
        let mut input = Input::new(".", ".gen-obj", ".gen-files");
        for target in targets {
            input.add_build_target(target).unwrap();
        }
        input
    }

    #[test]
    fn resolves_a_two_file_graph() {
        let source = MapSource::new(&[
            (
                "app/BUILD",
                r#"[{"cc_binary": {"name": "main", "deps": ["//lib:util"]}}]"#,
            ),
            ("lib/BUILD", r#"[{"cc_library": {"name": "util", "cc_sources": ["u.cc"]}}]"#),
        ]);
        let builders = NodeBuilderSet::default_set();
        let mut parser = Parser::new(&builders, &source);
        parser.parse(input_for(&["//app:main"])).unwrap();

        assert_eq!(parser.node_order(), ["//app:main", "//lib:util"]);
        assert_eq!(parser.input_nodes(), ["//app:main"]);
        let main = parser.node("//app:main").unwrap();
        assert_eq!(main.common().dependency_nodes(), ["//lib:util"]);
        assert_eq!(parser.build_file_count(), 2);
    }

    #[test]
    fn reset_clears_state_and_reparse_is_identical() {
        let source = MapSource::new(&[(
            "top/BUILD",
            r#"[{"cc_library": {"cc_sources": ["a.cc"]}}]"#,
        )]);
        let builders = NodeBuilderSet::default_set();
        let mut parser = Parser::new(&builders, &source);

        parser.parse(input_for(&["//top:auto_0"])).unwrap();
        let first: Vec<String> = parser.node_order().to_vec();

        parser.parse(input_for(&["//top:auto_0"])).unwrap();
        assert_eq!(parser.node_order(), first.as_slice());

        parser.reset();
        assert!(parser.node_order().is_empty());
        assert!(parser.node("//top:auto_0").is_none());
    }

    #[test]
    fn missing_specification_surfaces_source_error() {
        let source = MapSource::new(&[]);
        let builders = NodeBuilderSet::default_set();
        let mut parser = Parser::new(&builders, &source);
        let err = parser.parse(input_for(&["//app:main"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PolybuildError>(),
            Some(PolybuildError::SourceUnavailable { .. })
        ));
    }
}
