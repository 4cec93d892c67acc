//! Shared fixture for polybuild integration tests.
//!
//! A `TestProject` owns a temporary source tree; tests write BUILD
//! specifications into it and run the full pipeline against a `DiskSource`.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use polybuild::graph::Parser;
use polybuild::input::Input;
use polybuild::nodes::registry::NodeBuilderSet;
use polybuild::source::DiskSource;

pub struct TestProject {
    temp: TempDir,
    builders: NodeBuilderSet,
    source: DiskSource,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("failed to create temporary project")?;
        let source = DiskSource::new(temp.path());
        Ok(Self {
            temp,
            builders: NodeBuilderSet::default_set(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Writes the BUILD specification for `dir` ("" means the tree root).
    pub fn write_build(&self, dir: &str, contents: &str) -> Result<()> {
        let dir_path = if dir.is_empty() {
            self.temp.path().to_path_buf()
        } else {
            self.temp.path().join(dir)
        };
        fs::create_dir_all(&dir_path)
            .with_context(|| format!("failed to create {}", dir_path.display()))?;
        fs::write(dir_path.join("BUILD"), contents)
            .with_context(|| format!("failed to write BUILD in {}", dir_path.display()))?;
        Ok(())
    }

    /// An `Input` requesting `targets`, with the default directory layout.
    pub fn input(&self, targets: &[&str]) -> Input {
        let mut input = Input::new(".", ".gen-obj", ".gen-files");
        for target in targets {
            input
                .add_build_target(target)
                .unwrap_or_else(|e| panic!("bad test target {target}: {e}"));
        }
        input
    }

    /// A parser wired to this project's registry and source tree.
    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.builders, &self.source)
    }

    /// Parses `targets`, panicking on failure with full context.
    pub fn parse(&self, parser: &mut Parser<'_>, targets: &[&str]) {
        parser
            .parse(self.input(targets))
            .unwrap_or_else(|e| panic!("parse of {targets:?} failed: {e:#}"));
    }
}

/// Dependency paths of one node, in resolved order.
pub fn deps_of(parser: &Parser<'_>, full_path: &str) -> Vec<String> {
    parser
        .node(full_path)
        .unwrap_or_else(|| panic!("node {full_path} not in graph"))
        .common()
        .dependency_nodes()
        .to_vec()
}
