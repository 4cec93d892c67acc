//! Build-node variants and their shared machinery.
//!
//! Every build rule keyword corresponds to one node kind implementing
//! [`BuildNode`]. A node owns its declared dependency targets, the targets
//! it requires to be pulled into the graph alongside it, and any subnodes
//! it spawns while parsing (a `cmake` rule, for example, synthesises a
//! shell-generation node and an external-make node). Subnodes are owned by
//! their parent only between `parse` and `extract_subnodes`; the graph
//! builder then moves them into the global node map, where they are
//! first-class targets.
//!
//! Kind-specific state and behaviour live in the submodules; the common
//! state every variant embeds is [`NodeCommon`].

pub mod autoconf;
pub mod cc_binary;
pub mod cc_library;
pub mod cmake;
pub mod config;
pub mod gen_sh;
pub mod make;
pub mod plugin;
pub mod registry;

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::constants::AUTO_NAME_PREFIX;
use crate::core::target::TargetInfo;
use crate::input::Input;

/// State shared by every node kind.
pub struct NodeCommon {
    target: TargetInfo,
    input: Rc<Input>,
    dep_targets: Vec<TargetInfo>,
    required_parents: Vec<TargetInfo>,
    pre_parse: Vec<TargetInfo>,
    subnodes: Vec<Box<dyn BuildNode>>,
    dependency_nodes: Vec<String>,
}

impl std::fmt::Debug for NodeCommon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCommon")
            .field("target", &self.target)
            .field("input", &self.input)
            .field("dep_targets", &self.dep_targets)
            .field("required_parents", &self.required_parents)
            .field("pre_parse", &self.pre_parse)
            .field("subnodes_len", &self.subnodes.len())
            .field("dependency_nodes", &self.dependency_nodes)
            .finish()
    }
}

impl NodeCommon {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            target,
            input,
            dep_targets: Vec::new(),
            required_parents: Vec::new(),
            pre_parse: Vec::new(),
            subnodes: Vec::new(),
            dependency_nodes: Vec::new(),
        }
    }

    pub fn target(&self) -> &TargetInfo {
        &self.target
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn shared_input(&self) -> Rc<Input> {
        Rc::clone(&self.input)
    }

    /// Path of the specification file that declared this node.
    pub fn build_file(&self) -> String {
        self.target.build_file()
    }

    /// Appends a dependency target, deduplicated, declaration order kept.
    pub fn add_dependency_target(&mut self, target: TargetInfo) {
        if !self.dep_targets.contains(&target) {
            self.dep_targets.push(target);
        }
    }

    pub fn dep_targets(&self) -> &[TargetInfo] {
        &self.dep_targets
    }

    pub fn add_required_parent(&mut self, target: TargetInfo) {
        if !self.required_parents.contains(&target) {
            self.required_parents.push(target);
        }
    }

    pub fn required_parents(&self) -> &[TargetInfo] {
        &self.required_parents
    }

    pub fn add_pre_parse(&mut self, target: TargetInfo) {
        if !self.pre_parse.contains(&target) {
            self.pre_parse.push(target);
        }
    }

    /// Specifications that must be loaded before this node's file finishes
    /// parsing; only `config` nodes populate this.
    pub fn pre_parse(&self) -> &[TargetInfo] {
        &self.pre_parse
    }

    /// Resolved dependency view, populated by the graph's link step.
    pub fn dependency_nodes(&self) -> &[String] {
        &self.dependency_nodes
    }

    pub fn set_dependency_nodes(&mut self, resolved: Vec<String>) {
        self.dependency_nodes = resolved;
    }

    /// Parses the attributes shared by every kind: `deps` and
    /// `required_parents`, each a repeated list of target references
    /// resolved against the owning specification.
    pub fn parse_base(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()> {
        let filename = file.borrow().filename().to_string();
        let reader = AttrReader::new(&filename, attrs);

        for dep in reader.repeated_string("deps", false)? {
            self.add_dependency_target(TargetInfo::parse(&dep, &filename)?);
        }
        for parent in reader.repeated_string("required_parents", false)? {
            self.add_required_parent(TargetInfo::parse(&parent, &filename)?);
        }
        Ok(())
    }

    /// Synthesises a target for a subnode of this node, using the owning
    /// file's anonymous-name counter.
    pub fn spawn_target(&self, file: &FileHandle) -> Result<TargetInfo> {
        let name = file.borrow_mut().next_name(AUTO_NAME_PREFIX);
        let filename = file.borrow().filename().to_string();
        Ok(TargetInfo::parse(&format!(":{name}"), &filename)?)
    }

    /// Copies this node's current dependency targets onto a child.
    ///
    /// Must run before the child is attached, so the child does not end up
    /// depending on itself.
    pub fn copy_current_deps_to(&self, child: &mut NodeCommon) {
        for dep in &self.dep_targets {
            child.add_dependency_target(dep.clone());
        }
    }

    /// Takes ownership of a spawned child. The parent depends on the child
    /// (so pulling the parent pulls the child through the closure), and the
    /// child requires the parent (so pulling the child directly promotes
    /// the parent).
    pub fn attach_subnode(&mut self, mut child: Box<dyn BuildNode>) {
        child.common_mut().add_required_parent(self.target.clone());
        let child_target = child.common().target().clone();
        self.add_dependency_target(child_target);
        self.subnodes.push(child);
    }
}

/// The capability set every node kind implements.
pub trait BuildNode {
    /// The attribute keyword this node was built from.
    fn kind(&self) -> &'static str;

    fn common(&self) -> &NodeCommon;

    fn common_mut(&mut self) -> &mut NodeCommon;

    /// Populates kind-specific state from the attribute tree. May spawn
    /// subnodes on the common state.
    fn parse(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()>;

    /// Late-binding validation, invoked after all nodes are linked.
    fn post_parse(&mut self) -> Result<()> {
        Ok(())
    }

    /// Plugins only: rewrites an attribute block in place, returning whether
    /// anything changed. The default is inert.
    fn expand_build_file_node(&self, _file: &FileHandle, _block: &mut AttrObject) -> Result<bool> {
        Ok(false)
    }

    /// Downcast support for emitters and tests.
    fn as_any(&self) -> &dyn Any;
}

impl dyn BuildNode {
    /// Moves every recursively-owned subnode into `out`, children before
    /// their spawning parent, clearing them from this node.
    pub fn extract_subnodes(&mut self, out: &mut Vec<Box<dyn BuildNode>>) {
        let subnodes = std::mem::take(&mut self.common_mut().subnodes);
        for mut sub in subnodes {
            sub.extract_subnodes(out);
            out.push(sub);
        }
    }
}
