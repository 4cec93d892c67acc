//! The parse/resolve engine.
//!
//! Given the user's root targets, the builder runs a breadth-first closure:
//! each popped target loads its specification (and, through inheritance,
//! every ancestor specification), parses `config`/`plugin` nodes first so
//! environment and plugin registrations exist, expands plugin-matching
//! attribute keys, parses the remaining nodes, and enqueues each new node's
//! dependency and required-parent targets. Once the queue drains, nodes
//! parsed only as side effects of visited files are pruned, dependency
//! edges are resolved (and checked for cycles), the user-visible subset is
//! classified, and per-node post-parse hooks run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, trace};

use crate::buildfile::{BuildFile, FileHandle};
use crate::constants::{
    AUTO_NAME_PREFIX, BUILD_FILE_NAME, PLUGIN_EXPANSION_LIMIT, PLUGIN_KEY_PREFIX,
};
use crate::core::error::PolybuildError;
use crate::core::target::TargetInfo;
use crate::graph::cycles::EdgeGraph;
use crate::input::Input;
use crate::nodes::registry::NodeBuilderSet;
use crate::nodes::BuildNode;
use crate::source::SourceProvider;
use crate::utils::{dirname, join_path};

/// The fully-linked output of one parse, owned by the facade.
pub struct ResolvedGraph {
    pub(crate) input_nodes: Vec<String>,
    pub(crate) nodes: HashMap<String, Box<dyn BuildNode>>,
    pub(crate) node_order: Vec<String>,
    pub(crate) build_files: HashMap<String, FileHandle>,
}

pub(crate) struct GraphBuilder<'a> {
    input: Rc<Input>,
    builder_set: &'a NodeBuilderSet,
    source: &'a dyn SourceProvider,
    build_files: HashMap<String, FileHandle>,
    nodes: HashMap<String, Box<dyn BuildNode>>,
    node_order: Vec<String>,
    inputs: Vec<String>,
    to_process: VecDeque<String>,
    already_queued: HashSet<String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn build(
        input: Rc<Input>,
        builder_set: &'a NodeBuilderSet,
        source: &'a dyn SourceProvider,
    ) -> Result<ResolvedGraph> {
        let mut builder = Self {
            input,
            builder_set,
            source,
            build_files: HashMap::new(),
            nodes: HashMap::new(),
            node_order: Vec::new(),
            inputs: Vec::new(),
            to_process: VecDeque::new(),
            already_queued: HashSet::new(),
        };
        builder.parse()?;
        Ok(ResolvedGraph {
            input_nodes: builder.inputs,
            nodes: builder.nodes,
            node_order: builder.node_order,
            build_files: builder.build_files,
        })
    }

    fn parse(&mut self) -> Result<()> {
        // Seed the queue with the user's root targets.
        let seeds: Vec<String> = self
            .input
            .build_targets()
            .iter()
            .map(|t| t.full_path().to_string())
            .collect();
        for full_path in seeds {
            if self.already_queued.insert(full_path.clone()) {
                self.to_process.push_back(full_path);
            }
        }

        // BFS over the dependency closure.
        let mut processed: HashSet<String> = HashSet::new();
        while let Some(current) = self.to_process.pop_front() {
            processed.insert(current.clone());
            self.process_target(&current)?;
        }

        // Drop nodes parsed from files we visited only for side targets;
        // nothing on the dependency chain reaches them.
        self.node_order.retain(|fp| processed.contains(fp));
        self.nodes.retain(|fp, _| processed.contains(fp));

        // Resolve every dependency edge to a surviving node.
        for full_path in self.node_order.clone() {
            let deps: Vec<TargetInfo> = self.nodes[&full_path].common().dep_targets().to_vec();
            let mut resolved = Vec::with_capacity(deps.len());
            for dep in deps {
                if !self.nodes.contains_key(dep.full_path()) {
                    return Err(PolybuildError::UnresolvedDependency {
                        target: dep.full_path().to_string(),
                        dependent: full_path,
                    }
                    .into());
                }
                resolved.push(dep.full_path().to_string());
            }
            self.nodes
                .get_mut(&full_path)
                .unwrap()
                .common_mut()
                .set_dependency_nodes(resolved);
        }

        // Reject dependency cycles; every downstream lowering walks these
        // edges to a fixpoint.
        let mut edges = EdgeGraph::new();
        for full_path in &self.node_order {
            for dep in self.nodes[full_path].common().dependency_nodes() {
                edges.add_dependency(full_path, dep);
            }
        }
        edges.detect_cycles()?;

        // A node is a user input if it was requested directly, or if any
        // surviving node declares it as a required parent. Every surviving
        // node is already in the user's closure, and a promoted node's own
        // required parents are in the union as well, so chains need no
        // extra pass.
        let mut promoted: HashSet<String> = HashSet::new();
        for full_path in &self.node_order {
            for parent in self.nodes[full_path].common().required_parents() {
                promoted.insert(parent.full_path().to_string());
            }
        }
        for full_path in self.node_order.clone() {
            if self.input.contains_target(&full_path) || promoted.contains(&full_path) {
                self.inputs.push(full_path);
            }
        }

        // Late-binding validation, in insertion order.
        for full_path in self.node_order.clone() {
            self.nodes.get_mut(&full_path).unwrap().post_parse()?;
        }
        Ok(())
    }

    /// Loads the target's specification, then enqueues its edges.
    fn process_target(&mut self, current: &str) -> Result<()> {
        println!("Processing: {current}");

        let target = TargetInfo::from_full_path(current)?;
        self.add_file(&target.build_file())?;
        self.expand_target(&target)
    }

    /// Loads and parses one specification, memoised by filename.
    fn add_file(&mut self, filename: &str) -> Result<FileHandle> {
        if let Some(file) = self.build_files.get(filename) {
            return Ok(Rc::clone(file));
        }
        debug!("loading specification: {filename}");

        self.source.initialize_for_file(filename)?;
        let file = BuildFile::handle(filename);
        // Insert before recursing; diamond parent layouts revisit this file.
        self.build_files.insert(filename.to_string(), Rc::clone(&file));
        self.process_parent(&file)?;

        let text = self.source.read_to_string(filename)?;
        file.borrow_mut().parse(&text)?;

        // First pass: config and plugin nodes, in declaration order, so the
        // environment and plugin registrations exist before anything else
        // in this file is parsed.
        let block_count = file.borrow().block_count();
        let mut file_nodes: Vec<String> = Vec::new();
        let mut first_pass: Vec<String> = Vec::new();
        for index in 0..block_count {
            let keys = file.borrow().block_keys(index);
            for key in keys {
                if key == "config" || key == "plugin" {
                    let parsed = self.parse_single_node(&file, index, &key)?;
                    first_pass.extend(parsed.iter().cloned());
                    file_nodes.extend(parsed);
                }
            }
        }

        // Load the specifications our config nodes pre-require, and union
        // their environments into this file (existing keys win).
        for full_path in &first_pass {
            let pre: Vec<TargetInfo> = self.nodes[full_path].common().pre_parse().to_vec();
            for target in pre {
                let dep_file = self.add_file(&target.build_file())?;
                if !Rc::ptr_eq(&dep_file, &file) {
                    let dep = dep_file.borrow();
                    file.borrow_mut().merge_dependency(&dep);
                }
            }
        }

        // Plugin expansion, per block, rescanning after every rewrite until
        // a scan passes with no change.
        for index in 0..block_count {
            let mut rounds = 0usize;
            loop {
                let keys = file.borrow().block_keys(index);
                let mut expanded = None;
                for key in keys {
                    if self.expand_plugin(&file, index, &key)? {
                        expanded = Some(key);
                        break;
                    }
                }
                let Some(key) = expanded else { break };
                rounds += 1;
                if rounds > PLUGIN_EXPANSION_LIMIT {
                    return Err(PolybuildError::PluginLoop {
                        file: filename.to_string(),
                        key,
                    }
                    .into());
                }
            }
        }

        // Second pass: every remaining keyword.
        for index in 0..block_count {
            let keys = file.borrow().block_keys(index);
            for key in keys {
                if key != "config" && key != "plugin" {
                    file_nodes.extend(self.parse_single_node(&file, index, &key)?);
                }
            }
        }

        // Wire the file-wide base dependencies: every build-producing node
        // declared here implicitly depends on each of them. Base
        // dependencies never receive these edges themselves, or two of them
        // would depend on each other.
        let base_deps: Vec<String> = file.borrow().base_dependencies().to_vec();
        for base in &base_deps {
            let base_target = match self.nodes.get(base) {
                Some(node) => node.common().target().clone(),
                None => {
                    return Err(PolybuildError::UnresolvedDependency {
                        target: base.clone(),
                        dependent: filename.to_string(),
                    }
                    .into());
                }
            };
            for full_path in &file_nodes {
                if base_deps.contains(full_path) {
                    continue;
                }
                let node = self.nodes.get_mut(full_path).unwrap();
                if node.kind() != "config" && node.kind() != "plugin" {
                    node.common_mut().add_dependency_target(base_target.clone());
                }
            }
        }

        Ok(file)
    }

    /// Walks the ancestor chain, loading each ancestor specification and
    /// merging its environment and base dependencies into `child`. Nearer
    /// ancestors merge first, so they win where keys collide.
    fn process_parent(&mut self, child: &FileHandle) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut current_dir = {
            let borrowed = child.borrow();
            dirname(borrowed.filename())
        };
        loop {
            if current_dir.is_empty()
                || current_dir == "."
                || current_dir == self.input.root_dir()
            {
                break;
            }
            // A symlinked layout could otherwise revisit a directory.
            if !seen.insert(current_dir.clone()) {
                break;
            }

            let parent_dir = dirname(&current_dir);
            let parent_filename = join_path(&parent_dir, BUILD_FILE_NAME);
            let parent = self.add_file(&parent_filename)?;
            {
                let parent_ref = parent.borrow();
                child.borrow_mut().merge_parent(&parent_ref);
            }
            current_dir = parent_dir;
        }
        Ok(())
    }

    /// Enqueues every dependency and required-parent edge of the node at
    /// `target` for processing.
    fn expand_target(&mut self, target: &TargetInfo) -> Result<()> {
        let full_path = target.full_path();
        let (deps, parents) = match self.nodes.get(full_path) {
            Some(node) => (
                node.common().dep_targets().to_vec(),
                node.common().required_parents().to_vec(),
            ),
            None => {
                return Err(PolybuildError::UnresolvedDependency {
                    target: full_path.to_string(),
                    dependent: target.build_file(),
                }
                .into());
            }
        };

        for dep in deps {
            if self.already_queued.insert(dep.full_path().to_string()) {
                debug!("adding dep: {full_path} -> {}", dep.full_path());
                self.to_process.push_back(dep.full_path().to_string());
            }
        }
        for parent in parents {
            if self.already_queued.insert(parent.full_path().to_string()) {
                debug!("saw parent request: {full_path} -> {}", parent.full_path());
                self.to_process.push_back(parent.full_path().to_string());
            }
        }
        Ok(())
    }

    /// Lets a registered plugin rewrite block `index` if `key` matches one.
    fn expand_plugin(&mut self, file: &FileHandle, index: usize, key: &str) -> Result<bool> {
        trace!("checking for plugin: {key}");
        let plugin_target = {
            let borrowed = file.borrow();
            borrowed
                .env_value(&format!("{PLUGIN_KEY_PREFIX}{key}"))
                .map(str::to_string)
        };
        let Some(plugin_target) = plugin_target else {
            return Ok(false);
        };

        let plugin = self.nodes.get(&plugin_target).ok_or_else(|| {
            PolybuildError::UnresolvedDependency {
                target: plugin_target.clone(),
                dependent: file.borrow().filename().to_string(),
            }
        })?;

        // The block moves out for the rewrite so the plugin can read the
        // file through its handle without overlapping borrows.
        let mut block = file.borrow_mut().take_block(index);
        let result = plugin.expand_build_file_node(file, &mut block);
        file.borrow_mut().set_block(index, block);
        result
    }

    /// Parses the node declared under `key` in block `index`, pulls its
    /// subnodes into the global map, and returns every inserted path.
    fn parse_single_node(
        &mut self,
        file: &FileHandle,
        index: usize,
        key: &str,
    ) -> Result<Vec<String>> {
        let filename = file.borrow().filename().to_string();
        let value = file
            .borrow()
            .attr_value(index, key)
            .expect("block key disappeared during parse");
        let attrs = match value {
            Value::Object(map) => map,
            other => {
                return Err(PolybuildError::Schema {
                    file: filename,
                    message: format!("expected object for \"{key}\", found {other}"),
                }
                .into());
            }
        };

        let name = match attrs.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(PolybuildError::Schema {
                    file: filename,
                    message: format!("require string value of \"name\", found {other}"),
                }
                .into());
            }
            None => file.borrow_mut().next_name(AUTO_NAME_PREFIX),
        };

        let target = TargetInfo::parse(&format!(":{name}"), &filename)?;
        let mut node = self
            .builder_set
            .new_node(key, target, Rc::clone(&self.input))
            .ok_or_else(|| PolybuildError::UnknownKind {
                key: key.to_string(),
                file: filename.clone(),
            })?;
        node.parse(file, &attrs)?;
        debug!("saving node: {}", node.common().target().full_path());

        // Subnodes become first-class: children first, then the node itself.
        let mut extracted: Vec<Box<dyn BuildNode>> = Vec::new();
        node.extract_subnodes(&mut extracted);
        extracted.push(node);

        let mut inserted = Vec::with_capacity(extracted.len());
        for entry in extracted {
            let full_path = entry.common().target().full_path().to_string();
            if self.nodes.contains_key(&full_path) {
                return Err(PolybuildError::DuplicateTarget { target: full_path }.into());
            }
            self.node_order.push(full_path.clone());
            self.nodes.insert(full_path.clone(), entry);
            inserted.push(full_path);
        }
        Ok(inserted)
    }
}
