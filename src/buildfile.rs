//! In-memory representation of one parsed `BUILD` specification.
//!
//! A specification is a JSON document whose top level is an array of
//! objects; each object maps node-kind keywords (`cc_library`, `cmake`,
//! `config`, ...) to that node's attribute tree. Attribute trees are kept
//! as [`serde_json::Value`] with insertion-ordered object keys, because
//! both parse order and plugin rewrites are order-sensitive.
//!
//! Beyond the parsed blocks, a [`BuildFile`] accumulates state contributed
//! by ancestors and by `config` nodes: the inherited key/value environment
//! and the file-wide base dependencies every non-config node implicitly
//! depends on. Both are fully populated before any non-config node in the
//! file is parsed, and are read-only once the file's `add_file` pass ends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;

use crate::core::error::PolybuildError;
use crate::utils::normalize_path;

/// One top-level attribute block: kind keyword to attribute tree.
pub type AttrObject = serde_json::Map<String, Value>;

/// Shared handle to a specification.
///
/// Graph construction is single-threaded; the graph builder is the sole
/// writer, and only while that file's `add_file` is on the stack.
pub type FileHandle = Rc<RefCell<BuildFile>>;

/// One parsed specification file.
#[derive(Debug)]
pub struct BuildFile {
    filename: String,
    attribute_nodes: Vec<AttrObject>,
    inherited_env: HashMap<String, String>,
    base_dependencies: Vec<String>,
    next_auto_id: u32,
}

impl BuildFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            attribute_nodes: Vec::new(),
            inherited_env: HashMap::new(),
            base_dependencies: Vec::new(),
            next_auto_id: 0,
        }
    }

    /// Wraps a fresh file in a shared handle.
    pub fn handle(filename: impl Into<String>) -> FileHandle {
        Rc::new(RefCell::new(Self::new(filename)))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Parses the specification text into ordered attribute blocks.
    ///
    /// The document must be a JSON array of objects; anything else fails
    /// with a [`PolybuildError::Parse`] carrying file and location.
    pub fn parse(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text).map_err(|e| PolybuildError::Parse {
            file: self.filename.clone(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;

        let Value::Array(items) = value else {
            return Err(PolybuildError::Parse {
                file: self.filename.clone(),
                line: 1,
                column: 1,
                message: "top level must be an array of objects".to_string(),
            }
            .into());
        };

        for item in items {
            match item {
                Value::Object(block) => self.attribute_nodes.push(block),
                other => {
                    return Err(PolybuildError::Parse {
                        file: self.filename.clone(),
                        line: 1,
                        column: 1,
                        message: format!("expected a JSON object, found {other}"),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    pub fn block_count(&self) -> usize {
        self.attribute_nodes.len()
    }

    /// Snapshot of a block's keys in insertion order.
    pub fn block_keys(&self, index: usize) -> Vec<String> {
        self.attribute_nodes[index].keys().cloned().collect()
    }

    /// Clones the attribute tree stored under `key` in block `index`.
    pub fn attr_value(&self, index: usize, key: &str) -> Option<Value> {
        self.attribute_nodes[index].get(key).cloned()
    }

    /// Moves a block out for in-place rewriting (plugin expansion).
    pub fn take_block(&mut self, index: usize) -> AttrObject {
        std::mem::take(&mut self.attribute_nodes[index])
    }

    pub fn set_block(&mut self, index: usize, block: AttrObject) {
        self.attribute_nodes[index] = block;
    }

    /// Synthesises a name for an anonymous node: `{prefix}{n}`, with a
    /// per-file post-incremented counter.
    pub fn next_name(&mut self, prefix: &str) -> String {
        let id = self.next_auto_id;
        self.next_auto_id += 1;
        format!("{prefix}{id}")
    }

    /// Inherits from an ancestor specification: copies every environment
    /// key not already set locally, and appends the ancestor's base
    /// dependencies.
    pub fn merge_parent(&mut self, parent: &BuildFile) {
        for (key, value) in &parent.inherited_env {
            self.inherited_env
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        for dep in &parent.base_dependencies {
            self.add_base_dependency(dep.clone());
        }
    }

    /// Unions another specification's environment into this one; existing
    /// keys win. Used for specifications a `config` node pre-requires.
    pub fn merge_dependency(&mut self, other: &BuildFile) {
        for (key, value) in &other.inherited_env {
            self.inherited_env
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Looks up an inherited environment key.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.inherited_env.get(key).map(String::as_str)
    }

    /// Sets an environment key; local values override inherited ones.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inherited_env.insert(key.into(), value.into());
    }

    /// Registers a file-wide base dependency (ordered, deduplicated).
    pub fn add_base_dependency(&mut self, full_path: String) {
        if !self.base_dependencies.contains(&full_path) {
            self.base_dependencies.push(full_path);
        }
    }

    pub fn base_dependencies(&self) -> &[String] {
        &self.base_dependencies
    }
}

/// Typed accessors over one node's attribute tree.
///
/// Schema failures carry the owning filename and the offending value, so a
/// misdeclared attribute is reported where the user wrote it.
pub struct AttrReader<'a> {
    filename: &'a str,
    attrs: &'a AttrObject,
}

impl<'a> AttrReader<'a> {
    pub fn new(filename: &'a str, attrs: &'a AttrObject) -> Self {
        Self { filename, attrs }
    }

    fn schema_error(&self, message: String) -> anyhow::Error {
        PolybuildError::Schema {
            file: self.filename.to_string(),
            message,
        }
        .into()
    }

    /// An optional string-valued attribute.
    pub fn string_field(&self, key: &str) -> Result<Option<String>> {
        match self.attrs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => {
                Err(self.schema_error(format!("expected string for \"{key}\", found {other}")))
            }
        }
    }

    /// A string-valued attribute that must be present.
    pub fn required_string_field(&self, key: &str) -> Result<String> {
        self.string_field(key)?
            .ok_or_else(|| self.schema_error(format!("missing required key \"{key}\"")))
    }

    /// A repeated-string attribute; `required` makes absence fatal.
    pub fn repeated_string(&self, key: &str, required: bool) -> Result<Vec<String>> {
        match self.attrs.get(key) {
            None | Some(Value::Null) => {
                if required {
                    Err(self.schema_error(format!("missing required key \"{key}\"")))
                } else {
                    Ok(Vec::new())
                }
            }
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        other => {
                            return Err(self.schema_error(format!(
                                "expected string entries under \"{key}\", found {other}"
                            )));
                        }
                    }
                }
                Ok(out)
            }
            Some(other) => Err(self.schema_error(format!(
                "expected array of strings for \"{key}\", found {other}"
            ))),
        }
    }

    /// A single directory path, normalised; absent yields `None`.
    pub fn single_directory(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .string_field(key)?
            .map(|dir| normalize_path(&dir))
            .filter(|dir| !dir.is_empty()))
    }

    /// An optional boolean attribute.
    pub fn bool_field(&self, key: &str) -> Result<Option<bool>> {
        match self.attrs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => {
                Err(self.schema_error(format!("expected boolean for \"{key}\", found {other}")))
            }
        }
    }

    /// An optional object-valued attribute.
    pub fn object_field(&self, key: &str) -> Result<Option<&'a AttrObject>> {
        match self.attrs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => {
                Err(self.schema_error(format!("expected object for \"{key}\", found {other}")))
            }
        }
    }

    /// Every attribute except the listed ones, in insertion order.
    pub fn remaining_fields(&self, skip: &[&str]) -> Vec<(&'a String, &'a Value)> {
        self.attrs
            .iter()
            .filter(|(key, _)| !skip.contains(&key.as_str()))
            .collect()
    }
}
