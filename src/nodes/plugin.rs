//! Plugin node.
//!
//! Registered during the first parse pass, a plugin intercepts one
//! attribute keyword and rewrites matching blocks before the second pass
//! parses them: the key is renamed to a registered node kind and default
//! attributes are injected where the block left them unset. Registration
//! lives in the owning file's inherited environment (`plugin:{key}` maps
//! to the plugin's target path), so it inherits down the directory tree.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::constants::PLUGIN_KEY_PREFIX;
use crate::core::error::PolybuildError;
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::{BuildNode, NodeCommon};

pub struct PluginNode {
    common: NodeCommon,
    key: String,
    rewrite_to: String,
    inject: AttrObject,
}

impl PluginNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            key: String::new(),
            rewrite_to: String::new(),
            inject: AttrObject::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rewrite_to(&self) -> &str {
        &self.rewrite_to
    }
}

impl BuildNode for PluginNode {
    fn kind(&self) -> &'static str {
        "plugin"
    }

    fn common(&self) -> &NodeCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut NodeCommon {
        &mut self.common
    }

    fn parse(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()> {
        self.common.parse_base(file, attrs)?;

        let filename = file.borrow().filename().to_string();
        let reader = AttrReader::new(&filename, attrs);

        self.key = reader.required_string_field("key")?;
        self.rewrite_to = reader.required_string_field("rewrite_to")?;
        if let Some(inject) = reader.object_field("inject")? {
            self.inject = inject.clone();
        }

        file.borrow_mut().set_env(
            format!("{PLUGIN_KEY_PREFIX}{}", self.key),
            self.common.target().full_path(),
        );
        Ok(())
    }

    fn expand_build_file_node(&self, file: &FileHandle, block: &mut AttrObject) -> Result<bool> {
        let Some(value) = block.get(&self.key) else {
            return Ok(false);
        };

        let filename = file.borrow().filename().to_string();
        let mut attrs = match value {
            Value::Object(map) => map.clone(),
            other => {
                return Err(PolybuildError::Schema {
                    file: filename,
                    message: format!("expected object for \"{}\", found {other}", self.key),
                }
                .into());
            }
        };
        if self.key != self.rewrite_to && block.contains_key(&self.rewrite_to) {
            return Err(PolybuildError::Schema {
                file: filename,
                message: format!(
                    "plugin {} rewrites \"{}\" to \"{}\", which the block already declares",
                    self.common.target(),
                    self.key,
                    self.rewrite_to
                ),
            }
            .into());
        }

        for (key, value) in &self.inject {
            if !attrs.contains_key(key) {
                attrs.insert(key.clone(), value.clone());
            }
        }

        // Rebuild the block so the rewritten entry keeps its position.
        let mut rewritten = AttrObject::new();
        for (key, value) in block.iter() {
            if key == &self.key {
                rewritten.insert(self.rewrite_to.clone(), Value::Object(attrs.clone()));
            } else {
                rewritten.insert(key.clone(), value.clone());
            }
        }
        *block = rewritten;
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
