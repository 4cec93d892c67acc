//! Configuration node.
//!
//! Produces no build output; it mutates the owning specification while the
//! file's first parse pass runs. String-valued attributes become inherited
//! environment keys (visible to every later node in this file and, through
//! parental inheritance, to descendant directories). `requires` names
//! specifications that must be loaded before this file's body is parsed,
//! and `base_deps` declares file-wide implicit dependencies.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::error::PolybuildError;
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::{BuildNode, NodeCommon};

/// Attributes with structural meaning, never copied into the environment.
const RESERVED_KEYS: &[&str] = &["name", "deps", "required_parents", "requires", "base_deps"];

#[derive(Debug)]
pub struct ConfigNode {
    common: NodeCommon,
}

impl ConfigNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
        }
    }
}

impl BuildNode for ConfigNode {
    fn kind(&self) -> &'static str {
        "config"
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

        for spec in reader.repeated_string("requires", false)? {
            self.common.add_pre_parse(TargetInfo::parse(&spec, &filename)?);
        }

        for spec in reader.repeated_string("base_deps", false)? {
            let target = TargetInfo::parse(&spec, &filename)?;
            file.borrow_mut().add_base_dependency(target.full_path().to_string());
        }

        for (key, value) in reader.remaining_fields(RESERVED_KEYS) {
            match value {
                Value::String(s) => file.borrow_mut().set_env(key.clone(), s.clone()),
                other => {
                    return Err(PolybuildError::Schema {
                        file: filename.clone(),
                        message: format!(
                            "config values must be strings, found {other} for \"{key}\""
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
