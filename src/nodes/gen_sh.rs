//! Bare shell-generation node.
//!
//! A `gen_sh` rule runs a user-supplied shell command that produces files
//! under the generated-file tree. Externally-driven kinds (`cmake`,
//! `autoconf`) spawn one of these as a subnode and set its command
//! programmatically instead of parsing it from attributes.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::error::PolybuildError;
use crate::core::resource::Resource;
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::{BuildNode, NodeCommon};

pub struct GenShNode {
    common: NodeCommon,
    make_name: String,
    command: String,
    clean_command: String,
    input_files: Vec<Resource>,
    outputs: Vec<Resource>,
}

impl GenShNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            make_name: "Generating".to_string(),
            command: String::new(),
            clean_command: String::new(),
            input_files: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Installs the command contract directly; used by spawning parents.
    pub fn set_command(
        &mut self,
        command: String,
        clean_command: String,
        input_files: Vec<Resource>,
        outputs: Vec<Resource>,
    ) {
        self.command = command;
        self.clean_command = clean_command;
        self.input_files = input_files;
        self.outputs = outputs;
    }

    /// Label shown by emitters when the command runs (e.g. "Cmake").
    pub fn set_make_name(&mut self, name: impl Into<String>) {
        self.make_name = name.into();
    }

    pub fn make_name(&self) -> &str {
        &self.make_name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn clean_command(&self) -> &str {
        &self.clean_command
    }

    pub fn input_files(&self) -> &[Resource] {
        &self.input_files
    }

    pub fn outputs(&self) -> &[Resource] {
        &self.outputs
    }
}

impl BuildNode for GenShNode {
    fn kind(&self) -> &'static str {
        "gen_sh"
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

        self.command = reader.required_string_field("build_cmd")?;
        self.clean_command = reader.string_field("clean_cmd")?.unwrap_or_default();

        let dir = self.common.target().directory().to_string();
        for path in reader.repeated_string("input_files", false)? {
            self.input_files.push(Resource::from_local_path(&dir, &path));
        }
        for path in reader.repeated_string("outs", false)? {
            self.outputs.push(Resource::from_local_path(&dir, &path));
        }
        Ok(())
    }

    fn post_parse(&mut self) -> Result<()> {
        // A spawning parent that forgot set_command would otherwise emit an
        // empty script.
        if self.command.is_empty() {
            return Err(PolybuildError::Schema {
                file: self.common.build_file(),
                message: format!(
                    "shell-generation node {} has no build command",
                    self.common.target()
                ),
            }
            .into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
