//! External-make node.
//!
//! Runs a separately-maintained `make` build inside the source tree,
//! installing into a staging prefix. Externally-driven kinds (`cmake`,
//! `autoconf`) spawn one of these after their generation step; it can also
//! be declared directly for projects that ship a plain Makefile.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::{BuildNode, NodeCommon};

pub struct MakeNode {
    common: NodeCommon,
    make_dir: String,
    make_args: Vec<String>,
    make_env: Vec<String>,
    preinstall: String,
    postinstall: String,
    install_prefix: String,
}

impl MakeNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            make_dir: String::new(),
            make_args: Vec::new(),
            make_env: Vec::new(),
            preinstall: String::new(),
            postinstall: String::new(),
            install_prefix: String::new(),
        }
    }

    /// Parses attributes, then installs the setup/teardown a spawning
    /// parent supplies: a pre-install command, the install prefix passed as
    /// `DESTDIR`, and a post-install command run after `make install`.
    pub fn parse_with_options(
        &mut self,
        file: &FileHandle,
        attrs: &AttrObject,
        preinstall: impl Into<String>,
        install_prefix: impl Into<String>,
        postinstall: impl Into<String>,
    ) -> Result<()> {
        self.parse(file, attrs)?;
        self.preinstall = preinstall.into();
        self.install_prefix = install_prefix.into();
        self.postinstall = postinstall.into();
        Ok(())
    }

    pub fn make_dir(&self) -> &str {
        &self.make_dir
    }

    pub fn install_prefix(&self) -> &str {
        &self.install_prefix
    }

    /// The full shell contract an emitter lowers this node to.
    pub fn build_command(&self) -> String {
        let mut cmd = String::new();
        if !self.preinstall.is_empty() {
            cmd.push_str(&self.preinstall);
            cmd.push_str("; ");
        }
        for env in &self.make_env {
            cmd.push_str(env);
            cmd.push(' ');
        }
        cmd.push_str("make -C ");
        cmd.push_str(&self.make_dir);
        for arg in &self.make_args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        if self.install_prefix.is_empty() {
            cmd.push_str(" install");
        } else {
            cmd.push_str(&format!(" DESTDIR={} install", self.install_prefix));
        }
        if !self.postinstall.is_empty() {
            cmd.push_str(" && ");
            cmd.push_str(&self.postinstall);
        }
        cmd
    }
}

impl BuildNode for MakeNode {
    fn kind(&self) -> &'static str {
        "make"
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

        self.make_dir = match reader.single_directory("make_dir")? {
            Some(dir) => dir,
            None => self.common.target().directory().to_string(),
        };
        if self.make_dir.is_empty() {
            self.make_dir = ".".to_string();
        }
        self.make_args = reader.repeated_string("make_args", false)?;
        self.make_env = reader.repeated_string("make_env", false)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
