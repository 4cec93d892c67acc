//! Autoconf external-build node.
//!
//! Drives a configure-based project the same way `cmake` drives a CMake
//! one: a shell-generation subnode runs the configure step into the
//! generated-file tree, and an external-make subnode builds the result.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::gen_sh::GenShNode;
use crate::nodes::make::MakeNode;
use crate::nodes::{BuildNode, NodeCommon};

pub struct AutoconfNode {
    common: NodeCommon,
    configure_cmd: String,
    configure_env: Vec<String>,
    configure_args: Vec<String>,
}

impl AutoconfNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            configure_cmd: String::new(),
            configure_env: Vec::new(),
            configure_args: Vec::new(),
        }
    }

    pub fn configure_cmd(&self) -> &str {
        &self.configure_cmd
    }
}

impl BuildNode for AutoconfNode {
    fn kind(&self) -> &'static str {
        "autoconf"
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

        self.configure_env = reader.repeated_string("configure_env", false)?;
        self.configure_args = reader.repeated_string("configure_args", false)?;
        self.configure_cmd = reader
            .string_field("configure_cmd")?
            .unwrap_or_else(|| "./configure".to_string());

        let gen_target = self.common.spawn_target(file)?;
        let mut gen = GenShNode::new(gen_target.clone(), self.common.shared_input());
        self.common.copy_current_deps_to(gen.common_mut());
        gen.set_make_name("Autoconf");

        let mut user_env = String::new();
        for env in &self.configure_env {
            user_env.push_str(env);
            user_env.push(' ');
        }

        let build_setup = "mkdir -p $OBJ_DIR; DEST_DIR=$GEN_DIR";
        let build_env = format!(
            "{user_env}CXXFLAGS=\"$BASIC_CXXFLAGS $DEP_FLAGS $USER_CXXFLAGS\" \
             CFLAGS=\"$BASIC_CFLAGS $DEP_FLAGS $USER_CFLAGS\" \
             LDFLAGS=\"$LDFLAGS $USER_LDFLAGS\" CC=\"$CC\" CXX=\"$CXX\""
        );
        let mut configure = format!(
            "{} --prefix=/ --cache-file=$GEN_DIR/config.cache",
            self.configure_cmd
        );
        for arg in &self.configure_args {
            configure.push(' ');
            configure.push_str(arg);
        }
        gen.set_command(
            format!("{build_setup}; {build_env} {configure}"),
            String::new(),
            Vec::new(),
            Vec::new(),
        );
        self.common.attach_subnode(Box::new(gen));

        let make_target = self.common.spawn_target(file)?;
        let mut make = MakeNode::new(make_target, self.common.shared_input());
        make.common_mut().add_dependency_target(gen_target);
        make.parse(file, attrs)?;
        self.common.attach_subnode(Box::new(make));

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildfile::BuildFile;

    #[test]
    fn spawns_configure_and_make_subnodes() {
        let file = BuildFile::handle("vendor/zlib/BUILD");
        let value: serde_json::Value =
            serde_json::from_str(r#"{"configure_args": ["--static"], "configure_env": ["CFLAGS_EXTRA=-fPIC"]}"#)
                .unwrap();
        let mut node = AutoconfNode::new(
            TargetInfo::from_full_path("//vendor/zlib:zlib").unwrap(),
            Rc::new(Input::new(".", ".gen-obj", ".gen-files")),
        );
        node.parse(&file, value.as_object().unwrap()).unwrap();
        assert_eq!(node.configure_cmd(), "./configure");

        let as_node: &mut dyn BuildNode = &mut node;
        let mut subs = Vec::new();
        as_node.extract_subnodes(&mut subs);
        assert_eq!(subs.len(), 2);

        let gen = subs[0].as_any().downcast_ref::<GenShNode>().unwrap();
        assert!(gen.command().starts_with("mkdir -p $OBJ_DIR; DEST_DIR=$GEN_DIR;"));
        assert!(gen.command().contains("CFLAGS_EXTRA=-fPIC"));
        assert!(gen
            .command()
            .contains("./configure --prefix=/ --cache-file=$GEN_DIR/config.cache --static"));

        let make_deps: Vec<_> =
            subs[1].common().dep_targets().iter().map(|t| t.full_path()).collect();
        assert_eq!(make_deps, ["//vendor/zlib:auto_0"]);
    }

    #[test]
    fn custom_configure_command() {
        let file = BuildFile::handle("vendor/pcre/BUILD");
        let value: serde_json::Value =
            serde_json::from_str(r#"{"configure_cmd": "./autogen.sh"}"#).unwrap();
        let mut node = AutoconfNode::new(
            TargetInfo::from_full_path("//vendor/pcre:pcre").unwrap(),
            Rc::new(Input::new(".", ".gen-obj", ".gen-files")),
        );
        node.parse(&file, value.as_object().unwrap()).unwrap();
        assert_eq!(node.configure_cmd(), "./autogen.sh");
    }
}
