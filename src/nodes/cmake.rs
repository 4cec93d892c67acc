//! CMake external-build node.
//!
//! Drives a CMake project that lives inside the source tree. Parsing
//! spawns two subnodes: a shell-generation node whose script configures the
//! project into `$GEN_DIR/build`, and an external-make node that builds it,
//! installs into a staging directory, and moves the install outputs into
//! the destination tree.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::gen_sh::GenShNode;
use crate::nodes::make::MakeNode;
use crate::nodes::{BuildNode, NodeCommon};
use crate::utils::join_path;

// Install outputs land in $STAGING/$BASE when the project honors
// CMAKE_INSTALL_PREFIX, in $STAGING/$GEN_DIR when it installs into the
// build tree instead; either way they end up in $DEST_DIR.
const POSTINSTALL_CMD: &str = "(if [ -d \"$STAGING/$BASE\" ]; then \
(for f in $(ls -d $STAGING/$BASE/*); do \
rm -rf $DEST_DIR/$(basename \"$f\"); mv $f $DEST_DIR || exit 1; \
done) && rm -rf $STAGING; \
elif [ -d \"$STAGING/$GEN_DIR\" ]; then \
(for f in $(ls -d $STAGING/$GEN_DIR/*); do \
rm -rf $DEST_DIR/$(basename \"$f\"); mv $f $DEST_DIR || exit 1; \
done) && rm -rf $STAGING; \
else echo -n ''; \
fi)";

pub struct CmakeNode {
    common: NodeCommon,
    cmake_dir: String,
    cmake_env: Vec<String>,
    cmake_args: Vec<String>,
}

impl CmakeNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            cmake_dir: String::new(),
            cmake_env: Vec::new(),
            cmake_args: Vec::new(),
        }
    }

    pub fn cmake_dir(&self) -> &str {
        &self.cmake_dir
    }

    pub fn cmake_args(&self) -> &[String] {
        &self.cmake_args
    }
}

impl BuildNode for CmakeNode {
    fn kind(&self) -> &'static str {
        "cmake"
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

        let cmake_dir = match reader.single_directory("cmake_dir")? {
            Some(dir) => dir,
            None => self.common.target().directory().to_string(),
        };
        self.cmake_dir = join_path("$ROOT_DIR", &cmake_dir);
        self.cmake_env = reader.repeated_string("cmake_env", false)?;
        self.cmake_args = reader.repeated_string("cmake_args", true)?;

        // Shell-generation subnode: inherits the deps declared on this rule.
        let gen_target = self.common.spawn_target(file)?;
        let mut gen = GenShNode::new(gen_target.clone(), self.common.shared_input());
        self.common.copy_current_deps_to(gen.common_mut());
        gen.set_make_name("Cmake");

        let mut user_env = String::new();
        if !self.cmake_env.is_empty() {
            for env in &self.cmake_env {
                user_env.push_str(env);
                user_env.push(' ');
            }
        }

        let build_setup = format!(
            "BASE={}; DEST_DIR=$GEN_DIR; mkdir -p $DEST_DIR/build; \
             STAGING=$DEST_DIR/.staging; cd $GEN_DIR/build",
            self.cmake_dir
        );
        let build_env = format!("{user_env}CC=$CC CXX=$CXX");
        let mut cmake_cmd = String::from(
            "cmake -DCMAKE_INSTALL_PREFIX=. -B . $BASE \
             -DCMAKE_CXX_FLAGS=\"$BASIC_CXXFLAGS $USER_CXXFLAGS\" \
             -DCMAKE_C_FLAGS=\"$BASIC_CFLAGS $USER_CFLAGS\"",
        );
        for arg in &self.cmake_args {
            cmake_cmd.push(' ');
            cmake_cmd.push_str(arg);
        }
        gen.set_command(
            format!("{build_setup}; {build_env} {cmake_cmd}"),
            String::new(),
            Vec::new(),
            Vec::new(),
        );
        self.common.attach_subnode(Box::new(gen));

        // External-make subnode: builds what the generation step configured.
        let make_target = self.common.spawn_target(file)?;
        let mut make = MakeNode::new(make_target, self.common.shared_input());
        make.common_mut().add_dependency_target(gen_target);
        make.parse_with_options(file, attrs, build_setup, "$STAGING", POSTINSTALL_CMD)?;
        self.common.attach_subnode(Box::new(make));

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
