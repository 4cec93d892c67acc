//! C++ binary node.
//!
//! Extends [`CCLibraryNode`] with a link contract: the binary lives under
//! the object tree, a symlink is placed under the root directory, and the
//! link line wraps `alwayslink`-tagged objects between the force-link
//! sentinels. The object order on the link line follows the discovery
//! order of transitive dependencies, which the emitter supplies.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;

use crate::buildfile::{AttrObject, FileHandle};
use crate::core::resource::Resource;
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::cc_library::{CCLibraryNode, ALWAYSLINK_TAG};
use crate::nodes::{BuildNode, NodeCommon};

pub struct CCBinaryNode {
    lib: CCLibraryNode,
}

impl CCBinaryNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            lib: CCLibraryNode::new(target, input),
        }
    }

    pub fn as_library(&self) -> &CCLibraryNode {
        &self.lib
    }

    /// The linked binary under the object tree.
    pub fn obj_binary(&self) -> Resource {
        let common = self.lib.common();
        Resource::from_local_path(common.input().object_dir(), &common.target().local_path())
    }

    /// The user-visible symlink under the root directory.
    pub fn out_binary(&self) -> Resource {
        let common = self.lib.common();
        Resource::from_local_path(common.input().root_dir(), &common.target().local_path())
    }

    /// Command that publishes the symlink next to the sources.
    pub fn symlink_command(&self) -> String {
        format!(
            "ln -f -s {} {}",
            self.obj_binary().path(),
            self.out_binary().path()
        )
    }

    /// The link line over `objects`, which the emitter passes in transitive
    /// discovery order. `alwayslink` objects are wrapped between the
    /// force-link sentinels so their symbols survive the archive pass.
    pub fn link_command(&self, objects: &[Resource]) -> String {
        let mut list = String::new();
        for obj in objects {
            list.push(' ');
            let alwayslink = obj.has_tag(ALWAYSLINK_TAG);
            if alwayslink {
                list.push_str("$(LD_FORCE_LINK_START) ");
            }
            list.push_str(obj.path());
            if alwayslink {
                list.push_str(" $(LD_FORCE_LINK_END)");
            }
        }

        let mut cmd = format!("$(LINK.cc){list} -o {}", self.obj_binary().path());
        for flag in self.lib.linker_args() {
            cmd.push(' ');
            cmd.push_str(flag);
        }
        for flag in self.lib.common().input().ld_flags() {
            cmd.push(' ');
            cmd.push_str(flag);
        }
        cmd
    }
}

impl BuildNode for CCBinaryNode {
    fn kind(&self) -> &'static str {
        "cc_binary"
    }

    fn common(&self) -> &NodeCommon {
        self.lib.common()
    }

    fn common_mut(&mut self) -> &mut NodeCommon {
        self.lib.common_mut()
    }

    fn parse(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()> {
        self.lib.parse(file, attrs)
    }

    fn post_parse(&mut self) -> Result<()> {
        self.lib.post_parse()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
