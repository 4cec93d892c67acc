//! C++ library node.
//!
//! Collects sources, headers, prebuilt objects, include directories, and
//! compile/link flags. Inherited `cxxflags`/`cflags` environment keys are
//! folded into the flag set at parse time, so ancestor configuration
//! reaches the lowered compile commands. Emits no subnodes.

use std::any::Any;
use std::rc::Rc;

use anyhow::Result;
use tracing::debug;

use crate::buildfile::{AttrObject, AttrReader, FileHandle};
use crate::core::resource::Resource;
use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::{BuildNode, NodeCommon};

/// Tag carried by objects that must be force-loaded into binaries.
pub const ALWAYSLINK_TAG: &str = "alwayslink";

pub struct CCLibraryNode {
    common: NodeCommon,
    sources: Vec<Resource>,
    headers: Vec<Resource>,
    objects: Vec<Resource>,
    include_dirs: Vec<String>,
    compile_args: Vec<String>,
    header_compile_args: Vec<String>,
    linker_args: Vec<String>,
}

impl CCLibraryNode {
    pub fn new(target: TargetInfo, input: Rc<Input>) -> Self {
        Self {
            common: NodeCommon::new(target, input),
            sources: Vec::new(),
            headers: Vec::new(),
            objects: Vec::new(),
            include_dirs: Vec::new(),
            compile_args: Vec::new(),
            header_compile_args: Vec::new(),
            linker_args: Vec::new(),
        }
    }

    /// The attribute parse shared with `cc_binary`.
    pub(crate) fn parse_cc_attrs(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()> {
        let filename = file.borrow().filename().to_string();
        let reader = AttrReader::new(&filename, attrs);
        let dir = self.common.target().directory().to_string();

        for path in reader.repeated_string("cc_sources", false)? {
            self.sources.push(Resource::from_local_path(&dir, &path));
        }
        for path in reader.repeated_string("cc_headers", false)? {
            self.headers.push(Resource::from_local_path(&dir, &path));
        }
        for path in reader.repeated_string("cc_objects", false)? {
            self.objects.push(Resource::from_local_path(&dir, &path));
        }
        for path in reader.repeated_string("cc_include_dirs", false)? {
            self.include_dirs.push(path);
        }

        if reader.bool_field("alwayslink")?.unwrap_or(false) {
            for resource in self.objects.iter_mut().chain(self.sources.iter_mut()) {
                resource.add_tag(ALWAYSLINK_TAG);
            }
        }

        // Inherited toolchain defaults come first so declared args can
        // override them.
        {
            let borrowed = file.borrow();
            for key in ["cflags", "cxxflags"] {
                if let Some(flags) = borrowed.env_value(key) {
                    self.compile_args.push(flags.to_string());
                }
            }
        }
        self.compile_args
            .extend(reader.repeated_string("cc_compile_args", false)?);
        self.header_compile_args
            .extend(reader.repeated_string("header_compile_args", false)?);
        self.linker_args
            .extend(reader.repeated_string("cc_linker_args", false)?);
        Ok(())
    }

    pub fn sources(&self) -> &[Resource] {
        &self.sources
    }

    pub fn headers(&self) -> &[Resource] {
        &self.headers
    }

    pub fn include_dirs(&self) -> &[String] {
        &self.include_dirs
    }

    pub fn compile_args(&self) -> &[String] {
        &self.compile_args
    }

    pub fn header_compile_args(&self) -> &[String] {
        &self.header_compile_args
    }

    pub fn linker_args(&self) -> &[String] {
        &self.linker_args
    }

    /// The object file a source compiles to, under the object tree, with
    /// the source's tags carried over.
    pub fn obj_for_source(&self, source: &Resource) -> Resource {
        let mut obj = Resource::from_local_path(
            self.common.input().object_dir(),
            &format!("{}.o", source.path()),
        );
        obj.copy_tags(source);
        obj
    }

    /// Every object this node contributes to a link: compiled sources in
    /// declaration order, then prebuilt objects.
    pub fn object_files(&self) -> Vec<Resource> {
        let mut out: Vec<Resource> = self.sources.iter().map(|s| self.obj_for_source(s)).collect();
        out.extend(self.objects.iter().cloned());
        out
    }

    /// One compile contract per source: the flags an emitter applies when
    /// producing the object file.
    pub fn compile_command(&self, source: &Resource) -> String {
        let mut cmd = String::from("$(COMPILE.cc)");
        for dir in &self.include_dirs {
            cmd.push_str(" -I");
            cmd.push_str(dir);
        }
        for arg in &self.compile_args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        for flag in self.common.input().cxx_flags() {
            cmd.push(' ');
            cmd.push_str(flag);
        }
        cmd.push(' ');
        cmd.push_str(source.path());
        cmd.push_str(" -o ");
        cmd.push_str(self.obj_for_source(source).path());
        cmd
    }
}

impl BuildNode for CCLibraryNode {
    fn kind(&self) -> &'static str {
        "cc_library"
    }

    fn common(&self) -> &NodeCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut NodeCommon {
        &mut self.common
    }

    fn parse(&mut self, file: &FileHandle, attrs: &AttrObject) -> Result<()> {
        self.common.parse_base(file, attrs)?;
        self.parse_cc_attrs(file, attrs)
    }

    fn post_parse(&mut self) -> Result<()> {
        if self.sources.is_empty() && self.headers.is_empty() && self.objects.is_empty() {
            debug!("cc_library {} declares no files", self.common.target());
        }
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

    fn lib(attrs_json: &str, file: &FileHandle) -> CCLibraryNode {
        let value: serde_json::Value = serde_json::from_str(attrs_json).unwrap();
        let mut node = CCLibraryNode::new(
            TargetInfo::from_full_path("//lib:util").unwrap(),
            Rc::new(Input::new(".", ".gen-obj", ".gen-files")),
        );
        node.parse(file, value.as_object().unwrap()).unwrap();
        node
    }

    #[test]
    fn resolves_files_against_target_directory() {
        let file = BuildFile::handle("lib/BUILD");
        let node = lib(r#"{"cc_sources": ["u.cc"], "cc_headers": ["u.h"]}"#, &file);
        assert_eq!(node.sources()[0].path(), "lib/u.cc");
        assert_eq!(node.headers()[0].path(), "lib/u.h");
        assert_eq!(node.obj_for_source(&node.sources()[0]).path(), ".gen-obj/lib/u.cc.o");
    }

    #[test]
    fn alwayslink_tags_sources_and_objects() {
        let file = BuildFile::handle("lib/BUILD");
        let node = lib(
            r#"{"cc_sources": ["u.cc"], "cc_objects": ["prebuilt.o"], "alwayslink": true}"#,
            &file,
        );
        assert!(node.sources()[0].has_tag(ALWAYSLINK_TAG));
        let objects = node.object_files();
        assert!(objects.iter().all(|o| o.has_tag(ALWAYSLINK_TAG)));
    }

    #[test]
    fn inherited_flags_precede_declared_args() {
        let file = BuildFile::handle("lib/BUILD");
        file.borrow_mut().set_env("cxxflags", "-O2");
        let node = lib(r#"{"cc_compile_args": ["-Wall"]}"#, &file);
        assert_eq!(node.compile_args(), ["-O2", "-Wall"]);
        assert!(node.compile_command(&Resource::from_raw("lib/u.cc")).contains("-O2 -Wall"));
    }
}
