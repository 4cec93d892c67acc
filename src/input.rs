//! The user request driving one parse: root targets, tree directories, and
//! toolchain flags passed through to emitters.

use std::collections::HashSet;

use crate::core::error::PolybuildError;
use crate::core::target::TargetInfo;

/// Read-only description of what the user asked to build.
///
/// Constructed once (by the CLI or a test harness) and shared by the graph
/// builder and every node. The toolchain flag lists are not interpreted by
/// the core; nodes fold them into the command contracts they hand to
/// emitters.
#[derive(Debug, Clone)]
pub struct Input {
    root_dir: String,
    object_dir: String,
    genfile_dir: String,
    build_targets: Vec<TargetInfo>,
    target_set: HashSet<String>,
    c_flags: Vec<String>,
    cxx_flags: Vec<String>,
    ld_flags: Vec<String>,
}

impl Input {
    pub fn new(
        root_dir: impl Into<String>,
        object_dir: impl Into<String>,
        genfile_dir: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            object_dir: object_dir.into(),
            genfile_dir: genfile_dir.into(),
            build_targets: Vec::new(),
            target_set: HashSet::new(),
            c_flags: Vec::new(),
            cxx_flags: Vec::new(),
            ld_flags: Vec::new(),
        }
    }

    /// Registers a user-requested root target (absolute `//dir:name` form).
    pub fn add_build_target(&mut self, spec: &str) -> Result<(), PolybuildError> {
        let target = TargetInfo::from_full_path(spec)?;
        if self.target_set.insert(target.full_path().to_string()) {
            self.build_targets.push(target);
        }
        Ok(())
    }

    pub fn build_targets(&self) -> &[TargetInfo] {
        &self.build_targets
    }

    /// Whether `full_path` is one of the user-requested roots.
    pub fn contains_target(&self, full_path: &str) -> bool {
        self.target_set.contains(full_path)
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    pub fn object_dir(&self) -> &str {
        &self.object_dir
    }

    pub fn genfile_dir(&self) -> &str {
        &self.genfile_dir
    }

    pub fn add_c_flag(&mut self, flag: impl Into<String>) {
        self.c_flags.push(flag.into());
    }

    pub fn add_cxx_flag(&mut self, flag: impl Into<String>) {
        self.cxx_flags.push(flag.into());
    }

    pub fn add_ld_flag(&mut self, flag: impl Into<String>) {
        self.ld_flags.push(flag.into());
    }

    pub fn c_flags(&self) -> &[String] {
        &self.c_flags
    }

    pub fn cxx_flags(&self) -> &[String] {
        &self.cxx_flags
    }

    pub fn ld_flags(&self) -> &[String] {
        &self.ld_flags
    }
}
