//! Canonical target references.
//!
//! A target is written `//dir/sub:name`, or `:name` relative to the
//! specification file currently being parsed. Two references are the same
//! target exactly when their canonical `full_path` strings are equal, so
//! equality and hashing are defined over `full_path` alone.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::constants::BUILD_FILE_NAME;
use crate::core::error::PolybuildError;
use crate::utils::{dirname, join_path, normalize_path};

/// A canonical reference to one build target.
///
/// Immutable after construction. The owning specification derives from the
/// directory: `//app:main` is declared in `app/BUILD`.
#[derive(Debug, Clone)]
pub struct TargetInfo {
    directory: String,
    name: String,
    full_path: String,
}

impl TargetInfo {
    /// Parses a target reference.
    ///
    /// `spec` is either absolute (`//dir/sub:name`) or relative (`:name`),
    /// in which case the directory is taken from `current_file`, the path of
    /// the specification being parsed. Empty and `.` path components are
    /// collapsed.
    pub fn parse(spec: &str, current_file: &str) -> Result<Self, PolybuildError> {
        let (dir, name) = if let Some(rest) = spec.strip_prefix("//") {
            match rest.split_once(':') {
                Some((dir, name)) => (normalize_path(dir), name.to_string()),
                None => {
                    return Err(PolybuildError::InvalidTarget {
                        spec: spec.to_string(),
                        message: "expected \"//dir:name\"".to_string(),
                    });
                }
            }
        } else if let Some(name) = spec.strip_prefix(':') {
            (normalize_path(&dirname(current_file)), name.to_string())
        } else {
            return Err(PolybuildError::InvalidTarget {
                spec: spec.to_string(),
                message: "expected \"//dir:name\" or \":name\"".to_string(),
            });
        };

        if name.is_empty() {
            return Err(PolybuildError::InvalidTarget {
                spec: spec.to_string(),
                message: "target name is empty".to_string(),
            });
        }

        let full_path = format!("//{dir}:{name}");
        Ok(Self {
            directory: dir,
            name,
            full_path,
        })
    }

    /// Parses an absolute `//dir:name` reference.
    pub fn from_full_path(spec: &str) -> Result<Self, PolybuildError> {
        if !spec.starts_with("//") {
            return Err(PolybuildError::InvalidTarget {
                spec: spec.to_string(),
                message: "expected an absolute \"//dir:name\" reference".to_string(),
            });
        }
        Self::parse(spec, "")
    }

    /// Directory of the owning specification, `""` for the tree root.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// The target's short name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical `//dir:name` form.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Path of the specification file that declares this target.
    pub fn build_file(&self) -> String {
        join_path(&self.directory, BUILD_FILE_NAME)
    }

    /// Directory-qualified name, used for output paths (`dir/name`).
    pub fn local_path(&self) -> String {
        join_path(&self.directory, &self.name)
    }
}

impl PartialEq for TargetInfo {
    fn eq(&self, other: &Self) -> bool {
        self.full_path == other.full_path
    }
}

impl Eq for TargetInfo {}

impl Hash for TargetInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_path.hash(state);
    }
}

impl fmt::Display for TargetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_reference() {
        let t = TargetInfo::from_full_path("//app/server:main").unwrap();
        assert_eq!(t.directory(), "app/server");
        assert_eq!(t.name(), "main");
        assert_eq!(t.full_path(), "//app/server:main");
        assert_eq!(t.build_file(), "app/server/BUILD");
        assert_eq!(t.local_path(), "app/server/main");
    }

    #[test]
    fn parses_relative_reference_against_current_file() {
        let t = TargetInfo::parse(":util", "lib/BUILD").unwrap();
        assert_eq!(t.full_path(), "//lib:util");
        assert_eq!(t.build_file(), "lib/BUILD");
    }

    #[test]
    fn root_directory_targets() {
        let t = TargetInfo::parse(":top", "BUILD").unwrap();
        assert_eq!(t.directory(), "");
        assert_eq!(t.full_path(), "//:top");
        assert_eq!(t.build_file(), "BUILD");
        assert_eq!(t.local_path(), "top");
    }

    #[test]
    fn collapses_empty_components() {
        let t = TargetInfo::from_full_path("//a//b/./c:x").unwrap();
        assert_eq!(t.full_path(), "//a/b/c:x");
    }

    #[test]
    fn equality_and_hash_use_full_path() {
        use std::collections::HashSet;
        let a = TargetInfo::from_full_path("//lib:util").unwrap();
        let b = TargetInfo::parse(":util", "lib/BUILD").unwrap();
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(TargetInfo::from_full_path("lib:util").is_err());
        assert!(TargetInfo::parse("util", "lib/BUILD").is_err());
        assert!(TargetInfo::parse("//lib:", "BUILD").is_err());
        assert!(TargetInfo::parse("//lib", "BUILD").is_err());
    }
}
