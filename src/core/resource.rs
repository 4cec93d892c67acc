//! File artifacts within an output tree.
//!
//! A [`Resource`] is a path plus a small set of tags that downstream
//! lowerings use to alter handling of individual files (`alwayslink`
//! objects are force-loaded into binaries, for example). Resources are
//! plain values and are copied freely.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::utils::{join_path, normalize_path};

/// A file artifact, identified by its normalised path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    path: String,
    tags: BTreeSet<String>,
}

impl Resource {
    /// Creates a resource from an already-normalised path.
    pub fn from_raw(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Joins `base` and `rel` and normalises the result.
    pub fn from_local_path(base: &str, rel: &str) -> Self {
        Self::from_raw(normalize_path(&join_path(base, rel)))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Copies every tag from `other` onto this resource.
    pub fn copy_tags(&mut self, other: &Resource) {
        for tag in &other.tags {
            self.tags.insert(tag.clone());
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
