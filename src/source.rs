//! The seam through which specification contents reach the graph builder.
//!
//! The core never touches the filesystem directly; it asks a
//! [`SourceProvider`] to initialise a file's backing storage (which may
//! involve fetching a distributed checkout) and then to read its text.
//! [`DiskSource`] is the plain local-tree implementation.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::error::PolybuildError;

/// Supplies the textual contents of specification files.
pub trait SourceProvider {
    /// Ensures the file's contents are available locally.
    fn initialize_for_file(&self, path: &str) -> Result<()>;

    /// Returns the file's textual contents.
    fn read_to_string(&self, path: &str) -> Result<String>;
}

/// A [`SourceProvider`] over a local directory tree.
#[derive(Debug, Clone)]
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl SourceProvider for DiskSource {
    fn initialize_for_file(&self, path: &str) -> Result<()> {
        if self.resolve(path).is_file() {
            Ok(())
        } else {
            Err(PolybuildError::SourceUnavailable {
                path: path.to_string(),
            }
            .into())
        }
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        std::fs::read_to_string(self.resolve(path)).map_err(|source| {
            PolybuildError::Io {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }
}
