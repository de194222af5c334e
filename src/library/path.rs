//! Device path to host path translation

use std::path::{Component, Path, PathBuf};

use crate::error::{AnnotationError, Result};

/// Maps paths in the device's own namespace onto the mounted volume
#[derive(Debug, Clone)]
pub struct PathResolver {
    prefix: String,
    library_root: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            library_root: None,
        }
    }

    /// Join resolved paths under the host mount point
    pub fn with_library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_root = Some(root.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Strip the device prefix, leaving the path relative to the volume root.
    ///
    /// Paths that climb out of the volume with `..` are rejected.
    pub fn relative<'a>(&self, raw_path: &'a str) -> Result<&'a str> {
        let unsupported = || AnnotationError::UnsupportedPath {
            path: raw_path.to_string(),
            prefix: self.prefix.clone(),
        };

        let relative = raw_path
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(unsupported)?;
        if Path::new(relative)
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(unsupported());
        }
        Ok(relative)
    }

    /// Resolve a raw device path to a host path.
    ///
    /// Without a library root the result is the volume-relative path.
    pub fn resolve(&self, raw_path: &str) -> Result<PathBuf> {
        let relative = self.relative(raw_path)?;
        Ok(match &self.library_root {
            Some(root) => root.join(relative.trim_start_matches('/')),
            None => PathBuf::from(relative),
        })
    }

    pub fn library_root(&self) -> Option<&Path> {
        self.library_root.as_deref()
    }
}
