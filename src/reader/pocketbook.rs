//! PocketBook device profile
//!
//! PocketBook readers keep book metadata in `system/explorer-2/explorer-2.db`
//! and one HTML annotation file per book in `system/config/Active Contents`.
//! Paths inside both are written against the device mount point `/mnt/ext1`.

use std::path::{Path, PathBuf};

use crate::config::{Config, DeviceProfile};
use crate::error::Result;
use crate::library::{Book, LibraryScan, LibraryScanner, PathResolver, SqliteMetadataStore};

use super::Reader;

/// Reader for PocketBook volumes
pub struct PocketBookReader {
    path_prefix: String,
    annotation_dir: PathBuf,
    metadata_db: PathBuf,
}

impl PocketBookReader {
    /// Create a reader with the stock PocketBook layout
    pub fn new() -> Self {
        Self::from_config(&Config::for_device(DeviceProfile::Pocketbook, ""))
    }

    /// Create a reader using the prefix and layout from `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            path_prefix: config.path_prefix.clone(),
            annotation_dir: config.annotation_dir.clone(),
            metadata_db: config.metadata_db.clone(),
        }
    }

    /// Scan the volume mounted at `library_root`, keeping track of skipped files
    pub fn scan(&self, library_root: &Path) -> Result<LibraryScan> {
        let metadata = SqliteMetadataStore::open(library_root.join(&self.metadata_db))?;
        let resolver = PathResolver::new(self.path_prefix.as_str()).with_library_root(library_root);
        let scanner = LibraryScanner::new(library_root.join(&self.annotation_dir), resolver, metadata);
        scanner.scan_library()
    }
}

impl Default for PocketBookReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for PocketBookReader {
    fn device(&self) -> DeviceProfile {
        DeviceProfile::Pocketbook
    }

    fn open(&self, library_root: &Path) -> Result<Vec<Book>> {
        Ok(self.scan(library_root)?.books)
    }
}
