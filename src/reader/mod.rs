//! Device readers
//!
//! Each supported device lays out its library and annotations differently.
//! A [`Reader`] hides that layout behind a single `open` call; the reader to
//! use is chosen from [`Config::device`].

mod pocketbook;

use std::path::Path;

use crate::config::{Config, DeviceProfile};
use crate::error::Result;
use crate::library::Book;

pub use pocketbook::PocketBookReader;

/// Extracts annotated books from a mounted device volume
pub trait Reader {
    /// Device profile this reader understands
    fn device(&self) -> DeviceProfile;

    /// Read every annotated book on the volume mounted at `library_root`.
    ///
    /// Books whose annotation file cannot be processed are left out.
    fn open(&self, library_root: &Path) -> Result<Vec<Book>>;
}

/// Reader for the configured device
pub fn reader_for(config: &Config) -> Box<dyn Reader> {
    match config.device {
        DeviceProfile::Pocketbook => Box::new(PocketBookReader::from_config(config)),
    }
}

/// Read all annotated books described by `config`
pub fn open_library(config: &Config) -> Result<Vec<Book>> {
    reader_for(config).open(&config.library_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_for_pocketbook() {
        let config = Config::for_device(DeviceProfile::Pocketbook, "/media/reader");
        assert_eq!(reader_for(&config).device(), DeviceProfile::Pocketbook);
    }

    #[test]
    fn test_open_without_database_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::for_device(DeviceProfile::Pocketbook, dir.path());
        assert!(open_library(&config).is_err());
    }
}
