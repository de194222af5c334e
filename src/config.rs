//! Configuration for reading a device volume

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AnnotationError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host directory where the device volume is mounted
    pub library_root: PathBuf,
    pub device: DeviceProfile,
    /// Absolute prefix the device uses for its own volume (e.g. `/mnt/ext1`)
    pub path_prefix: String,
    /// Annotation directory, relative to `library_root`
    pub annotation_dir: PathBuf,
    /// Metadata database, relative to `library_root`
    pub metadata_db: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    /// PocketBook readers with the explorer-2 library database
    Pocketbook,
}

impl DeviceProfile {
    pub fn default_path_prefix(&self) -> &'static str {
        match self {
            DeviceProfile::Pocketbook => "/mnt/ext1",
        }
    }

    pub fn default_annotation_dir(&self) -> PathBuf {
        match self {
            DeviceProfile::Pocketbook => ["system", "config", "Active Contents"].iter().collect(),
        }
    }

    pub fn default_metadata_db(&self) -> PathBuf {
        match self {
            DeviceProfile::Pocketbook => ["system", "explorer-2", "explorer-2.db"].iter().collect(),
        }
    }
}

impl FromStr for DeviceProfile {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pocketbook" | "pb" => Ok(DeviceProfile::Pocketbook),
            other => Err(AnnotationError::UnsupportedDevice(other.to_string())),
        }
    }
}

impl Config {
    /// Configuration with the profile's default layout under `library_root`
    pub fn for_device(device: DeviceProfile, library_root: impl Into<PathBuf>) -> Self {
        Config {
            library_root: library_root.into(),
            device,
            path_prefix: device.default_path_prefix().to_string(),
            annotation_dir: device.default_annotation_dir(),
            metadata_db: device.default_metadata_db(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let library_root = env::var("READER_LIBRARY_ROOT")
            .map_err(|_| AnnotationError::Config("READER_LIBRARY_ROOT is not set".to_string()))?;
        let device = match env::var("READER_DEVICE") {
            Ok(name) => name.parse()?,
            Err(_) => DeviceProfile::Pocketbook,
        };

        let mut config = Config::for_device(device, library_root);
        if let Ok(prefix) = env::var("READER_PATH_PREFIX") {
            config.path_prefix = prefix;
        }
        if let Ok(dir) = env::var("READER_ANNOTATION_DIR") {
            config.annotation_dir = PathBuf::from(dir);
        }
        if let Ok(db) = env::var("READER_METADATA_DB") {
            config.metadata_db = PathBuf::from(db);
        }
        Ok(config)
    }

    /// Like [`Config::from_env`], loading a `.env` file first if one exists
    pub fn from_env_file() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn annotation_dir_path(&self) -> PathBuf {
        self.library_root.join(&self.annotation_dir)
    }

    pub fn metadata_db_path(&self) -> PathBuf {
        self.library_root.join(&self.metadata_db)
    }
}
