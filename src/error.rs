//! Error types for annotation extraction

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Annotation extraction error type
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("Path {path} is outside the device prefix {prefix}")]
    UnsupportedPath { path: String, prefix: String },

    #[error("Book not found in metadata store: {0}")]
    BookNotFound(String),

    #[error("Annotation file has no filepath header: {}", .0.display())]
    MissingHeader(PathBuf),

    #[error("Geometry unavailable for {}: {reason}", .path.display())]
    GeometryUnavailable { path: PathBuf, reason: String },

    #[error("Unsupported device profile: {0}")]
    UnsupportedDevice(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),
}

impl AnnotationError {
    /// Whether this error only concerns a single annotation file.
    ///
    /// The library enumerator skips such files quietly; anything else is
    /// still skipped but logged as an unexpected failure.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            AnnotationError::UnsupportedPath { .. }
                | AnnotationError::BookNotFound(_)
                | AnnotationError::MissingHeader(_)
                | AnnotationError::GeometryUnavailable { .. }
        )
    }
}

impl From<quick_xml::events::attributes::AttrError> for AnnotationError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        AnnotationError::XmlParse(err.into())
    }
}
