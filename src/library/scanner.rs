//! Library scanner for a device's annotation directory
//!
//! Walks the per-book annotation files, resolves each one to its PDF and
//! metadata record, and assembles [`Book`]s. A file that cannot be turned
//! into a book is logged and skipped; it never stops the scan.

use std::path::{Path, PathBuf};

use crate::annotations::{read_header_path, AnnotationParser};
use crate::error::Result;

use super::book::Book;
use super::metadata::MetadataStore;
use super::path::PathResolver;

/// Extension of the device's per-book annotation files
pub const ANNOTATION_EXTENSION: &str = "html";

/// Only annotations on PDFs are extracted
pub const SOURCE_EXTENSION: &str = "pdf";

/// Outcome of a library scan
#[derive(Debug, Default)]
pub struct LibraryScan {
    pub books: Vec<Book>,
    pub skipped: Vec<SkippedEntry>,
}

/// An annotation file that did not produce a book
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub file_name: String,
    pub reason: String,
}

/// Scanner over one device's annotation directory
pub struct LibraryScanner<M: MetadataStore> {
    annotation_dir: PathBuf,
    resolver: PathResolver,
    metadata: M,
}

impl<M: MetadataStore> LibraryScanner<M> {
    /// Create a new library scanner
    pub fn new(annotation_dir: impl Into<PathBuf>, resolver: PathResolver, metadata: M) -> Self {
        Self {
            annotation_dir: annotation_dir.into(),
            resolver,
            metadata,
        }
    }

    /// Scan every annotation file and return the books that could be built.
    ///
    /// Fails only when the annotation directory itself cannot be listed.
    pub fn scan_library(&self) -> Result<LibraryScan> {
        tracing::info!("Scanning annotations in {}", self.annotation_dir.display());
        let start = std::time::Instant::now();

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.annotation_dir)? {
            match entry {
                Ok(entry) => entries.push(entry.path()),
                Err(e) => tracing::warn!("Unreadable entry in annotation directory: {}", e),
            }
        }
        entries.sort();

        let mut scan = LibraryScan::default();

        for path in entries {
            if !has_extension(&path, ANNOTATION_EXTENSION) {
                continue;
            }
            let file_name = display_name(&path);

            match self.process_annotation_file(&path) {
                Ok(Some(book)) => {
                    tracing::debug!(
                        "Loaded {} annotations for \"{}\" from {}",
                        book.annotations.len(),
                        book.title,
                        file_name
                    );
                    scan.books.push(book);
                }
                Ok(None) => {
                    tracing::debug!("Skipping {}: not a PDF annotation file", file_name);
                }
                Err(e) => {
                    if e.is_skippable() {
                        tracing::warn!("Unknown book {}: {}", file_name, e);
                    } else {
                        tracing::error!("Failed to read {}: {}", file_name, e);
                    }
                    scan.skipped.push(SkippedEntry {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Annotation scan complete: {} books, {} skipped in {:?}",
            scan.books.len(),
            scan.skipped.len(),
            start.elapsed()
        );

        Ok(scan)
    }

    /// Build the book for one annotation file in the annotation directory.
    pub fn assemble_book(&self, file_name: &str) -> Result<Book> {
        let path = self.annotation_dir.join(file_name);
        let raw_path = read_header_path(&path)?;
        self.build_book(&path, &raw_path)
    }

    fn process_annotation_file(&self, path: &Path) -> Result<Option<Book>> {
        let raw_path = read_header_path(path)?;
        if !has_extension(Path::new(&raw_path), SOURCE_EXTENSION) {
            return Ok(None);
        }
        self.build_book(path, &raw_path).map(Some)
    }

    fn build_book(&self, path: &Path, raw_path: &str) -> Result<Book> {
        let file_path = self.resolver.resolve(raw_path)?;
        let record = self.metadata.lookup(raw_path)?;

        let parser = AnnotationParser::new(&record.id, &self.annotation_dir);
        let annotations = parser.parse_file(path)?;

        Ok(Book {
            id: record.id,
            title: record.title,
            file_path,
            annotations,
        })
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
