//! Reader Annotations
//!
//! Extracts ink strokes, highlights and notes that an e-reader stores next to
//! its library, and returns them grouped by the PDF they belong to.
//!
//! # Modules
//!
//! - `annotations`: Annotation types and the annotation file parser
//! - `library`: Path resolution, metadata lookup and the library scanner
//! - `reader`: Device profiles behind a common `Reader` trait
//!
//! # Example
//!
//! ```no_run
//! use reader_annotations::{open_library, Config, DeviceProfile};
//!
//! let config = Config::for_device(DeviceProfile::Pocketbook, "/media/reader");
//! for book in open_library(&config)? {
//!     println!("{}: {} annotations", book.title, book.annotations.len());
//! }
//! # Ok::<(), reader_annotations::AnnotationError>(())
//! ```

pub mod annotations;
pub mod config;
pub mod error;
pub mod library;
pub mod reader;

pub use annotations::{Annotation, AnnotationKind, Freehand, Highlight, HighlightWithNote};
pub use config::{Config, DeviceProfile};
pub use error::{AnnotationError, Result};
pub use library::{Book, LibraryScan, LibraryScanner};
pub use reader::{open_library, reader_for, PocketBookReader, Reader};
