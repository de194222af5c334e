//! Annotation module
//!
//! Recovers annotations from the per-book HTML files a device keeps next to
//! its library.
//!
//! # Features
//!
//! - Annotation kinds:
//!   - Freehand ink strokes (geometry in a separate SVG)
//!   - Highlights
//!   - Highlights with notes
//!
//! - Per-record recovery: a broken record is dropped without losing the rest
//!   of the file

mod cursor;
mod parser;
mod svg;
mod types;

pub use cursor::LineCursor;
pub use parser::{extract_header_path, read_header_path, AnnotationParser};
pub use svg::{parse_dimensions, read_dimensions, Stroke, StrokeKind, SvgDimensions, SvgDocument};
pub use types::{Annotation, AnnotationKind, Freehand, Highlight, HighlightWithNote};
