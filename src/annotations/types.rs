//! Annotation records recovered from a device's annotation files

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::svg::SvgDocument;
use crate::error::Result;

/// A single annotation, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Annotation {
    /// Ink stroke stored in a separate SVG file
    Freehand(Freehand),
    /// Highlighted passage
    Highlight(Highlight),
    /// Highlighted passage with an attached note
    HighlightWithNote(HighlightWithNote),
}

/// Annotation kinds and the type codes the device writes for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationKind {
    Freehand,
    Highlight,
    HighlightWithNote,
}

impl AnnotationKind {
    /// Marker `type` code for this kind
    pub fn code(&self) -> u32 {
        match self {
            AnnotationKind::Freehand => 16,
            AnnotationKind::Highlight => 32,
            AnnotationKind::HighlightWithNote => 64,
        }
    }
}

/// Freehand ink annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freehand {
    /// Id of the book this annotation belongs to
    pub book_id: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Host path of the stroke SVG
    pub svg_path: PathBuf,
    pub origin_x: u32,
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    #[serde(skip)]
    document: OnceCell<SvgDocument>,
}

impl Freehand {
    /// Strokes are always placed at the page origin at scale 1 on this device.
    pub fn new(book_id: &str, page: u32, svg_path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            book_id: book_id.to_string(),
            page,
            svg_path,
            origin_x: 0,
            origin_y: 0,
            width,
            height,
            scale: 1,
            document: OnceCell::new(),
        }
    }

    /// The full stroke document, parsed on first access and kept afterwards.
    pub fn document(&self) -> Result<&SvgDocument> {
        self.document
            .get_or_try_init(|| SvgDocument::from_path(&self.svg_path))
    }

    pub fn svg_path(&self) -> &Path {
        &self.svg_path
    }
}

/// Highlight without a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub book_id: String,
    pub page: u32,
    /// Highlighted text; empty when it could not be recovered
    pub text: String,
}

/// Highlight with a free-text note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightWithNote {
    pub book_id: String,
    pub page: u32,
    pub text: String,
    pub note: String,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Freehand(_) => AnnotationKind::Freehand,
            Annotation::Highlight(_) => AnnotationKind::Highlight,
            Annotation::HighlightWithNote(_) => AnnotationKind::HighlightWithNote,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Annotation::Freehand(a) => a.page,
            Annotation::Highlight(a) => a.page,
            Annotation::HighlightWithNote(a) => a.page,
        }
    }

    pub fn book_id(&self) -> &str {
        match self {
            Annotation::Freehand(a) => &a.book_id,
            Annotation::Highlight(a) => &a.book_id,
            Annotation::HighlightWithNote(a) => &a.book_id,
        }
    }

    /// Highlighted text, for the highlight kinds
    pub fn text(&self) -> Option<&str> {
        match self {
            Annotation::Freehand(_) => None,
            Annotation::Highlight(a) => Some(&a.text),
            Annotation::HighlightWithNote(a) => Some(&a.text),
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            Annotation::HighlightWithNote(a) => Some(&a.note),
            _ => None,
        }
    }

    pub fn as_freehand(&self) -> Option<&Freehand> {
        match self {
            Annotation::Freehand(a) => Some(a),
            _ => None,
        }
    }
}
