//! Book types and structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::annotations::{Annotation, AnnotationKind};

/// An annotated book on the device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Identifier from the device's metadata store
    pub id: String,

    /// Book title
    pub title: String,

    /// Host path of the source PDF
    pub file_path: PathBuf,

    /// Annotations in the order the device wrote them
    pub annotations: Vec<Annotation>,
}

impl Book {
    /// Distinct annotated pages, ascending
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.annotations.iter().map(|a| a.page()).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    pub fn annotations_on_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page() == page)
    }

    pub fn stats(&self) -> AnnotationStats {
        let mut stats = AnnotationStats::default();
        for annotation in &self.annotations {
            stats.total += 1;
            match annotation.kind() {
                AnnotationKind::Freehand => stats.freehand += 1,
                AnnotationKind::Highlight => stats.highlights += 1,
                AnnotationKind::HighlightWithNote => stats.notes += 1,
            }
        }
        stats
    }
}

/// Annotation counts per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStats {
    pub total: usize,
    pub freehand: usize,
    pub highlights: usize,
    pub notes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Highlight, HighlightWithNote};

    fn highlight(page: u32) -> Annotation {
        Annotation::Highlight(Highlight {
            book_id: "7".to_string(),
            page,
            text: format!("page {}", page),
        })
    }

    fn sample_book() -> Book {
        Book {
            id: "7".to_string(),
            title: "Paper".to_string(),
            file_path: PathBuf::from("/media/reader/paper.pdf"),
            annotations: vec![
                highlight(9),
                highlight(2),
                Annotation::HighlightWithNote(HighlightWithNote {
                    book_id: "7".to_string(),
                    page: 9,
                    text: String::new(),
                    note: "n".to_string(),
                }),
            ],
        }
    }

    #[test]
    fn test_pages_sorted_and_distinct() {
        assert_eq!(sample_book().pages(), vec![2, 9]);
    }

    #[test]
    fn test_annotations_on_page_keep_file_order() {
        let book = sample_book();
        let kinds: Vec<AnnotationKind> = book.annotations_on_page(9).map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![AnnotationKind::Highlight, AnnotationKind::HighlightWithNote]);
        assert_eq!(book.annotations_on_page(5).count(), 0);
    }

    #[test]
    fn test_stats() {
        let stats = sample_book().stats();
        assert_eq!(
            stats,
            AnnotationStats {
                total: 3,
                freehand: 0,
                highlights: 2,
                notes: 1,
            }
        );
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string_pretty(&sample_book()).unwrap();
        assert!(json.contains("\"filePath\": \"/media/reader/paper.pdf\""));
        assert!(json.contains("\"type\": \"highlightWithNote\""));

        let parsed: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.annotations.len(), 3);
    }
}
