//! Parser for per-book annotation files
//!
//! Each annotation file is loosely structured HTML. The first matching
//! comment line names the book on the device:
//!
//! ```text
//! <!-- filepath="/mnt/ext1/Books/paper.pdf" ... -->
//! ```
//!
//! and every annotation starts with a single-line marker comment:
//!
//! ```text
//! <!-- type="32" ... position="#pdfloc(1a2b,7,0,0)" endposition="#pdfloc(1a2b,7,9)" -->
//! ```
//!
//! Highlights keep their passage on the line after the marker; highlights
//! with notes keep the passage and the note on the next two lines. Freehand
//! markers point at a separate SVG through `svgpath="..."`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

use super::cursor::LineCursor;
use super::svg::read_dimensions;
use super::types::{Annotation, AnnotationKind, Freehand, Highlight, HighlightWithNote};
use crate::error::{AnnotationError, Result};

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*<!--\s*filepath="((?:\\.|[^\x00"\\])+)".*--!?>"#).unwrap());

static FREEHAND_MARKER: Lazy<Regex> = Lazy::new(|| marker_pattern(AnnotationKind::Freehand));
static HIGHLIGHT_MARKER: Lazy<Regex> = Lazy::new(|| marker_pattern(AnnotationKind::Highlight));
static NOTE_MARKER: Lazy<Regex> =
    Lazy::new(|| marker_pattern(AnnotationKind::HighlightWithNote));
static ANY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*<!--\s*type="(\d+)""#).unwrap());

static POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"\sposition="#pdfloc\([0-9a-fA-F]+,(\d+)[\d,]*\)""##).unwrap()
});
static SVG_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\ssvgpath="((?:\\.|[^\x00"\\])+)""#).unwrap());

/// Text after the first `>` of a line, up to the next `<`
static BRACKETED_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^>]*>([^<>]*)<").unwrap());

fn marker_pattern(kind: AnnotationKind) -> Regex {
    Regex::new(&format!(r#"^\s*<!--\s*type="{}""#, kind.code())).unwrap()
}

/// A recognized marker line, before any lookahead.
///
/// The variant is fixed by the `type` code alone. A missing page or
/// `svgpath` still identifies the record, so its payload lines are consumed
/// before it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    Freehand {
        page: Option<u32>,
        svg_path: Option<String>,
    },
    Highlight {
        page: Option<u32>,
    },
    HighlightWithNote {
        page: Option<u32>,
    },
}

type MarkerMatcher = fn(&str) -> Option<Marker>;

/// Tried in order; the first matcher that recognizes a line wins.
const MARKER_MATCHERS: [MarkerMatcher; 3] = [match_freehand, match_highlight, match_note];

fn marker_page(line: &str) -> Option<u32> {
    POSITION.captures(line)?.get(1)?.as_str().parse().ok()
}

fn match_freehand(line: &str) -> Option<Marker> {
    FREEHAND_MARKER.is_match(line).then(|| Marker::Freehand {
        page: marker_page(line),
        svg_path: SVG_PATH
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    })
}

fn match_highlight(line: &str) -> Option<Marker> {
    HIGHLIGHT_MARKER.is_match(line).then(|| Marker::Highlight {
        page: marker_page(line),
    })
}

fn match_note(line: &str) -> Option<Marker> {
    NOTE_MARKER.is_match(line).then(|| Marker::HighlightWithNote {
        page: marker_page(line),
    })
}

fn match_marker(line: &str) -> Option<Marker> {
    MARKER_MATCHERS.iter().find_map(|matcher| matcher(line))
}

/// Extract the raw device path from an annotation file header line
pub fn extract_header_path(line: &str) -> Option<&str> {
    HEADER
        .captures(line.trim_start_matches('\u{feff}'))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Scan an annotation file from the top for its `filepath` header.
pub fn read_header_path(path: &Path) -> Result<String> {
    let reader = BufReader::new(File::open(path)?);
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some(raw_path) = extract_header_path(&line) {
            return Ok(raw_path.to_string());
        }
    }
    Err(AnnotationError::MissingHeader(path.to_path_buf()))
}

/// Entity-decoded text between the first `>` on the line and the `<` that
/// follows it. Empty when the line has no such run.
fn inner_text(line: Option<&str>) -> String {
    let raw = line
        .and_then(|line| BRACKETED_TEXT.captures(line))
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str());

    html_escape::decode_html_entities(raw).into_owned()
}

/// Parser for the annotation file of a single book
pub struct AnnotationParser {
    book_id: String,
    annotation_dir: PathBuf,
}

impl AnnotationParser {
    /// `annotation_dir` is the host directory freehand `svgpath`s are relative to.
    pub fn new(book_id: &str, annotation_dir: impl Into<PathBuf>) -> Self {
        Self {
            book_id: book_id.to_string(),
            annotation_dir: annotation_dir.into(),
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<Vec<Annotation>> {
        let bytes = std::fs::read(path)?;
        Ok(self.parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse annotation file contents. Records that cannot be recovered are
    /// dropped individually; the rest are returned in file order.
    pub fn parse(&self, content: &str) -> Vec<Annotation> {
        let mut cursor = LineCursor::new(content);
        let mut annotations = Vec::new();

        while let Some(line) = cursor.advance() {
            let Some(marker) = match_marker(line) else {
                if let Some(caps) = ANY_MARKER.captures(line) {
                    tracing::debug!(
                        "Ignoring marker type {} at line {}",
                        &caps[1],
                        cursor.position()
                    );
                }
                continue;
            };

            let line_number = cursor.position();
            match marker {
                Marker::Freehand { page, svg_path } => {
                    let (Some(page), Some(svg_path)) = (page, svg_path) else {
                        tracing::debug!(
                            "Dropping freehand marker without page or svgpath at line {}",
                            line_number
                        );
                        continue;
                    };
                    if let Some(freehand) = self.freehand(page, &svg_path) {
                        annotations.push(Annotation::Freehand(freehand));
                    }
                }
                Marker::Highlight { page } => {
                    let text = inner_text(cursor.advance());
                    let Some(page) = page else {
                        tracing::debug!("Dropping highlight without a page at line {}", line_number);
                        continue;
                    };
                    annotations.push(Annotation::Highlight(Highlight {
                        book_id: self.book_id.clone(),
                        page,
                        text,
                    }));
                }
                Marker::HighlightWithNote { page } => {
                    let text = inner_text(cursor.advance());
                    let note = inner_text(cursor.advance());
                    let Some(page) = page else {
                        tracing::debug!("Dropping note without a page at line {}", line_number);
                        continue;
                    };
                    annotations.push(Annotation::HighlightWithNote(HighlightWithNote {
                        book_id: self.book_id.clone(),
                        page,
                        text,
                        note,
                    }));
                }
            }
        }

        annotations
    }

    fn freehand(&self, page: u32, svg_path: &str) -> Option<Freehand> {
        // svgpath must stay inside the annotation directory
        let inside = Path::new(svg_path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            tracing::debug!("Dropping freehand annotation on page {}: svgpath {:?}", page, svg_path);
            return None;
        }

        let svg_path = self.annotation_dir.join(svg_path);
        match read_dimensions(&svg_path) {
            Ok(dims) => Some(Freehand::new(
                &self.book_id,
                page,
                svg_path,
                dims.width,
                dims.height,
            )),
            Err(e) => {
                tracing::debug!("Dropping freehand annotation on page {}: {}", page, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HIGHLIGHT_LINE: &str = r##"<!-- type="32" page="7" position="#pdfloc(1a2b,7,0,0)" endposition="#pdfloc(1a2b,7,5,3)" -->"##;
    const NOTE_LINE: &str = r##"<!-- type="64" position="#pdfloc(ff00,12,4)" endposition="#pdfloc(ff00,12,9)" -->"##;

    fn parser() -> AnnotationParser {
        AnnotationParser::new("book-1", "/nonexistent")
    }

    #[test]
    fn test_header_extraction() {
        let line = r#"<!-- filepath="/mnt/ext1/Books/paper.pdf" charset="utf-8" --!>"#;
        assert_eq!(extract_header_path(line), Some("/mnt/ext1/Books/paper.pdf"));

        let line = r#"<!-- filepath="/mnt/ext1/a b/c.pdf" -->"#;
        assert_eq!(extract_header_path(line), Some("/mnt/ext1/a b/c.pdf"));
    }

    #[test]
    fn test_header_keeps_escaped_quotes() {
        let line = r#"<!-- filepath="/mnt/ext1/say \"hi\".pdf" id="1" -->"#;
        assert_eq!(extract_header_path(line), Some(r#"/mnt/ext1/say \"hi\".pdf"#));
    }

    #[test]
    fn test_header_requires_comment() {
        assert_eq!(extract_header_path(r#"<div filepath="/mnt/ext1/a.pdf">"#), None);
        assert_eq!(extract_header_path(r#"<!-- type="32" -->"#), None);
    }

    #[test]
    fn test_read_header_scans_past_preamble() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.html");
        fs::write(
            &path,
            "<html>\n<!-- filepath=\"/mnt/ext1/x.pdf\" -->\n<!-- filepath=\"/mnt/ext1/y.pdf\" -->\n",
        )
        .unwrap();
        assert_eq!(read_header_path(&path).unwrap(), "/mnt/ext1/x.pdf");
    }

    #[test]
    fn test_read_header_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.html");
        fs::write(&path, "<html>\n<body></body>\n").unwrap();
        let err = read_header_path(&path).unwrap_err();
        assert!(matches!(err, AnnotationError::MissingHeader(p) if p == path));
    }

    #[test]
    fn test_header_after_byte_order_mark() {
        let line = "\u{feff}<!-- filepath=\"/mnt/ext1/Books/bom.pdf\" -->";
        assert_eq!(extract_header_path(line), Some("/mnt/ext1/Books/bom.pdf"));
    }

    #[test]
    fn test_page_ignores_trailing_fields() {
        assert_eq!(
            match_marker(HIGHLIGHT_LINE),
            Some(Marker::Highlight { page: Some(7) })
        );
    }

    #[test]
    fn test_highlight_text() {
        let content = format!("{}\n<div class=\"bm-text\">Some passage</div>\n", HIGHLIGHT_LINE);
        let annotations = parser().parse(&content);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind(), AnnotationKind::Highlight);
        assert_eq!(annotations[0].page(), 7);
        assert_eq!(annotations[0].text(), Some("Some passage"));
        assert_eq!(annotations[0].book_id(), "book-1");
    }

    #[test]
    fn test_highlight_bare_brackets() {
        let content = format!("{}\n>TEXT<\n", HIGHLIGHT_LINE);
        let annotations = parser().parse(&content);
        assert_eq!(annotations[0].text(), Some("TEXT"));
    }

    #[test]
    fn test_highlight_text_comes_from_first_bracket() {
        let content = format!("{}\n<span>TEXT</span><div>other</div>\n", HIGHLIGHT_LINE);
        assert_eq!(parser().parse(&content)[0].text(), Some("TEXT"));

        let content = format!("{}\n<p> </p><p>TEXT</p>\n", HIGHLIGHT_LINE);
        assert_eq!(parser().parse(&content)[0].text(), Some(" "));
    }

    #[test]
    fn test_highlight_without_text_is_kept() {
        let content = format!("{}\nno markup here\n", HIGHLIGHT_LINE);
        let annotations = parser().parse(&content);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text(), Some(""));
    }

    #[test]
    fn test_highlight_at_end_of_file() {
        let annotations = parser().parse(HIGHLIGHT_LINE);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text(), Some(""));
    }

    #[test]
    fn test_highlight_decodes_entities() {
        let content = format!("{}\n<div>Fish &amp; chips</div>\n", HIGHLIGHT_LINE);
        let annotations = parser().parse(&content);
        assert_eq!(annotations[0].text(), Some("Fish & chips"));
    }

    #[test]
    fn test_highlight_with_note() {
        let content = format!(
            "{}\n<font color=\"#000\">the passage</font>\n<div class=\"bm-note\">my note</div>\n",
            NOTE_LINE
        );
        let annotations = parser().parse(&content);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind(), AnnotationKind::HighlightWithNote);
        assert_eq!(annotations[0].page(), 12);
        assert_eq!(annotations[0].text(), Some("the passage"));
        assert_eq!(annotations[0].note(), Some("my note"));
    }

    #[test]
    fn test_note_fields_fail_independently() {
        let content = format!("{}\nnothing\n<div>only the note</div>\n", NOTE_LINE);
        let annotations = parser().parse(&content);
        assert_eq!(annotations[0].text(), Some(""));
        assert_eq!(annotations[0].note(), Some("only the note"));

        let content = format!("{}\n<font>only the text</font>\nnothing\n", NOTE_LINE);
        let annotations = parser().parse(&content);
        assert_eq!(annotations[0].text(), Some("only the text"));
        assert_eq!(annotations[0].note(), Some(""));
    }

    #[test]
    fn test_payload_lines_are_not_rescanned() {
        // The highlight's payload line looks like a marker but must be
        // consumed as text.
        let content = format!("{}\n{}\n{}\n>after<\n", HIGHLIGHT_LINE, HIGHLIGHT_LINE, NOTE_LINE);
        let annotations = parser().parse(&content);

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].kind(), AnnotationKind::Highlight);
        assert_eq!(annotations[1].kind(), AnnotationKind::HighlightWithNote);
        assert_eq!(annotations[1].text(), Some("after"));
    }

    #[test]
    fn test_unreadable_page_still_consumes_payload() {
        let content = concat!(
            r##"<!-- type="32" position="#pdfloc(1a2b,99999999999,0)" endposition="#pdfloc(1a2b,7,1)" -->"##,
            "\n",
            r##"<!-- type="32" position="#pdfloc(1a2b,7,0)" endposition="#pdfloc(1a2b,7,1)" -->"##,
            "\n<div>x</div>\n"
        );
        assert!(parser().parse(content).is_empty());

        let content = format!(
            "{}\n<font>passage</font>\n<div>note</div>\n",
            r##"<!-- type="64" position="#pdfloc(ff00)" -->"##
        );
        assert!(parser().parse(&content).is_empty());
    }

    #[test]
    fn test_matchers_follow_kind_codes() {
        let line = |kind: AnnotationKind| {
            format!(
                r##"<!-- type="{}" position="#pdfloc(1,4,0)" svgpath="v.svg" -->"##,
                kind.code()
            )
        };
        assert!(matches!(
            match_marker(&line(AnnotationKind::Freehand)),
            Some(Marker::Freehand { page: Some(4), .. })
        ));
        assert!(matches!(
            match_marker(&line(AnnotationKind::Highlight)),
            Some(Marker::Highlight { page: Some(4) })
        ));
        assert!(matches!(
            match_marker(&line(AnnotationKind::HighlightWithNote)),
            Some(Marker::HighlightWithNote { page: Some(4) })
        ));
        assert_eq!(match_marker(r##"<!-- type="320" position="#pdfloc(1,4,0)" -->"##), None);
    }

    #[test]
    fn test_unknown_types_ignored() {
        let content = concat!(
            r##"<!-- type="8" position="#pdfloc(1,2,3)" endposition="#pdfloc(1,2,3)" -->"##,
            "\n<div>bookmark</div>\n"
        );
        assert!(parser().parse(content).is_empty());
    }

    #[test]
    fn test_no_markers_yields_empty() {
        assert!(parser().parse("<html>\n<body>\n</body>\n</html>\n").is_empty());
        assert!(parser().parse("").is_empty());
    }

    #[test]
    fn test_freehand_reads_svg_dimensions() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("v.svg"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"50\">\n<path d=\"M0 0 L1 1\"/>\n</svg>\n",
        )
        .unwrap();

        let content = r##"<!-- type="16" position="#pdfloc(abc,3,1)" endposition="#pdfloc(abc,3,2)" svgpath="v.svg" -->"##;
        let annotations = AnnotationParser::new("book-1", dir.path()).parse(content);

        assert_eq!(annotations.len(), 1);
        let ink = annotations[0].as_freehand().unwrap();
        assert_eq!(ink.page, 3);
        assert_eq!(ink.svg_path, dir.path().join("v.svg"));
        assert_eq!((ink.width, ink.height), (100, 50));
        assert_eq!((ink.origin_x, ink.origin_y, ink.scale), (0, 0, 1));

        let doc = ink.document().unwrap();
        assert_eq!(doc.strokes.len(), 1);
        assert!(std::ptr::eq(doc, ink.document().unwrap()));
    }

    #[test]
    fn test_freehand_with_bad_svg_is_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.svg"), "<svg>\n").unwrap();

        let content = concat!(
            r##"<!-- type="16" position="#pdfloc(abc,3,1)" endposition="#pdfloc(abc,3,2)" svgpath="missing.svg" -->"##,
            "\n",
            r##"<!-- type="16" position="#pdfloc(abc,4,1)" endposition="#pdfloc(abc,4,2)" svgpath="broken.svg" -->"##,
            "\n",
            r##"<!-- type="32" position="#pdfloc(abc,5,1)" endposition="#pdfloc(abc,5,2)" -->"##,
            "\n<div>kept</div>\n"
        );
        let annotations = AnnotationParser::new("book-1", dir.path()).parse(content);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].page(), 5);
    }

    #[test]
    fn test_freehand_without_svgpath_is_ignored() {
        let content = r##"<!-- type="16" position="#pdfloc(abc,3,1)" endposition="#pdfloc(abc,3,2)" -->"##;
        assert!(parser().parse(content).is_empty());
    }

    #[test]
    fn test_freehand_svgpath_outside_directory_is_dropped() {
        let dir = TempDir::new().unwrap();
        let annotations_dir = dir.path().join("annotations");
        fs::create_dir(&annotations_dir).unwrap();
        let svg = "<svg width=\"100\" height=\"50\">\n</svg>\n";
        fs::write(dir.path().join("outside.svg"), svg).unwrap();

        let content = format!(
            concat!(
                r##"<!-- type="16" position="#pdfloc(abc,3,1)" svgpath="../outside.svg" -->"##,
                "\n",
                r##"<!-- type="16" position="#pdfloc(abc,4,1)" svgpath="{}" -->"##,
                "\n"
            ),
            dir.path().join("outside.svg").display()
        );
        let annotations = AnnotationParser::new("book-1", &annotations_dir).parse(&content);
        assert!(annotations.is_empty());
    }
}
