//! Ink stroke SVG files
//!
//! The device writes each freehand annotation as a small SVG whose root
//! element, on the first line, declares the drawing's width and height.
//! Only those dimensions are needed to place a stroke, so
//! [`read_dimensions`] stops after the first line. [`SvgDocument`] parses the
//! whole file for callers that need the stroke geometry itself.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AnnotationError, Result};

static WIDTH_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?:^|\s)width="(\d+)(?:px)?""#).unwrap());
static HEIGHT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:^|\s)height="(\d+)(?:px)?""#).unwrap());

/// Declared drawing size of a stroke file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgDimensions {
    pub width: u32,
    pub height: u32,
}

/// Read the width and height declared on the first line of an SVG file.
pub fn read_dimensions(path: &Path) -> Result<SvgDimensions> {
    let unavailable = |reason: String| AnnotationError::GeometryUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
    let mut first = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut first)
        .map_err(|e| unavailable(e.to_string()))?;
    let first = String::from_utf8_lossy(&first);

    parse_dimensions(&first).ok_or_else(|| unavailable("no width/height on first line".to_string()))
}

/// Extract `width`/`height` attributes from a single line.
pub fn parse_dimensions(line: &str) -> Option<SvgDimensions> {
    let width = WIDTH_ATTR.captures(line)?.get(1)?.as_str().parse().ok()?;
    let height = HEIGHT_ATTR.captures(line)?.get(1)?.as_str().parse().ok()?;
    Some(SvgDimensions { width, height })
}

/// Geometry element a stroke was drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeKind {
    Path,
    Polyline,
    Polygon,
    Line,
}

/// One drawn stroke
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub kind: StrokeKind,
    /// `d` for paths, `points` for polylines, `x1 y1 x2 y2` for lines
    pub data: String,
    pub color: Option<String>,
    pub stroke_width: Option<f32>,
}

/// Fully parsed stroke file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgDocument {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub view_box: Option<String>,
    pub strokes: Vec<Stroke>,
}

impl SvgDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let xml = std::fs::read(path)?;
        Self::parse(&String::from_utf8_lossy(&xml))
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut document = SvgDocument::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"svg" => document.read_root(&e)?,
                    b"path" => document.push_stroke(StrokeKind::Path, &e)?,
                    b"polyline" => document.push_stroke(StrokeKind::Polyline, &e)?,
                    b"polygon" => document.push_stroke(StrokeKind::Polygon, &e)?,
                    b"line" => document.push_stroke(StrokeKind::Line, &e)?,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(document)
    }

    fn read_root(&mut self, element: &BytesStart<'_>) -> Result<()> {
        for attr in element.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"width" => self.width = parse_length(&value),
                b"height" => self.height = parse_length(&value),
                b"viewBox" => self.view_box = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(())
    }

    fn push_stroke(&mut self, kind: StrokeKind, element: &BytesStart<'_>) -> Result<()> {
        let mut stroke = Stroke {
            kind,
            data: String::new(),
            color: None,
            stroke_width: None,
        };
        let mut line_coords = [String::new(), String::new(), String::new(), String::new()];

        for attr in element.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"d" if kind == StrokeKind::Path => stroke.data = value.into_owned(),
                b"points" => stroke.data = value.into_owned(),
                b"x1" => line_coords[0] = value.into_owned(),
                b"y1" => line_coords[1] = value.into_owned(),
                b"x2" => line_coords[2] = value.into_owned(),
                b"y2" => line_coords[3] = value.into_owned(),
                b"stroke" => stroke.color = Some(value.into_owned()),
                b"stroke-width" => stroke.stroke_width = parse_length(&value),
                _ => {}
            }
        }

        if kind == StrokeKind::Line {
            stroke.data = line_coords.join(" ");
        }

        self.strokes.push(stroke);
        Ok(())
    }
}

fn parse_length(value: &str) -> Option<f32> {
    value.trim().trim_end_matches("px").parse().ok()
}
