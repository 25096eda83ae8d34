//! Page normalization: raw PDF-space elements to layout elements.
//!
//! PDF uses a bottom-left origin coordinate system, while layout analysis
//! uses a top-left origin. Raw vector paths are also broken into ruling
//! segments and curves here, and text is cleaned for output.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::utils::{HasBBox, Point, Rect};

use super::elements::{Curve, Figure, Glyph, PageElems, Segment, TextLine};

/// A page as delivered by the external PDF layer, in PDF user space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text_lines: Vec<RawTextLine>,
    #[serde(default)]
    pub paths: Vec<RawPath>,
    #[serde(default)]
    pub figures: Vec<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTextLine {
    pub bbox: Rect,
    pub text: String,
    #[serde(default)]
    pub chars: Vec<RawChar>,
    /// Used only when `chars` is empty.
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub font_size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChar {
    pub text: String,
    pub bbox: Rect,
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub font_size: f64,
}

/// One subpath of a painted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    pub points: Vec<Point>,
    /// The subpath ends with a close operator.
    #[serde(default)]
    pub closed: bool,
    /// The subpath contains Bezier segments.
    #[serde(default)]
    pub curved: bool,
    #[serde(default = "default_linewidth")]
    pub linewidth: f64,
}

fn default_linewidth() -> f64 {
    1.0
}

/// Maps PDF user space to scaled top-left-origin page space.
#[derive(Debug, Clone, Copy)]
struct PageFlip {
    height: f64,
    scaler: f64,
}

impl PageFlip {
    fn pt(&self, p: Point) -> Point {
        (p.0 * self.scaler, self.height - p.1 * self.scaler)
    }

    fn bbox(&self, r: Rect) -> Rect {
        let (x0, y0, x1, y1) = r;
        (
            x0 * self.scaler,
            self.height - y1 * self.scaler,
            x1 * self.scaler,
            self.height - y0 * self.scaler,
        )
    }
}

/// Cleans text for output: newlines become spaces, other ASCII control
/// characters are dropped, surrounding whitespace is stripped.
pub fn clean_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| match c {
            '\n' => Some(' '),
            c if c.is_ascii_control() => None,
            c => Some(c),
        })
        .collect();
    cleaned.trim().to_string()
}

fn check_finite(page: usize, what: &str, vals: &[f64]) -> Result<()> {
    if vals.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LayoutError::InvalidGeometry {
            page,
            msg: format!("non-finite coordinate in {what}"),
        })
    }
}

fn check_rect(page: usize, what: &str, r: Rect) -> Result<()> {
    check_finite(page, what, &[r.0, r.1, r.2, r.3])
}

/// Splits straight-line subpaths into segments. Returns `None` when the
/// path has a sloped edge or Bezier parts and must stay a curve.
fn split_lines(path: &RawPath) -> Option<Vec<(Point, Point)>> {
    let pts = &path.points;
    if path.curved {
        return None;
    }
    let has_slope = pts
        .windows(2)
        .any(|w| w[0].0 != w[1].0 && w[0].1 != w[1].1);
    if has_slope {
        return None;
    }
    let mut lines: Vec<(Point, Point)> = pts.windows(2).map(|w| (w[0], w[1])).collect();
    if path.closed {
        lines.push((pts[0], pts[pts.len() - 1]));
    }
    Some(lines)
}

/// Normalizes one raw page into layout elements.
///
/// `page_num` is 1-based. Straight lines longer than `2 * scaler` become
/// ruling segments; shorter ones and all other paths become curves.
pub fn normalize_page(raw: &RawPage, page_num: usize, scaler: f64) -> Result<PageElems> {
    check_finite(page_num, "page size", &[raw.width, raw.height, scaler])?;
    let flip = PageFlip {
        height: raw.height * scaler,
        scaler,
    };
    let pts_thres = 2.0 * scaler;

    let mut segments = Vec::new();
    let mut curves = Vec::new();
    for path in &raw.paths {
        if path.points.len() < 2 {
            continue;
        }
        for p in &path.points {
            check_finite(page_num, "path", &[p.0, p.1])?;
        }
        match split_lines(path) {
            Some(lines) => {
                for (p0, p1) in lines {
                    let seg = Segment::new(path.linewidth, flip.pt(p0), flip.pt(p1));
                    if seg.width().max(seg.height()) > pts_thres {
                        segments.push(seg);
                    } else {
                        curves.push(Curve::new(path.linewidth, vec![flip.pt(p0), flip.pt(p1)]));
                    }
                }
            }
            None => {
                let pts = path.points.iter().map(|&p| flip.pt(p)).collect();
                curves.push(Curve::new(path.linewidth, pts));
            }
        }
    }

    let mut figures = Vec::with_capacity(raw.figures.len());
    for &f in &raw.figures {
        check_rect(page_num, "figure", f)?;
        figures.push(Figure::new(flip.bbox(f)));
    }

    let mut mentions = Vec::with_capacity(raw.text_lines.len());
    for line in &raw.text_lines {
        check_rect(page_num, "text line", line.bbox)?;
        let text = clean_text(&line.text);
        if text.is_empty() {
            continue;
        }
        let mut glyphs = Vec::with_capacity(line.chars.len());
        for ch in &line.chars {
            check_rect(page_num, "glyph", ch.bbox)?;
            glyphs.push(Glyph::new(
                flip.bbox(ch.bbox),
                ch.text.clone(),
                ch.font_name.clone(),
                ch.font_size,
            ));
        }
        mentions.push(build_text_line(flip.bbox(line.bbox), text, glyphs, line));
    }

    debug!(
        page = page_num,
        mentions = mentions.len(),
        segments = segments.len(),
        curves = curves.len(),
        figures = figures.len(),
        "normalized page"
    );
    Ok(PageElems::new(
        page_num,
        raw.width * scaler,
        raw.height * scaler,
        mentions,
        segments,
        curves,
        figures,
    ))
}

/// Takes the font of the first alphanumeric glyph and snaps the line's
/// vertical extent to it, so sub/superscripts and symbols do not skew
/// row alignment.
fn build_text_line(bbox: Rect, text: String, glyphs: Vec<Glyph>, raw: &RawTextLine) -> TextLine {
    let anchor = glyphs
        .iter()
        .find(|g| g.is_alphanumeric())
        .map(|g| (g.font_name.clone(), g.font_size, g.y0(), g.y1()));
    let has_glyphs = !glyphs.is_empty();
    let mut line = TextLine::new(bbox, text).with_glyphs(glyphs);
    match anchor {
        Some((name, size, y0, y1)) => {
            line.font_name = name;
            line.font_size = size;
            line.set_bbox((bbox.0, y0, bbox.2, y1));
        }
        None if !has_glyphs => {
            line.font_name = raw.font_name.clone();
            line.font_size = raw.font_size;
        }
        None => {}
    }
    line
}

/// Normalizes every page; page numbers start at 1.
pub fn normalize_document(raw: &[RawPage], scaler: f64) -> Result<Vec<PageElems>> {
    raw.iter()
        .enumerate()
        .map(|(i, page)| normalize_page(page, i + 1, scaler))
        .collect()
}
