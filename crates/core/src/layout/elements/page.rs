//! PageElems: the normalized element collections of one page.

use ordered_float::OrderedFloat;

use crate::utils::{HasBBox, Rect, is_contained, overlaps};

use super::graphics::{Curve, Figure, Segment};
use super::item::{ElemKind, ElemRef};
use super::text::TextLine;

/// Histogram of glyph font sizes, kept in first-seen order so ties on the
/// most common size resolve deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontHistogram {
    entries: Vec<(OrderedFloat<f64>, usize)>,
}

impl FontHistogram {
    pub fn add(&mut self, size: f64, count: usize) {
        let key = OrderedFloat(size);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += count,
            None => self.entries.push((key, count)),
        }
    }

    /// Counts every glyph of every line. Lines without glyph boxes count
    /// their own font size once per character.
    pub fn from_lines(lines: &[TextLine]) -> Self {
        let mut hist = Self::default();
        for line in lines {
            if line.glyphs.is_empty() {
                if line.font_size > 0.0 {
                    hist.add(line.font_size, line.get_text().chars().count());
                }
            } else {
                for g in &line.glyphs {
                    hist.add(g.font_size, 1);
                }
            }
        }
        hist
    }

    /// The most frequent size, earliest seen on ties.
    pub fn most_common(&self) -> Option<f64> {
        let mut best: Option<(OrderedFloat<f64>, usize)> = None;
        for &(k, n) in &self.entries {
            if best.is_none_or(|(_, bn)| n > bn) {
                best = Some((k, n));
            }
        }
        best.map(|(k, _)| k.into_inner())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Slack allowed when testing whether an element lies inside a region.
pub const CONTAIN_TOLERANCE: f64 = 5.0;

fn truncated(r: Rect) -> Rect {
    (r.0.trunc(), r.1.trunc(), r.2.trunc(), r.3.trunc())
}

/// All normalized elements of one page, in top-left-origin page units.
#[derive(Debug, Clone, Default)]
pub struct PageElems {
    /// 1-based page number.
    pub page_num: usize,
    pub width: f64,
    pub height: f64,
    pub mentions: Vec<TextLine>,
    pub segments: Vec<Segment>,
    pub curves: Vec<Curve>,
    pub figures: Vec<Figure>,
    pub font_sizes: FontHistogram,
}

impl PageElems {
    pub fn new(
        page_num: usize,
        width: f64,
        height: f64,
        mentions: Vec<TextLine>,
        segments: Vec<Segment>,
        curves: Vec<Curve>,
        figures: Vec<Figure>,
    ) -> Self {
        let font_sizes = FontHistogram::from_lines(&mentions);
        Self {
            page_num,
            width,
            height,
            mentions,
            segments,
            curves,
            figures,
            font_sizes,
        }
    }

    pub fn bbox(&self) -> Rect {
        (0.0, 0.0, self.width, self.height)
    }

    pub fn bbox_of(&self, r: ElemRef) -> Rect {
        match r.kind {
            ElemKind::Text => self.mentions[r.index].bbox(),
            ElemKind::Segment => self.segments[r.index].bbox(),
            ElemKind::Curve => self.curves[r.index].bbox(),
            ElemKind::Figure => self.figures[r.index].bbox(),
        }
    }

    pub fn text_of(&self, r: ElemRef) -> Option<&TextLine> {
        match r.kind {
            ElemKind::Text => self.mentions.get(r.index),
            _ => None,
        }
    }

    pub fn curve_area(&self, r: ElemRef) -> Option<f64> {
        match r.kind {
            ElemKind::Curve => self.curves.get(r.index).map(Curve::area),
            _ => None,
        }
    }

    /// Indices of the text lines whose truncated boxes lie inside `region`,
    /// give or take [`CONTAIN_TOLERANCE`].
    pub fn mentions_within(&self, region: Rect) -> Vec<usize> {
        within(self.mentions.iter().map(HasBBox::bbox), region)
    }

    /// Indices of the ruling segments inside `region`, with the same slack
    /// as [`Self::mentions_within`].
    pub fn segments_within(&self, region: Rect) -> Vec<usize> {
        within(self.segments.iter().map(HasBBox::bbox), region)
    }

    /// Ruling segments touching `region`, clipped to it. Pieces shorter
    /// than `min_len` after clipping are dropped.
    pub fn rulings_clipped_to(&self, region: Rect, min_len: f64) -> Vec<Rect> {
        self.segments
            .iter()
            .map(HasBBox::bbox)
            .filter(|&b| overlaps(b, region))
            .map(|b| (b.0.max(region.0), b.1.max(region.1), b.2.min(region.2), b.3.min(region.3)))
            .filter(|c| (c.2 - c.0).max(c.3 - c.1) >= min_len)
            .collect()
    }

    /// Bounding boxes of every element of the page, of all kinds.
    pub fn all_bboxes(&self) -> impl Iterator<Item = Rect> + '_ {
        self.mentions
            .iter()
            .map(HasBBox::bbox)
            .chain(self.segments.iter().map(HasBBox::bbox))
            .chain(self.figures.iter().map(HasBBox::bbox))
            .chain(self.curves.iter().map(HasBBox::bbox))
    }
}

fn within(boxes: impl Iterator<Item = Rect>, region: Rect) -> Vec<usize> {
    boxes
        .enumerate()
        .filter(|(_, b)| is_contained(truncated(*b), region, CONTAIN_TOLERANCE))
        .map(|(i, _)| i)
        .collect()
}
