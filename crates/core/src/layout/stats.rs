//! Per-page typographic statistics that scale every layout threshold.

use crate::utils::{HasBBox, Rect};

use super::elements::{FontHistogram, PageElems, TextLine};

/// Fallback font height and character width when a page has no usable text.
pub const DEFAULT_FONT_PTS: f64 = 2.0;

/// Typographic scale of a set of text lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStats {
    /// Mean height of lines set in the most common glyph size.
    pub avg_font_pts: f64,
    /// Average width of one character.
    pub char_width: f64,
    /// Horizontal extent of all elements considered.
    pub content_width: f64,
}

impl PageStats {
    /// Statistics over a whole page.
    pub fn of_page(page: &PageElems) -> Self {
        Self {
            avg_font_pts: most_common_font_pts(page.mentions.iter(), &page.font_sizes),
            char_width: char_width(page.mentions.iter()),
            content_width: content_width(page.all_bboxes()),
        }
    }

    /// Half the font height; the snapping grid of alignment keys.
    pub fn grid_size(&self) -> f64 {
        self.avg_font_pts / 2.0
    }
}

/// Mean height of the lines whose font size is the most common glyph size.
///
/// Smoothed so that a page whose lines all miss the dominant size still
/// yields [`DEFAULT_FONT_PTS`].
pub fn most_common_font_pts<'a>(
    mentions: impl Iterator<Item = &'a TextLine>,
    font_sizes: &FontHistogram,
) -> f64 {
    let Some(size) = font_sizes.most_common().filter(|s| *s != 0.0) else {
        return DEFAULT_FONT_PTS;
    };
    let mut count = 0.01;
    let mut height_sum = 0.02;
    for m in mentions {
        if m.font_size == size {
            height_sum += m.height();
            count += 1.0;
        }
    }
    height_sum / count
}

/// Summed line width over summed text length.
pub fn char_width<'a>(mentions: impl Iterator<Item = &'a TextLine>) -> f64 {
    let mut len_sum = 0.0;
    let mut chars = 0usize;
    for m in mentions {
        len_sum += m.width();
        chars += m.get_text().chars().count();
    }
    if chars == 0 {
        return DEFAULT_FONT_PTS;
    }
    len_sum / chars as f64
}

/// Horizontal extent covered by a set of boxes; zero when empty.
pub fn content_width(boxes: impl Iterator<Item = Rect>) -> f64 {
    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    for b in boxes {
        xmin = xmin.min(b.0);
        xmax = xmax.max(b.2);
    }
    if xmin > xmax { 0.0 } else { xmax - xmin }
}
