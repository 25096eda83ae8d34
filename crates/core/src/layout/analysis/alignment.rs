//! Alignment keys and cluster alignment features.
//!
//! Every text element is snapped to a grid of half the dominant font
//! height along four axes (left edge, right edge, horizontal center,
//! vertical center). Elements sharing a snapped value on an axis, in the
//! same font, are aligned. Keys live only for one clustering pass.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::layout::elements::TextLine;
use crate::utils::HasBBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignAxis {
    X0,
    X1,
    Xc,
    Yc,
}

impl AlignAxis {
    pub const ALL: [AlignAxis; 4] = [AlignAxis::X0, AlignAxis::X1, AlignAxis::Xc, AlignAxis::Yc];

    pub fn is_horizontal(self) -> bool {
        !matches!(self, AlignAxis::Yc)
    }
}

/// A snapped coordinate of one element on one axis.
///
/// `font` is a pass-local font id; it is `None` for lines without a
/// known font, and such keys never count as table evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlignKey {
    pub font: Option<u32>,
    pub axis: AlignAxis,
    pub cell: i64,
}

/// Assigns alignment keys for one clustering pass.
#[derive(Debug)]
pub struct AlignmentTagger<'a> {
    grid_size: f64,
    fonts: FxHashMap<(&'a str, OrderedFloat<f64>), u32>,
}

impl<'a> AlignmentTagger<'a> {
    pub fn new(grid_size: f64) -> Self {
        let grid_size = if grid_size > 0.0 { grid_size } else { 1.0 };
        Self {
            grid_size,
            fonts: FxHashMap::default(),
        }
    }

    fn font_id(&mut self, line: &'a TextLine) -> Option<u32> {
        let name = line.font_name.as_deref().filter(|n| !n.is_empty())?;
        let next = self.fonts.len() as u32;
        Some(
            *self
                .fonts
                .entry((name, OrderedFloat(line.font_size)))
                .or_insert(next),
        )
    }

    fn snap(&self, v: f64) -> i64 {
        (v / self.grid_size).floor() as i64
    }

    /// The four keys of a text line.
    pub fn keys(&mut self, line: &'a TextLine) -> [AlignKey; 4] {
        let font = self.font_id(line);
        let coords = [line.x0(), line.x1(), line.xc(), line.yc()];
        let mut out = [AlignKey {
            font,
            axis: AlignAxis::X0,
            cell: 0,
        }; 4];
        for (slot, (axis, v)) in out.iter_mut().zip(AlignAxis::ALL.into_iter().zip(coords)) {
            slot.axis = axis;
            slot.cell = self.snap(v);
        }
        out
    }
}

/// The pass through which two clusters were joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeVia {
    /// Close elements of the same row.
    Row,
    /// Vertically adjacent, edge-aligned elements.
    Span,
    /// Visible column bridging of cluster spans.
    Align,
    /// Clusters sharing two rows.
    Columns,
}

/// Flag and counter of one merge pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeStat {
    pub connected: bool,
    pub count: u32,
}

impl Default for MergeStat {
    fn default() -> Self {
        Self {
            connected: false,
            count: 1,
        }
    }
}

/// Number of values in [`AlignmentFeatures::to_vec`].
pub const ALIGNMENT_FEATURES: usize = 17;

/// Alignment statistics owned by a cluster and merged with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentFeatures {
    pub row: MergeStat,
    pub span: MergeStat,
    pub align: MergeStat,
    pub columns: MergeStat,
    pub num_segments: u32,
    pub num_curves: u32,
    pub num_figures: u32,
    pub total_word_space: f64,
    pub avg_word_space: f64,
    pub avg_word_space_norm: f64,
    pub node_space: f64,
    pub avg_node_space: f64,
    pub avg_node_space_norm: f64,
}

impl AlignmentFeatures {
    fn stat_mut(&mut self, via: MergeVia) -> &mut MergeStat {
        match via {
            MergeVia::Row => &mut self.row,
            MergeVia::Span => &mut self.span,
            MergeVia::Align => &mut self.align,
            MergeVia::Columns => &mut self.columns,
        }
    }

    /// Folds the features of an absorbed cluster into this one.
    ///
    /// The pass that caused the merge always marks the survivor as
    /// connected and adds the absorbed counter. Other passes only carry
    /// their counters over when either side was already connected.
    pub fn absorb(&mut self, other: &AlignmentFeatures, via: Option<MergeVia>) {
        for kind in [MergeVia::Row, MergeVia::Span, MergeVia::Align, MergeVia::Columns] {
            let theirs = match kind {
                MergeVia::Row => other.row,
                MergeVia::Span => other.span,
                MergeVia::Align => other.align,
                MergeVia::Columns => other.columns,
            };
            let mine = self.stat_mut(kind);
            if via == Some(kind) || mine.connected || theirs.connected {
                mine.connected = true;
                mine.count += theirs.count;
            }
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let flag = |s: MergeStat| if s.connected { 1.0 } else { 0.0 };
        vec![
            flag(self.row),
            self.row.count as f64,
            flag(self.span),
            self.span.count as f64,
            flag(self.align),
            self.align.count as f64,
            flag(self.columns),
            self.columns.count as f64,
            self.num_segments as f64,
            self.num_curves as f64,
            self.num_figures as f64,
            self.total_word_space,
            self.avg_word_space,
            self.avg_word_space_norm,
            self.node_space,
            self.avg_node_space,
            self.avg_node_space_norm,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_snap_to_half_font_grid() {
        let line = TextLine::new((10.0, 20.0, 31.0, 30.0), "abc").with_font("Times", 10.0);
        let mut tagger = AlignmentTagger::new(5.0);
        let keys = tagger.keys(&line);
        let cells: Vec<i64> = keys.iter().map(|k| k.cell).collect();
        assert_eq!(cells, vec![2, 6, 4, 5]);
        assert!(keys.iter().all(|k| k.font == Some(0)));
    }

    #[test]
    fn test_fontless_lines_have_no_font_key() {
        let line = TextLine::new((0.0, 0.0, 5.0, 5.0), "x");
        let mut tagger = AlignmentTagger::new(5.0);
        assert!(tagger.keys(&line).iter().all(|k| k.font.is_none()));
    }

    #[test]
    fn test_absorb_marks_via_and_carries_connected() {
        let mut a = AlignmentFeatures::default();
        let mut b = AlignmentFeatures::default();
        b.row.connected = true;
        b.row.count = 3;
        a.absorb(&b, Some(MergeVia::Span));
        assert!(a.span.connected);
        assert_eq!(a.span.count, 2);
        assert!(a.row.connected);
        assert_eq!(a.row.count, 4);
        assert!(!a.align.connected);
        assert_eq!(a.align.count, 1);
        assert_eq!(a.to_vec().len(), ALIGNMENT_FEATURES);
    }
}
