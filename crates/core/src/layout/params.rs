//! Layout analysis parameters.
//!
//! Contains LayoutParams, the tunable thresholds of the alignment
//! clusterer and the node classifier.

use serde::{Deserialize, Serialize};

/// Parameters for layout analysis.
///
/// Most distances are relative to the dominant font height of the page
/// (`font`) or to the average character width (`char`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Two elements share a row when their top or bottom edges differ by
    /// less than this fraction of the font height.
    pub row_tolerance: f64,

    /// Elements in different rows are vertically adjacent when their tops
    /// or bottoms are within this many font heights.
    pub vertical_adjacency: f64,

    /// Absolute left/right edge tolerance (page units) for span merging.
    pub edge_tolerance: f64,

    /// Edge tolerance for body-text span merging, in character widths.
    pub text_edge_tolerance: f64,

    /// Body-text lines whose heights differ by more than this many font
    /// heights are never merged vertically.
    pub height_mismatch: f64,

    /// Rows whose covered text width differs by more than this fraction of
    /// the content width are never bridged by the span pass.
    pub span_mismatch: f64,

    /// Maximum horizontal gap, in character widths, for merging two
    /// elements of the same row.
    pub close_merge: f64,

    /// Lower bound of the blacklisted cluster width band, as a fraction of
    /// the content width.
    pub blacklist_min_ratio: f64,

    /// Upper bound of the blacklisted cluster width band.
    pub blacklist_max_ratio: f64,

    /// Clusters wider than this fraction of the content width are
    /// blacklisted from column bridging.
    pub blacklist_wide_ratio: f64,

    /// Pages with more text elements than this are skipped.
    pub max_elements: usize,

    /// A header is shorter than this many font heights.
    pub header_height: f64,

    /// A header is followed by a vertical gap larger than this many font
    /// heights.
    pub header_gap: f64,

    /// Nodes at most this many font heights tall are single-line
    /// section headers.
    pub single_line_height: f64,

    /// Number of leading characters inspected for caption prefixes.
    pub caption_prefix_len: usize,

    /// A table candidate is rejected when a member line comes within this
    /// many character widths of the candidate's full width.
    pub table_line_margin: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            row_tolerance: 0.11,
            vertical_adjacency: 1.5,
            edge_tolerance: 3.0,
            text_edge_tolerance: 3.0,
            height_mismatch: 0.5,
            span_mismatch: 0.1,
            close_merge: 2.0,
            blacklist_min_ratio: 1.0 / 2.75,
            blacklist_max_ratio: 0.5,
            blacklist_wide_ratio: 0.9,
            max_elements: 3500,
            header_height: 2.0,
            header_gap: 1.5,
            single_line_height: 2.0,
            caption_prefix_len: 10,
            table_line_margin: 2.0,
        }
    }
}

impl LayoutParams {
    /// Returns params with the body-text edge tolerance and the element cap
    /// replaced.
    ///
    /// # Panics
    /// Panics if `max_elements` is zero.
    pub fn with_limits(text_edge_tolerance: f64, max_elements: usize) -> Self {
        assert!(max_elements > 0, "max_elements must be positive");
        Self {
            text_edge_tolerance,
            max_elements,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = LayoutParams::default();
        assert_eq!(p.max_elements, 3500);
        assert!((p.row_tolerance - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_partial_override_from_json() {
        let p: LayoutParams = serde_json::from_str(r#"{"max_elements": 10}"#).unwrap();
        assert_eq!(p.max_elements, 10);
        assert_eq!(p.close_merge, 2.0);
    }

    #[test]
    #[should_panic]
    fn test_with_limits_rejects_zero() {
        let _ = LayoutParams::with_limits(3.0, 0);
    }
}
