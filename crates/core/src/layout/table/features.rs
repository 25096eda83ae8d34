//! Feature vectors of table candidates, for pluggable classifiers.
//!
//! Each candidate region yields the summed alignment features of the
//! clusters found inside it followed by seven coverage and content
//! features.

use crate::layout::analysis::{ALIGNMENT_FEATURES, region_alignment_features};
use crate::layout::elements::PageElems;
use crate::layout::params::LayoutParams;
use crate::utils::{HasBBox, Rect, area};

/// Number of coverage and content features per candidate.
pub const LINE_FEATURES: usize = 7;

/// Length of a full candidate feature vector.
pub const CANDIDATE_FEATURES: usize = ALIGNMENT_FEATURES + LINE_FEATURES;

fn is_punctuation(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_punctuation())
}

/// Coverage and content features of a region:
///
/// 0. area over page area
/// 1. height over page height
/// 2. width over page width
/// 3. summed text area over region area
/// 4. text lines made of a single punctuation mark
/// 5. digits in the text
/// 6. ruling segments inside the region
pub fn line_features(page: &PageElems, region: Rect) -> [f64; LINE_FEATURES] {
    let mentions = page.mentions_within(region);
    let segments = page.segments_within(region);
    let region_area = area(region);
    let text_area: f64 = mentions.iter().map(|&m| area(page.mentions[m].bbox())).sum();
    let sparsity = if region_area == 0.0 { 0.0 } else { text_area / region_area };
    let punctuation = mentions
        .iter()
        .filter(|&&m| is_punctuation(page.mentions[m].get_text()))
        .count();
    let digits: usize = mentions
        .iter()
        .map(|&m| page.mentions[m].get_text().chars().filter(char::is_ascii_digit).count())
        .sum();
    [
        region_area / (page.width * page.height),
        region.height() / page.height,
        region.width() / page.width,
        sparsity,
        punctuation as f64,
        digits as f64,
        segments.len() as f64,
    ]
}

/// The full feature vector of one candidate region.
pub fn candidate_features(page: &PageElems, region: Rect, params: &LayoutParams) -> Vec<f64> {
    let mut features = region_alignment_features(page, region, params);
    features.extend(line_features(page, region));
    features
}

/// One feature row per candidate, in candidate order.
pub fn feature_matrix(page: &PageElems, regions: &[Rect], params: &LayoutParams) -> Vec<Vec<f64>> {
    regions
        .iter()
        .map(|&r| candidate_features(page, r, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::elements::{Segment, TextLine};

    fn page() -> PageElems {
        let mentions = vec![
            TextLine::new((110.0, 110.0, 150.0, 120.0), "2019"),
            TextLine::new((160.0, 110.0, 165.0, 120.0), "-"),
            TextLine::new((400.0, 400.0, 450.0, 410.0), "outside 77"),
        ];
        let segments = vec![Segment::new(1.0, (100.0, 100.0), (300.0, 100.0))];
        PageElems::new(1, 500.0, 1000.0, mentions, segments, vec![], vec![])
    }

    #[test]
    fn test_line_features() {
        let f = line_features(&page(), (100.0, 100.0, 300.0, 200.0));
        assert_eq!(f[0], 20000.0 / 500000.0);
        assert_eq!(f[1], 0.1);
        assert_eq!(f[2], 0.4);
        assert_eq!(f[3], 450.0 / 20000.0);
        assert_eq!(f[4], 1.0);
        assert_eq!(f[5], 4.0);
        assert_eq!(f[6], 1.0);
    }

    #[test]
    fn test_candidate_vector_length() {
        let params = LayoutParams::default();
        let rows = feature_matrix(&page(), &[(100.0, 100.0, 300.0, 200.0), (0.0, 0.0, 10.0, 10.0)], &params);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == CANDIDATE_FEATURES));
        assert!(rows[1][..ALIGNMENT_FEATURES].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_punctuation_is_single_mark() {
        assert!(is_punctuation(";"));
        assert!(!is_punctuation(";;"));
        assert!(!is_punctuation("a"));
    }
}
