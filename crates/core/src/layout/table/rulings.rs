//! Table candidates from closed ruling rectangles.
//!
//! Rulings are snapped to a coarse grid so that nearly touching strokes
//! meet, collinear pieces are joined, and repeated spans synthesize the
//! closing strokes of boxes drawn with only top and bottom rules. A
//! vertical and a horizontal line starting at the same corner then form a
//! rectangle.

use std::collections::BTreeMap;

use crate::layout::elements::Segment;
use crate::utils::{HasBBox, Rect, area, is_contained};

use super::clustering::cluster_objects;

/// Snapping grid and join distance of ruling lines, in page units.
pub const RULING_TOLERANCE: f64 = 5.0;

/// A snapped line as `(x0, y0, x1, y1)`.
type Line = (i64, i64, i64, i64);

fn snap(v: f64) -> i64 {
    ((v / RULING_TOLERANCE).round_ties_even() * RULING_TOLERANCE) as i64
}

fn snap_line(r: Rect) -> Line {
    (snap(r.0), snap(r.1), snap(r.2), snap(r.3))
}

/// Joins collinear lines that touch or nearly touch. `axis` picks the
/// shared coordinate and `(lo, hi)` the extent along the line.
fn merge_collinear(lines: Vec<Line>, axis: fn(&Line) -> i64, extent: fn(&Line) -> (i64, i64)) -> Vec<Line> {
    let tol = RULING_TOLERANCE as i64;
    let mut out = Vec::with_capacity(lines.len());
    for mut group in cluster_objects(&lines, |l| axis(l) as f64, 0.0) {
        group.sort_by_key(extent);
        let mut runs: Vec<(i64, i64)> = Vec::new();
        for l in &group {
            let (lo, hi) = extent(l);
            match runs.last_mut() {
                Some(run) if lo <= run.1 + tol => run.1 = run.1.max(hi),
                _ => runs.push((lo, hi)),
            }
        }
        let at = axis(&group[0]);
        out.extend(runs.into_iter().map(|(lo, hi)| rebuild(&group[0], at, lo, hi)));
    }
    out
}

fn rebuild(like: &Line, at: i64, lo: i64, hi: i64) -> Line {
    if like.0 == like.2 { (at, lo, at, hi) } else { (lo, at, hi, at) }
}

fn x_of(l: &Line) -> i64 {
    l.0
}

fn y_of(l: &Line) -> i64 {
    l.1
}

fn y_extent(l: &Line) -> (i64, i64) {
    (l.1, l.3)
}

fn x_extent(l: &Line) -> (i64, i64) {
    (l.0, l.2)
}

/// Horizontal lines repeating the same span imply verticals closing both
/// ends of that span.
fn closing_verticals(horizontal: &[Line]) -> Vec<Line> {
    let mut spans: BTreeMap<(i64, i64), Vec<&Line>> = BTreeMap::new();
    for h in horizontal {
        spans.entry((h.0, h.2)).or_default().push(h);
    }
    let mut out = Vec::new();
    for ((x0, x1), lines) in spans {
        if lines.len() < 2 {
            continue;
        }
        let y0 = lines.iter().map(|h| h.1).min().unwrap_or_default();
        let y1 = lines.iter().map(|h| h.3).max().unwrap_or_default();
        out.push((x0, y0, x0, y1));
        out.push((x1, y0, x1, y1));
    }
    out
}

/// Vertical lines repeating the same extent imply horizontals closing both
/// ends of that extent.
fn closing_horizontals(vertical: &[Line]) -> Vec<Line> {
    let mut spans: BTreeMap<(i64, i64), Vec<&Line>> = BTreeMap::new();
    for v in vertical {
        spans.entry((v.1, v.3)).or_default().push(v);
    }
    let mut out = Vec::new();
    for ((y0, y1), lines) in spans {
        if lines.len() < 2 {
            continue;
        }
        let x0 = lines.iter().map(|v| v.0).min().unwrap_or_default();
        let x1 = lines.iter().map(|v| v.2).max().unwrap_or_default();
        out.push((x0, y0, x1, y0));
        out.push((x0, y1, x1, y1));
    }
    out
}

/// Pairs each horizontal line with a vertical line starting at the same
/// top-left corner. Both inputs are walked in (top, left) order and every
/// line is used at most once.
fn pair_corners(mut vertical: Vec<Line>, mut horizontal: Vec<Line>) -> Vec<Rect> {
    let corner = |l: &Line| (l.1, l.0);
    vertical.sort_by_key(|l| (l.1, l.0, l.3, l.2));
    horizontal.sort_by_key(|l| (l.1, l.0, l.3, l.2));
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < horizontal.len() && j < vertical.len() {
        let (h, v) = (horizontal[i], vertical[j]);
        match corner(&h).cmp(&corner(&v)) {
            std::cmp::Ordering::Equal => {
                out.push((h.0 as f64, v.1 as f64, h.2 as f64, v.3 as f64));
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out.retain(|r| r.2 - r.0 > RULING_TOLERANCE && r.3 - r.1 > RULING_TOLERANCE);
    out
}

/// Table candidate boxes drawn by the ruling lines of a page.
pub fn ruling_rectangles(segments: &[Segment]) -> Vec<Rect> {
    let snapped: Vec<Line> = segments.iter().map(|s| snap_line(s.bbox())).collect();
    let vertical: Vec<Line> = snapped.iter().copied().filter(|l| l.0 == l.2).collect();
    let horizontal: Vec<Line> = snapped.iter().copied().filter(|l| l.1 == l.3).collect();
    let vertical = merge_collinear(vertical, x_of, y_extent);
    let horizontal = merge_collinear(horizontal, y_of, x_extent);

    let mut all_vertical = closing_verticals(&horizontal);
    all_vertical.extend_from_slice(&vertical);
    let mut all_horizontal = closing_horizontals(&vertical);
    all_horizontal.extend_from_slice(&horizontal);

    pair_corners(
        merge_collinear(all_vertical, x_of, y_extent),
        merge_collinear(all_horizontal, y_of, x_extent),
    )
}

/// Grows every region to the smallest ruled rectangle enclosing it, so a
/// table found from its text takes the extent of its border. Regions no
/// rectangle encloses are kept as they are.
pub fn snap_to_rulings(regions: &[Rect], segments: &[Segment]) -> Vec<Rect> {
    let rects = ruling_rectangles(segments);
    let mut out: Vec<Rect> = Vec::with_capacity(regions.len());
    for &r in regions {
        let snapped = rects
            .iter()
            .copied()
            .filter(|&rect| is_contained(r, rect, RULING_TOLERANCE))
            .min_by(|a, b| area(*a).total_cmp(&area(*b)))
            .unwrap_or(r);
        if !out.contains(&snapped) {
            out.push(snapped);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(1.0, (x0, y0), (x1, y1))
    }

    #[test]
    fn test_closed_box() {
        let segments = vec![
            seg(100.0, 50.0, 400.0, 50.0),
            seg(100.0, 200.0, 400.0, 200.0),
            seg(100.0, 50.0, 100.0, 200.0),
            seg(400.0, 50.0, 400.0, 200.0),
        ];
        assert_eq!(ruling_rectangles(&segments), vec![(100.0, 50.0, 400.0, 200.0)]);
    }

    #[test]
    fn test_top_and_bottom_rules_only() {
        let segments = vec![
            seg(101.0, 49.0, 399.0, 49.0),
            seg(101.0, 201.0, 399.0, 201.0),
        ];
        assert_eq!(ruling_rectangles(&segments), vec![(100.0, 50.0, 400.0, 200.0)]);
    }

    #[test]
    fn test_broken_stroke_is_joined() {
        let lines = vec![(10, 0, 10, 20), (10, 25, 10, 60), (10, 100, 10, 120)];
        let merged = merge_collinear(lines, x_of, y_extent);
        assert_eq!(merged, vec![(10, 0, 10, 60), (10, 100, 10, 120)]);
    }

    #[test]
    fn test_text_hull_snaps_to_border() {
        let segments = vec![
            seg(100.0, 300.0, 500.0, 300.0),
            seg(100.0, 390.0, 500.0, 390.0),
            seg(100.0, 300.0, 100.0, 390.0),
            seg(500.0, 300.0, 500.0, 390.0),
        ];
        let hulls = [(120.0, 310.0, 460.0, 380.0), (20.0, 20.0, 80.0, 60.0)];
        assert_eq!(
            snap_to_rulings(&hulls, &segments),
            vec![(100.0, 300.0, 500.0, 390.0), (20.0, 20.0, 80.0, 60.0)]
        );
    }

    #[test]
    fn test_hulls_in_one_box_collapse() {
        let segments = vec![
            seg(100.0, 50.0, 400.0, 50.0),
            seg(100.0, 200.0, 400.0, 200.0),
            seg(100.0, 50.0, 100.0, 200.0),
            seg(400.0, 50.0, 400.0, 200.0),
        ];
        let hulls = [(110.0, 60.0, 390.0, 120.0), (110.0, 130.0, 390.0, 190.0)];
        assert_eq!(snap_to_rulings(&hulls, &segments), vec![(100.0, 50.0, 400.0, 200.0)]);
    }

    #[test]
    fn test_thin_rectangles_dropped() {
        let segments = vec![seg(0.0, 0.0, 100.0, 0.0), seg(0.0, 3.0, 100.0, 3.0)];
        assert!(ruling_rectangles(&segments).is_empty());
    }
}
