//! Geometry kernel shared by every layout pass.
//!
//! Provides:
//! - Geometric types (Point, Rect) in top-left-origin page units
//! - Bounding box predicates (intersect, overlap, containment)
//! - Bounding box arithmetic (bound, center, area, L1 distance)
//! - Plane spatial index for window queries over page elements

use std::borrow::Cow;
use std::cmp::Ordering;

use geo_index::rtree::sort::HilbertSort;
use geo_index::rtree::{RTree as GeoRTree, RTreeBuilder, RTreeIndex};
use rstar::{AABB, RTree, RTreeObject};

/// Floating-point infinity for bounding box calculations.
pub const INF_F64: f64 = f64::MAX;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1) where (x0, y0) is the top-left corner
/// and y grows downwards.
pub type Rect = (f64, f64, f64, f64);

/// Trait for objects that have a bounding box.
pub trait HasBBox {
    fn x0(&self) -> f64;
    fn y0(&self) -> f64;
    fn x1(&self) -> f64;
    fn y1(&self) -> f64;

    fn bbox(&self) -> Rect {
        (self.x0(), self.y0(), self.x1(), self.y1())
    }

    fn width(&self) -> f64 {
        self.x1() - self.x0()
    }

    fn height(&self) -> f64 {
        self.y1() - self.y0()
    }

    fn xc(&self) -> f64 {
        (self.x0() + self.x1()) / 2.0
    }

    fn yc(&self) -> f64 {
        (self.y0() + self.y1()) / 2.0
    }
}

impl HasBBox for Rect {
    fn x0(&self) -> f64 {
        self.0
    }
    fn y0(&self) -> f64 {
        self.1
    }
    fn x1(&self) -> f64 {
        self.2
    }
    fn y1(&self) -> f64 {
        self.3
    }
}

/// Rounds half to even, matching the pixel snapping used by alignment tests.
#[inline]
pub fn round_px(v: f64) -> i64 {
    v.round_ties_even() as i64
}

#[inline]
fn is_degenerate(r: Rect) -> bool {
    r.0 == r.2 || r.1 == r.3
}

/// Inclusive intersection test. A zero-width or zero-height box never
/// intersects anything.
pub fn intersect(a: Rect, b: Rect) -> bool {
    if is_degenerate(a) || is_degenerate(b) {
        return false;
    }
    overlaps(a, b)
}

/// Inclusive overlap test that also accepts degenerate boxes (touching
/// edges count as overlap).
#[inline]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.0 <= b.2 && b.0 <= a.2 && a.1 <= b.3 && b.1 <= a.3
}

/// True when `inner` lies fully within `outer` (edges inclusive).
#[inline]
pub fn inside(outer: Rect, inner: Rect) -> bool {
    inner.0 >= outer.0 && inner.2 <= outer.2 && inner.1 >= outer.1 && inner.3 <= outer.3
}

/// True when the point lies within `outer` (edges inclusive).
#[inline]
pub fn contains_point(outer: Rect, p: Point) -> bool {
    inside(outer, (p.0, p.1, p.0, p.1))
}

/// True when `inner` fits inside `outer` grown by `tol` on every side.
pub fn is_contained(inner: Rect, outer: Rect, tol: f64) -> bool {
    inner.0 > outer.0 - tol
        && inner.1 > outer.1 - tol
        && inner.2 < outer.2 + tol
        && inner.3 < outer.3 + tol
}

#[inline]
pub fn center(r: Rect) -> Point {
    ((r.0 + r.2) / 2.0, (r.1 + r.3) / 2.0)
}

#[inline]
pub fn area(r: Rect) -> f64 {
    (r.2 - r.0) * (r.3 - r.1)
}

/// Manhattan distance between two points.
#[inline]
pub fn l1(a: Point, b: Point) -> f64 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Computes a minimal rectangle that covers all the points.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Rect {
    let mut x0 = INF_F64;
    let mut y0 = INF_F64;
    let mut x1 = -INF_F64;
    let mut y1 = -INF_F64;

    for (x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }

    (x0, y0, x1, y1)
}

/// Computes the union of a set of rectangles.
pub fn bound_rects<I: IntoIterator<Item = Rect>>(rects: I) -> Rect {
    get_bound(rects.into_iter().flat_map(|r| [(r.0, r.1), (r.2, r.3)]))
}

/// Orders boxes top to bottom on their rounded top edge, then left to
/// right.
pub fn reading_order(a: Rect, b: Rect) -> Ordering {
    round_px(a.1)
        .cmp(&round_px(b.1))
        .then_with(|| a.0.total_cmp(&b.0))
}

/// Escapes text for HTML element content and attribute values.
pub fn enc(x: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(x)
}

/// Formats a bounding box the way hOCR titles expect it.
pub fn bbox_repr(bbox: Rect) -> String {
    let (x0, y0, x1, y1) = bbox;
    format!(
        "bbox {} {} {} {}",
        x0.trunc() as i64,
        y0.trunc() as i64,
        x1.trunc() as i64,
        y1.trunc() as i64
    )
}

#[derive(Clone)]
struct PlaneNode {
    id: usize,
    bbox: Rect,
}

impl PartialEq for PlaneNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for PlaneNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bbox.0, self.bbox.1], [self.bbox.2, self.bbox.3])
    }
}

/// A set-like data structure for objects placed on a page.
///
/// Uses a static geo-index R-tree for the initial bulk load and a dynamic
/// rstar R-tree for later inserts. Ids are stable (id == insertion index).
pub struct Plane<T> {
    seq: Vec<T>,
    bboxes: Vec<Rect>,
    static_tree: Option<GeoRTree<f64>>,
    static_count: usize,
    dynamic_tree: RTree<PlaneNode>,
}

impl<T: HasBBox> Default for Plane<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HasBBox> Plane<T> {
    pub fn new() -> Self {
        Self {
            seq: Vec::new(),
            bboxes: Vec::new(),
            static_tree: None,
            static_count: 0,
            dynamic_tree: RTree::new(),
        }
    }

    /// Adds objects to the plane. The first batch is bulk-loaded; later
    /// ones go to the dynamic tree.
    pub fn extend(&mut self, objs: impl IntoIterator<Item = T>) {
        let start_idx = self.seq.len();
        for obj in objs {
            self.bboxes.push(obj.bbox());
            self.seq.push(obj);
        }
        if self.seq.len() == start_idx {
            return;
        }

        if start_idx == 0 && self.static_tree.is_none() {
            let mut builder: RTreeBuilder<f64> = RTreeBuilder::new(self.seq.len() as u32);
            for bbox in &self.bboxes {
                builder.add(bbox.0, bbox.1, bbox.2, bbox.3);
            }
            self.static_tree = Some(builder.finish::<HilbertSort>());
            self.static_count = self.seq.len();
        } else {
            for id in start_idx..self.seq.len() {
                let bbox = self.bboxes[id];
                self.dynamic_tree.insert(PlaneNode { id, bbox });
            }
        }
    }

    /// Ids of objects whose boxes touch or overlap `bbox`, sorted by id.
    pub fn candidates(&self, bbox: Rect) -> Vec<usize> {
        let (x0, y0, x1, y1) = bbox;
        let mut ids = Vec::with_capacity(16);
        if let Some(tree) = &self.static_tree {
            ids.extend(
                tree.search(x0, y0, x1, y1)
                    .into_iter()
                    .map(|id| id as usize)
                    .filter(|&id| id < self.static_count),
            );
        }
        let env = AABB::from_corners([x0, y0], [x1, y1]);
        ids.extend(
            self.dynamic_tree
                .locate_in_envelope_intersecting(&env)
                .map(|node| node.id),
        );
        ids.sort_unstable();
        ids
    }

    /// Finds objects that strictly overlap the given bounding box.
    ///
    /// A degenerate query (a horizontal or vertical probe line) returns the
    /// objects that cross it.
    pub fn find_with_indices(&self, bbox: Rect) -> Vec<(usize, &T)> {
        let (x0, y0, x1, y1) = bbox;
        self.candidates(bbox)
            .into_iter()
            .filter(|&id| {
                let b = self.bboxes[id];
                !(b.2 <= x0 || x1 <= b.0 || b.3 <= y0 || y1 <= b.1)
            })
            .map(|id| (id, &self.seq[id]))
            .collect()
    }

    pub fn find(&self, bbox: Rect) -> Vec<&T> {
        self.find_with_indices(bbox)
            .into_iter()
            .map(|(_, obj)| obj)
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_rejects_degenerate() {
        let a = (0.0, 0.0, 10.0, 10.0);
        assert!(intersect(a, (5.0, 5.0, 15.0, 15.0)));
        assert!(intersect(a, (10.0, 10.0, 20.0, 20.0)));
        assert!(!intersect(a, (5.0, 5.0, 5.0, 8.0)));
        assert!(overlaps(a, (5.0, 5.0, 5.0, 8.0)));
    }

    #[test]
    fn test_bound_rects() {
        let r = bound_rects([(1.0, 2.0, 3.0, 4.0), (0.0, 5.0, 2.0, 9.0)]);
        assert_eq!(r, (0.0, 2.0, 3.0, 9.0));
    }

    #[test]
    fn test_round_px_ties_to_even() {
        assert_eq!(round_px(2.5), 2);
        assert_eq!(round_px(3.5), 4);
        assert_eq!(round_px(-0.4), 0);
    }

    #[test]
    fn test_plane_probe_line() {
        let mut plane: Plane<Rect> = Plane::new();
        plane.extend([
            (10.0, 0.0, 10.0, 100.0),
            (50.0, 0.0, 50.0, 40.0),
            (0.0, 20.0, 80.0, 20.0),
        ]);
        plane.extend([(70.0, 0.0, 70.0, 100.0)]);
        let hits: Vec<usize> = plane
            .find_with_indices((0.0, 60.0, 100.0, 60.0))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(hits, vec![0, 3]);
    }

    #[test]
    fn test_is_contained_with_tolerance() {
        let outer = (10.0, 10.0, 50.0, 50.0);
        assert!(is_contained((8.0, 12.0, 52.0, 40.0), outer, 5.0));
        assert!(!is_contained((0.0, 12.0, 40.0, 40.0), outer, 5.0));
    }
}
