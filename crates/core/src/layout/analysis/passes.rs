//! Pairwise predicates and passes shared by the table and body-text
//! clusterers.

use crate::layout::params::LayoutParams;
use crate::utils::{Rect, round_px};

use super::union_find::DisjointSet;

/// A frozen view of a [`DisjointSet`]: the root of every element and the
/// members of every root.
#[derive(Debug, Clone, Default)]
pub(crate) struct Partition {
    pub of: Vec<usize>,
    /// Indexed by root; empty for non-roots.
    pub members: Vec<Vec<usize>>,
}

impl Partition {
    pub fn from_set(ds: &mut DisjointSet) -> Self {
        let of = ds.roots();
        let mut members = vec![Vec::new(); of.len()];
        for (i, &r) in of.iter().enumerate() {
            members[r].push(i);
        }
        Self { of, members }
    }

    /// Non-empty groups, ordered by root.
    pub fn groups(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .map(|(r, m)| (r, m.as_slice()))
    }

    pub fn group_of(&self, i: usize) -> &[usize] {
        &self.members[self.of[i]]
    }
}

/// Orders two boxes by their top edge; `None` when the tops are equal.
pub(crate) fn order_vertically(a: Rect, b: Rect) -> Option<(Rect, Rect)> {
    if a.1 < b.1 {
        Some((a, b))
    } else if b.1 < a.1 {
        Some((b, a))
    } else {
        None
    }
}

/// `lower` starts inside `upper`, or the tops or bottoms are within the
/// vertical adjacency distance.
pub(crate) fn is_vertically_adjacent(upper: Rect, lower: Rect, font: f64, params: &LayoutParams) -> bool {
    let reach = params.vertical_adjacency * font;
    lower.1 < upper.3 || lower.1 - upper.1 < reach || lower.3 - upper.3 < reach
}

/// Left edges, right edges or exact centers line up.
pub(crate) fn edges_aligned(a: Rect, b: Rect, tol: f64) -> bool {
    (a.0 - b.0).abs() < tol || (a.2 - b.2).abs() < tol || (a.0 + a.2) / 2.0 == (b.0 + b.2) / 2.0
}

/// One box starts strictly inside the other's horizontal extent.
pub(crate) fn spans_overlap(a: Rect, b: Rect) -> bool {
    (a.0 < b.0 && a.2 > b.0) || (a.0 > b.0 && b.2 > a.0)
}

/// The gap from the left box's right edge to the right box's left edge is
/// at most `gap`.
pub(crate) fn horizontally_close(a: Rect, b: Rect, gap: f64) -> bool {
    (a.0 < b.0 && b.0 - a.2 <= gap) || (b.0 < a.0 && a.0 - b.2 <= gap)
}

fn same_row(a: Rect, b: Rect, tol: f64) -> bool {
    (a.1 - b.1).abs() < tol
        || (a.3 - b.3).abs() < tol
        || round_px((a.1 + a.3) / 2.0) == round_px((b.1 + b.3) / 2.0)
}

/// Groups boxes into rows: tops or bottoms within the row tolerance, or
/// equal rounded vertical centers.
pub(crate) fn row_partition(boxes: &[Rect], font: f64, params: &LayoutParams) -> Partition {
    let tol = params.row_tolerance * font;
    let mut rows = DisjointSet::new(boxes.len());
    rows.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if !ds.same(i, j) && same_row(boxes[i], boxes[j], tol) {
                    changed |= ds.union(i, j).is_some();
                }
            }
        }
        changed
    });
    Partition::from_set(&mut rows)
}

/// Joins horizontally close elements of the same row. `on_merge` sees the
/// `(kept, absorbed)` roots of every union.
pub(crate) fn close_merge_pass(
    ds: &mut DisjointSet,
    boxes: &[Rect],
    rows: &Partition,
    max_gap: f64,
    mut on_merge: impl FnMut(usize, usize),
) {
    ds.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..boxes.len() {
            for &j in rows.group_of(i) {
                if j <= i || ds.same(i, j) {
                    continue;
                }
                if horizontally_close(boxes[i], boxes[j], max_gap) {
                    if let Some((kept, absorbed)) = ds.union(i, j) {
                        on_merge(kept, absorbed);
                        changed = true;
                    }
                }
            }
        }
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bound_rects;

    #[test]
    fn test_rows_by_edges_and_center() {
        let boxes = [
            (0.0, 100.0, 10.0, 110.0),
            (20.0, 100.5, 30.0, 112.0),
            (40.0, 101.0, 50.0, 109.0),
            (0.0, 130.0, 10.0, 140.0),
        ];
        let rows = row_partition(&boxes, 10.0, &LayoutParams::default());
        assert_eq!(rows.of, vec![0, 0, 0, 3]);
        assert_eq!(rows.groups().count(), 2);
    }

    #[test]
    fn test_rows_are_a_fixed_point() {
        let boxes = [
            (0.0, 100.0, 10.0, 110.0),
            (20.0, 100.5, 30.0, 112.0),
            (40.0, 101.0, 50.0, 109.0),
            (0.0, 130.0, 10.0, 140.0),
            (60.0, 130.8, 90.0, 140.2),
        ];
        let params = LayoutParams::default();
        let rows = row_partition(&boxes, 10.0, &params);
        let again = row_partition(&boxes, 10.0, &params);
        assert_eq!(rows.of, again.of);

        let bounds: Vec<Rect> = rows
            .groups()
            .map(|(_, m)| bound_rects(m.iter().map(|&i| boxes[i])))
            .collect();
        assert_eq!(bounds.len(), 2);
        let regrouped = row_partition(&bounds, 10.0, &params);
        assert_eq!(regrouped.groups().count(), bounds.len());
    }

    #[test]
    fn test_close_merge_respects_gap() {
        let boxes = [
            (0.0, 0.0, 10.0, 10.0),
            (13.0, 0.0, 20.0, 10.0),
            (40.0, 0.0, 50.0, 10.0),
        ];
        let rows = row_partition(&boxes, 10.0, &LayoutParams::default());
        let mut ds = DisjointSet::new(3);
        let mut merges = Vec::new();
        close_merge_pass(&mut ds, &boxes, &rows, 4.0, |k, a| merges.push((k, a)));
        assert_eq!(merges, vec![(0, 1)]);
        assert!(!ds.same(0, 2));
    }

    #[test]
    fn test_vertical_predicates() {
        let params = LayoutParams::default();
        let upper = (0.0, 0.0, 50.0, 10.0);
        let lower = (1.0, 12.0, 40.0, 22.0);
        assert_eq!(order_vertically(lower, upper), Some((upper, lower)));
        assert!(is_vertically_adjacent(upper, lower, 10.0, &params));
        assert!(!is_vertically_adjacent(upper, (0.0, 40.0, 50.0, 50.0), 10.0, &params));
        assert!(edges_aligned(upper, lower, 3.0));
        assert!(spans_overlap(upper, lower));
        assert!(order_vertically(upper, (5.0, 0.0, 6.0, 3.0)).is_none());
    }
}
