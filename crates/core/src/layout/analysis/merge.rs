//! Nested/overlapping node merging.

use crate::layout::node::Node;
use crate::utils::{HasBBox, center, intersect, l1};

/// Absorbs every node into the intersecting node whose center is nearest
/// (L1) to its own, visiting nodes in order.
///
/// Absorbed nodes are tombstoned with the index they merged into; the
/// surviving boxes grow immediately so later candidates see them, and
/// member payloads move to their final owner in one sweep at the end.
/// Survivors keep their relative order.
pub fn merge_nodes(mut nodes: Vec<Node>) -> Vec<Node> {
    let n = nodes.len();
    let mut merged_into: Vec<Option<usize>> = vec![None; n];

    for inner in 0..n {
        let inner_bbox = nodes[inner].bbox();
        let inner_center = center(inner_bbox);
        let best = (0..n)
            .filter(|&o| o != inner && merged_into[o].is_none())
            .filter(|&o| intersect(nodes[o].bbox(), inner_bbox))
            .min_by(|&a, &b| {
                let da = l1(center(nodes[a].bbox()), inner_center);
                let db = l1(center(nodes[b].bbox()), inner_center);
                da.total_cmp(&db)
            });
        if let Some(outer) = best {
            merged_into[inner] = Some(outer);
            nodes[outer].expand(inner_bbox);
        }
    }

    // Resolve chains to their surviving owner.
    let mut owner: Vec<usize> = (0..n).collect();
    for i in 0..n {
        let mut cur = i;
        while let Some(next) = merged_into[cur] {
            cur = next;
        }
        owner[i] = cur;
    }

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    for i in 0..n {
        if owner[i] == i {
            continue;
        }
        if let Some(absorbed) = slots[i].take() {
            if let Some(target) = slots[owner[i]].as_mut() {
                target.merge(absorbed);
            }
        }
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::elements::{ElemRef, PageElems, TextLine};

    fn page(boxes: &[(f64, f64, f64, f64)]) -> PageElems {
        let mentions = boxes
            .iter()
            .map(|&b| TextLine::new(b, "x"))
            .collect();
        PageElems::new(1, 500.0, 500.0, mentions, vec![], vec![], vec![])
    }

    fn singletons(page: &PageElems) -> Vec<Node> {
        (0..page.mentions.len())
            .map(|i| Node::new(page, vec![ElemRef::text(i)], |_| None))
            .collect()
    }

    #[test]
    fn test_overlapping_pair_collapses() {
        let p = page(&[
            (0.0, 0.0, 100.0, 100.0),
            (10.0, 10.0, 20.0, 20.0),
            (300.0, 300.0, 310.0, 310.0),
        ]);
        let merged = merge_nodes(singletons(&p));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].members.len(), 2);
        assert_eq!(merged[0].bbox(), (0.0, 0.0, 100.0, 100.0));
        assert_eq!(merged[1].members, vec![ElemRef::text(2)]);
    }

    #[test]
    fn test_chain_resolves_to_final_owner() {
        let p = page(&[
            (0.0, 0.0, 10.0, 10.0),
            (5.0, 5.0, 30.0, 30.0),
            (25.0, 25.0, 60.0, 60.0),
        ]);
        let merged = merge_nodes(singletons(&p));
        assert_eq!(merged.len(), 1);
        let mut members = merged[0].members.clone();
        members.sort();
        assert_eq!(members, (0..3).map(ElemRef::text).collect::<Vec<_>>());
        assert_eq!(merged[0].bbox(), (0.0, 0.0, 60.0, 60.0));
    }

    #[test]
    fn test_disjoint_nodes_untouched() {
        let p = page(&[(0.0, 0.0, 10.0, 10.0), (20.0, 0.0, 30.0, 10.0)]);
        assert_eq!(merge_nodes(singletons(&p)).len(), 2);
    }
}
