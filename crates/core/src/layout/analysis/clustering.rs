//! Alignment clustering of table candidates.
//!
//! Text lines are joined by a sequence of union-find passes:
//! 1. close elements of one row,
//! 2. vertically adjacent, edge-aligned elements (span pass),
//! 3. visible column bridges between cluster spans,
//! 4. clusters that share two rows (column pass, to a fixed point).
//!
//! Clusters about half or nearly all of the content width are kept out of
//! steps 3 and 4; those are body text columns, not table columns. Every
//! cluster carries [`AlignmentFeatures`] recording which passes joined it.

use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::layout::elements::{ElemRef, PageElems};
use crate::layout::node::{Node, NodeType, TableThresholds};
use crate::layout::params::LayoutParams;
use crate::layout::stats::{PageStats, char_width, content_width, most_common_font_pts};
use crate::utils::{HasBBox, Plane, Rect, bound_rects, intersect, overlaps, round_px};

use super::alignment::{ALIGNMENT_FEATURES, AlignKey, AlignmentFeatures, AlignmentTagger, MergeVia};
use super::merge::merge_nodes;
use super::passes::{
    Partition, close_merge_pass, edges_aligned, is_vertically_adjacent, order_vertically,
    row_partition, spans_overlap,
};
use super::union_find::DisjointSet;

/// Non-text boxes counted into cluster features.
#[derive(Debug, Clone, Default)]
pub struct GraphicBoxes {
    pub segments: Vec<Rect>,
    pub curves: Vec<Rect>,
    pub figures: Vec<Rect>,
}

impl GraphicBoxes {
    pub fn of_page(page: &PageElems) -> Self {
        Self {
            segments: page.segments.iter().map(HasBBox::bbox).collect(),
            curves: page.curves.iter().map(HasBBox::bbox).collect(),
            figures: page.figures.iter().map(HasBBox::bbox).collect(),
        }
    }

    /// Graphics touching `region`.
    pub fn within(page: &PageElems, region: Rect) -> Self {
        let keep = |boxes: Vec<Rect>| -> Vec<Rect> {
            boxes.into_iter().filter(|&b| overlaps(region, b)).collect()
        };
        let all = Self::of_page(page);
        Self {
            segments: keep(all.segments),
            curves: keep(all.curves),
            figures: keep(all.figures),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Rect> + '_ {
        self.segments
            .iter()
            .chain(&self.curves)
            .chain(&self.figures)
            .copied()
    }
}

fn count_touching(boxes: &[Rect], bbox: Rect) -> u32 {
    boxes.iter().filter(|&&b| overlaps(bbox, b)).count() as u32
}

fn absorb_into(features: &mut [AlignmentFeatures], kept: usize, absorbed: usize, via: MergeVia) {
    let other = std::mem::take(&mut features[absorbed]);
    features[kept].absorb(&other, Some(via));
}

/// Pairs of the same preliminary column whose rows cover very different
/// text widths; the span pass never joins them.
fn unmergeable_pairs(
    boxes: &[Rect],
    rows: &Partition,
    font: f64,
    width: f64,
    params: &LayoutParams,
) -> FxHashSet<(usize, usize)> {
    let n = boxes.len();
    let mut prelim = DisjointSet::new(n);
    prelim.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if ds.same(i, j) {
                    continue;
                }
                let Some((upper, lower)) = order_vertically(boxes[i], boxes[j]) else {
                    continue;
                };
                if is_vertically_adjacent(upper, lower, font, params)
                    && (edges_aligned(upper, lower, params.edge_tolerance) || spans_overlap(upper, lower))
                {
                    changed |= ds.union(i, j).is_some();
                }
            }
        }
        changed
    });
    let prelim = Partition::from_set(&mut prelim);

    let mut out = FxHashSet::default();
    if width <= 0.0 {
        return out;
    }
    let row_text: Vec<f64> = rows
        .members
        .iter()
        .map(|m| m.iter().map(|&k| boxes[k].2 - boxes[k].0).sum())
        .collect();
    for i in 0..n {
        for &j in prelim.group_of(i) {
            if j <= i || rows.of[i] == rows.of[j] || boxes[i].1 == boxes[j].1 {
                continue;
            }
            let diff = (row_text[rows.of[i]] - row_text[rows.of[j]]).abs();
            if diff / width > params.span_mismatch {
                out.insert((i, j));
            }
        }
    }
    out
}

/// Sum of gaps between consecutive boxes ordered by left edge, and the
/// number of boxes.
fn gap_sum(boxes: &[Rect], members: impl Iterator<Item = usize>) -> (f64, usize) {
    let sorted: Vec<Rect> = members
        .map(|m| boxes[m])
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .collect();
    let sum = sorted.windows(2).map(|w| w[1].0 - w[0].2).sum();
    (sum, sorted.len())
}

fn per_gap(sum: f64, len: usize) -> f64 {
    if len > 1 { sum / (len - 1) as f64 } else { 0.0 }
}

/// Word spacing of the rows a node touches, over whole rows and over the
/// node's own members.
fn fill_spacing(features: &mut AlignmentFeatures, members: &[usize], boxes: &[Rect], rows: &Partition) {
    let mut by_row: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &m in members {
        by_row.entry(rows.of[m]).or_default().push(m);
    }
    if by_row.is_empty() {
        return;
    }
    let nrows = by_row.len() as f64;
    for (row, in_node) in by_row {
        let (row_sum, row_len) = gap_sum(boxes, rows.members[row].iter().copied());
        features.total_word_space += row_sum;
        features.avg_word_space_norm += per_gap(row_sum, row_len);
        let (node_sum, node_len) = gap_sum(boxes, in_node.into_iter());
        features.node_space += node_sum;
        features.avg_node_space_norm += per_gap(node_sum, node_len);
    }
    features.avg_word_space = features.total_word_space / nrows;
    features.avg_word_space_norm /= nrows;
    features.avg_node_space = features.node_space / nrows;
    features.avg_node_space_norm /= nrows;
}

/// Clusters the text lines `texts` (indices into `page.mentions`) into
/// aligned nodes, each carrying its alignment features.
///
/// Returns nothing when `texts` is empty or larger than
/// `params.max_elements`.
pub fn cluster_aligned(
    page: &PageElems,
    texts: &[usize],
    graphics: &GraphicBoxes,
    stats: &PageStats,
    params: &LayoutParams,
) -> Vec<Node> {
    let n = texts.len();
    if n == 0 || n > params.max_elements {
        debug!(page = page.page_num, elements = n, "skipping alignment clustering");
        return Vec::new();
    }
    let boxes: Vec<Rect> = texts.iter().map(|&i| page.mentions[i].bbox()).collect();
    let font = stats.avg_font_pts;
    let width = stats.content_width;
    let rows = row_partition(&boxes, font, params);
    let not_merge = unmergeable_pairs(&boxes, &rows, font, width, params);

    let mut features = vec![AlignmentFeatures::default(); n];
    let mut cid = DisjointSet::new(n);
    close_merge_pass(
        &mut cid,
        &boxes,
        &rows,
        params.close_merge * stats.char_width,
        |kept, absorbed| absorb_into(&mut features, kept, absorbed, MergeVia::Row),
    );

    cid.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if ds.same(i, j) || not_merge.contains(&(i, j)) {
                    continue;
                }
                let Some((upper, lower)) = order_vertically(boxes[i], boxes[j]) else {
                    continue;
                };
                if is_vertically_adjacent(upper, lower, font, params)
                    && edges_aligned(upper, lower, params.edge_tolerance)
                {
                    if let Some((kept, absorbed)) = ds.union(i, j) {
                        absorb_into(&mut features, kept, absorbed, MergeVia::Span);
                        changed = true;
                    }
                }
            }
        }
        changed
    });
    let clusters = Partition::from_set(&mut cid);

    // Spans and the blacklist, indexed by cluster root.
    let mut spans = vec![(0.0, 0.0, 0.0, 0.0); n];
    let mut blocked_cluster = vec![false; n];
    let mut blocked = vec![false; n];
    for (root, members) in clusters.groups() {
        let span = bound_rects(members.iter().map(|&m| boxes[m]));
        spans[root] = span;
        let w = span.2 - span.0;
        let half_column = w > width * params.blacklist_min_ratio && w < width * params.blacklist_max_ratio;
        if half_column || w > width * params.blacklist_wide_ratio {
            blocked_cluster[root] = true;
            for &m in members {
                blocked[m] = true;
                for &k in rows.group_of(m) {
                    if boxes[k].0 >= span.0 && boxes[k].2 <= span.2 {
                        blocked[k] = true;
                    }
                }
            }
        }
    }

    // Column bridges between clusters with nothing else in between.
    let mut plane: Plane<Rect> = Plane::new();
    plane.extend(boxes.iter().copied());
    let mut align = DisjointSet::new(n);
    let mut compared: FxHashSet<(usize, usize)> = FxHashSet::default();
    for i in 0..n {
        if blocked[i] {
            continue;
        }
        for j in (i + 1)..n {
            let (c1, c2) = (clusters.of[i], clusters.of[j]);
            if blocked[j] || c1 == c2 || rows.of[i] == rows.of[j] {
                continue;
            }
            let key = (c1.min(c2), c1.max(c2));
            if compared.contains(&key) {
                continue;
            }
            let (s1, s2) = if spans[c1].1 < spans[c2].1 {
                (spans[c1], spans[c2])
            } else {
                (spans[c2], spans[c1])
            };
            if (s1.1 < s2.1 && s1.3 > s2.1) || (s1.1 > s2.1 && s1.1 < s2.3) {
                continue;
            }
            compared.insert(key);
            let query = bound_rects([s1, s2]);
            let visible = plane.candidates(query).into_iter().all(|k| {
                let c = clusters.of[k];
                c == c1 || c == c2 || !intersect(query, boxes[k])
            });
            let lined_up = round_px(s1.0) == round_px(s2.0)
                || round_px(s1.2) == round_px(s2.2)
                || round_px((s1.0 + s1.2) / 2.0) == round_px((s2.0 + s2.2) / 2.0);
            if visible && lined_up {
                align.union(c1, c2);
            }
        }
    }

    let mut cols = cid;
    for (root, _) in clusters.groups() {
        let target = align.find(root);
        if target != root {
            if let Some((kept, absorbed)) = cols.union(target, root) {
                absorb_into(&mut features, kept, absorbed, MergeVia::Align);
            }
        }
    }

    // Two clusters that meet on two different rows are columns of one table.
    cols.until_fixed_point(|ds| {
        let snapshot = Partition::from_set(ds);
        let mut changed = false;
        for o1 in 0..n {
            if blocked[o1] || blocked_cluster[ds.find(o1)] {
                continue;
            }
            let r1 = rows.of[o1];
            for &o2 in snapshot.group_of(o1) {
                if o2 == o1 || rows.of[o2] == r1 {
                    continue;
                }
                for &o3 in rows.group_of(o2) {
                    if blocked[o3] {
                        continue;
                    }
                    let (c1, c3) = (ds.find(o1), ds.find(o3));
                    if c1 == c3 {
                        continue;
                    }
                    let meets_row = snapshot
                        .group_of(o3)
                        .iter()
                        .any(|&o4| o4 != o3 && rows.of[o4] == r1);
                    if meets_row {
                        if let Some((kept, absorbed)) = ds.union(c1, c3) {
                            absorb_into(&mut features, kept, absorbed, MergeVia::Columns);
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    });

    let mut tagger = AlignmentTagger::new(stats.grid_size());
    let mut keys: Vec<Option<[AlignKey; 4]>> = vec![None; page.mentions.len()];
    for &t in texts {
        keys[t] = Some(tagger.keys(&page.mentions[t]));
    }
    let groups = Partition::from_set(&mut cols);
    let nodes: Vec<Node> = groups
        .groups()
        .map(|(root, members)| {
            let refs = members.iter().map(|&m| ElemRef::text(texts[m])).collect();
            let mut node = Node::new(page, refs, |r| keys[r.index].as_ref());
            node.features = std::mem::take(&mut features[root]);
            node
        })
        .collect();
    let mut nodes = merge_nodes(nodes);

    let local: FxHashMap<usize, usize> = texts.iter().enumerate().map(|(l, &t)| (t, l)).collect();
    for node in &mut nodes {
        let members: Vec<usize> = node
            .members
            .iter()
            .filter_map(|m| local.get(&m.index).copied())
            .collect();
        fill_spacing(&mut node.features, &members, &boxes, &rows);
        let bbox = node.bbox();
        node.features.num_segments = count_touching(&graphics.segments, bbox);
        node.features.num_curves = count_touching(&graphics.curves, bbox);
        node.features.num_figures = count_touching(&graphics.figures, bbox);
    }
    debug!(page = page.page_num, clusters = nodes.len(), "alignment clustering done");
    nodes
}

/// True when no member line comes within `margin` of the node's width,
/// ignoring lines that mention a table.
fn leaves_column_room(page: &PageElems, node: &Node, margin: f64) -> bool {
    node.members
        .iter()
        .filter_map(|&m| page.text_of(m))
        .all(|line| line.get_text().to_lowercase().contains("table") || node.width() - line.width() >= margin)
}

/// Heuristic table candidates of a page: aligned clusters that pass the
/// table test and have no line spanning their whole width.
pub fn table_candidates(
    page: &PageElems,
    stats: &PageStats,
    params: &LayoutParams,
    thresholds: &TableThresholds,
) -> Vec<Node> {
    let texts: Vec<usize> = (0..page.mentions.len()).collect();
    let margin = params.table_line_margin * stats.char_width;
    cluster_aligned(page, &texts, &GraphicBoxes::of_page(page), stats, params)
        .into_iter()
        .filter(|node| node.is_table(thresholds) && leaves_column_room(page, node, margin))
        .map(|node| node.with_kind(NodeType::Table))
        .collect()
}

/// Alignment features of a region, summed over every cluster of the text
/// lines touching it; all zeros when no text touches it.
pub fn region_alignment_features(page: &PageElems, region: Rect, params: &LayoutParams) -> Vec<f64> {
    let texts: Vec<usize> = page
        .mentions
        .iter()
        .enumerate()
        .filter(|(_, m)| intersect(region, m.bbox()))
        .map(|(i, _)| i)
        .collect();
    let mut total = vec![0.0; ALIGNMENT_FEATURES];
    if texts.is_empty() {
        return total;
    }
    let graphics = GraphicBoxes::within(page, region);
    let stats = PageStats {
        avg_font_pts: most_common_font_pts(page.mentions.iter(), &page.font_sizes),
        char_width: char_width(texts.iter().map(|&i| &page.mentions[i])),
        content_width: content_width(
            texts
                .iter()
                .map(|&i| page.mentions[i].bbox())
                .chain(graphics.iter()),
        ),
    };
    for node in cluster_aligned(page, &texts, &graphics, &stats, params) {
        for (t, v) in total.iter_mut().zip(node.features.to_vec()) {
            *t += v;
        }
    }
    total
}
