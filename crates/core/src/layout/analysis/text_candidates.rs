//! Body-text clustering.
//!
//! Lines are grouped into rows, words close in a row are joined, then
//! lines of similar height that stack with aligned edges form blocks.
//! Blocks are split into paragraphs at indented lines, except in the
//! references section where entries hang.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::layout::elements::{ElemRef, PageElems};
use crate::layout::node::Node;
use crate::layout::params::LayoutParams;
use crate::layout::stats::PageStats;
use crate::utils::{HasBBox, Rect, bound_rects, round_px};

use super::classify::{ClassifyContext, classify_nodes};
use super::merge::merge_nodes;
use super::passes::{
    Partition, close_merge_pass, edges_aligned, is_vertically_adjacent, order_vertically,
    row_partition,
};
use super::union_find::DisjointSet;

/// Text blocks of a page before classification.
#[derive(Debug, Default)]
pub struct TextClusters {
    pub nodes: Vec<Node>,
    /// Box of a standalone "References" line, if any.
    pub references_bbox: Option<Rect>,
    /// Blocks below and left-aligned with the references heading.
    pub reference_blocks: usize,
}

impl TextClusters {
    pub fn found_references(&self) -> bool {
        self.references_bbox.is_some() || self.reference_blocks > 0
    }
}

fn is_references_heading(text: &str) -> bool {
    text.to_lowercase() == "references"
}

/// Splits a block at every row that starts more than one character width
/// right of the block's left edge; the indented row opens a new block.
fn split_paragraphs(members: &[usize], boxes: &[Rect], rows: &Partition, cw: f64) -> Vec<Vec<usize>> {
    let block_min_x = members.iter().map(|&m| boxes[m].0).fold(f64::INFINITY, f64::min);
    let mut by_row: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &m in members {
        by_row.entry(rows.of[m]).or_default().push(m);
    }
    let min_of = |line: &[usize], f: fn(&Rect) -> f64| {
        line.iter().map(|&m| f(&boxes[m])).fold(f64::INFINITY, f64::min)
    };
    let mut lines: Vec<Vec<usize>> = by_row.into_values().collect();
    lines.sort_by(|a, b| min_of(a.as_slice(), |r| r.1).total_cmp(&min_of(b.as_slice(), |r| r.1)));

    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        current.extend_from_slice(line);
        if let Some(next) = lines.get(i + 1) {
            if min_of(next.as_slice(), |r| r.0) - cw > block_min_x {
                out.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Clusters the text lines `texts` (indices into `page.mentions`) into
/// blocks. `ref_seen_in` disables paragraph splitting for pages after the
/// references heading.
pub fn cluster_text(
    page: &PageElems,
    texts: &[usize],
    stats: &PageStats,
    ref_seen_in: bool,
    params: &LayoutParams,
) -> TextClusters {
    let n = texts.len();
    if n == 0 || n > params.max_elements {
        debug!(page = page.page_num, elements = n, "skipping text clustering");
        return TextClusters::default();
    }
    let boxes: Vec<Rect> = texts.iter().map(|&i| page.mentions[i].bbox()).collect();
    let font = stats.avg_font_pts;
    let cw = stats.char_width;
    let rows = row_partition(&boxes, font, params);

    let mut cid = DisjointSet::new(n);
    close_merge_pass(&mut cid, &boxes, &rows, params.close_merge * cw, |_, _| {});

    let edge_tol = params.text_edge_tolerance * cw;
    let max_height_diff = params.height_mismatch * font;
    cid.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if ds.same(i, j) {
                    continue;
                }
                let Some((upper, lower)) = order_vertically(boxes[i], boxes[j]) else {
                    continue;
                };
                if ((lower.3 - lower.1) - (upper.3 - upper.1)).abs() > max_height_diff {
                    continue;
                }
                if is_vertically_adjacent(upper, lower, font, params) && edges_aligned(upper, lower, edge_tol) {
                    changed |= ds.union(i, j).is_some();
                }
            }
        }
        changed
    });
    let clusters = Partition::from_set(&mut cid);
    let spans: Vec<(usize, Rect)> = clusters
        .groups()
        .map(|(root, members)| (root, bound_rects(members.iter().map(|&m| boxes[m]))))
        .collect();

    let mut references_bbox = None;
    let mut reference_roots: FxHashSet<usize> = FxHashSet::default();
    for (root, members) in clusters.groups() {
        if members.len() != 1 || !is_references_heading(page.mentions[texts[members[0]]].get_text()) {
            continue;
        }
        let Some(&(_, heading)) = spans.iter().find(|(r, _)| *r == root) else {
            continue;
        };
        references_bbox = Some(heading);
        for &(other, span) in &spans {
            if round_px(heading.0) == round_px(span.0) && heading.3 < span.1 {
                reference_roots.insert(other);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (root, members) in clusters.groups() {
        if ref_seen_in || reference_roots.contains(&root) {
            groups.push(members.to_vec());
        } else {
            groups.extend(split_paragraphs(members, &boxes, &rows, cw));
        }
    }

    let nodes = groups
        .into_iter()
        .map(|g| {
            let refs = g.into_iter().map(|m| ElemRef::text(texts[m])).collect();
            Node::new(page, refs, |_| None)
        })
        .collect();
    TextClusters {
        nodes: merge_nodes(nodes),
        references_bbox,
        reference_blocks: reference_roots.len(),
    }
}

/// Clusters and classifies the body text of a page.
///
/// `figures` only feed the top-of-page estimate of the header rule.
/// Returns the typed text nodes and whether the references section has
/// been reached by the end of this page.
pub fn extract_text_candidates(
    page: &PageElems,
    texts: &[usize],
    figures: &[Rect],
    stats: &PageStats,
    ref_seen_in: bool,
    params: &LayoutParams,
) -> (Vec<Node>, bool) {
    let clusters = cluster_text(page, texts, stats, ref_seen_in, params);
    if clusters.nodes.is_empty() {
        return (Vec::new(), ref_seen_in);
    }
    let min_y = texts
        .iter()
        .map(|&i| page.mentions[i].y0())
        .chain(figures.iter().map(|f| f.1))
        .fold(f64::INFINITY, f64::min);
    let ctx = ClassifyContext {
        font: stats.avg_font_pts,
        min_y,
        references_bbox: clusters.references_bbox,
        ref_seen_in,
    };
    let found = clusters.found_references();
    let (nodes, ref_seen_in_node) = classify_nodes(page, clusters.nodes, &ctx, params);
    (nodes, found || ref_seen_in || ref_seen_in_node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::elements::TextLine;

    fn line(x0: f64, y0: f64, x1: f64, text: &str) -> TextLine {
        TextLine::new((x0, y0, x1, y0 + 10.0), text).with_font("Times", 10.0)
    }

    fn page(lines: Vec<TextLine>) -> PageElems {
        PageElems::new(1, 600.0, 800.0, lines, vec![], vec![], vec![])
    }

    fn all(page: &PageElems) -> Vec<usize> {
        (0..page.mentions.len()).collect()
    }

    #[test]
    fn test_stacked_lines_form_one_block() {
        let p = page(vec![
            line(50.0, 100.0, 300.0, "the first line of a paragraph set in a column"),
            line(50.0, 112.0, 300.0, "the second line of a paragraph set in a column"),
            line(50.0, 124.0, 200.0, "the third and last line"),
        ]);
        let stats = PageStats::of_page(&p);
        let c = cluster_text(&p, &all(&p), &stats, false, &LayoutParams::default());
        assert_eq!(c.nodes.len(), 1);
        assert_eq!(c.nodes[0].members.len(), 3);
        assert!(!c.found_references());
    }

    #[test]
    fn test_indented_line_opens_paragraph() {
        let p = page(vec![
            line(50.0, 100.0, 300.0, "the first line of a paragraph set in a column"),
            line(50.0, 112.0, 200.0, "the end of the first one"),
            line(60.0, 124.0, 300.0, "an indented line opening the next paragraph"),
            line(50.0, 136.0, 300.0, "the second line of the second paragraph here"),
        ]);
        let stats = PageStats::of_page(&p);
        let c = cluster_text(&p, &all(&p), &stats, false, &LayoutParams::default());
        assert_eq!(c.nodes.len(), 2);
        let c = cluster_text(&p, &all(&p), &stats, true, &LayoutParams::default());
        assert_eq!(c.nodes.len(), 1);
    }

    #[test]
    fn test_split_paragraphs_keeps_all_members() {
        let boxes = [
            (50.0, 100.0, 300.0, 110.0),
            (60.0, 112.0, 300.0, 122.0),
            (60.0, 124.0, 300.0, 134.0),
        ];
        let rows = row_partition(&boxes, 10.0, &LayoutParams::default());
        let parts = split_paragraphs(&[0, 1, 2], &boxes, &rows, 5.0);
        assert_eq!(parts, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_element_cap_keeps_reference_flag() {
        let p = page(vec![line(50.0, 100.0, 300.0, "text")]);
        let stats = PageStats::of_page(&p);
        let params = LayoutParams { max_elements: 0, ..LayoutParams::default() };
        let (nodes, seen) = extract_text_candidates(&p, &all(&p), &[], &stats, true, &params);
        assert!(nodes.is_empty());
        assert!(seen);
    }
}
