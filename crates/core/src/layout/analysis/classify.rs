//! Rule-based typing of body-text nodes.

use crate::layout::elements::{PageElems, TextLine};
use crate::layout::node::{Node, NodeType};
use crate::layout::params::LayoutParams;
use crate::utils::{HasBBox, Rect, round_px};

/// Page facts the classification rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext {
    /// Dominant font height of the page.
    pub font: f64,
    /// Topmost edge of any text or figure on the page.
    pub min_y: f64,
    /// Box of a standalone "References" heading on this page.
    pub references_bbox: Option<Rect>,
    /// A previous page already reached the references section.
    pub ref_seen_in: bool,
}

fn same_line(a: f64, b: f64) -> bool {
    round_px(a) == round_px(b) || a.floor() == b.floor()
}

/// The member line sitting at the node's top-left corner.
fn first_line<'p>(page: &'p PageElems, node: &Node) -> Option<&'p TextLine> {
    node.members
        .iter()
        .filter_map(|&m| page.text_of(m))
        .find(|l| round_px(l.x0()) == round_px(node.x0()) && round_px(l.y0()) == round_px(node.y0()))
}

/// Types every node, then folds horizontally overlapping list nodes
/// together.
///
/// Nodes are visited left to right, then top to bottom. Returns the typed
/// nodes and whether a "References" heading was typed on this page (or
/// one was seen before).
pub fn classify_nodes(
    page: &PageElems,
    mut nodes: Vec<Node>,
    ctx: &ClassifyContext,
    params: &LayoutParams,
) -> (Vec<Node>, bool) {
    nodes.sort_by(|a, b| {
        round_px(a.x0())
            .cmp(&round_px(b.x0()))
            .then_with(|| a.y0().total_cmp(&b.y0()))
    });
    let font = ctx.font;
    let len = nodes.len();
    let mut ref_seen_in_node = ctx.ref_seen_in;
    let mut kinds = Vec::with_capacity(len);

    for (idx, node) in nodes.iter().enumerate() {
        let kind = 'kind: {
            // Headers: a short node on the top line, followed by a gap.
            if idx + 1 < len && same_line(node.y0(), ctx.min_y) && node.height() < params.header_height * font {
                let mut next = idx + 1;
                while next + 1 < len && same_line(node.y0(), nodes[next].y0()) {
                    next += 1;
                }
                if next + 1 < len && nodes[next].y0() - node.y0() > params.header_gap * font {
                    break 'kind NodeType::Header;
                }
            }
            if let Some(first) = first_line(page, node) {
                let prefix: String = first.get_text().chars().take(params.caption_prefix_len).collect();
                if prefix.contains("Table") {
                    break 'kind NodeType::TableCaption;
                }
                if prefix.contains("Fig") {
                    break 'kind NodeType::FigureCaption;
                }
                if first.get_text().to_lowercase() == "references" {
                    ref_seen_in_node = true;
                    break 'kind NodeType::SectionHeader;
                }
            }
            if ref_seen_in_node {
                break 'kind NodeType::List;
            }
            if let Some(rb) = ctx.references_bbox {
                if node.y0() > rb.3 && node.x0() <= rb.0 && node.x1() > rb.2 {
                    break 'kind NodeType::List;
                }
            }
            if node.height() <= params.single_line_height * font {
                NodeType::SectionHeader
            } else {
                NodeType::Paragraph
            }
        };
        kinds.push(kind);
    }
    for (node, kind) in nodes.iter_mut().zip(kinds) {
        node.kind = kind;
    }
    (merge_lists(nodes), ref_seen_in_node)
}

/// Folds every list node into the first list node it horizontally overlaps.
fn merge_lists(nodes: Vec<Node>) -> Vec<Node> {
    let len = nodes.len();
    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let Some(mut node) = slots[i].take() else {
            continue;
        };
        if node.kind == NodeType::List {
            let (x0, x1) = (node.x0(), node.x1());
            for slot in slots.iter_mut() {
                let overlapping = slot.as_ref().is_some_and(|o| {
                    o.kind == NodeType::List
                        && ((o.x0() <= x0 && o.x1() >= x0) || (x0 <= o.x0() && x1 >= o.x0()))
                });
                if overlapping {
                    if let Some(other) = slot.take() {
                        node.merge(other);
                    }
                }
            }
        }
        out.push(node);
    }
    out
}
