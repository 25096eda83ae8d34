//! Node: a clustered region of page elements and its semantic type.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::utils::{HasBBox, Rect, area, bound_rects};

use super::analysis::{AlignKey, AlignmentFeatures};
use super::elements::{Component, ElemKind, ElemRef, PageElems, impl_has_bbox_delegate};

/// Semantic type of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Unknown,
    SectionHeader,
    Header,
    Paragraph,
    FigureCaption,
    TableCaption,
    List,
    Table,
    Figure,
}

impl NodeType {
    /// Every type that appears in a page tree.
    pub const OUTPUT: [NodeType; 8] = [
        NodeType::SectionHeader,
        NodeType::Header,
        NodeType::Paragraph,
        NodeType::FigureCaption,
        NodeType::TableCaption,
        NodeType::List,
        NodeType::Table,
        NodeType::Figure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Unknown => "unknown",
            NodeType::SectionHeader => "section_header",
            NodeType::Header => "header",
            NodeType::Paragraph => "paragraph",
            NodeType::FigureCaption => "figure_caption",
            NodeType::TableCaption => "table_caption",
            NodeType::List => "list",
            NodeType::Table => "table",
            NodeType::Figure => "figure",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds of the table test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableThresholds {
    /// A table holds at least this many text lines.
    pub min_texts: u32,
    /// Member boxes may cover at most this fraction of the node area.
    pub max_coverage: f64,
    /// A curve larger than this area marks a diagram, not a table.
    pub diagram_curve_area: f64,
    /// Fewer ruling lines than this make a table borderless.
    pub borderless_lines: u32,
}

impl Default for TableThresholds {
    fn default() -> Self {
        Self {
            min_texts: 6,
            max_coverage: 0.7,
            diagram_curve_area: 100.0,
            borderless_lines: 6,
        }
    }
}

/// A rectangular region of the page holding a group of elements.
#[derive(Debug, Clone)]
pub struct Node {
    component: Component,
    pub members: Vec<ElemRef>,
    sum_elem_area: f64,
    type_counts: [u32; ElemKind::COUNT],
    align_counts: FxHashMap<AlignKey, u32>,
    max_curve_area: f64,
    pub features: AlignmentFeatures,
    pub kind: NodeType,
}

impl Node {
    /// Builds a node over `members`. `keys` yields the alignment keys of a
    /// text member, if that member was tagged in the current pass.
    pub fn new<'k>(
        page: &PageElems,
        members: Vec<ElemRef>,
        keys: impl Fn(ElemRef) -> Option<&'k [AlignKey; 4]>,
    ) -> Self {
        let mut type_counts = [0; ElemKind::COUNT];
        let mut align_counts: FxHashMap<AlignKey, u32> = FxHashMap::default();
        let mut sum_elem_area = 0.0;
        let mut max_curve_area: f64 = 0.0;
        for &m in &members {
            type_counts[m.kind.index()] += 1;
            sum_elem_area += area(page.bbox_of(m)).abs();
            if let Some(a) = page.curve_area(m) {
                max_curve_area = max_curve_area.max(a);
            }
            if let Some(ks) = keys(m) {
                for k in ks {
                    *align_counts.entry(*k).or_insert(0) += 1;
                }
            }
        }
        let bbox = bound_rects(members.iter().map(|&m| page.bbox_of(m)));
        Self {
            component: Component::new(bbox),
            members,
            sum_elem_area,
            type_counts,
            align_counts,
            max_curve_area,
            features: AlignmentFeatures::default(),
            kind: NodeType::Unknown,
        }
    }

    /// A node holding exactly one figure.
    pub fn from_figure(page: &PageElems, index: usize) -> Self {
        let mut node = Self::new(page, vec![ElemRef::figure(index)], |_| None);
        node.kind = NodeType::Figure;
        node
    }

    pub fn with_kind(mut self, kind: NodeType) -> Self {
        self.kind = kind;
        self
    }

    /// Grows the box without moving members; used while merges are pending.
    pub(crate) fn expand(&mut self, bbox: Rect) {
        self.component
            .set_bbox(bound_rects([self.component.bbox(), bbox]));
    }

    /// Absorbs another node's members, counts and features.
    pub fn merge(&mut self, other: Node) {
        self.expand(other.bbox());
        self.members.extend(other.members);
        self.sum_elem_area += other.sum_elem_area;
        for (a, b) in self.type_counts.iter_mut().zip(other.type_counts) {
            *a += b;
        }
        for (k, v) in other.align_counts {
            *self.align_counts.entry(k).or_insert(0) += v;
        }
        self.max_curve_area = self.max_curve_area.max(other.max_curve_area);
        self.features.absorb(&other.features, None);
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn type_count(&self, kind: ElemKind) -> u32 {
        self.type_counts[kind.index()]
    }

    /// Count of members sharing the given alignment key.
    pub fn align_count(&self, key: &AlignKey) -> u32 {
        self.align_counts.get(key).copied().unwrap_or(0)
    }

    /// Fewer ruling lines than the threshold.
    pub fn is_borderless(&self, th: &TableThresholds) -> bool {
        self.type_count(ElemKind::Segment) < th.borderless_lines
    }

    /// Decides from member counts and alignment repetition whether the
    /// node looks like a table.
    pub fn is_table(&self, th: &TableThresholds) -> bool {
        if self.type_count(ElemKind::Text) < th.min_texts || self.type_count(ElemKind::Figure) > 0 {
            return false;
        }
        if self.max_curve_area > th.diagram_curve_area {
            return false;
        }
        let node_area = self.area();
        if node_area <= 0.0 || self.sum_elem_area / node_area > th.max_coverage {
            return false;
        }
        let mut x_aligned = false;
        let mut y_aligned = false;
        for (k, &v) in &self.align_counts {
            if v >= 2 && k.font.is_some() {
                if k.axis.is_horizontal() {
                    x_aligned = true;
                } else {
                    y_aligned = true;
                }
            }
        }
        x_aligned && y_aligned
    }
}

impl_has_bbox_delegate!(Node, component);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::analysis::AlignmentTagger;
    use crate::layout::elements::{Curve, TextLine};

    /// A `rows x cols` grid of short cells, 40 wide and 10 tall, on a
    /// 60 x 20 pitch.
    fn grid_page(rows: usize, cols: usize) -> PageElems {
        let mut mentions = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let x0 = 50.0 + c as f64 * 60.0;
                let y0 = 100.0 + r as f64 * 20.0;
                mentions.push(
                    TextLine::new((x0, y0, x0 + 40.0, y0 + 10.0), format!("{r}{c}"))
                        .with_font("Helvetica", 10.0),
                );
            }
        }
        PageElems::new(1, 600.0, 800.0, mentions, vec![], vec![], vec![])
    }

    fn node_over_all(page: &PageElems) -> Node {
        let mut tagger = AlignmentTagger::new(5.0);
        let keys: Vec<[AlignKey; 4]> = page.mentions.iter().map(|m| tagger.keys(m)).collect();
        let members = (0..page.mentions.len()).map(ElemRef::text).collect();
        Node::new(page, members, |r| keys.get(r.index))
    }

    #[test]
    fn test_grid_is_table() {
        let page = grid_page(3, 3);
        let node = node_over_all(&page);
        assert_eq!(node.bbox(), (50.0, 100.0, 210.0, 150.0));
        assert!(node.is_table(&TableThresholds::default()));
        assert!(node.is_borderless(&TableThresholds::default()));
    }

    #[test]
    fn test_too_few_texts() {
        let page = grid_page(1, 5);
        assert!(!node_over_all(&page).is_table(&TableThresholds::default()));
    }

    #[test]
    fn test_large_curve_rejects_table() {
        let mut page = grid_page(3, 3);
        page.curves.push(Curve::new(1.0, vec![(60.0, 105.0), (80.0, 125.0)]));
        let mut node = node_over_all(&page);
        node.merge(Node::new(&page, vec![ElemRef { kind: ElemKind::Curve, index: 0 }], |_| None));
        assert!(!node.is_table(&TableThresholds::default()));
    }

    #[test]
    fn test_merge_accumulates() {
        let page = grid_page(2, 1);
        let mut a = Node::new(&page, vec![ElemRef::text(0)], |_| None);
        let b = Node::new(&page, vec![ElemRef::text(1)], |_| None);
        a.merge(b);
        assert_eq!(a.type_count(ElemKind::Text), 2);
        assert_eq!(a.bbox(), (50.0, 100.0, 90.0, 130.0));
    }

    #[test]
    fn test_node_type_names() {
        assert_eq!(NodeType::SectionHeader.to_string(), "section_header");
        assert_eq!(
            serde_json::to_string(&NodeType::FigureCaption).unwrap(),
            "\"figure_caption\""
        );
    }
}
