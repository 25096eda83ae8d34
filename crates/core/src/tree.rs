//! Per-page layout trees.
//!
//! A [`PageTree`] maps every output region type to the boxes of that type
//! on one page. The [`TreeExtractor`] finds table regions on all pages
//! (optionally in parallel), then walks the pages in order, threading the
//! "references seen" flag from each page to the next.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{LayoutError, Result};
use crate::layout::analysis::{extract_text_candidates, merge_nodes, table_candidates};
use crate::layout::elements::PageElems;
use crate::layout::node::{Node, NodeType, TableThresholds};
use crate::layout::params::LayoutParams;
use crate::layout::stats::PageStats;
use crate::layout::table::{GridSettings, TableContent, TableExtractor, resolve_table, ruling_rectangles, snap_to_rulings};
use crate::predict::{TableDetection, accept_candidates, predict_regions};
use crate::scan::{ScanParams, ScanPolicy, ScanVerdict, scan_document};
use crate::utils::{HasBBox, Rect, intersect};

/// `(page_num, page_width, page_height, top, left, bottom, right)`.
pub type TreeBox = (usize, f64, f64, f64, f64, f64, f64);

/// The typed regions of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageTree(BTreeMap<NodeType, Vec<TreeBox>>);

impl Default for PageTree {
    fn default() -> Self {
        Self(NodeType::OUTPUT.iter().map(|&k| (k, Vec::new())).collect())
    }
}

impl PageTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeType, page: &PageElems, bbox: Rect) {
        self.0
            .entry(kind)
            .or_default()
            .push((page.page_num, page.width, page.height, bbox.1, bbox.0, bbox.3, bbox.2));
    }

    pub fn get(&self, kind: NodeType) -> &[TreeBox] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every region as `(type, (x0, y0, x1, y1))`.
    pub fn regions(&self) -> impl Iterator<Item = (NodeType, Rect)> + '_ {
        self.0
            .iter()
            .flat_map(|(&k, boxes)| boxes.iter().map(move |b| (k, (b.4, b.3, b.6, b.5))))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trees of a whole document, keyed by 1-based page number.
pub type DocumentTree = BTreeMap<usize, PageTree>;

/// Options of tree building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Drop every table and text region overlapping a figure.
    pub favor_figures: bool,
    /// Detect table regions on all pages in parallel.
    pub parallel: bool,
    pub scan_policy: ScanPolicy,
    pub scan: ScanParams,
    pub params: LayoutParams,
    pub thresholds: TableThresholds,
    pub grid: GridSettings,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            favor_figures: true,
            parallel: true,
            scan_policy: ScanPolicy::default(),
            scan: ScanParams::default(),
            params: LayoutParams::default(),
            thresholds: TableThresholds::default(),
            grid: GridSettings::default(),
        }
    }
}

fn validate_page(page: &PageElems) -> Result<()> {
    if page.width.is_finite() && page.height.is_finite() && page.width > 0.0 && page.height > 0.0 {
        return Ok(());
    }
    Err(LayoutError::InvalidGeometry {
        page: page.page_num,
        msg: format!("page size {}x{}", page.width, page.height),
    })
}

/// Boxes of the page's figures, overlapping figures merged.
pub fn figure_regions(page: &PageElems) -> Vec<Rect> {
    let nodes = (0..page.figures.len()).map(|i| Node::from_figure(page, i)).collect();
    merge_nodes(nodes).iter().map(HasBBox::bbox).collect()
}

/// Builds the tree of one page from its table regions.
///
/// Returns the tree and whether the references section has been reached
/// by the end of this page.
pub fn build_page_tree(
    page: &PageElems,
    stats: &PageStats,
    ref_seen_in: bool,
    tables: &[Rect],
    options: &TreeOptions,
) -> (PageTree, bool) {
    let figures = figure_regions(page);
    let touches_figure = |r: Rect| figures.iter().any(|&f| intersect(f, r));

    let tables: Vec<Rect> = if options.favor_figures {
        tables.iter().copied().filter(|&t| !touches_figure(t)).collect()
    } else {
        tables.to_vec()
    };

    let pool: Vec<usize> = page
        .mentions
        .iter()
        .enumerate()
        .filter(|(_, m)| !tables.iter().any(|&t| intersect(t, m.bbox())))
        .map(|(i, _)| i)
        .collect();
    let (mut nodes, ref_seen) =
        extract_text_candidates(page, &pool, &figures, stats, ref_seen_in, &options.params);
    if options.favor_figures {
        nodes.retain(|n| !touches_figure(n.bbox()));
    }

    let mut tree = PageTree::new();
    for &t in &tables {
        tree.push(NodeType::Table, page, t);
    }
    for &f in &figures {
        tree.push(NodeType::Figure, page, f);
    }
    for node in nodes.iter().filter(|n| n.kind != NodeType::Unknown) {
        tree.push(node.kind, page, node.bbox());
    }
    debug!(page = page.page_num, regions = tree.len(), ref_seen, "built page tree");
    (tree, ref_seen)
}

/// Builds layout trees for a normalized document.
pub struct TreeExtractor {
    pages: Vec<PageElems>,
    stats: Vec<PageStats>,
    options: TreeOptions,
    detection: TableDetection,
    table_extractor: Option<Box<dyn TableExtractor>>,
}

impl TreeExtractor {
    pub fn new(pages: Vec<PageElems>, options: TreeOptions) -> Self {
        let stats = pages.iter().map(PageStats::of_page).collect();
        Self {
            pages,
            stats,
            options,
            detection: TableDetection::default(),
            table_extractor: None,
        }
    }

    pub fn with_detection(mut self, detection: TableDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Sets the fallback used for table regions without rulings.
    pub fn with_table_extractor(mut self, extractor: Box<dyn TableExtractor>) -> Self {
        self.table_extractor = Some(extractor);
        self
    }

    pub fn pages(&self) -> &[PageElems] {
        &self.pages
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// The page with the given 1-based number.
    pub fn page(&self, page_num: usize) -> Result<&PageElems> {
        page_num
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(LayoutError::PageOutOfRange(page_num))
    }

    pub fn scan(&self) -> ScanVerdict {
        scan_document(&self.pages, &self.options.scan)
    }

    pub fn is_scanned(&self) -> bool {
        self.scan().is_scanned()
    }

    fn detect_tables(&self, index: usize) -> Result<Vec<Rect>> {
        let page = &self.pages[index];
        let stats = &self.stats[index];
        let opts = &self.options;
        let heuristic = || -> Vec<Rect> {
            table_candidates(page, stats, &opts.params, &opts.thresholds)
                .iter()
                .map(HasBBox::bbox)
                .collect()
        };
        Ok(match &self.detection {
            TableDetection::Heuristic => snap_to_rulings(&heuristic(), &page.segments),
            TableDetection::Rulings => ruling_rectangles(&page.segments),
            TableDetection::Model(p) => {
                let accepted = accept_candidates(p.as_ref(), page, &heuristic(), &opts.params)?;
                snap_to_rulings(&accepted, &page.segments)
            }
            TableDetection::Vision(p) => predict_regions(p.as_ref(), page)?,
        })
    }

    /// Table regions of the page at `index`. A page that cannot be
    /// analyzed yields no tables; predictor failures are returned.
    pub fn table_regions(&self, index: usize) -> Result<Vec<Rect>> {
        let page = &self.pages[index];
        if let Err(e) = validate_page(page) {
            error!(page = page.page_num, error = %e, "skipping table detection");
            return Ok(Vec::new());
        }
        self.detect_tables(index)
    }

    fn all_table_regions(&self) -> Result<Vec<Vec<Rect>>> {
        if self.options.parallel {
            (0..self.pages.len())
                .into_par_iter()
                .map(|i| self.table_regions(i))
                .collect()
        } else {
            (0..self.pages.len()).map(|i| self.table_regions(i)).collect()
        }
    }

    /// Builds the tree of every page.
    ///
    /// A scanned document is refused under [`ScanPolicy::Abort`] and only
    /// logged under [`ScanPolicy::Warn`].
    pub fn build(&self) -> Result<DocumentTree> {
        if self.is_scanned() {
            match self.options.scan_policy {
                ScanPolicy::Abort => return Err(LayoutError::ScannedDocument),
                ScanPolicy::Warn => warn!("building a tree for a scanned document"),
            }
        }
        info!(pages = self.pages.len(), strategy = ?self.detection, "detecting tables");
        let tables = self.all_table_regions()?;

        let mut ref_seen = false;
        let mut trees = DocumentTree::new();
        for ((page, stats), page_tables) in self.pages.iter().zip(&self.stats).zip(&tables) {
            let tree = match validate_page(page) {
                Ok(()) => {
                    let (tree, seen) = build_page_tree(page, stats, ref_seen, page_tables, &self.options);
                    ref_seen = seen;
                    tree
                }
                Err(e) => {
                    error!(page = page.page_num, error = %e, "page layout failed");
                    PageTree::new()
                }
            };
            trees.insert(page.page_num, tree);
        }
        Ok(trees)
    }

    /// Structure of the table at `region` on page `page_num`.
    pub fn resolve_table(&self, page_num: usize, region: Rect) -> Result<TableContent> {
        let page = self.page(page_num)?;
        Ok(resolve_table(
            page,
            region,
            &self.options.grid,
            self.table_extractor.as_deref(),
        ))
    }
}
