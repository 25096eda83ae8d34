//! Scanned-document detection.
//!
//! A digitally authored page carries its text as text; a scanned page is
//! one big raster image, sometimes sliced into horizontal strips. Such
//! pages are detected from their figure boxes and rejected before layout
//! analysis.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layout::analysis::DisjointSet;
use crate::layout::elements::PageElems;
use crate::utils::{HasBBox, Rect, bound_rects, round_px};

/// Parameters of the scan detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// A stack of figures covers the page when it reaches the right and
    /// bottom page edges within this many units.
    pub margin: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self { margin: 5.0 }
    }
}

/// What to do with a document detected as scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPolicy {
    /// Refuse to build a tree.
    #[default]
    Abort,
    /// Log a warning and build the tree anyway.
    Warn,
}

/// Outcome of scan detection over a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanVerdict {
    /// 1-based numbers of the pages that look scanned.
    pub scanned_pages: Vec<usize>,
    /// At least one page carries a ruling segment.
    pub has_rulings: bool,
}

impl ScanVerdict {
    /// A document is scanned when any page is, or when no page has a single
    /// ruling line.
    pub fn is_scanned(&self) -> bool {
        !self.scanned_pages.is_empty() || !self.has_rulings
    }
}

/// Some figure starts at the page origin and ends at the page size,
/// compared in whole units.
pub fn has_full_page_figure(page: &PageElems) -> bool {
    page.figures.iter().any(|f| {
        f.x0() <= 0.0
            && f.y0() <= 0.0
            && round_px(f.x1()) == round_px(page.width)
            && round_px(f.y1()) == round_px(page.height)
    })
}

/// Figures sharing both horizontal edges, where one ends on the line the
/// other starts, are strips of the same image.
fn is_stacked(a: Rect, b: Rect) -> bool {
    a.0 == b.0 && a.2 == b.2 && (round_px(a.3) == round_px(b.1) || round_px(b.3) == round_px(a.1))
}

/// The figures of the page stack up into exactly one image, and that image
/// covers the whole page.
pub fn figure_stack_covers_page(page: &PageElems, params: &ScanParams) -> bool {
    let boxes: Vec<Rect> = page.figures.iter().map(HasBBox::bbox).collect();
    let n = boxes.len();
    if n == 0 {
        return false;
    }
    let mut ds = DisjointSet::new(n);
    ds.until_fixed_point(|ds| {
        let mut changed = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if !ds.same(i, j) && is_stacked(boxes[i], boxes[j]) {
                    changed |= ds.union(i, j).is_some();
                }
            }
        }
        changed
    });
    let groups = ds.groups();
    let [only] = groups.as_slice() else {
        return false;
    };
    let bound = bound_rects(only.iter().map(|&i| boxes[i]));
    bound.0 <= 0.0
        && bound.1 <= 0.0
        && bound.2 >= page.width - params.margin
        && bound.3 >= page.height - params.margin
}

pub fn is_scanned_page(page: &PageElems, params: &ScanParams) -> bool {
    has_full_page_figure(page) || figure_stack_covers_page(page, params)
}

/// Runs the detector over every page and logs a positive verdict.
pub fn scan_document(pages: &[PageElems], params: &ScanParams) -> ScanVerdict {
    let verdict = ScanVerdict {
        scanned_pages: pages
            .iter()
            .filter(|p| is_scanned_page(p, params))
            .map(|p| p.page_num)
            .collect(),
        has_rulings: pages.iter().any(|p| !p.segments.is_empty()),
    };
    if verdict.is_scanned() {
        warn!(
            pages = ?verdict.scanned_pages,
            has_rulings = verdict.has_rulings,
            "document looks scanned"
        );
    }
    verdict
}

/// Shorthand for `scan_document(pages, params).is_scanned()`.
pub fn is_scanned(pages: &[PageElems], params: &ScanParams) -> bool {
    scan_document(pages, params).is_scanned()
}
