//! Pluggable table classifiers.
//!
//! Two kinds of external models can replace the heuristic table test: a
//! [`TablePredictor`] scoring the feature vectors of candidate regions,
//! and a [`RegionPredictor`] producing a per-pixel table heatmap of a page
//! image. Both are blocking calls; a failure is fatal to the run.

use std::collections::VecDeque;
use std::fmt;

use tracing::info;

use crate::error::{LayoutError, Result};
use crate::layout::elements::PageElems;
use crate::layout::params::LayoutParams;
use crate::layout::table::feature_matrix;
use crate::utils::{Rect, intersect};

/// Scores above this are positive, for both probabilities and mask pixels.
pub const SCORE_THRESHOLD: f64 = 0.5;

/// A heatmap region must overlap the mask at least this much to be kept.
pub const REGION_IOU_THRESHOLD: f64 = 0.2;

/// Classifier over candidate feature vectors.
pub trait TablePredictor: Send + Sync {
    /// One probability per row of `features`.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Segmentation model over rendered page images.
pub trait RegionPredictor: Send + Sync {
    /// Table heatmap of the page at `page_index` (0-based).
    fn predict_heatmap(&self, page_index: usize) -> Result<Heatmap>;
}

/// A row-major grid of per-pixel table scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub width: usize,
    pub height: usize,
    mask: Vec<f32>,
}

impl Heatmap {
    pub fn new(width: usize, height: usize, mask: Vec<f32>) -> Result<Self> {
        if mask.len() != width * height {
            return Err(LayoutError::PredictionShape {
                expected: width * height,
                got: mask.len(),
            });
        }
        Ok(Self { width, height, mask })
    }

    fn positive(&self, x: usize, y: usize) -> bool {
        f64::from(self.mask[y * self.width + x]) > SCORE_THRESHOLD
    }
}

/// How table regions are found on a page.
#[derive(Default)]
pub enum TableDetection {
    /// Alignment clusters passing the table test.
    #[default]
    Heuristic,
    /// Rectangles closed by ruling lines.
    Rulings,
    /// Alignment clusters accepted by a classifier.
    Model(Box<dyn TablePredictor>),
    /// Regions of a page heatmap.
    Vision(Box<dyn RegionPredictor>),
}

impl fmt::Debug for TableDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableDetection::Heuristic => "Heuristic",
            TableDetection::Rulings => "Rulings",
            TableDetection::Model(_) => "Model",
            TableDetection::Vision(_) => "Vision",
        })
    }
}

/// Keeps the candidates the predictor scores above [`SCORE_THRESHOLD`].
pub fn accept_candidates(
    predictor: &dyn TablePredictor,
    page: &PageElems,
    candidates: &[Rect],
    params: &LayoutParams,
) -> Result<Vec<Rect>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let features = feature_matrix(page, candidates, params);
    info!(page = page.page_num, candidates = candidates.len(), "scoring table candidates");
    let scores = predictor.predict(&features)?;
    if scores.len() != candidates.len() {
        return Err(LayoutError::PredictionShape {
            expected: candidates.len(),
            got: scores.len(),
        });
    }
    Ok(candidates
        .iter()
        .zip(scores)
        .filter(|(_, s)| *s > SCORE_THRESHOLD)
        .map(|(c, _)| *c)
        .collect())
}

/// Pixel box `(x0, y0, x1, y1)`, end exclusive.
type PixelBox = (usize, usize, usize, usize);

/// Bounding boxes of the 4-connected components of positive pixels.
fn components(heatmap: &Heatmap) -> Vec<PixelBox> {
    let (w, h) = (heatmap.width, heatmap.height);
    let mut seen = vec![false; w * h];
    let mut out = Vec::new();
    let mut queue = VecDeque::new();
    for start in 0..w * h {
        if seen[start] || !heatmap.positive(start % w, start / w) {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
        while let Some(p) = queue.pop_front() {
            let (x, y) = (p % w, p / w);
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x + 1);
            y1 = y1.max(y + 1);
            let neighbours = [
                (x > 0).then(|| p - 1),
                (x + 1 < w).then(|| p + 1),
                (y > 0).then(|| p - w),
                (y + 1 < h).then(|| p + w),
            ];
            for q in neighbours.into_iter().flatten() {
                if !seen[q] && heatmap.positive(q % w, q / w) {
                    seen[q] = true;
                    queue.push_back(q);
                }
            }
        }
        out.push((x0, y0, x1, y1));
    }
    out
}

fn mask_iou(heatmap: &Heatmap, b: PixelBox, mask_total: usize) -> f64 {
    let mut inter = 0usize;
    for y in b.1..b.3 {
        for x in b.0..b.2 {
            if heatmap.positive(x, y) {
                inter += 1;
            }
        }
    }
    let union = (b.2 - b.0) * (b.3 - b.1) + mask_total - inter;
    if union == 0 { 0.0 } else { inter as f64 / union as f64 }
}

/// Table regions of a heatmap, in page units.
///
/// Components are ranked by IoU with the whole positive mask. The best must
/// pass [`REGION_IOU_THRESHOLD`]; the rest are kept when they pass it too
/// and do not intersect a region already kept.
pub fn heatmap_regions(heatmap: &Heatmap, page_width: f64, page_height: f64) -> Vec<Rect> {
    if heatmap.width == 0 || heatmap.height == 0 {
        return Vec::new();
    }
    let mask_total = (0..heatmap.height)
        .flat_map(|y| (0..heatmap.width).map(move |x| (x, y)))
        .filter(|&(x, y)| heatmap.positive(x, y))
        .count();
    let mut ranked: Vec<(f64, PixelBox)> = components(heatmap)
        .into_iter()
        .map(|b| (mask_iou(heatmap, b, mask_total), b))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let sx = page_width / heatmap.width as f64;
    let sy = page_height / heatmap.height as f64;
    let mut kept: Vec<Rect> = Vec::new();
    for (score, b) in ranked {
        if score <= REGION_IOU_THRESHOLD {
            break;
        }
        let r = (b.0 as f64 * sx, b.1 as f64 * sy, b.2 as f64 * sx, b.3 as f64 * sy);
        if kept.iter().all(|k| !intersect(*k, r)) {
            kept.push(r);
        }
    }
    kept
}

/// Table regions of a page from a vision model.
pub fn predict_regions(predictor: &dyn RegionPredictor, page: &PageElems) -> Result<Vec<Rect>> {
    info!(page = page.page_num, "predicting table heatmap");
    let heatmap = predictor.predict_heatmap(page.page_num.saturating_sub(1))?;
    Ok(heatmap_regions(&heatmap, page.width, page.height))
}
