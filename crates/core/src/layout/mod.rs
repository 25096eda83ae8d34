//! Layout analysis for the page tree.
//!
//! This module contains:
//! - Page element types and their normalization from PDF space
//! - Per-page font statistics
//! - Layout analysis parameters
//! - Alignment clustering, node merging and classification
//! - Table structure and table candidate features

pub mod analysis;
pub mod elements;
pub mod node;
pub mod normalize;
pub mod params;
pub mod stats;
pub mod table;

pub use analysis::{
    ALIGNMENT_FEATURES, AlignmentFeatures, ClassifyContext, DisjointSet, GraphicBoxes, TextClusters,
    classify_nodes, cluster_aligned, cluster_text, extract_text_candidates, merge_nodes,
    region_alignment_features, table_candidates,
};
pub use elements::{
    CONTAIN_TOLERANCE, Curve, ElemKind, ElemRef, Figure, FontHistogram, Glyph, PageElems, Segment,
    TextLine,
};
pub use node::{Node, NodeType, TableThresholds};
pub use normalize::{RawChar, RawPage, RawPath, RawTextLine, clean_text, normalize_document, normalize_page};
pub use params::LayoutParams;
pub use stats::{DEFAULT_FONT_PTS, PageStats};
pub use table::{
    CANDIDATE_FEATURES, Cell, ExtractedTable, Grid, GridSettings, TableContent, TableExtractor,
    candidate_features, feature_matrix, resolve_table, ruling_rectangles,
};
