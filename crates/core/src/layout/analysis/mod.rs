//! Layout analysis - alignment clustering and node typing
//!
//! Contains the layout analysis algorithms for:
//! - Union-find passes over rows, spans and columns
//! - Table candidate clustering with alignment features
//! - Body-text clustering and paragraph splitting
//! - Merging of overlapping nodes
//! - Rule-based node classification

mod alignment;
mod classify;
mod clustering;
mod merge;
mod passes;
mod text_candidates;
mod union_find;

pub use alignment::{
    ALIGNMENT_FEATURES, AlignAxis, AlignKey, AlignmentFeatures, AlignmentTagger, MergeStat, MergeVia,
};
pub use classify::{ClassifyContext, classify_nodes};
pub use clustering::{GraphicBoxes, cluster_aligned, region_alignment_features, table_candidates};
pub use merge::merge_nodes;
pub use text_candidates::{TextClusters, cluster_text, extract_text_candidates};
pub use union_find::DisjointSet;
