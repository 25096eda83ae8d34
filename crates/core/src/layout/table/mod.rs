//! Table structure and table candidate features.
//!
//! This module provides:
//! - Grid reconstruction of a table region from its ruling lines
//! - Ruling-rectangle table candidates
//! - Candidate feature vectors for pluggable classifiers
//! - Resolution of a region into a grid or an externally extracted table

mod clustering;
mod features;
mod grid;
mod resolve;
mod rulings;

pub use clustering::{closest_index, cluster_objects, retain_centroids};
pub use features::{
    CANDIDATE_FEATURES, LINE_FEATURES, candidate_features, feature_matrix, line_features,
};
pub use grid::{Cell, Grid, GridSettings};
pub use resolve::{ExtractedTable, TableContent, TableExtractor, resolve_table};
pub use rulings::{RULING_TOLERANCE, ruling_rectangles, snap_to_rulings};
