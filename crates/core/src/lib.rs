//! pdftree - layout analysis of digitally generated PDF pages.
//!
//! Pages arrive as positioned text lines, ruling segments, curves and
//! figures (see [`layout::normalize`]). The engine clusters them by
//! alignment into typed regions, resolves table structure, and renders
//! the resulting per-page trees as hOCR.

pub mod converter;
pub mod error;
pub mod layout;
pub mod predict;
pub mod scan;
pub mod tree;
pub mod utils;

pub use converter::{HocrRenderer, render_hocr};
pub use error::{LayoutError, Result};
pub use layout::node::NodeType;
pub use layout::normalize::{RawPage, normalize_document};
pub use scan::{ScanPolicy, is_scanned};
pub use tree::{DocumentTree, PageTree, TreeExtractor, TreeOptions};
