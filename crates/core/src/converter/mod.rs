//! Output formats for layout trees.

mod hocr;

pub use hocr::{HocrRenderer, render_hocr};
