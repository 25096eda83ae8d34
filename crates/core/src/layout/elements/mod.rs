//! Page element types consumed by the layout engine.
//!
//! Contains:
//! - Component: base type for objects with bounding boxes
//! - Glyph, TextLine: positioned text with font information
//! - Segment, Curve, Figure: graphical elements
//! - ElemKind, ElemRef: typed handles into a page's element lists
//! - PageElems: all normalized elements of one page

/// Implements `HasBBox` from the type's own `x0..y1` fields (`fields`)
/// or from those of a named field holding a `Component`.
macro_rules! impl_has_bbox_delegate {
    ($type:ty, fields) => {
        impl crate::utils::HasBBox for $type {
            fn x0(&self) -> f64 {
                self.x0
            }
            fn y0(&self) -> f64 {
                self.y0
            }
            fn x1(&self) -> f64 {
                self.x1
            }
            fn y1(&self) -> f64 {
                self.y1
            }
        }
    };
    ($type:ty, $field:ident) => {
        impl crate::utils::HasBBox for $type {
            fn x0(&self) -> f64 {
                self.$field.x0
            }
            fn y0(&self) -> f64 {
                self.$field.y0
            }
            fn x1(&self) -> f64 {
                self.$field.x1
            }
            fn y1(&self) -> f64 {
                self.$field.y1
            }
        }
    };
}

pub(crate) use impl_has_bbox_delegate;

mod component;
mod graphics;
mod item;
mod page;
mod text;

pub use component::Component;
pub use graphics::{Curve, Figure, Segment};
pub use item::{ElemKind, ElemRef};
pub use page::{CONTAIN_TOLERANCE, FontHistogram, PageElems};
pub use text::{Glyph, TextLine};
