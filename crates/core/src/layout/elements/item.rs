//! Typed handles into a page's element lists.

use serde::{Deserialize, Serialize};

/// The kind of a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElemKind {
    Text,
    Segment,
    Curve,
    Figure,
}

impl ElemKind {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Reference to one element of a [`super::PageElems`], by kind and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElemRef {
    pub kind: ElemKind,
    pub index: usize,
}

impl ElemRef {
    pub fn text(index: usize) -> Self {
        Self {
            kind: ElemKind::Text,
            index,
        }
    }

    pub fn figure(index: usize) -> Self {
        Self {
            kind: ElemKind::Figure,
            index,
        }
    }
}
