//! Graphical elements: Segment, Curve, Figure.

use serde::{Deserialize, Serialize};

use crate::utils::{HasBBox, Point, Rect, get_bound};

use super::component::Component;

/// A straight axis-aligned ruling line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    component: Component,
    pub linewidth: f64,
}

impl Segment {
    pub fn new(linewidth: f64, p0: Point, p1: Point) -> Self {
        Self {
            component: Component::new(get_bound([p0, p1])),
            linewidth,
        }
    }

    pub fn from_bbox(bbox: Rect) -> Self {
        Self {
            component: Component::new(bbox),
            linewidth: 1.0,
        }
    }

    /// A ruling narrower than 0.1 units is treated as vertical.
    pub fn is_vertical(&self) -> bool {
        self.width() < 0.1
    }

    pub fn is_horizontal(&self) -> bool {
        !self.is_vertical()
    }
}

impl_has_bbox_delegate!(Segment, component);

/// A polyline or short straight line that is not a ruling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    component: Component,
    pub linewidth: f64,
    pub pts: Vec<Point>,
}

impl Curve {
    pub fn new(linewidth: f64, pts: Vec<Point>) -> Self {
        let bbox = get_bound(pts.iter().copied());
        Self {
            component: Component::new(bbox),
            linewidth,
            pts,
        }
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

impl_has_bbox_delegate!(Curve, component);

/// An embedded image or form XObject region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    component: Component,
}

impl Figure {
    pub fn new(bbox: Rect) -> Self {
        Self {
            component: Component::new(bbox),
        }
    }
}

impl_has_bbox_delegate!(Figure, component);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_orientation() {
        let v = Segment::new(1.0, (10.0, 0.0), (10.0, 50.0));
        let h = Segment::new(1.0, (0.0, 20.0), (40.0, 20.0));
        assert!(v.is_vertical());
        assert!(h.is_horizontal());
        assert_eq!(h.bbox(), (0.0, 20.0, 40.0, 20.0));
    }

    #[test]
    fn test_curve_bbox_from_points() {
        let c = Curve::new(0.5, vec![(1.0, 5.0), (4.0, 2.0), (3.0, 9.0)]);
        assert_eq!(c.bbox(), (1.0, 2.0, 4.0, 9.0));
        assert_eq!(c.area(), 21.0);
    }
}
