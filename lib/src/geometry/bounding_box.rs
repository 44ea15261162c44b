//! Axis-aligned bounding box.

use super::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D axis-aligned bounding box.
///
/// A freshly created box is undefined (empty) until a point is merged in.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    defined: bool,
}

impl BoundingBox {
    /// Create a new empty (undefined) bounding box.
    #[inline]
    pub fn new() -> Self {
        Self {
            min: Point::new(f64::MAX, f64::MAX),
            max: Point::new(f64::MIN, f64::MIN),
            defined: false,
        }
    }

    /// Create a bounding box from min and max points.
    #[inline]
    pub fn from_min_max(min: Point, max: Point) -> Self {
        Self {
            min,
            max,
            defined: true,
        }
    }

    /// Create a bounding box covering a slice of points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Check if the bounding box is defined (has been merged with at least
    /// one point).
    #[inline]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Check if the bounding box is empty (not defined).
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.defined
    }

    /// Merge a point into the bounding box.
    pub fn merge_point(&mut self, p: Point) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Merge another bounding box into this one.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    /// Width of the bounding box (zero when undefined).
    #[inline]
    pub fn width(&self) -> f64 {
        if self.defined {
            self.max.x - self.min.x
        } else {
            0.0
        }
    }

    /// Height of the bounding box (zero when undefined).
    #[inline]
    pub fn height(&self) -> f64 {
        if self.defined {
            self.max.y - self.min.y
        } else {
            0.0
        }
    }

    /// Center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Check if a point lies inside the box (inclusive).
    pub fn contains(&self, p: &Point) -> bool {
        self.defined
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }

    /// Check if this box intersects another (inclusive at boundaries).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.defined
            && other.defined
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defined {
            write!(f, "BoundingBox({:?} - {:?})", self.min, self.max)
        } else {
            write!(f, "BoundingBox(empty)")
        }
    }
}
