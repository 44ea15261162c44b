//! Planar geometry primitives.
//!
//! All types in this module are strictly two-dimensional and operate on
//! unscaled `f64` map units. Tolerance-based comparisons take an explicit
//! epsilon; the crate-wide default is [`crate::DEFAULT_EPSILON`].

mod bounding_box;
mod point;
mod polyline;
mod spline;

pub use bounding_box::BoundingBox;
pub use point::Point;
pub use polyline::{Polyline, SegmentHit};
pub use spline::Spline;
