//! Polyline type and segment-level queries.

use super::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Result of a closest-segment query on a polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    /// The closest point on the polyline.
    pub point: Point,
    /// Index of the polyline vertex immediately following the hit point.
    pub vertex_after: usize,
    /// Distance from the query point to the closest point.
    pub distance: f64,
}

/// An ordered sequence of planar points interpreted as linear interpolation
/// between consecutive points.
///
/// A polyline with fewer than two points is considered empty; queries and
/// length calculations treat it as carrying no geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Create an empty polyline.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polyline from a vector of points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Get the points of this polyline.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consume the polyline and return its points.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// A polyline needs at least two points to carry any geometry.
    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }

    /// First point, if any.
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Last point, if any.
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Append a point.
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Total length: the sum of Euclidean distances between consecutive
    /// points. Zero for an empty polyline.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Reverse the point order in place. Length is preserved.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Return a reversed copy.
    pub fn reversed(&self) -> Self {
        let mut out = self.clone();
        out.reverse();
        out
    }

    /// Check that every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Point::is_finite)
    }

    /// Axis-aligned bounding box of all points.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Find the closest point on this polyline to `pt` using
    /// segment-by-segment projection.
    ///
    /// Returns the hit on the first segment attaining the minimum distance,
    /// together with the index of the polyline vertex immediately following
    /// the hit point. `None` for an empty polyline.
    ///
    /// `epsilon` bounds the coordinate error at which two candidate
    /// distances are considered distinct; the scan keeps the earliest
    /// segment on ties.
    pub fn closest_segment(&self, pt: &Point, epsilon: f64) -> Option<SegmentHit> {
        if self.is_empty() {
            return None;
        }

        let mut best: Option<SegmentHit> = None;
        for i in 0..self.points.len() - 1 {
            let (closest, _t) = pt.project_onto_segment(self.points[i], self.points[i + 1]);
            let distance = pt.distance(&closest);
            let better = match &best {
                Some(hit) => distance + epsilon < hit.distance,
                None => true,
            };
            if better {
                best = Some(SegmentHit {
                    point: closest,
                    vertex_after: i + 1,
                    distance,
                });
            }
        }
        best
    }

    /// Split this polyline at `pt`, which lies on the segment ending at
    /// vertex index `vertex_after`.
    ///
    /// Produces the part from the start through `pt` and the part from `pt`
    /// through the end; both halves share `pt` as the split endpoint and
    /// keep all intermediate vertices on their side. A split point that
    /// exactly equals an existing vertex is not duplicated within a half.
    pub fn split_at(&self, pt: Point, vertex_after: usize) -> (Polyline, Polyline) {
        let vertex_after = vertex_after.min(self.points.len());

        let mut before = self.points[..vertex_after].to_vec();
        if before.last() != Some(&pt) {
            before.push(pt);
        }

        let tail = &self.points[vertex_after..];
        let mut after = vec![pt];
        if tail.first() == Some(&pt) {
            after.extend_from_slice(&tail[1..]);
        } else {
            after.extend_from_slice(tail);
        }

        (Polyline::from_points(before), Polyline::from_points(after))
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}
