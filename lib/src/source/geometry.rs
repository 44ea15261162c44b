//! Feature geometry and segmentization.

use crate::geometry::{BoundingBox, Point, Polyline, Spline};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Maximum angle step when approximating circular arcs, in radians.
const ARC_ANGLE_STEP: f64 = PI / 36.0;

/// Linear pieces per control-point span when sampling splines.
const SPLINE_SEGMENTS_PER_SPAN: usize = 8;

/// Geometry of a vector feature.
///
/// Curved variants are expanded to polylines by [`Geometry::segmentize`];
/// areal variants contribute their ring boundaries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// An open polyline.
    LineString(Polyline),
    /// A collection of open polylines.
    MultiLineString(Vec<Polyline>),
    /// An areal polygon; rings need not repeat their first point.
    Polygon {
        exterior: Vec<Point>,
        holes: Vec<Vec<Point>>,
    },
    /// A sequence of circular arcs: points 0-1-2 form the first arc,
    /// 2-3-4 the second, and so on.
    CircularString(Vec<Point>),
    /// A B-spline curve.
    Spline(Spline),
    /// A heterogeneous collection.
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Expand this geometry into plain polylines.
    ///
    /// Linestrings pass through verbatim, polygon rings become closed
    /// polylines, arcs and splines are approximated by sampling. Geometries
    /// holding no usable linework produce an empty vector.
    pub fn segmentize(&self) -> Vec<Polyline> {
        let mut out = Vec::new();
        self.segmentize_into(&mut out);
        out
    }

    fn segmentize_into(&self, out: &mut Vec<Polyline>) {
        match self {
            Geometry::LineString(line) => {
                if !line.is_empty() {
                    out.push(line.clone());
                }
            }
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    if !line.is_empty() {
                        out.push(line.clone());
                    }
                }
            }
            Geometry::Polygon { exterior, holes } => {
                if let Some(ring) = close_ring(exterior) {
                    out.push(ring);
                }
                for hole in holes {
                    if let Some(ring) = close_ring(hole) {
                        out.push(ring);
                    }
                }
            }
            Geometry::CircularString(points) => {
                if let Some(line) = segmentize_arcs(points) {
                    out.push(line);
                }
            }
            Geometry::Spline(spline) => {
                let spans = spline.control_points().len().saturating_sub(1);
                let line = spline.to_polyline(spans * SPLINE_SEGMENTS_PER_SPAN);
                if !line.is_empty() {
                    out.push(line);
                }
            }
            Geometry::Collection(geometries) => {
                for geometry in geometries {
                    geometry.segmentize_into(out);
                }
            }
        }
    }

    /// Axis-aligned bounding box of the segmentized geometry.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::new();
        for line in self.segmentize() {
            bb.merge(&line.bounding_box());
        }
        bb
    }
}

// Polygon rings are stored open; emit them as closed polylines.
fn close_ring(ring: &[Point]) -> Option<Polyline> {
    if ring.len() < 3 {
        return None;
    }
    let mut points = ring.to_vec();
    if points.first() != points.last() {
        points.push(points[0]);
    }
    Some(Polyline::from_points(points))
}

// Approximate a chain of three-point circular arcs by a polyline.
fn segmentize_arcs(points: &[Point]) -> Option<Polyline> {
    if points.len() < 3 || points.len() % 2 == 0 {
        return None;
    }

    let mut out = vec![points[0]];
    for arc in points.windows(3).step_by(2) {
        append_arc(arc[0], arc[1], arc[2], &mut out);
    }
    Some(Polyline::from_points(out))
}

// Append the sampled arc through (a, b, c), excluding a, ending exactly at c.
fn append_arc(a: Point, b: Point, c: Point, out: &mut Vec<Point>) {
    let center = match circle_center(a, b, c) {
        Some(center) => center,
        None => {
            // collinear: degenerate arc, keep the straight pieces
            out.push(b);
            out.push(c);
            return;
        }
    };

    let radius = center.distance(&a);
    let a0 = (a - center).y.atan2((a - center).x);
    let a1 = (b - center).y.atan2((b - center).x);
    let a2 = (c - center).y.atan2((c - center).x);

    // sweep from a0 to a2 passing through a1
    let ccw = sweep_ccw(a0, a1, a2);
    let sweep = if ccw {
        normalize_angle(a2 - a0)
    } else {
        -normalize_angle(a0 - a2)
    };

    let steps = ((sweep.abs() / ARC_ANGLE_STEP).ceil() as usize).max(2);
    for i in 1..steps {
        let angle = a0 + sweep * (i as f64 / steps as f64);
        out.push(center + Point::new(angle.cos(), angle.sin()) * radius);
    }
    out.push(c);
}

// Center of the circle through three points; None when collinear.
fn circle_center(a: Point, b: Point, c: Point) -> Option<Point> {
    let d = 2.0 * ((b - a).cross(&(c - a)));
    if d.abs() < 1e-12 {
        return None;
    }
    let a_sq = a.length_squared();
    let b_sq = b.length_squared();
    let c_sq = c.length_squared();
    let ux = (a_sq * (b.y - c.y) + b_sq * (c.y - a.y) + c_sq * (a.y - b.y)) / d;
    let uy = (a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x)) / d;
    Some(Point::new(ux, uy))
}

// Does travelling counter-clockwise from a0 reach a1 before a2?
fn sweep_ccw(a0: f64, a1: f64, a2: f64) -> bool {
    normalize_angle(a1 - a0) <= normalize_angle(a2 - a0)
}

// Wrap an angle into [0, 2*PI).
fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a < 0.0 {
        a += 2.0 * PI;
    }
    a
}
