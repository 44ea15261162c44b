//! B-spline curve evaluation.

use super::{Point, Polyline};
use serde::{Deserialize, Serialize};

/// A planar B-spline defined by control points, a knot vector, and a degree.
///
/// Uniform splines are clamped: the curve starts at the first control point
/// and ends at the last one. The parameter domain is `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    control_points: Vec<Point>,
    knots: Vec<f64>,
    degree: usize,
}

impl Spline {
    /// Uniform clamped spline with the given control points and degree.
    ///
    /// The degree is capped at `control_points.len() - 1`.
    pub fn new(control_points: Vec<Point>, degree: usize) -> Self {
        let degree = if control_points.is_empty() {
            0
        } else {
            degree.min(control_points.len() - 1)
        };
        let knots = uniform_clamped_knots(control_points.len(), degree);
        Self {
            control_points,
            knots,
            degree,
        }
    }

    /// Spline with a custom knot vector.
    ///
    /// The knot vector must be non-decreasing with
    /// `control_points.len() + degree + 1` entries; this is not validated
    /// here and a malformed vector produces a garbage curve, not a panic.
    pub fn with_knots(control_points: Vec<Point>, knots: Vec<f64>, degree: usize) -> Self {
        Self {
            control_points,
            knots,
            degree,
        }
    }

    /// The control points.
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// The spline degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluate the curve point C(t) for `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let n = self.control_points.len();
        if n == 0 {
            return Point::zero();
        }
        if n == 1 || self.degree == 0 {
            return self.control_points[0];
        }

        let p = self.degree;
        let span = self.find_span(n - 1, p, t);
        let basis = self.basis_funs(span, t, p);

        let mut out = Point::zero();
        for (j, weight) in basis.iter().enumerate() {
            out = out + self.control_points[span - p + j] * *weight;
        }
        out
    }

    /// Sample the curve into a polyline with `segments` linear pieces.
    pub fn to_polyline(&self, segments: usize) -> Polyline {
        if self.control_points.len() < 2 {
            return Polyline::new();
        }
        let segments = segments.max(1);
        let mut points = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let t = i as f64 / segments as f64;
            points.push(self.point_at(t));
        }
        Polyline::from_points(points)
    }

    // Binary search for the knot span containing u.
    fn find_span(&self, n: usize, p: usize, u: f64) -> usize {
        let knots = &self.knots;
        if u <= knots[p] {
            return p;
        }
        if u >= knots[n + 1] {
            return n;
        }

        let mut low = p;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < knots[mid] || u >= knots[mid + 1] {
            if u < knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    // Cox-de-Boor basis functions N_{span-p..span},p evaluated at u.
    fn basis_funs(&self, span: usize, u: f64, p: usize) -> Vec<f64> {
        let knots = &self.knots;
        let mut basis = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];

        basis[0] = 1.0;
        for j in 1..=p {
            left[j] = u - knots[span + 1 - j];
            right[j] = knots[span + j] - u;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = basis[r] / (right[r + 1] + left[j - r]);
                basis[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            basis[j] = saved;
        }
        basis
    }
}

// numKnots = numPoints + degree + 1; degree+1 leading zeros and trailing
// ones, interior knots evenly spaced.
fn uniform_clamped_knots(num_points: usize, degree: usize) -> Vec<f64> {
    let num_knots = num_points + degree + 1;
    let n = num_points.saturating_sub(degree).max(1);

    let mut knots = Vec::with_capacity(num_knots);
    let mut i = 0;
    while i <= degree {
        knots.push(0.0);
        i += 1;
    }
    while i < num_points {
        knots.push((i - degree) as f64 / n as f64);
        i += 1;
    }
    while i < num_knots {
        knots.push(1.0);
        i += 1;
    }
    knots
}
