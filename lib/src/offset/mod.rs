//! Lateral offset curves for open polylines.
//!
//! A traced path can be shifted sideways by a signed distance, e.g. to
//! digitize a parallel feature next to an existing one. Positive distances
//! offset to the left of the walking direction, negative to the right.
//!
//! Each segment is translated along its left normal; at every interior
//! vertex the two translated segments are connected according to the
//! configured join style. Corners that turn towards the offset side always
//! use the segment intersection; corners that turn away fan out per
//! [`JoinStyle`].

use crate::geometry::{Point, Polyline};
use serde::{Deserialize, Serialize};

/// How convex corners of an offset curve are joined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStyle {
    /// Circular arc approximated with a configurable number of segments.
    #[default]
    Round,
    /// Sharp corner, limited by the miter limit.
    Miter,
    /// Straight cut between the two offset segment ends.
    Bevel,
}

// Cross products below this magnitude treat consecutive segments as
// collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Compute the offset curve of an open polyline.
///
/// `distance` is the signed lateral offset (positive = left of the walking
/// direction). `quad_segments` is the number of arc points used per quarter
/// circle for [`JoinStyle::Round`] joins. `miter_limit` bounds how far a
/// [`JoinStyle::Miter`] corner may extend, as a multiple of `|distance|`;
/// corners past the limit fall back to a bevel.
///
/// Returns `None` when the input has fewer than two points or no segment
/// with a usable direction. A zero distance returns the input unchanged.
pub fn offset_curve(
    line: &Polyline,
    distance: f64,
    quad_segments: usize,
    join_style: JoinStyle,
    miter_limit: f64,
) -> Option<Polyline> {
    if line.is_empty() {
        return None;
    }
    if distance == 0.0 {
        return Some(line.clone());
    }

    let points = line.points();

    // per-segment unit directions, skipping zero-length segments
    let mut segments: Vec<(Point, Point, Point)> = Vec::new(); // (start, end, direction)
    for w in points.windows(2) {
        let dir = w[1] - w[0];
        if dir.length() > 0.0 {
            segments.push((w[0], w[1], dir.normalize()));
        }
    }
    if segments.is_empty() {
        return None;
    }

    let mut out: Vec<Point> = Vec::new();
    let first_normal = segments[0].2.perp() * distance;
    out.push(segments[0].0 + first_normal);

    for pair in segments.windows(2) {
        let (_, corner, dir_in) = pair[0];
        let (_, _, dir_out) = pair[1];
        join_corner(
            corner,
            dir_in,
            dir_out,
            distance,
            quad_segments,
            join_style,
            miter_limit,
            &mut out,
        );
    }

    let last = segments[segments.len() - 1];
    out.push(last.1 + last.2.perp() * distance);

    Some(Polyline::from_points(out))
}

// Emit the join points around `corner` between two segment directions.
#[allow(clippy::too_many_arguments)]
fn join_corner(
    corner: Point,
    dir_in: Point,
    dir_out: Point,
    distance: f64,
    quad_segments: usize,
    join_style: JoinStyle,
    miter_limit: f64,
    out: &mut Vec<Point>,
) {
    let normal_in = dir_in.perp() * distance;
    let normal_out = dir_out.perp() * distance;
    let end_in = corner + normal_in;
    let start_out = corner + normal_out;

    let turn = dir_in.cross(&dir_out);
    if turn.abs() < COLLINEAR_TOLERANCE {
        // straight continuation (or a hairpin; the two offset points then
        // sit apart and are simply connected)
        out.push(end_in);
        if start_out.distance(&end_in) > COLLINEAR_TOLERANCE {
            out.push(start_out);
        }
        return;
    }

    // the corner is concave on the offset side when it turns towards it;
    // there the two offset segments cross and the intersection is the join
    let concave = (turn > 0.0) == (distance > 0.0);
    if concave {
        match line_intersection_points(end_in, dir_in, start_out, dir_out) {
            Some(meet) => out.push(meet),
            None => {
                out.push(end_in);
                out.push(start_out);
            }
        }
        return;
    }

    match join_style {
        JoinStyle::Bevel => {
            out.push(end_in);
            out.push(start_out);
        }
        JoinStyle::Miter => {
            let meet = line_intersection_points(end_in, dir_in, start_out, dir_out);
            match meet {
                Some(meet) if corner.distance(&meet) <= miter_limit * distance.abs() => {
                    out.push(meet);
                }
                _ => {
                    out.push(end_in);
                    out.push(start_out);
                }
            }
        }
        JoinStyle::Round => {
            out.push(end_in);
            append_arc_points(corner, end_in, start_out, distance, quad_segments, out);
            out.push(start_out);
        }
    }
}

// Intersection of two lines given by point + direction; None when parallel.
fn line_intersection_points(p1: Point, d1: Point, p2: Point, d2: Point) -> Option<Point> {
    let denom = d1.cross(&d2);
    if denom.abs() < COLLINEAR_TOLERANCE {
        return None;
    }
    let t = (p2 - p1).cross(&d2) / denom;
    Some(p1 + d1 * t)
}

// Intermediate points of the circular arc from `from` to `to` around
// `center`, exclusive at both ends.
fn append_arc_points(
    center: Point,
    from: Point,
    to: Point,
    distance: f64,
    quad_segments: usize,
    out: &mut Vec<Point>,
) {
    let radius = distance.abs();
    let start_angle = (from - center).y.atan2((from - center).x);
    let end_angle = (to - center).y.atan2((to - center).x);

    // sweep on the convex side: clockwise for a left offset
    let mut sweep = end_angle - start_angle;
    if distance > 0.0 && sweep > 0.0 {
        sweep -= 2.0 * std::f64::consts::PI;
    } else if distance < 0.0 && sweep < 0.0 {
        sweep += 2.0 * std::f64::consts::PI;
    }

    let quarter = std::f64::consts::FRAC_PI_2;
    let steps = ((sweep.abs() / quarter) * quad_segments.max(1) as f64).ceil() as usize;
    for i in 1..steps {
        let angle = start_angle + sweep * (i as f64 / steps as f64);
        out.push(center + Point::new(angle.cos(), angle.sin()) * radius);
    }
}
