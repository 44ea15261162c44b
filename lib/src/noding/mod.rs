//! Linework noding: splitting polylines at their mutual intersections.
//!
//! The trace graph only connects polylines at endpoints. Linework that
//! crosses mid-segment therefore produces paths that ignore the crossing.
//! This pre-pass splits every polyline at each point where it intersects
//! another polyline (or itself), so the output meets only at endpoints.
//!
//! Collinear overlaps are left untouched: overlapping segments stay
//! duplicated rather than being merged, which the graph tolerates as
//! parallel edges.

use crate::geometry::{Point, Polyline};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};
use thiserror::Error;

/// Errors raised by the noder.
#[derive(Debug, Error)]
pub enum NodingError {
    /// A polyline carries NaN or infinite coordinates.
    #[error("linework contains a non-finite coordinate in polyline {0}")]
    NonFiniteCoordinate(usize),
}

/// Result type for noding operations.
pub type NodingResult<T> = Result<T, NodingError>;

// Cuts closer than this to a segment endpoint are snapped onto it so a
// near-endpoint crossing does not produce a sliver piece.
const CUT_SNAP_TOLERANCE: f64 = 1e-9;

/// Split polylines at every point where two of them (or one with itself)
/// cross, so that intersections occur only at endpoints.
///
/// The output preserves all input vertices; only new endpoints are
/// introduced. Polylines with fewer than two points are dropped.
pub fn node_linework(lines: &[Polyline]) -> NodingResult<Vec<Polyline>> {
    for (index, line) in lines.iter().enumerate() {
        if !line.is_finite() {
            return Err(NodingError::NonFiniteCoordinate(index));
        }
    }

    // collect cut positions per polyline as (segment index, parameter)
    let mut cuts: Vec<Vec<(usize, f64)>> = vec![Vec::new(); lines.len()];

    for a in 0..lines.len() {
        for b in a..lines.len() {
            collect_crossings(lines, a, b, &mut cuts);
        }
    }

    let mut out = Vec::new();
    for (line, mut line_cuts) in lines.iter().zip(cuts) {
        if line.is_empty() {
            continue;
        }
        line_cuts.sort_by(|x, y| {
            x.0.cmp(&y.0)
                .then(x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal))
        });
        split_at_cuts(line, &line_cuts, &mut out);
    }
    Ok(out)
}

// Record proper crossings between lines[a] and lines[b] into `cuts`.
fn collect_crossings(lines: &[Polyline], a: usize, b: usize, cuts: &mut [Vec<(usize, f64)>]) {
    let pa = lines[a].points();
    let pb = lines[b].points();

    for i in 0..pa.len().saturating_sub(1) {
        for j in 0..pb.len().saturating_sub(1) {
            // within one polyline, visit each segment pair once and skip
            // neighbors, which share a vertex by construction
            if a == b && j <= i + 1 {
                continue;
            }

            let seg_a = Line::new(coord(pa[i]), coord(pa[i + 1]));
            let seg_b = Line::new(coord(pb[j]), coord(pb[j + 1]));
            let crossing = match line_intersection(seg_a, seg_b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    Point::new(intersection.x, intersection.y)
                }
                // collinear overlaps and disjoint segments: no cut
                _ => continue,
            };

            if let Some(cut) = cut_param(pa[i], pa[i + 1], crossing) {
                cuts[a].push((i, cut));
            }
            if let Some(cut) = cut_param(pb[j], pb[j + 1], crossing) {
                cuts[b].push((j, cut));
            }
        }
    }
}

// Parameter of `pt` along segment (a, b), snapped away from the endpoints;
// None when the crossing already sits on an endpoint.
fn cut_param(a: Point, b: Point, pt: Point) -> Option<f64> {
    let len = a.distance(&b);
    if len == 0.0 {
        return None;
    }
    let t = a.distance(&pt) / len;
    if t < CUT_SNAP_TOLERANCE || t > 1.0 - CUT_SNAP_TOLERANCE {
        return None;
    }
    Some(t)
}

// Emit the pieces of `line` between consecutive cuts.
fn split_at_cuts(line: &Polyline, cuts: &[(usize, f64)], out: &mut Vec<Polyline>) {
    let points = line.points();
    let mut piece: Vec<Point> = vec![points[0]];

    for (segment, segment_end) in points.windows(2).map(|w| (w[0], w[1])).enumerate() {
        let (start, end) = segment_end;
        let mut last_t = 0.0;
        for &(cut_segment, t) in cuts {
            if cut_segment != segment {
                continue;
            }
            if t <= last_t {
                continue; // duplicate crossing on this segment
            }
            let cut_point = start + (end - start) * t;
            piece.push(cut_point);
            if piece.len() >= 2 {
                out.push(Polyline::from_points(piece.clone()));
            }
            piece = vec![cut_point];
            last_t = t;
        }
        piece.push(end);
    }

    if piece.len() >= 2 {
        out.push(Polyline::from_points(piece));
    }
}

#[inline]
fn coord(p: Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}
