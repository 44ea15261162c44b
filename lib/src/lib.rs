//! Geometric tracing engine for 2D vector linework.
//!
//! Given a collection of line features in a plane, this crate builds a planar
//! graph whose edges are polylines and whose vertices are the polyline
//! endpoints, and answers queries of the form "find the shortest polyline
//! path between two arbitrary planar points". The query points do not need
//! to coincide with graph vertices: a point that lies anywhere along an edge
//! is temporarily grafted into the graph for the duration of the query.
//!
//! # Architecture
//!
//! - [`geometry`] - planar primitives: [`Point`], [`Polyline`],
//!   [`BoundingBox`], B-[`Spline`](geometry::Spline) curves.
//! - [`source`] - the feature-source contract consumed by the engine:
//!   [`FeatureSource`], feature [`Geometry`](source::Geometry) with
//!   segmentization, layer mutation events, and an in-memory layer
//!   implementation.
//! - [`noding`] - optional pre-pass that splits linework at mutual
//!   intersections so polylines only meet at endpoints.
//! - [`graph`] - the planar [`TraceGraph`]: construction from linework,
//!   point location, temporary edge splitting, and Dijkstra search.
//! - [`offset`] - lateral offset curves applied to traced paths.
//! - [`tracer`] - the [`Tracer`] facade tying it all together.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tracer::geometry::{Point, Polyline};
//! use tracer::source::{Geometry, MemoryLayer};
//! use tracer::Tracer;
//!
//! let mut layer = MemoryLayer::new("roads");
//! layer.add_feature(Geometry::LineString(Polyline::from_points(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(10.0, 0.0),
//! ])));
//!
//! let mut tracer = Tracer::new();
//! tracer.set_layers(vec![Rc::new(layer)]);
//!
//! let path = tracer
//!     .find_shortest_path(Point::new(0.0, 0.0), Point::new(10.0, 0.0))
//!     .unwrap();
//! assert!((path.length() - 10.0).abs() < 1e-9);
//! ```

pub mod geometry;
pub mod graph;
pub mod noding;
pub mod offset;
pub mod source;
pub mod tracer;

pub use geometry::{BoundingBox, Point, Polyline};
pub use graph::TraceGraph;
pub use offset::JoinStyle;
pub use source::{FeatureSource, LayerEvent, MemoryLayer};
pub use tracer::{PathError, Tracer};

/// Default tolerance for point coincidence tests, in map units.
///
/// Two points are considered coincident when both coordinate deltas are
/// strictly below this value.
pub const DEFAULT_EPSILON: f64 = 1e-6;
