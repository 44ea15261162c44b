//! Tracing facade.
//!
//! [`Tracer`] owns the cached [`TraceGraph`] and orchestrates a query:
//! lazy graph construction from the configured feature sources, locating
//! (or grafting) the two query points, the shortest-path search, reverting
//! the grafts, and the optional lateral offset post-processing.
//!
//! The facade is single-threaded: every operation runs to completion on
//! the caller's thread, and layer mutation events must be delivered on
//! that same thread via [`Tracer::on_layer_event`].

use crate::geometry::{BoundingBox, Point, Polyline};
use crate::graph::TraceGraph;
use crate::noding::node_linework;
use crate::offset::{offset_curve, JoinStyle};
use crate::source::{
    AttributeFilter, Crs, FeatureRequest, FeatureSource, LayerEvent, RenderContext,
    TransformContext,
};
use crate::DEFAULT_EPSILON;
use std::rc::Rc;
use thiserror::Error;

/// Why a path query produced no path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// Graph initialization aborted: the configured feature cap was hit.
    #[error("too many features to trace; raise the limit or shrink the extent")]
    TooManyFeatures,
    /// The start point is neither a graph vertex nor on any edge.
    #[error("start point is not on the traced linework")]
    Point1NotLocated,
    /// The end point is neither a graph vertex nor on any edge.
    #[error("end point is not on the traced linework")]
    Point2NotLocated,
    /// Both points were located but no route connects them.
    #[error("no path between the given points")]
    NoPath,
}

/// Result type of a path query: the traced polyline, or why there is none.
pub type TraceResult = Result<Polyline, PathError>;

/// Shortest-path tracer over a set of vector layers.
///
/// The graph is built lazily on the first query after a (re)configuration
/// and discarded whenever the configuration or the underlying features
/// change. Offset parameters are pure post-processing and never discard
/// the graph.
pub struct Tracer {
    layers: Vec<Rc<dyn FeatureSource>>,
    dest_crs: Crs,
    transform_context: TransformContext,
    extent: Option<BoundingBox>,
    render_context: Option<RenderContext>,
    max_feature_count: usize,
    node_linework: bool,
    offset: f64,
    offset_segments: usize,
    offset_join_style: JoinStyle,
    offset_miter_limit: f64,
    graph: Option<TraceGraph>,
    has_topology_problem: bool,
}

impl Tracer {
    /// Create a tracer with no layers configured.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            dest_crs: Crs::default(),
            transform_context: TransformContext::default(),
            extent: None,
            render_context: None,
            max_feature_count: 0,
            node_linework: false,
            offset: 0.0,
            offset_segments: 8,
            offset_join_style: JoinStyle::Round,
            offset_miter_limit: 2.0,
            graph: None,
            has_topology_problem: false,
        }
    }

    /// The configured layers.
    pub fn layers(&self) -> &[Rc<dyn FeatureSource>] {
        &self.layers
    }

    /// Replace the set of traced layers.
    ///
    /// A no-op when the list is unchanged. The caller is responsible for
    /// routing each layer's mutation events to [`Tracer::on_layer_event`]
    /// for as long as the layer stays configured.
    pub fn set_layers(&mut self, layers: Vec<Rc<dyn FeatureSource>>) {
        let unchanged = self.layers.len() == layers.len()
            && self
                .layers
                .iter()
                .zip(&layers)
                .all(|(a, b)| Rc::ptr_eq(a, b));
        if unchanged {
            return;
        }
        self.layers = layers;
        self.invalidate_graph();
    }

    /// Set the destination CRS features are projected to.
    pub fn set_destination_crs(&mut self, crs: Crs, context: TransformContext) {
        self.dest_crs = crs;
        self.transform_context = context;
        self.invalidate_graph();
    }

    /// Restrict tracing to an extent rectangle; `None` traces everything.
    pub fn set_extent(&mut self, extent: Option<BoundingBox>) {
        if self.extent == extent {
            return;
        }
        self.extent = extent;
        self.invalidate_graph();
    }

    /// Set the render context used for visibility filtering.
    pub fn set_render_context(&mut self, context: Option<RenderContext>) {
        self.render_context = context;
        self.invalidate_graph();
    }

    /// Cap on the number of traced features; 0 means unlimited.
    pub fn max_feature_count(&self) -> usize {
        self.max_feature_count
    }

    /// Set the feature cap; 0 means unlimited.
    pub fn set_max_feature_count(&mut self, count: usize) {
        self.max_feature_count = count;
        self.invalidate_graph();
    }

    /// Whether the linework is noded before graph construction.
    pub fn node_linework(&self) -> bool {
        self.node_linework
    }

    /// Enable or disable the noding pre-pass.
    pub fn set_node_linework(&mut self, node: bool) {
        if self.node_linework == node {
            return;
        }
        self.node_linework = node;
        self.invalidate_graph();
    }

    /// The lateral offset applied to traced paths, in map units.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Set the lateral offset; positive offsets to the left of the path.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// The offset join parameters: (quad segments, join style, miter limit).
    pub fn offset_parameters(&self) -> (usize, JoinStyle, f64) {
        (
            self.offset_segments,
            self.offset_join_style,
            self.offset_miter_limit,
        )
    }

    /// Set the offset join parameters.
    pub fn set_offset_parameters(
        &mut self,
        quad_segments: usize,
        join_style: JoinStyle,
        miter_limit: f64,
    ) {
        self.offset_segments = quad_segments;
        self.offset_join_style = join_style;
        self.offset_miter_limit = miter_limit;
    }

    /// Whether the last graph build hit a noding failure and fell back to
    /// the raw, possibly crossing linework.
    pub fn has_topology_problem(&self) -> bool {
        self.has_topology_problem
    }

    /// Handle a mutation event from one of the configured layers.
    ///
    /// Every event discards the cached graph; a [`LayerEvent::Destroyed`]
    /// additionally removes the layer from the configuration.
    pub fn on_layer_event(&mut self, layer_id: &str, event: LayerEvent) {
        if event == LayerEvent::Destroyed {
            self.layers.retain(|layer| layer.id() != layer_id);
        }
        self.invalidate_graph();
    }

    /// Find the shortest path between two planar points.
    ///
    /// The points need not be graph vertices: a point anywhere on the
    /// traced linework is grafted in for the duration of the query, and
    /// the graph is restored before returning. When a non-zero offset is
    /// configured the result is the offset curve of the traced path.
    pub fn find_shortest_path(&mut self, p1: Point, p2: Point) -> TraceResult {
        if !self.init_graph() {
            return Err(PathError::TooManyFeatures);
        }
        let Some(graph) = self.graph.as_mut() else {
            return Err(PathError::TooManyFeatures);
        };

        let v1 = graph.point_in_graph(p1, DEFAULT_EPSILON);
        let v2 = graph.point_in_graph(p2, DEFAULT_EPSILON);

        let result = match (v1, v2) {
            (None, _) => Err(PathError::Point1NotLocated),
            (_, None) => Err(PathError::Point2NotLocated),
            (Some(v1), Some(v2)) => Ok(graph.shortest_path(v1, v2)),
        };
        // the graph must be restored on every exit path, including the
        // failed-endpoint ones where a first graft may have succeeded
        graph.reset();

        let mut points = result?;

        if !points.is_empty() && self.offset != 0.0 {
            if let Some(mut curve) = offset_curve(
                &points,
                self.offset,
                self.offset_segments,
                self.offset_join_style,
                self.offset_miter_limit,
            ) {
                // offset-curve handedness can flip for negative offsets
                if let (Some(first), Some(last)) = (curve.first_point(), curve.last_point()) {
                    let diff_normal = first.distance(&p1) + last.distance(&p2);
                    let diff_reversed = first.distance(&p2) + last.distance(&p1);
                    if diff_reversed < diff_normal {
                        curve.reverse();
                    }
                }
                points = curve;
            }
        }

        if points.is_empty() {
            Err(PathError::NoPath)
        } else {
            Ok(points)
        }
    }

    /// Whether a point lies on the traced linework (vertex or edge).
    ///
    /// Initializes the graph if needed but never modifies it.
    pub fn is_point_snapped(&mut self, pt: Point) -> bool {
        if !self.init_graph() {
            return false;
        }
        let Some(graph) = self.graph.as_ref() else {
            return false;
        };
        graph.point_to_vertex(&pt, DEFAULT_EPSILON).is_some()
            || graph.point_to_edge(&pt, DEFAULT_EPSILON).is_some()
    }

    fn invalidate_graph(&mut self) {
        self.graph = None;
    }

    // Build the graph from the configured layers. Returns false when the
    // feature cap aborted the build; the graph stays unset in that case.
    fn init_graph(&mut self) -> bool {
        if self.graph.is_some() {
            return true;
        }

        self.has_topology_problem = false;

        let mut linework: Vec<Polyline> = Vec::new();
        let mut features_counted = 0usize;

        for layer in &self.layers {
            // visibility filtering applies only with a render context, a
            // filtering-capable renderer, and invisible snapping disabled
            let renderer = match &self.render_context {
                Some(context) if !context.snap_invisible_features => layer
                    .renderer()
                    .filter(|renderer| renderer.supports_filtering()),
                _ => None,
            };

            let mut request = FeatureRequest::new()
                .with_dest_crs(self.dest_crs.clone(), self.transform_context.clone());
            if let Some(extent) = &self.extent {
                request = request.with_rect(*extent);
            }
            request = match (&renderer, &self.render_context) {
                (Some(renderer), Some(context)) => request
                    .with_attributes(AttributeFilter::Subset(renderer.used_attributes(context))),
                _ => request.with_attributes(AttributeFilter::None),
            };

            for feature in layer.features(&request) {
                let Some(geometry) = &feature.geometry else {
                    continue;
                };
                if let (Some(renderer), Some(context)) = (&renderer, &self.render_context) {
                    if !renderer.will_render(&feature, context) {
                        continue;
                    }
                }

                linework.extend(geometry.segmentize());

                features_counted += 1;
                if self.max_feature_count != 0 && features_counted >= self.max_feature_count {
                    log::debug!(
                        "tracing aborted: feature count reached the cap of {}",
                        self.max_feature_count
                    );
                    return false;
                }
            }
        }

        if self.node_linework {
            match node_linework(&linework) {
                Ok(noded) => linework = noded,
                Err(err) => {
                    // degrade to the raw linework, potentially missing
                    // intersections that are not endpoints
                    self.has_topology_problem = true;
                    log::warn!("tracer noding failed: {err}");
                }
            }
        }

        let graph = TraceGraph::from_linework(&linework);
        log::debug!(
            "traced graph: {} vertices, {} edges from {} features",
            graph.vertices().len(),
            graph.edges().len(),
            features_counted
        );
        self.graph = Some(graph);
        true
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Feature, FeatureRenderer, Geometry, MemoryLayer};

    fn line(points: &[(f64, f64)]) -> Geometry {
        Geometry::LineString(Polyline::from_points(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        ))
    }

    fn single_line_tracer() -> Tracer {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (10.0, 0.0)]));
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(layer)]);
        tracer
    }

    #[test]
    fn test_trace_direct_edge() {
        let mut tracer = single_line_tracer();
        let path = tracer
            .find_shortest_path(Point::new(0.0, 0.0), Point::new(10.0, 0.0))
            .unwrap();
        assert!((path.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_trace_point_off_linework() {
        let mut tracer = single_line_tracer();
        let err = tracer
            .find_shortest_path(Point::new(0.0, 5.0), Point::new(10.0, 0.0))
            .unwrap_err();
        assert_eq!(err, PathError::Point1NotLocated);

        let err = tracer
            .find_shortest_path(Point::new(0.0, 0.0), Point::new(10.0, 5.0))
            .unwrap_err();
        assert_eq!(err, PathError::Point2NotLocated);
    }

    #[test]
    fn test_graph_restored_after_failed_endpoint() {
        // the first point grafts, the second fails; a following query must
        // still see the original single-edge graph
        let mut tracer = single_line_tracer();
        let _ = tracer.find_shortest_path(Point::new(5.0, 0.0), Point::new(50.0, 50.0));

        let graph = tracer.graph.as_ref().unwrap();
        assert_eq!(graph.joined_vertices(), 0);
        assert_eq!(graph.edges().len(), 1);

        let path = tracer
            .find_shortest_path(Point::new(2.0, 0.0), Point::new(8.0, 0.0))
            .unwrap();
        assert!((path.length() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_many_features() {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]));
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]));
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(layer)]);
        tracer.set_max_feature_count(2);

        let err = tracer
            .find_shortest_path(Point::new(0.0, 0.0), Point::new(2.0, 0.0))
            .unwrap_err();
        assert_eq!(err, PathError::TooManyFeatures);
        assert!(!tracer.is_point_snapped(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_invalidation_on_layer_event() {
        let mut tracer = single_line_tracer();
        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(tracer.graph.is_some());

        tracer.on_layer_event("lines", LayerEvent::GeometryChanged(1));
        assert!(tracer.graph.is_none(), "event must discard the graph");

        // the graph rebuilds lazily on the next query
        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_layer_destroyed_removes_layer() {
        let mut tracer = single_line_tracer();
        tracer.on_layer_event("lines", LayerEvent::Destroyed);
        assert!(tracer.layers().is_empty());
        assert!(!tracer.is_point_snapped(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_set_layers_same_list_keeps_graph() {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (10.0, 0.0)]));
        let layer: Rc<dyn FeatureSource> = Rc::new(layer);

        let mut tracer = Tracer::new();
        tracer.set_layers(vec![layer.clone()]);
        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(tracer.graph.is_some());

        tracer.set_layers(vec![layer]);
        assert!(tracer.graph.is_some(), "identical layer list is a no-op");
    }

    #[test]
    fn test_offset_parameters_do_not_invalidate() {
        let mut tracer = single_line_tracer();
        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        tracer.set_offset(1.0);
        tracer.set_offset_parameters(4, JoinStyle::Miter, 3.0);
        assert!(tracer.graph.is_some());
        assert_eq!(tracer.offset(), 1.0);
        assert_eq!(tracer.offset_parameters(), (4, JoinStyle::Miter, 3.0));
    }

    #[test]
    fn test_extent_filters_features() {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (10.0, 0.0)]));
        layer.add_feature(line(&[(100.0, 100.0), (110.0, 100.0)]));
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(layer)]);
        tracer.set_extent(Some(BoundingBox::from_min_max(
            Point::new(-1.0, -1.0),
            Point::new(20.0, 20.0),
        )));

        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(!tracer.is_point_snapped(Point::new(105.0, 100.0)));
    }

    struct VisibleAttribute;

    impl FeatureRenderer for VisibleAttribute {
        fn will_render(&self, feature: &Feature, _context: &RenderContext) -> bool {
            feature.attribute("visible") == Some("true")
        }

        fn used_attributes(&self, _context: &RenderContext) -> Vec<String> {
            vec!["visible".into()]
        }
    }

    fn renderer_layer() -> MemoryLayer {
        let mut layer = MemoryLayer::new("lines");
        let mut visible = crate::source::AttributeMap::new();
        visible.insert("visible".into(), "true".into());
        layer.add_feature_with_attributes(line(&[(0.0, 0.0), (10.0, 0.0)]), visible);
        let mut hidden = crate::source::AttributeMap::new();
        hidden.insert("visible".into(), "false".into());
        layer.add_feature_with_attributes(line(&[(0.0, 5.0), (10.0, 5.0)]), hidden);
        layer.set_renderer(Box::new(VisibleAttribute));
        layer
    }

    #[test]
    fn test_renderer_filtering_with_context() {
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(renderer_layer())]);
        tracer.set_render_context(Some(RenderContext::default()));

        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(!tracer.is_point_snapped(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_renderer_ignored_without_context() {
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(renderer_layer())]);

        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(tracer.is_point_snapped(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_renderer_ignored_when_snapping_invisible() {
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(renderer_layer())]);
        tracer.set_render_context(Some(
            RenderContext::default().with_snap_invisible_features(true),
        ));

        assert!(tracer.is_point_snapped(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_noding_failure_sets_topology_problem() {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (f64::NAN, 1.0)]));
        layer.add_feature(line(&[(0.0, 0.0), (10.0, 0.0)]));
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(layer)]);
        tracer.set_node_linework(true);

        // the graph still builds from the raw linework
        assert!(tracer.is_point_snapped(Point::new(5.0, 0.0)));
        assert!(tracer.has_topology_problem());
    }

    #[test]
    fn test_noding_connects_crossing_lines() {
        let mut layer = MemoryLayer::new("lines");
        layer.add_feature(line(&[(0.0, 0.0), (10.0, 0.0)]));
        layer.add_feature(line(&[(5.0, -5.0), (5.0, 5.0)]));
        let mut tracer = Tracer::new();
        tracer.set_layers(vec![Rc::new(layer)]);

        // un-noded, the crossing is invisible and the endpoints disconnected
        let err = tracer
            .find_shortest_path(Point::new(0.0, 0.0), Point::new(5.0, 5.0))
            .unwrap_err();
        assert_eq!(err, PathError::NoPath);

        tracer.set_node_linework(true);
        let path = tracer
            .find_shortest_path(Point::new(0.0, 0.0), Point::new(5.0, 5.0))
            .unwrap();
        assert!((path.length() - 10.0).abs() < 1e-9);
        assert!(!tracer.has_topology_problem());
    }
}
