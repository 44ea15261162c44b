//! Feature-source contract consumed by the tracing engine.
//!
//! The engine does not own any feature data. It pulls linework from
//! [`FeatureSource`] implementations (one per configured layer), filtered by
//! an optional extent rectangle and projected to a requested destination
//! CRS, and optionally pruned by the layer's [`FeatureRenderer`] visibility
//! predicate. Mutations on a source are reported to the engine as
//! [`LayerEvent`] values, delivered synchronously on the engine's thread.
//!
//! [`MemoryLayer`] is a complete in-memory implementation of the contract,
//! used by the test suite and handy for embedders that already hold their
//! linework in memory.

mod geometry;
mod memory;

pub use geometry::Geometry;
pub use memory::MemoryLayer;

use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a feature within its layer.
pub type FeatureId = u64;

/// Feature attribute values, keyed by attribute name.
pub type AttributeMap = HashMap<String, String>;

/// A coordinate reference system, identified by an authority id such as
/// `"EPSG:3857"`. The default value is an invalid (unset) CRS.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    auth_id: String,
}

impl Crs {
    /// Create a CRS from an authority identifier.
    pub fn new(auth_id: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
        }
    }

    /// The authority identifier, e.g. `"EPSG:4326"`.
    pub fn auth_id(&self) -> &str {
        &self.auth_id
    }

    /// An unset CRS is not valid.
    pub fn is_valid(&self) -> bool {
        !self.auth_id.is_empty()
    }
}

/// Context resolving which transform operation to use between CRS pairs.
///
/// Sources consult the context when projecting features to a requested
/// destination CRS; an absent entry means the source's default operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformContext {
    operations: HashMap<(String, String), String>,
}

impl TransformContext {
    /// Register the operation to use between a source and destination CRS.
    pub fn set_operation(&mut self, source: &Crs, dest: &Crs, operation: impl Into<String>) {
        self.operations.insert(
            (source.auth_id.clone(), dest.auth_id.clone()),
            operation.into(),
        );
    }

    /// Look up the operation registered for a CRS pair.
    pub fn operation(&self, source: &Crs, dest: &Crs) -> Option<&str> {
        self.operations
            .get(&(source.auth_id.clone(), dest.auth_id.clone()))
            .map(String::as_str)
    }
}

/// Rendering state consulted when filtering features by visibility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    /// Current map scale denominator, for scale-dependent renderer rules.
    pub map_scale: f64,
    /// When true, invisible features are still snappable and renderer
    /// filtering is skipped entirely.
    pub snap_invisible_features: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            map_scale: 1.0,
            snap_invisible_features: false,
        }
    }
}

impl RenderContext {
    /// Create a render context with the given map scale.
    pub fn new(map_scale: f64) -> Self {
        Self {
            map_scale,
            ..Default::default()
        }
    }

    /// Set whether invisible features remain snappable.
    pub fn with_snap_invisible_features(mut self, snap: bool) -> Self {
        self.snap_invisible_features = snap;
        self
    }
}

/// Which attributes a feature request asks the source to materialize.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AttributeFilter {
    /// All attributes.
    #[default]
    All,
    /// No attributes at all.
    None,
    /// Only the named attributes.
    Subset(Vec<String>),
}

/// Parameters of a feature iteration request.
#[derive(Clone, Debug, Default)]
pub struct FeatureRequest {
    /// Only features whose geometry intersects this rectangle.
    pub rect: Option<BoundingBox>,
    /// Project geometries to this CRS before returning them.
    pub dest_crs: Option<Crs>,
    /// Transform resolution context accompanying `dest_crs`.
    pub transform_context: TransformContext,
    /// Attributes the caller needs.
    pub attributes: AttributeFilter,
}

impl FeatureRequest {
    /// Create an unconstrained request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the request to a rectangle.
    pub fn with_rect(mut self, rect: BoundingBox) -> Self {
        self.rect = Some(rect);
        self
    }

    /// Request projection to a destination CRS.
    pub fn with_dest_crs(mut self, crs: Crs, context: TransformContext) -> Self {
        self.dest_crs = Some(crs);
        self.transform_context = context;
        self
    }

    /// Restrict which attributes are materialized.
    pub fn with_attributes(mut self, attributes: AttributeFilter) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A single vector feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    /// Identifier within the owning layer.
    pub id: FeatureId,
    /// The feature geometry; may be absent.
    pub geometry: Option<Geometry>,
    /// Attribute values, subject to the request's [`AttributeFilter`].
    pub attributes: AttributeMap,
}

impl Feature {
    /// Create a feature with a geometry and no attributes.
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry: Some(geometry),
            attributes: AttributeMap::new(),
        }
    }

    /// Whether the feature carries a geometry.
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Attribute lookup by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Visibility predicate attached to a layer.
///
/// Mirrors the renderer side of the source contract: the engine asks the
/// renderer which attributes it needs, then queries per-feature visibility.
pub trait FeatureRenderer {
    /// Whether the feature would be drawn under the given context.
    fn will_render(&self, feature: &Feature, context: &RenderContext) -> bool;

    /// Attributes the renderer needs to evaluate `will_render`.
    fn used_attributes(&self, _context: &RenderContext) -> Vec<String> {
        Vec::new()
    }

    /// Whether this renderer can filter features at all. Renderers that
    /// draw everything report false and are skipped.
    fn supports_filtering(&self) -> bool {
        true
    }
}

/// A source of vector features, i.e. one map layer.
pub trait FeatureSource {
    /// Stable identifier of this layer.
    fn id(&self) -> &str;

    /// Iterate features matching the request.
    ///
    /// The source applies the rectangle filter and CRS projection itself;
    /// the returned geometries are in the requested destination CRS.
    fn features(&self, request: &FeatureRequest) -> Vec<Feature>;

    /// The layer's renderer, when it has one.
    fn renderer(&self) -> Option<&dyn FeatureRenderer> {
        None
    }
}

/// A mutation notification from a feature source.
///
/// Embedders forward these to [`Tracer::on_layer_event`] on the engine's
/// thread; each one discards the cached graph.
///
/// [`Tracer::on_layer_event`]: crate::Tracer::on_layer_event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerEvent {
    /// A feature was added.
    FeatureAdded(FeatureId),
    /// A feature was deleted.
    FeatureDeleted(FeatureId),
    /// A feature's geometry changed.
    GeometryChanged(FeatureId),
    /// A feature's attribute value changed.
    AttributeValueChanged(FeatureId),
    /// The underlying data changed wholesale.
    DataChanged,
    /// The layer's style (and thus visibility filtering) changed.
    StyleChanged,
    /// The layer is going away.
    Destroyed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_validity() {
        assert!(!Crs::default().is_valid());
        assert!(Crs::new("EPSG:3857").is_valid());
        assert_eq!(Crs::new("EPSG:3857").auth_id(), "EPSG:3857");
    }

    #[test]
    fn test_transform_context_lookup() {
        let src = Crs::new("EPSG:4326");
        let dst = Crs::new("EPSG:3857");
        let mut ctx = TransformContext::default();
        assert_eq!(ctx.operation(&src, &dst), None);

        ctx.set_operation(&src, &dst, "+proj=webmerc");
        assert_eq!(ctx.operation(&src, &dst), Some("+proj=webmerc"));
        assert_eq!(ctx.operation(&dst, &src), None);
    }

    #[test]
    fn test_feature_attributes() {
        let mut f = Feature::default();
        assert!(!f.has_geometry());
        f.attributes.insert("highway".into(), "primary".into());
        assert_eq!(f.attribute("highway"), Some("primary"));
        assert_eq!(f.attribute("name"), None);
    }
}
