//! In-memory feature source.

use super::{
    AttributeFilter, AttributeMap, Crs, Feature, FeatureId, FeatureRenderer, FeatureRequest,
    FeatureSource, Geometry,
};

/// A feature source holding its features in memory.
///
/// Geometries are served in the coordinates they were stored with; the
/// layer records its CRS but leaves reprojection to richer providers.
/// Mainly useful for tests and for embedders whose linework already lives
/// in memory.
pub struct MemoryLayer {
    id: String,
    crs: Crs,
    next_id: FeatureId,
    features: Vec<Feature>,
    renderer: Option<Box<dyn FeatureRenderer>>,
}

impl MemoryLayer {
    /// Create an empty layer with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            crs: Crs::default(),
            next_id: 1,
            features: Vec::new(),
            renderer: None,
        }
    }

    /// Set the layer CRS.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// The layer CRS.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Add a feature with the given geometry; returns its id.
    pub fn add_feature(&mut self, geometry: Geometry) -> FeatureId {
        self.add_feature_with_attributes(geometry, AttributeMap::new())
    }

    /// Add a feature with geometry and attributes; returns its id.
    pub fn add_feature_with_attributes(
        &mut self,
        geometry: Geometry,
        attributes: AttributeMap,
    ) -> FeatureId {
        let id = self.next_id;
        self.next_id += 1;
        self.features.push(Feature {
            id,
            geometry: Some(geometry),
            attributes,
        });
        id
    }

    /// Remove a feature by id. Returns whether it existed.
    pub fn remove_feature(&mut self, id: FeatureId) -> bool {
        let before = self.features.len();
        self.features.retain(|f| f.id != id);
        self.features.len() != before
    }

    /// Number of features in the layer.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Attach a renderer used for visibility filtering.
    pub fn set_renderer(&mut self, renderer: Box<dyn FeatureRenderer>) {
        self.renderer = Some(renderer);
    }
}

impl FeatureSource for MemoryLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn features(&self, request: &FeatureRequest) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|f| match (&request.rect, &f.geometry) {
                (Some(rect), Some(geometry)) => geometry.bounding_box().intersects(rect),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .map(|f| {
                let mut out = f.clone();
                match &request.attributes {
                    AttributeFilter::All => {}
                    AttributeFilter::None => out.attributes.clear(),
                    AttributeFilter::Subset(names) => {
                        out.attributes.retain(|name, _| names.contains(name));
                    }
                }
                out
            })
            .collect()
    }

    fn renderer(&self) -> Option<&dyn FeatureRenderer> {
        self.renderer.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, Point, Polyline};
    use crate::source::RenderContext;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Geometry {
        Geometry::LineString(Polyline::from_points(vec![
            Point::new(x1, y1),
            Point::new(x2, y2),
        ]))
    }

    #[test]
    fn test_add_and_remove() {
        let mut layer = MemoryLayer::new("mem");
        let id = layer.add_feature(line(0.0, 0.0, 1.0, 0.0));
        assert_eq!(layer.feature_count(), 1);
        assert!(layer.remove_feature(id));
        assert!(!layer.remove_feature(id));
        assert_eq!(layer.feature_count(), 0);
    }

    #[test]
    fn test_rect_filter() {
        let mut layer = MemoryLayer::new("mem");
        layer.add_feature(line(0.0, 0.0, 1.0, 0.0));
        layer.add_feature(line(100.0, 100.0, 101.0, 100.0));

        let request = FeatureRequest::new()
            .with_rect(BoundingBox::from_min_max(Point::new(-1.0, -1.0), Point::new(2.0, 2.0)));
        let features = layer.features(&request);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, 1);

        // no rect returns everything
        assert_eq!(layer.features(&FeatureRequest::new()).len(), 2);
    }

    #[test]
    fn test_attribute_filter() {
        let mut layer = MemoryLayer::new("mem");
        let mut attributes = AttributeMap::new();
        attributes.insert("highway".into(), "primary".into());
        attributes.insert("name".into(), "Main St".into());
        layer.add_feature_with_attributes(line(0.0, 0.0, 1.0, 0.0), attributes);

        let all = layer.features(&FeatureRequest::new());
        assert_eq!(all[0].attributes.len(), 2);

        let none = layer.features(&FeatureRequest::new().with_attributes(AttributeFilter::None));
        assert!(none[0].attributes.is_empty());

        let subset = layer.features(
            &FeatureRequest::new()
                .with_attributes(AttributeFilter::Subset(vec!["highway".into()])),
        );
        assert_eq!(subset[0].attribute("highway"), Some("primary"));
        assert_eq!(subset[0].attribute("name"), None);
    }

    struct HideAll;

    impl FeatureRenderer for HideAll {
        fn will_render(&self, _feature: &Feature, _context: &RenderContext) -> bool {
            false
        }
    }

    #[test]
    fn test_renderer_attachment() {
        let mut layer = MemoryLayer::new("mem");
        assert!(layer.renderer().is_none());
        layer.set_renderer(Box::new(HideAll));
        let renderer = layer.renderer().unwrap();
        assert!(!renderer.will_render(&Feature::default(), &RenderContext::default()));
    }
}
