//! R-tree over triangle envelopes for tile window queries and point location.

use std::sync::Arc;

use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use projection::lonlat_to_mercator;
use tile_common::bbox::{BoundingBox, GeoBounds};

use crate::triangulation::Triangulation;

/// Barycentric slack so points on shared edges are found in either triangle.
const EDGE_TOLERANCE: f64 = -1e-9;

#[derive(Debug, Clone)]
struct TriangleEnvelope {
    id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for TriangleEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Triangles and vertices of the mesh overlapping a query window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshSubset {
    /// Triangle ids, ascending
    pub triangles: Vec<usize>,
    /// Vertex ids referenced by those triangles, ascending and unique
    pub vertices: Vec<usize>,
}

impl MeshSubset {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Spatial index over a shared, immutable triangulation.
#[derive(Debug)]
pub struct SpatialIndex {
    mesh: Arc<Triangulation>,
    tree: RTree<TriangleEnvelope>,
    extent: Option<BoundingBox>,
}

impl SpatialIndex {
    /// Bulk-load the envelopes of every triangle in the mesh.
    pub fn build(mesh: Arc<Triangulation>) -> Self {
        let envelopes: Vec<TriangleEnvelope> = mesh
            .triangles()
            .iter()
            .enumerate()
            .map(|(id, t)| {
                let [a, b, c] = t.map(|v| mesh.xy(v));
                TriangleEnvelope {
                    id,
                    envelope: AABB::from_corners(
                        [a[0].min(b[0]).min(c[0]), a[1].min(b[1]).min(c[1])],
                        [a[0].max(b[0]).max(c[0]), a[1].max(b[1]).max(c[1])],
                    ),
                }
            })
            .collect();

        let extent = mesh.extent();
        debug!(triangles = envelopes.len(), "Built spatial index");

        Self {
            tree: RTree::bulk_load(envelopes),
            mesh,
            extent,
        }
    }

    pub fn mesh(&self) -> &Arc<Triangulation> {
        &self.mesh
    }

    /// Lon/lat extent of the indexed data.
    pub fn data_extent(&self) -> Option<BoundingBox> {
        self.extent
    }

    /// Whether the data extent and the bounds share any point.
    pub fn overlaps_bounds(&self, bounds: &GeoBounds) -> bool {
        self.extent.map_or(false, |extent| bounds.touches(&extent))
    }

    /// Triangles whose envelope overlaps a lon/lat rectangle.
    pub fn query(&self, bbox: &BoundingBox) -> MeshSubset {
        let (min_x, min_y) = lonlat_to_mercator(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = lonlat_to_mercator(bbox.max_x, bbox.max_y);
        self.query_mercator(&BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    /// Triangles whose envelope overlaps a Web-Mercator rectangle.
    pub fn query_mercator(&self, bbox: &BoundingBox) -> MeshSubset {
        let window = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);

        let mut triangles: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&window)
            .map(|t| t.id)
            .collect();
        triangles.sort_unstable();

        let mut vertices: Vec<usize> = triangles
            .iter()
            .flat_map(|&id| self.mesh.triangle(id))
            .collect();
        vertices.sort_unstable();
        vertices.dedup();

        MeshSubset {
            triangles,
            vertices,
        }
    }

    /// Triangle containing a lon/lat point.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
        let (x, y) = lonlat_to_mercator(lon, lat);
        self.locate_mercator(x, y)
    }

    /// Triangle containing a Web-Mercator point; the lowest id wins on shared edges.
    pub fn locate_mercator(&self, x: f64, y: f64) -> Option<usize> {
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .filter(|t| {
                self.mesh
                    .barycentric(t.id, x, y)
                    .iter()
                    .all(|w| *w >= EDGE_TOLERANCE)
            })
            .map(|t| t.id)
            .min()
    }

    /// Interpolated value (value space) at a lon/lat point.
    pub fn interpolate(&self, lon: f64, lat: f64) -> Option<f64> {
        let (x, y) = lonlat_to_mercator(lon, lat);
        self.interpolate_mercator(x, y)
    }

    /// Interpolated value (value space) at a Web-Mercator point.
    pub fn interpolate_mercator(&self, x: f64, y: f64) -> Option<f64> {
        self.locate_mercator(x, y)
            .map(|id| self.mesh.interpolate_in(id, x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarField;
    use crate::triangulation::MeshOptions;

    fn ramp_index() -> SpatialIndex {
        let lats: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let lons = lats.clone();
        let mut values = Vec::new();
        for _ in &lats {
            for &lon in &lons {
                values.push(lon);
            }
        }
        let field = ScalarField::from_rectilinear(&lats, &lons, values).unwrap();
        let bounds = GeoBounds::new(-1.0, 11.0, -1.0, 11.0).unwrap();
        let mesh = Triangulation::build(&field, &bounds, &MeshOptions::default()).unwrap();
        SpatialIndex::build(Arc::new(mesh))
    }

    #[test]
    fn test_query_inside_and_outside() {
        let index = ramp_index();
        let inside = index.query(&BoundingBox::new(2.2, 2.2, 2.8, 2.8));
        assert!(!inside.is_empty());
        assert!(inside.triangles.windows(2).all(|w| w[0] < w[1]));
        assert!(inside.vertices.len() >= 3);

        let outside = index.query(&BoundingBox::new(20.0, 20.0, 30.0, 30.0));
        assert!(outside.is_empty());
        assert!(outside.vertices.is_empty());
    }

    #[test]
    fn test_data_extent() {
        let index = ramp_index();
        assert_eq!(index.data_extent(), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        assert!(index.overlaps_bounds(&GeoBounds::new(5.0, 20.0, 5.0, 20.0).unwrap()));
        assert!(!index.overlaps_bounds(&GeoBounds::new(30.0, 40.0, 5.0, 20.0).unwrap()));
    }

    #[test]
    fn test_interpolate_follows_ramp() {
        let index = ramp_index();
        let value = index.interpolate(3.25, 4.5).unwrap();
        assert!((value - 3.25).abs() < 1e-9);
        assert!(index.locate(3.25, 4.5).is_some());
        assert_eq!(index.interpolate(-0.5, 5.0), None);
    }

    #[test]
    fn test_locate_on_shared_vertex() {
        let index = ramp_index();
        assert!(index.locate(5.0, 5.0).is_some());
        let value = index.interpolate(5.0, 5.0).unwrap();
        assert!((value - 5.0).abs() < 1e-9);
    }
}
