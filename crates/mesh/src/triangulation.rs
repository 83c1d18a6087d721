//! Triangle mesh over the valid samples of a field.
//!
//! The mesh is an arena: flat vertex and triangle vectors built once per run
//! and then only read. Vertices carry both geographic and Web-Mercator
//! coordinates; values are stored in value space (after the color scale
//! transform) so band clipping and interpolation need no further mapping.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use projection::lonlat_to_mercator;
use tile_common::bbox::{BoundingBox, GeoBounds, MAX_MERCATOR_LAT};
use tile_common::style::ColorScale;

use crate::delaunay::{orient, triangulate};
use crate::error::{MeshError, MeshResult};
use crate::field::ScalarField;

/// Default ratio of a triangle's area to the median area above which it is masked.
pub const DEFAULT_MAX_TRIANGLE_RATIO: f64 = 3.0;

/// Options for building the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Value transform applied before triangulation
    pub scale: ColorScale,
    /// Mask triangles larger than this multiple of the median area; `None` keeps all
    pub max_triangle_ratio: Option<f64>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            scale: ColorScale::Linear,
            max_triangle_ratio: Some(DEFAULT_MAX_TRIANGLE_RATIO),
        }
    }
}

/// Counts gathered while building the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeshStats {
    pub samples: usize,
    pub missing: usize,
    pub outside_bounds: usize,
    pub duplicates: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub masked: usize,
}

/// Immutable triangle mesh with per-vertex values.
#[derive(Debug, Clone)]
pub struct Triangulation {
    lonlat: Vec<[f64; 2]>,
    xy: Vec<[f64; 2]>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    stats: MeshStats,
}

impl Triangulation {
    /// Build the mesh from the samples of `field` that fall within `bounds`.
    pub fn build(field: &ScalarField, bounds: &GeoBounds, options: &MeshOptions) -> MeshResult<Self> {
        let mut stats = MeshStats {
            samples: field.len(),
            ..Default::default()
        };

        let mut kept: Vec<(f64, f64, f64)> = Vec::with_capacity(field.len());
        for (lat, lon, value) in field.samples() {
            let value = match options.scale.transform(value) {
                Some(v) => v,
                None => {
                    stats.missing += 1;
                    continue;
                }
            };
            if !lat.is_finite()
                || !lon.is_finite()
                || !bounds.contains(lat, lon)
                || lat.abs() > MAX_MERCATOR_LAT
            {
                stats.outside_bounds += 1;
                continue;
            }
            kept.push((lon, lat, value));
        }

        // Collapse duplicate coordinates; the earliest sample wins.
        let mut order: Vec<usize> = (0..kept.len()).collect();
        order.sort_by(|&a, &b| {
            kept[a]
                .0
                .total_cmp(&kept[b].0)
                .then(kept[a].1.total_cmp(&kept[b].1))
                .then(a.cmp(&b))
        });
        order.dedup_by(|next, prev| kept[*next].0 == kept[*prev].0 && kept[*next].1 == kept[*prev].1);
        stats.duplicates = kept.len() - order.len();
        order.sort_unstable();

        let lonlat: Vec<[f64; 2]> = order.iter().map(|&i| [kept[i].0, kept[i].1]).collect();
        let values: Vec<f64> = order.iter().map(|&i| kept[i].2).collect();
        let xy: Vec<[f64; 2]> = lonlat
            .iter()
            .map(|p| {
                let (x, y) = lonlat_to_mercator(p[0], p[1]);
                [x, y]
            })
            .collect();
        stats.vertices = xy.len();

        debug!(
            samples = stats.samples,
            missing = stats.missing,
            outside_bounds = stats.outside_bounds,
            duplicates = stats.duplicates,
            "Prepared field samples"
        );

        let mut triangles = triangulate(&xy)?;

        if let Some(ratio) = options.max_triangle_ratio {
            let before = triangles.len();
            triangles = mask_large_triangles(&lonlat, triangles, ratio);
            stats.masked = before - triangles.len();
        }

        if triangles.is_empty() {
            return Err(MeshError::Degenerate {
                valid_points: stats.vertices,
            });
        }
        stats.triangles = triangles.len();

        info!(
            vertices = stats.vertices,
            triangles = stats.triangles,
            masked = stats.masked,
            "Built triangulation"
        );

        Ok(Self {
            lonlat,
            xy,
            values,
            triangles,
            stats,
        })
    }

    pub fn stats(&self) -> &MeshStats {
        &self.stats
    }

    pub fn vertex_count(&self) -> usize {
        self.values.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn triangle(&self, id: usize) -> [usize; 3] {
        self.triangles[id]
    }

    /// Web-Mercator position of a vertex.
    pub fn xy(&self, vertex: usize) -> [f64; 2] {
        self.xy[vertex]
    }

    /// Value of a vertex in value space.
    pub fn value(&self, vertex: usize) -> f64 {
        self.values[vertex]
    }

    /// (min, max) of the vertex values in value space.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Lon/lat extent of the vertices.
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.lonlat.iter().map(|p| (p[0], p[1])))
    }

    /// Barycentric weights of Mercator point (x, y) in triangle `id`.
    pub fn barycentric(&self, id: usize, x: f64, y: f64) -> [f64; 3] {
        let [a, b, c] = self.triangles[id];
        let (pa, pb, pc) = (self.xy[a], self.xy[b], self.xy[c]);
        let total = orient(pa, pb, pc);
        let p = [x, y];
        [
            orient(p, pb, pc) / total,
            orient(pa, p, pc) / total,
            orient(pa, pb, p) / total,
        ]
    }

    /// Linear interpolation of the vertex values at (x, y) within triangle `id`.
    pub fn interpolate_in(&self, id: usize, x: f64, y: f64) -> f64 {
        let [a, b, c] = self.triangles[id];
        let [wa, wb, wc] = self.barycentric(id, x, y);
        wa * self.values[a] + wb * self.values[b] + wc * self.values[c]
    }
}

/// Drop triangles whose lon/lat area exceeds `ratio` times the median area.
///
/// Long thin triangles spanning gaps in the data (land, swath edges) are
/// much larger than the regular mesh cells and would otherwise bridge them.
fn mask_large_triangles(lonlat: &[[f64; 2]], triangles: Vec<[usize; 3]>, ratio: f64) -> Vec<[usize; 3]> {
    let areas: Vec<f64> = triangles
        .iter()
        .map(|t| orient(lonlat[t[0]], lonlat[t[1]], lonlat[t[2]]).abs() / 2.0)
        .collect();

    let mut sorted = areas.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let median = sorted[sorted.len() / 2];
    let limit = ratio * median;

    triangles
        .into_iter()
        .zip(areas)
        .filter(|(_, area)| *area <= limit)
        .map(|(t, _)| t)
        .collect()
}
