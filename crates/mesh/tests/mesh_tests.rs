//! Integration tests for mesh construction over synthetic fields.

use std::sync::Arc;

use mesh::delaunay::triangulate;
use rand::{rngs::StdRng, Rng, SeedableRng};

use mesh::{MeshError, MeshOptions, ScalarField, SpatialIndex, Triangulation};
use test_utils::{assert_approx_eq, constant_grid, extents, grid_from_fn, ramp_grid, scattered_points};
use tile_common::bbox::{BoundingBox, GeoBounds};
use tile_common::style::ColorScale;

fn europe() -> GeoBounds {
    let (lat_min, lat_max, lon_min, lon_max) = extents::EUROPE;
    GeoBounds::new(lat_min, lat_max, lon_min, lon_max).unwrap()
}

#[test]
fn test_linear_field_interpolates_exactly() {
    // Linear in longitude, hence linear in Mercator x
    let grid = grid_from_fn(extents::EUROPE, 11, 21, |_, lon| 2.0 * lon + 3.0);
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let mesh = Arc::new(Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap());
    let index = SpatialIndex::build(mesh);

    for &(lon, lat) in &[(-9.5, 45.5), (0.3, 51.2), (12.7, 60.1), (29.9, 64.9)] {
        let value = index.interpolate(lon, lat).unwrap();
        assert_approx_eq!(value, 2.0 * lon + 3.0, 1e-6);
    }
    assert!(index.interpolate(31.0, 50.0).is_none());
}

#[test]
fn test_locate_returns_containing_triangle() {
    let grid = ramp_grid(extents::EUROPE, 6, 6, 0.0, 1.0);
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let mesh = Arc::new(Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap());
    let index = SpatialIndex::build(mesh.clone());

    let (lon, lat) = (7.3, 52.1);
    let id = index.locate(lon, lat).unwrap();
    let (x, y) = projection::lonlat_to_mercator(lon, lat);
    assert!(mesh.barycentric(id, x, y).iter().all(|w| *w >= -1e-9));
    assert!(index.locate(-20.0, 52.1).is_none());
}

#[test]
fn test_nan_hole_is_masked() {
    let grid = ramp_grid(extents::EUROPE, 21, 41, 0.0, 1.0)
        .with_nan_where(|lat, lon| (53.0..=57.0).contains(&lat) && (5.0..=15.0).contains(&lon));
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let mesh = Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap();

    assert_eq!(mesh.stats().missing, 5 * 11);
    assert!(mesh.stats().masked > 0);

    let index = SpatialIndex::build(Arc::new(mesh));
    assert!(index.interpolate(10.0, 55.0).is_none());
    assert!(index.interpolate(0.0, 50.0).is_some());
}

#[test]
fn test_masking_disabled_keeps_hole_triangles() {
    let grid = constant_grid(extents::EUROPE, 21, 41, 1.0)
        .with_nan_where(|lat, lon| (53.0..=57.0).contains(&lat) && (5.0..=15.0).contains(&lon));
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let options = MeshOptions {
        max_triangle_ratio: None,
        ..Default::default()
    };
    let mesh = Triangulation::build(&field, &europe(), &options).unwrap();
    assert_eq!(mesh.stats().masked, 0);

    let index = SpatialIndex::build(Arc::new(mesh));
    assert_approx_eq!(index.interpolate(10.0, 55.0).unwrap(), 1.0, 1e-12);
}

#[test]
fn test_all_missing_is_degenerate() {
    let grid = constant_grid(extents::EUROPE, 5, 5, f64::NAN);
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let err = Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap_err();
    assert!(matches!(err, MeshError::Degenerate { valid_points: 0 }));
}

#[test]
fn test_samples_outside_bounds_are_dropped() {
    let grid = ramp_grid((40.0, 70.0, -20.0, 40.0), 31, 61, 0.0, 1.0);
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let mesh = Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap();

    assert_eq!(mesh.vertex_count(), 21 * 41);
    assert_eq!(mesh.stats().outside_bounds, 31 * 61 - 21 * 41);
    let extent = mesh.extent().unwrap();
    let inside = BoundingBox::new(-10.0 - 1e-9, 45.0 - 1e-9, 30.0 + 1e-9, 65.0 + 1e-9);
    assert!(extent.min_x >= inside.min_x && extent.max_x <= inside.max_x);
}

#[test]
fn test_log_scale_drops_non_positive() {
    let grid = grid_from_fn(extents::EUROPE, 11, 11, |_, lon| lon);
    let field = ScalarField::from_rectilinear(&grid.latitudes, &grid.longitudes, grid.values).unwrap();
    let options = MeshOptions {
        scale: ColorScale::Log,
        ..Default::default()
    };
    let mesh = Triangulation::build(&field, &europe(), &options).unwrap();

    // lon -10, -6, -2 are negative; lon 2 .. 30 survive
    assert_eq!(mesh.stats().missing, 3 * 11);
    let (lo, hi) = mesh.value_range().unwrap();
    assert_approx_eq!(lo, 2.0f64.ln(), 1e-12);
    assert_approx_eq!(hi, 30.0f64.ln(), 1e-12);
}

#[test]
fn test_scattered_points_cover_their_hull() {
    let points = scattered_points(extents::EUROPE, 2_000, 11, |lat, lon| lat - lon);
    let field = ScalarField::from_mesh(points.latitudes, points.longitudes, points.values).unwrap();
    let options = MeshOptions {
        max_triangle_ratio: None,
        ..Default::default()
    };
    let mesh = Triangulation::build(&field, &europe(), &options).unwrap();

    // Euler: a triangulation of n points with h hull vertices has 2n - 2 - h triangles
    let n = mesh.vertex_count();
    assert!(mesh.triangle_count() < 2 * n);
    assert!(mesh.triangle_count() > 2 * n - 200);

    let index = SpatialIndex::build(Arc::new(mesh));
    let v = index.interpolate(10.0, 55.0).unwrap();
    assert_approx_eq!(v, 55.0 - 10.0, 1.0);
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Counter-clockwise convex hull by monotone chain, collinear points dropped.
fn convex_hull(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));

    let mut lower: Vec<[f64; 2]> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f64; 2]> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[test]
fn test_random_cloud_triangulation_fills_convex_hull() {
    for (seed, count) in [(3u64, 3_000usize), (17, 5_000)] {
        let mut rng = StdRng::seed_from_u64(seed);
        let points: Vec<[f64; 2]> = (0..count).map(|_| [rng.gen::<f64>(), rng.gen::<f64>()]).collect();

        let tris = triangulate(&points).unwrap();
        let hull = convex_hull(&points);
        assert_eq!(tris.len(), 2 * count - 2 - hull.len(), "seed {seed}");

        let covered: f64 = tris
            .iter()
            .map(|t| cross(points[t[0]], points[t[1]], points[t[2]]) / 2.0)
            .sum();
        let hull_area: f64 = (1..hull.len() - 1)
            .map(|i| cross(hull[0], hull[i], hull[i + 1]) / 2.0)
            .sum();
        assert_approx_eq!(covered, hull_area, 1e-9);
    }
}

#[test]
fn test_build_is_deterministic() {
    let points = scattered_points(extents::EUROPE, 500, 3, |lat, lon| lat * lon);
    let field = ScalarField::from_mesh(points.latitudes, points.longitudes, points.values).unwrap();
    let a = Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap();
    let b = Triangulation::build(&field, &europe(), &MeshOptions::default()).unwrap();
    assert_eq!(a.triangles(), b.triangles());
}
