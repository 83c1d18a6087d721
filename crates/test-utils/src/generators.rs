//! Synthetic scalar fields with predictable values.
//!
//! Generators return plain arrays so any crate can feed them to its own
//! field constructors without this crate depending on the mesh types.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A rectilinear grid: `values[i * longitudes.len() + j]` sits at
/// `(latitudes[i], longitudes[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArrays {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<f64>,
}

impl GridArrays {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set every sample for which `predicate(lat, lon)` holds to NaN.
    pub fn with_nan_where(mut self, predicate: impl Fn(f64, f64) -> bool) -> Self {
        let nlon = self.longitudes.len();
        for (i, &lat) in self.latitudes.iter().enumerate() {
            for (j, &lon) in self.longitudes.iter().enumerate() {
                if predicate(lat, lon) {
                    self.values[i * nlon + j] = f64::NAN;
                }
            }
        }
        self
    }
}

/// Scattered samples with one coordinate pair per value.
#[derive(Debug, Clone, PartialEq)]
pub struct PointArrays {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<f64>,
}

/// Evenly spaced axis from `start` to `end` inclusive.
pub fn axis(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Grid over `(lat_min, lat_max, lon_min, lon_max)` with values from `f(lat, lon)`.
pub fn grid_from_fn(
    extent: (f64, f64, f64, f64),
    nlat: usize,
    nlon: usize,
    f: impl Fn(f64, f64) -> f64,
) -> GridArrays {
    let (lat_min, lat_max, lon_min, lon_max) = extent;
    let latitudes = axis(lat_min, lat_max, nlat);
    let longitudes = axis(lon_min, lon_max, nlon);
    let mut values = Vec::with_capacity(nlat * nlon);
    for &lat in &latitudes {
        for &lon in &longitudes {
            values.push(f(lat, lon));
        }
    }
    GridArrays {
        latitudes,
        longitudes,
        values,
    }
}

/// West-to-east linear ramp from `low` at `lon_min` to `high` at `lon_max`.
pub fn ramp_grid(extent: (f64, f64, f64, f64), nlat: usize, nlon: usize, low: f64, high: f64) -> GridArrays {
    let (_, _, lon_min, lon_max) = extent;
    let span = lon_max - lon_min;
    grid_from_fn(extent, nlat, nlon, |_, lon| {
        if span == 0.0 {
            low
        } else {
            low + (high - low) * (lon - lon_min) / span
        }
    })
}

/// Gaussian bump of height `peak` centred in the extent over a `base` level.
pub fn gaussian_bump(extent: (f64, f64, f64, f64), nlat: usize, nlon: usize, base: f64, peak: f64) -> GridArrays {
    let (lat_min, lat_max, lon_min, lon_max) = extent;
    let (clat, clon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let sigma = ((lat_max - lat_min).min(lon_max - lon_min) / 6.0).max(f64::EPSILON);
    grid_from_fn(extent, nlat, nlon, |lat, lon| {
        let r2 = (lat - clat).powi(2) + (lon - clon).powi(2);
        base + peak * (-r2 / (2.0 * sigma * sigma)).exp()
    })
}

/// Grid holding the same value everywhere.
pub fn constant_grid(extent: (f64, f64, f64, f64), nlat: usize, nlon: usize, value: f64) -> GridArrays {
    grid_from_fn(extent, nlat, nlon, |_, _| value)
}

/// `count` random points inside the extent, reproducible for a given seed.
pub fn scattered_points(
    extent: (f64, f64, f64, f64),
    count: usize,
    seed: u64,
    f: impl Fn(f64, f64) -> f64,
) -> PointArrays {
    let (lat_min, lat_max, lon_min, lon_max) = extent;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut latitudes = Vec::with_capacity(count);
    let mut longitudes = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let lat = rng.gen_range(lat_min..=lat_max);
        let lon = rng.gen_range(lon_min..=lon_max);
        latitudes.push(lat);
        longitudes.push(lon);
        values.push(f(lat, lon));
    }
    PointArrays {
        latitudes,
        longitudes,
        values,
    }
}

/// Creates RGBA pixel data for a simple test pattern.
///
/// Red increases left to right, green top to bottom, blue is fixed at 128.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: (f64, f64, f64, f64) = (45.0, 65.0, -10.0, 30.0);

    #[test]
    fn test_axis_endpoints() {
        let a = axis(-10.0, 30.0, 5);
        assert_eq!(a, vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
        assert!(axis(0.0, 1.0, 0).is_empty());
        assert_eq!(axis(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn test_ramp_grid_layout() {
        let grid = ramp_grid(EXTENT, 3, 5, 0.0, 1.0);
        assert_eq!(grid.latitudes.len(), 3);
        assert_eq!(grid.longitudes.len(), 5);
        assert_eq!(grid.len(), 15);
        // Row-major by latitude: each row repeats the west-east ramp
        assert_eq!(&grid.values[0..5], &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(&grid.values[10..15], &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_gaussian_peak_at_centre() {
        let grid = gaussian_bump(EXTENT, 21, 41, 1.0, 10.0);
        let max = grid.values.iter().cloned().fold(f64::MIN, f64::max);
        let centre = grid.values[10 * 41 + 20];
        assert_eq!(max, centre);
        assert!((centre - 11.0).abs() < 1e-12);
        assert!(grid.values[0] < 1.1);
    }

    #[test]
    fn test_nan_mask() {
        let grid = constant_grid(EXTENT, 5, 5, 2.0).with_nan_where(|lat, _| lat > 60.0);
        let nans = grid.values.iter().filter(|v| v.is_nan()).count();
        assert_eq!(nans, 5);
    }

    #[test]
    fn test_scattered_points_reproducible() {
        let a = scattered_points(EXTENT, 50, 7, |lat, lon| lat + lon);
        let b = scattered_points(EXTENT, 50, 7, |lat, lon| lat + lon);
        assert_eq!(a, b);
        for (&lat, &lon) in a.latitudes.iter().zip(&a.longitudes) {
            assert!((45.0..=65.0).contains(&lat));
            assert!((-10.0..=30.0).contains(&lon));
        }
    }

    #[test]
    fn test_rgba_pattern_size() {
        let pixels = create_test_rgba_pixels(8, 4);
        assert_eq!(pixels.len(), 8 * 4 * 4);
        assert_eq!(&pixels[0..4], &[0, 0, 128, 255]);
    }
}
