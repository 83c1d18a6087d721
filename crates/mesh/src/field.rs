//! Scalar field input: (latitude, longitude, value) samples.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// Ordered geophysical samples. Values may be NaN (missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Vec<f64>,
}

impl ScalarField {
    /// One coordinate pair per sample (curvilinear grids, swaths, scattered points).
    pub fn from_mesh(latitudes: Vec<f64>, longitudes: Vec<f64>, values: Vec<f64>) -> MeshResult<Self> {
        if latitudes.len() != values.len() || longitudes.len() != values.len() {
            return Err(MeshError::InvalidInput(format!(
                "coordinate lengths (lat {}, lon {}) do not match {} values",
                latitudes.len(),
                longitudes.len(),
                values.len()
            )));
        }
        Ok(Self {
            latitudes,
            longitudes,
            values,
        })
    }

    /// 1D axes broadcast over a row-major `values[lat][lon]` grid.
    ///
    /// Axes may be ascending or descending.
    pub fn from_rectilinear(latitudes: &[f64], longitudes: &[f64], values: Vec<f64>) -> MeshResult<Self> {
        let expected = latitudes.len() * longitudes.len();
        if values.len() != expected {
            return Err(MeshError::InvalidInput(format!(
                "{} values cannot fill a {}x{} grid",
                values.len(),
                latitudes.len(),
                longitudes.len()
            )));
        }

        let mut lats = Vec::with_capacity(expected);
        let mut lons = Vec::with_capacity(expected);
        for &lat in latitudes {
            for &lon in longitudes {
                lats.push(lat);
                lons.push(lon);
            }
        }
        Ok(Self {
            latitudes: lats,
            longitudes: lons,
            values,
        })
    }

    /// Mesh when all lengths match, otherwise a rectilinear broadcast.
    pub fn from_arrays(values: Vec<f64>, latitudes: Vec<f64>, longitudes: Vec<f64>) -> MeshResult<Self> {
        if latitudes.len() == values.len() && longitudes.len() == values.len() {
            Self::from_mesh(latitudes, longitudes, values)
        } else {
            Self::from_rectilinear(&latitudes, &longitudes, values)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples as (lat, lon, value).
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .zip(&self.values)
            .map(|((&lat, &lon), &value)| (lat, lon, value))
    }

    /// Number of samples holding a finite value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}
