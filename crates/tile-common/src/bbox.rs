//! Rectangles in lon/lat or Web-Mercator space and the validated region of a run.

use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};

/// Latitude limit of the square Web-Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// An axis-aligned rectangle.
///
/// Units depend on the caller: degrees (x = longitude, y = latitude) for
/// tile extents and field coverage, Web-Mercator meters for render windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a "minx,miny,maxx,maxy" string (west,south,east,north).
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |part: &str| -> Result<f64, BboxParseError> {
            part.parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            min_x: parse(parts[0])?,
            min_y: parse(parts[1])?,
            max_x: parse(parts[2])?,
            max_y: parse(parts[3])?,
        })
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bbox = BoundingBox::new(x0, y0, x0, y0);
        for (x, y) in iter {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Closed-interval overlap test: touching edges count as intersecting.
    pub fn touches(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Point test with edges included.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow the box by the given margins on every side.
    pub fn expand(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("expected 'min_lon,min_lat,max_lon,max_lat', got '{0}'")]
    InvalidFormat(String),

    #[error("not a number: '{0}'")]
    InvalidNumber(String),
}

/// The working region of one generation run.
///
/// Immutable once constructed; construction rejects empty or inverted
/// rectangles so every later stage can rely on `min < max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> TileResult<Self> {
        let values = [min_lat, max_lat, min_lon, max_lon];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TileError::InvalidBounds(format!(
                "non-finite coordinate in {:?}",
                values
            )));
        }
        if min_lat >= max_lat {
            return Err(TileError::InvalidBounds(format!(
                "min_lat {} must be below max_lat {}",
                min_lat, max_lat
            )));
        }
        if min_lon >= max_lon {
            return Err(TileError::InvalidBounds(format!(
                "min_lon {} must be below max_lon {}",
                min_lon, max_lon
            )));
        }
        if min_lat < -90.0 || max_lat > 90.0 {
            return Err(TileError::InvalidBounds(format!(
                "latitude range [{}, {}] outside [-90, 90]",
                min_lat, max_lat
            )));
        }
        if min_lon < -180.0 || max_lon > 180.0 {
            return Err(TileError::InvalidBounds(format!(
                "longitude range [{}, {}] outside [-180, 180] (wrap-around is not supported)",
                min_lon, max_lon
            )));
        }

        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Bounds taken from the extent of a coordinate set.
    pub fn from_extent(bbox: &BoundingBox) -> TileResult<Self> {
        Self::new(bbox.min_y, bbox.max_y, bbox.min_x, bbox.max_x)
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// The rectangle as a lon/lat box.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }

    /// The rectangle with latitudes clamped to the Web-Mercator limit.
    pub fn mercator_bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_lon,
            self.min_lat.max(-MAX_MERCATOR_LAT),
            self.max_lon,
            self.max_lat.min(MAX_MERCATOR_LAT),
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bbox().contains_point(lon, lat)
    }

    /// Inclusive-edge intersection with a lon/lat box.
    pub fn touches(&self, other: &BoundingBox) -> bool {
        self.bbox().touches(other)
    }
}

impl<'de> Deserialize<'de> for GeoBounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            min_lat: f64,
            max_lat: f64,
            min_lon: f64,
            max_lon: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoBounds::new(raw.min_lat, raw.max_lat, raw.min_lon, raw.max_lon)
            .map_err(serde::de::Error::custom)
    }
}
