//! Style configuration for rendering scalar fields as filled contours.
//!
//! A [`StyleConfig`] is the caller-supplied description of how a field is
//! colored: colormap, contour levels, value range, color scale and the
//! fragment filter. It is immutable for a run and is resolved once into a
//! [`ResolvedStyle`] (levels in value space plus a precomputed color per
//! band) before any tile is rendered.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::tile::TILE_SIZE;

/// Caller-supplied style for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Colormap name (e.g. "viridis", "RdBu_r") or explicit color stops
    #[serde(default = "default_colormap")]
    pub colormap: ColormapSpec,

    /// Contour levels: a count spread over [vmin, vmax] or explicit values
    #[serde(default)]
    pub levels: LevelSpec,

    /// Lower end of the color range; derived from the data when absent.
    /// If only this bound is set and it lies above the data, the range is `[vmin, vmin + 1]`.
    #[serde(default)]
    pub vmin: Option<f64>,

    /// Upper end of the color range; derived from the data when absent.
    /// If only this bound is set and it lies below the data, the range is `[vmax - 1, vmax]`.
    #[serde(default)]
    pub vmax: Option<f64>,

    /// Linear or logarithmic value-to-color mapping
    #[serde(default)]
    pub scale: ColorScale,

    /// How values outside the outermost levels are colored
    #[serde(default)]
    pub extend: Extend,

    /// Output tile edge in pixels (only 256 is supported)
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,

    /// Contour fragments with fewer outline vertices than this are dropped
    #[serde(default)]
    pub min_vertices: usize,

    /// Optional iso-lines stroked on top of the filled bands
    #[serde(default)]
    pub contour_lines: Option<ContourLineStyle>,

    /// Antialias polygon edges (off by default so bands tile without seams)
    #[serde(default)]
    pub antialias: bool,
}

fn default_colormap() -> ColormapSpec {
    ColormapSpec::Named("viridis".to_string())
}

fn default_tile_size() -> u32 {
    TILE_SIZE
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            colormap: default_colormap(),
            levels: LevelSpec::default(),
            vmin: None,
            vmax: None,
            scale: ColorScale::Linear,
            extend: Extend::Both,
            tile_size: TILE_SIZE,
            min_vertices: 0,
            contour_lines: None,
            antialias: false,
        }
    }
}

impl StyleConfig {
    /// Load style configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StyleError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse style configuration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let style: StyleConfig =
            serde_json::from_str(json).map_err(|e| StyleError::ParseError(e.to_string()))?;
        style.validate()?;
        Ok(style)
    }

    /// Built-in styles of the sea-state products.
    ///
    /// - `ssh`: sea level anomaly, RdBu over ±0.75 m
    /// - `sst`: sea surface temperature, viridis over 10–28 °C
    /// - `chlorophyll`: log-scaled nipy_spectral over e^±4.6 mg m⁻³, 50 levels
    /// - `bathymetry`: ocean colormap every 100 m with iso-lines every 500 m
    pub fn preset(name: &str) -> Option<Self> {
        let style = match name.to_lowercase().as_str() {
            "ssh" | "sla" => StyleConfig {
                colormap: ColormapSpec::Named("RdBu".to_string()),
                vmin: Some(-0.75),
                vmax: Some(0.75),
                ..Default::default()
            },
            "sst" | "ostia" => StyleConfig {
                colormap: ColormapSpec::Named("viridis".to_string()),
                vmin: Some(10.0),
                vmax: Some(28.0),
                ..Default::default()
            },
            "chlorophyll" | "chl" | "globcolour" => StyleConfig {
                colormap: ColormapSpec::Named("nipy_spectral".to_string()),
                levels: LevelSpec::Count(50),
                vmin: Some((-4.6f64).exp()),
                vmax: Some(4.6f64.exp()),
                scale: ColorScale::Log,
                ..Default::default()
            },
            "bathymetry" | "gebco" => StyleConfig {
                colormap: ColormapSpec::Named("ocean".to_string()),
                levels: LevelSpec::Values(arange(-6000.0, 100.0, 100.0)),
                vmin: Some(-6000.0),
                vmax: Some(0.0),
                contour_lines: Some(ContourLineStyle {
                    levels: LevelSpec::Values(arange(-6000.0, 0.0, 500.0)),
                    line_width: 0.5,
                    color: Color::Named("black".to_string()),
                }),
                ..Default::default()
            },
            _ => return None,
        };
        Some(style)
    }

    /// Validate the parts of the style that do not depend on the data.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.tile_size != TILE_SIZE {
            return Err(StyleError::ValidationError(format!(
                "tile_size must be {}, got {}",
                TILE_SIZE, self.tile_size
            )));
        }

        self.colormap.build()?;
        self.levels.validate("levels")?;

        for (name, value) in [("vmin", self.vmin), ("vmax", self.vmax)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(StyleError::ValidationError(format!("{} must be finite", name)));
                }
                if self.scale == ColorScale::Log && v <= 0.0 {
                    return Err(StyleError::ValidationError(format!(
                        "{} must be positive under log scale, got {}",
                        name, v
                    )));
                }
            }
        }

        if let (Some(vmin), Some(vmax)) = (self.vmin, self.vmax) {
            if vmin >= vmax {
                return Err(StyleError::ValidationError(format!(
                    "vmin {} must be below vmax {}",
                    vmin, vmax
                )));
            }
        }

        if self.scale == ColorScale::Log {
            if let LevelSpec::Values(values) = &self.levels {
                if values.iter().any(|v| *v <= 0.0) {
                    return Err(StyleError::ValidationError(
                        "explicit levels must be positive under log scale".to_string(),
                    ));
                }
            }
        }

        if let Some(lines) = &self.contour_lines {
            lines.levels.validate("contour_lines.levels")?;
            if !(lines.line_width > 0.0) {
                return Err(StyleError::ValidationError(
                    "contour line width must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve the style against the value range of the prepared field.
    ///
    /// `data_range` is the (min, max) of the valid samples in value space,
    /// i.e. after the color scale transform. It fills in a missing vmin/vmax.
    pub fn resolve(&self, data_range: Option<(f64, f64)>) -> Result<ResolvedStyle, StyleError> {
        self.validate()?;

        let colormap = self.colormap.build()?;
        let explicit_min = self.vmin.and_then(|v| self.scale.transform(v));
        let explicit_max = self.vmax.and_then(|v| self.scale.transform(v));

        let (mut vmin, mut vmax) = match (explicit_min, explicit_max, data_range) {
            (Some(lo), Some(hi), _) => (lo, hi),
            // A one-sided bound beyond the data: derive the other side from it.
            (Some(lo), None, Some((_, data_hi))) if data_hi < lo => {
                warn!(vmin = lo, data_max = data_hi, "vmin above the data maximum, using vmin + 1");
                (lo, lo + 1.0)
            }
            (None, Some(hi), Some((data_lo, _))) if data_lo > hi => {
                warn!(vmax = hi, data_min = data_lo, "vmax below the data minimum, using vmax - 1");
                (hi - 1.0, hi)
            }
            (lo, hi, Some((data_lo, data_hi))) => (lo.unwrap_or(data_lo), hi.unwrap_or(data_hi)),
            (_, _, None) => {
                return Err(StyleError::ValidationError(
                    "vmin/vmax missing and no valid data to derive them from".to_string(),
                ))
            }
        };

        if vmin > vmax {
            return Err(StyleError::ValidationError(format!(
                "derived range is inverted: [{}, {}]",
                vmin, vmax
            )));
        }
        if vmin == vmax {
            // Constant field: open the range so the single value lands mid-map.
            warn!(value = vmin, "Degenerate color range, widening by 0.5 on each side");
            vmin -= 0.5;
            vmax += 0.5;
        }

        let levels = self.levels.resolve(vmin, vmax, self.scale)?;
        let bands = BandSet::new(levels, self.extend, &colormap, vmin, vmax);
        debug!(vmin, vmax, bands = bands.len(), "Resolved style");

        let contour_lines = match &self.contour_lines {
            Some(lines) => Some(ResolvedContourLines {
                levels: lines.levels.resolve(vmin, vmax, self.scale)?,
                line_width: lines.line_width,
                color: lines.color.to_rgba_array(),
            }),
            None => None,
        };

        Ok(ResolvedStyle {
            scale: self.scale,
            vmin,
            vmax,
            bands,
            min_vertices: self.min_vertices,
            antialias: self.antialias,
            contour_lines,
        })
    }
}

/// Values from `start` (inclusive) to `stop` (exclusive) in `step` increments.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// `count` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Contour level specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    /// Number of levels spread evenly over [vmin, vmax], both ends included
    Count(usize),
    /// Explicit level values in data units
    Values(Vec<f64>),
}

impl Default for LevelSpec {
    fn default() -> Self {
        LevelSpec::Count(20)
    }
}

impl LevelSpec {
    fn validate(&self, what: &str) -> Result<(), StyleError> {
        match self {
            LevelSpec::Count(n) if *n < 2 => Err(StyleError::ValidationError(format!(
                "{} count must be at least 2, got {}",
                what, n
            ))),
            LevelSpec::Count(_) => Ok(()),
            LevelSpec::Values(values) => {
                if values.is_empty() {
                    return Err(StyleError::ValidationError(format!("{} list is empty", what)));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(StyleError::ValidationError(format!(
                        "{} must be finite",
                        what
                    )));
                }
                if values.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(StyleError::ValidationError(format!(
                        "{} must be strictly ascending",
                        what
                    )));
                }
                Ok(())
            }
        }
    }

    /// Levels in value space (after the scale transform).
    fn resolve(&self, vmin: f64, vmax: f64, scale: ColorScale) -> Result<Vec<f64>, StyleError> {
        match self {
            LevelSpec::Count(n) => Ok(linspace(vmin, vmax, *n)),
            LevelSpec::Values(values) => values
                .iter()
                .map(|v| {
                    scale.transform(*v).ok_or_else(|| {
                        StyleError::ValidationError(format!("level {} has no {:?} value", v, scale))
                    })
                })
                .collect(),
        }
    }
}

/// Value-to-color scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScale {
    #[default]
    Linear,
    /// Natural logarithm; non-positive values are treated as missing
    Log,
}

impl ColorScale {
    /// Map a data value into value space, `None` when it has no image.
    pub fn transform(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self {
            ColorScale::Linear => Some(value),
            ColorScale::Log if value > 0.0 => Some(value.ln()),
            ColorScale::Log => None,
        }
    }
}

/// Treatment of values outside the outermost contour levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extend {
    /// Below-range values take the low end color, above-range the high end
    #[default]
    Both,
    /// Out-of-range values are left transparent
    Neither,
    /// Only below-range values are colored
    Min,
    /// Only above-range values are colored
    Max,
}

impl Extend {
    fn below(&self) -> bool {
        matches!(self, Extend::Both | Extend::Min)
    }

    fn above(&self) -> bool {
        matches!(self, Extend::Both | Extend::Max)
    }
}

/// Iso-line overlay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourLineStyle {
    /// Levels to draw lines at
    pub levels: LevelSpec,

    /// Line width in pixels
    #[serde(default = "default_line_width")]
    pub line_width: f32,

    /// Line color
    #[serde(default = "default_line_color")]
    pub color: Color,
}

fn default_line_width() -> f32 {
    1.0
}

fn default_line_color() -> Color {
    Color::Named("black".to_string())
}

/// A style resolved against the data: everything a tile renderer needs.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub scale: ColorScale,
    /// Color range in value space
    pub vmin: f64,
    pub vmax: f64,
    pub bands: BandSet,
    pub min_vertices: usize,
    pub antialias: bool,
    pub contour_lines: Option<ResolvedContourLines>,
}

/// Iso-line overlay in value space.
#[derive(Debug, Clone)]
pub struct ResolvedContourLines {
    pub levels: Vec<f64>,
    pub line_width: f32,
    pub color: [u8; 4],
}

/// One filled-contour band: a half-open value interval and its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Lower bound (inclusive), `-inf` for the below-range band
    pub lower: f64,
    /// Upper bound, `+inf` for the above-range band
    pub upper: f64,
    pub color: [u8; 4],
}

/// Ordered, non-overlapping bands covering the colored value range.
#[derive(Debug, Clone)]
pub struct BandSet {
    levels: Vec<f64>,
    bands: Vec<Band>,
    has_below: bool,
    has_above: bool,
}

impl BandSet {
    /// Build bands from levels, coloring interior bands at their midpoint.
    pub fn new(levels: Vec<f64>, extend: Extend, colormap: &Colormap, vmin: f64, vmax: f64) -> Self {
        let span = vmax - vmin;
        let normalize = |v: f64| {
            if span > 0.0 {
                ((v - vmin) / span).clamp(0.0, 1.0)
            } else {
                0.5
            }
        };

        let mut bands = Vec::with_capacity(levels.len() + 1);
        let has_below = extend.below() && !levels.is_empty();
        let has_above = extend.above() && !levels.is_empty();

        if has_below {
            bands.push(Band {
                lower: f64::NEG_INFINITY,
                upper: levels[0],
                color: colormap.at(0.0),
            });
        }
        for pair in levels.windows(2) {
            let mid = 0.5 * (pair[0] + pair[1]);
            bands.push(Band {
                lower: pair[0],
                upper: pair[1],
                color: colormap.at(normalize(mid)),
            });
        }
        if has_above {
            if let Some(&last) = levels.last() {
                bands.push(Band {
                    lower: last,
                    upper: f64::INFINITY,
                    color: colormap.at(1.0),
                });
            }
        }

        Self {
            levels,
            bands,
            has_below,
            has_above,
        }
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Index of the band holding `value`, `None` for missing or uncolored values.
    ///
    /// Bands are closed below and open above, except that the top level
    /// belongs to the highest interior band when there is no above-range band.
    pub fn band_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() || self.levels.is_empty() {
            return None;
        }

        // Number of levels at or below the value: 0 = below range, n = above.
        let n = self.levels.len();
        let mut slot = self.levels.partition_point(|l| *l <= value);

        if slot == n && !self.has_above && n >= 2 && value == self.levels[n - 1] {
            slot = n - 1;
        }

        if slot == 0 {
            return if self.has_below { Some(0) } else { None };
        }
        if slot == n && !self.has_above {
            return None;
        }

        let offset = if self.has_below { 0 } else { 1 };
        Some(slot - offset)
    }

    /// Color for a value, `None` when it falls outside every band.
    pub fn color_for(&self, value: f64) -> Option<[u8; 4]> {
        self.band_index(value).map(|i| self.bands[i].color)
    }
}

/// Colormap given by name or by explicit stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColormapSpec {
    Named(String),
    Stops(Vec<ColorStop>),
}

impl ColormapSpec {
    pub fn build(&self) -> Result<Colormap, StyleError> {
        match self {
            ColormapSpec::Named(name) => Colormap::from_name(name),
            ColormapSpec::Stops(stops) => Colormap::from_stops(stops),
        }
    }
}

/// A color stop in a colormap, positioned on [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Color,
}

/// Piecewise-linear colormap over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<(f64, [u8; 4])>,
}

const VIRIDIS: &[(f64, [u8; 3])] = &[
    (0.0, [68, 1, 84]),
    (0.1, [72, 36, 117]),
    (0.2, [65, 68, 135]),
    (0.3, [53, 95, 141]),
    (0.4, [42, 120, 142]),
    (0.5, [33, 145, 140]),
    (0.6, [34, 168, 132]),
    (0.7, [68, 191, 112]),
    (0.8, [122, 209, 81]),
    (0.9, [189, 223, 38]),
    (1.0, [253, 231, 37]),
];

const RDBU: &[(f64, [u8; 3])] = &[
    (0.0, [103, 0, 31]),
    (0.1, [178, 24, 43]),
    (0.2, [214, 96, 77]),
    (0.3, [244, 165, 130]),
    (0.4, [253, 219, 199]),
    (0.5, [247, 247, 247]),
    (0.6, [209, 229, 240]),
    (0.7, [146, 197, 222]),
    (0.8, [67, 147, 195]),
    (0.9, [33, 102, 172]),
    (1.0, [5, 48, 97]),
];

const NIPY_SPECTRAL: &[(f64, [u8; 3])] = &[
    (0.00, [0, 0, 0]),
    (0.05, [119, 0, 136]),
    (0.10, [136, 0, 153]),
    (0.15, [0, 0, 170]),
    (0.20, [0, 0, 221]),
    (0.25, [0, 119, 221]),
    (0.30, [0, 153, 221]),
    (0.35, [0, 170, 170]),
    (0.40, [0, 170, 136]),
    (0.45, [0, 153, 0]),
    (0.50, [0, 187, 0]),
    (0.55, [0, 221, 0]),
    (0.60, [0, 255, 0]),
    (0.65, [187, 255, 0]),
    (0.70, [238, 238, 0]),
    (0.75, [255, 204, 0]),
    (0.80, [255, 153, 0]),
    (0.85, [255, 0, 0]),
    (0.90, [221, 0, 0]),
    (0.95, [204, 0, 0]),
    (1.00, [204, 204, 204]),
];

const OCEAN: &[(f64, [u8; 3])] = &[
    (0.0, [0, 128, 0]),
    (1.0 / 3.0, [0, 0, 85]),
    (2.0 / 3.0, [0, 128, 170]),
    (1.0, [255, 255, 255]),
];

const GRAY: &[(f64, [u8; 3])] = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

impl Colormap {
    /// Look up a built-in colormap; a `_r` suffix reverses it.
    pub fn from_name(name: &str) -> Result<Self, StyleError> {
        let lower = name.to_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };

        // "greys" runs light to dark, the other way round from "gray".
        let (table, flipped) = match base {
            "viridis" => (VIRIDIS, false),
            "rdbu" => (RDBU, false),
            "nipy_spectral" | "spectral" => (NIPY_SPECTRAL, false),
            "ocean" => (OCEAN, false),
            "gray" | "grey" => (GRAY, false),
            "greys" => (GRAY, true),
            _ => return Err(StyleError::UnknownColormap(name.to_string())),
        };

        let colormap = Colormap {
            stops: table
                .iter()
                .map(|(pos, [r, g, b])| (*pos, [*r, *g, *b, 255]))
                .collect(),
        };
        Ok(if reversed != flipped { colormap.reversed() } else { colormap })
    }

    /// Build from explicit stops (positions ascending on [0, 1]).
    pub fn from_stops(stops: &[ColorStop]) -> Result<Self, StyleError> {
        if stops.len() < 2 {
            return Err(StyleError::ValidationError(
                "colormap must have at least 2 color stops".to_string(),
            ));
        }
        for i in 1..stops.len() {
            if stops[i].position <= stops[i - 1].position {
                return Err(StyleError::ValidationError(
                    "color stops must be in ascending position order".to_string(),
                ));
            }
        }
        if stops.iter().any(|s| !(0.0..=1.0).contains(&s.position)) {
            return Err(StyleError::ValidationError(
                "color stop positions must lie in [0, 1]".to_string(),
            ));
        }

        Ok(Colormap {
            stops: stops
                .iter()
                .map(|s| (s.position, s.color.to_rgba_array()))
                .collect(),
        })
    }

    pub fn reversed(&self) -> Self {
        Colormap {
            stops: self
                .stops
                .iter()
                .rev()
                .map(|(pos, color)| (1.0 - pos, *color))
                .collect(),
        }
    }

    /// Color at normalized position `t`, clamped to the end colors.
    pub fn at(&self, t: f64) -> [u8; 4] {
        let t = if t.is_nan() { 0.0 } else { t };
        let (first_pos, first) = self.stops[0];
        let (last_pos, last) = self.stops[self.stops.len() - 1];
        if t <= first_pos {
            return first;
        }
        if t >= last_pos {
            return last;
        }

        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let f = (t - p0) / (p1 - p0);
                let lerp = |a: u8, b: u8| ((a as f64) * (1.0 - f) + (b as f64) * f).round() as u8;
                return [
                    lerp(c0[0], c1[0]),
                    lerp(c0[1], c1[1]),
                    lerp(c0[2], c1[2]),
                    lerp(c0[3], c1[3]),
                ];
            }
        }
        last
    }
}

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },

    /// Hex string "#RRGGBB" / "#RRGGBBAA", or a color name
    Named(String),
}

impl Color {
    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert to RGBA tuple.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        match self {
            Color::Named(s) if s.starts_with('#') => parse_hex_color(s),
            Color::Named(name) => named_color(name),
            Color::Array(arr) => {
                let r = arr.first().copied().unwrap_or(0);
                let g = arr.get(1).copied().unwrap_or(0);
                let b = arr.get(2).copied().unwrap_or(0);
                let a = arr.get(3).copied().unwrap_or(255);
                (r, g, b, a)
            }
            Color::Rgba { r, g, b, a } => (*r, *g, *b, *a),
        }
    }

    pub fn to_rgba_array(&self) -> [u8; 4] {
        let (r, g, b, a) = self.to_rgba();
        [r, g, b, a]
    }
}

fn parse_hex_color(s: &str) -> (u8, u8, u8, u8) {
    let s = s.trim_start_matches('#');
    let channel = |i: usize, default: u8| {
        s.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(default)
    };

    match s.len() {
        6 => (channel(0, 0), channel(2, 0), channel(4, 0), 255),
        8 => (channel(0, 0), channel(2, 0), channel(4, 0), channel(6, 255)),
        _ => (0, 0, 0, 255),
    }
}

fn named_color(name: &str) -> (u8, u8, u8, u8) {
    match name.to_lowercase().as_str() {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 255, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "cyan" => (0, 255, 255, 255),
        "magenta" => (255, 0, 255, 255),
        "orange" => (255, 165, 0, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        _ => (0, 0, 0, 255),
    }
}

/// Style-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_and_arange() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(10.0, 28.0, 2), vec![10.0, 28.0]);
        assert_eq!(arange(-6000.0, 100.0, 100.0).len(), 61);
        assert_eq!(arange(-6000.0, 0.0, 500.0).last(), Some(&-500.0));
        assert!(arange(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_parse_style_json() {
        let json = r##"{
            "colormap": "RdBu_r",
            "levels": [0, 5, 10],
            "vmin": 0,
            "vmax": 10,
            "extend": "neither",
            "min_vertices": 12,
            "contour_lines": {"levels": 4, "line_width": 2.0, "color": "#FF000080"}
        }"##;

        let style = StyleConfig::from_json(json).unwrap();
        assert_eq!(style.levels, LevelSpec::Values(vec![0.0, 5.0, 10.0]));
        assert_eq!(style.extend, Extend::Neither);
        assert_eq!(style.min_vertices, 12);
        let lines = style.contour_lines.as_ref().unwrap();
        assert_eq!(lines.levels, LevelSpec::Count(4));
        assert_eq!(lines.color.to_rgba(), (255, 0, 0, 128));
    }

    #[test]
    fn test_parse_custom_stops() {
        let json = r##"{"colormap": [
            {"position": 0.0, "color": "blue"},
            {"position": 1.0, "color": [255, 0, 0]}
        ], "levels": 3}"##;
        let style = StyleConfig::from_json(json).unwrap();
        let cmap = style.colormap.build().unwrap();
        assert_eq!(cmap.at(0.0), [0, 0, 255, 255]);
        assert_eq!(cmap.at(1.0), [255, 0, 0, 255]);
        assert_eq!(cmap.at(0.5), [128, 0, 128, 255]);
    }

    #[test]
    fn test_validation_errors() {
        let inverted = StyleConfig {
            vmin: Some(5.0),
            vmax: Some(1.0),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let log_negative = StyleConfig {
            vmin: Some(-1.0),
            vmax: Some(1.0),
            scale: ColorScale::Log,
            ..Default::default()
        };
        assert!(log_negative.validate().is_err());

        let bad_size = StyleConfig {
            tile_size: 512,
            ..Default::default()
        };
        assert!(bad_size.validate().is_err());

        let unknown = StyleConfig {
            colormap: ColormapSpec::Named("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(unknown.validate(), Err(StyleError::UnknownColormap(_))));

        let descending = StyleConfig {
            levels: LevelSpec::Values(vec![3.0, 2.0]),
            ..Default::default()
        };
        assert!(descending.validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["ssh", "sst", "chlorophyll", "bathymetry"] {
            let style = StyleConfig::preset(name).unwrap();
            style.validate().unwrap();
        }
        assert!(StyleConfig::preset("wind").is_none());
    }

    #[test]
    fn test_out_of_range_clamps_to_end_colors() {
        let style = StyleConfig::preset("sst").unwrap();
        let resolved = style.resolve(None).unwrap();
        let cmap = Colormap::from_name("viridis").unwrap();

        assert_eq!(resolved.bands.color_for(50.0), Some(cmap.at(1.0)));
        assert_eq!(resolved.bands.color_for(-5.0), Some(cmap.at(0.0)));
        assert_eq!(resolved.bands.color_for(50.0), Some([253, 231, 37, 255]));
        assert_eq!(resolved.bands.color_for(-5.0), Some([68, 1, 84, 255]));
    }

    #[test]
    fn test_extend_neither_leaves_out_of_range_uncolored() {
        let style = StyleConfig {
            levels: LevelSpec::Values(vec![0.0, 1.0, 2.0]),
            vmin: Some(0.0),
            vmax: Some(2.0),
            extend: Extend::Neither,
            ..Default::default()
        };
        let resolved = style.resolve(None).unwrap();
        let bands = &resolved.bands;
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.band_index(-0.1), None);
        assert_eq!(bands.band_index(0.0), Some(0));
        assert_eq!(bands.band_index(1.5), Some(1));
        assert_eq!(bands.band_index(2.0), Some(1));
        assert_eq!(bands.band_index(2.1), None);
        assert_eq!(bands.band_index(f64::NAN), None);
    }

    #[test]
    fn test_band_index_with_extend_both() {
        let style = StyleConfig {
            levels: LevelSpec::Values(vec![0.0, 1.0, 2.0]),
            vmin: Some(0.0),
            vmax: Some(2.0),
            ..Default::default()
        };
        let bands = style.resolve(None).unwrap().bands;
        assert_eq!(bands.len(), 4);
        assert_eq!(bands.band_index(-3.0), Some(0));
        assert_eq!(bands.band_index(0.5), Some(1));
        assert_eq!(bands.band_index(1.0), Some(2));
        assert_eq!(bands.band_index(2.0), Some(3));
        assert_eq!(bands.bands()[0].lower, f64::NEG_INFINITY);
        assert_eq!(bands.bands()[3].upper, f64::INFINITY);
    }

    #[test]
    fn test_log_scale_resolution() {
        let style = StyleConfig::preset("chlorophyll").unwrap();
        let resolved = style.resolve(None).unwrap();
        assert!((resolved.vmin + 4.6).abs() < 1e-12);
        assert!((resolved.vmax - 4.6).abs() < 1e-12);
        assert_eq!(resolved.bands.levels().len(), 50);
        assert_eq!(ColorScale::Log.transform(0.0), None);
        assert_eq!(ColorScale::Log.transform(-2.0), None);
        assert_eq!(ColorScale::Log.transform(1.0), Some(0.0));
    }

    #[test]
    fn test_auto_range_from_data() {
        let style = StyleConfig::default();
        let resolved = style.resolve(Some((2.0, 4.0))).unwrap();
        assert_eq!(resolved.vmin, 2.0);
        assert_eq!(resolved.vmax, 4.0);
        assert_eq!(resolved.bands.levels().first(), Some(&2.0));
        assert_eq!(resolved.bands.levels().last(), Some(&4.0));

        let constant = style.resolve(Some((3.0, 3.0))).unwrap();
        assert_eq!((constant.vmin, constant.vmax), (2.5, 3.5));

        assert!(style.resolve(None).is_err());
    }

    #[test]
    fn test_one_sided_bound_outside_data_range() {
        let above = StyleConfig {
            vmin: Some(10.0),
            ..Default::default()
        };
        let resolved = above.resolve(Some((2.0, 4.0))).unwrap();
        assert_eq!((resolved.vmin, resolved.vmax), (10.0, 11.0));

        let below = StyleConfig {
            vmax: Some(-3.0),
            ..Default::default()
        };
        let resolved = below.resolve(Some((2.0, 4.0))).unwrap();
        assert_eq!((resolved.vmin, resolved.vmax), (-4.0, -3.0));

        // Inside the data range the missing side still comes from the data.
        let inside = StyleConfig {
            vmin: Some(3.0),
            ..Default::default()
        };
        let resolved = inside.resolve(Some((2.0, 4.0))).unwrap();
        assert_eq!((resolved.vmin, resolved.vmax), (3.0, 4.0));
    }

    #[test]
    fn test_colormap_reversal_and_clamp() {
        let cmap = Colormap::from_name("RdBu").unwrap();
        let reversed = Colormap::from_name("rdbu_r").unwrap();
        assert_eq!(cmap.at(0.0), reversed.at(1.0));
        assert_eq!(cmap.at(-1.0), cmap.at(0.0));
        assert_eq!(cmap.at(2.0), [5, 48, 97, 255]);
    }

    #[test]
    fn test_greys_runs_opposite_to_gray() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        assert_eq!(Colormap::from_name("gray").unwrap().at(0.0), black);
        assert_eq!(Colormap::from_name("Greys").unwrap().at(0.0), white);
        assert_eq!(Colormap::from_name("Greys_r").unwrap().at(0.0), black);
        assert_eq!(Colormap::from_name("grey_r").unwrap().at(0.0), white);
    }

    #[test]
    fn test_color_parsing() {
        let hex = Color::Named("#FF5500".to_string());
        assert_eq!(hex.to_rgba(), (255, 85, 0, 255));

        let arr = Color::Array(vec![100, 150, 200]);
        assert_eq!(arr.to_rgba(), (100, 150, 200, 255));

        let named = Color::Named("red".to_string());
        assert_eq!(named.to_rgba(), (255, 0, 0, 255));
    }
}
