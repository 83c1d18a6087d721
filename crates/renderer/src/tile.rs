//! Tile rendering strategies behind one interface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mesh::SpatialIndex;
use projection::PixelFrame;
use tile_common::style::ResolvedStyle;
use tile_common::tile::{TileBufferConfig, TileCoord, TILE_SIZE};

use crate::bands::{extract_fragments, filter_fragments};
use crate::contour::generate_all_contours;
use crate::error::{RenderError, RenderResult};
use crate::png::{encode_png, PngEncoding};
use crate::raster::Canvas;
use crate::sample::SampledTileRenderer;

/// A rendered 256×256 RGBA tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub coord: TileCoord,
    /// Straight RGBA, row-major from the north-west corner
    pub pixels: Vec<u8>,
    /// No triangle of the mesh reached the tile window
    pub no_data: bool,
}

impl TileImage {
    /// Fully transparent placeholder for a tile without data.
    pub fn transparent(coord: TileCoord) -> Self {
        Self {
            coord,
            pixels: vec![0; (TILE_SIZE * TILE_SIZE * 4) as usize],
            no_data: true,
        }
    }

    pub fn width(&self) -> u32 {
        TILE_SIZE
    }

    pub fn height(&self) -> u32 {
        TILE_SIZE
    }

    /// RGBA of pixel (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * TILE_SIZE + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Whether every pixel has alpha 0.
    pub fn is_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn encode(&self, encoding: PngEncoding) -> RenderResult<Vec<u8>> {
        encode_png(
            &self.pixels,
            self.width() as usize,
            self.height() as usize,
            encoding,
        )
    }
}

/// Renders a single tile; shared by all worker threads.
pub trait TileRenderer: Send + Sync {
    fn render_tile(&self, coord: TileCoord) -> RenderResult<TileImage>;

    /// Strategy name used in logs.
    fn name(&self) -> &'static str;
}

/// Available rendering strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// Filled-contour polygons rasterized per band
    #[default]
    Contour,
    /// Per-pixel point location and interpolation
    Sampled,
}

impl std::str::FromStr for RenderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contour" | "contourf" => Ok(RenderStrategy::Contour),
            "sampled" | "sample" | "pixel" => Ok(RenderStrategy::Sampled),
            other => Err(format!("unknown render strategy '{}'", other)),
        }
    }
}

/// Read-only state every renderer works from.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub index: Arc<SpatialIndex>,
    pub style: Arc<ResolvedStyle>,
    pub buffer: TileBufferConfig,
}

impl RenderContext {
    pub fn new(index: Arc<SpatialIndex>, style: Arc<ResolvedStyle>, buffer: TileBufferConfig) -> Self {
        Self {
            index,
            style,
            buffer,
        }
    }

    /// Band colors indexed like the band set.
    pub fn band_colors(&self) -> Vec<[u8; 4]> {
        self.style.bands.bands().iter().map(|b| b.color).collect()
    }
}

/// Build the renderer for a strategy.
pub fn create_renderer(strategy: RenderStrategy, context: RenderContext) -> Box<dyn TileRenderer> {
    match strategy {
        RenderStrategy::Contour => Box::new(ContourTileRenderer::new(context)),
        RenderStrategy::Sampled => Box::new(SampledTileRenderer::new(context)),
    }
}

/// Filled-contour renderer: band fragments filled as polygons.
pub struct ContourTileRenderer {
    context: RenderContext,
    colors: Vec<[u8; 4]>,
}

impl ContourTileRenderer {
    pub fn new(context: RenderContext) -> Self {
        let colors = context.band_colors();
        Self { context, colors }
    }
}

impl TileRenderer for ContourTileRenderer {
    fn render_tile(&self, coord: TileCoord) -> RenderResult<TileImage> {
        let frame = PixelFrame::for_tile(&coord);
        let window = self.context.buffer.expanded_bbox(&frame.bounds());
        let subset = self.context.index.query_mercator(&window);
        if subset.is_empty() {
            debug!(tile = %coord, "No triangles in tile window");
            return Ok(TileImage::transparent(coord));
        }

        let mesh = self.context.index.mesh();
        let style = &self.context.style;

        let fragments = extract_fragments(mesh, &subset.triangles, &style.bands);
        let extracted = fragments.len();
        let fragments = filter_fragments(fragments, style.min_vertices);

        // Clip one pixel beyond the buffer so polygon edges never end inside it.
        let margin = self.context.buffer.buffer_pixels as f64 + 1.0;
        let mut canvas = Canvas::new(frame, margin)?;
        canvas.fill_fragments(&fragments, &self.colors, style.antialias);

        if let Some(lines) = &style.contour_lines {
            let polylines = generate_all_contours(mesh, &subset.triangles, &lines.levels);
            canvas.stroke_polylines(&polylines, lines.line_width, lines.color, true);
        }

        debug!(
            tile = %coord,
            triangles = subset.triangles.len(),
            fragments = extracted,
            kept = fragments.len(),
            "Rendered contour tile"
        );

        let pixels = canvas.into_rgba();
        if pixels.len() != (TILE_SIZE * TILE_SIZE * 4) as usize {
            return Err(RenderError::Canvas(format!(
                "unexpected canvas size {} for tile {}",
                pixels.len(),
                coord
            )));
        }

        Ok(TileImage {
            coord,
            pixels,
            no_data: false,
        })
    }

    fn name(&self) -> &'static str {
        "contour"
    }
}
