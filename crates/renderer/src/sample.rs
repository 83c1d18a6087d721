//! Per-pixel sampling strategy.
//!
//! Every pixel centre is projected back to Web-Mercator meters, located in
//! the mesh and colored by the band of its interpolated value. Slower than
//! polygon filling but free of polygon bookkeeping.

use projection::PixelFrame;
use tile_common::tile::{TileCoord, TILE_SIZE};

use crate::contour::generate_all_contours;
use crate::error::RenderResult;
use crate::raster::Canvas;
use crate::tile::{RenderContext, TileImage, TileRenderer};

pub struct SampledTileRenderer {
    context: RenderContext,
}

impl SampledTileRenderer {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }
}

impl TileRenderer for SampledTileRenderer {
    fn render_tile(&self, coord: TileCoord) -> RenderResult<TileImage> {
        let frame = PixelFrame::for_tile(&coord);
        let window = self.context.buffer.expanded_bbox(&frame.bounds());
        let subset = self.context.index.query_mercator(&window);
        if subset.is_empty() {
            return Ok(TileImage::transparent(coord));
        }

        let style = &self.context.style;
        let index = &self.context.index;

        // Iso-lines are stroked on a canvas first, then the sampled colors are
        // composited underneath.
        let overlay = match &style.contour_lines {
            Some(lines) => {
                let margin = self.context.buffer.buffer_pixels as f64 + 1.0;
                let mut canvas = Canvas::new(frame, margin)?;
                let polylines = generate_all_contours(index.mesh(), &subset.triangles, &lines.levels);
                canvas.stroke_polylines(&polylines, lines.line_width, lines.color, true);
                Some(canvas.into_rgba())
            }
            None => None,
        };

        let mut pixels = vec![0u8; (TILE_SIZE * TILE_SIZE * 4) as usize];
        for j in 0..TILE_SIZE {
            for i in 0..TILE_SIZE {
                let (x, y) = frame.to_mercator(i as f64 + 0.5, j as f64 + 0.5);
                let color = index
                    .interpolate_mercator(x, y)
                    .and_then(|value| style.bands.color_for(value));
                if let Some(color) = color {
                    let offset = ((j * TILE_SIZE + i) * 4) as usize;
                    pixels[offset..offset + 4].copy_from_slice(&color);
                }
            }
        }

        if let Some(overlay) = overlay {
            composite_over(&mut pixels, &overlay);
        }

        Ok(TileImage {
            coord,
            pixels,
            no_data: false,
        })
    }

    fn name(&self) -> &'static str {
        "sampled"
    }
}

/// Source-over composite of straight-alpha `top` onto `base`.
fn composite_over(base: &mut [u8], top: &[u8]) {
    for (dst, src) in base.chunks_exact_mut(4).zip(top.chunks_exact(4)) {
        let sa = src[3] as f32 / 255.0;
        if sa == 0.0 {
            continue;
        }
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        for c in 0..3 {
            let s = src[c] as f32 / 255.0;
            let d = dst[c] as f32 / 255.0;
            let out = (s * sa + d * da * (1.0 - sa)) / out_a;
            dst[c] = (out * 255.0).round() as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_opaque_top_wins() {
        let mut base = vec![10, 10, 10, 255];
        composite_over(&mut base, &[200, 0, 0, 255]);
        assert_eq!(base, vec![200, 0, 0, 255]);
    }

    #[test]
    fn test_composite_transparent_top_keeps_base() {
        let mut base = vec![10, 20, 30, 255];
        composite_over(&mut base, &[200, 0, 0, 0]);
        assert_eq!(base, vec![10, 20, 30, 255]);
    }

    #[test]
    fn test_composite_onto_empty() {
        let mut base = vec![0, 0, 0, 0];
        composite_over(&mut base, &[0, 0, 255, 128]);
        assert_eq!(base, vec![0, 0, 255, 128]);
    }
}
