//! Polygon and polyline rasterization into a tile canvas using tiny-skia.

use projection::PixelFrame;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};
use tracing::debug;

use crate::bands::Fragment;
use crate::contour::Polyline;
use crate::error::{RenderError, RenderResult};

/// An RGBA canvas covering one tile's pixel frame.
pub struct Canvas {
    pixmap: Pixmap,
    frame: PixelFrame,
    /// Clip rectangle in pixels: the frame grown by the margin
    clip: ClipRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ClipRect {
    pub fn around(size: u32, margin: f64) -> Self {
        Self {
            min_x: -margin,
            min_y: -margin,
            max_x: size as f64 + margin,
            max_y: size as f64 + margin,
        }
    }
}

impl Canvas {
    /// Transparent canvas; geometry is clipped `margin` pixels outside the frame.
    pub fn new(frame: PixelFrame, margin: f64) -> RenderResult<Self> {
        let size = frame.size();
        let pixmap = Pixmap::new(size, size)
            .ok_or_else(|| RenderError::Canvas(format!("cannot allocate {}x{} pixmap", size, size)))?;
        Ok(Self {
            pixmap,
            frame,
            clip: ClipRect::around(size, margin),
        })
    }

    /// Fill each fragment with its band color, in order.
    pub fn fill_fragments(&mut self, fragments: &[Fragment], colors: &[[u8; 4]], antialias: bool) {
        let mut filled = 0usize;
        for fragment in fragments {
            let color = colors[fragment.band];
            if color[3] == 0 {
                continue;
            }

            let mut pb = PathBuilder::new();
            let mut rings = 0usize;
            for ring in &fragment.rings {
                let pixels: Vec<(f64, f64)> = ring
                    .iter()
                    .map(|p| self.frame.to_pixel(p[0], p[1]))
                    .collect();
                let clipped = clip_ring(&pixels, &self.clip);
                if clipped.len() < 3 {
                    continue;
                }
                pb.move_to(clipped[0].0 as f32, clipped[0].1 as f32);
                for &(x, y) in &clipped[1..] {
                    pb.line_to(x as f32, y as f32);
                }
                pb.close();
                rings += 1;
            }
            if rings == 0 {
                continue;
            }

            if let Some(path) = pb.finish() {
                let mut paint = Paint::default();
                paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
                paint.anti_alias = antialias;
                self.pixmap
                    .fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
                filled += 1;
            }
        }
        debug!(fragments = fragments.len(), filled, "Filled band fragments");
    }

    /// Stroke polylines given in Web-Mercator meters.
    pub fn stroke_polylines(&mut self, lines: &[Polyline], width: f32, color: [u8; 4], antialias: bool) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = antialias;

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        let mut pb = PathBuilder::new();
        for line in lines {
            let pixels: Vec<(f64, f64)> = line
                .points
                .iter()
                .map(|p| self.frame.to_pixel(p[0], p[1]))
                .collect();
            for run in clip_polyline(&pixels, &self.clip) {
                pb.move_to(run[0].0 as f32, run[0].1 as f32);
                for &(x, y) in &run[1..] {
                    pb.line_to(x as f32, y as f32);
                }
            }
        }

        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Straight (non-premultiplied) RGBA bytes, row-major from the north-west corner.
    pub fn into_rgba(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

/// Sutherland–Hodgman clip of a closed ring against a rectangle.
pub fn clip_ring(ring: &[(f64, f64)], rect: &ClipRect) -> Vec<(f64, f64)> {
    let mut output = ring.to_vec();

    let edges: [(fn(&(f64, f64), &ClipRect) -> bool, Boundary); 4] = [
        (|p, r| p.0 >= r.min_x, Boundary::Left),
        (|p, r| p.0 <= r.max_x, Boundary::Right),
        (|p, r| p.1 >= r.min_y, Boundary::Top),
        (|p, r| p.1 <= r.max_y, Boundary::Bottom),
    ];

    for (inside, boundary) in edges {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        for i in 0..input.len() {
            let p = input[i];
            let q = input[(i + 1) % input.len()];
            let (p_in, q_in) = (inside(&p, rect), inside(&q, rect));
            if p_in != q_in {
                output.push(boundary.intersect(p, q, rect));
            }
            if q_in {
                output.push(q);
            }
        }
    }
    output
}

#[derive(Clone, Copy)]
enum Boundary {
    Left,
    Right,
    Top,
    Bottom,
}

impl Boundary {
    fn intersect(self, p: (f64, f64), q: (f64, f64), rect: &ClipRect) -> (f64, f64) {
        match self {
            Boundary::Left | Boundary::Right => {
                let x = if matches!(self, Boundary::Left) { rect.min_x } else { rect.max_x };
                let t = (x - p.0) / (q.0 - p.0);
                (x, p.1 + t * (q.1 - p.1))
            }
            Boundary::Top | Boundary::Bottom => {
                let y = if matches!(self, Boundary::Top) { rect.min_y } else { rect.max_y };
                let t = (y - p.1) / (q.1 - p.1);
                (p.0 + t * (q.0 - p.0), y)
            }
        }
    }
}

/// Liang–Barsky clip of an open polyline; returns the visible runs.
pub fn clip_polyline(points: &[(f64, f64)], rect: &ClipRect) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            }
            None => {
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

fn clip_segment(p: (f64, f64), q: (f64, f64), rect: &ClipRect) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (q.0 - p.0, q.1 - p.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (edge_p, edge_q) in [
        (-dx, p.0 - rect.min_x),
        (dx, rect.max_x - p.0),
        (-dy, p.1 - rect.min_y),
        (dy, rect.max_y - p.1),
    ] {
        if edge_p == 0.0 {
            if edge_q < 0.0 {
                return None;
            }
            continue;
        }
        let t = edge_q / edge_p;
        if edge_p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (p.0 + t0 * dx, p.1 + t0 * dy),
        (p.0 + t1 * dx, p.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::tile_mercator_bounds;
    use tile_common::tile::TileCoord;

    fn rect() -> ClipRect {
        ClipRect::around(256, 0.0)
    }

    #[test]
    fn test_clip_ring_inside_unchanged() {
        let ring = vec![(10.0, 10.0), (100.0, 10.0), (50.0, 90.0)];
        assert_eq!(clip_ring(&ring, &rect()), ring);
    }

    #[test]
    fn test_clip_ring_to_rect() {
        let huge = vec![(-1e7, -1e7), (1e7, -1e7), (1e7, 1e7), (-1e7, 1e7)];
        let clipped = clip_ring(&huge, &rect());
        assert_eq!(clipped.len(), 4);
        for (x, y) in clipped {
            assert!((0.0..=256.0).contains(&x) && (0.0..=256.0).contains(&y));
        }
    }

    #[test]
    fn test_clip_ring_outside_vanishes() {
        let ring = vec![(300.0, 300.0), (400.0, 300.0), (350.0, 400.0)];
        assert!(clip_ring(&ring, &rect()).is_empty());
    }

    #[test]
    fn test_clip_polyline_runs() {
        let line = vec![(-10.0, 128.0), (128.0, 128.0), (128.0, 400.0), (500.0, 400.0)];
        let runs = clip_polyline(&line, &rect());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
        let close = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9;
        assert!(close(runs[0][0], (0.0, 128.0)));
        assert!(close(runs[0][2], (128.0, 256.0)));
    }

    #[test]
    fn test_fill_covers_tile() {
        let coord = TileCoord::new(3, 4, 3);
        let frame = PixelFrame::for_tile(&coord);
        let b = tile_mercator_bounds(&coord);
        let pad = b.width();
        let fragment = Fragment {
            band: 0,
            rings: vec![vec![
                [b.min_x - pad, b.min_y - pad],
                [b.max_x + pad, b.min_y - pad],
                [b.max_x + pad, b.max_y + pad],
                [b.min_x - pad, b.max_y + pad],
            ]],
        };

        let mut canvas = Canvas::new(frame, 2.0).unwrap();
        canvas.fill_fragments(&[fragment], &[[10, 20, 30, 255]], false);
        let rgba = canvas.into_rgba();
        assert_eq!(rgba.len(), 256 * 256 * 4);
        assert!(rgba.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn test_half_covered_tile() {
        let coord = TileCoord::new(2, 1, 1);
        let frame = PixelFrame::for_tile(&coord);
        let b = tile_mercator_bounds(&coord);
        let mid_x = (b.min_x + b.max_x) / 2.0;
        let fragment = Fragment {
            band: 0,
            rings: vec![vec![
                [b.min_x - 1e6, b.min_y - 1e6],
                [mid_x, b.min_y - 1e6],
                [mid_x, b.max_y + 1e6],
                [b.min_x - 1e6, b.max_y + 1e6],
            ]],
        };

        let mut canvas = Canvas::new(frame, 2.0).unwrap();
        canvas.fill_fragments(&[fragment], &[[200, 0, 0, 255]], false);
        let rgba = canvas.into_rgba();
        let alpha_at = |x: usize, y: usize| rgba[(y * 256 + x) * 4 + 3];
        assert_eq!(alpha_at(10, 100), 255);
        assert_eq!(alpha_at(127, 5), 255);
        assert_eq!(alpha_at(128, 5), 0);
        assert_eq!(alpha_at(250, 250), 0);
    }
}
