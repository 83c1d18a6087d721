//! Incremental Delaunay triangulation (Bowyer–Watson).
//!
//! Points are normalized to the unit square, inserted in Hilbert-curve order
//! and located by walking from the most recently created triangle, so each
//! insertion touches only a few triangles. The cavity of triangles whose
//! circumcircle contains the new point is found through the adjacency links
//! and re-triangulated as a fan around the point.
//!
//! The hull is closed off by ghost triangles that share one symbolic vertex
//! at infinity. A ghost's circumcircle is the open half-plane beyond its hull
//! edge plus the open edge itself, so points outside the current hull extend
//! it exactly and every hull edge survives into the output.
//!
//! Input points must be unique; the caller collapses duplicates first.

use crate::error::MeshError;

const NONE: usize = usize::MAX;

/// Side length of the Hilbert grid used for insertion order.
const HILBERT_BITS: u32 = 16;

/// Orientation threshold below which a point set counts as collinear.
const COLLINEAR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Tri {
    /// Vertices in counter-clockwise order; the ghost vertex may appear once
    v: [usize; 3],
    /// `adj[i]` is the triangle across the edge opposite `v[i]`
    adj: [usize; 3],
    alive: bool,
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
#[inline]
pub(crate) fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `p` lies strictly inside the circumcircle of CCW (a, b, c).
#[inline]
fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], p: [f64; 2]) -> f64 {
    let adx = a[0] - p[0];
    let ady = a[1] - p[1];
    let bdx = b[0] - p[0];
    let bdy = b[1] - p[1];
    let cdx = c[0] - p[0];
    let cdy = c[1] - p[1];

    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx)
}

/// Whether `p` lies strictly between `a` and `b` on their common line.
#[inline]
fn within_segment(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let t = (p[0] - a[0]) * dx + (p[1] - a[1]) * dy;
    t > 0.0 && t < dx * dx + dy * dy
}

/// Distance of (x, y) along a Hilbert curve filling a 2^bits grid.
fn hilbert_index(bits: u32, mut x: u32, mut y: u32) -> u64 {
    let n: u32 = 1 << bits;
    let mut d: u64 = 0;
    let mut s = n >> 1;
    while s > 0 {
        let rx = u32::from(x & s > 0);
        let ry = u32::from(y & s > 0);
        d += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);
        if ry == 0 {
            if rx == 1 {
                x = n - 1 - x;
                y = n - 1 - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        s >>= 1;
    }
    d
}

/// Triangulate unique points, returning CCW triangles as input indices.
///
/// The triangles cover the convex hull of the input exactly. Fails with
/// [`MeshError::Degenerate`] for fewer than three points or when every
/// point lies on one line.
pub fn triangulate(points: &[[f64; 2]]) -> Result<Vec<[usize; 3]>, MeshError> {
    let n = points.len();
    if n < 3 {
        return Err(MeshError::Degenerate { valid_points: n });
    }

    let normalized = normalize(points);
    let seed = match seed_triangle(&normalized) {
        Some(seed) => seed,
        None => return Err(MeshError::Degenerate { valid_points: n }),
    };

    let mut order: Vec<usize> = (0..n).collect();
    let scale = ((1u32 << HILBERT_BITS) - 1) as f64;
    let keys: Vec<u64> = normalized
        .iter()
        .map(|p| hilbert_index(HILBERT_BITS, (p[0] * scale) as u32, (p[1] * scale) as u32))
        .collect();
    order.sort_by_key(|&i| (keys[i], i));

    let mut builder = Builder::new(normalized, seed);
    for &i in order.iter().filter(|i| !seed.contains(i)) {
        builder.insert(i);
    }

    let triangles = builder.finish();
    if triangles.is_empty() {
        return Err(MeshError::Degenerate { valid_points: n });
    }
    Ok(triangles)
}

/// Map points into the unit square, preserving aspect ratio.
fn normalize(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in points {
        for k in 0..2 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }
    let span = (max[0] - min[0]).max(max[1] - min[1]);
    let span = if span > 0.0 { span } else { 1.0 };
    points
        .iter()
        .map(|p| [(p[0] - min[0]) / span, (p[1] - min[1]) / span])
        .collect()
}

/// A well-shaped CCW starting triangle, `None` when all points are collinear.
///
/// Takes the first point, the point farthest from it and the point farthest
/// from the line through both.
fn seed_triangle(points: &[[f64; 2]]) -> Option<[usize; 3]> {
    let a = 0;
    let dist = |i: usize| (points[i][0] - points[a][0]).powi(2) + (points[i][1] - points[a][1]).powi(2);
    let b = (1..points.len()).max_by(|&i, &j| dist(i).total_cmp(&dist(j)))?;
    let area = |i: usize| orient(points[a], points[b], points[i]);
    let c = (1..points.len())
        .filter(|&i| i != b)
        .max_by(|&i, &j| area(i).abs().total_cmp(&area(j).abs()))?;

    let signed = area(c);
    if signed.abs() <= COLLINEAR_EPS {
        return None;
    }
    Some(if signed > 0.0 { [a, b, c] } else { [a, c, b] })
}

/// Boundary edge of a cavity: `a -> b` seen from inside, with the triangle beyond it.
struct CavityEdge {
    a: usize,
    b: usize,
    outer: usize,
}

struct Builder {
    /// Normalized points; the ghost vertex has no coordinates
    pts: Vec<[f64; 2]>,
    /// Index of the vertex at infinity (one past the last point)
    ghost: usize,
    tris: Vec<Tri>,
    free: Vec<usize>,
    marks: Vec<u32>,
    epoch: u32,
    last: usize,
}

impl Builder {
    /// Seed triangle plus the three ghosts beyond its edges.
    fn new(pts: Vec<[f64; 2]>, seed: [usize; 3]) -> Self {
        let ghost = pts.len();
        let [a, b, c] = seed;
        let tris = vec![
            Tri { v: [a, b, c], adj: [1, 2, 3], alive: true },
            Tri { v: [c, b, ghost], adj: [3, 2, 0], alive: true },
            Tri { v: [a, c, ghost], adj: [1, 3, 0], alive: true },
            Tri { v: [b, a, ghost], adj: [2, 1, 0], alive: true },
        ];

        Self {
            pts,
            ghost,
            marks: vec![0; tris.len()],
            tris,
            free: Vec::new(),
            epoch: 0,
            last: 0,
        }
    }

    /// Real edge `(u, w)` of a ghost triangle, ordered so the outside is on its left.
    fn ghost_edge(&self, t: usize) -> Option<(usize, usize)> {
        let v = self.tris[t].v;
        let g = v.iter().position(|&x| x == self.ghost)?;
        Some((v[(g + 1) % 3], v[(g + 2) % 3]))
    }

    fn conflicts(&self, t: usize, p: [f64; 2]) -> bool {
        match self.ghost_edge(t) {
            Some((u, w)) => {
                let (pu, pw) = (self.pts[u], self.pts[w]);
                let side = orient(pu, pw, p);
                side > 0.0 || (side == 0.0 && within_segment(pu, pw, p))
            }
            None => {
                let [a, b, c] = self.tris[t].v;
                in_circle(self.pts[a], self.pts[b], self.pts[c], p) > 0.0
            }
        }
    }

    /// Walk towards `p`; returns a triangle in conflict with it.
    fn locate(&self, p: [f64; 2]) -> Option<usize> {
        let mut t = self.last;
        let max_steps = self.tris.len() + 16;

        'walk: for step in 0..max_steps {
            let tri = &self.tris[t];
            if let Some(g) = tri.v.iter().position(|&x| x == self.ghost) {
                if self.conflicts(t, p) {
                    return Some(t);
                }
                // Back across the hull edge into the real triangle.
                t = tri.adj[g];
                continue 'walk;
            }

            for k in 0..3 {
                // Rotate the starting edge so the walk cannot cycle on ties.
                let i = (k + step) % 3;
                let a = self.pts[tri.v[(i + 1) % 3]];
                let b = self.pts[tri.v[(i + 2) % 3]];
                if orient(a, b, p) < 0.0 {
                    t = tri.adj[i];
                    continue 'walk;
                }
            }
            if self.conflicts(t, p) {
                return Some(t);
            }
            break;
        }

        (0..self.tris.len()).find(|&t| self.tris[t].alive && self.conflicts(t, p))
    }

    fn insert(&mut self, pi: usize) {
        let p = self.pts[pi];
        let start = match self.locate(p) {
            Some(t) => t,
            None => return,
        };

        self.epoch += 1;
        let epoch = self.epoch;
        self.marks[start] = epoch;

        let mut stack = vec![start];
        let mut cavity = Vec::new();
        let mut boundary: Vec<CavityEdge> = Vec::new();

        while let Some(t) = stack.pop() {
            cavity.push(t);
            let tri = self.tris[t];
            for i in 0..3 {
                let a = tri.v[(i + 1) % 3];
                let b = tri.v[(i + 2) % 3];
                let n = tri.adj[i];
                if self.marks[n] == epoch {
                    continue;
                }
                // Grow across real edges the point cannot see, so the fan stays star-shaped.
                let hidden = a != self.ghost
                    && b != self.ghost
                    && orient(self.pts[a], self.pts[b], p) <= 0.0;
                if hidden || self.conflicts(n, p) {
                    self.marks[n] = epoch;
                    stack.push(n);
                } else {
                    boundary.push(CavityEdge { a, b, outer: n });
                }
            }
        }

        // An edge can be recorded as boundary before its outer triangle joined
        // the cavity; drop those.
        boundary.retain(|e| self.marks[e.outer] != epoch);

        for &t in &cavity {
            self.tris[t].alive = false;
            self.free.push(t);
        }

        let mut created = Vec::with_capacity(boundary.len());
        for edge in &boundary {
            let id = self.allocate(Tri {
                v: [pi, edge.a, edge.b],
                adj: [edge.outer, NONE, NONE],
                alive: true,
            });
            let outer = &mut self.tris[edge.outer];
            for j in 0..3 {
                if outer.v[(j + 1) % 3] == edge.b && outer.v[(j + 2) % 3] == edge.a {
                    outer.adj[j] = id;
                }
            }
            created.push(id);
        }

        // Fan neighbours: [p, a, b] meets [p, b, c] across (p, b) and [p, z, a] across (p, a).
        for (k, edge) in boundary.iter().enumerate() {
            let id = created[k];
            let after = boundary.iter().position(|e| e.a == edge.b).map(|m| created[m]);
            let before = boundary.iter().position(|e| e.b == edge.a).map(|m| created[m]);
            self.tris[id].adj[1] = after.unwrap_or(NONE);
            self.tris[id].adj[2] = before.unwrap_or(NONE);
        }

        if let Some(&t) = created.first() {
            self.last = t;
        }
    }

    fn allocate(&mut self, tri: Tri) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.tris[id] = tri;
                id
            }
            None => {
                self.tris.push(tri);
                self.marks.push(0);
                self.tris.len() - 1
            }
        }
    }

    /// Live real triangles, sorted for determinism.
    fn finish(self) -> Vec<[usize; 3]> {
        let ghost = self.ghost;
        let mut out: Vec<[usize; 3]> = self
            .tris
            .iter()
            .filter(|t| t.alive && !t.v.contains(&ghost))
            .filter(|t| orient(self.pts[t.v[0]], self.pts[t.v[1]], self.pts[t.v[2]]) > 0.0)
            .map(|t| {
                // Rotate so the smallest index comes first; orientation is kept.
                let m = (0..3).min_by_key(|&i| t.v[i]).unwrap_or(0);
                [t.v[m], t.v[(m + 1) % 3], t.v[(m + 2) % 3]]
            })
            .collect();
        out.sort_unstable();
        out
    }
}
