//! Filled-contour band extraction over a triangle mesh.
//!
//! Values vary linearly over each triangle, so the part of a triangle whose
//! value lies in a band `[lower, upper]` is a convex polygon obtained by
//! clipping the triangle twice in value space. Clip points sit on triangle
//! edges and are identified by the edge and the level, never by position:
//! neighbouring triangles produce the same key and the same coordinates for a
//! shared cut, which lets the pieces of one band be stitched into fragments
//! by matching edges exactly.

use std::collections::BTreeMap;

use mesh::Triangulation;
use tile_common::style::BandSet;

/// A point of a clipped piece: a mesh vertex, or a level crossing on a mesh edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexKey {
    Node(usize),
    /// Crossing of level `level` on edge (`a`, `b`), `a < b`
    Cut { a: usize, b: usize, level: usize },
}

/// Connected region of one band with its outline rings in Web-Mercator meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Index into the band set
    pub band: usize,
    /// Closed rings (first point not repeated); outer rings counter-clockwise, holes clockwise
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl Fragment {
    /// Total number of outline vertices over all rings.
    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Drop fragments whose outline has fewer than `min_vertices` vertices.
pub fn filter_fragments(fragments: Vec<Fragment>, min_vertices: usize) -> Vec<Fragment> {
    if min_vertices == 0 {
        return fragments;
    }
    fragments
        .into_iter()
        .filter(|f| f.vertex_count() >= min_vertices)
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    key: VertexKey,
    value: f64,
}

impl ClipVertex {
    /// Mesh vertices this point lies next to: one for a node, the edge ends for a cut.
    fn support(&self) -> [usize; 2] {
        match self.key {
            VertexKey::Node(i) => [i, i],
            VertexKey::Cut { a, b, .. } => [a, b],
        }
    }
}

/// Mesh edge carrying the segment p -> q, if the segment lies on one.
fn shared_edge(p: &ClipVertex, q: &ClipVertex) -> Option<(usize, usize)> {
    let mut ids = [p.support(), q.support()].concat();
    ids.sort_unstable();
    ids.dedup();
    match ids.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Above,
    Below,
}

/// Clip a convex polygon to the half-plane `value >= level` (Above) or `value <= level` (Below).
fn clip_polygon(
    polygon: &[ClipVertex],
    level: f64,
    level_idx: usize,
    side: Side,
) -> Vec<ClipVertex> {
    let inside = |v: &ClipVertex| match side {
        Side::Above => v.value >= level,
        Side::Below => v.value <= level,
    };

    let mut out = Vec::with_capacity(polygon.len() + 2);
    for i in 0..polygon.len() {
        let p = &polygon[i];
        let q = &polygon[(i + 1) % polygon.len()];
        let (p_in, q_in) = (inside(p), inside(q));

        // A vertex exactly on the level already marks the crossing.
        let crossing = p_in != q_in && p.value != level && q.value != level;
        if crossing {
            if let Some((a, b)) = shared_edge(p, q) {
                out.push(ClipVertex {
                    key: VertexKey::Cut {
                        a,
                        b,
                        level: level_idx,
                    },
                    value: level,
                });
            }
        }
        if q_in {
            out.push(*q);
        }
    }

    out.dedup_by(|a, b| a.key == b.key);
    if out.len() > 1 && out.first().map(|v| v.key) == out.last().map(|v| v.key) {
        out.pop();
    }
    out
}

/// Position of a key: vertices as stored, cuts interpolated from the lower vertex id.
pub fn key_position(mesh: &Triangulation, levels: &[f64], key: VertexKey) -> [f64; 2] {
    match key {
        VertexKey::Node(i) => mesh.xy(i),
        VertexKey::Cut { a, b, level } => {
            let (fa, fb) = (mesh.value(a), mesh.value(b));
            let t = ((levels[level] - fa) / (fb - fa)).clamp(0.0, 1.0);
            let (pa, pb) = (mesh.xy(a), mesh.xy(b));
            [pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])]
        }
    }
}

/// Union-find over piece ids.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so fragment ids stay deterministic.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Extract band fragments from the given triangles.
///
/// Fragments are ordered by band, then by their first triangle.
pub fn extract_fragments(mesh: &Triangulation, triangles: &[usize], bands: &BandSet) -> Vec<Fragment> {
    let levels = bands.levels();
    let level_index = |value: f64| levels.partition_point(|l| *l < value);

    // pieces[band] = rings of keys, one per clipped triangle
    let mut pieces: Vec<Vec<Vec<VertexKey>>> = vec![Vec::new(); bands.len()];

    for &id in triangles {
        let [a, b, c] = mesh.triangle(id);
        let triangle = [a, b, c].map(|v| ClipVertex {
            key: VertexKey::Node(v),
            value: mesh.value(v),
        });
        let lo = triangle.iter().map(|v| v.value).fold(f64::INFINITY, f64::min);
        let hi = triangle.iter().map(|v| v.value).fold(f64::NEG_INFINITY, f64::max);

        for (k, band) in bands.bands().iter().enumerate() {
            if band.lower > hi || band.upper < lo {
                continue;
            }

            let mut polygon = triangle.to_vec();
            if band.lower.is_finite() && band.lower > lo {
                polygon = clip_polygon(&polygon, band.lower, level_index(band.lower), Side::Above);
            }
            if polygon.len() >= 3 && band.upper.is_finite() && band.upper < hi {
                polygon = clip_polygon(&polygon, band.upper, level_index(band.upper), Side::Below);
            }
            if polygon.len() >= 3 {
                pieces[k].push(polygon.iter().map(|v| v.key).collect());
            }
        }
    }

    let mut fragments = Vec::new();
    for (band, band_pieces) in pieces.into_iter().enumerate() {
        if band_pieces.is_empty() {
            continue;
        }
        for rings in merge_pieces(&band_pieces) {
            fragments.push(Fragment {
                band,
                rings: rings
                    .into_iter()
                    .map(|ring| ring.into_iter().map(|k| key_position(mesh, levels, k)).collect())
                    .collect(),
            });
        }
    }
    fragments
}

fn undirected(a: VertexKey, b: VertexKey) -> (VertexKey, VertexKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Merge pieces sharing an edge; returns the boundary rings of each group.
fn merge_pieces(pieces: &[Vec<VertexKey>]) -> Vec<Vec<Vec<VertexKey>>> {
    let mut edge_owners: BTreeMap<(VertexKey, VertexKey), Vec<usize>> = BTreeMap::new();
    for (p, ring) in pieces.iter().enumerate() {
        for i in 0..ring.len() {
            let edge = undirected(ring[i], ring[(i + 1) % ring.len()]);
            edge_owners.entry(edge).or_default().push(p);
        }
    }

    let mut sets = DisjointSet::new(pieces.len());
    for owners in edge_owners.values() {
        for pair in owners.windows(2) {
            sets.union(pair[0], pair[1]);
        }
    }

    // Boundary edges (seen once), directed as in their piece, grouped by root piece.
    let mut groups: BTreeMap<usize, Vec<(VertexKey, VertexKey)>> = BTreeMap::new();
    for (p, ring) in pieces.iter().enumerate() {
        for i in 0..ring.len() {
            let (from, to) = (ring[i], ring[(i + 1) % ring.len()]);
            if edge_owners[&undirected(from, to)].len() == 1 {
                let root = sets.find(p);
                groups.entry(root).or_default().push((from, to));
            }
        }
    }

    groups.into_values().map(chain_rings).collect()
}

/// Chain directed boundary edges into closed rings.
fn chain_rings(edges: Vec<(VertexKey, VertexKey)>) -> Vec<Vec<VertexKey>> {
    let mut outgoing: BTreeMap<VertexKey, Vec<VertexKey>> = BTreeMap::new();
    for (from, to) in edges {
        outgoing.entry(from).or_default().push(to);
    }

    let mut rings = Vec::new();
    loop {
        let start = match outgoing.iter().find(|(_, targets)| !targets.is_empty()) {
            Some((key, _)) => *key,
            None => break,
        };

        let mut ring = vec![start];
        let mut current = start;
        loop {
            let next = match outgoing.get_mut(&current).and_then(|t| t.pop()) {
                Some(next) => next,
                None => break,
            };
            if next == start {
                break;
            }
            ring.push(next);
            current = next;
        }

        if ring.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}
