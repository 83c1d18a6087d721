//! Contour line (isoline) extraction using marching triangles.
//!
//! Each triangle crossed by a level contributes one segment between the two
//! crossed edges. Crossing points are keyed by their mesh edge, so segments
//! from neighbouring triangles join exactly and can be connected into
//! polylines without a distance tolerance.

use std::collections::BTreeMap;

use mesh::Triangulation;

/// Mesh edge (lower vertex id first) carrying a crossing point.
type EdgeKey = (usize, usize);

/// A line segment between two crossing points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: EdgeKey,
    pub end: EdgeKey,
}

/// A complete contour line in Web-Mercator meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub level: f64,
    pub points: Vec<[f64; 2]>,
    pub closed: bool,
}

fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Segments where `level` crosses the given triangles.
///
/// A vertex counts as above the level when its value is `>= level`, so a
/// level touching a vertex never yields a zero-length segment.
pub fn march_triangles(mesh: &Triangulation, triangles: &[usize], level: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    for &id in triangles {
        let [a, b, c] = mesh.triangle(id);
        let crossed: Vec<EdgeKey> = [(a, b), (b, c), (c, a)]
            .into_iter()
            .filter(|&(p, q)| (mesh.value(p) >= level) != (mesh.value(q) >= level))
            .map(|(p, q)| edge_key(p, q))
            .collect();
        if let [start, end] = crossed[..] {
            segments.push(Segment { start, end });
        }
    }
    segments
}

/// Position of the crossing of `level` on a mesh edge.
fn crossing_point(mesh: &Triangulation, edge: EdgeKey, level: f64) -> [f64; 2] {
    let (a, b) = edge;
    let (fa, fb) = (mesh.value(a), mesh.value(b));
    let t = ((level - fa) / (fb - fa)).clamp(0.0, 1.0);
    let (pa, pb) = (mesh.xy(a), mesh.xy(b));
    [pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])]
}

/// Connect line segments into continuous polylines.
///
/// Every crossing point is shared by at most two segments, so walking from
/// an open end (or any point, for loops) visits each segment once.
pub fn connect_segments(mesh: &Triangulation, segments: &[Segment], level: f64) -> Vec<Polyline> {
    if segments.is_empty() {
        return vec![];
    }

    let mut touching: BTreeMap<EdgeKey, Vec<usize>> = BTreeMap::new();
    for (i, seg) in segments.iter().enumerate() {
        touching.entry(seg.start).or_default().push(i);
        touching.entry(seg.end).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    // Open lines first (start at points owned by a single segment), then loops.
    let open_starts: Vec<EdgeKey> = touching
        .iter()
        .filter(|(_, owners)| owners.len() == 1)
        .map(|(key, _)| *key)
        .collect();
    let loop_starts: Vec<EdgeKey> = segments.iter().map(|s| s.start).collect();

    for start in open_starts.into_iter().chain(loop_starts) {
        let mut keys = vec![start];
        let mut current = start;
        loop {
            let next_seg = touching[&current].iter().copied().find(|&i| !used[i]);
            let Some(i) = next_seg else { break };
            used[i] = true;
            let seg = segments[i];
            current = if seg.start == current { seg.end } else { seg.start };
            keys.push(current);
        }

        if keys.len() < 2 {
            continue;
        }
        let closed = keys.len() > 2 && keys.first() == keys.last();
        lines.push(Polyline {
            level,
            points: keys.iter().map(|&k| crossing_point(mesh, k, level)).collect(),
            closed,
        });
    }

    lines
}

/// Polylines for every level over the given triangles.
pub fn generate_all_contours(mesh: &Triangulation, triangles: &[usize], levels: &[f64]) -> Vec<Polyline> {
    let mut all = Vec::new();
    for &level in levels {
        let segments = march_triangles(mesh, triangles, level);
        all.extend(connect_segments(mesh, &segments, level));
    }

    tracing::debug!(
        levels = levels.len(),
        lines = all.len(),
        points = all.iter().map(|l| l.points.len()).sum::<usize>(),
        "Generated contour lines"
    );
    all
}
