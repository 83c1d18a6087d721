//! Common test fixtures: reference extents and output tree helpers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Test extents as `(lat_min, lat_max, lon_min, lon_max)`.
pub mod extents {
    /// Western and central Europe.
    pub const EUROPE: (f64, f64, f64, f64) = (45.0, 65.0, -10.0, 30.0);

    /// Box straddling the equator and the prime meridian.
    pub const GULF_OF_GUINEA: (f64, f64, f64, f64) = (-5.0, 5.0, -5.0, 5.0);
}

/// Every `{z}/{x}/{y}.png` under `root`, as paths relative to it, sorted.
pub fn list_tiles(root: &Path) -> Vec<PathBuf> {
    let mut tiles = Vec::new();
    collect_files(root, root, &mut tiles);
    tiles.retain(|p| p.extension().map_or(false, |e| e == "png"));
    tiles.sort();
    tiles
}

/// Contents of every file under `root`, keyed by relative path.
pub fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files);
    files
        .into_iter()
        .map(|rel| {
            let bytes = fs::read(root.join(&rel)).expect("Failed to read output file");
            (rel, bytes)
        })
        .collect()
}

/// Modification times of every file under `root`, keyed by relative path.
pub fn modified_times(root: &Path) -> BTreeMap<PathBuf, std::time::SystemTime> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files);
    files
        .into_iter()
        .map(|rel| {
            let modified = fs::metadata(root.join(&rel))
                .and_then(|m| m.modified())
                .expect("Failed to stat output file");
            (rel, modified)
        })
        .collect()
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_path_buf());
        }
    }
}

/// Decode PNG bytes into an RGBA image.
pub fn decode_png(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .expect("Failed to decode PNG")
        .to_rgba8()
}

/// Decode a PNG file into an RGBA image.
pub fn read_png(path: &Path) -> image::RgbaImage {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    decode_png(&bytes)
}

/// Whether every pixel has alpha 0.
pub fn is_fully_transparent(img: &image::RgbaImage) -> bool {
    img.pixels().all(|p| p.0[3] == 0)
}

/// Distinct colors in first-appearance order.
pub fn distinct_colors(img: &image::RgbaImage) -> Vec<[u8; 4]> {
    let mut colors: Vec<[u8; 4]> = Vec::new();
    for p in img.pixels() {
        if !colors.contains(&p.0) {
            colors.push(p.0);
        }
    }
    colors
}
