//! Scratch directories for tile output.

/// Temporary output root, removed when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("seatile-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
