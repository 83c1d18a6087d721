//! Tests for PNG encoding of rendered tiles.
//!
//! Both color types must decode to exactly the rendered pixels; indexed
//! output should be smaller for band-filled tiles.

use renderer::png::{create_png, create_png_indexed};
use renderer::{encode_png, PngEncoding, TileImage};
use test_utils::{create_test_rgba_pixels, decode_png, distinct_colors};
use tile_common::tile::TileCoord;

/// Band-like tile: 12 vertical stripes of flat color.
fn striped_pixels(size: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(size * size * 4);
    for _y in 0..size {
        for x in 0..size {
            let band = (x * 12 / size) as u8;
            pixels.extend_from_slice(&[band * 20, 255 - band * 20, 90, 255]);
        }
    }
    pixels
}

#[test]
fn test_both_encodings_decode_to_same_pixels() {
    let pixels = striped_pixels(256);
    for encoding in [PngEncoding::Rgba, PngEncoding::Indexed] {
        let png = encode_png(&pixels, 256, 256, encoding).unwrap();
        assert_eq!(decode_png(&png).into_raw(), pixels, "{:?}", encoding);
    }
}

#[test]
fn test_indexed_smaller_for_band_tiles() {
    let pixels = striped_pixels(256);
    let rgba = encode_png(&pixels, 256, 256, PngEncoding::Rgba).unwrap();
    let indexed = encode_png(&pixels, 256, 256, PngEncoding::Indexed).unwrap();
    assert!(indexed.len() < rgba.len(), "indexed {} >= rgba {}", indexed.len(), rgba.len());
}

#[test]
fn test_indexed_falls_back_above_256_colors() {
    let pixels = create_test_rgba_pixels(256, 256);
    let png = encode_png(&pixels, 256, 256, PngEncoding::Indexed).unwrap();
    // IHDR color type byte
    assert_eq!(png[25], 6);
    assert_eq!(decode_png(&png).into_raw(), pixels);
}

#[test]
fn test_palette_keeps_alpha() {
    let palette = [[0, 0, 0, 0], [255, 0, 0, 128]];
    let indices = [0u8, 1, 1, 0];
    let png = create_png_indexed(2, 2, &palette, &indices).unwrap();
    let img = decode_png(&png);
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 128]);
}

#[test]
fn test_transparent_tile_encodes() {
    let tile = TileImage::transparent(TileCoord::new(3, 1, 2));
    for encoding in [PngEncoding::Rgba, PngEncoding::Indexed] {
        let img = decode_png(&tile.encode(encoding).unwrap());
        assert_eq!(img.dimensions(), (256, 256));
        assert_eq!(distinct_colors(&img), vec![[0, 0, 0, 0]]);
    }
}

#[test]
fn test_create_png_rgba_header() {
    let pixels = create_test_rgba_pixels(4, 3);
    let png = create_png(&pixels, 4, 3).unwrap();
    assert_eq!(&png[1..4], b"PNG");
    assert_eq!(&png[12..16], b"IHDR");
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 4);
    assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 3);
    assert_eq!(png[24], 8);
}

#[test]
fn test_encoding_parse() {
    assert_eq!("RGBA".parse::<PngEncoding>().unwrap(), PngEncoding::Rgba);
    assert_eq!("palette".parse::<PngEncoding>().unwrap(), PngEncoding::Indexed);
    assert!("jpeg".parse::<PngEncoding>().is_err());
}
