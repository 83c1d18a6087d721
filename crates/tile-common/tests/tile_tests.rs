//! Tile enumeration and bounding box behaviour across zoom levels.

use tile_common::bbox::{BboxParseError, BoundingBox, GeoBounds};
use tile_common::tile::{brute_force_tiles, tile_bbox, tiles_for_bounds, TileCoord};

// ============================================================================
// BoundingBox parsing
// ============================================================================

#[test]
fn test_parse_bbox_with_whitespace() {
    let bbox = BoundingBox::from_bbox_string(" -10.5 , 45 , 30 , 65.25 ").unwrap();
    assert_eq!(bbox.min_x, -10.5);
    assert_eq!(bbox.max_y, 65.25);
}

#[test]
fn test_parse_bbox_errors() {
    assert!(matches!(
        BoundingBox::from_bbox_string("1,2,3"),
        Err(BboxParseError::InvalidFormat(_))
    ));
    assert!(matches!(
        BoundingBox::from_bbox_string("1,2,x,4"),
        Err(BboxParseError::InvalidNumber(_))
    ));
}

#[test]
fn test_from_points_extent() {
    let bbox = BoundingBox::from_points(vec![(1.0, 5.0), (-3.0, 2.0), (4.0, -1.0)]).unwrap();
    assert_eq!(bbox, BoundingBox::new(-3.0, -1.0, 4.0, 5.0));
    assert!(BoundingBox::from_points(Vec::new()).is_none());
}

// ============================================================================
// Tile enumeration
// ============================================================================

#[test]
fn test_europe_tiles_per_zoom() {
    let bounds = GeoBounds::new(45.0, 65.0, -10.0, 30.0).unwrap();

    assert_eq!(tiles_for_bounds(&bounds, 0), vec![TileCoord::new(0, 0, 0)]);
    assert_eq!(
        tiles_for_bounds(&bounds, 1),
        vec![TileCoord::new(1, 0, 0), TileCoord::new(1, 1, 0)]
    );
    assert_eq!(
        tiles_for_bounds(&bounds, 2),
        vec![TileCoord::new(2, 1, 1), TileCoord::new(2, 2, 1)]
    );
}

#[test]
fn test_every_enumerated_tile_touches_bounds() {
    let bounds = GeoBounds::new(-12.5, 3.25, 100.0, 140.0).unwrap();
    for zoom in 0..=8 {
        let tiles = tiles_for_bounds(&bounds, zoom);
        assert!(!tiles.is_empty());
        for coord in &tiles {
            assert!(tile_bbox(coord).touches(&bounds.mercator_bbox()), "{}", coord);
        }
    }
}

#[test]
fn test_enumeration_matches_brute_force() {
    let cases = [
        (45.0, 65.0, -10.0, 30.0),
        (-90.0, 90.0, -180.0, 180.0),
        (0.0, 0.5, 0.0, 0.5),
        (-66.51326044311186, 0.0, -90.0, 0.0),
    ];
    for (min_lat, max_lat, min_lon, max_lon) in cases {
        let bounds = GeoBounds::new(min_lat, max_lat, min_lon, max_lon).unwrap();
        for zoom in 0..=5 {
            assert_eq!(
                tiles_for_bounds(&bounds, zoom),
                brute_force_tiles(&bounds, zoom),
                "bounds {:?} zoom {}",
                bounds,
                zoom
            );
        }
    }
}

#[test]
fn test_enumeration_is_deterministic() {
    let bounds = GeoBounds::new(10.0, 20.0, -30.0, 0.0).unwrap();
    assert_eq!(tiles_for_bounds(&bounds, 7), tiles_for_bounds(&bounds, 7));
}

#[test]
fn test_tile_paths() {
    let coord = TileCoord::new(5, 17, 9);
    assert_eq!(coord.relative_path(), std::path::PathBuf::from("5/17/9.png"));
    assert_eq!(coord.to_string(), "5/17/9");
}
