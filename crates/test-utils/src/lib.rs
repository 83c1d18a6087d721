//! Test support for the seatile crates: synthetic fields, tile tree
//! inspection and tolerance assertions for floats and pixels.
//!
//! ```ignore
//! use test_utils::{extents, ramp_grid, list_tiles};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Asserts `|left - right| <= epsilon` after widening all three to `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Asserts that an RGBA pixel matches within a per-channel tolerance.
///
/// ```ignore
/// assert_pixel_near!(img.get_pixel(5, 5).0, [255, 0, 0, 255], 2);
/// ```
#[macro_export]
macro_rules! assert_pixel_near {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let actual: [u8; 4] = $actual;
        let expected: [u8; 4] = $expected;
        let tolerance: i32 = $tolerance as i32;
        for c in 0..4 {
            let diff = (actual[c] as i32 - expected[c] as i32).abs();
            if diff > tolerance {
                panic!(
                    "assertion failed: pixel `{:?}` differs from `{:?}` in channel {} by {} > {}",
                    actual, expected, c, diff, tolerance
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_pixel_near_passes() {
        assert_pixel_near!([10, 20, 30, 255], [11, 19, 30, 255], 1);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_pixel_near_fails() {
        assert_pixel_near!([10, 20, 30, 255], [20, 20, 30, 255], 2);
    }
}
