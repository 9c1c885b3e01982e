//! Defaults and fixed constants

use std::ops::Range;

/// Palette size used when none is requested
pub const DEFAULT_PALETTE_SIZE: usize = 16;

/// Palette sizes median cut accepts
pub const COLOR_RANGE: Range<usize> = 1..257;

/// Floyd-Steinberg neighbours as `(dx, dy, weight)`
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: [(i32, u32, i32); 4] = [
    (1, 0, 7),  // right
    (-1, 1, 3), // bottom-left
    (0, 1, 5),  // bottom
    (1, 1, 1),  // bottom-right
];

/// Divisor shared by all [`FLOYD_STEINBERG`] weights
pub const FLOYD_STEINBERG_DIVISOR: i32 = 16;
