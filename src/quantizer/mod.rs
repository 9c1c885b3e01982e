use std::ops::Range;

use image::{GenericImageView, Pixel};
use itertools::Itertools;
use thiserror::Error;

use crate::color::ParseColorError;
use crate::{Color, Palette};

mod median_cut;

pub use median_cut::{MedianCut, SplitStrategy};

/// Errors when building or using a palette
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A palette needs at least one color
    #[error("palette cannot be empty")]
    EmptyPalette,
    /// There were no colors to build a palette from
    #[error("no colors to build a palette from")]
    NoColors,
    /// Color count was out of bounds
    #[error("color count {0} out of bounds {1:?}")]
    ColorCountOutOfBounds(usize, Range<usize>),
    /// A palette entry could not be parsed
    #[error("invalid color: {0}")]
    ParseColor(#[from] ParseColorError),
}

/// Quantizer trait
pub trait Quantizer {
    /// Build a palette of the given color count that represents the colors of `image`
    fn quantize<I, P>(&self, image: &I, colors: usize) -> Result<Palette, Error>
    where
        P: Pixel<Subpixel = u8> + 'static,
        I: GenericImageView<Pixel = P>;
}

/// Every distinct color of `image`, in the order it is first met in raster order.
///
/// Colors are distinct if any of the four channels differ. Collecting distinct colors first
/// keeps large flat regions from dominating the partitioning.
pub fn distinct_colors<I, P>(image: &I) -> Vec<Color>
where
    P: Pixel<Subpixel = u8> + 'static,
    I: GenericImageView<Pixel = P>,
{
    image
        .pixels()
        .map(|(_, _, pixel)| Color::from(pixel.to_rgba()))
        .unique_by(|color| color.pack())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_distinct_colors_keeps_first_occurrence_order() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 255]));
        image.put_pixel(1, 0, Rgba([1, 2, 3, 255]));
        image.put_pixel(2, 2, Rgba([1, 2, 3, 255]));
        image.put_pixel(0, 1, Rgba([1, 2, 3, 0]));

        assert_eq!(
            distinct_colors(&image),
            vec![
                Color::new(9, 9, 9, 255),
                Color::new(1, 2, 3, 255),
                Color::new(1, 2, 3, 0),
            ]
        );
    }

    #[test]
    fn test_distinct_colors_no_decimal_hash_collisions() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([1, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([0, 10, 0, 0]));
        assert_eq!(distinct_colors(&image).len(), 2);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::ColorCountOutOfBounds(0, 1..257).to_string(),
            "color count 0 out of bounds 1..257"
        );
        assert_eq!(
            Error::from(ParseColorError::InvalidLength).to_string(),
            "invalid color: invalid hex color length (expected 3 or 6 digits)"
        );
    }
}
