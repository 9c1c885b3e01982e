use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use image::{GenericImageView, Pixel};
use itertools::Itertools;

#[cfg(feature = "print-truecolor")]
use termion::color as term;

use crate::{Color, Error};

/// Ordered, non-empty list of colors.
///
/// Entries are referred to by index; indices never change once the palette is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Create a palette from a list of colors
    pub fn new(colors: Vec<Color>) -> Result<Self, Error> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        Ok(Self { colors })
    }

    /// Parse a comma separated list of hex colors, e.g. `#FFFFFF,#000000`
    pub fn from_hex_list(list: &str) -> Result<Self, Error> {
        let colors = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<Color>())
            .collect::<Result<Vec<Color>, _>>()?;
        Self::new(colors)
    }

    /// The colors in palette order
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of entries, at least one
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }

    /// Index of the entry closest to `color`, ties going to the lowest index
    pub fn nearest(&self, color: &Color) -> usize {
        let mut index = 0;
        let mut smallest = color.distance(&self.colors[0]);
        for (i, candidate) in self.colors.iter().enumerate().skip(1) {
            let distance = color.distance(candidate);
            if distance < smallest {
                smallest = distance;
                index = i;
            }
        }
        index
    }

    /// The entry closest to `color`
    pub fn map_color(&self, color: &Color) -> Color {
        self.colors[self.nearest(color)]
    }

    /// Count how many pixels of `image` map to each entry.
    ///
    /// Entries no pixel maps to are absent from the result.
    pub fn pixel_counts<I, P>(&self, image: &I) -> HashMap<usize, usize>
    where
        P: Pixel<Subpixel = u8> + 'static,
        I: GenericImageView<Pixel = P>,
    {
        image
            .pixels()
            .map(|(_, _, pixel)| self.nearest(&Color::from(pixel.to_rgba())))
            .counts()
    }

    /// Change ordering of colors in palette to be by descending frequency in `image`.
    ///
    /// Entries used equally often keep their relative order.
    pub fn sort_by_frequency<I, P>(&self, image: &I) -> Self
    where
        P: Pixel<Subpixel = u8> + 'static,
        I: GenericImageView<Pixel = P>,
    {
        let counts = self.pixel_counts(image);
        let colors = self
            .colors
            .iter()
            .enumerate()
            .sorted_by_key(|(i, _)| Reverse(counts.get(i).copied().unwrap_or(0)))
            .map(|(_, &color)| color)
            .collect();
        Self { colors }
    }

    /// Consume the palette, returning its colors
    pub fn into_vec(self) -> Vec<Color> {
        self.colors
    }
}

#[cfg(feature = "print-truecolor")]
fn swatch(color: &Color) -> String {
    format!(
        "{} {}███{}",
        color,
        term::Fg(term::Rgb(color.r, color.g, color.b)),
        term::Fg(term::Reset)
    )
}

#[cfg(not(feature = "print-truecolor"))]
fn swatch(color: &Color) -> String {
    color.to_string()
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let color_list = self.colors.iter().map(swatch).join(", ");

        write!(f, "Color Palette {{ {} }}", color_list)
    }
}
