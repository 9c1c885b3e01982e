//! Mapping images onto a palette
//!
//! [`reduce`] replaces every pixel with its nearest palette entry. [`floyd_steinberg`] does the
//! same in raster order while pushing each pixel's quantization error onto the neighbours that
//! have not been visited yet:
//!
//! ```text
//!        X   7
//!    3   5   1      (/16)
//! ```
//!
//! Both work in place on any [`GenericImage`] with RGBA pixels; `y` is the row and `x` the
//! column.

use std::ops::Range;

use image::{GenericImage, Rgba};
use tracing::trace;

use crate::settings::{FLOYD_STEINBERG, FLOYD_STEINBERG_DIVISOR};
use crate::{Color, Palette};

/// Replace every pixel with the nearest palette entry, without error diffusion
pub fn reduce<I>(image: &mut I, palette: &Palette)
where
    I: GenericImage<Pixel = Rgba<u8>>,
{
    let (width, height) = image.dimensions();
    for y in 0..height {
        for x in 0..width {
            let color = Color::from(image.get_pixel(x, y));
            image.put_pixel(x, y, palette.map_color(&color).into());
        }
    }
    trace!(width, height, colors = palette.len(), "reduced image to palette");
}

/// Floyd-Steinberg dithering with the default [`Border`] handling
pub fn floyd_steinberg<I>(image: &mut I, palette: &Palette)
where
    I: GenericImage<Pixel = Rgba<u8>>,
{
    FloydSteinberg::default().dither(image, palette)
}

/// Which pixels the Floyd-Steinberg pass quantizes and diffuses into
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Border {
    /// The outermost rows and columns keep their values: they are neither quantized nor
    /// receive error.
    #[default]
    Preserve,
    /// Quantize rows `0..height - 1` and columns `1..width - 1`, so that the kernel never
    /// leaves the image. The left and right columns and the bottom row still receive error
    /// but are not quantized.
    Skip,
    /// Quantize every pixel and drop the error that would leave the image.
    Clip,
}

impl Border {
    /// Rows and columns visited for an image of the given size
    fn visited(self, width: u32, height: u32) -> (Range<u32>, Range<u32>) {
        match self {
            Border::Preserve => (1..height.saturating_sub(1), 1..width.saturating_sub(1)),
            Border::Skip => (0..height.saturating_sub(1), 1..width.saturating_sub(1)),
            Border::Clip => (0..height, 0..width),
        }
    }

    /// Whether `(x, y)` may receive diffused error
    fn receives(self, x: i64, y: i64, width: u32, height: u32) -> bool {
        let (width, height) = (i64::from(width), i64::from(height));
        match self {
            Border::Preserve => 0 < x && x < width - 1 && 0 < y && y < height - 1,
            Border::Skip | Border::Clip => 0 <= x && x < width && 0 <= y && y < height,
        }
    }
}

/// Quantization error of one pixel, per channel
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Residual {
    r: i32,
    g: i32,
    b: i32,
}

impl Residual {
    fn between(original: Color, quantized: Color) -> Self {
        Self {
            r: i32::from(original.r) - i32::from(quantized.r),
            g: i32::from(original.g) - i32::from(quantized.g),
            b: i32::from(original.b) - i32::from(quantized.b),
        }
    }

    /// Add `weight / 16` of the error to `pixel`, leaving alpha alone
    fn spread(self, pixel: Rgba<u8>, weight: i32) -> Rgba<u8> {
        let add = |c: u8, e: i32| {
            (i32::from(c) + e * weight / FLOYD_STEINBERG_DIVISOR).clamp(0, 255) as u8
        };
        let [r, g, b, a] = pixel.0;
        Rgba([add(r, self.r), add(g, self.g), add(b, self.b), a])
    }
}

/// Floyd-Steinberg error diffusion
#[derive(Debug, Default, Clone)]
pub struct FloydSteinberg {
    /// Border handling
    pub border: Border,
}

impl FloydSteinberg {
    /// Floyd-Steinberg dithering with the given border handling
    pub fn new(border: Border) -> Self {
        Self { border }
    }

    /// Dither `image` in place onto `palette`.
    ///
    /// Pixels are visited in raster order and written immediately, so every pixel has collected
    /// the error of its already visited neighbours by the time it is quantized.
    pub fn dither<I>(&self, image: &mut I, palette: &Palette)
    where
        I: GenericImage<Pixel = Rgba<u8>>,
    {
        let (width, height) = image.dimensions();
        let (rows, columns) = self.border.visited(width, height);
        for y in rows {
            for x in columns.clone() {
                let original = Color::from(image.get_pixel(x, y));
                let quantized = palette.map_color(&original);
                image.put_pixel(x, y, quantized.into());

                let residual = Residual::between(original, quantized);
                for &(dx, dy, weight) in FLOYD_STEINBERG.iter() {
                    let (nx, ny) = (i64::from(x) + i64::from(dx), i64::from(y) + i64::from(dy));
                    if !self.border.receives(nx, ny, width, height) {
                        continue;
                    }
                    let (nx, ny) = (nx as u32, ny as u32);
                    let neighbour = image.get_pixel(nx, ny);
                    image.put_pixel(nx, ny, residual.spread(neighbour, weight));
                }
            }
        }
        trace!(width, height, border = ?self.border, "dithered image");
    }
}

/// Black and white error diffusion along each scanline, driven by the red channel.
///
/// Every row starts without error. A pixel becomes white if its red value plus the carried
/// error is closer to 255 than to 0, and the difference is carried to the next pixel. Meant
/// for greyscale images; alpha is kept.
pub fn threshold<I>(image: &mut I)
where
    I: GenericImage<Pixel = Rgba<u8>>,
{
    let (width, height) = image.dimensions();
    for y in 0..height {
        let mut error = 0i32;
        for x in 0..width {
            let mut pixel = image.get_pixel(x, y);
            let intensity = i32::from(pixel.0[0]) + error;
            let value = if 255 - intensity < intensity {
                error = intensity - 255;
                255
            } else {
                error = intensity;
                0
            };
            pixel.0[..3].copy_from_slice(&[value; 3]);
            image.put_pixel(x, y, pixel);
        }
    }
}
