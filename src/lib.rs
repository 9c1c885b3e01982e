//! Reduce images to a small palette
//!
//! A palette is either supplied directly or built from the distinct colors of an image with
//! median cut: the colors are recursively sorted along the channel with the widest range and
//! split at the median, and every final partition is averaged into one entry by its per-channel
//! root mean square. An image is then mapped onto the palette either directly
//! ([`dither::reduce`]) or with Floyd-Steinberg error diffusion ([`dither::floyd_steinberg`]).
//!
//! ```no_run
//! use palettize::{dither, MedianCut, Quantizer};
//!
//! let mut image = image::open("photo.png").unwrap().to_rgba8();
//! let palette = MedianCut::default().quantize(&image, 16).unwrap();
//! dither::floyd_steinberg(&mut image, &palette);
//! ```

#![deny(missing_docs)]

pub use color::{nearest, Color, ParseColorError};
pub use palette::Palette;
pub use quantizer::*;

pub mod color;
pub mod dither;
mod palette;
mod quantizer;
pub mod settings;
