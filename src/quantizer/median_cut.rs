use std::cmp::Reverse;
use std::iter;
use std::ops::Range;

use image::{GenericImageView, Pixel};
use priority_queue::PriorityQueue;
use tracing::{debug, warn};

use crate::settings::COLOR_RANGE;
use crate::{distinct_colors, Color, Error, Palette, Quantizer};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
struct Rgb<T> {
    r: T,
    g: T,
    b: T,
}

impl<T> Rgb<T> {
    fn splat(value: T) -> Self
    where
        T: Copy,
    {
        Rgb {
            r: value,
            g: value,
            b: value,
        }
    }

    fn map<O>(self, mut f: impl FnMut(T) -> O) -> Rgb<O> {
        Rgb {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    fn as_mut(&mut self) -> Rgb<&mut T> {
        Rgb {
            r: &mut self.r,
            g: &mut self.g,
            b: &mut self.b,
        }
    }

    fn zip<O>(self, other: Rgb<O>) -> Rgb<(T, O)> {
        Rgb {
            r: (self.r, other.r),
            g: (self.g, other.g),
            b: (self.b, other.b),
        }
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct MinMax {
    min: u8,
    max: u8,
}

impl MinMax {
    const EMPTY: MinMax = MinMax {
        min: u8::MAX,
        max: u8::MIN,
    };

    fn extend(&mut self, value: u8) {
        if value < self.min {
            self.min = value;
        }
        if self.max < value {
            self.max = value;
        }
    }

    fn len(&self) -> u8 {
        self.max.saturating_sub(self.min)
    }
}

/// Color channel a partition is sorted and split along
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn accessor(self) -> fn(&Color) -> u8 {
        match self {
            Channel::Red => |c: &Color| c.r,
            Channel::Green => |c: &Color| c.g,
            Channel::Blue => |c: &Color| c.b,
        }
    }
}

struct Bounds(Rgb<MinMax>);

impl Bounds {
    fn from_colors(colors: &[Color]) -> Self {
        let mut bounds = Bounds(Rgb::splat(MinMax::EMPTY));
        for &color in colors {
            bounds.extend(color);
        }
        bounds
    }

    fn extend(&mut self, color: Color) {
        self.0
            .as_mut()
            .zip(Rgb::from(color))
            .map(|(mm, c)| mm.extend(c));
    }

    fn widest_len(&self) -> u8 {
        self.0.r.len().max(self.0.g.len()).max(self.0.b.len())
    }

    /// Channel with the largest range, ties going to red, then green
    fn longest_dimension(&self) -> Channel {
        let r = self.0.r.len();
        let g = self.0.g.len();
        let b = self.0.b.len();
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }
}

/// Per-channel root mean square, rounded down. The result is opaque.
fn quadratic_mean(colors: &[Color]) -> Color {
    let n = colors.len() as f64;
    let squares = colors
        .iter()
        .fold(Rgb::<f64>::default(), |acc, &color| {
            acc.zip(Rgb::from(color))
                .map(|(sum, c)| sum + c as f64 * c as f64)
        });
    let Rgb { r, g, b } = squares.map(|sum| (sum / n).sqrt() as u8);
    Color::opaque(r, g, b)
}

/// Sort `colors` along the channel with the largest range and return the length of the left
/// half, the lower median included.
fn bisect(colors: &mut [Color], bounds: &Bounds) -> usize {
    colors.sort_by_key(bounds.longest_dimension().accessor());
    (colors.len() - 1) / 2 + 1
}

struct VBox<'a> {
    bounds: Bounds,
    colors: &'a mut [Color],
}

impl<'a> VBox<'a> {
    fn from_colors(colors: &'a mut [Color]) -> Self {
        Self {
            bounds: Bounds::from_colors(colors),
            colors,
        }
    }

    fn average(&self) -> Color {
        quadratic_mean(self.colors)
    }

    /// Split at the median of the widest channel; a box with a single color comes back as is
    fn split(self) -> Result<(VBox<'a>, VBox<'a>), VBox<'a>> {
        if self.colors.len() < 2 {
            return Err(self);
        }
        let colors = self.colors;
        let mid = bisect(colors, &self.bounds);
        let (a, b) = colors.split_at_mut(mid);
        Ok((VBox::from_colors(a), VBox::from_colors(b)))
    }
}

fn split_recursive(vbox: VBox<'_>, depth: u32, palette: &mut Vec<Color>) {
    if depth == 0 {
        palette.push(vbox.average());
        return;
    }
    match vbox.split() {
        Ok((a, b)) => {
            split_recursive(a, depth - 1, palette);
            split_recursive(b, depth - 1, palette);
        }
        Err(single) => {
            // every leaf below a lone color averages to that color
            let color = single.average();
            palette.extend(iter::repeat(color).take(1 << depth));
        }
    }
}

type Priority = (u8, usize, Reverse<usize>);

fn priority(colors: &[Color], range: &Range<usize>) -> Priority {
    let slice = &colors[range.clone()];
    (
        Bounds::from_colors(slice).widest_len(),
        slice.len(),
        Reverse(range.start),
    )
}

fn split_widest(colors: &mut [Color], target: usize) -> Vec<Color> {
    let mut queue: PriorityQueue<Range<usize>, Priority> = PriorityQueue::new();
    let all = 0..colors.len();
    queue.push(all.clone(), priority(colors, &all));

    while queue.len() < target {
        let splittable = queue.peek().map_or(false, |(range, _)| range.len() > 1);
        if !splittable {
            // only single colors left
            break;
        }
        if let Some((range, _)) = queue.pop() {
            let slice = &mut colors[range.clone()];
            let bounds = Bounds::from_colors(slice);
            let mid = range.start + bisect(slice, &bounds);
            let (a, b) = (range.start..mid, mid..range.end);
            let (pa, pb) = (priority(colors, &a), priority(colors, &b));
            queue.push(a, pa);
            queue.push(b, pb);
        }
    }

    let mut ranges = queue.into_vec();
    ranges.sort_unstable_by_key(|range| range.start);
    ranges
        .into_iter()
        .map(|range| quadratic_mean(&colors[range]))
        .collect()
}

/// How the color space is divided into palette entries
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum SplitStrategy {
    /// Split every partition, depth first, `floor(log2(colors))` times.
    ///
    /// Yields exactly `colors` entries for powers of two and the next lower power of two
    /// otherwise.
    #[default]
    Recursive,
    /// Repeatedly split the partition with the widest channel range until there are `colors`
    /// partitions or none can be split any further.
    Widest,
}

/// Median cut quantizer
#[derive(Debug, Default, Clone)]
pub struct MedianCut {
    /// Partitioning strategy
    pub strategy: SplitStrategy,
}

impl MedianCut {
    /// Median cut quantizer using `strategy`
    pub fn new(strategy: SplitStrategy) -> Self {
        Self { strategy }
    }

    /// Build a palette of up to `size` colors from `colors`.
    ///
    /// `colors` is reordered while partitioning and then dropped. Entries come out in the
    /// order the partitions lie along the sorted colors, left to right.
    pub fn build(&self, mut colors: Vec<Color>, size: usize) -> Result<Palette, Error> {
        if !COLOR_RANGE.contains(&size) {
            return Err(Error::ColorCountOutOfBounds(size, COLOR_RANGE));
        }
        if colors.is_empty() {
            return Err(Error::NoColors);
        }

        let palette = match self.strategy {
            SplitStrategy::Recursive => {
                let depth = usize::BITS - 1 - size.leading_zeros();
                if !size.is_power_of_two() {
                    warn!(
                        requested = size,
                        produced = 1usize << depth,
                        "palette size is not a power of two"
                    );
                }
                let mut palette = Vec::with_capacity(1 << depth);
                split_recursive(VBox::from_colors(&mut colors), depth, &mut palette);
                palette
            }
            SplitStrategy::Widest => split_widest(&mut colors, size),
        };

        debug!(
            input = colors.len(),
            size = palette.len(),
            strategy = ?self.strategy,
            "built median cut palette"
        );
        Palette::new(palette)
    }
}

impl Quantizer for MedianCut {
    fn quantize<I, P>(&self, image: &I, colors: usize) -> Result<Palette, Error>
    where
        P: Pixel<Subpixel = u8> + 'static,
        I: GenericImageView<Pixel = P>,
    {
        let distinct = distinct_colors(image);
        debug!(colors = distinct.len(), "distinct colors in image");
        self.build(distinct, colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gray(v: u8) -> Color {
        Color::opaque(v, v, v)
    }

    fn recursive(colors: Vec<Color>, size: usize) -> Vec<Color> {
        MedianCut::default().build(colors, size).unwrap().into_vec()
    }

    fn widest(colors: Vec<Color>, size: usize) -> Vec<Color> {
        MedianCut::new(SplitStrategy::Widest)
            .build(colors, size)
            .unwrap()
            .into_vec()
    }

    #[test]
    fn test_longest_dimension_ties() {
        let dimension = |colors: &[Color]| Bounds::from_colors(colors).longest_dimension();
        let rg = [Color::opaque(0, 0, 0), Color::opaque(10, 10, 0)];
        let gb = [Color::opaque(0, 0, 0), Color::opaque(0, 10, 10)];
        let rb = [Color::opaque(0, 0, 0), Color::opaque(10, 0, 10)];
        let b = [Color::opaque(0, 0, 0), Color::opaque(5, 5, 10)];
        assert_eq!(dimension(&rg), Channel::Red);
        assert_eq!(dimension(&gb), Channel::Green);
        assert_eq!(dimension(&rb), Channel::Red);
        assert_eq!(dimension(&b), Channel::Blue);
        assert_eq!(dimension(&[gray(7)]), Channel::Red);
    }

    #[test]
    fn test_quadratic_mean_rounds_down() {
        // arithmetic mean would be 127
        assert_eq!(quadratic_mean(&[gray(0), gray(255)]), gray(180));
        assert_eq!(quadratic_mean(&[gray(42); 5]), gray(42));
        assert_eq!(
            quadratic_mean(&[Color::new(3, 4, 0, 0), Color::new(4, 3, 0, 0)]),
            Color::opaque(3, 3, 0)
        );
    }

    #[test]
    fn test_single_color_palette() {
        assert_eq!(recursive(vec![gray(0), gray(255)], 1), vec![gray(180)]);
    }

    #[test]
    fn test_split_at_lower_median() {
        let colors = vec![
            Color::opaque(30, 0, 0),
            Color::opaque(0, 0, 0),
            Color::opaque(20, 0, 0),
            Color::opaque(10, 0, 0),
        ];
        // [0, 10] | [20, 30]
        assert_eq!(
            recursive(colors, 2),
            vec![Color::opaque(7, 0, 0), Color::opaque(25, 0, 0)]
        );
    }

    #[test]
    fn test_split_along_widest_channel() {
        let colors = vec![
            Color::opaque(9, 0, 200),
            Color::opaque(0, 0, 0),
            Color::opaque(5, 0, 100),
        ];
        // sorted by blue, odd length puts the middle color on the left
        assert_eq!(
            recursive(colors, 2),
            vec![Color::opaque(3, 0, 70), Color::opaque(9, 0, 200)]
        );
    }

    #[test]
    fn test_two_clusters_four_entries() {
        let colors = vec![gray(250), gray(10)];
        assert_eq!(
            recursive(colors, 4),
            vec![gray(10), gray(10), gray(250), gray(250)]
        );
    }

    #[test]
    fn test_non_power_of_two_truncates() {
        let colors = (0..32).map(|v| gray(v * 8)).collect::<Vec<_>>();
        assert_eq!(recursive(colors.clone(), 6).len(), 4);
        assert_eq!(recursive(colors.clone(), 7).len(), 4);
        assert_eq!(recursive(colors, 8).len(), 8);
    }

    #[test]
    fn test_build_errors() {
        let cut = MedianCut::default();
        assert_eq!(cut.build(vec![], 4), Err(Error::NoColors));
        assert_eq!(
            cut.build(vec![gray(1)], 0),
            Err(Error::ColorCountOutOfBounds(0, COLOR_RANGE))
        );
        assert_eq!(
            cut.build(vec![gray(1)], 257),
            Err(Error::ColorCountOutOfBounds(257, COLOR_RANGE))
        );
    }

    #[test]
    fn test_widest_splits_largest_spread_first() {
        let colors = vec![gray(200), gray(0), gray(100), gray(10)];
        assert_eq!(widest(colors, 3), vec![gray(7), gray(100), gray(200)]);
    }

    #[test]
    fn test_widest_accepts_any_size() {
        let colors = (0..32).map(|v| gray(v * 8)).collect::<Vec<_>>();
        assert_eq!(widest(colors.clone(), 6).len(), 6);
        assert_eq!(widest(colors, 13).len(), 13);
    }

    #[test]
    fn test_widest_stops_at_distinct_colors() {
        assert_eq!(widest(vec![gray(250), gray(10)], 8), vec![gray(10), gray(250)]);
    }

    #[test]
    fn test_quantize_image() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255]));
        for x in 0..4 {
            image.put_pixel(x, 3, Rgba([250, 250, 250, 255]));
        }
        let palette = MedianCut::default().quantize(&image, 2).unwrap();
        assert_eq!(palette.colors(), &[gray(10), gray(250)]);
    }
}
