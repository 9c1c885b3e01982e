use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palettize::dither::{self, Border, FloydSteinberg};
use palettize::{settings, MedianCut, Palette, Quantizer, SplitStrategy};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Nearest palette color with Floyd-Steinberg error diffusion
    Dither,
    /// Nearest palette color only
    Reduce,
    /// Black and white, diffusing the error along each scanline
    Bitmap,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Edges {
    /// Leave the outermost pixels untouched
    Preserve,
    /// Do not quantize the left, right and bottom edges but diffuse into them
    Skip,
    /// Quantize every pixel
    Clip,
}

impl From<Edges> for Border {
    fn from(edges: Edges) -> Self {
        match edges {
            Edges::Preserve => Border::Preserve,
            Edges::Skip => Border::Skip,
            Edges::Clip => Border::Clip,
        }
    }
}

#[derive(Parser)]
#[command(name = "palettize")]
#[command(about = "Reduce an image to a small palette")]
struct Cli {
    /// Source image
    input: PathBuf,

    /// Output image, the format follows the extension
    output: PathBuf,

    /// Number of colors for median cut
    #[arg(short = 'n', long, default_value_t = settings::DEFAULT_PALETTE_SIZE)]
    colors: usize,

    /// Fixed palette as comma-separated hex RGB (e.g. "#FFFFFF,#000000") instead of median cut
    #[arg(short, long)]
    palette: Option<String>,

    /// What to do with the image
    #[arg(short, long, value_enum, default_value_t = Mode::Dither)]
    mode: Mode,

    /// Border handling when dithering
    #[arg(long, value_enum, default_value_t = Edges::Preserve)]
    border: Edges,

    /// Split the widest partition first, which allows color counts that are not a power of two
    #[arg(long)]
    widest: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palettize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();

    let mut image = image::open(&cli.input)
        .with_context(|| format!("Could not load image {:?}", cli.input))?
        .to_rgba8();
    info!(
        width = image.width(),
        height = image.height(),
        "loaded {:?}",
        cli.input
    );

    match cli.mode {
        Mode::Bitmap => dither::threshold(&mut image),
        Mode::Dither | Mode::Reduce => {
            let palette = match &cli.palette {
                Some(list) => Palette::from_hex_list(list).context("Invalid --palette")?,
                None => {
                    let strategy = if cli.widest {
                        SplitStrategy::Widest
                    } else {
                        SplitStrategy::Recursive
                    };
                    MedianCut::new(strategy).quantize(&image, cli.colors)?
                }
            };
            info!(%palette, "using palette");

            if let Mode::Reduce = cli.mode {
                dither::reduce(&mut image, &palette);
            } else {
                FloydSteinberg::new(cli.border.into()).dither(&mut image, &palette);
            }
        }
    }

    image
        .save(&cli.output)
        .with_context(|| format!("Could not write image {:?}", cli.output))?;
    info!("saved {:?}", cli.output);
    Ok(())
}
