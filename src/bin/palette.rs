use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palettize::{settings, MedianCut, Quantizer, SplitStrategy};

#[derive(Parser)]
#[command(name = "palettize-palette")]
#[command(about = "Print the median cut palette of an image")]
struct Cli {
    /// Source image
    image: PathBuf,

    /// Number of colors
    #[arg(short = 'n', long, default_value_t = settings::DEFAULT_PALETTE_SIZE)]
    colors: usize,

    /// Split the widest partition first, which allows color counts that are not a power of two
    #[arg(long)]
    widest: bool,

    /// Order the colors by how many pixels use them
    #[arg(long)]
    by_frequency: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palettize=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();
    let img = image::open(&cli.image)
        .with_context(|| format!("Could not load image {:?}", cli.image))?;

    let strategy = if cli.widest {
        SplitStrategy::Widest
    } else {
        SplitStrategy::Recursive
    };
    let palette = MedianCut::new(strategy).quantize(&img, cli.colors)?;
    let palette = if cli.by_frequency {
        palette.sort_by_frequency(&img)
    } else {
        palette
    };

    println!("{}", palette);
    Ok(())
}
