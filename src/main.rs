use clap::Parser;
use quadprobe::{DetectionConfig, SelectionConfig, ShapeLimits, ThresholdParams};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quadprobe", about = "Find quadrilateral blobs and mark a probe region on one edge")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP); converted to grayscale
    #[arg(short, long)]
    input: PathBuf,

    /// Annotated output image (PNG)
    #[arg(short, long, default_value = "result_with_controlled_selection.png")]
    output: PathBuf,

    /// Adaptive threshold neighborhood size (odd, >= 3)
    #[arg(long, default_value = "31")]
    block_size: u32,

    /// Constant subtracted from the local mean
    #[arg(long, default_value = "7", allow_hyphen_values = true)]
    threshold_c: f64,

    /// Minimum contour area in pixels
    #[arg(long, default_value = "400")]
    min_area: f64,

    /// Maximum contour area in pixels
    #[arg(long, default_value = "20000")]
    max_area: f64,

    /// Minimum rotated-rectangle aspect ratio (>= 1)
    #[arg(long, default_value = "1.0")]
    min_aspect: f64,

    /// Maximum rotated-rectangle aspect ratio
    #[arg(long, default_value = "4.0")]
    max_aspect: f64,

    /// Minimum area / bounding box area
    #[arg(long, default_value = "0.35")]
    min_extent: f64,

    /// Minimum area / convex hull area
    #[arg(long, default_value = "0.85")]
    min_solidity: f64,

    /// Accept 4-6 vertex polygons instead of exact quads
    #[arg(long)]
    relaxed: bool,

    /// Edge to anchor the region to (0-3; out-of-range values are clamped)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    edge: i32,

    /// Region width perpendicular to the edge, in pixels
    #[arg(short, long, default_value = "30")]
    width: f64,

    /// Region length along the edge, in percent of the edge length
    #[arg(short, long, default_value = "80")]
    length: f64,

    /// Place the region outside the quad instead of inside
    #[arg(long)]
    outwards: bool,

    /// Center the region on the edge instead of placing it on one side
    #[arg(long)]
    straddle: bool,

    /// Skip region building
    #[arg(long)]
    no_region: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let vertex_range = if cli.relaxed { 4..=6 } else { 4..=4 };
    let selection = SelectionConfig {
        edge_index: cli.edge,
        extension_width: cli.width,
        extension_length: cli.length,
        extend_inwards: !cli.outwards,
        straddle_edge: cli.straddle,
        ..SelectionConfig::default()
    };
    let config = DetectionConfig {
        threshold: ThresholdParams {
            block_size: cli.block_size,
            c: cli.threshold_c,
            ..ThresholdParams::default()
        },
        limits: ShapeLimits {
            min_area: cli.min_area,
            max_area: cli.max_area,
            min_aspect: cli.min_aspect,
            max_aspect: cli.max_aspect,
            min_extent: cli.min_extent,
            min_solidity: cli.min_solidity,
            vertex_range,
        },
        selection: (!cli.no_region).then_some(selection),
        ..DetectionConfig::default()
    };

    tracing::info!("Loading image: {}", cli.input.display());
    let gray = quadprobe::load_gray(&cli.input)?;
    let result = quadprobe::detect(&gray, &config)?;

    println!("Detected candidates: {}", result.candidates.len());
    for (i, candidate) in result.candidates.iter().enumerate() {
        println!(
            "[{}] center=({:.2}, {:.2})",
            i, candidate.centroid.x, candidate.centroid.y
        );
    }
    println!(
        "Width: {}, Length: {}, Edge: E{}, Inward: {}",
        selection.extension_width,
        selection.extension_length,
        selection.clamped_edge(),
        selection.extend_inwards,
    );

    quadprobe::render::render_annotated(&gray, &result, config.selection.as_ref(), &cli.output)?;
    println!("Saved: {}", cli.output.display());

    Ok(())
}
