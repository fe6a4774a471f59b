use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use keytracker::{render, Connectivity, KeyShape, MaskSource, Parameters, Pipeline};

#[derive(Parser)]
#[command(name = "keytracker")]
#[command(about = "Find keycaps and knobs in a photo of a keyboard")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Key shape to look for
    #[arg(long)]
    shape: Option<KeyShape>,

    /// JSON parameter file; flags below override its fields
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Start from the edge-driven rectangular preset instead of the defaults
    #[arg(long, conflicts_with = "params")]
    edges: bool,

    /// Lower HSV bound as three fractions, e.g. 0.11,0.6,0.2
    #[arg(long, value_name = "H,S,V", value_parser = parse_triple)]
    hsv_low: Option<[f32; 3]>,

    /// Upper HSV bound as three fractions
    #[arg(long, value_name = "H,S,V", value_parser = parse_triple)]
    hsv_high: Option<[f32; 3]>,

    #[arg(long)]
    close_kernel: Option<u32>,

    #[arg(long)]
    open_kernel: Option<u32>,

    #[arg(long)]
    blur_kernel: Option<u32>,

    /// Reject regions taller than this many widths
    #[arg(long)]
    aspect_ratio: Option<f32>,

    /// Minimum circle IOU for round keys
    #[arg(long)]
    iou: Option<f32>,

    /// Pixel adjacency, 4 or 8
    #[arg(long)]
    connectivity: Option<Connectivity>,

    /// Canny low threshold; switches the mask source to edges
    #[arg(long)]
    canny_threshold: Option<f32>,

    /// Box blur radius applied before edge detection
    #[arg(long)]
    blur_radius: Option<u32>,

    /// Write the source image with detected boxes drawn on it
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the effective parameters as JSON and exit
    #[arg(long)]
    print_params: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_triple(s: &str) -> Result<[f32; 3], String> {
    let values: Vec<f32> = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<_, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f32>| format!("expected 3 comma-separated values, got {}", v.len()))
}

fn setup_logging(verbose: bool) {
    let base_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Defaults (or a parameter file), then individual flag overrides.
fn build_params(args: &Cli) -> anyhow::Result<Parameters> {
    let mut params = match &args.params {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
            Parameters::from_json(&json)?
        }
        None if args.edges => Parameters::edge_preset(),
        None => Parameters::default(),
    };

    if let Some(shape) = args.shape {
        params.shape = shape;
    }
    if let Some(low) = args.hsv_low {
        params.hsv_low = low;
    }
    if let Some(high) = args.hsv_high {
        params.hsv_high = high;
    }
    if let Some(k) = args.close_kernel {
        params.close_kernel = k;
    }
    if let Some(k) = args.open_kernel {
        params.open_kernel = k;
    }
    if let Some(k) = args.blur_kernel {
        params.blur_kernel = k;
    }
    if let Some(ratio) = args.aspect_ratio {
        params.aspect_ratio_threshold = ratio;
    }
    if let Some(iou) = args.iou {
        params.iou_threshold = iou;
    }
    if let Some(connectivity) = args.connectivity {
        params.connectivity = connectivity;
    }

    if args.canny_threshold.is_some() || args.blur_radius.is_some() {
        let (threshold, radius) = match params.mask_source {
            MaskSource::Edges {
                canny_threshold,
                blur_radius,
            } => (canny_threshold, blur_radius),
            MaskSource::Color => (30.0, 1),
        };
        params.mask_source = MaskSource::Edges {
            canny_threshold: args.canny_threshold.unwrap_or(threshold),
            blur_radius: args.blur_radius.unwrap_or(radius),
        };
    }

    params.validate()?;
    Ok(params)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    setup_logging(args.verbose);

    let params = build_params(&args)?;
    if args.print_params {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    tracing::debug!(path = %args.image_path.display(), "loading image");
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    tracing::debug!(width = img.width(), height = img.height(), "image loaded");

    let mut pipeline = Pipeline::new(params)?;
    if let Some(debug_dir) = args.debug_out.clone() {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let detection = pipeline.run(&img)?;

    println!("\n=== {} key detection ===", pipeline.params().shape);
    println!("Components labeled: {}", detection.labels.count());
    println!("Keys detected: {}", detection.boxes.len());
    for (i, bbox) in detection.boxes.iter().enumerate() {
        let (left, top) = bbox.top_left();
        let (right, bottom) = bbox.bottom_right();
        println!(
            "  {:3}: ({}, {}) - ({}, {})  {}x{}",
            i + 1,
            left,
            top,
            right,
            bottom,
            bbox.width(),
            bbox.height()
        );
    }

    if let Some(output) = &args.output {
        let overlay = render::draw_boxes(&img.to_rgb8(), &detection.boxes, render::BOX_COLOR);
        overlay
            .save(output)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay: {}", e))?;
        println!("Overlay written to {}", output.display());
    }

    if let Some(dir) = pipeline.debug_dir() {
        println!("Debug images saved to {}/", dir.display());
    }

    Ok(())
}
