//! CLI wrapper: argument parsing, logging setup, image IO, and the call
//! into the core pipeline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tilescale_core::backend::{Device, OrtTransform};
use tilescale_core::config::UpscaleConfig;
use tilescale_core::tensor;
use tilescale_core::upscale::Upscaler;

#[derive(Parser)]
#[command(name = "tilescale", about = "Tiled super-resolution image upscaler")]
struct Cli {
    #[arg(short = 'm', long, help = "Path to ONNX model file")]
    model: PathBuf,

    #[arg(short = 'i', long, help = "Path to input image")]
    image: PathBuf,

    #[arg(
        short = 'd',
        long,
        help = "Inference device (auto, cpu, cuda); auto picks CUDA when available"
    )]
    device: Option<String>,

    #[arg(short = 'o', long, help = "Tile overlap in pixels")]
    overlap: Option<usize>,

    #[arg(short = 's', long, help = "Final output scale factor")]
    scale: Option<f64>,

    #[arg(
        long = "super-scale",
        value_name = "FACTOR",
        help = "Internal upscale factor for anti-aliasing (defaults to scale)"
    )]
    super_scale: Option<f64>,

    #[arg(long, value_name = "FILE", help = "Optional TOML config file")]
    config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Increase log verbosity (-v: debug, -vv: trace)"
    )]
    verbose: u8,
}

/// Pick the tracing filter: an explicit RUST_LOG wins unless `-v` was
/// given, which bumps everything to debug/trace.
fn select_log_filter(rust_log_env: Option<&str>, verbose: u8) -> String {
    match verbose {
        0 => rust_log_env.unwrap_or("info").to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_logging(verbose: u8) {
    let filter = select_log_filter(std::env::var("RUST_LOG").ok().as_deref(), verbose);
    let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|error| {
        eprintln!("Invalid log filter {filter:?} ({error}); falling back to \"info\"");
        EnvFilter::new("info")
    });

    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to initialize tracing subscriber: {error}");
    }
}

/// `<stem>_upscaled<suffix>` alongside the input.
fn upscaled_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_upscaled{suffix}"))
}

fn build_config(cli: &Cli) -> Result<UpscaleConfig> {
    let mut config = match &cli.config {
        Some(path) => UpscaleConfig::from_toml_file(path)?,
        None => UpscaleConfig::default(),
    };

    if let Some(device) = &cli.device {
        config.device = Device::from_str_lossy(device);
    }
    if let Some(overlap) = cli.overlap {
        config.overlap = overlap;
    }
    if let Some(scale) = cli.scale {
        config.scale = scale;
    }
    if let Some(super_scale) = cli.super_scale {
        config.internal_scale = Some(super_scale);
    }

    config.validate()?;
    Ok(config)
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;

    if !cli.model.exists() {
        bail!("Model file not found: {}", cli.model.display());
    }
    if !cli.image.exists() {
        bail!("Image file not found: {}", cli.image.display());
    }

    info!(device = %config.device, "Loading model from {}", cli.model.display());
    let model = OrtTransform::load(&cli.model, config.device)?;

    let img = image::open(&cli.image)
        .with_context(|| format!("Failed to load image: {}", cli.image.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    info!(width, height, "Loaded input image");

    let input = tensor::from_rgb8(img.as_raw(), width, height)?;

    let upscaler = Upscaler::new(model, config)?;
    let output = upscaler.run(input)?;

    let (_, out_h, out_w) = output.dim();
    let rgb = tensor::to_rgb8(&output);
    let out_img = image::RgbImage::from_raw(out_w as u32, out_h as u32, rgb)
        .context("Output buffer does not match output dimensions")?;

    let out_path = upscaled_output_path(&cli.image);
    out_img
        .save(&out_path)
        .with_context(|| format!("Failed to save output image: {}", out_path.display()))?;
    info!("Saved upscaled image to: {}", out_path.display());

    Ok(())
}
