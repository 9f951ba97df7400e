use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use exr_autocrop::image_pipeline::{AutocropPipeline, CropConfig, EmptyImagePolicy, OutputCompression};
use exr_autocrop::logger;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    /// Uncompressed scanlines
    None,
    /// Run-length encoding
    Rle,
    /// Zip deflate, one scanline per block
    Zips,
}

impl From<CompressionArg> for OutputCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => OutputCompression::None,
            CompressionArg::Rle => OutputCompression::Rle,
            CompressionArg::Zips => OutputCompression::ZipScanline,
        }
    }
}

#[derive(Parser)]
#[command(name = "exr_autocrop")]
#[command(about = "Crops an OpenEXR image's data window to the pixels that hold non-zero samples", long_about = None)]
struct Args {
    /// Image to crop
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Where the cropped image is written
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Keep a single pixel instead of failing when the image is entirely zero
    #[arg(long)]
    keep_empty: bool,

    /// Compression of the cropped image
    #[arg(long, value_enum, default_value_t = CompressionArg::Zips)]
    compression: CompressionArg,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = CropConfig::builder()
        .compression(args.compression.into())
        .empty_image(if args.keep_empty {
            EmptyImagePolicy::SinglePixel
        } else {
            EmptyImagePolicy::Fail
        })
        .build();
    let pipeline = AutocropPipeline::new(config);

    info!("Compression: {:?}", pipeline.config().compression);

    let report = pipeline.crop_file(&args.source, &args.target).with_context(|| {
        format!(
            "cropping {} into {}",
            args.source.display(),
            args.target.display()
        )
    })?;

    info!(
        rows = report.rows_written,
        "Wrote {}",
        args.target.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    // help and usage errors exit with 1 as well
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logger::init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Crop failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
