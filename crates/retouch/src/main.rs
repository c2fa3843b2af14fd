//! retouch: command-line front end for the image adjustment pipeline.
//!
//! Applies blur, saturation, contrast, sharpening, grayscale and resize
//! to an image file, and converts images to and from the run-length
//! container while reporting how well they compress.
//!
//! # Usage
//!
//! ```text
//! retouch process photo.png -o out.ppm --blur 3 --contrast 20 --resize 640x480
//! retouch process photo.png -o out.png --config-json '{"grayscale": true}' --diagnostics
//! retouch compress photo.png -o photo.rle --jpeg-quality 100
//! retouch decompress photo.rle -o restored.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use retouch_pipeline::ResizeFilter;
use retouch_pipeline::params::{DELTA_LIMIT, MAX_BLUR_RADIUS, MAX_SHARPEN_STRENGTH};
use tracing_subscriber::EnvFilter;

mod commands;

/// Deterministic image adjustments and run-length compression.
#[derive(Parser)]
#[command(name = "retouch", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug). Without it,
    /// `RUST_LOG` applies, defaulting to warnings only.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the adjustment pipeline on an image and save the result.
    #[command(visible_alias = "p")]
    Process(ProcessArgs),

    /// Run-length encode an image and report the compression ratio.
    #[command(visible_alias = "c")]
    Compress(CompressArgs),

    /// Expand a run-length container back into an image file.
    #[command(visible_alias = "d")]
    Decompress(DecompressArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// Input image (PPM, PNG, JPEG, BMP).
    input: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(short, long)]
    output: PathBuf,

    /// Gaussian blur radius (0 disables).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_BLUR_RADIUS)))]
    blur: u32,

    /// Saturation shift (-100..=100, 0 disables).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true, value_parser = clap::value_parser!(i32).range(i64::from(-DELTA_LIMIT)..=i64::from(DELTA_LIMIT)))]
    saturation: i32,

    /// Contrast shift (-100..=100, 0 disables).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true, value_parser = clap::value_parser!(i32).range(i64::from(-DELTA_LIMIT)..=i64::from(DELTA_LIMIT)))]
    contrast: i32,

    /// Sharpen strength (0 disables).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_SHARPEN_STRENGTH)))]
    sharpen: u32,

    /// Replace color with luminance.
    #[arg(long)]
    grayscale: bool,

    /// Resize to exactly WIDTHxHEIGHT.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Resampling filter for --resize.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    resize_filter: Filter,

    /// Full parameter record as a JSON string.
    ///
    /// When provided, all other parameter flags are ignored.
    #[arg(long, conflicts_with = "config")]
    config_json: Option<String>,

    /// Path to a JSON file holding the full parameter record.
    ///
    /// When provided, all other parameter flags are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print per-stage timing diagnostics.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a table (implies --diagnostics).
    #[arg(long)]
    json: bool,

    /// Number of runs for averaging diagnostics.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,
}

#[derive(Args)]
struct CompressArgs {
    /// Input image (PPM, PNG, JPEG, BMP).
    input: PathBuf,

    /// Write the run-length container here.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also report the size of a JPEG encoding at this quality (1-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: Option<u8>,
}

#[derive(Args)]
struct DecompressArgs {
    /// Run-length container to read.
    input: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(short, long)]
    output: PathBuf,
}

/// Resampling filter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Maps a [`ResizeFilter`] to the local CLI [`Filter`] enum.
const fn filter_from_pipeline(f: ResizeFilter) -> Filter {
    match f {
        ResizeFilter::Nearest => Filter::Nearest,
        ResizeFilter::Triangle => Filter::Triangle,
        ResizeFilter::CatmullRom => Filter::CatmullRom,
        ResizeFilter::Gaussian => Filter::Gaussian,
        ResizeFilter::Lanczos3 => Filter::Lanczos3,
    }
}

impl From<Filter> for ResizeFilter {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => Self::Nearest,
            Filter::Triangle => Self::Triangle,
            Filter::CatmullRom => Self::CatmullRom,
            Filter::Gaussian => Self::Gaussian,
            Filter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// The CLI default filter, derived from the pipeline default so the two
/// cannot silently diverge.
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(ResizeFilter::DEFAULT);

/// Parse `WIDTHxHEIGHT` (either `x` or `X`).
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("{part:?} is not a positive integer"))
    };
    Ok((parse(w)?, parse(h)?))
}

/// Install the `tracing` subscriber on stderr.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Process(args) => commands::process::run(&args),
        Commands::Compress(args) => commands::compress::run(&args),
        Commands::Decompress(args) => commands::decompress::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_filter_matches_pipeline() {
        assert_eq!(
            ResizeFilter::from(CLI_DEFAULT_FILTER),
            ResizeFilter::default()
        );
    }

    #[test]
    fn parse_size_accepts_both_separators() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert_eq!(parse_size("32X16").unwrap(), (32, 16));
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn negative_deltas_parse() {
        let cli = Cli::try_parse_from([
            "retouch",
            "process",
            "in.png",
            "-o",
            "out.png",
            "--contrast",
            "-50",
            "--saturation=-100",
        ])
        .unwrap();
        let Commands::Process(args) = cli.command else {
            unreachable!("parsed a different subcommand");
        };
        assert_eq!(args.contrast, -50);
        assert_eq!(args.saturation, -100);
    }

    #[test]
    fn out_of_range_flag_rejected() {
        let result = Cli::try_parse_from([
            "retouch", "process", "in.png", "-o", "out.png", "--sharpen", "21",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_sources_conflict() {
        let result = Cli::try_parse_from([
            "retouch",
            "process",
            "in.png",
            "-o",
            "out.png",
            "--config",
            "p.json",
            "--config-json",
            "{}",
        ]);
        assert!(result.is_err());
    }
}
