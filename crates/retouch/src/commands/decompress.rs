//! `decompress`: expand a run-length container into an image file.

use anyhow::{Context, Result};
use tracing::info;

use crate::DecompressArgs;

pub fn run(args: &DecompressArgs) -> Result<()> {
    let image = retouch_io::container::read_file(&args.input)
        .with_context(|| format!("Error reading container {}", args.input.display()))?;
    retouch_io::save(&args.output, &image)
        .with_context(|| format!("Error writing {}", args.output.display()))?;
    info!(size = %image.dimensions(), layout = %image.layout(), "decompressed");
    println!(
        "{} ({} {}) written to {}",
        args.input.display(),
        image.dimensions(),
        image.layout(),
        args.output.display()
    );
    Ok(())
}
