//! `compress`: run-length encode an image and report the ratio.

use anyhow::{Context, Result};
use retouch_io::container;
use retouch_pipeline::{CompressionReport, rle};
use tracing::warn;

use crate::CompressArgs;

pub fn run(args: &CompressArgs) -> Result<()> {
    let image = retouch_io::load(&args.input)
        .with_context(|| format!("Error loading {}", args.input.display()))?;

    let report = match args.output {
        Some(ref output) => container::write_file(output, &image)
            .with_context(|| format!("Error writing {}", output.display()))?,
        None => CompressionReport::for_stream(&image, &rle::encode(&image)),
    };

    println!("Image: {} ({})", args.input.display(), image.dimensions());
    println!("RLE:   {report}");
    if report.expands() {
        warn!(
            ratio = report.ratio_percent,
            "run-length encoding is larger than the raw samples"
        );
    }

    if let Some(quality) = args.jpeg_quality {
        let jpeg = retouch_io::jpeg_report(&image, quality).context("Error encoding JPEG")?;
        println!("JPEG:  {jpeg} at quality {quality}");
    }

    if let Some(ref output) = args.output {
        println!("Container written to {}", output.display());
    }
    Ok(())
}
