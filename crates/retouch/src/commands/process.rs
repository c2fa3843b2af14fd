//! `process`: load, adjust, save.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use retouch_pipeline::diagnostics::{Clock, PipelineDiagnostics, apply_with_diagnostics};
use retouch_pipeline::{PipelineParameters, Stage};
use tracing::{debug, info};

use crate::ProcessArgs;

/// Build the parameter record from CLI arguments.
///
/// If `--config-json` or `--config` is provided, the JSON is parsed
/// directly (with the same range checks as the setters) and every
/// individual parameter flag is ignored.
pub fn params_from_args(args: &ProcessArgs) -> Result<PipelineParameters> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).context("Error parsing --config-json");
    }
    if let Some(ref path) = args.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Error reading config {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Error parsing config {}", path.display()));
    }

    let mut params = PipelineParameters::default();
    params.set_blur_radius(args.blur)?;
    params.set_saturation_delta(args.saturation)?;
    params.set_contrast_delta(args.contrast)?;
    params.set_sharpen_strength(args.sharpen)?;
    params.set_grayscale(args.grayscale);
    if let Some((width, height)) = args.resize {
        params.set_resize(width, height)?;
    }
    params.set_resize_filter(args.resize_filter.into());
    Ok(params)
}

pub fn run(args: &ProcessArgs) -> Result<()> {
    let params = params_from_args(args)?;
    debug!(?params, "parameters");

    let original = retouch_io::load(&args.input)
        .with_context(|| format!("Error loading {}", args.input.display()))?;

    let show_diagnostics = args.diagnostics || args.json || args.runs > 1;
    let processed = if show_diagnostics {
        let mut all_diagnostics = Vec::with_capacity(args.runs);
        let mut last = None;
        for run in 0..args.runs {
            if args.runs > 1 {
                eprintln!("--- Run {}/{} ---", run + 1, args.runs);
            }
            let (processed, diagnostics) = apply_with_diagnostics(&original, &params, &StdClock)
                .context("Pipeline error")?;
            if !args.json {
                println!("{}", diagnostics.report());
            }
            all_diagnostics.push(diagnostics);
            last = Some(processed);
        }
        if args.json {
            println!("{}", diagnostics_json(&all_diagnostics)?);
        } else if args.runs > 1 {
            print_multi_run_summary(&all_diagnostics);
        }
        last.context("no pipeline runs")?
    } else {
        retouch_pipeline::apply(&original, &params).context("Pipeline error")?
    };

    retouch_io::save(&args.output, &processed)
        .with_context(|| format!("Error writing {}", args.output.display()))?;
    info!(
        input = %original.dimensions(),
        output = %processed.dimensions(),
        "processed {}",
        args.input.display()
    );
    Ok(())
}

/// Serialize the collected runs as one JSON document: a single object
/// for one run, an array for several.
fn diagnostics_json(all_diagnostics: &[PipelineDiagnostics]) -> Result<String> {
    let json = match all_diagnostics {
        [single] => serde_json::to_string_pretty(single),
        runs => serde_json::to_string_pretty(runs),
    };
    json.context("Error serializing diagnostics")
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for stage in Stage::ORDER {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .flat_map(|d| d.applied())
            .filter(|s| s.stage == stage)
            .map(|s| s.duration.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{:<24} {stage_mean:>10.3}ms", stage.label());
    }
}
