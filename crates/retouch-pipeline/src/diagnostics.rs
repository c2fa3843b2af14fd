//! Pipeline diagnostics: per-stage timing and output geometry.
//!
//! [`apply_with_diagnostics`] produces exactly the same buffer as
//! [`crate::apply`] and additionally records, for every stage in
//! [`Stage::ORDER`], whether it ran, how long it took and what it
//! produced.
//!
//! Time is read through the [`Clock`] trait so this crate never touches
//! a platform clock itself; callers supply one (the CLI wraps
//! [`std::time::Instant`]).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::params::PipelineParameters;
use crate::stage::Stage;
use crate::types::{Dimensions, PipelineError, PixelBuffer, PixelLayout};

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Size of the original image.
    pub input: Dimensions,
    /// One entry per stage, in application order.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Which stage.
    pub stage: Stage,
    /// `false` when the stage's no-op guard skipped it.
    pub applied: bool,
    /// Wall-clock duration (zero when skipped).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Geometry of the buffer after this stage.
    pub output: Dimensions,
    /// Layout of the buffer after this stage.
    pub layout: PixelLayout,
}

/// Run the pipeline like [`crate::apply`] and record diagnostics.
///
/// # Errors
///
/// Same as [`crate::apply`].
pub fn apply_with_diagnostics<C: Clock>(
    original: &PixelBuffer,
    params: &PipelineParameters,
    clock: &C,
) -> Result<(PixelBuffer, PipelineDiagnostics), PipelineError> {
    let run_start = clock.now();
    let mut current = original.clone();
    let mut stages = Vec::with_capacity(Stage::ORDER.len());

    for stage in Stage::ORDER {
        let applied = stage.is_enabled(params);
        let mut duration = Duration::ZERO;
        if applied {
            let start = clock.now();
            current = stage.apply(&current, params)?;
            duration = clock.elapsed(&start);
        }
        stages.push(StageDiagnostics {
            stage,
            applied,
            duration,
            output: current.dimensions(),
            layout: current.layout(),
        });
    }

    let diagnostics = PipelineDiagnostics {
        input: original.dimensions(),
        stages,
        total_duration: clock.elapsed(&run_start),
    };
    Ok((current, diagnostics))
}

impl PipelineDiagnostics {
    /// Stages that actually ran.
    pub fn applied(&self) -> impl Iterator<Item = &StageDiagnostics> {
        self.stages.iter().filter(|s| s.applied)
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {} ({} pixels)",
            self.input,
            self.input.pixel_count(),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Output"
        ));
        lines.push("-".repeat(60));

        let total_ms = duration_ms(self.total_duration);
        for diag in &self.stages {
            if !diag.applied {
                lines.push(format!("{:<12} {:>10}", diag.stage.label(), "skipped"));
                continue;
            }
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<12} {ms:>8.3}ms {pct:>9.1}%  {} {}",
                diag.stage.label(),
                diag.output,
                diag.layout,
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
