//! Piecewise-constant transient runs.
//!
//! Each segment integrates its own parameter snapshot and starts from the
//! final state of the segment before it. The outputs are stitched into one
//! time series.

use sm_core::MotorParameters;
use sm_sim::{InitialConditions, TransientOptions, TransientState, integrate};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// One constant-parameter interval.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Interval length (s)
    pub duration: f64,
    pub params: MotorParameters,
}

impl Segment {
    pub fn new(duration: f64, params: MotorParameters) -> Self {
        Self { duration, params }
    }
}

/// Run `segments` back to back from `(t0, x0)`.
///
/// Every segment is sampled with `opts.num_samples` points; the sample shared
/// by two neighbouring segments appears once in the output.
pub fn run_segments(
    segments: &[Segment],
    t0: f64,
    x0: InitialConditions,
    opts: &TransientOptions,
) -> AppResult<TransientState> {
    if segments.is_empty() {
        return Err(AppError::InvalidInput("no segments to run".to_string()));
    }
    if let Some(bad) = segments
        .iter()
        .find(|s| !(s.duration.is_finite() && s.duration > 0.0))
    {
        return Err(AppError::InvalidInput(format!(
            "segment duration must be positive, got {}",
            bad.duration
        )));
    }

    let mut combined: Option<TransientState> = None;
    let mut t = t0;
    let mut x = x0;

    for (i, segment) in segments.iter().enumerate() {
        let t_end = t + segment.duration;
        debug!(segment = i, t_start = t, t_end, "running segment");

        let state = integrate(&segment.params, (t, t_end), x, opts)?;
        x = state
            .final_state()
            .ok_or_else(|| AppError::InvalidInput("segment produced no samples".to_string()))?
            .into();

        combined = Some(match combined.take() {
            Some(mut run) => {
                run.append(state);
                run
            }
            None => state,
        });
        t = t_end;
    }

    combined.ok_or_else(|| AppError::InvalidInput("no segments to run".to_string()))
}
