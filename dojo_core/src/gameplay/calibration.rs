use dojo_schema::CALIBRATION_SAMPLES;

use super::resolver::TargetGrid;
use super::stats;

/// Signed distance in ms from `compensated_time` to the nearest click.
pub fn grid_error_ms(grid: &TargetGrid, compensated_time: f64) -> f64 {
    let target = grid.resolve(compensated_time);
    (compensated_time - target.ideal) * 1000.0
}

/// Collects tap errors against the click grid. Errors are measured on
/// compensated time, so a full run yields the correction to the offset
/// already applied.
#[derive(Debug, Clone, Default)]
pub struct CalibrationEstimator {
    samples_ms: Vec<f64>,
}

impl CalibrationEstimator {
    pub fn new() -> Self {
        Self {
            samples_ms: Vec::with_capacity(CALIBRATION_SAMPLES),
        }
    }

    pub fn samples_ms(&self) -> &[f64] {
        &self.samples_ms
    }

    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples_ms.clear();
    }

    /// Records one error. On the sample that completes the run, returns the
    /// median error and empties the buffer for the next run.
    pub fn push(&mut self, error_ms: f64) -> Option<f64> {
        self.samples_ms.push(error_ms);
        if self.samples_ms.len() < CALIBRATION_SAMPLES {
            return None;
        }
        let median = stats::median(&self.samples_ms);
        self.samples_ms.clear();
        median
    }

    /// Offset after a completed run: the residual median is taken off the
    /// offset it was measured under.
    pub fn refine(current_offset_ms: f64, median_ms: f64) -> f64 {
        current_offset_ms - median_ms
    }
}
