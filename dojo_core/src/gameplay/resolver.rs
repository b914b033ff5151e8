use dojo_schema::Pattern;

use super::TimeAnchor;

/// One instance of a target grid: index `n` and its ideal time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub index: i64,
    pub ideal: f64,
}

/// Arithmetic grid of targets, `ideal(n) = base + n * interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGrid {
    pub base: f64,
    pub interval: f64,
}

impl TargetGrid {
    /// Subdivision grid the player is graded against.
    pub fn for_pattern(pattern: Pattern, anchor: &TimeAnchor, seconds_per_beat: f64) -> Self {
        let sub = pattern.subdivision(seconds_per_beat);
        Self {
            base: anchor.play_start + sub.phase,
            interval: sub.interval,
        }
    }

    /// Plain click grid starting at the first count-in beat. Used for calibration.
    pub fn beat_grid(anchor: &TimeAnchor, seconds_per_beat: f64) -> Self {
        Self {
            base: anchor.count_in_start,
            interval: seconds_per_beat,
        }
    }

    pub fn ideal(&self, index: i64) -> f64 {
        self.base + index as f64 * self.interval
    }

    /// Nearest target to `t`. Exact ties round half away from zero, so a tap
    /// midway between two targets always lands on the one further from `base`.
    /// No bounds are applied: indices before the grid start are negative.
    pub fn resolve(&self, t: f64) -> Target {
        let index = ((t - self.base) / self.interval).round() as i64;
        Target {
            index,
            ideal: self.ideal(index),
        }
    }
}

pub fn resolve(tap_time: f64, pattern: Pattern, anchor: &TimeAnchor, seconds_per_beat: f64) -> Target {
    TargetGrid::for_pattern(pattern, anchor, seconds_per_beat).resolve(tap_time)
}
