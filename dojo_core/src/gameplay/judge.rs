use dojo_schema::{DifficultyProfile, Tier, TierCounts, TimingStats};

use super::resolver::Target;
use super::stats;

/// Combo bonus added per hit never exceeds this, whatever the tier.
pub const COMBO_BONUS_CAP: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentResult {
    pub target: Target,
    pub tier: Tier,
    /// Signed error in ms, positive = late. `None` for a repeat tap.
    pub error_ms: Option<f64>,
    /// The tap resolved to a target at or before the last judged one.
    pub duplicate: bool,
    pub score_delta: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub tier_counts: TierCounts,
}

/// First threshold the absolute error stays under, in ascending order.
/// Thresholds are exclusive: an error equal to `perfect` is already great.
pub fn classify(profile: &DifficultyProfile, error_ms: f64) -> Tier {
    let abs = error_ms.abs();
    if abs < profile.perfect {
        Tier::Perfect
    } else if abs < profile.great {
        Tier::Great
    } else if abs < profile.good {
        Tier::Good
    } else if abs < profile.bad {
        Tier::Bad
    } else {
        Tier::Miss
    }
}

pub fn points_for(tier: Tier, combo: u32) -> u64 {
    tier.base_points() + u64::from(combo.min(COMBO_BONUS_CAP))
}

/// Grades taps against resolved targets and keeps the running score.
pub struct JudgeMachine {
    profile: DifficultyProfile,
    /// Highest target index that received a non-duplicate judgment.
    last_judged_index: Option<i64>,
    score: ScoreState,
    /// Signed errors of graded hits only; misses never enter the sample.
    errors_ms: Vec<f64>,
}

impl JudgeMachine {
    pub fn new(profile: DifficultyProfile) -> Self {
        Self {
            profile,
            last_judged_index: None,
            score: ScoreState::default(),
            errors_ms: Vec::new(),
        }
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn last_judged_index(&self) -> Option<i64> {
        self.last_judged_index
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn errors_ms(&self) -> &[f64] {
        &self.errors_ms
    }

    pub fn stats(&self) -> TimingStats {
        stats::timing_stats(&self.errors_ms, Some(&self.score.tier_counts))
    }

    /// Judges one latency-compensated tap against its resolved target.
    pub fn judge(&mut self, compensated_time: f64, target: Target) -> JudgmentResult {
        if self.last_judged_index.is_some_and(|last| target.index <= last) {
            // Repeat on an already judged target: a miss that leaves the cursor alone.
            self.score.combo = 0;
            self.score.tier_counts.increment(Tier::Miss);
            return JudgmentResult {
                target,
                tier: Tier::Miss,
                error_ms: None,
                duplicate: true,
                score_delta: 0,
            };
        }

        self.last_judged_index = Some(target.index);
        let error_ms = (compensated_time - target.ideal) * 1000.0;
        let tier = classify(&self.profile, error_ms);

        let score_delta = if tier == Tier::Miss {
            self.score.combo = 0;
            0
        } else {
            self.errors_ms.push(error_ms);
            self.score.combo += 1;
            self.score.max_combo = self.score.max_combo.max(self.score.combo);
            let delta = points_for(tier, self.score.combo);
            self.score.score += delta;
            delta
        };
        self.score.tier_counts.increment(tier);

        JudgmentResult {
            target,
            tier,
            error_ms: Some(error_ms),
            duplicate: false,
            score_delta,
        }
    }
}
