use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Seconds = f64;
pub type Milliseconds = f64;

/// Number of raw errors collected before a calibration run is finalized.
pub const CALIBRATION_SAMPLES: usize = 20;

pub const DEFAULT_BPM: f64 = 100.0;
pub const DEFAULT_DURATION_SECS: Seconds = 30.0;
pub const DEFAULT_COUNT_IN_BEATS: u32 = 3;
pub const DEFAULT_LOOKAHEAD_SECS: Seconds = 0.12;
pub const DEFAULT_TICK_MS: u64 = 25;
pub const DEFAULT_START_DELAY_SECS: Seconds = 0.2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseSettingError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseSettingError {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    Triplet,
    Offbeat,
}

/// Spacing and offset of a subdivision grid relative to the beat grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subdivision {
    pub interval: Seconds,
    pub phase: Seconds,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::Quarter,
        Pattern::Eighth,
        Pattern::Sixteenth,
        Pattern::Triplet,
        Pattern::Offbeat,
    ];

    pub fn subdivision(self, seconds_per_beat: Seconds) -> Subdivision {
        let spb = seconds_per_beat;
        match self {
            Pattern::Quarter => Subdivision { interval: spb, phase: 0.0 },
            Pattern::Eighth => Subdivision { interval: spb / 2.0, phase: 0.0 },
            Pattern::Sixteenth => Subdivision { interval: spb / 4.0, phase: 0.0 },
            Pattern::Triplet => Subdivision { interval: spb / 3.0, phase: 0.0 },
            Pattern::Offbeat => Subdivision { interval: spb, phase: spb / 2.0 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::Quarter => "quarter",
            Pattern::Eighth => "eighth",
            Pattern::Sixteenth => "sixteenth",
            Pattern::Triplet => "triplet",
            Pattern::Offbeat => "offbeat",
        }
    }
}

impl FromStr for Pattern {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ParseSettingError::new("pattern", s, "quarter, eighth, sixteenth, triplet, offbeat")
            })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
    Insane,
}

/// Tier thresholds in milliseconds, strictly increasing.
/// An absolute error at or beyond `bad` is a miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub perfect: Milliseconds,
    pub great: Milliseconds,
    pub good: Milliseconds,
    pub bad: Milliseconds,
}

impl Difficulty {
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Normal => DifficultyProfile {
                perfect: 25.0,
                great: 55.0,
                good: 95.0,
                bad: 135.0,
            },
            Difficulty::Hard => DifficultyProfile {
                perfect: 20.0,
                great: 40.0,
                good: 80.0,
                bad: 120.0,
            },
            Difficulty::Insane => DifficultyProfile {
                perfect: 15.0,
                great: 30.0,
                good: 60.0,
                bad: 90.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Insane => "insane",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "insane" => Ok(Difficulty::Insane),
            _ => Err(ParseSettingError::new("difficulty", s, "normal, hard, insane")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Practice,
    #[serde(alias = "calib")]
    Calibration,
}

impl FromStr for Mode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Mode::Practice),
            "calibration" | "calib" => Ok(Mode::Calibration),
            _ => Err(ParseSettingError::new("mode", s, "practice, calibration")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Practice => "practice",
            Mode::Calibration => "calibration",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Perfect,
    Great,
    Good,
    Bad,
    Miss,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Perfect, Tier::Great, Tier::Good, Tier::Bad, Tier::Miss];

    pub fn base_points(self) -> u64 {
        match self {
            Tier::Perfect => 100,
            Tier::Great => 70,
            Tier::Good => 40,
            Tier::Bad => 10,
            Tier::Miss => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Perfect => "PERFECT",
            Tier::Great => "GREAT",
            Tier::Good => "GOOD",
            Tier::Bad => "BAD",
            Tier::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl TierCounts {
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Perfect => self.perfect,
            Tier::Great => self.great,
            Tier::Good => self.good,
            Tier::Bad => self.bad,
            Tier::Miss => self.miss,
        }
    }

    pub fn increment(&mut self, tier: Tier) {
        let slot = match tier {
            Tier::Perfect => &mut self.perfect,
            Tier::Great => &mut self.great,
            Tier::Good => &mut self.good,
            Tier::Bad => &mut self.bad,
            Tier::Miss => &mut self.miss,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        Tier::ALL.iter().map(|t| self.get(*t)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub bpm: f64,
    pub pattern: Pattern,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub duration_secs: Seconds,
    pub count_in_beats: u32,
    pub lookahead_secs: Seconds,
    pub tick_ms: u64,
    pub start_delay_secs: Seconds,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            pattern: Pattern::default(),
            difficulty: Difficulty::default(),
            mode: Mode::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            count_in_beats: DEFAULT_COUNT_IN_BEATS,
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            tick_ms: DEFAULT_TICK_MS,
            start_delay_secs: DEFAULT_START_DELAY_SECS,
        }
    }
}

impl SessionSettings {
    pub fn seconds_per_beat(&self) -> Seconds {
        60.0 / self.bpm
    }

    pub fn tick_secs(&self) -> Seconds {
        self.tick_ms as f64 / 1000.0
    }

    /// Replaces values the engine cannot run with by their defaults.
    pub fn sanitized(mut self) -> Self {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            log::warn!("bpm {} is not a positive number; using {DEFAULT_BPM}", self.bpm);
            self.bpm = DEFAULT_BPM;
        }
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            log::warn!(
                "session duration {} is not positive; using {DEFAULT_DURATION_SECS}s",
                self.duration_secs
            );
            self.duration_secs = DEFAULT_DURATION_SECS;
        }
        if self.tick_ms == 0 {
            self.tick_ms = DEFAULT_TICK_MS;
        }
        // The tick must fire more often than the lookahead window or clicks starve.
        if !(self.lookahead_secs.is_finite() && self.lookahead_secs > self.tick_secs()) {
            let widened = self.tick_secs() + DEFAULT_LOOKAHEAD_SECS;
            log::warn!(
                "lookahead {}s does not cover the {}ms tick; using {widened}s",
                self.lookahead_secs,
                self.tick_ms
            );
            self.lookahead_secs = widened;
        }
        if !(self.start_delay_secs.is_finite() && self.start_delay_secs >= 0.0) {
            self.start_delay_secs = DEFAULT_START_DELAY_SECS;
        }
        self
    }
}

/// Parses a tempo typed by a user; anything that is not a positive number
/// falls back to the default tempo.
pub fn coerce_bpm(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
        _ => {
            log::warn!("bpm '{raw}' is not a positive number; using {DEFAULT_BPM}");
            DEFAULT_BPM
        }
    }
}

/// Aggregate timing statistics; `None` means "no data".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub samples: usize,
    pub mean_ms: Option<Milliseconds>,
    pub std_ms: Option<Milliseconds>,
    pub accuracy_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub settings: SessionSettings,
    pub score: u64,
    pub max_combo: u32,
    pub judged_taps: u32,
    pub tier_counts: TierCounts,
    pub stats: TimingStats,
    pub latency_offset_ms: Milliseconds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{ "bpm": 120, "pattern": "offbeat", "mode": "calib" }"#).unwrap();
        assert_eq!(settings.bpm, 120.0);
        assert_eq!(settings.pattern, Pattern::Offbeat);
        assert_eq!(settings.mode, Mode::Calibration);
        assert_eq!(settings.difficulty, Difficulty::Normal);
        assert_eq!(settings.duration_secs, 30.0);
        assert_eq!(settings.count_in_beats, 3);
        assert_eq!(settings.tick_ms, 25);
    }

    #[test]
    fn offbeat_is_shifted_by_half_a_beat() {
        let sub = Pattern::Offbeat.subdivision(0.6);
        assert_eq!(sub.interval, 0.6);
        assert!((sub.phase - 0.3).abs() < 1e-12);

        let sub = Pattern::Triplet.subdivision(0.6);
        assert!((sub.interval - 0.2).abs() < 1e-12);
        assert_eq!(sub.phase, 0.0);
    }

    #[test]
    fn enumerated_values_parse_case_insensitively() {
        assert_eq!("Sixteenth".parse::<Pattern>().unwrap(), Pattern::Sixteenth);
        assert_eq!(" hard ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("calib".parse::<Mode>().unwrap(), Mode::Calibration);

        let err = "waltz".parse::<Pattern>().unwrap_err();
        assert_eq!(err.kind, "pattern");
        assert!(err.to_string().contains("waltz"));
    }

    #[test]
    fn profiles_are_strictly_increasing() {
        for d in [Difficulty::Normal, Difficulty::Hard, Difficulty::Insane] {
            let p = d.profile();
            assert!(p.perfect < p.great && p.great < p.good && p.good < p.bad, "{d}");
        }
    }

    #[test]
    fn non_numeric_bpm_falls_back_to_default() {
        assert_eq!(coerce_bpm("132"), 132.0);
        assert_eq!(coerce_bpm("fast"), DEFAULT_BPM);
        assert_eq!(coerce_bpm("-40"), DEFAULT_BPM);
        assert_eq!(coerce_bpm("NaN"), DEFAULT_BPM);
    }

    #[test]
    fn sanitized_repairs_unusable_values() {
        let settings = SessionSettings {
            bpm: 0.0,
            duration_secs: f64::NAN,
            lookahead_secs: 0.01,
            ..SessionSettings::default()
        }
        .sanitized();
        assert_eq!(settings.bpm, DEFAULT_BPM);
        assert_eq!(settings.duration_secs, DEFAULT_DURATION_SECS);
        assert!(settings.lookahead_secs > settings.tick_secs());
    }

    #[test]
    fn tier_counts_cover_every_tier() {
        let mut counts = TierCounts::default();
        counts.increment(Tier::Great);
        counts.increment(Tier::Miss);
        counts.increment(Tier::Miss);
        assert_eq!(counts.get(Tier::Great), 1);
        assert_eq!(counts.get(Tier::Miss), 2);
        assert_eq!(counts.total(), 3);

        let json = serde_json::to_value(counts).unwrap();
        for tier in ["perfect", "great", "good", "bad", "miss"] {
            assert!(json.get(tier).is_some(), "{tier} missing");
        }
    }
}
