use std::fmt;

use dojo_schema::{Mode, SessionSettings, Tier, TierCounts, TimingStats};
use log::{debug, info};

use super::calibration::{grid_error_ms, CalibrationEstimator};
use super::judge::{JudgeMachine, JudgmentResult, ScoreState};
use super::resolver::TargetGrid;
use super::scheduler::{BeatScheduler, ScheduledClick};
use super::stats;
use super::TimeAnchor;

/// Errors beyond this many ms pin the meter needle to its end stop.
pub const NEEDLE_RANGE_MS: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// No session is running; the tap was not looked at.
    Ignored,
    /// The tap fell inside the count-in.
    CountIn { beats_remaining: u32 },
    Judged(JudgmentResult),
    CalibrationSample { error_ms: f64, collected: usize },
    /// The tap completed a calibration run and produced a new offset.
    Calibrated { error_ms: f64, offset_ms: f64 },
    /// The tap arrived at or after the session end; the session is now stopped.
    SessionOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Ready,
    Calib,
    CountIn(u32),
    Tier(Tier),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ready => f.write_str("READY"),
            Label::Calib => f.write_str("CALIB"),
            Label::CountIn(n) => write!(f, "{n}"),
            Label::Tier(t) => f.write_str(t.label()),
        }
    }
}

/// Read-only model handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub mode: Mode,
    pub label: Label,
    pub error_ms: Option<f64>,
    /// Meter position in `[0, 1]`; 0.5 is dead on.
    pub needle: f64,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub remaining_secs: f64,
    pub tier_counts: TierCounts,
    pub stats: TimingStats,
    pub latency_offset_ms: f64,
    /// Taps in the current error sample; calibration progress in calibration mode.
    pub sample_count: usize,
    pub message: String,
}

pub fn needle_position(error_ms: Option<f64>) -> f64 {
    match error_ms {
        Some(e) if e.is_finite() => (e.clamp(-NEEDLE_RANGE_MS, NEEDLE_RANGE_MS) + NEEDLE_RANGE_MS) / (2.0 * NEEDLE_RANGE_MS),
        _ => 0.5,
    }
}

/// One practice or calibration session: anchors, scheduler, judge and
/// calibration buffer behind a single owner.
pub struct Session {
    settings: SessionSettings,
    state: SessionState,
    anchor: Option<TimeAnchor>,
    scheduler: Option<BeatScheduler>,
    judge: JudgeMachine,
    calibration: CalibrationEstimator,
    latency_offset_ms: f64,
    last_error_ms: Option<f64>,
    label: Label,
    message: String,
}

impl Session {
    pub fn new(settings: SessionSettings, latency_offset_ms: f64) -> Self {
        let settings = settings.sanitized();
        let latency_offset_ms = if latency_offset_ms.is_finite() {
            latency_offset_ms
        } else {
            0.0
        };
        let label = idle_label(settings.mode);
        Self {
            judge: JudgeMachine::new(settings.difficulty.profile()),
            message: idle_message(settings.mode).to_string(),
            settings,
            state: SessionState::Idle,
            anchor: None,
            scheduler: None,
            calibration: CalibrationEstimator::new(),
            latency_offset_ms,
            last_error_ms: None,
            label,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn anchor(&self) -> Option<&TimeAnchor> {
        self.anchor.as_ref()
    }

    pub fn judge(&self) -> &JudgeMachine {
        &self.judge
    }

    pub fn score(&self) -> &ScoreState {
        self.judge.score()
    }

    pub fn calibration(&self) -> &CalibrationEstimator {
        &self.calibration
    }

    pub fn latency_offset_ms(&self) -> f64 {
        self.latency_offset_ms
    }

    pub fn set_latency_offset_ms(&mut self, offset_ms: f64) {
        if offset_ms.is_finite() {
            self.latency_offset_ms = offset_ms;
        }
    }

    /// Switches between practice and calibration. Refused while running.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.is_running() {
            return false;
        }
        // The finished session's score and error sample stay readable for its report.
        self.settings.mode = mode;
        self.calibration.clear();
        self.last_error_ms = None;
        self.label = idle_label(mode);
        self.message = idle_message(mode).to_string();
        true
    }

    /// Starts a fresh session; the first count-in click sounds
    /// `start_delay_secs` after `now`.
    pub fn start(&mut self, now: f64) -> TimeAnchor {
        let spb = self.settings.seconds_per_beat();
        let anchor = TimeAnchor::new(
            now + self.settings.start_delay_secs,
            self.settings.count_in_beats,
            spb,
            self.settings.duration_secs,
        );
        self.anchor = Some(anchor);
        self.scheduler = Some(BeatScheduler::new(anchor.count_in_start, spb, self.settings.lookahead_secs));
        self.judge = JudgeMachine::new(self.settings.difficulty.profile());
        self.calibration.clear();
        self.last_error_ms = None;
        self.label = idle_label(self.settings.mode);
        self.message = match self.settings.mode {
            Mode::Practice => "Practice started: tap along with the click.".to_string(),
            Mode::Calibration => format!(
                "Calibration started: tap along with the click {} times.",
                dojo_schema::CALIBRATION_SAMPLES
            ),
        };
        self.state = SessionState::Running;
        info!(
            "session started: {} bpm, {} / {} / {}, count-in {:.3}s play {:.3}s end {:.3}s, offset {:.1}ms",
            self.settings.bpm,
            self.settings.pattern,
            self.settings.difficulty,
            self.settings.mode,
            anchor.count_in_start,
            anchor.play_start,
            anchor.session_end,
            self.latency_offset_ms
        );
        anchor
    }

    /// Hard stop. Pending scheduler state is dropped, not drained; the score
    /// stays readable until the next start.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.state = SessionState::Stopped;
        self.scheduler = None;
        self.label = idle_label(self.settings.mode);
        self.message = "Stopped.".to_string();
        let score = self.judge.score();
        info!(
            "session stopped: score {} max combo {} judged {}",
            score.score,
            score.max_combo,
            score.tier_counts.total()
        );
    }

    /// Scheduler tick. Returns the clicks to hand to the audio clock, never
    /// one at or after `session_end`, and stops the session once `now`
    /// reaches its end.
    pub fn tick(&mut self, now: f64) -> Vec<ScheduledClick> {
        if !self.is_running() {
            return Vec::new();
        }
        if self.anchor.is_some_and(|a| a.is_over(now)) {
            self.stop();
            return Vec::new();
        }
        let (Some(anchor), Some(scheduler)) = (self.anchor, self.scheduler.as_mut()) else {
            return Vec::new();
        };
        let mut clicks = scheduler.tick(now);
        clicks.retain(|c| c.time < anchor.session_end);
        clicks
    }

    pub fn tap(&mut self, raw_time: f64) -> TapOutcome {
        if !self.is_running() {
            return TapOutcome::Ignored;
        }
        let Some(anchor) = self.anchor else {
            return TapOutcome::Ignored;
        };
        if anchor.is_over(raw_time) {
            self.stop();
            return TapOutcome::SessionOver;
        }

        let count_in_ends = match self.settings.mode {
            Mode::Practice => anchor.play_start,
            Mode::Calibration => anchor.count_in_start,
        };
        if raw_time < count_in_ends {
            let beats_remaining = self.count_in_beats_remaining(&anchor, raw_time);
            if self.settings.mode == Mode::Practice {
                self.label = Label::CountIn(beats_remaining);
            }
            return TapOutcome::CountIn { beats_remaining };
        }

        let compensated = raw_time + self.latency_offset_ms / 1000.0;
        let spb = self.settings.seconds_per_beat();
        match self.settings.mode {
            Mode::Practice => {
                let grid = TargetGrid::for_pattern(self.settings.pattern, &anchor, spb);
                let target = grid.resolve(compensated);
                let result = self.judge.judge(compensated, target);
                debug!(
                    "tap {:.4}s -> target {} ({:.4}s): {} err {:?}ms +{}",
                    raw_time,
                    result.target.index,
                    result.target.ideal,
                    result.tier.label(),
                    result.error_ms,
                    result.score_delta
                );
                self.last_error_ms = result.error_ms;
                self.label = Label::Tier(result.tier);
                TapOutcome::Judged(result)
            }
            Mode::Calibration => {
                let grid = TargetGrid::beat_grid(&anchor, spb);
                let error_ms = grid_error_ms(&grid, compensated);
                self.last_error_ms = Some(error_ms);
                match self.calibration.push(error_ms) {
                    Some(median_ms) => {
                        let offset_ms = CalibrationEstimator::refine(self.latency_offset_ms, median_ms);
                        self.latency_offset_ms = offset_ms;
                        self.message = format!("Calibration done: offset set to {} ms.", offset_ms.round());
                        info!("calibration finished: latency offset {offset_ms:.1}ms");
                        TapOutcome::Calibrated { error_ms, offset_ms }
                    }
                    None => TapOutcome::CalibrationSample {
                        error_ms,
                        collected: self.calibration.len(),
                    },
                }
            }
        }
    }

    fn count_in_beats_remaining(&self, anchor: &TimeAnchor, t: f64) -> u32 {
        let max = i64::from(self.settings.count_in_beats.max(1));
        let beats = ((anchor.play_start - t) / self.settings.seconds_per_beat()).ceil() as i64;
        beats.clamp(1, max) as u32
    }

    pub fn remaining_secs(&self, now: f64) -> f64 {
        match (self.state, self.anchor) {
            (SessionState::Running, Some(a)) => (a.session_end - now).clamp(0.0, self.settings.duration_secs),
            (SessionState::Stopped, _) => 0.0,
            _ => self.settings.duration_secs,
        }
    }

    pub fn view(&self, now: f64) -> SessionView {
        let score = self.judge.score();
        let (stats, sample_count) = match self.settings.mode {
            Mode::Practice => (self.judge.stats(), self.judge.errors_ms().len()),
            Mode::Calibration => (
                stats::timing_stats(self.calibration.samples_ms(), None),
                self.calibration.len(),
            ),
        };
        SessionView {
            state: self.state,
            mode: self.settings.mode,
            label: self.label,
            error_ms: self.last_error_ms,
            needle: needle_position(self.last_error_ms),
            score: score.score,
            combo: score.combo,
            max_combo: score.max_combo,
            remaining_secs: self.remaining_secs(now),
            tier_counts: score.tier_counts,
            stats,
            latency_offset_ms: self.latency_offset_ms,
            sample_count,
            message: self.message.clone(),
        }
    }
}

fn idle_label(mode: Mode) -> Label {
    match mode {
        Mode::Practice => Label::Ready,
        Mode::Calibration => Label::Calib,
    }
}

fn idle_message(mode: Mode) -> &'static str {
    match mode {
        Mode::Practice => "Practice: tap along with the click and watch the error in ms.",
        Mode::Calibration => "Calibration: tap along with the click about 20 times; the offset updates itself.",
    }
}
