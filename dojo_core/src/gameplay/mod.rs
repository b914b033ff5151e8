pub mod calibration;
pub mod judge;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod stats;

/// Time anchors of one session, all on the audio clock's base (seconds).
///
/// `count_in_start <= play_start <= session_end` holds for every anchor built
/// through [`TimeAnchor::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAnchor {
    pub count_in_start: f64,
    pub play_start: f64,
    pub session_end: f64,
}

impl TimeAnchor {
    pub fn new(count_in_start: f64, count_in_beats: u32, seconds_per_beat: f64, duration_secs: f64) -> Self {
        let play_start = count_in_start + count_in_beats as f64 * seconds_per_beat;
        Self {
            count_in_start,
            play_start,
            session_end: play_start + duration_secs.max(0.0),
        }
    }

    /// Half-open scored window `[play_start, session_end)`.
    pub fn in_play(&self, t: f64) -> bool {
        t >= self.play_start && t < self.session_end
    }

    pub fn is_over(&self, t: f64) -> bool {
        t >= self.session_end
    }
}
