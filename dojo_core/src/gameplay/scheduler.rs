#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledClick {
    pub time: f64,
    pub beat_index: u64,
    pub accented: bool,
}

/// Look-ahead metronome scheduler.
///
/// Each `tick(now)` emits every beat whose time falls before `now + lookahead`
/// that has not been emitted yet. Beats are emitted exactly once, in order.
/// Nothing here blocks: the loop is bounded by the lookahead horizon.
#[derive(Debug, Clone)]
pub struct BeatScheduler {
    origin: f64,
    seconds_per_beat: f64,
    lookahead: f64,
    emitted: u64,
}

impl BeatScheduler {
    pub fn new(origin: f64, seconds_per_beat: f64, lookahead: f64) -> Self {
        Self {
            origin,
            seconds_per_beat,
            lookahead,
            emitted: 0,
        }
    }

    /// Time of the next beat to be emitted.
    pub fn next_beat_time(&self) -> f64 {
        self.beat_time(self.emitted)
    }

    pub fn beat_time(&self, beat_index: u64) -> f64 {
        // Computed from the index rather than accumulated so the grid never drifts.
        self.origin + beat_index as f64 * self.seconds_per_beat
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn tick(&mut self, now: f64) -> Vec<ScheduledClick> {
        let horizon = now + self.lookahead;
        let mut out = Vec::new();
        while self.next_beat_time() < horizon {
            let beat_index = self.emitted;
            out.push(ScheduledClick {
                time: self.beat_time(beat_index),
                beat_index,
                accented: beat_index % 4 == 0,
            });
            self.emitted += 1;
        }
        out
    }
}
