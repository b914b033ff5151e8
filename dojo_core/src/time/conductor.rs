use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;

/// Longest stretch the render clock will run ahead of the last audio position.
pub const MAX_EXTRAPOLATION_SECS: f64 = 0.1;

/// Render-loop view of the audio clock.
///
/// The audio side publishes its position into a shared `AtomicF64` once per
/// buffer. Between publications the conductor extrapolates with the render
/// loop's system time. The returned time never runs backwards, and a stalled
/// audio side freezes it after `MAX_EXTRAPOLATION_SECS` instead of drifting.
pub struct Conductor {
    audio_time_source: Arc<AtomicF64>,
    anchor_audio_time: f64,
    /// `None` until the first update.
    anchor_system_time: Option<f64>,
}

impl Conductor {
    pub fn new(audio_time_source: Arc<AtomicF64>) -> Self {
        Self {
            audio_time_source,
            anchor_audio_time: 0.0,
            anchor_system_time: None,
        }
    }

    /// Re-anchors on the latest published audio position.
    pub fn update(&mut self, current_system_time: f64) {
        let published = self.audio_time_source.load(Ordering::Acquire);
        let shown = self.get_time(current_system_time);
        self.anchor_audio_time = published.max(shown);
        self.anchor_system_time = Some(current_system_time);
    }

    pub fn get_time(&self, current_system_time: f64) -> f64 {
        let elapsed = match self.anchor_system_time {
            Some(anchor) => (current_system_time - anchor).clamp(0.0, MAX_EXTRAPOLATION_SECS),
            None => 0.0,
        };
        self.anchor_audio_time + elapsed
    }
}
