pub mod conductor;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use atomic_float::AtomicF64;
use parking_lot::Mutex;

use crate::audio::click_track::{Click, ClickHandle};
use crate::DojoResult;

/// Monotonic time source plus the "play a click at T" primitive.
///
/// Times are seconds on the clock's own base. `schedule_click` must never block:
/// it only hands a future-timestamped trigger to the audio side.
pub trait AudioClock {
    fn now(&self) -> f64;

    fn schedule_click(&self, at: f64, accented: bool);

    /// Drops clicks scheduled for the future. Called on a hard stop.
    fn cancel_clicks(&self) {}

    /// Brings the underlying device up. Called once before the first session.
    fn resume(&self) -> DojoResult<()> {
        Ok(())
    }
}

/// Clock whose time only moves when told to. Every scheduled click is recorded.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicF64>,
    clicks: Arc<Mutex<Vec<Click>>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time: Arc::new(AtomicF64::new(start)),
            clicks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set(&self, time: f64) {
        self.time.store(time, Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.time.fetch_add(seconds, Ordering::AcqRel);
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.clicks.lock().clone()
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        self.time.load(Ordering::Acquire)
    }

    fn schedule_click(&self, at: f64, accented: bool) {
        self.clicks.lock().push(Click::new(at, accented));
    }

    fn cancel_clicks(&self) {
        let now = self.now();
        self.clicks.lock().retain(|c| c.time <= now);
    }
}

/// Wall-clock backed time source that forwards clicks to a click track.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    clicks: ClickHandle,
}

impl SystemClock {
    pub fn new(clicks: ClickHandle) -> Self {
        Self {
            origin: Instant::now(),
            clicks,
        }
    }
}

impl AudioClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn schedule_click(&self, at: f64, accented: bool) {
        self.clicks.schedule(at, accented);
    }

    fn cancel_clicks(&self) {
        self.clicks.clear();
    }
}
