use crossbeam_channel::{unbounded, Receiver, Sender};

pub const ACCENT_FREQUENCY_HZ: f32 = 1400.0;
pub const CLICK_FREQUENCY_HZ: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    /// Clock time at which the click must sound.
    pub time: f64,
    pub accented: bool,
    pub frequency_hz: f32,
}

impl Click {
    pub fn new(time: f64, accented: bool) -> Self {
        let frequency_hz = if accented {
            ACCENT_FREQUENCY_HZ
        } else {
            CLICK_FREQUENCY_HZ
        };
        Self {
            time,
            accented,
            frequency_hz,
        }
    }
}

pub enum ClickCommand {
    Schedule(Click),
    /// Drops every click not yet played.
    Clear,
}

/// Output side of the metronome: holds future clicks until they are due.
pub struct ClickTrack {
    pending: Vec<Click>,
    command_rx: Receiver<ClickCommand>,
}

#[derive(Debug, Clone)]
pub struct ClickHandle {
    command_tx: Sender<ClickCommand>,
}

impl ClickHandle {
    pub fn schedule(&self, at: f64, accented: bool) {
        let _ = self.command_tx.send(ClickCommand::Schedule(Click::new(at, accented)));
    }

    pub fn clear(&self) {
        let _ = self.command_tx.send(ClickCommand::Clear);
    }
}

impl ClickTrack {
    pub fn new() -> (Self, ClickHandle) {
        let (tx, rx) = unbounded();
        (
            Self {
                pending: Vec::new(),
                command_rx: rx,
            },
            ClickHandle { command_tx: tx },
        )
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Applies queued commands, then removes and returns every click due at
    /// `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<Click> {
        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                ClickCommand::Schedule(click) => self.pending.push(click),
                ClickCommand::Clear => self.pending.clear(),
            }
        }

        let (mut due, later): (Vec<Click>, Vec<Click>) =
            self.pending.drain(..).partition(|c| c.time <= now);
        self.pending = later;
        due.sort_by(|a, b| a.time.total_cmp(&b.time));
        due
    }
}
