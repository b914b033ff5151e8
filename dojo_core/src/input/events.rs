use dojo_schema::Mode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A tap on the pad. `timestamp` is clock time when the tap happened.
    Tap { timestamp: f64 },
    /// Explicit start request, e.g. a start button.
    Start { timestamp: f64 },
    Stop,
    SetMode(Mode),
}
