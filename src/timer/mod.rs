pub mod clock;
pub mod config;
pub mod controller;
pub mod state;

pub use clock::{format_remaining, ClockReading, SessionClock, SystemTime, TimeSource};
pub use config::TimerConfig;
pub use controller::{StartOutcome, TimerController, TimerEvent, TimerSnapshot};
pub use state::{TimerPhase, TimerState};
