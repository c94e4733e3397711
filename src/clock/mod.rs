//! Edge- and pulse-driven timing.
//!
//! - `StepClock` advances a step index once per clock edge, holding each
//!   step for its duration and wrapping at the active length
//! - `PulseClock` measures the incoming quarter-note period and subdivides
//!   it into `PPQN` internal pulses
//! - `Record` is the flat key/value form used to persist pulse-clock state

mod pulse_clock;
mod record;
mod step_clock;

pub use pulse_clock::{PulseClock, PulseClockState, PulseEvent};
pub use record::{Record, RecordValue};
pub use step_clock::{ClockAdvance, LengthMode, StepClock};

/// Internal pulses per quarter note.
pub const PPQN: usize = 24;
