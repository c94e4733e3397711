//! Duration-holding step counter driven by clock edges.

use serde::{Deserialize, Serialize};

use crate::pattern::{hold_length, is_muted};

/// How the active sequence length is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthMode {
    /// The cycle wraps after `length` steps, however long they hold
    #[default]
    Steps,
    /// The cycle wraps after `length` clock edges
    Beats,
}

/// Result of feeding one rising clock edge to a `StepClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAdvance {
    /// The current step is still holding
    Hold,
    /// A new step started; `wrapped` marks a cycle boundary
    Step { index: usize, wrapped: bool },
}

/// A step counter that holds each step for its duration.
///
/// The clock does not look at step content itself. After it reports
/// [`ClockAdvance::Step`], the caller resolves which step actually plays
/// (evolution may substitute another one) and passes that step's duration
/// code to [`StepClock::begin_step`].
///
/// # Examples
///
/// ```
/// use evoseq::clock::{ClockAdvance, LengthMode, StepClock};
///
/// let mut clock = StepClock::new();
/// assert_eq!(clock.current_step(), -1);
///
/// let advance = clock.on_clock(4, LengthMode::Steps);
/// assert_eq!(advance, ClockAdvance::Step { index: 0, wrapped: false });
/// clock.begin_step(2);
///
/// // The second edge is swallowed by the two-edge hold
/// assert_eq!(clock.on_clock(4, LengthMode::Steps), ClockAdvance::Hold);
/// assert_eq!(
///     clock.on_clock(4, LengthMode::Steps),
///     ClockAdvance::Step { index: 1, wrapped: false }
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClock {
    /// Current step, -1 before the first edge
    current_step: i32,
    /// Current beat within the cycle, -1 before the first edge
    current_beat: i32,
    /// Edges left on the current step, counting the current one
    current_dur: u32,
    /// Whether the current step is muted
    muted: bool,
}

impl StepClock {
    /// Creates a clock in the idle, pre-start state.
    pub fn new() -> Self {
        Self {
            current_step: -1,
            current_beat: -1,
            current_dur: 0,
            muted: false,
        }
    }

    /// Returns the clock to the idle, pre-start state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances the clock by one rising edge.
    ///
    /// In [`LengthMode::Steps`] the cycle wraps when the step index reaches
    /// `length`. In [`LengthMode::Beats`] it wraps when `length` edges have
    /// passed, cutting the current step short, and step 0 starts fresh.
    pub fn on_clock(&mut self, length: usize, mode: LengthMode) -> ClockAdvance {
        let length = length.max(1) as i32;
        match mode {
            LengthMode::Steps => {
                if self.current_dur > 1 {
                    self.current_dur -= 1;
                    return ClockAdvance::Hold;
                }
                self.current_step += 1;
                let wrapped = self.current_step >= length;
                if wrapped {
                    self.current_step = 0;
                }
                ClockAdvance::Step {
                    index: self.current_step as usize,
                    wrapped,
                }
            }
            LengthMode::Beats => {
                self.current_beat += 1;
                if self.current_beat >= length {
                    self.current_beat = 0;
                    self.current_step = 0;
                    return ClockAdvance::Step {
                        index: 0,
                        wrapped: true,
                    };
                }
                if self.current_dur > 1 {
                    self.current_dur -= 1;
                    return ClockAdvance::Hold;
                }
                self.current_step += 1;
                ClockAdvance::Step {
                    index: self.current_step as usize,
                    wrapped: false,
                }
            }
        }
    }

    /// Starts holding the step that was just entered.
    pub fn begin_step(&mut self, duration: i8) {
        self.muted = is_muted(duration);
        self.current_dur = hold_length(duration);
    }

    /// Returns the current step, or -1 before the first edge.
    pub fn current_step(&self) -> i32 {
        self.current_step
    }

    /// Returns the current step, or `None` before the first edge.
    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.current_step).ok()
    }

    /// Returns the current beat, or -1 before the first edge.
    pub fn current_beat(&self) -> i32 {
        self.current_beat
    }

    /// Returns the edges left on the current step, counting the current one.
    pub fn hold_remaining(&self) -> u32 {
        self.current_dur
    }

    /// Returns `true` if the current step is muted.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Computes the gate level for the current tick.
    ///
    /// The gate is high while the clock input is high or while the step
    /// still holds (unless it is ratcheting, in which case it follows the
    /// clock). Muted steps never gate.
    pub fn gate(&self, clock_high: bool, ratcheting: bool) -> bool {
        !self.muted && (clock_high || (self.current_dur > 1 && !ratcheting))
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}
