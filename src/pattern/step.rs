//! Duration-weighted steps for the edge-clocked sequencers.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shortest allowed duration code (muted, held for 4 clocks).
pub const MIN_DURATION: i8 = -3;

/// Longest allowed duration code (audible, held for 4 clocks).
pub const MAX_DURATION: i8 = 4;

/// Duration code of a freshly initialized step.
pub const DEFAULT_DURATION: i8 = 2;

/// Returns `true` if a duration code describes a muted step.
///
/// Codes at or below zero are muted; this is an encoding, not an error.
pub fn is_muted(duration: i8) -> bool {
    duration <= 0
}

/// Returns the number of clock edges a step with this duration code holds.
///
/// Audible steps hold for `duration` edges, muted steps for `|duration| + 1`.
///
/// # Examples
///
/// ```
/// use evoseq::pattern::hold_length;
///
/// assert_eq!(hold_length(3), 3);
/// assert_eq!(hold_length(0), 1);
/// assert_eq!(hold_length(-3), 4);
/// ```
pub fn hold_length(duration: i8) -> u32 {
    if is_muted(duration) {
        (-(duration as i32) + 1) as u32
    } else {
        duration as u32
    }
}

/// A single sequencer step: a pitch value and a duration code.
///
/// `cv` is a unit value for sequencers that map through a `CvRange`, or
/// volts for sequencers with a raw pitch output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStep")]
pub struct Step {
    /// Pitch value of the step
    pub cv: f32,
    /// Duration code in `MIN_DURATION..=MAX_DURATION`
    duration: i8,
}

impl Step {
    /// Creates a step, rejecting out-of-range duration codes.
    ///
    /// # Examples
    ///
    /// ```
    /// use evoseq::pattern::Step;
    ///
    /// let step = Step::new(0.25, -1).unwrap();
    /// assert!(step.is_muted());
    /// assert_eq!(step.hold_length(), 2);
    ///
    /// assert!(Step::new(0.25, 5).is_err());
    /// ```
    pub fn new(cv: f32, duration: i8) -> Result<Self, ConfigError> {
        let mut step = Self {
            cv,
            duration: DEFAULT_DURATION,
        };
        step.set_duration(duration)?;
        Ok(step)
    }

    /// Returns the duration code.
    pub fn duration(&self) -> i8 {
        self.duration
    }

    /// Sets the duration code.
    pub fn set_duration(&mut self, duration: i8) -> Result<(), ConfigError> {
        if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
            return Err(ConfigError::Duration(duration));
        }
        self.duration = duration;
        Ok(())
    }

    /// Returns `true` if the step plays without a gate.
    pub fn is_muted(&self) -> bool {
        is_muted(self.duration)
    }

    /// Returns the number of clock edges the step occupies.
    pub fn hold_length(&self) -> u32 {
        hold_length(self.duration)
    }
}

#[derive(Deserialize)]
struct RawStep {
    cv: f32,
    duration: i8,
}

impl TryFrom<RawStep> for Step {
    type Error = ConfigError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        Step::new(raw.cv, raw.duration)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self {
            cv: 0.5,
            duration: DEFAULT_DURATION,
        }
    }
}

/// Counts how many steps fit into a length measured in beats.
///
/// Steps are consumed in order, each taking its hold length, until the beat
/// budget is spent. The step that overruns the budget still counts. Step
/// indices wrap over `steps`, so a long budget with short steps keeps
/// counting past the end of the slice.
///
/// # Examples
///
/// ```
/// use evoseq::pattern::{Step, count_steps};
///
/// let steps = [Step::new(0.0, 2).unwrap(); 16];
/// assert_eq!(count_steps(&steps, 8), 4);
/// assert_eq!(count_steps(&steps, 7), 4);
/// ```
pub fn count_steps(steps: &[Step], beats: usize) -> usize {
    if steps.is_empty() {
        return 0;
    }
    let mut remaining = beats as i64;
    let mut count = 0;
    while remaining > 0 {
        remaining -= steps[count % steps.len()].hold_length() as i64;
        count += 1;
    }
    count
}
