//! Error types for the configuration and persistence boundary.
//!
//! The timing core itself never fails: bad indices are wrapped, empty
//! measurements produce no events and impossible mutations are skipped.
//! These errors only surface when content or settings enter the crate.

use thiserror::Error;

/// A rejected configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sequence length {length} out of range 1..={max}")]
    Length { length: usize, max: usize },
    #[error("evolution span {0} exceeds the addressable range")]
    Span(usize),
    #[error("cycles per evolution {0} out of range 1..=16")]
    Cadence(u32),
    #[error("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("subdivision code {0} out of range 1..=7")]
    Subdivision(u8),
    #[error("duration {0} out of range -3..=4")]
    Duration(i8),
    #[error("tie is only allowed on the first slot of a block, not slot {0}")]
    Tie(usize),
    #[error("index {index} out of range for {len} entries")]
    Index { index: usize, len: usize },
    #[error("low/high bias {0} out of range -1..=1")]
    Bias(f32),
    #[error("subdivision weight {index} must be finite and non-negative, got {value}")]
    Weight { index: usize, value: f32 },
    #[error("subdivision weights must have a finite total")]
    WeightTotal,
}

/// A flat persistence record that could not be restored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing key '{0}'")]
    Missing(&'static str),
    #[error("key '{0}' holds the wrong kind of value")]
    Kind(&'static str),
    #[error("key '{key}' value {value} out of range")]
    Range { key: &'static str, value: i64 },
}

/// Error type for parsing pitch names from strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input string is empty")]
    Empty,
    #[error("invalid pitch name: '{0}'")]
    InvalidPitch(String),
    #[error("invalid octave: '{0}'")]
    InvalidOctave(String),
}

/// Checks that `value` is a probability.
pub(crate) fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}
