//! Control-signal interpretation.
//!
//! This module turns continuously valued control voltages into the boolean
//! events the sequencer core runs on:
//! - `EdgeDetector` for debounced rising edges (clock and reset)
//! - `schmitt_trigger` for callers that own the high/low state themselves

mod edge;

pub use edge::{EdgeDetector, HIGH_THRESHOLD, LOW_THRESHOLD, schmitt_trigger};
