//! Evoseq - The timing core of an evolving step sequencer
//!
//! This library turns a clock and reset signal stream into pitch and gate
//! outputs. Steps hold for a number of clock edges, a probabilistic
//! evolution process substitutes steps for one another over many cycles,
//! and a self-measuring pulse clock resolves sub-beat rhythms inside
//! quarter-note blocks.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod evolution;
pub mod pattern;
pub mod pitch;
pub mod randomizer;
pub mod sequencer;
pub mod signals;

// Re-export commonly used types at the crate root
pub use clock::{LengthMode, PulseClock, Record, StepClock};
pub use config::{DeevolutionMode, EvolutionConfig, SequenceConfig};
pub use controller::{NoteBank, NoteController};
pub use error::{ConfigError, ParseError, RecordError};
pub use evolution::{EvolutionEngine, EvolutionMapping, RatchetTable};
pub use pattern::{NoteBlock, NoteExtra, Step, Subdivision, SubdivisionResolver};
pub use pitch::{CvRange, Pitch, PitchOutput, Scale};
pub use randomizer::{RandomizeOdds, ScaleRandomizer};
pub use sequencer::{
    DirectionalSequencer, EvolvingSequencer, Inputs, Outputs, PulseSequencer, Sequencer,
};
pub use signals::EdgeDetector;

#[cfg(feature = "macros")]
pub use evoseq_macros::cv;
