//! Host-facing sequencer modules.
//!
//! Each sequencer is driven by one call to [`Sequencer::process`] per
//! control tick. Reset is handled before clock within a tick, so a reset
//! and clock arriving together always yield the first step of a fresh
//! cycle.

mod directional;
mod evolving;
mod pulse;
mod selector;

pub use directional::DirectionalSequencer;
pub use evolving::EvolvingSequencer;
pub use pulse::PulseSequencer;
pub use selector::DirectionalSelector;

/// Gate output level while high.
pub const GATE_HIGH: f32 = 10.0;

/// Gate output level while low.
pub const GATE_LOW: f32 = 0.0;

/// Input voltages sampled for one control tick.
///
/// Unpatched inputs read 0 V.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Inputs {
    pub clock: f32,
    pub reset: f32,
    /// Level selecting retrograde playback
    pub retrograde: f32,
    /// Level enabling pitch inversion
    pub invert: f32,
}

impl Inputs {
    /// Creates inputs with only clock and reset patched.
    pub fn new(clock: f32, reset: f32) -> Self {
        Self {
            clock,
            reset,
            ..Self::default()
        }
    }

    pub fn with_retrograde(mut self, level: f32) -> Self {
        self.retrograde = level;
        self
    }

    pub fn with_invert(mut self, level: f32) -> Self {
        self.invert = level;
        self
    }
}

/// Output voltages produced by one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outputs {
    /// Pitch in volts
    pub cv: f32,
    /// Gate, either [`GATE_HIGH`] or [`GATE_LOW`]
    pub gate: f32,
}

impl Outputs {
    pub(crate) fn new(cv: f32, gate: bool) -> Self {
        Self {
            cv,
            gate: if gate { GATE_HIGH } else { GATE_LOW },
        }
    }

    /// Returns `true` if the gate is high.
    pub fn is_gate_high(&self) -> bool {
        self.gate >= GATE_HIGH
    }
}

/// A clocked control-rate sequencer.
///
/// # Examples
///
/// ```
/// use evoseq::config::{EvolutionConfig, SequenceConfig};
/// use evoseq::sequencer::{EvolvingSequencer, Inputs, Sequencer};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut sequencer = EvolvingSequencer::with_rng(
///     SequenceConfig::default(),
///     EvolutionConfig::default(),
///     StdRng::seed_from_u64(1),
/// )
/// .unwrap();
///
/// let out = sequencer.process(&Inputs::new(10.0, 0.0));
/// assert!(out.is_gate_high());
/// assert_eq!(sequencer.current_step(), 0);
/// ```
pub trait Sequencer {
    /// Processes one control tick.
    fn process(&mut self, inputs: &Inputs) -> Outputs;

    /// Returns to the idle state before the first step. Idempotent.
    fn reset(&mut self);
}
