//! Block sequencer clocked by a self-measuring pulse clock.

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::debug;

use super::{Inputs, Outputs, Sequencer};
use crate::clock::{PulseClock, PulseClockState, PulseEvent, Record};
use crate::config::EvolutionConfig;
use crate::controller::NoteBank;
use crate::error::{ConfigError, RecordError};
use crate::evolution::{EvolutionEngine, Resolution};
use crate::pattern::{MAX_LENGTH, NoteBlock, NoteExtra, SubdivisionResolver};
use crate::randomizer::ScaleRandomizer;
use crate::signals::EdgeDetector;

/// A block sequencer clocked by a self-measuring pulse clock.
///
/// Each block is one quarter note (one clock period) split into up to four
/// notes. Evolution substitutes whole blocks; on cycles where duration
/// evolution fires the substituted block's subdivision is used as well.
/// A ratcheting block plays its notes legato.
///
/// The gate is high while a note sounds and drops for the last pulse of
/// each note, unless the next onset is a tie.
///
/// # Examples
///
/// ```
/// use evoseq::config::EvolutionConfig;
/// use evoseq::sequencer::{Inputs, PulseSequencer, Sequencer};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut sequencer =
///     PulseSequencer::with_rng(4, EvolutionConfig::advanced(), StdRng::seed_from_u64(9)).unwrap();
///
/// // The first edge only seeds the period measurement
/// for tick in 0..24 {
///     let clock = if tick < 12 { 10.0 } else { 0.0 };
///     sequencer.process(&Inputs::new(clock, 0.0));
/// }
/// assert_eq!(sequencer.current_pulse(), -1);
///
/// sequencer.process(&Inputs::new(10.0, 0.0));
/// assert_eq!(sequencer.current_pulse(), 0);
/// assert_eq!(sequencer.pulse_clock().clock_length(), 24);
/// ```
pub struct PulseSequencer<R: Rng = ThreadRng> {
    bank: NoteBank,
    length: usize,
    evolution: EvolutionConfig,
    pulse: PulseClock,
    resolver: SubdivisionResolver,
    engine: EvolutionEngine,
    clock_in: EdgeDetector,
    reset_in: EdgeDetector,
    block: Option<usize>,
    playing: Option<Resolution>,
    gate: bool,
    rng: R,
}

impl PulseSequencer<ThreadRng> {
    pub fn new(length: usize, evolution: EvolutionConfig) -> Result<Self, ConfigError> {
        Self::with_rng(length, evolution, rand::thread_rng())
    }
}

impl<R: Rng> PulseSequencer<R> {
    /// Creates a sequencer of `length` blocks with a custom generator.
    pub fn with_rng(length: usize, evolution: EvolutionConfig, rng: R) -> Result<Self, ConfigError> {
        check_length(length)?;
        evolution.validate()?;
        Ok(Self {
            bank: NoteBank::new(),
            length,
            evolution,
            pulse: PulseClock::new(),
            resolver: SubdivisionResolver::new(),
            engine: EvolutionEngine::new(),
            clock_in: EdgeDetector::new(),
            reset_in: EdgeDetector::new(),
            block: None,
            playing: None,
            gate: false,
            rng,
        })
    }

    fn on_pulse(&mut self, event: PulseEvent) {
        if event.wrapped {
            self.engine
                .on_cycle_boundary(&mut self.rng, &self.evolution, self.length);
        }

        let nominal = event.block();
        let resolution = match self.playing {
            Some(playing) if self.block == Some(nominal) && event.pulse_in_block() != 0 => playing,
            _ => {
                let resolution = self.engine.resolve(nominal, self.length, &self.evolution);
                self.block = Some(nominal);
                self.playing = Some(resolution);
                resolution
            }
        };

        let block = self.effective_block(&resolution);
        let pulse_in_block = event.pulse_in_block();
        let state = self
            .resolver
            .on_pulse(&block, pulse_in_block, resolution.ratcheting);

        let position = SubdivisionResolver::locate(block.subdivision, pulse_in_block);
        let last_pulse = position.remaining == 1;
        let holds = if position.slot + 1 >= block.subdivision.note_count() {
            self.next_block_ties(nominal)
        } else {
            resolution.ratcheting
        };
        self.gate = state.sounding && !(last_pulse && !holds);
    }

    /// Content of the played block with the subdivision of its duration source.
    fn effective_block(&self, resolution: &Resolution) -> NoteBlock {
        let mut block = *self.bank.block(resolution.index);
        block.subdivision = self.bank.block(resolution.duration_index).subdivision;
        block
    }

    fn next_block_ties(&self, nominal: usize) -> bool {
        let next = (nominal + 1) % self.length;
        let resolution = self.engine.resolve(next, self.length, &self.evolution);
        self.bank.block(resolution.index).slot(0).extra == NoteExtra::Tie
    }

    /// Returns the absolute pulse, or -1 before the first pulse.
    pub fn current_pulse(&self) -> i64 {
        self.pulse.current_pulse()
    }

    /// Returns the nominal block of the last pulse.
    pub fn current_block(&self) -> Option<usize> {
        self.block
    }

    /// Returns how the current block resolved.
    pub fn playing(&self) -> Option<Resolution> {
        self.playing
    }

    pub fn pulse_clock(&self) -> &PulseClock {
        &self.pulse
    }

    pub fn engine(&self) -> &EvolutionEngine {
        &self.engine
    }

    pub fn bank(&self) -> &NoteBank {
        &self.bank
    }

    /// Mutable access to note content, for use with a
    /// [`NoteController`](crate::controller::NoteController).
    pub fn bank_mut(&mut self) -> &mut NoteBank {
        &mut self.bank
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Sets the number of blocks in a cycle.
    pub fn set_length(&mut self, length: usize) -> Result<(), ConfigError> {
        check_length(length)?;
        self.length = length;
        Ok(())
    }

    pub fn evolution_config(&self) -> &EvolutionConfig {
        &self.evolution
    }

    /// Replaces the evolution settings. Turning evolution back on starts
    /// from an empty mapping.
    pub fn set_evolution_config(&mut self, evolution: EvolutionConfig) -> Result<(), ConfigError> {
        evolution.validate()?;
        self.apply_evolution(evolution);
        Ok(())
    }

    /// Switches evolution on or off.
    pub fn set_evolution_enabled(&mut self, enabled: bool) {
        self.apply_evolution(EvolutionConfig {
            enabled,
            ..self.evolution
        });
    }

    fn apply_evolution(&mut self, evolution: EvolutionConfig) {
        if evolution.enabled && !self.evolution.enabled {
            self.engine.reset();
            debug!(target: "evoseq::sequencer", "evolution enabled, mapping cleared");
        }
        self.evolution = evolution;
    }

    /// Overwrites every block with scale-constrained random content.
    pub fn randomize(&mut self, randomizer: &ScaleRandomizer) {
        randomizer.randomize_blocks(&mut self.rng, self.bank.blocks_mut());
    }

    /// Captures the pulse clock as a flat record.
    pub fn save_state(&self) -> Record {
        self.pulse.state(self.clock_in.is_high()).to_record()
    }

    /// Restores the pulse clock from a flat record.
    pub fn restore_state(&mut self, record: &Record) -> Result<(), RecordError> {
        let state = PulseClockState::from_record(record)?;
        self.pulse.restore(&state);
        self.clock_in.set_high(state.clock_high);
        self.block = None;
        self.playing = None;
        debug!(
            target: "evoseq::sequencer",
            clock_length = state.clock_length,
            current_pulse = state.current_pulse,
            "pulse state restored"
        );
        Ok(())
    }
}

impl<R: Rng> Sequencer for PulseSequencer<R> {
    fn process(&mut self, inputs: &Inputs) -> Outputs {
        if self.reset_in.process(inputs.reset) {
            self.reset();
        }
        let edge = self.clock_in.process(inputs.clock);
        if let Some(event) = self.pulse.tick(edge, self.length) {
            self.on_pulse(event);
        }
        Outputs::new(self.resolver.cv(), self.gate)
    }

    fn reset(&mut self) {
        self.pulse.reset();
        self.engine.reset();
        self.resolver.reset();
        self.block = None;
        self.playing = None;
        self.gate = false;
        debug!(target: "evoseq::sequencer", "pulse sequencer reset");
    }
}

fn check_length(length: usize) -> Result<(), ConfigError> {
    if (1..=MAX_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(ConfigError::Length {
            length,
            max: MAX_LENGTH,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PPQN;
    use crate::pattern::Subdivision;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PERIOD: usize = 48;

    fn sequencer(length: usize, evolution: EvolutionConfig) -> PulseSequencer<StdRng> {
        PulseSequencer::with_rng(length, evolution, StdRng::seed_from_u64(17)).unwrap()
    }

    fn clock_level(tick: usize) -> f32 {
        if tick % PERIOD < PERIOD / 2 { 10.0 } else { 0.0 }
    }

    /// Runs a steady clock, recording the pulse and outputs after every tick.
    fn run(seq: &mut PulseSequencer<StdRng>, ticks: std::ops::Range<usize>) -> Vec<(i64, Outputs)> {
        ticks
            .map(|tick| {
                let out = seq.process(&Inputs::new(clock_level(tick), 0.0));
                (seq.current_pulse(), out)
            })
            .collect()
    }

    /// Outputs on the tick a pulse first fired.
    fn at(trace: &[(i64, Outputs)], pulse: i64) -> Outputs {
        trace
            .iter()
            .find(|(p, _)| *p == pulse)
            .map(|(_, out)| *out)
            .unwrap()
    }

    fn block(subdivision: Subdivision, cvs: &[f32]) -> NoteBlock {
        let mut block = NoteBlock::new(subdivision);
        for (slot, &cv) in cvs.iter().enumerate() {
            block.set_cv(slot, cv).unwrap();
        }
        block
    }

    #[test]
    fn test_two_notes_per_block() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        seq.bank_mut().blocks_mut()[0] = block(Subdivision::Two, &[0.25, 0.5]);

        let trace = run(&mut seq, 0..PERIOD * 2);
        assert_eq!(at(&trace, 0).cv, 0.25);
        assert!(at(&trace, 0).is_gate_high());
        assert!(at(&trace, 5).is_gate_high());
        assert!(!at(&trace, 11).is_gate_high());
        assert_eq!(at(&trace, 12).cv, 0.5);
        assert!(at(&trace, 12).is_gate_high());
        assert!(!at(&trace, 23).is_gate_high());
    }

    #[test]
    fn test_tie_holds_across_blocks() {
        let mut seq = sequencer(2, EvolutionConfig::default());
        seq.bank_mut().blocks_mut()[0] = block(Subdivision::One, &[0.25]);
        let mut tied = block(Subdivision::Two, &[0.75, 0.5]);
        tied.set_extra(0, NoteExtra::Tie).unwrap();
        seq.bank_mut().blocks_mut()[1] = tied;

        let trace = run(&mut seq, 0..PERIOD * 3);
        assert!(at(&trace, 23).is_gate_high());
        let held = at(&trace, PPQN as i64);
        assert_eq!(held.cv, 0.25);
        assert!(held.is_gate_high());
        assert!(!at(&trace, 35).is_gate_high());
        assert_eq!(at(&trace, 36).cv, 0.5);
        assert!(at(&trace, 36).is_gate_high());
    }

    #[test]
    fn test_mute_moves_pitch_without_gate() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        let mut muted = block(Subdivision::Two, &[0.25, 1.0]);
        muted.set_extra(1, NoteExtra::Mute).unwrap();
        seq.bank_mut().blocks_mut()[0] = muted;

        let trace = run(&mut seq, 0..PERIOD * 2);
        let out = at(&trace, 12);
        assert_eq!(out.cv, 1.0);
        assert!(!out.is_gate_high());
    }

    #[test]
    fn test_ratcheting_block_plays_legato() {
        let evolution = EvolutionConfig {
            max_span: 1,
            ratchet_chance: 1.0,
            ..EvolutionConfig::default()
        };
        let mut seq = sequencer(1, evolution);
        seq.bank_mut().blocks_mut()[0] = block(Subdivision::Four, &[0.0, 0.1, 0.2, 0.3]);

        let first = run(&mut seq, 0..PERIOD * 2);
        assert!(!at(&first, 5).is_gate_high());

        let second = run(&mut seq, PERIOD * 2..PERIOD * 3);
        assert_eq!(seq.engine().mapping().get(0), Some(0));
        assert!(seq.playing().unwrap().ratcheting);
        assert!(at(&second, 5).is_gate_high());
        assert!(at(&second, 11).is_gate_high());
        assert!(!at(&second, 23).is_gate_high());
    }

    #[test]
    fn test_reset_with_clock_starts_first_pulse() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        run(&mut seq, 0..PERIOD * 2 + 30);
        assert!(seq.current_pulse() > PPQN as i64);

        seq.process(&Inputs::new(10.0, 10.0));
        assert_eq!(seq.current_pulse(), 0);
        assert_eq!(seq.current_block(), Some(0));
    }

    #[test]
    fn test_state_survives_save_and_restore() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        run(&mut seq, 0..PERIOD * 2 + 10);
        let record = seq.save_state();
        assert_eq!(record.len(), 5);

        let mut restored = sequencer(4, EvolutionConfig::default());
        restored.restore_state(&record).unwrap();
        assert_eq!(restored.current_pulse(), seq.current_pulse());
        assert_eq!(restored.pulse_clock().clock_length(), PERIOD as u64);

        let original = run(&mut seq, PERIOD * 2 + 10..PERIOD * 4);
        let resumed = run(&mut restored, PERIOD * 2 + 10..PERIOD * 4);
        let pulses = |trace: &[(i64, Outputs)]| trace.iter().map(|(p, _)| *p).collect::<Vec<_>>();
        assert_eq!(pulses(&original), pulses(&resumed));
    }

    #[test]
    fn test_restore_rejects_incomplete_record() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        assert!(seq.restore_state(&Record::new()).is_err());
    }

    #[test]
    fn test_restored_huge_period_keeps_running() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        let mut record = seq.save_state();
        record.set_int("clockLength", i64::MAX);
        record.set_int("currentPulse", 5);
        record.set_int("pulseCounter", 1);
        seq.restore_state(&record).unwrap();

        for _ in 0..4 {
            seq.process(&Inputs::new(0.0, 0.0));
        }
        assert_eq!(seq.current_pulse(), 6);
        assert_eq!(seq.current_block(), Some(0));
    }

    #[test]
    fn test_toggling_evolution_clears_mapping() {
        let evolution = EvolutionConfig {
            max_span: 1,
            ..EvolutionConfig::default()
        };
        let mut seq = sequencer(1, evolution);
        run(&mut seq, 0..PERIOD * 2 + 1);
        assert_eq!(seq.engine().mapping().substituted_count(), 1);

        seq.set_evolution_enabled(false);
        assert!(!seq.engine().resolve(0, 1, seq.evolution_config()).substituted);
        seq.set_evolution_enabled(true);
        assert_eq!(seq.engine().mapping().substituted_count(), 0);
    }

    #[test]
    fn test_length_bounds() {
        assert!(PulseSequencer::with_rng(0, EvolutionConfig::default(), StdRng::seed_from_u64(0)).is_err());
        let mut seq = sequencer(4, EvolutionConfig::default());
        assert!(seq.set_length(17).is_err());
        assert!(seq.set_length(16).is_ok());
    }
}
