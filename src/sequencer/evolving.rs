//! Step sequencer whose steps are substituted over many cycles.

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::debug;

use super::{Inputs, Outputs, Sequencer};
use crate::clock::{ClockAdvance, LengthMode, StepClock};
use crate::config::{EvolutionConfig, SequenceConfig};
use crate::error::ConfigError;
use crate::evolution::{EvolutionEngine, Resolution};
use crate::pattern::{MAX_LENGTH, Step, count_steps};
use crate::randomizer::ScaleRandomizer;
use crate::signals::EdgeDetector;

/// A step sequencer whose content slowly evolves.
///
/// Once per cycle the evolution engine may substitute one step for
/// another. Substituted steps play the pitch of their target and, on
/// cycles where duration evolution fires, its duration too. Ratcheting
/// substitutions follow the clock instead of holding their gate.
pub struct EvolvingSequencer<R: Rng = ThreadRng> {
    steps: [Step; MAX_LENGTH],
    config: SequenceConfig,
    evolution: EvolutionConfig,
    clock: StepClock,
    engine: EvolutionEngine,
    clock_in: EdgeDetector,
    reset_in: EdgeDetector,
    playing: Option<Resolution>,
    cv: f32,
    rng: R,
}

impl EvolvingSequencer<ThreadRng> {
    /// Creates a sequencer using the thread-local generator.
    pub fn new(config: SequenceConfig, evolution: EvolutionConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, evolution, rand::thread_rng())
    }
}

impl<R: Rng> EvolvingSequencer<R> {
    /// Creates a sequencer with a custom generator.
    pub fn with_rng(
        config: SequenceConfig,
        evolution: EvolutionConfig,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        evolution.validate()?;
        Ok(Self {
            steps: [Step::default(); MAX_LENGTH],
            config,
            evolution,
            clock: StepClock::new(),
            engine: EvolutionEngine::new(),
            clock_in: EdgeDetector::new(),
            reset_in: EdgeDetector::new(),
            playing: None,
            cv: 0.0,
            rng,
        })
    }

    /// Number of steps taking part in a cycle.
    pub fn active_length(&self) -> usize {
        match self.config.length_mode {
            LengthMode::Steps => self.config.length,
            LengthMode::Beats => count_steps(&self.steps, self.config.length).min(MAX_LENGTH),
        }
    }

    fn advance(&mut self) {
        let active = self.active_length();
        let ClockAdvance::Step { index, wrapped } =
            self.clock.on_clock(self.config.length, self.config.length_mode)
        else {
            return;
        };

        if wrapped {
            self.engine
                .on_cycle_boundary(&mut self.rng, &self.evolution, active);
        }
        let resolution = self.engine.resolve(index, active, &self.evolution);
        self.clock
            .begin_step(self.steps[resolution.duration_index % MAX_LENGTH].duration());
        self.playing = Some(resolution);
    }

    /// Returns the nominal step, or -1 before the first clock edge.
    pub fn current_step(&self) -> i32 {
        self.clock.current_step()
    }

    /// Returns how the current step resolved, `None` before the first edge.
    pub fn playing(&self) -> Option<Resolution> {
        self.playing
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    pub fn engine(&self) -> &EvolutionEngine {
        &self.engine
    }

    pub fn steps(&self) -> &[Step; MAX_LENGTH] {
        &self.steps
    }

    /// Replaces one step's content.
    pub fn set_step(&mut self, index: usize, step: Step) -> Result<(), ConfigError> {
        let slot = self.steps.get_mut(index).ok_or(ConfigError::Index {
            index,
            len: MAX_LENGTH,
        })?;
        *slot = step;
        Ok(())
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SequenceConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn evolution_config(&self) -> &EvolutionConfig {
        &self.evolution
    }

    /// Replaces the evolution settings. Turning evolution back on starts
    /// from an empty mapping.
    pub fn set_evolution_config(&mut self, evolution: EvolutionConfig) -> Result<(), ConfigError> {
        evolution.validate()?;
        if evolution.enabled && !self.evolution.enabled {
            self.engine.reset();
        }
        self.evolution = evolution;
        Ok(())
    }

    /// Overwrites every step with scale-constrained random content.
    pub fn randomize(&mut self, randomizer: &ScaleRandomizer) {
        randomizer.randomize_steps(&mut self.rng, &mut self.steps, self.config.pitch_output);
    }
}

impl<R: Rng> Sequencer for EvolvingSequencer<R> {
    fn process(&mut self, inputs: &Inputs) -> Outputs {
        if self.reset_in.process(inputs.reset) {
            self.reset();
        }
        if self.clock_in.process(inputs.clock) {
            self.advance();
        }

        let Some(playing) = self.playing else {
            return Outputs::new(self.cv, false);
        };
        if self.clock.is_muted() {
            return Outputs::new(self.cv, false);
        }

        self.cv = self
            .config
            .pitch_output
            .to_volts(self.steps[playing.index % MAX_LENGTH].cv);
        Outputs::new(
            self.cv,
            self.clock.gate(self.clock_in.is_high(), playing.ratcheting),
        )
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.engine.reset();
        self.playing = None;
        debug!(target: "evoseq::sequencer", "evolving sequencer reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::GATE_HIGH;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sequencer(length: usize, evolution: EvolutionConfig) -> EvolvingSequencer<StdRng> {
        let config = SequenceConfig {
            length,
            ..SequenceConfig::default()
        };
        EvolvingSequencer::with_rng(config, evolution, StdRng::seed_from_u64(42)).unwrap()
    }

    fn pulse(sequencer: &mut EvolvingSequencer<StdRng>) -> Outputs {
        let out = sequencer.process(&Inputs::new(10.0, 0.0));
        sequencer.process(&Inputs::new(0.0, 0.0));
        out
    }

    #[test]
    fn test_steps_hold_for_their_duration() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        seq.set_step(0, Step::new(0.0, 2).unwrap()).unwrap();
        seq.set_step(1, Step::new(1.0, 1).unwrap()).unwrap();

        pulse(&mut seq);
        assert_eq!(seq.current_step(), 0);
        // Holding: gate stays high with the clock low
        assert!(seq.process(&Inputs::new(0.0, 0.0)).is_gate_high());
        pulse(&mut seq);
        assert_eq!(seq.current_step(), 0);
        pulse(&mut seq);
        assert_eq!(seq.current_step(), 1);
        assert!(!seq.process(&Inputs::new(0.0, 0.0)).is_gate_high());
    }

    #[test]
    fn test_cv_maps_through_range() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        seq.set_step(0, Step::new(1.0, 1).unwrap()).unwrap();
        let out = seq.process(&Inputs::new(10.0, 0.0));
        assert_eq!(out.cv, 3.0);
        assert_eq!(out.gate, GATE_HIGH);
    }

    #[test]
    fn test_muted_step_holds_cv() {
        let mut seq = sequencer(4, EvolutionConfig::default());
        seq.set_step(0, Step::new(1.0, 1).unwrap()).unwrap();
        seq.set_step(1, Step::new(0.0, 0).unwrap()).unwrap();

        let first = pulse(&mut seq);
        let muted = seq.process(&Inputs::new(10.0, 0.0));
        assert!(!muted.is_gate_high());
        assert_eq!(muted.cv, first.cv);
    }

    #[test]
    fn test_evolution_runs_on_wrap() {
        let mut seq = sequencer(
            4,
            EvolutionConfig {
                max_span: 1,
                ..EvolutionConfig::default()
            },
        );
        for _ in 0..4 {
            pulse(&mut seq);
            pulse(&mut seq);
        }
        assert_eq!(seq.engine().evolution_count(), 0);
        pulse(&mut seq);
        assert_eq!(seq.current_step(), 0);
        assert_eq!(seq.engine().evolution_count(), 1);
        assert_eq!(seq.engine().mapping().substituted_count(), 1);
    }

    #[test]
    fn test_reset_clears_evolution() {
        let mut seq = sequencer(
            2,
            EvolutionConfig {
                max_span: 2,
                ..EvolutionConfig::default()
            },
        );
        for _ in 0..12 {
            pulse(&mut seq);
        }
        seq.process(&Inputs::new(0.0, 10.0));
        assert_eq!(seq.current_step(), -1);
        assert_eq!(seq.engine().mapping().substituted_count(), 0);
        assert!(seq.playing().is_none());
    }

    #[test]
    fn test_reenabling_evolution_clears_mapping() {
        let mut seq = sequencer(
            2,
            EvolutionConfig {
                max_span: 1,
                ..EvolutionConfig::default()
            },
        );
        for _ in 0..6 {
            pulse(&mut seq);
        }
        assert_eq!(seq.engine().mapping().substituted_count(), 1);

        let mut evolution = *seq.evolution_config();
        evolution.enabled = false;
        seq.set_evolution_config(evolution).unwrap();
        assert_eq!(seq.engine().mapping().substituted_count(), 1);

        evolution.enabled = true;
        seq.set_evolution_config(evolution).unwrap();
        assert_eq!(seq.engine().mapping().substituted_count(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SequenceConfig {
            length: 17,
            ..SequenceConfig::default()
        };
        assert!(
            EvolvingSequencer::with_rng(config, EvolutionConfig::default(), StdRng::seed_from_u64(0))
                .is_err()
        );
        let mut seq = sequencer(4, EvolutionConfig::default());
        assert!(seq.set_step(16, Step::default()).is_err());
    }
}
