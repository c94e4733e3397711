//! Step sequencer with level-driven retrograde and inversion inputs.

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::debug;

use super::{DirectionalSelector, Inputs, Outputs, Sequencer};
use crate::clock::{ClockAdvance, LengthMode, StepClock};
use crate::config::SequenceConfig;
use crate::error::ConfigError;
use crate::pattern::{MAX_LENGTH, Step, count_steps};
use crate::randomizer::ScaleRandomizer;
use crate::signals::EdgeDetector;

/// A step sequencer with retrograde and inversion inputs.
///
/// The cycle length is usually measured in beats, so the number of steps
/// per cycle depends on their durations. Left unpatched, the selector
/// inputs read low and the sequencer plays plain forward content; with a
/// [`PitchOutput::Volts`](crate::pitch::PitchOutput::Volts) output it then
/// behaves as a note-entry sequencer.
pub struct DirectionalSequencer<R: Rng = ThreadRng> {
    steps: [Step; MAX_LENGTH],
    config: SequenceConfig,
    clock: StepClock,
    selector: DirectionalSelector,
    clock_in: EdgeDetector,
    reset_in: EdgeDetector,
    cv: f32,
    rng: R,
}

impl DirectionalSequencer<ThreadRng> {
    pub fn new(config: SequenceConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, rand::thread_rng())
    }
}

impl<R: Rng> DirectionalSequencer<R> {
    pub fn with_rng(config: SequenceConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let steps = [Step::default(); MAX_LENGTH];
        let count = cycle_steps(&steps, &config);
        Ok(Self {
            steps,
            config,
            clock: StepClock::new(),
            selector: DirectionalSelector::new(count),
            clock_in: EdgeDetector::new(),
            reset_in: EdgeDetector::new(),
            cv: 0.0,
            rng,
        })
    }

    /// Number of steps that play in one cycle.
    pub fn cycle_steps(&self) -> usize {
        cycle_steps(&self.steps, &self.config)
    }

    fn advance(&mut self) {
        let count = self.cycle_steps();
        if let ClockAdvance::Step { index, wrapped } =
            self.clock.on_clock(self.config.length, self.config.length_mode)
        {
            self.selector.on_step(wrapped, count);
            self.clock
                .begin_step(self.steps[index % MAX_LENGTH].duration());
        }
    }

    /// Returns the forward step, or -1 before the first clock edge.
    pub fn current_step(&self) -> i32 {
        self.clock.current_step()
    }

    /// Returns the retrograde counter.
    pub fn retrograde_step(&self) -> i32 {
        self.selector.retrograde_step()
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    pub fn selector(&self) -> &DirectionalSelector {
        &self.selector
    }

    pub fn steps(&self) -> &[Step; MAX_LENGTH] {
        &self.steps
    }

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

    pub fn randomize(&mut self, randomizer: &ScaleRandomizer) {
        randomizer.randomize_steps(&mut self.rng, &mut self.steps, self.config.pitch_output);
    }
}

impl<R: Rng> Sequencer for DirectionalSequencer<R> {
    fn process(&mut self, inputs: &Inputs) -> Outputs {
        if self.reset_in.process(inputs.reset) {
            self.reset();
        }
        if self.clock_in.process(inputs.clock) {
            self.advance();
        }
        self.selector.sample(inputs.retrograde, inputs.invert);

        let Some(forward) = self.clock.position() else {
            return Outputs::new(self.cv, false);
        };
        if self.clock.is_muted() {
            return Outputs::new(self.cv, false);
        }

        let index = self.selector.select(forward % MAX_LENGTH);
        let value = self
            .selector
            .invert(self.steps[index % MAX_LENGTH].cv, self.steps[0].cv);
        self.cv = self.config.pitch_output.to_volts(value);
        Outputs::new(self.cv, self.clock.gate(self.clock_in.is_high(), false))
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.selector.reset(self.cycle_steps());
        debug!(
            target: "evoseq::sequencer",
            cycle_steps = self.cycle_steps(),
            "directional sequencer reset"
        );
    }
}

fn cycle_steps(steps: &[Step], config: &SequenceConfig) -> usize {
    match config.length_mode {
        LengthMode::Steps => config.length,
        LengthMode::Beats => count_steps(steps, config.length),
    }
}
