//! Scale-aware content generator.
//!
//! Randomization only runs on an explicit request from the host, never on
//! the timing path. Every draw comes from the generator passed in, so a
//! seeded generator reproduces the same content.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, check_probability};
use crate::pattern::{
    MAX_DURATION, MAX_LENGTH, NoteBlock, NoteExtra, SLOTS_PER_BLOCK, Step, Subdivision,
};
use crate::pitch::{NOTE_CV_MAX, NOTE_CV_MIN, Pitch, PitchOutput, Scale, quantize_cv};

/// Weighted choices steering the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizeOdds {
    /// Chance a note moves up an octave
    pub octave_up: f32,
    /// Chance a note moves down an octave, drawn when it did not move up
    pub octave_down: f32,
    /// Chance a note is the root rather than a drawn scale degree
    pub root_bias: f32,
    /// Chance a slot repeats the previous slot of its block
    pub same_note_in_block: f32,
    /// Skew of the degree draw in `[-1, 1]`: negative favours low degrees,
    /// positive favours high ones
    pub low_high_bias: f32,
    /// Chance a note or step is muted
    pub mute_chance: f32,
    /// Chance the first slot of a block ties over from the previous block
    pub tie_chance: f32,
    /// Relative weights of the subdivisions in code order
    pub subdivision_weights: [f32; 7],
}

impl RandomizeOdds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("octave_up", self.octave_up)?;
        check_probability("octave_down", self.octave_down)?;
        check_probability("root_bias", self.root_bias)?;
        check_probability("same_note_in_block", self.same_note_in_block)?;
        check_probability("mute_chance", self.mute_chance)?;
        check_probability("tie_chance", self.tie_chance)?;
        if !(-1.0..=1.0).contains(&self.low_high_bias) {
            return Err(ConfigError::Bias(self.low_high_bias));
        }
        for (index, &value) in self.subdivision_weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Weight { index, value });
            }
        }
        if !self.subdivision_weights.iter().sum::<f32>().is_finite() {
            return Err(ConfigError::WeightTotal);
        }
        Ok(())
    }
}

impl Default for RandomizeOdds {
    fn default() -> Self {
        Self {
            octave_up: 0.2,
            octave_down: 0.1,
            root_bias: 0.25,
            same_note_in_block: 0.15,
            low_high_bias: 0.0,
            mute_chance: 0.1,
            tie_chance: 0.1,
            subdivision_weights: [4.0, 4.0, 1.0, 1.0, 1.0, 1.0, 2.0],
        }
    }
}

/// Rhythm drawn for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rhythm {
    pub subdivision: Subdivision,
    pub extras: [NoteExtra; SLOTS_PER_BLOCK],
}

/// Generates pitches and rhythms constrained to a scale.
///
/// # Examples
///
/// ```
/// use evoseq::pitch::{Pitch, Scale};
/// use evoseq::randomizer::ScaleRandomizer;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let randomizer = ScaleRandomizer::new(Scale::MinorPentatonic, Pitch::A);
/// let first = randomizer.pitches(&mut StdRng::seed_from_u64(3));
/// let second = randomizer.pitches(&mut StdRng::seed_from_u64(3));
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRandomizer {
    scale: Scale,
    root: Pitch,
    odds: RandomizeOdds,
}

impl ScaleRandomizer {
    /// Creates a randomizer with the default odds.
    pub fn new(scale: Scale, root: Pitch) -> Self {
        Self {
            scale,
            root,
            odds: RandomizeOdds::default(),
        }
    }

    /// Replaces the odds after validating them.
    pub fn with_odds(mut self, odds: RandomizeOdds) -> Result<Self, ConfigError> {
        odds.validate()?;
        self.odds = odds;
        Ok(self)
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn root(&self) -> Pitch {
        self.root
    }

    pub fn odds(&self) -> &RandomizeOdds {
        &self.odds
    }

    /// Draws one pitch in volts, on the semitone grid of the note-entry range.
    pub fn pitch<R: Rng>(&self, rng: &mut R) -> f32 {
        let intervals = self.scale.intervals();
        let degree = if chance(rng, self.odds.root_bias) {
            0
        } else {
            skewed_index(rng, intervals.len(), self.odds.low_high_bias)
        };
        let semitone = self.root.semitone_offset() + intervals[degree] - 1;

        let octave = if chance(rng, self.odds.octave_up) {
            1.0
        } else if chance(rng, self.odds.octave_down) {
            -1.0
        } else {
            0.0
        };
        fold_into_range(semitone as f32 / 12.0 + octave)
    }

    /// Draws pitches for every slot of every block.
    pub fn pitches<R: Rng>(&self, rng: &mut R) -> [[f32; SLOTS_PER_BLOCK]; MAX_LENGTH] {
        let mut pitches = [[0.0; SLOTS_PER_BLOCK]; MAX_LENGTH];
        for block in pitches.iter_mut() {
            for slot in 0..SLOTS_PER_BLOCK {
                block[slot] = if slot > 0 && chance(rng, self.odds.same_note_in_block) {
                    block[slot - 1]
                } else {
                    self.pitch(rng)
                };
            }
        }
        pitches
    }

    /// Draws the rhythm of one block. Block 0 never ties, since there is
    /// nothing before it to tie from.
    pub fn rhythm<R: Rng>(&self, rng: &mut R, block: usize) -> Rhythm {
        let subdivision = self.subdivision(rng);
        let mut extras = [NoteExtra::None; SLOTS_PER_BLOCK];
        for (slot, extra) in extras.iter_mut().enumerate().take(subdivision.note_count()) {
            *extra = if slot == 0 && block != 0 && chance(rng, self.odds.tie_chance) {
                NoteExtra::Tie
            } else if chance(rng, self.odds.mute_chance) {
                NoteExtra::Mute
            } else {
                NoteExtra::None
            };
        }
        Rhythm {
            subdivision,
            extras,
        }
    }

    /// Draws rhythms for every block.
    pub fn rhythms<R: Rng>(&self, rng: &mut R) -> [Rhythm; MAX_LENGTH] {
        let mut rhythms = [Rhythm::default(); MAX_LENGTH];
        for (block, rhythm) in rhythms.iter_mut().enumerate() {
            *rhythm = self.rhythm(rng, block);
        }
        rhythms
    }

    fn subdivision<R: Rng>(&self, rng: &mut R) -> Subdivision {
        let weights = self.odds.subdivision_weights.map(|w| w.max(0.0));
        let total: f32 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Subdivision::One;
        }
        let mut draw = rng.gen_range(0.0..total);
        for (subdivision, weight) in Subdivision::ALL.into_iter().zip(weights) {
            if draw < weight {
                return subdivision;
            }
            draw -= weight;
        }
        Subdivision::One
    }

    /// Overwrites pitch and rhythm of every block.
    pub fn randomize_blocks<R: Rng>(&self, rng: &mut R, blocks: &mut [NoteBlock; MAX_LENGTH]) {
        let pitches = self.pitches(rng);
        let rhythms = self.rhythms(rng);
        for ((block, pitches), rhythm) in blocks.iter_mut().zip(pitches).zip(rhythms) {
            block.subdivision = rhythm.subdivision;
            for ((slot, cv), extra) in block.slots_mut().iter_mut().zip(pitches).zip(rhythm.extras) {
                slot.cv = cv;
                slot.extra = extra;
            }
        }
        debug!(
            target: "evoseq::randomizer",
            scale = ?self.scale,
            root = %self.root,
            "randomized note blocks"
        );
    }

    /// Overwrites pitch and duration of every step.
    ///
    /// Pitches are stored in the form `output` expects: unit values for a
    /// range mapping, volts otherwise.
    pub fn randomize_steps<R: Rng>(&self, rng: &mut R, steps: &mut [Step], output: PitchOutput) {
        for step in steps.iter_mut() {
            let volts = self.pitch(rng);
            let cv = match output {
                PitchOutput::Range(range) => range.unmap(volts).clamp(0.0, 1.0),
                PitchOutput::Volts => volts,
            };
            let hold = rng.gen_range(1..=MAX_DURATION);
            let duration = if chance(rng, self.odds.mute_chance) {
                1 - hold
            } else {
                hold
            };
            if let Ok(randomized) = Step::new(cv, duration) {
                *step = randomized;
            }
        }
        debug!(
            target: "evoseq::randomizer",
            scale = ?self.scale,
            root = %self.root,
            steps = steps.len(),
            "randomized steps"
        );
    }
}

fn chance<R: Rng>(rng: &mut R, probability: f32) -> bool {
    rng.gen_range(0.0f32..1.0) < probability
}

fn skewed_index<R: Rng>(rng: &mut R, len: usize, bias: f32) -> usize {
    let exponent = 2.0f32.powf(-2.0 * bias.clamp(-1.0, 1.0));
    let unit: f32 = rng.gen_range(0.0..1.0);
    ((unit.powf(exponent) * len as f32) as usize).min(len - 1)
}

fn fold_into_range(mut volts: f32) -> f32 {
    const EPSILON: f32 = 1e-4;
    while volts > NOTE_CV_MAX + EPSILON {
        volts -= 1.0;
    }
    while volts < NOTE_CV_MIN - EPSILON {
        volts += 1.0;
    }
    quantize_cv(volts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn in_scale(randomizer: &ScaleRandomizer, volts: f32) -> bool {
        let semitone = (volts * 12.0).round() as i32;
        let relative = (semitone - randomizer.root().semitone_offset() as i32).rem_euclid(12);
        randomizer
            .scale()
            .intervals()
            .iter()
            .any(|&n| n as i32 - 1 == relative)
    }

    #[test]
    fn test_pitches_stay_in_scale_and_range() {
        let randomizer = ScaleRandomizer::new(Scale::Dorian, Pitch::D);
        let mut rng = StdRng::seed_from_u64(21);
        for block in randomizer.pitches(&mut rng) {
            for volts in block {
                assert!((NOTE_CV_MIN..=NOTE_CV_MAX).contains(&volts), "{volts}");
                assert!(in_scale(&randomizer, volts), "{volts}");
            }
        }
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let randomizer = ScaleRandomizer::new(Scale::Blues, Pitch::E);
        let mut a = [NoteBlock::default(); MAX_LENGTH];
        let mut b = [NoteBlock::default(); MAX_LENGTH];
        randomizer.randomize_blocks(&mut StdRng::seed_from_u64(5), &mut a);
        randomizer.randomize_blocks(&mut StdRng::seed_from_u64(5), &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_block_never_ties() {
        let odds = RandomizeOdds {
            tie_chance: 1.0,
            ..RandomizeOdds::default()
        };
        let randomizer = ScaleRandomizer::new(Scale::Major, Pitch::C)
            .with_odds(odds)
            .unwrap();
        for seed in 0..32 {
            let rhythms = randomizer.rhythms(&mut StdRng::seed_from_u64(seed));
            assert_ne!(rhythms[0].extras[0], NoteExtra::Tie);
            assert!(rhythms[1..].iter().all(|r| r.extras[0] == NoteExtra::Tie));
            for rhythm in rhythms {
                assert!(rhythm.extras[1..].iter().all(|&e| e != NoteExtra::Tie));
            }
        }
    }

    #[test]
    fn test_root_bias_one_plays_only_roots() {
        let odds = RandomizeOdds {
            root_bias: 1.0,
            octave_up: 0.0,
            octave_down: 0.0,
            ..RandomizeOdds::default()
        };
        let randomizer = ScaleRandomizer::new(Scale::Minor, Pitch::G)
            .with_odds(odds)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..16 {
            assert_eq!(randomizer.pitch(&mut rng), 7.0 / 12.0);
        }
    }

    #[test]
    fn test_zero_weights_fall_back_to_one_note() {
        let odds = RandomizeOdds {
            subdivision_weights: [0.0; 7],
            ..RandomizeOdds::default()
        };
        let randomizer = ScaleRandomizer::new(Scale::Major, Pitch::C)
            .with_odds(odds)
            .unwrap();
        let rhythm = randomizer.rhythm(&mut StdRng::seed_from_u64(1), 3);
        assert_eq!(rhythm.subdivision, Subdivision::One);
        assert!(rhythm.extras[1..].iter().all(|&e| e == NoteExtra::None));
    }

    #[test]
    fn test_steps_get_valid_durations() {
        let randomizer = ScaleRandomizer::new(Scale::Lydian, Pitch::F);
        let mut steps = [Step::default(); MAX_LENGTH];
        randomizer.randomize_steps(
            &mut StdRng::seed_from_u64(13),
            &mut steps,
            PitchOutput::default(),
        );
        for step in steps {
            assert!((1..=4).contains(&step.hold_length()));
            assert!((0.0..=1.0).contains(&step.cv));
        }
    }

    #[test]
    fn test_invalid_odds_rejected() {
        let odds = RandomizeOdds {
            mute_chance: -0.5,
            ..RandomizeOdds::default()
        };
        assert!(
            ScaleRandomizer::new(Scale::Major, Pitch::C)
                .with_odds(odds)
                .is_err()
        );
    }

    #[test]
    fn test_unusable_weights_rejected() {
        let randomizer = ScaleRandomizer::new(Scale::Major, Pitch::C);
        let with_weights = |weights: [f32; 7]| {
            randomizer.with_odds(RandomizeOdds {
                subdivision_weights: weights,
                ..RandomizeOdds::default()
            })
        };

        assert_eq!(with_weights([f32::MAX; 7]), Err(ConfigError::WeightTotal));
        let mut weights = [1.0; 7];
        weights[2] = f32::INFINITY;
        assert_eq!(
            with_weights(weights),
            Err(ConfigError::Weight { index: 2, value: f32::INFINITY })
        );
        weights[2] = -1.0;
        assert!(with_weights(weights).is_err());
        weights[2] = f32::NAN;
        assert!(with_weights(weights).is_err());
    }

    #[test]
    fn test_low_high_bias_bounded() {
        let randomizer = ScaleRandomizer::new(Scale::Major, Pitch::C);
        for bias in [-1.0, 0.0, 1.0] {
            let odds = RandomizeOdds { low_high_bias: bias, ..RandomizeOdds::default() };
            assert!(randomizer.with_odds(odds).is_ok());
        }
        let odds = RandomizeOdds { low_high_bias: 1.5, ..RandomizeOdds::default() };
        assert_eq!(randomizer.with_odds(odds), Err(ConfigError::Bias(1.5)));
    }

    #[test]
    fn test_overflowing_weights_fall_back_to_one_note() {
        let mut rng = StdRng::seed_from_u64(2);
        let odds = RandomizeOdds {
            subdivision_weights: [f32::MAX; 7],
            ..RandomizeOdds::default()
        };
        let randomizer = ScaleRandomizer {
            odds,
            ..ScaleRandomizer::new(Scale::Major, Pitch::C)
        };
        assert_eq!(randomizer.rhythm(&mut rng, 1).subdivision, Subdivision::One);
    }
}
