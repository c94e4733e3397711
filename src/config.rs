//! Configuration surface read by the sequencers.
//!
//! Hosts own these values (panel parameters, presets, files) and hand them
//! to a sequencer; the core never writes them. Every field has a serde
//! default so partial documents deserialize.

use serde::{Deserialize, Serialize};

use crate::clock::LengthMode;
use crate::error::{ConfigError, check_probability};
use crate::pattern::MAX_LENGTH;
use crate::pitch::PitchOutput;

/// Longest sequence when the length is measured in beats.
pub const MAX_BEATS: usize = MAX_LENGTH * 4;

/// Length and output settings shared by every sequencer.
///
/// # Examples
///
/// ```
/// use evoseq::clock::LengthMode;
/// use evoseq::config::SequenceConfig;
///
/// let config = SequenceConfig {
///     length: 32,
///     length_mode: LengthMode::Beats,
///     ..SequenceConfig::default()
/// };
/// assert!(config.validate().is_ok());
///
/// let too_long = SequenceConfig { length: 32, ..SequenceConfig::default() };
/// assert!(too_long.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Active length in steps, beats or blocks
    #[serde(default = "SequenceConfig::default_length")]
    pub length: usize,
    /// Whether `length` counts steps or clock edges
    #[serde(default)]
    pub length_mode: LengthMode,
    /// How step pitch values become volts
    #[serde(default)]
    pub pitch_output: PitchOutput,
}

impl SequenceConfig {
    fn default_length() -> usize {
        8
    }

    /// Largest valid `length` for the configured mode.
    pub fn max_length(&self) -> usize {
        match self.length_mode {
            LengthMode::Steps => MAX_LENGTH,
            LengthMode::Beats => MAX_BEATS,
        }
    }

    /// Checks that the length fits the mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.max_length();
        if !(1..=max).contains(&self.length) {
            return Err(ConfigError::Length {
                length: self.length,
                max,
            });
        }
        Ok(())
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            length: Self::default_length(),
            length_mode: LengthMode::default(),
            pitch_output: PitchOutput::default(),
        }
    }
}

/// What happens once an evolution run has reached its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeevolutionMode {
    /// Substitutions are removed one per evolution, mirroring the growth
    #[default]
    PingPong,
    /// The whole mapping is cleared in one step
    Instant,
}

/// Evolution settings.
///
/// The plain default matches the classic evolving sequencer: growth and
/// decay follow a strict ping-pong between zero and `max_span`. The
/// [`EvolutionConfig::advanced`] preset additionally enables the weighted
/// direction curve, ephemeral mirrors and multi-step runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Ceiling on the evolution count
    #[serde(default)]
    pub max_span: usize,
    /// Cycle boundaries between mutations
    #[serde(default = "EvolutionConfig::default_cycles_per_evolution")]
    pub cycles_per_evolution: u32,
    /// Draw targets from the whole addressable range instead of the active length
    #[serde(default)]
    pub full_length: bool,
    /// Chance per cycle that durations are read from substituted steps
    #[serde(default)]
    pub duration_chance: f32,
    /// How decay proceeds
    #[serde(default)]
    pub deevolution: DeevolutionMode,
    /// Substitutions whose ratchet threshold falls below this ratchet
    #[serde(default)]
    pub ratchet_chance: f32,
    /// Master switch; turning evolution back on starts from a clean mapping
    #[serde(default = "EvolutionConfig::default_enabled")]
    pub enabled: bool,
    /// Draw each mutation's direction from the weighted growth/decay curve
    #[serde(default)]
    pub weighted_direction: bool,
    /// Per-position chance of an ephemeral mirror substitution each cycle
    #[serde(default)]
    pub mirror_chance: f32,
    /// Chance that a growth mutation extends into a run of adjacent positions
    #[serde(default)]
    pub run_chance: f32,
}

impl EvolutionConfig {
    fn default_cycles_per_evolution() -> u32 {
        1
    }
    fn default_enabled() -> bool {
        true
    }

    /// Preset for the pulse-clocked sequencer.
    pub fn advanced() -> Self {
        Self {
            max_span: 4,
            ratchet_chance: 0.25,
            weighted_direction: true,
            mirror_chance: 1.0 / 32.0,
            run_chance: 0.25,
            ..Self::default()
        }
    }

    /// Checks spans, cadence and probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_span > MAX_LENGTH {
            return Err(ConfigError::Span(self.max_span));
        }
        if !(1..=MAX_LENGTH as u32).contains(&self.cycles_per_evolution) {
            return Err(ConfigError::Cadence(self.cycles_per_evolution));
        }
        check_probability("duration_chance", self.duration_chance)?;
        check_probability("ratchet_chance", self.ratchet_chance)?;
        check_probability("mirror_chance", self.mirror_chance)?;
        check_probability("run_chance", self.run_chance)?;
        Ok(())
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_span: 0,
            cycles_per_evolution: Self::default_cycles_per_evolution(),
            full_length: false,
            duration_chance: 0.0,
            deevolution: DeevolutionMode::default(),
            ratchet_chance: 0.0,
            enabled: Self::default_enabled(),
            weighted_direction: false,
            mirror_chance: 0.0,
            run_chance: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::CvRange;

    #[test]
    fn test_defaults_validate() {
        assert!(SequenceConfig::default().validate().is_ok());
        assert!(EvolutionConfig::default().validate().is_ok());
        assert!(EvolutionConfig::advanced().validate().is_ok());
    }

    #[test]
    fn test_length_bounds_follow_mode() {
        let mut config = SequenceConfig {
            length: 0,
            ..SequenceConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Length { length: 0, max: 16 }));

        config.length = MAX_BEATS;
        assert!(config.validate().is_err());
        config.length_mode = LengthMode::Beats;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evolution_rejects_bad_values() {
        let span = EvolutionConfig {
            max_span: 17,
            ..EvolutionConfig::default()
        };
        assert_eq!(span.validate(), Err(ConfigError::Span(17)));

        let cadence = EvolutionConfig {
            cycles_per_evolution: 0,
            ..EvolutionConfig::default()
        };
        assert_eq!(cadence.validate(), Err(ConfigError::Cadence(0)));

        let chance = EvolutionConfig {
            ratchet_chance: 1.5,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            chance.validate(),
            Err(ConfigError::Probability { name: "ratchet_chance", .. })
        ));
    }

    #[test]
    fn test_partial_documents_use_defaults() {
        let config: SequenceConfig = serde_json::from_str(r#"{"length": 12}"#).unwrap();
        assert_eq!(config.length, 12);
        assert_eq!(config.length_mode, LengthMode::Steps);
        assert_eq!(config.pitch_output, PitchOutput::Range(CvRange::Bipolar3));

        let evolution: EvolutionConfig =
            serde_json::from_str(r#"{"max_span": 3, "deevolution": "instant"}"#).unwrap();
        assert_eq!(evolution.max_span, 3);
        assert_eq!(evolution.deevolution, DeevolutionMode::Instant);
        assert!(evolution.enabled);
        assert_eq!(evolution.cycles_per_evolution, 1);
    }

    #[test]
    fn test_round_trip() {
        let config = SequenceConfig {
            length: 20,
            length_mode: LengthMode::Beats,
            pitch_output: PitchOutput::Volts,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SequenceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
