use rand::Rng;
use tracing::debug;

use super::mapping::{EvolutionMapping, RatchetTable};
use crate::config::{DeevolutionMode, EvolutionConfig};
use crate::pattern::MAX_LENGTH;

/// Longest run of extra adjacent substitutions a single growth can add.
pub const MAX_RUN: usize = 3;

/// What a cycle boundary did to the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// No mutation was due, or evolution is disabled
    Idle,
    /// A substitution was added at `index`, followed by `run` adjacent ones
    Grew {
        index: usize,
        target: usize,
        run: usize,
    },
    /// The substitution at `index` was removed
    Shrank { index: usize },
    /// The mapping and counters were wiped
    Cleared,
    /// The counter moved but no position was eligible
    Stalled { evolving_up: bool },
}

/// How a nominal step plays after substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Step whose pitch is played
    pub index: usize,
    /// Step whose duration is used
    pub duration_index: usize,
    /// `true` when `index` differs from the nominal step's own slot
    pub substituted: bool,
    /// `true` when the substituted step repeats without a new gate
    pub ratcheting: bool,
}

impl Resolution {
    fn identity(step: usize) -> Self {
        Self {
            index: step,
            duration_index: step,
            substituted: false,
            ratcheting: false,
        }
    }
}

/// Grows and shrinks the step substitution mapping once per cycle.
///
/// The engine is the only writer of its [`EvolutionMapping`] and
/// [`RatchetTable`]. Randomness is supplied by the caller on every
/// mutation, so a seeded generator gives a reproducible evolution.
///
/// # Examples
///
/// ```
/// use evoseq::config::EvolutionConfig;
/// use evoseq::evolution::{EvolutionEngine, Mutation};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let config = EvolutionConfig { max_span: 1, ..EvolutionConfig::default() };
/// let mut engine = EvolutionEngine::new();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let mutation = engine.on_cycle_boundary(&mut rng, &config, 4);
/// assert!(matches!(mutation, Mutation::Grew { .. }));
/// assert_eq!(engine.evolution_count(), 1);
/// assert_eq!(engine.mapping().substituted_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    mapping: EvolutionMapping,
    ratchets: RatchetTable,
    mirrors: [Option<usize>; MAX_LENGTH],
    cycles_to_evolve: u32,
    evolution_count: usize,
    evolving_up: bool,
    evolve_up_or_down_bias: bool,
    evolve_dur: bool,
}

impl EvolutionEngine {
    pub fn new() -> Self {
        Self {
            mapping: EvolutionMapping::new(),
            ratchets: RatchetTable::new(),
            mirrors: [None; MAX_LENGTH],
            cycles_to_evolve: 0,
            evolution_count: 0,
            evolving_up: true,
            evolve_up_or_down_bias: true,
            evolve_dur: false,
        }
    }

    /// Returns the engine to its initial state, clearing every substitution.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Runs the once-per-cycle evolution step.
    ///
    /// Draws this cycle's duration-evolution flag and ephemeral mirrors,
    /// counts down the cadence and, when it expires, applies one mutation.
    pub fn on_cycle_boundary<R: Rng>(
        &mut self,
        rng: &mut R,
        config: &EvolutionConfig,
        active_length: usize,
    ) -> Mutation {
        if !config.enabled {
            return Mutation::Idle;
        }
        let active = active_length.clamp(1, MAX_LENGTH);

        self.evolve_dur = chance(rng, config.duration_chance);
        self.sample_mirrors(rng, config.mirror_chance, active);

        if self.cycles_to_evolve > 1 {
            self.cycles_to_evolve -= 1;
            return Mutation::Idle;
        }
        self.cycles_to_evolve = config.cycles_per_evolution.max(1);

        let mutation = self.mutate(rng, config, active);
        if mutation != Mutation::Idle {
            debug!(
                target: "evoseq::evolution",
                ?mutation,
                count = self.evolution_count,
                evolving_up = self.evolving_up,
                "evolution step"
            );
        }
        mutation
    }

    fn mutate<R: Rng>(
        &mut self,
        rng: &mut R,
        config: &EvolutionConfig,
        active: usize,
    ) -> Mutation {
        let max_span = config.max_span.min(MAX_LENGTH);
        if max_span == 0 && self.evolution_count == 0 {
            return Mutation::Idle;
        }

        let grow = if config.weighted_direction {
            self.weighted_direction(rng, max_span)
        } else {
            if self.evolution_count >= max_span {
                self.evolving_up = false;
            } else if self.evolution_count == 0 {
                self.evolving_up = true;
            }
            self.evolving_up
        };

        if grow {
            self.grow(rng, config, active, max_span)
        } else {
            match config.deevolution {
                DeevolutionMode::Instant => {
                    self.clear_substitutions();
                    self.evolution_count = 0;
                    self.evolving_up = true;
                    self.evolve_up_or_down_bias = true;
                    Mutation::Cleared
                }
                DeevolutionMode::PingPong => self.shrink(rng, active),
            }
        }
    }

    /// Picks this mutation's direction from the growth curve.
    ///
    /// The bias flips only at the ends of the range. While biased upward
    /// growth has probability `1 - p^2 / 2`, while biased downward it has
    /// `(1 - p)^2 / 2`, with `p` the fraction of the span evolved.
    fn weighted_direction<R: Rng>(&mut self, rng: &mut R, max_span: usize) -> bool {
        if self.evolution_count >= max_span {
            self.evolve_up_or_down_bias = false;
        } else if self.evolution_count == 0 {
            self.evolve_up_or_down_bias = true;
        }

        let grow = if self.evolution_count >= max_span {
            false
        } else if self.evolution_count == 0 {
            true
        } else {
            let p = self.evolution_count as f32 / max_span as f32;
            let grow_chance = if self.evolve_up_or_down_bias {
                1.0 - 0.5 * p * p
            } else {
                0.5 * (1.0 - p) * (1.0 - p)
            };
            chance(rng, grow_chance)
        };
        self.evolving_up = grow;
        grow
    }

    fn grow<R: Rng>(
        &mut self,
        rng: &mut R,
        config: &EvolutionConfig,
        active: usize,
        max_span: usize,
    ) -> Mutation {
        self.evolution_count += 1;

        let eligible = (0..active)
            .filter(|&i| !self.mapping.is_substituted(i))
            .count();
        if eligible == 0 {
            return Mutation::Stalled { evolving_up: true };
        }
        let pick = rng.gen_range(0..eligible);
        let Some(index) = (0..active)
            .filter(|&i| !self.mapping.is_substituted(i))
            .nth(pick)
        else {
            return Mutation::Stalled { evolving_up: true };
        };

        let range = target_range(config, active);
        let target = rng.gen_range(0..range);
        self.substitute(rng, index, target);

        let mut run = 0;
        if config.run_chance > 0.0 && chance(rng, config.run_chance) {
            for k in 1..=MAX_RUN {
                let next = index + k;
                if next >= active
                    || self.mapping.is_substituted(next)
                    || self.evolution_count >= max_span
                {
                    break;
                }
                self.substitute(rng, next, (target + k) % range);
                self.evolution_count += 1;
                run += 1;
            }
        }

        Mutation::Grew { index, target, run }
    }

    fn shrink<R: Rng>(&mut self, rng: &mut R, active: usize) -> Mutation {
        self.evolution_count = self.evolution_count.saturating_sub(1);
        if self.evolution_count > active {
            return Mutation::Stalled { evolving_up: false };
        }

        let substituted = self.mapping.substituted_count();
        if substituted == 0 {
            return Mutation::Stalled { evolving_up: false };
        }
        let pick = rng.gen_range(0..substituted);
        let Some(index) = (0..MAX_LENGTH)
            .filter(|&i| self.mapping.is_substituted(i))
            .nth(pick)
        else {
            return Mutation::Stalled { evolving_up: false };
        };

        self.mapping.remove(index);
        self.ratchets.set(index, 1.0);
        Mutation::Shrank { index }
    }

    fn substitute<R: Rng>(&mut self, rng: &mut R, index: usize, target: usize) {
        self.mapping.set(index, target);
        self.ratchets.set(index, rng.gen_range(0.0..1.0));
    }

    fn sample_mirrors<R: Rng>(&mut self, rng: &mut R, mirror_chance: f32, active: usize) {
        self.mirrors = [None; MAX_LENGTH];
        if mirror_chance <= 0.0 {
            return;
        }
        for i in 0..active {
            if chance(rng, mirror_chance) {
                self.mirrors[i] = Some(active - 1 - i);
            }
        }
    }

    fn clear_substitutions(&mut self) {
        self.mapping.clear();
        self.ratchets.clear();
    }

    /// Resolves which step plays at a nominal position.
    ///
    /// Persistent substitutions take precedence over this cycle's mirrors.
    /// Targets are wrapped into the current target range, so mappings made
    /// under a longer active length stay addressable after it shrinks.
    pub fn resolve(&self, step: usize, active_length: usize, config: &EvolutionConfig) -> Resolution {
        let step = step % MAX_LENGTH;
        if !config.enabled {
            return Resolution::identity(step);
        }

        let range = target_range(config, active_length.clamp(1, MAX_LENGTH));
        let persistent = self.mapping.get(step);
        let Some(target) = persistent.or(self.mirrors[step]) else {
            return Resolution::identity(step);
        };

        let index = target % range;
        Resolution {
            index,
            duration_index: if self.evolve_dur { index } else { step },
            substituted: true,
            ratcheting: persistent.is_some()
                && self.ratchets.ratchets(step, config.ratchet_chance),
        }
    }

    pub fn mapping(&self) -> &EvolutionMapping {
        &self.mapping
    }

    pub fn ratchets(&self) -> &RatchetTable {
        &self.ratchets
    }

    /// Returns this cycle's mirror target at a position.
    pub fn mirror(&self, index: usize) -> Option<usize> {
        self.mirrors[index % MAX_LENGTH]
    }

    pub fn evolution_count(&self) -> usize {
        self.evolution_count
    }

    pub fn cycles_to_evolve(&self) -> u32 {
        self.cycles_to_evolve
    }

    pub fn is_evolving_up(&self) -> bool {
        self.evolving_up
    }

    pub fn bias_up(&self) -> bool {
        self.evolve_up_or_down_bias
    }

    /// Returns `true` when this cycle reads durations from substituted steps.
    pub fn evolve_dur(&self) -> bool {
        self.evolve_dur
    }

    /// Fraction of the configured span currently evolved, in `[0, 1]`.
    pub fn percent_evolved(&self, config: &EvolutionConfig) -> f32 {
        if config.max_span == 0 {
            return 0.0;
        }
        (self.evolution_count as f32 / config.max_span as f32).min(1.0)
    }
}

impl Default for EvolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn target_range(config: &EvolutionConfig, active: usize) -> usize {
    if config.full_length { MAX_LENGTH } else { active }
}

fn chance<R: Rng>(rng: &mut R, probability: f32) -> bool {
    rng.gen_range(0.0f32..1.0) < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(max_span: usize) -> EvolutionConfig {
        EvolutionConfig {
            max_span,
            ..EvolutionConfig::default()
        }
    }

    #[test]
    fn test_single_growth_after_one_boundary() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mutation = engine.on_cycle_boundary(&mut rng, &config(1), 4);

        let Mutation::Grew { index, target, run } = mutation else {
            panic!("expected growth, got {mutation:?}");
        };
        assert!(index < 4);
        assert!(target < 4);
        assert_eq!(run, 0);
        assert_eq!(engine.evolution_count(), 1);
        assert_eq!(engine.mapping().substituted_count(), 1);
        assert_eq!(engine.mapping().get(index), Some(target));
    }

    #[test]
    fn test_ping_pong_shrinks_back() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(2);
        let config = config(1);

        engine.on_cycle_boundary(&mut rng, &config, 4);
        let mutation = engine.on_cycle_boundary(&mut rng, &config, 4);
        assert!(matches!(mutation, Mutation::Shrank { .. }));
        assert_eq!(engine.evolution_count(), 0);
        assert_eq!(engine.mapping().substituted_count(), 0);
        assert!(!engine.is_evolving_up());

        let mutation = engine.on_cycle_boundary(&mut rng, &config, 4);
        assert!(matches!(mutation, Mutation::Grew { .. }));
        assert!(engine.is_evolving_up());
    }

    #[test]
    fn test_instant_deevolution_clears() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = EvolutionConfig {
            max_span: 2,
            deevolution: DeevolutionMode::Instant,
            ..EvolutionConfig::default()
        };

        engine.on_cycle_boundary(&mut rng, &config, 8);
        engine.on_cycle_boundary(&mut rng, &config, 8);
        assert_eq!(engine.mapping().substituted_count(), 2);

        assert_eq!(engine.on_cycle_boundary(&mut rng, &config, 8), Mutation::Cleared);
        assert_eq!(engine.evolution_count(), 0);
        assert_eq!(engine.mapping().substituted_count(), 0);
        assert!(engine.is_evolving_up());
    }

    #[test]
    fn test_cadence_counts_cycles() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(4);
        let config = EvolutionConfig {
            max_span: 8,
            cycles_per_evolution: 3,
            ..EvolutionConfig::default()
        };

        let mutations: Vec<_> = (0..4)
            .map(|_| engine.on_cycle_boundary(&mut rng, &config, 8))
            .collect();
        assert!(matches!(mutations[0], Mutation::Grew { .. }));
        assert_eq!(mutations[1], Mutation::Idle);
        assert_eq!(mutations[2], Mutation::Idle);
        assert!(matches!(mutations[3], Mutation::Grew { .. }));
        assert_eq!(engine.evolution_count(), 2);
    }

    #[test]
    fn test_zero_span_is_idle() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            assert_eq!(engine.on_cycle_boundary(&mut rng, &config(0), 8), Mutation::Idle);
        }
        assert_eq!(engine.evolution_count(), 0);
    }

    #[test]
    fn test_growth_stays_inside_active_length() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(6);
        let config = config(16);

        for _ in 0..64 {
            engine.on_cycle_boundary(&mut rng, &config, 5);
            for (position, entry) in engine.mapping().iter().enumerate() {
                if let Some(target) = entry {
                    assert!(position < 5);
                    assert!(target < 5);
                }
            }
            assert!(engine.evolution_count() <= 16);
        }
    }

    #[test]
    fn test_full_length_targets() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(8);
        let config = EvolutionConfig {
            max_span: 4,
            full_length: true,
            ..EvolutionConfig::default()
        };
        for _ in 0..32 {
            engine.on_cycle_boundary(&mut rng, &config, 4);
            assert!(engine.mapping().iter().flatten().all(|t| t < MAX_LENGTH));
        }
    }

    #[test]
    fn test_growth_with_no_eligible_position_stalls() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(9);
        let config = config(3);

        engine.on_cycle_boundary(&mut rng, &config, 1);
        assert_eq!(engine.mapping().substituted_count(), 1);
        assert_eq!(
            engine.on_cycle_boundary(&mut rng, &config, 1),
            Mutation::Stalled { evolving_up: true }
        );
        assert_eq!(engine.evolution_count(), 2);
    }

    #[test]
    fn test_resolve_without_substitution_is_identity() {
        let engine = EvolutionEngine::new();
        let resolution = engine.resolve(3, 8, &config(4));
        assert_eq!(resolution, Resolution::identity(3));
    }

    #[test]
    fn test_resolve_wraps_stale_targets() {
        let mut engine = EvolutionEngine::new();
        engine.mapping.set(1, 7);
        let resolution = engine.resolve(1, 4, &config(4));
        assert_eq!(resolution.index, 3);
        assert!(resolution.substituted);
        assert_eq!(resolution.duration_index, 1);
    }

    #[test]
    fn test_ratcheting_follows_threshold() {
        let mut engine = EvolutionEngine::new();
        engine.mapping.set(2, 0);
        engine.ratchets.set(2, 0.2);

        let mut config = config(4);
        config.ratchet_chance = 0.1;
        assert!(!engine.resolve(2, 4, &config).ratcheting);
        config.ratchet_chance = 0.5;
        assert!(engine.resolve(2, 4, &config).ratcheting);
        assert!(!engine.resolve(3, 4, &config).ratcheting);
    }

    #[test]
    fn test_disabled_engine_plays_nominal_steps() {
        let mut engine = EvolutionEngine::new();
        engine.mapping.set(0, 3);
        let mut rng = StdRng::seed_from_u64(10);
        let config = EvolutionConfig {
            max_span: 4,
            enabled: false,
            ..EvolutionConfig::default()
        };
        assert_eq!(engine.on_cycle_boundary(&mut rng, &config, 4), Mutation::Idle);
        assert_eq!(engine.resolve(0, 4, &config).index, 0);
    }

    #[test]
    fn test_mirrors_reflect_without_counting() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(11);
        let config = EvolutionConfig {
            mirror_chance: 1.0,
            ..EvolutionConfig::default()
        };

        engine.on_cycle_boundary(&mut rng, &config, 4);
        assert_eq!(engine.mirror(0), Some(3));
        assert_eq!(engine.mirror(3), Some(0));
        assert_eq!(engine.mirror(4), None);
        assert_eq!(engine.evolution_count(), 0);

        let resolution = engine.resolve(1, 4, &config);
        assert_eq!(resolution.index, 2);
        assert!(!resolution.ratcheting);
    }

    #[test]
    fn test_runs_extend_contiguously() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(12);
        let config = EvolutionConfig {
            max_span: 16,
            run_chance: 1.0,
            ..EvolutionConfig::default()
        };

        let Mutation::Grew { index, target, run } = engine.on_cycle_boundary(&mut rng, &config, 16)
        else {
            panic!("expected growth");
        };
        assert!(run <= MAX_RUN);
        assert_eq!(engine.evolution_count(), 1 + run);
        assert_eq!(engine.mapping().substituted_count(), 1 + run);
        for k in 1..=run {
            assert_eq!(engine.mapping().get(index + k), Some((target + k) % 16));
        }
    }

    #[test]
    fn test_weighted_direction_stays_in_span() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(13);
        let config = EvolutionConfig::advanced();

        for _ in 0..200 {
            engine.on_cycle_boundary(&mut rng, &config, 8);
            assert!(engine.evolution_count() <= config.max_span);
            assert!(engine.mapping().substituted_count() <= engine.evolution_count());
            assert!((0.0..=1.0).contains(&engine.percent_evolved(&config)));
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = EvolutionEngine::new();
        let mut rng = StdRng::seed_from_u64(14);
        engine.on_cycle_boundary(&mut rng, &config(4), 8);
        engine.reset();
        assert_eq!(engine.mapping().substituted_count(), 0);
        assert_eq!(engine.evolution_count(), 0);
        assert_eq!(engine.cycles_to_evolve(), 0);
        assert!(!engine.evolve_dur());
    }
}
