//! Substitution mapping and ratchet thresholds.

use crate::pattern::{MAX_LENGTH, wrap_index};

/// Raw sentinel for "no substitution" in persisted or displayed mappings.
pub const NO_SUBSTITUTION: i32 = -1;

/// Per-position substitution targets.
///
/// Only the `EvolutionEngine` can change a mapping; other components get a
/// shared reference for playback and display.
///
/// # Examples
///
/// ```
/// use evoseq::evolution::{EvolutionMapping, NO_SUBSTITUTION};
///
/// let mapping = EvolutionMapping::new();
/// assert_eq!(mapping.get(3), None);
/// assert_eq!(mapping.substituted_count(), 0);
/// assert!(mapping.to_raw().iter().all(|&v| v == NO_SUBSTITUTION));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionMapping {
    entries: [Option<usize>; MAX_LENGTH],
}

impl EvolutionMapping {
    /// Creates a mapping with no substitutions.
    pub fn new() -> Self {
        Self {
            entries: [None; MAX_LENGTH],
        }
    }

    /// Returns the substitution at a position, wrapping the position.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.entries[index % MAX_LENGTH]
    }

    /// Returns `true` if the position has a substitution.
    pub fn is_substituted(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Returns the number of substituted positions.
    pub fn substituted_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Iterates all positions in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.entries.iter().copied()
    }

    /// Returns the mapping with [`NO_SUBSTITUTION`] for empty positions.
    pub fn to_raw(&self) -> [i32; MAX_LENGTH] {
        self.entries
            .map(|entry| entry.map_or(NO_SUBSTITUTION, |target| target as i32))
    }

    /// Rebuilds a mapping from its raw form; negative values are empty and
    /// targets are wrapped into the addressable range.
    pub fn from_raw(raw: &[i32; MAX_LENGTH]) -> Self {
        Self {
            entries: raw.map(|value| (value >= 0).then(|| wrap_index(value))),
        }
    }

    pub(super) fn set(&mut self, index: usize, target: usize) {
        self.entries[index % MAX_LENGTH] = Some(target % MAX_LENGTH);
    }

    pub(super) fn remove(&mut self, index: usize) {
        self.entries[index % MAX_LENGTH] = None;
    }

    pub(super) fn clear(&mut self) {
        self.entries = [None; MAX_LENGTH];
    }
}

impl Default for EvolutionMapping {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-position ratchet thresholds in `[0, 1)`.
///
/// A threshold is drawn when its position gains a substitution. During
/// playback the substituted step ratchets when its threshold is below the
/// configured ratchet chance, so raising the chance turns on more of the
/// existing substitutions rather than reshuffling them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatchetTable {
    thresholds: [f32; MAX_LENGTH],
}

impl RatchetTable {
    /// Creates a table where nothing ratchets.
    pub fn new() -> Self {
        Self {
            thresholds: [1.0; MAX_LENGTH],
        }
    }

    /// Returns the threshold at a position, wrapping the position.
    pub fn get(&self, index: usize) -> f32 {
        self.thresholds[index % MAX_LENGTH]
    }

    /// Returns `true` if the position ratchets at the given chance.
    pub fn ratchets(&self, index: usize, chance: f32) -> bool {
        self.get(index) < chance
    }

    pub(super) fn set(&mut self, index: usize, threshold: f32) {
        self.thresholds[index % MAX_LENGTH] = threshold;
    }

    pub(super) fn clear(&mut self) {
        self.thresholds = [1.0; MAX_LENGTH];
    }
}

impl Default for RatchetTable {
    fn default() -> Self {
        Self::new()
    }
}
