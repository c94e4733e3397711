//! Retrograde and inversion selection for the directional sequencer.

use crate::pattern::wrap_index;
use crate::signals::EdgeDetector;

/// Resolves the playing step under retrograde and inversion.
///
/// A retrograde counter runs backwards in lock-step with the forward step
/// counter. Both selector inputs are levels read every tick through a
/// Schmitt trigger, not edges.
///
/// # Examples
///
/// ```
/// use evoseq::sequencer::DirectionalSelector;
///
/// let mut selector = DirectionalSelector::new(4);
/// selector.on_step(false, 4);
/// assert_eq!(selector.retrograde_step(), 3);
///
/// selector.sample(5.0, 0.0);
/// assert_eq!(selector.select(0), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalSelector {
    retrograde_step: i32,
    retrograde: EdgeDetector,
    invert: EdgeDetector,
}

impl DirectionalSelector {
    /// Creates a selector for a cycle of `count` steps.
    pub fn new(count: usize) -> Self {
        Self {
            retrograde_step: count as i32,
            retrograde: EdgeDetector::new(),
            invert: EdgeDetector::new(),
        }
    }

    /// Rewinds the retrograde counter so the first step plays `count - 1`.
    pub fn reset(&mut self, count: usize) {
        self.retrograde_step = count as i32;
    }

    /// Follows the forward counter into a new step.
    pub fn on_step(&mut self, wrapped: bool, count: usize) {
        if wrapped {
            self.retrograde_step = count as i32 - 1;
        } else {
            self.retrograde_step -= 1;
        }
    }

    /// Reads the selector input levels for this tick.
    pub fn sample(&mut self, retrograde: f32, invert: f32) {
        self.retrograde.process(retrograde);
        self.invert.process(invert);
    }

    /// Returns the step to play for a forward position.
    pub fn select(&self, forward: usize) -> usize {
        if self.retrograde.is_high() {
            wrap_index(self.retrograde_step)
        } else {
            forward
        }
    }

    /// Reflects `cv` around `root` while inversion is enabled.
    pub fn invert(&self, cv: f32, root: f32) -> f32 {
        if self.invert.is_high() {
            root - (cv - root)
        } else {
            cv
        }
    }

    pub fn retrograde_step(&self) -> i32 {
        self.retrograde_step
    }

    pub fn is_retrograde(&self) -> bool {
        self.retrograde.is_high()
    }

    pub fn is_inverted(&self) -> bool {
        self.invert.is_high()
    }
}
