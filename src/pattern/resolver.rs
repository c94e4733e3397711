//! Resolves pulse positions to sounding notes inside a block.

use super::block::{NoteBlock, NoteExtra, Subdivision};
use crate::clock::PPQN;

/// Where a pulse falls inside a block's subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    /// Index of the note slot whose window contains the pulse
    pub slot: usize,
    /// `true` if the pulse is the first pulse of that window
    pub onset: bool,
    /// Pulses left in the window, counting this one
    pub remaining: usize,
}

/// The note the resolver reports after a pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteState {
    /// Pitch to output in volts
    pub cv: f32,
    /// Slot whose window contains the pulse
    pub slot: usize,
    /// `true` while a gated note is sounding
    pub sounding: bool,
    /// `true` on the pulse where a new gated note starts
    pub retrigger: bool,
    /// The slot at this onset is a tie
    pub tie: bool,
    /// The slot at this onset is muted
    pub mute: bool,
}

/// Tracks the sounding note across pulses and blocks.
///
/// The resolver keeps the last pitch and gate state so that ties can extend
/// the previous block's final note and mutes can move the pitch without
/// opening the gate.
///
/// # Examples
///
/// ```
/// use evoseq::pattern::{NoteBlock, NoteExtra, Subdivision, SubdivisionResolver};
///
/// let mut first = NoteBlock::new(Subdivision::One);
/// first.set_cv(0, 0.25).unwrap();
/// let mut second = NoteBlock::new(Subdivision::Two);
/// second.set_cv(0, 0.75).unwrap();
/// second.set_extra(0, NoteExtra::Tie).unwrap();
///
/// let mut resolver = SubdivisionResolver::new();
/// assert!(resolver.on_pulse(&first, 0, false).retrigger);
///
/// let tied = resolver.on_pulse(&second, 0, false);
/// assert_eq!(tied.cv, 0.25);
/// assert!(!tied.retrigger);
/// assert!(tied.sounding);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubdivisionResolver {
    cv: f32,
    sounding: bool,
}

impl SubdivisionResolver {
    /// Creates a silent resolver at 0 V.
    pub fn new() -> Self {
        Self {
            cv: 0.0,
            sounding: false,
        }
    }

    /// Finds the slot whose window contains `pulse_in_block`.
    ///
    /// Pulses past the end of the block are wrapped into it.
    ///
    /// # Examples
    ///
    /// ```
    /// use evoseq::pattern::{Subdivision, SubdivisionResolver};
    ///
    /// let position = SubdivisionResolver::locate(Subdivision::ShortLongShort, 10);
    /// assert_eq!(position.slot, 1);
    /// assert!(!position.onset);
    /// assert_eq!(position.remaining, 8);
    /// ```
    pub fn locate(subdivision: Subdivision, pulse_in_block: usize) -> SlotPosition {
        let pulse = pulse_in_block % PPQN;
        let onsets = subdivision.onsets();
        let slot = onsets.iter().rposition(|&onset| onset <= pulse).unwrap_or(0);
        let end = onsets.get(slot + 1).copied().unwrap_or(PPQN);
        SlotPosition {
            slot,
            onset: onsets[slot] == pulse,
            remaining: end - pulse,
        }
    }

    /// Applies one pulse of `block` and returns the resulting note state.
    ///
    /// At an onset, a tie keeps the previous pitch and gate, a mute takes the
    /// new pitch with the gate closed, and a plain note takes the new pitch
    /// and opens the gate. With `legato` set, plain notes that follow a
    /// sounding note change pitch without reporting a retrigger.
    pub fn on_pulse(&mut self, block: &NoteBlock, pulse_in_block: usize, legato: bool) -> NoteState {
        let position = Self::locate(block.subdivision, pulse_in_block);
        let slot = block.slot(position.slot);
        let mut state = NoteState {
            cv: self.cv,
            slot: position.slot,
            sounding: self.sounding,
            retrigger: false,
            tie: false,
            mute: false,
        };

        if !position.onset {
            return state;
        }

        match slot.extra {
            NoteExtra::Tie => {
                state.tie = true;
            }
            NoteExtra::Mute => {
                self.cv = slot.cv;
                self.sounding = false;
                state.mute = true;
            }
            NoteExtra::None => {
                state.retrigger = !(legato && self.sounding);
                self.cv = slot.cv;
                self.sounding = true;
            }
        }

        state.cv = self.cv;
        state.sounding = self.sounding;
        state
    }

    /// Returns the last resolved pitch.
    pub fn cv(&self) -> f32 {
        self.cv
    }

    /// Returns `true` while a gated note is sounding.
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    /// Silences the resolver, keeping the last pitch.
    pub fn reset(&mut self) {
        self.sounding = false;
    }
}

impl Default for SubdivisionResolver {
    fn default() -> Self {
        Self::new()
    }
}
