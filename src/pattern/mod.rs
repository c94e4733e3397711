//! Sequence content: steps, note blocks and the subdivision resolver.
//!
//! Content is authored outside the timing core (panel edits, presets or the
//! `ScaleRandomizer`). The core only reads it, except for the evolution
//! mapping which lives in [`crate::evolution`].

mod block;
mod resolver;
mod step;

pub use block::{NoteBlock, NoteExtra, NoteSlot, SLOTS_PER_BLOCK, Subdivision};
pub use resolver::{NoteState, SlotPosition, SubdivisionResolver};
pub use step::{
    DEFAULT_DURATION, MAX_DURATION, MIN_DURATION, Step, count_steps, hold_length, is_muted,
};

/// Number of addressable steps or blocks in every sequence.
pub const MAX_LENGTH: usize = 16;

/// Wraps any (possibly negative) index into the addressable range.
///
/// # Examples
///
/// ```
/// use evoseq::pattern::{MAX_LENGTH, wrap_index};
///
/// assert_eq!(wrap_index(3), 3);
/// assert_eq!(wrap_index(MAX_LENGTH as i32 + 2), 2);
/// assert_eq!(wrap_index(-1), MAX_LENGTH - 1);
/// ```
pub fn wrap_index(index: i32) -> usize {
    index.rem_euclid(MAX_LENGTH as i32) as usize
}
