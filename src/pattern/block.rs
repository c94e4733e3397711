//! Note blocks for the pulse-clocked sequencer.
//!
//! A block is one quarter note long and holds up to four note slots laid out
//! by a `Subdivision` pattern.

use serde::{Deserialize, Serialize};

use crate::clock::PPQN;
use crate::error::ConfigError;

/// Number of note slots in every block.
pub const SLOTS_PER_BLOCK: usize = 4;

/// Rhythmic layout of the notes inside a block.
///
/// "Quarter" and "half" in the three-note names refer to fractions of the
/// block, so `ShortShortLong` is two sixteenths followed by an eighth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Subdivision {
    /// One note filling the block
    #[default]
    One = 1,
    /// Two equal notes
    Two = 2,
    /// Quarter, quarter, half
    ShortShortLong = 3,
    /// Quarter, half, quarter
    ShortLongShort = 4,
    /// Half, quarter, quarter
    LongShortShort = 5,
    /// Three equal notes
    Triplets = 6,
    /// Four equal notes
    Four = 7,
}

impl Subdivision {
    /// All subdivisions in code order.
    pub const ALL: [Subdivision; 7] = [
        Subdivision::One,
        Subdivision::Two,
        Subdivision::ShortShortLong,
        Subdivision::ShortLongShort,
        Subdivision::LongShortShort,
        Subdivision::Triplets,
        Subdivision::Four,
    ];

    /// Returns the pulse offset of every note onset within the block.
    ///
    /// # Examples
    ///
    /// ```
    /// use evoseq::pattern::Subdivision;
    ///
    /// assert_eq!(Subdivision::Two.onsets(), &[0, 12]);
    /// assert_eq!(Subdivision::Triplets.onsets(), &[0, 8, 16]);
    /// ```
    pub fn onsets(&self) -> &'static [usize] {
        match self {
            Subdivision::One => &[0],
            Subdivision::Two => &[0, 12],
            Subdivision::ShortShortLong => &[0, 6, 12],
            Subdivision::ShortLongShort => &[0, 6, 18],
            Subdivision::LongShortShort => &[0, 12, 18],
            Subdivision::Triplets => &[0, 8, 16],
            Subdivision::Four => &[0, 6, 12, 18],
        }
    }

    /// Returns the number of notes in the block.
    pub fn note_count(&self) -> usize {
        self.onsets().len()
    }

    /// Returns the `(start, end)` pulse window of a slot, or `None` if the
    /// layout has fewer notes.
    pub fn window(&self, slot: usize) -> Option<(usize, usize)> {
        let onsets = self.onsets();
        let start = *onsets.get(slot)?;
        let end = onsets.get(slot + 1).copied().unwrap_or(PPQN);
        Some((start, end))
    }

    /// Returns the panel label for the subdivision.
    pub fn label(&self) -> &'static str {
        match self {
            Subdivision::One => "One",
            Subdivision::Two => "Two",
            Subdivision::ShortShortLong => "Three (QQ-H)",
            Subdivision::ShortLongShort => "Three (Q-H-Q)",
            Subdivision::LongShortShort => "Three (H-QQ)",
            Subdivision::Triplets => "Triplets",
            Subdivision::Four => "Four",
        }
    }
}

impl TryFrom<u8> for Subdivision {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1..=7 => Ok(Self::ALL[code as usize - 1]),
            _ => Err(ConfigError::Subdivision(code)),
        }
    }
}

impl From<Subdivision> for u8 {
    fn from(subdivision: Subdivision) -> Self {
        subdivision as u8
    }
}

/// Per-note modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteExtra {
    /// Plays normally
    #[default]
    None,
    /// Advances pitch but produces no gate
    Mute,
    /// Keeps the previous pitch and gate, starts no new note
    Tie,
}

/// One note inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteSlot {
    /// Pitch in volts
    pub cv: f32,
    /// Modifier applied at the note's onset
    pub extra: NoteExtra,
}

/// One quarter note of content: a subdivision and four note slots.
///
/// Only slot 0 may carry [`NoteExtra::Tie`], which ties across the boundary
/// from the previous block.
///
/// # Examples
///
/// ```
/// use evoseq::pattern::{NoteBlock, NoteExtra, Subdivision};
///
/// let mut block = NoteBlock::new(Subdivision::Two);
/// block.set_cv(1, 0.5).unwrap();
/// block.set_extra(0, NoteExtra::Tie).unwrap();
/// assert!(block.set_extra(1, NoteExtra::Tie).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawNoteBlock")]
pub struct NoteBlock {
    /// Rhythmic layout
    pub subdivision: Subdivision,
    slots: [NoteSlot; SLOTS_PER_BLOCK],
}

impl NoteBlock {
    /// Creates a block with silent-pitch (0 V) slots and no modifiers.
    pub fn new(subdivision: Subdivision) -> Self {
        Self {
            subdivision,
            slots: [NoteSlot::default(); SLOTS_PER_BLOCK],
        }
    }

    /// Returns all four slots, including those the subdivision does not play.
    pub fn slots(&self) -> &[NoteSlot; SLOTS_PER_BLOCK] {
        &self.slots
    }

    /// Returns one slot, wrapping the index into the block.
    pub fn slot(&self, slot: usize) -> &NoteSlot {
        &self.slots[slot % SLOTS_PER_BLOCK]
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [NoteSlot; SLOTS_PER_BLOCK] {
        &mut self.slots
    }

    /// Sets the pitch of a slot.
    pub fn set_cv(&mut self, slot: usize, cv: f32) -> Result<(), ConfigError> {
        let target = self.slots.get_mut(slot).ok_or(ConfigError::Index {
            index: slot,
            len: SLOTS_PER_BLOCK,
        })?;
        target.cv = cv;
        Ok(())
    }

    /// Sets the modifier of a slot, rejecting ties past slot 0.
    pub fn set_extra(&mut self, slot: usize, extra: NoteExtra) -> Result<(), ConfigError> {
        if extra == NoteExtra::Tie && slot != 0 {
            return Err(ConfigError::Tie(slot));
        }
        let target = self.slots.get_mut(slot).ok_or(ConfigError::Index {
            index: slot,
            len: SLOTS_PER_BLOCK,
        })?;
        target.extra = extra;
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawNoteBlock {
    subdivision: Subdivision,
    slots: [NoteSlot; SLOTS_PER_BLOCK],
}

impl TryFrom<RawNoteBlock> for NoteBlock {
    type Error = ConfigError;

    fn try_from(raw: RawNoteBlock) -> Result<Self, Self::Error> {
        let mut block = NoteBlock::new(raw.subdivision);
        for (slot, note) in raw.slots.iter().enumerate() {
            block.set_cv(slot, note.cv)?;
            block.set_extra(slot, note.extra)?;
        }
        Ok(block)
    }
}
