//! Editing access to note blocks.
//!
//! Each editor surface addresses note slots a little differently: the panel
//! preview follows whichever block has focus, the block grid addresses a
//! fixed slot, and menu entries snap values to the semitone grid. All of
//! them read and write through a [`NoteController`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pattern::{MAX_LENGTH, NoteBlock, NoteExtra, SLOTS_PER_BLOCK};
use crate::pitch::{NOTE_CV_MAX, NOTE_CV_MIN, quantize_cv};

/// The note blocks of a pulse sequencer and the block focused for editing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawNoteBank")]
pub struct NoteBank {
    blocks: [NoteBlock; MAX_LENGTH],
    focused: usize,
}

impl NoteBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[NoteBlock; MAX_LENGTH] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [NoteBlock; MAX_LENGTH] {
        &mut self.blocks
    }

    /// Returns a block, wrapping the index.
    pub fn block(&self, index: usize) -> &NoteBlock {
        &self.blocks[index % MAX_LENGTH]
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Moves editing focus to a block.
    pub fn focus(&mut self, block: usize) -> Result<(), ConfigError> {
        check_block(block)?;
        self.focused = block;
        Ok(())
    }

    fn block_mut(&mut self, index: usize) -> Result<&mut NoteBlock, ConfigError> {
        check_block(index)?;
        Ok(&mut self.blocks[index])
    }
}

#[derive(Deserialize)]
struct RawNoteBank {
    blocks: [NoteBlock; MAX_LENGTH],
    focused: usize,
}

impl TryFrom<RawNoteBank> for NoteBank {
    type Error = ConfigError;

    fn try_from(raw: RawNoteBank) -> Result<Self, Self::Error> {
        let mut bank = NoteBank {
            blocks: raw.blocks,
            focused: 0,
        };
        bank.focus(raw.focused)?;
        Ok(bank)
    }
}

/// Addresses one note slot for editing.
///
/// # Examples
///
/// ```
/// use evoseq::controller::{NoteBank, NoteController};
///
/// let mut bank = NoteBank::new();
/// bank.focus(2).unwrap();
///
/// let preview = NoteController::PanelPreview { slot: 1 };
/// preview.set_value(&mut bank, 0.5).unwrap();
/// assert_eq!(bank.block(2).slot(1).cv, 0.5);
///
/// let menu = NoteController::MenuProxy { block: 0, slot: 0 };
/// menu.set_value(&mut bank, 0.26).unwrap();
/// assert_eq!(menu.value(&bank), 3.0 / 12.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteController {
    /// A slot of whichever block has focus
    PanelPreview { slot: usize },
    /// A fixed slot of a fixed block
    BlockSlot { block: usize, slot: usize },
    /// A fixed slot edited through a menu, snapped to semitones
    MenuProxy { block: usize, slot: usize },
}

impl NoteController {
    fn address(&self, bank: &NoteBank) -> (usize, usize) {
        match *self {
            NoteController::PanelPreview { slot } => (bank.focused, slot),
            NoteController::BlockSlot { block, slot }
            | NoteController::MenuProxy { block, slot } => (block, slot),
        }
    }

    /// Returns the addressed slot's pitch in volts.
    pub fn value(&self, bank: &NoteBank) -> f32 {
        let (block, slot) = self.address(bank);
        bank.block(block).slot(slot).cv
    }

    /// Sets the addressed slot's pitch, clamped to the note-entry range.
    pub fn set_value(&self, bank: &mut NoteBank, value: f32) -> Result<(), ConfigError> {
        let (block, slot) = self.address(bank);
        let value = match self {
            NoteController::MenuProxy { .. } => quantize_cv(value),
            _ => value.clamp(NOTE_CV_MIN, NOTE_CV_MAX),
        };
        check_slot(slot)?;
        bank.block_mut(block)?.set_cv(slot, value)
    }

    pub fn extra(&self, bank: &NoteBank) -> NoteExtra {
        let (block, slot) = self.address(bank);
        bank.block(block).slot(slot).extra
    }

    /// Sets the addressed slot's modifier. Ties are only accepted on slot 0.
    pub fn set_extra(&self, bank: &mut NoteBank, extra: NoteExtra) -> Result<(), ConfigError> {
        let (block, slot) = self.address(bank);
        check_slot(slot)?;
        bank.block_mut(block)?.set_extra(slot, extra)
    }
}

fn check_block(block: usize) -> Result<(), ConfigError> {
    if block < MAX_LENGTH {
        Ok(())
    } else {
        Err(ConfigError::Index {
            index: block,
            len: MAX_LENGTH,
        })
    }
}

fn check_slot(slot: usize) -> Result<(), ConfigError> {
    if slot < SLOTS_PER_BLOCK {
        Ok(())
    } else {
        Err(ConfigError::Index {
            index: slot,
            len: SLOTS_PER_BLOCK,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_follows_focus() {
        let mut bank = NoteBank::new();
        let preview = NoteController::PanelPreview { slot: 0 };

        preview.set_value(&mut bank, 1.0).unwrap();
        bank.focus(5).unwrap();
        preview.set_value(&mut bank, 2.0).unwrap();

        assert_eq!(bank.block(0).slot(0).cv, 1.0);
        assert_eq!(bank.block(5).slot(0).cv, 2.0);
        assert_eq!(preview.value(&bank), 2.0);
    }

    #[test]
    fn test_block_slot_clamps_without_quantizing() {
        let mut bank = NoteBank::new();
        let controller = NoteController::BlockSlot { block: 3, slot: 2 };
        controller.set_value(&mut bank, 0.3).unwrap();
        assert_eq!(controller.value(&bank), 0.3);
        controller.set_value(&mut bank, 9.0).unwrap();
        assert_eq!(controller.value(&bank), NOTE_CV_MAX);
    }

    #[test]
    fn test_menu_proxy_snaps_to_semitones() {
        let mut bank = NoteBank::new();
        let controller = NoteController::MenuProxy { block: 1, slot: 3 };
        controller.set_value(&mut bank, 1.04).unwrap();
        assert_eq!(controller.value(&bank), 1.0);
        controller.set_value(&mut bank, -4.0).unwrap();
        assert_eq!(controller.value(&bank), NOTE_CV_MIN);
    }

    #[test]
    fn test_ties_only_on_first_slot() {
        let mut bank = NoteBank::new();
        let first = NoteController::BlockSlot { block: 1, slot: 0 };
        let second = NoteController::BlockSlot { block: 1, slot: 1 };

        first.set_extra(&mut bank, NoteExtra::Tie).unwrap();
        assert_eq!(first.extra(&bank), NoteExtra::Tie);
        assert_eq!(second.set_extra(&mut bank, NoteExtra::Tie), Err(ConfigError::Tie(1)));
        second.set_extra(&mut bank, NoteExtra::Mute).unwrap();
        assert_eq!(second.extra(&bank), NoteExtra::Mute);
    }

    #[test]
    fn test_out_of_range_addresses_rejected() {
        let mut bank = NoteBank::new();
        assert!(bank.focus(MAX_LENGTH).is_err());
        let controller = NoteController::BlockSlot { block: 0, slot: 4 };
        assert_eq!(
            controller.set_value(&mut bank, 0.0),
            Err(ConfigError::Index { index: 4, len: SLOTS_PER_BLOCK })
        );
        let controller = NoteController::MenuProxy { block: 16, slot: 0 };
        assert!(controller.set_extra(&mut bank, NoteExtra::Mute).is_err());
    }

    #[test]
    fn test_deserialize_checks_focus() {
        let mut bank = NoteBank::new();
        bank.focus(3).unwrap();
        let mut value = serde_json::to_value(bank).unwrap();
        let back: NoteBank = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, bank);

        value["focused"] = MAX_LENGTH.into();
        assert!(serde_json::from_value::<NoteBank>(value).is_err());
    }
}
