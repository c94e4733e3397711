//! Scale tables used by the randomizer.

use serde::{Deserialize, Serialize};

/// A scale mode, from major through blues.
///
/// Intervals are note numbers on the 1-based chromatic note-entry grid, so
/// `1` is the root and `12` the leading tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scale {
    #[default]
    Major,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Minor,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
}

impl Scale {
    /// All scales in table order.
    pub const ALL: [Scale; 12] = [
        Scale::Major,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Minor,
        Scale::Locrian,
        Scale::HarmonicMinor,
        Scale::MelodicMinor,
        Scale::MajorPentatonic,
        Scale::MinorPentatonic,
        Scale::Blues,
    ];

    /// Returns the scale's note numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use evoseq::pitch::Scale;
    ///
    /// assert_eq!(Scale::Major.intervals(), &[1, 3, 5, 6, 8, 10, 12]);
    /// assert_eq!(Scale::Blues.intervals().len(), 6);
    /// ```
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Scale::Major => &[1, 3, 5, 6, 8, 10, 12],
            Scale::Dorian => &[1, 3, 4, 6, 8, 10, 11],
            Scale::Phrygian => &[1, 2, 4, 6, 8, 9, 11],
            Scale::Lydian => &[1, 3, 5, 7, 8, 10, 12],
            Scale::Mixolydian => &[1, 3, 5, 6, 8, 10, 11],
            Scale::Minor => &[1, 3, 4, 6, 8, 9, 11],
            Scale::Locrian => &[1, 2, 4, 6, 7, 9, 11],
            Scale::HarmonicMinor => &[1, 3, 4, 6, 8, 9, 12],
            Scale::MelodicMinor => &[1, 3, 4, 6, 8, 10, 12],
            Scale::MajorPentatonic => &[1, 3, 5, 8, 10],
            Scale::MinorPentatonic => &[1, 4, 6, 8, 11],
            Scale::Blues => &[1, 4, 6, 7, 8, 11],
        }
    }
}
