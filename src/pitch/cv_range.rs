//! Output voltage ranges for unit-valued pitch content.

use serde::{Deserialize, Serialize};

/// Voltage range a unit pitch value in `[0, 1]` is mapped onto.
///
/// # Examples
///
/// ```
/// use evoseq::pitch::CvRange;
///
/// assert_eq!(CvRange::Bipolar3.map(0.5), 0.0);
/// assert_eq!(CvRange::Unipolar5.map(1.0), 5.0);
/// assert_eq!(CvRange::Bipolar10.unmap(10.0), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CvRange {
    Bipolar10,
    Bipolar5,
    #[default]
    Bipolar3,
    Bipolar1,
    Unipolar10,
    Unipolar5,
    Unipolar3,
    Unipolar1,
}

impl CvRange {
    /// All ranges in menu order.
    pub const ALL: [CvRange; 8] = [
        CvRange::Bipolar10,
        CvRange::Bipolar5,
        CvRange::Bipolar3,
        CvRange::Bipolar1,
        CvRange::Unipolar10,
        CvRange::Unipolar5,
        CvRange::Unipolar3,
        CvRange::Unipolar1,
    ];

    /// Returns `(low, high)` output voltages.
    pub fn bounds(&self) -> (f32, f32) {
        match self {
            CvRange::Bipolar10 => (-10.0, 10.0),
            CvRange::Bipolar5 => (-5.0, 5.0),
            CvRange::Bipolar3 => (-3.0, 3.0),
            CvRange::Bipolar1 => (-1.0, 1.0),
            CvRange::Unipolar10 => (0.0, 10.0),
            CvRange::Unipolar5 => (0.0, 5.0),
            CvRange::Unipolar3 => (0.0, 3.0),
            CvRange::Unipolar1 => (0.0, 1.0),
        }
    }

    /// Maps a unit value to volts.
    pub fn map(&self, unit: f32) -> f32 {
        let (low, high) = self.bounds();
        low + unit * (high - low)
    }

    /// Maps volts back to a unit value; the exact inverse of [`CvRange::map`].
    pub fn unmap(&self, volts: f32) -> f32 {
        let (low, high) = self.bounds();
        (volts - low) / (high - low)
    }

    /// Returns the menu label.
    pub fn label(&self) -> &'static str {
        match self {
            CvRange::Bipolar10 => "+/-10V",
            CvRange::Bipolar5 => "+/-5V",
            CvRange::Bipolar3 => "+/-3V",
            CvRange::Bipolar1 => "+/-1V",
            CvRange::Unipolar10 => "0V-10V",
            CvRange::Unipolar5 => "0V-5V",
            CvRange::Unipolar3 => "0V-3V",
            CvRange::Unipolar1 => "0V-1V",
        }
    }
}

/// How step pitch values become output volts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PitchOutput {
    /// Step values are unit values mapped through a range
    Range(CvRange),
    /// Step values are already volts
    Volts,
}

impl PitchOutput {
    /// Converts a stored step value to output volts.
    pub fn to_volts(&self, value: f32) -> f32 {
        match self {
            PitchOutput::Range(range) => range.map(value),
            PitchOutput::Volts => value,
        }
    }
}

impl Default for PitchOutput {
    fn default() -> Self {
        PitchOutput::Range(CvRange::default())
    }
}
