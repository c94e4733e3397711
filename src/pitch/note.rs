//! Pitch names and the note-entry voltage grid.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Offset of the note-entry grid below 0 V.
pub const ROOT_OFFSET: f32 = 5.0 / 12.0;

/// Lowest note-entry pitch in volts.
pub const NOTE_CV_MIN: f32 = -ROOT_OFFSET;

/// Highest note-entry pitch in volts (three octaves above the minimum).
pub const NOTE_CV_MAX: f32 = 3.0 - ROOT_OFFSET;

/// Musical note names in the chromatic scale.
///
/// # Examples
///
/// ```
/// use evoseq::pitch::Pitch;
///
/// let pitch: Pitch = "Bb".parse().unwrap();
/// assert_eq!(pitch, Pitch::ASharp);
/// assert_eq!(Pitch::C.volts(4), 0.0);
/// assert_eq!(Pitch::C.volts(5), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pitch {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Pitch {
    /// Returns the semitone offset from C (0-11) for this note.
    pub fn semitone_offset(&self) -> u8 {
        match self {
            Pitch::C => 0,
            Pitch::CSharp => 1,
            Pitch::D => 2,
            Pitch::DSharp => 3,
            Pitch::E => 4,
            Pitch::F => 5,
            Pitch::FSharp => 6,
            Pitch::G => 7,
            Pitch::GSharp => 8,
            Pitch::A => 9,
            Pitch::ASharp => 10,
            Pitch::B => 11,
        }
    }

    /// Returns the 1V/oct voltage of this pitch in `octave`, with C4 at 0 V.
    pub fn volts(&self, octave: i8) -> f32 {
        (octave as i32 - 4) as f32 + self.semitone_offset() as f32 / 12.0
    }
}

impl FromStr for Pitch {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_uppercase();

        match s.as_str() {
            "C" | "B#" => Ok(Pitch::C),
            "C#" | "DB" => Ok(Pitch::CSharp),
            "D" => Ok(Pitch::D),
            "D#" | "EB" => Ok(Pitch::DSharp),
            "E" | "FB" => Ok(Pitch::E),
            "F" | "E#" => Ok(Pitch::F),
            "F#" | "GB" => Ok(Pitch::FSharp),
            "G" => Ok(Pitch::G),
            "G#" | "AB" => Ok(Pitch::GSharp),
            "A" => Ok(Pitch::A),
            "A#" | "BB" => Ok(Pitch::ASharp),
            "B" | "CB" => Ok(Pitch::B),
            _ => Err(ParseError::InvalidPitch(s)),
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pitch::C => "C",
            Pitch::CSharp => "C#",
            Pitch::D => "D",
            Pitch::DSharp => "D#",
            Pitch::E => "E",
            Pitch::F => "F",
            Pitch::FSharp => "F#",
            Pitch::G => "G",
            Pitch::GSharp => "G#",
            Pitch::A => "A",
            Pitch::ASharp => "A#",
            Pitch::B => "B",
        };
        f.write_str(name)
    }
}

/// Parses a note name such as `"F#3"` into 1V/oct volts.
///
/// The octave is optional and defaults to 4. This is the runtime
/// counterpart of the `cv!` macro.
///
/// # Examples
///
/// ```
/// use evoseq::pitch::parse_cv;
///
/// assert_eq!(parse_cv("C4").unwrap(), 0.0);
/// assert_eq!(parse_cv("C3").unwrap(), -1.0);
/// assert!(parse_cv("H2").is_err());
/// ```
pub fn parse_cv(s: &str) -> Result<f32, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Empty);
    }

    let octave_start = s
        .char_indices()
        .find(|(_, c)| c.is_numeric() || *c == '-')
        .map(|(i, _)| i);

    let (pitch_str, octave) = match octave_start {
        Some(0) => return Err(ParseError::InvalidPitch(String::new())),
        Some(pos) => {
            let octave_str = &s[pos..];
            let octave = octave_str
                .parse::<i8>()
                .map_err(|_| ParseError::InvalidOctave(octave_str.to_string()))?;
            if !(-1..=9).contains(&octave) {
                return Err(ParseError::InvalidOctave(octave_str.to_string()));
            }
            (&s[..pos], octave)
        }
        None => (s, 4),
    };

    Ok(pitch_str.parse::<Pitch>()?.volts(octave))
}

/// Snaps a voltage to the nearest semitone inside the note-entry range.
///
/// # Examples
///
/// ```
/// use evoseq::pitch::{NOTE_CV_MAX, quantize_cv};
///
/// assert_eq!(quantize_cv(0.26), 3.0 / 12.0);
/// assert_eq!(quantize_cv(10.0), NOTE_CV_MAX);
/// ```
pub fn quantize_cv(volts: f32) -> f32 {
    let semitones = (volts * 12.0).round();
    (semitones / 12.0).clamp(NOTE_CV_MIN, NOTE_CV_MAX)
}
