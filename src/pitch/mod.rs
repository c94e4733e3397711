//! Pitch handling: note names, output voltage ranges and scale tables.

mod cv_range;
mod note;
mod scales;

pub use cv_range::{CvRange, PitchOutput};
pub use note::{NOTE_CV_MAX, NOTE_CV_MIN, Pitch, ROOT_OFFSET, parse_cv, quantize_cv};
pub use scales::Scale;
