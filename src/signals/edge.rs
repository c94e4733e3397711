//! Schmitt-trigger edge detection with hysteresis.

/// Voltage at or above which a low input is considered high.
pub const HIGH_THRESHOLD: f32 = 1.0;

/// Voltage at or below which a high input is considered low.
pub const LOW_THRESHOLD: f32 = 0.1;

/// Updates `high` from `value` and reports a rising edge.
///
/// The stored state only flips to high once `value` reaches
/// [`HIGH_THRESHOLD`] and only flips back once it falls to
/// [`LOW_THRESHOLD`], so a signal hovering around the trigger voltage does
/// not chatter. Returns `true` exactly on the sample where the state goes
/// from low to high.
///
/// # Examples
///
/// ```
/// use evoseq::signals::schmitt_trigger;
///
/// let mut high = false;
/// assert!(!schmitt_trigger(&mut high, 0.5));
/// assert!(schmitt_trigger(&mut high, 5.0));
/// assert!(!schmitt_trigger(&mut high, 5.0)); // already high
/// assert!(!schmitt_trigger(&mut high, 0.5)); // inside the band, stays high
/// assert!(high);
/// ```
pub fn schmitt_trigger(high: &mut bool, value: f32) -> bool {
    if *high {
        if value <= LOW_THRESHOLD {
            *high = false;
        }
        false
    } else if value >= HIGH_THRESHOLD {
        *high = true;
        true
    } else {
        false
    }
}

/// A debounced edge detector for clock, reset and selector inputs.
///
/// Wraps the high/low state for [`schmitt_trigger`]. Clock and reset use the
/// returned rising edge; level inputs such as retrograde and inversion read
/// [`EdgeDetector::is_high`] after processing.
///
/// # Examples
///
/// ```
/// use evoseq::signals::EdgeDetector;
///
/// let mut clock = EdgeDetector::new();
/// let edges = [0.0, 10.0, 10.0, 0.0, 10.0]
///     .iter()
///     .filter(|&&v| clock.process(v))
///     .count();
/// assert_eq!(edges, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    high: bool,
}

impl EdgeDetector {
    /// Creates a detector in the low state.
    pub fn new() -> Self {
        Self { high: false }
    }

    /// Processes one control sample, returning `true` on a rising edge.
    pub fn process(&mut self, value: f32) -> bool {
        schmitt_trigger(&mut self.high, value)
    }

    /// Returns the debounced level.
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Forces the stored level, used when restoring persisted state.
    pub fn set_high(&mut self, high: bool) {
        self.high = high;
    }

    /// Returns the detector to the low state.
    pub fn reset(&mut self) {
        self.high = false;
    }
}
