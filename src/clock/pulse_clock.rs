//! Self-measuring pulse clock.
//!
//! The incoming clock is treated as a quarter-note clock of unknown tempo.
//! The `PulseClock` counts process ticks between rising edges and splits
//! each measured period into `PPQN` pulses, so note blocks can place
//! sixteenths and triplets without assuming a host tempo.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::PPQN;
use super::record::Record;
use crate::error::RecordError;
use crate::pattern::MAX_LENGTH;

// One past the last pulse of the longest cycle
const MAX_PULSES: i64 = (MAX_LENGTH * PPQN) as i64;

/// A pulse fired by the `PulseClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// Absolute pulse within the cycle, in `0..length * PPQN`
    pub pulse: usize,
    /// `true` when this pulse starts a new cycle
    pub wrapped: bool,
}

impl PulseEvent {
    /// Block the pulse falls in.
    pub fn block(&self) -> usize {
        self.pulse / PPQN
    }

    /// Pulse offset inside its block.
    pub fn pulse_in_block(&self) -> usize {
        self.pulse % PPQN
    }
}

/// Persisted snapshot of a `PulseClock` plus the clock input level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseClockState {
    pub clock_counter: u64,
    pub clock_length: u64,
    pub current_pulse: i64,
    pub pulse_counter: u64,
    pub clock_high: bool,
}

impl PulseClockState {
    const CLOCK_COUNTER: &'static str = "clockCounter";
    const CLOCK_LENGTH: &'static str = "clockLength";
    const CURRENT_PULSE: &'static str = "currentPulse";
    const PULSE_COUNTER: &'static str = "pulseCounter";
    const CLOCK_HIGH: &'static str = "clockHigh";

    /// Writes the snapshot as a flat record.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.set_int(Self::CLOCK_COUNTER, self.clock_counter as i64);
        record.set_int(Self::CLOCK_LENGTH, self.clock_length as i64);
        record.set_int(Self::CURRENT_PULSE, self.current_pulse);
        record.set_int(Self::PULSE_COUNTER, self.pulse_counter as i64);
        record.set_bool(Self::CLOCK_HIGH, self.clock_high);
        record
    }

    /// Reads a snapshot back from a flat record.
    ///
    /// # Examples
    ///
    /// ```
    /// use evoseq::clock::PulseClockState;
    ///
    /// let state = PulseClockState {
    ///     clock_counter: 12,
    ///     clock_length: 480,
    ///     current_pulse: 30,
    ///     pulse_counter: 7,
    ///     clock_high: true,
    /// };
    /// let restored = PulseClockState::from_record(&state.to_record()).unwrap();
    /// assert_eq!(restored, state);
    /// ```
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            clock_counter: unsigned(record, Self::CLOCK_COUNTER)?,
            clock_length: unsigned(record, Self::CLOCK_LENGTH)?,
            current_pulse: pulse_index(record, Self::CURRENT_PULSE)?,
            pulse_counter: unsigned(record, Self::PULSE_COUNTER)?,
            clock_high: record.bool(Self::CLOCK_HIGH)?,
        })
    }
}

fn pulse_index(record: &Record, key: &'static str) -> Result<i64, RecordError> {
    let value = record.int(key)?;
    if value >= MAX_PULSES {
        return Err(RecordError::Range { key, value });
    }
    Ok(value.max(-1))
}

fn unsigned(record: &Record, key: &'static str) -> Result<u64, RecordError> {
    let value = record.int(key)?;
    u64::try_from(value).map_err(|_| RecordError::Range { key, value })
}

/// Measures the clock period and emits `PPQN` pulses per clock edge.
///
/// The first rising edge after creation only seeds the measurement. From
/// the second edge on, `clock_length` holds the last measured period in
/// ticks, every edge starts the next block at a block boundary, and the
/// ticks in between are divided into evenly spaced pulses. If the clock
/// speeds up, the pulses left in the block are skipped; if it slows down,
/// the last pulse of the block waits for the edge. While no period has been
/// measured, the clock stays quiet.
///
/// # Examples
///
/// ```
/// use evoseq::clock::{PPQN, PulseClock};
///
/// let mut clock = PulseClock::new();
/// let period = 96;
/// let mut pulses = 0;
/// for tick in 0..period * 3 {
///     if clock.tick(tick % period == 0, 4).is_some() {
///         pulses += 1;
///     }
/// }
/// assert_eq!(clock.clock_length(), period as u64);
/// // First period only measures; the next two produce a full block each
/// assert_eq!(pulses, 2 * PPQN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseClock {
    /// Ticks since the last rising edge
    clock_counter: u64,
    /// Measured ticks per quarter note, 0 until measured
    clock_length: u64,
    /// Current pulse in the cycle, -1 before the first pulse
    current_pulse: i64,
    /// Ticks until the next pulse
    pulse_counter: u64,
    /// Whether a rising edge has been seen since creation
    has_had_first_clock_high: bool,
}

impl PulseClock {
    /// Creates an unmeasured clock.
    pub fn new() -> Self {
        Self {
            clock_counter: 0,
            clock_length: 0,
            current_pulse: -1,
            pulse_counter: 0,
            has_had_first_clock_high: false,
        }
    }

    /// Rewinds to before the first pulse, keeping the measured period.
    pub fn reset(&mut self) {
        self.current_pulse = -1;
        self.pulse_counter = 0;
    }

    /// Forgets the measurement as well, back to the just-created state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Advances by one process tick.
    ///
    /// `clock_edge` is the rising edge reported by the clock input's edge
    /// detector for this tick. Returns the pulse fired on this tick, if any.
    pub fn tick(&mut self, clock_edge: bool, active_length: usize) -> Option<PulseEvent> {
        self.clock_counter = self.clock_counter.saturating_add(1);
        let total = (active_length.max(1) * PPQN) as i64;

        if clock_edge {
            if self.has_had_first_clock_high {
                if self.clock_counter != self.clock_length {
                    debug!(
                        target: "evoseq::clock",
                        previous = self.clock_length,
                        measured = self.clock_counter,
                        "clock period measured"
                    );
                }
                self.clock_length = self.clock_counter;
            }
            self.has_had_first_clock_high = true;
            self.clock_counter = 0;

            if self.clock_length == 0 {
                return None;
            }

            let started = self.current_pulse >= 0;
            let next = if started {
                (self.current_pulse / PPQN as i64 + 1) * PPQN as i64
            } else {
                0
            };
            let wrapped = started && next >= total;
            self.current_pulse = if next >= total { 0 } else { next };
            self.pulse_counter = self.pulse_span(0);
            return Some(self.event(wrapped));
        }

        if self.clock_length == 0 || self.current_pulse < 0 {
            return None;
        }

        let in_block = (self.current_pulse % PPQN as i64) as usize;
        if in_block + 1 >= PPQN {
            return None;
        }

        self.pulse_counter = self.pulse_counter.saturating_sub(1);
        if self.pulse_counter > 0 {
            return None;
        }

        self.current_pulse = (self.current_pulse + 1) % total;
        self.pulse_counter = self.pulse_span(in_block + 1);
        Some(self.event(false))
    }

    /// Ticks between pulse `k` and pulse `k + 1` of a block.
    ///
    /// Spans are derived from integer boundaries `k * clock_length / PPQN`,
    /// so a block always totals the measured period.
    fn pulse_span(&self, k: usize) -> u64 {
        let k = k as u128;
        let length = u128::from(self.clock_length);
        let ppqn = PPQN as u128;
        let start = k * length / ppqn;
        let end = (k + 1) * length / ppqn;
        // A span never exceeds the period, so it fits back into u64
        u64::try_from(end - start).unwrap_or(u64::MAX).max(1)
    }

    fn event(&self, wrapped: bool) -> PulseEvent {
        let event = PulseEvent {
            pulse: self.current_pulse as usize,
            wrapped,
        };
        trace!(target: "evoseq::clock", pulse = event.pulse, wrapped, "pulse");
        event
    }

    /// Returns the last measured period in ticks, 0 if unmeasured.
    pub fn clock_length(&self) -> u64 {
        self.clock_length
    }

    /// Returns the ticks counted since the last rising edge.
    pub fn clock_counter(&self) -> u64 {
        self.clock_counter
    }

    /// Returns the current pulse, or -1 before the first pulse.
    pub fn current_pulse(&self) -> i64 {
        self.current_pulse
    }

    /// Returns the ticks left until the next pulse.
    pub fn pulse_counter(&self) -> u64 {
        self.pulse_counter
    }

    /// Returns `true` once a period has been measured.
    pub fn is_measured(&self) -> bool {
        self.clock_length > 0
    }

    /// Captures the persisted snapshot.
    pub fn state(&self, clock_high: bool) -> PulseClockState {
        PulseClockState {
            clock_counter: self.clock_counter,
            clock_length: self.clock_length,
            current_pulse: self.current_pulse,
            pulse_counter: self.pulse_counter,
            clock_high,
        }
    }

    /// Restores from a persisted snapshot.
    ///
    /// A restored non-zero period counts as having seen the first edge.
    pub fn restore(&mut self, state: &PulseClockState) {
        self.clock_counter = state.clock_counter;
        self.clock_length = state.clock_length;
        self.current_pulse = state.current_pulse.clamp(-1, MAX_PULSES - 1);
        self.pulse_counter = state.pulse_counter;
        self.has_had_first_clock_high = state.clock_length > 0;
    }
}

impl Default for PulseClock {
    fn default() -> Self {
        Self::new()
    }
}
