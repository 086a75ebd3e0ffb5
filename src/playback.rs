//! Pattern playback on the indicator.
//!
//! Playback walks the committed steps in order and blocks for the whole
//! pattern duration. The device has nothing else to do while a pattern
//! plays, so no commands are read and nothing can cancel a run; the reply
//! to the triggering command goes out after the last step finishes.

use crate::colors::Color;
use crate::store::PatternStore;

/// Trait for the tri-color indicator hardware.
///
/// Implement this over your board's color register (GPIO, memory-mapped
/// register, etc.). Handle any hardware errors internally - this method
/// cannot fail.
pub trait Indicator {
    /// Drives the indicator channels from a color bitmask.
    fn set(&mut self, color: Color);
}

/// Trait for the busy-wait timing primitive.
///
/// One unit is the device's base dwell time; a step's duration field scales
/// it. Implementations typically spin for a calibrated iteration count.
pub trait Dwell {
    /// Blocks for `units` base dwell times. Zero units returns immediately.
    fn dwell(&mut self, units: u8);
}

/// Replays the committed pattern once.
///
/// Clears the indicator, then sets each step's color and holds it for the
/// step's duration. An empty store is a valid no-op; only the clearing
/// write happens. The indicator is left showing the last step's color.
pub fn execute<I: Indicator, D: Dwell>(store: &PatternStore, indicator: &mut I, dwell: &mut D) {
    indicator.set(Color::OFF);
    for step in store.steps() {
        indicator.set(step.color);
        dwell.dwell(step.duration);
    }
}
