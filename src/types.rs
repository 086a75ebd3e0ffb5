//! Core step type, its wire codec, and the protocol error set.

use crate::colors::Color;

/// A single step of a stored pattern.
///
/// A step is a color to display and how long to hold it, as a multiple of
/// the device's base dwell time. There are no internal invariants beyond
/// the fixed-width encoding; a zero duration is a valid (instant) step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStep {
    /// Channel bitmask to display.
    pub color: Color,
    /// Dwell time, in base dwell units.
    pub duration: u8,
}

impl PatternStep {
    /// Encoded size of one step on the wire.
    pub const WIRE_SIZE: usize = 2;

    /// Creates a new pattern step.
    #[inline]
    pub const fn new(color: Color, duration: u8) -> Self {
        Self { color, duration }
    }

    /// Encodes the step into its fixed wire form `[color, duration]`.
    ///
    /// This is the only serialized representation; the store keeps steps in
    /// exactly this layout, with no padding on or off the wire.
    pub const fn encode(self) -> [u8; Self::WIRE_SIZE] {
        [self.color.bits(), self.duration]
    }

    /// Decodes a step from its wire form.
    pub const fn decode(bytes: [u8; Self::WIRE_SIZE]) -> Self {
        Self {
            color: Color::from_bits(bytes[0]),
            duration: bytes[1],
        }
    }
}

/// Errors the command path can run into.
///
/// All of them are recovered locally: the offending frame is answered with a
/// NAK or a bad status (or, for a header that never parsed, not at all), and
/// the serve loop carries on. Nothing here is fatal to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// The frame header byte failed to parse. The frame is dropped; with no
    /// valid header there is nothing to address a reply to.
    MalformedHeader,

    /// The frame is addressed to another endpoint.
    MisdirectedFrame,

    /// The command cannot be served: its code is unknown, or it does not
    /// match the command required to continue the in-flight transfer.
    UnexpectedCommand,

    /// A load requested more steps than the store can hold.
    CapacityExceeded,

    /// A dump was requested while the store is empty.
    NoPatternLoaded,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::MalformedHeader => {
                write!(f, "frame header failed to parse")
            }
            ProtocolError::MisdirectedFrame => {
                write!(f, "frame is addressed to another endpoint")
            }
            ProtocolError::UnexpectedCommand => {
                write!(f, "command is unknown or interrupts an in-flight transfer")
            }
            ProtocolError::CapacityExceeded => {
                write!(f, "pattern capacity exceeded")
            }
            ProtocolError::NoPatternLoaded => {
                write!(f, "no pattern loaded")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}
