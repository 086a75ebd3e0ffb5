//! The command dispatcher and transfer state machine.
//!
//! One command frame in, exactly one reply out. The dispatcher decodes the
//! command, validates it against the transfer cursor, mutates the pattern
//! store, and assembles the reply; it is the sole mutator of both the store
//! and the cursor. Frames it cannot serve are answered with a generic NAK
//! and leave all state untouched.

use crate::colors::Color;
use crate::playback::{self, Dwell, Indicator};
use crate::proto::{Command, Endpoint, FrameHeader, FrameLen, Reply, STATUS_BAD, STATUS_OK};
use crate::store::PatternStore;
use crate::types::ProtocolError;

/// Progress of the one in-flight chunked transfer, if any.
///
/// Offsets count bytes of the flattened pattern image already transferred.
/// Only one direction can be active at a time, and the cursor returns to
/// `Idle` exactly when the offset reaches the transfer's total byte length.
/// Rejected frames never move the cursor, so an interrupted transfer can
/// still be continued correctly afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferCursor {
    /// No transfer in flight.
    Idle,
    /// An inbound load is partway through.
    Loading {
        /// Bytes of the pattern image received so far.
        offset: usize,
    },
    /// An outbound dump is partway through.
    Dumping {
        /// Bytes of the pattern image sent so far.
        offset: usize,
    },
}

/// Device identity reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    name0: [u8; 4],
    name1: [u8; 4],
    version: u32,
}

impl Identity {
    /// Creates an identity from two 4-byte name parts and a version.
    pub const fn new(name0: [u8; 4], name1: [u8; 4], version: u32) -> Self {
        Self {
            name0,
            name1,
            version,
        }
    }

    /// The identity reply body: both name parts, then the version in
    /// little-endian order.
    pub fn encode(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..4].copy_from_slice(&self.name0);
        out[4..8].copy_from_slice(&self.name1);
        out[8..].copy_from_slice(&self.version.to_le_bytes());
        out
    }
}

/// Decodes commands, drives the store and cursor, and produces replies.
///
/// Owns the pattern store, the transfer cursor, and the hardware handles;
/// nothing else writes any of them. Dispatch events are mirrored on the
/// indicator: blue once the dispatcher is ready, green when a load commits,
/// blue+red when a dump completes, red on a frame addressed to the firmware
/// or an oversized load request.
///
/// # Type Parameters
/// * `I` - Indicator implementation type
/// * `D` - Busy-wait implementation type
pub struct Dispatcher<I: Indicator, D: Dwell> {
    store: PatternStore,
    cursor: TransferCursor,
    identity: Identity,
    indicator: I,
    dwell: D,
}

impl<I: Indicator, D: Dwell> Dispatcher<I, D> {
    /// Creates a dispatcher with an empty store and shows the ready color.
    pub fn new(identity: Identity, mut indicator: I, dwell: D) -> Self {
        indicator.set(Color::BLUE);

        Self {
            store: PatternStore::new(),
            cursor: TransferCursor::Idle,
            identity,
            indicator,
            dwell,
        }
    }

    /// The current transfer cursor.
    pub fn cursor(&self) -> TransferCursor {
        self.cursor
    }

    /// The pattern store.
    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    /// Handles one received frame and returns the reply to send.
    ///
    /// `payload` is the frame's full payload for its length class; the
    /// first byte is the command code. Every call produces exactly one
    /// reply - a NAK when the frame cannot be served.
    pub fn dispatch(&mut self, header: &FrameHeader, payload: &[u8]) -> Reply {
        debug_assert_eq!(payload.len(), header.len.byte_len());

        let command = match self.route(header, payload) {
            Ok(command) => command,
            Err(_error) => {
                if header.endpoint == Endpoint::Firmware {
                    self.indicator.set(Color::RED);
                }
                #[cfg(feature = "defmt")]
                defmt::debug!("NAK: {}", _error);
                return Reply::nak();
            }
        };

        match command {
            Command::GetNameVersion => self.get_name_version(header),
            Command::SetPattern => self.set_pattern(payload),
            Command::GetPattern => self.get_pattern(),
            Command::Execute => self.execute(),
        }
    }

    /// Checks that the frame is ours to handle and decodes its command.
    ///
    /// An in-flight transfer only accepts its own continuation command;
    /// everything else is rejected without touching the cursor, so the
    /// transfer neither advances nor aborts.
    fn route(&self, header: &FrameHeader, payload: &[u8]) -> Result<Command, ProtocolError> {
        if header.endpoint != Endpoint::App {
            return Err(ProtocolError::MisdirectedFrame);
        }

        let command = payload.first().and_then(|&code| Command::from_code(code));
        match self.cursor {
            TransferCursor::Loading { .. } if command != Some(Command::SetPattern) => {
                return Err(ProtocolError::UnexpectedCommand);
            }
            TransferCursor::Dumping { .. } if command != Some(Command::GetPattern) => {
                return Err(ProtocolError::UnexpectedCommand);
            }
            _ => {}
        }

        command.ok_or(ProtocolError::UnexpectedCommand)
    }

    fn get_name_version(&mut self, header: &FrameHeader) -> Reply {
        let mut reply = Reply::to_command(Command::GetNameVersion);

        // A query arrives in the 1-byte class; anything longer gets an
        // all-zero identity.
        if header.len == FrameLen::Bytes1 {
            reply.extend(&self.identity.encode());
        } else {
            reply.extend(&[0u8; 12]);
        }
        reply
    }

    fn set_pattern(&mut self, payload: &[u8]) -> Reply {
        let mut reply = Reply::to_command(Command::SetPattern);
        let body = &payload[1..];

        let (offset, data) = match self.cursor {
            TransferCursor::Loading { offset } => (offset, body),
            _ => {
                // First chunk: the leading body byte is the step count. A
                // frame too short to carry one behaves as a zero count.
                let count = body.first().copied().unwrap_or(0) as usize;
                if let Err(_error) = self.store.begin_load(count) {
                    self.indicator.set(Color::RED);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("refusing load of {=usize} steps: {}", count, _error);
                    reply.push(STATUS_BAD);
                    return reply;
                }
                (0, if body.is_empty() { body } else { &body[1..] })
            }
        };

        let remaining = self.store.pending_bytes() - offset;
        let len = remaining.min(data.len());
        self.store.write_chunk(offset, &data[..len]);
        let offset = offset + len;

        if offset == self.store.pending_bytes() {
            self.store.commit_load();
            self.cursor = TransferCursor::Idle;
            self.indicator.set(Color::GREEN);
            #[cfg(feature = "defmt")]
            defmt::debug!("pattern loaded: {=usize} steps", self.store.step_count());
        } else {
            self.cursor = TransferCursor::Loading { offset };
        }

        reply.push(STATUS_OK);
        reply
    }

    fn get_pattern(&mut self) -> Reply {
        let mut reply = Reply::to_command(Command::GetPattern);

        let offset = match self.cursor {
            TransferCursor::Dumping { offset } => offset,
            _ => {
                if self.store.is_empty() {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("refusing dump: {}", ProtocolError::NoPatternLoaded);
                    reply.push(STATUS_BAD);
                    return reply;
                }
                0
            }
        };

        reply.push(STATUS_OK);
        if offset == 0 {
            // First chunk carries the step count ahead of the data.
            reply.push(self.store.step_count() as u8);
        }

        let chunk = self.store.read_chunk(offset, reply.capacity_left());
        reply.extend(chunk);
        let offset = offset + chunk.len();

        if offset == self.store.total_bytes() {
            self.cursor = TransferCursor::Idle;
            self.indicator.set(Color::BLUE | Color::RED);
            #[cfg(feature = "defmt")]
            defmt::debug!("pattern dumped: {=usize} steps", self.store.step_count());
        } else {
            self.cursor = TransferCursor::Dumping { offset };
        }

        reply
    }

    fn execute(&mut self) -> Reply {
        playback::execute(&self.store, &mut self.indicator, &mut self.dwell);

        let mut reply = Reply::to_command(Command::Execute);
        reply.push(STATUS_OK);
        reply
    }
}
