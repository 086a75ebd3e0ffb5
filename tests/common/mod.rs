//! Shared test infrastructure for pattern-link integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pattern_link::{
    Color, Dispatcher, Dwell, Endpoint, FrameHeader, FrameLen, HostLink, Identity, Indicator,
    PatternStep, Reply, serve,
};

pub const TEST_IDENTITY: Identity = Identity::new(*b"ptrn", *b"link", 1);

// ============================================================================
// Mock Hardware
// ============================================================================

/// Indicator that records every register write, sharing the history with
/// the test via `Rc`.
#[derive(Clone)]
pub struct RecordingIndicator {
    pub history: Rc<RefCell<Vec<Color>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self {
            history: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn last(&self) -> Option<Color> {
        self.history.borrow().last().copied()
    }
}

impl Indicator for RecordingIndicator {
    fn set(&mut self, color: Color) {
        self.history.borrow_mut().push(color);
    }
}

/// Dwell that records the requested units instead of busy-waiting.
#[derive(Clone)]
pub struct RecordingDwell {
    pub history: Rc<RefCell<Vec<u8>>>,
}

impl RecordingDwell {
    pub fn new() -> Self {
        Self {
            history: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Dwell for RecordingDwell {
    fn dwell(&mut self, units: u8) {
        self.history.borrow_mut().push(units);
    }
}

// ============================================================================
// Scripted Host Link
// ============================================================================

/// Link fed from a prepared script of inbound frames, recording every
/// outbound reply frame in encoded form.
pub struct ScriptLink {
    inbound: VecDeque<u8>,
    pub replies: Vec<Vec<u8>>,
}

/// Returned once the script runs dry, ending the serve loop.
#[derive(Debug, PartialEq, Eq)]
pub struct ScriptDone;

impl ScriptLink {
    pub fn new(frames: &[Vec<u8>]) -> Self {
        Self {
            inbound: frames.iter().flatten().copied().collect(),
            replies: Vec::new(),
        }
    }
}

impl HostLink for ScriptLink {
    type Error = ScriptDone;

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.inbound.pop_front().ok_or(ScriptDone)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        for slot in buf.iter_mut() {
            *slot = self.inbound.pop_front().ok_or(ScriptDone)?;
        }
        Ok(())
    }

    fn reply(&mut self, request: &FrameHeader, reply: &Reply) -> Result<(), Self::Error> {
        let mut frame = [0u8; Reply::MAX_ENCODED];
        let n = reply.encode(request, &mut frame);
        self.replies.push(Vec::from(&frame[..n]));
        Ok(())
    }
}

/// A served device plus handles to everything it touched.
pub struct Device {
    pub link: ScriptLink,
    pub indicator: RecordingIndicator,
    pub dwell: RecordingDwell,
}

/// Feeds the script to a fresh device and serves it until the script runs
/// dry.
pub fn run(frames: &[Vec<u8>]) -> Device {
    let mut link = ScriptLink::new(frames);
    let indicator = RecordingIndicator::new();
    let dwell = RecordingDwell::new();
    let mut dispatcher = Dispatcher::new(TEST_IDENTITY, indicator.clone(), dwell.clone());

    assert_eq!(serve(&mut link, &mut dispatcher), Err(ScriptDone));

    Device {
        link,
        indicator,
        dwell,
    }
}

// ============================================================================
// Host-Side Frame Builders
// ============================================================================

/// Encodes one frame: header byte, then the given payload bytes zero-padded
/// to the length class.
pub fn frame(id: u8, endpoint: Endpoint, len: FrameLen, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= len.byte_len());
    let header = FrameHeader { id, endpoint, len };
    let mut frame = vec![0u8; 1 + len.byte_len()];
    frame[0] = header.to_byte();
    frame[1..1 + payload.len()].copy_from_slice(payload);
    frame
}

pub fn name_version_frame() -> Vec<u8> {
    frame(2, Endpoint::App, FrameLen::Bytes1, &[0x01])
}

pub fn get_pattern_frame() -> Vec<u8> {
    frame(2, Endpoint::App, FrameLen::Bytes1, &[0x05])
}

pub fn execute_frame() -> Vec<u8> {
    frame(2, Endpoint::App, FrameLen::Bytes1, &[0x07])
}

/// Frames a complete chunked SET_PATTERN transfer the way the host client
/// does: 128-byte-class frames, the first one carrying the step count.
pub fn set_pattern_frames(count: u8, data: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut first = true;
    let mut sent = 0;

    loop {
        let mut payload = vec![0x03];
        if first {
            payload.push(count);
        }
        let capacity = FrameLen::Bytes128.byte_len() - payload.len();
        let n = capacity.min(data.len() - sent);
        payload.extend_from_slice(&data[sent..sent + n]);
        sent += n;

        frames.push(frame(2, Endpoint::App, FrameLen::Bytes128, &payload));
        first = false;
        if sent == data.len() {
            return frames;
        }
    }
}

/// One GET_PATTERN request per expected reply chunk for a pattern of
/// `total_bytes` flattened bytes (125 data bytes in the first reply, 126 in
/// each continuation).
pub fn get_pattern_frames(total_bytes: usize) -> Vec<Vec<u8>> {
    let mut requests = vec![get_pattern_frame()];
    let mut received = total_bytes.min(125);
    while received < total_bytes {
        requests.push(get_pattern_frame());
        received += (total_bytes - received).min(126);
    }
    requests
}

// ============================================================================
// Reply Decoding
// ============================================================================

/// Reassembles a dumped pattern from consecutive GET_PATTERN reply frames.
/// Returns the announced step count and the data bytes.
pub fn reassemble_dump(replies: &[Vec<u8>]) -> (u8, Vec<u8>) {
    let count = replies[0][3];
    let total = usize::from(count) * PatternStep::WIRE_SIZE;
    let mut data = Vec::new();

    for (i, frame) in replies.iter().enumerate() {
        assert_eq!(frame[1], 0x06, "not a GET_PATTERN reply");
        assert_eq!(frame[2], 0x00, "chunk not OK");
        let skip = if i == 0 { 4 } else { 3 };
        let take = (total - data.len()).min(frame.len() - skip);
        data.extend_from_slice(&frame[skip..skip + take]);
    }

    (count, data)
}

/// Flattens steps into their wire image.
pub fn step_bytes(steps: &[(Color, u8)]) -> Vec<u8> {
    steps
        .iter()
        .flat_map(|&(color, duration)| PatternStep::new(color, duration).encode())
        .collect()
}
