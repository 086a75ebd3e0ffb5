//! Fixed-capacity pattern storage.

use crate::types::{PatternStep, ProtocolError};

/// Maximum number of steps a pattern may hold.
pub const PATTERN_CAPACITY: usize = 128;

/// Byte length of a full pattern's flattened wire image.
const PATTERN_IMAGE_BYTES: usize = PATTERN_CAPACITY * PatternStep::WIRE_SIZE;

/// Fixed-capacity storage for one pattern.
///
/// Steps are kept as their flattened 2-byte wire encoding; chunked transfers
/// address this image directly and playback decodes at iteration time, so
/// there is a single in-memory layout and one codec at the boundary.
///
/// A load proceeds in three phases: [`begin_load`] records the target step
/// count, [`write_chunk`] fills the image as chunks arrive, and
/// [`commit_load`] makes the new count visible. The committed count changes
/// nowhere else (besides [`reset`]), so a half-written pattern is never
/// observable — the dispatcher refuses dump and playback commands while a
/// load is in flight.
///
/// [`begin_load`]: PatternStore::begin_load
/// [`write_chunk`]: PatternStore::write_chunk
/// [`commit_load`]: PatternStore::commit_load
/// [`reset`]: PatternStore::reset
#[derive(Debug)]
pub struct PatternStore {
    image: [u8; PATTERN_IMAGE_BYTES],
    count: usize,
    pending: usize,
}

impl PatternStore {
    /// Creates an empty store.
    pub const fn new() -> Self {
        Self {
            image: [0; PATTERN_IMAGE_BYTES],
            count: 0,
            pending: 0,
        }
    }

    /// Number of committed steps.
    pub fn step_count(&self) -> usize {
        self.count
    }

    /// Returns true if no pattern is committed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte length of the committed pattern's wire image.
    pub fn total_bytes(&self) -> usize {
        self.count * PatternStep::WIRE_SIZE
    }

    /// Byte length the in-flight load will commit.
    pub fn pending_bytes(&self) -> usize {
        self.pending * PatternStep::WIRE_SIZE
    }

    /// Discards the committed pattern.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Starts a load that will replace the pattern with `expected_steps`
    /// steps.
    ///
    /// The committed count is untouched until [`commit_load`]; a rejected
    /// load leaves the store exactly as it was.
    ///
    /// # Errors
    /// `CapacityExceeded` if `expected_steps` is more than
    /// [`PATTERN_CAPACITY`].
    ///
    /// [`commit_load`]: PatternStore::commit_load
    pub fn begin_load(&mut self, expected_steps: usize) -> Result<(), ProtocolError> {
        if expected_steps > PATTERN_CAPACITY {
            return Err(ProtocolError::CapacityExceeded);
        }
        self.pending = expected_steps;
        Ok(())
    }

    /// Copies one chunk of wire data into the image at `offset`.
    ///
    /// The caller guarantees the chunk stays within the pending load's image.
    pub fn write_chunk(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.pending_bytes());
        self.image[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Makes the pending load visible as the committed pattern.
    ///
    /// Single-threaded, so this is simply the final assignment after the
    /// last chunk.
    pub fn commit_load(&mut self) {
        self.count = self.pending;
    }

    /// Reads up to `max_len` bytes of the committed image starting at
    /// `offset`.
    ///
    /// The returned slice is shorter than `max_len` when the image ends
    /// first. The caller guarantees `offset` lies within the committed
    /// image.
    pub fn read_chunk(&self, offset: usize, max_len: usize) -> &[u8] {
        debug_assert!(offset < self.total_bytes());
        let end = self.total_bytes().min(offset + max_len);
        &self.image[offset..end]
    }

    /// Iterates the committed steps, decoding from the wire image.
    pub fn steps(&self) -> impl Iterator<Item = PatternStep> + '_ {
        self.image[..self.total_bytes()]
            .chunks_exact(PatternStep::WIRE_SIZE)
            .map(|pair| PatternStep::decode([pair[0], pair[1]]))
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}
