#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`PatternStep`**: one color + duration step, wire-encoded as 2 bytes
//! - **`PatternStore`**: fixed-capacity storage for one pattern (128 steps)
//! - **`TransferCursor`**: progress of the in-flight chunked load or dump
//! - **`Dispatcher`**: the command/transfer state machine; one frame in,
//!   exactly one reply out
//! - **`Identity`**: the name/version reported to the host
//! - **`Indicator`** / **`Dwell`**: traits to implement for your indicator
//!   hardware and busy-wait primitive
//! - **`HostLink`**: trait to implement for your byte channel to the host
//! - **`serve`**: the blocking read-dispatch-reply loop
//!
//! Colors are channel bitmasks (`Color`), not a continuous color space: the
//! indicator is a tri-color LED behind a single write-only register.

pub mod colors;
pub mod dispatcher;
pub mod link;
pub mod playback;
pub mod proto;
pub mod store;
pub mod types;

pub use colors::Color;
pub use dispatcher::{Dispatcher, Identity, TransferCursor};
pub use link::{HostLink, serve};
pub use playback::{Dwell, Indicator};
pub use proto::{
    Command, Endpoint, FrameHeader, FrameLen, MAX_FRAME_BYTES, RSP_UNKNOWN_CMD, Reply, STATUS_BAD,
    STATUS_OK,
};
pub use store::{PATTERN_CAPACITY, PatternStore};
pub use types::{PatternStep, ProtocolError};
