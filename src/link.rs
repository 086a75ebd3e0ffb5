//! Host channel boundary and the blocking serve loop.

use crate::dispatcher::Dispatcher;
use crate::playback::{Dwell, Indicator};
use crate::proto::{FrameHeader, MAX_FRAME_BYTES, Reply};

/// Trait for the blocking byte channel to the host.
///
/// The transport is assumed reliable once a frame parses: reads block until
/// bytes arrive and writes block until the transport accepts them, with no
/// timeouts at this layer. The device serves exactly one peer, so waiting
/// forever is fine.
pub trait HostLink {
    /// Link-level error type. A failure ends the serve loop; everything
    /// protocol-level is answered on the wire instead.
    type Error;

    /// Reads the next single byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Fills `buf` completely.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Encodes and sends one reply frame for the request identified by
    /// `request`. [`Reply::encode`] produces the wire form.
    fn reply(&mut self, request: &FrameHeader, reply: &Reply) -> Result<(), Self::Error>;
}

/// Runs the dispatch loop forever: read one frame, dispatch it, send the
/// one reply. Frames whose header byte does not parse are dropped without
/// a reply - with no valid header there is nothing to address one to.
///
/// # Errors
/// Only link failures surface. The loop never returns otherwise.
pub fn serve<L, I, D>(
    link: &mut L,
    dispatcher: &mut Dispatcher<I, D>,
) -> Result<core::convert::Infallible, L::Error>
where
    L: HostLink,
    I: Indicator,
    D: Dwell,
{
    let mut buf = [0u8; MAX_FRAME_BYTES];

    loop {
        let byte = link.read_byte()?;
        let header = match FrameHeader::parse(byte) {
            Ok(header) => header,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("dropping frame with malformed header {=u8:#x}", byte);
                continue;
            }
        };

        let payload = &mut buf[..header.len.byte_len()];
        link.read_exact(payload)?;

        let reply = dispatcher.dispatch(&header, payload);
        link.reply(&header, &reply)?;
    }
}
