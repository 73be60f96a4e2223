//! # Frame Codec
//!
//! Incremental framing and de-framing of the length-prefixed wire format.
//!
//! [`FrameCodec`] implements the tokio codec traits over a `BytesMut` so the
//! extraction logic can be driven by any byte source; [`PacketFramer`] owns
//! the accumulation buffer for the connection read pump, where decryption has
//! to happen before framing and a `Framed` stream cannot be used directly.
//!
//! ## Behavior
//! - A partial frame (length prefix seen, body incomplete) rolls back and
//!   waits for more data, so one TCP read may straddle a frame boundary.
//! - One feed may yield many frames.
//! - A frame length < 1 is a fatal framing error.
//! - Accumulating more than the configured ceiling (default 4 MiB) without a
//!   resolvable frame is a fatal framing error and must tear the connection
//!   down.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::DEFAULT_MAX_FRAME_ACCUMULATION;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};

/// Reads a VarInt from the front of `src` without consuming it.
///
/// Returns `None` when the encoding is still incomplete (more data needed).
fn peek_var_int(src: &[u8]) -> Result<Option<(i32, usize)>> {
    let mut value: i32 = 0;
    let mut position = 0;
    for (index, byte) in src.iter().enumerate() {
        value |= ((*byte as i32) & 0x7F) << position;
        if byte & 0x80 == 0 {
            return Ok(Some((value, index + 1)));
        }
        position += 7;
        if position >= 32 {
            return Err(ProtocolError::VarIntTooBig);
        }
    }
    Ok(None)
}

/// Stateless frame splitter for the `VarInt length` + `VarInt id` + body
/// format.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_accumulation: usize,
}

impl FrameCodec {
    pub fn new(max_accumulation: usize) -> Self {
        Self { max_accumulation }
    }

    /// Fails the connection when a partial frame has outgrown the ceiling.
    fn check_ceiling(&self, buffered: usize) -> Result<()> {
        if buffered > self.max_accumulation {
            return Err(ProtocolError::OversizedAccumulation(self.max_accumulation));
        }
        Ok(())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_ACCUMULATION)
    }
}

impl Decoder for FrameCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let (length, header_bytes) = match peek_var_int(src)? {
            Some(header) => header,
            None => {
                self.check_ceiling(src.len())?;
                return Ok(None);
            }
        };

        if length < 1 {
            return Err(ProtocolError::InvalidFrameLength(length));
        }
        let length = length as usize;

        if src.len() < header_bytes + length {
            self.check_ceiling(src.len())?;
            return Ok(None);
        }

        src.advance(header_bytes);
        let mut frame = src.split_to(length);

        let (id, id_bytes) = peek_var_int(&frame)?
            .ok_or(ProtocolError::InvalidFrameLength(length as i32))?;
        frame.advance(id_bytes);

        Ok(Some(Packet::new(id, frame.to_vec())))
    }
}

impl Encoder<Packet> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&packet.marshal());
        Ok(())
    }
}

/// Stateful reassembler used by the connection read pump.
#[derive(Debug, Default)]
pub struct PacketFramer {
    accumulation: BytesMut,
    codec: FrameCodec,
}

impl PacketFramer {
    pub fn new(max_accumulation: usize) -> Self {
        Self {
            accumulation: BytesMut::new(),
            codec: FrameCodec::new(max_accumulation),
        }
    }

    /// Appends `bytes` and extracts every complete frame now available.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Packet>> {
        self.accumulation.extend_from_slice(bytes);
        let mut packets = Vec::new();
        while let Some(packet) = self.codec.decode(&mut self.accumulation)? {
            packets.push(packet);
        }
        Ok(packets)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn encoder_and_decoder_are_symmetric() {
        let mut codec = FrameCodec::default();
        let mut wire = BytesMut::new();
        codec
            .encode(Packet::new(0x42, vec![1, 2, 3]), &mut wire)
            .unwrap();
        let decoded = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(decoded, Packet::new(0x42, vec![1, 2, 3]));
        assert!(wire.is_empty());
    }

    #[test]
    fn incomplete_length_prefix_waits() {
        let mut codec = FrameCodec::default();
        // continuation bit set, second byte missing
        let mut wire = BytesMut::from(&[0x80u8][..]);
        assert!(codec.decode(&mut wire).unwrap().is_none());
        assert_eq!(wire.len(), 1);
    }

    #[test]
    fn oversized_length_prefix_is_fatal() {
        let mut codec = FrameCodec::default();
        let mut wire = BytesMut::from(&[0xFFu8, 0xFF, 0xFF, 0xFF, 0xFF][..]);
        assert!(matches!(
            codec.decode(&mut wire),
            Err(ProtocolError::VarIntTooBig)
        ));
    }
}
