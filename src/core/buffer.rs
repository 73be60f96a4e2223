//! # Binary Buffer
//!
//! Growable byte buffer with cursor semantics for the wire codec.
//!
//! Reads consume from the front, writes append to the back. Every read is
//! atomic: if the buffer holds fewer bytes than the read needs, it fails with
//! [`ProtocolError::BufferTooShort`] and consumes nothing.
//!
//! ## Wire Primitives
//! - Fixed-width integers and floats, big-endian
//! - Booleans as `0x00`/`0x01` (anything else is a decode error)
//! - VarInt/VarLong: little-endian base-128 with continuation bit `0x80`
//! - Strings: UTF-8 bytes prefixed by their VarInt byte length
//! - UUIDs: 16 raw bytes

use uuid::Uuid;

use crate::error::{ProtocolError, Result};

/// An owned byte buffer with a read cursor.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: bytes.into(),
            cursor: 0,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// All bytes ever written, including any already read past.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// The unread tail.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.cursor..]
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn read(&mut self, length: usize) -> Result<Vec<u8>> {
        if self.remaining() < length {
            return Err(ProtocolError::BufferTooShort {
                needed: length,
                available: self.remaining(),
            });
        }
        let out = self.data[self.cursor..self.cursor + length].to_vec();
        self.cursor += length;
        Ok(out)
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() < 1 {
            return Err(ProtocolError::BufferTooShort {
                needed: 1,
                available: 0,
            });
        }
        let v = self.data[self.cursor];
        self.cursor += 1;
        Ok(v)
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { 0x01 } else { 0x00 });
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let start = self.cursor;
        match self.read_u8()? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            other => {
                self.cursor = start;
                Err(ProtocolError::InvalidBool(other))
            }
        }
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_i16().map(|v| v as u16)
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.read(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes);
        Ok(i64::from_be_bytes(raw))
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_i32().map(|v| f32::from_bits(v as u32))
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_i64().map(|v| f64::from_bits(v as u64))
    }

    /// Encodes `v` in the minimal number of base-128 bytes. Returns the byte
    /// count written.
    pub fn write_var_int(&mut self, v: i32) -> usize {
        let mut raw = v as u32;
        let mut written = 0;
        loop {
            written += 1;
            if raw & !0x7F == 0 {
                self.write_u8(raw as u8);
                return written;
            }
            self.write_u8((raw & 0x7F | 0x80) as u8);
            raw >>= 7;
        }
    }

    /// Returns the decoded value and the byte count consumed. Rejects
    /// encodings that run past the 32-bit width.
    pub fn read_var_int(&mut self) -> Result<(i32, usize)> {
        let start = self.cursor;
        let mut value: i32 = 0;
        let mut position = 0;
        let mut consumed = 0;
        loop {
            let current = match self.read_u8() {
                Ok(b) => b,
                Err(e) => {
                    self.cursor = start;
                    return Err(e);
                }
            };
            consumed += 1;
            value |= ((current as i32) & 0x7F) << position;
            if current & 0x80 == 0 {
                return Ok((value, consumed));
            }
            position += 7;
            if position >= 32 {
                self.cursor = start;
                return Err(ProtocolError::VarIntTooBig);
            }
        }
    }

    pub fn write_var_long(&mut self, v: i64) -> usize {
        let mut raw = v as u64;
        let mut written = 0;
        loop {
            written += 1;
            if raw & !0x7F == 0 {
                self.write_u8(raw as u8);
                return written;
            }
            self.write_u8((raw & 0x7F | 0x80) as u8);
            raw >>= 7;
        }
    }

    pub fn read_var_long(&mut self) -> Result<(i64, usize)> {
        let start = self.cursor;
        let mut value: i64 = 0;
        let mut position = 0;
        let mut consumed = 0;
        loop {
            let current = match self.read_u8() {
                Ok(b) => b,
                Err(e) => {
                    self.cursor = start;
                    return Err(e);
                }
            };
            consumed += 1;
            value |= ((current as i64) & 0x7F) << position;
            if current & 0x80 == 0 {
                return Ok((value, consumed));
            }
            position += 7;
            if position >= 64 {
                self.cursor = start;
                return Err(ProtocolError::VarLongTooBig);
            }
        }
    }

    pub fn write_string(&mut self, s: &str) -> usize {
        let written = self.write_var_int(s.len() as i32);
        self.write(s.as_bytes());
        written + s.len()
    }

    pub fn read_string(&mut self) -> Result<String> {
        let start = self.cursor;
        let result = self.read_string_inner();
        if result.is_err() {
            self.cursor = start;
        }
        result
    }

    fn read_string_inner(&mut self) -> Result<String> {
        let (length, _) = self.read_var_int()?;
        if length < 0 {
            return Err(ProtocolError::InvalidStringLength(length));
        }
        if length as usize > self.remaining() {
            return Err(ProtocolError::InvalidStringLength(length));
        }
        let bytes = self.read(length as usize)?;
        String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidStringEncoding)
    }

    pub fn write_uuid(&mut self, v: Uuid) {
        self.write(v.as_bytes());
    }

    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let bytes = self.read(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&bytes);
        Ok(Uuid::from_bytes(raw))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn var_int_known_encodings() {
        // Reference vectors from the wire protocol documentation.
        let cases: &[(i32, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (255, &[0xFF, 0x01]),
            (25565, &[0xDD, 0xC7, 0x01]),
            (2097151, &[0xFF, 0xFF, 0x7F]),
            (2147483647, &[0xFF, 0xFF, 0xFF, 0xFF, 0x07]),
            (-1, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
            (-2147483648, &[0x80, 0x80, 0x80, 0x80, 0x08]),
        ];
        for &(value, encoded) in cases {
            let mut buf = ByteBuffer::new();
            assert_eq!(buf.write_var_int(value), encoded.len());
            assert_eq!(buf.unread(), encoded);
            let (decoded, consumed) = buf.read_var_int().unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn var_long_round_trip_extremes() {
        for value in [0i64, 1, -1, i64::MIN, i64::MAX, 1 << 35] {
            let mut buf = ByteBuffer::new();
            let written = buf.write_var_long(value);
            assert!(written <= 10);
            let (decoded, consumed) = buf.read_var_long().unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, written);
        }
    }

    #[test]
    fn oversized_var_int_rejected() {
        let mut buf = ByteBuffer::from_bytes(vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        match buf.read_var_int() {
            Err(ProtocolError::VarIntTooBig) => {}
            other => panic!("expected VarIntTooBig, got {other:?}"),
        }
        // nothing consumed on failure
        assert_eq!(buf.remaining(), 6);
    }

    #[test]
    fn truncated_var_int_rejected_atomically() {
        let mut buf = ByteBuffer::from_bytes(vec![0x80, 0x80]);
        assert!(buf.read_var_int().is_err());
        assert_eq!(buf.remaining(), 2);
    }

    #[test]
    fn string_round_trip() {
        let mut buf = ByteBuffer::new();
        buf.write_string("hello \u{1F30D}");
        assert_eq!(buf.read_string().unwrap(), "hello \u{1F30D}");
        assert!(buf.is_empty());
    }

    #[test]
    fn string_length_past_end_fails_without_consuming() {
        let mut buf = ByteBuffer::new();
        buf.write_var_int(12);
        buf.write(b"abc");
        let before = buf.remaining();
        assert!(matches!(
            buf.read_string(),
            Err(ProtocolError::InvalidStringLength(12))
        ));
        assert_eq!(buf.remaining(), before);
    }

    #[test]
    fn short_read_is_atomic() {
        let mut buf = ByteBuffer::from_bytes(vec![1, 2, 3]);
        assert!(matches!(
            buf.read(8),
            Err(ProtocolError::BufferTooShort {
                needed: 8,
                available: 3
            })
        ));
        assert_eq!(buf.read(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let mut buf = ByteBuffer::from_bytes(vec![0x02]);
        assert!(matches!(buf.read_bool(), Err(ProtocolError::InvalidBool(0x02))));
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn fixed_width_round_trips() {
        let mut buf = ByteBuffer::new();
        buf.write_i16(-12345);
        buf.write_u16(54321);
        buf.write_i32(-7);
        buf.write_i64(1 << 40);
        buf.write_f32(3.5);
        buf.write_f64(-0.125);
        assert_eq!(buf.read_i16().unwrap(), -12345);
        assert_eq!(buf.read_u16().unwrap(), 54321);
        assert_eq!(buf.read_i32().unwrap(), -7);
        assert_eq!(buf.read_i64().unwrap(), 1 << 40);
        assert_eq!(buf.read_f32().unwrap(), 3.5);
        assert_eq!(buf.read_f64().unwrap(), -0.125);
    }

    #[test]
    fn uuid_round_trip() {
        let id = Uuid::from_u128(0x00112233445566778899AABBCCDDEEFF);
        let mut buf = ByteBuffer::new();
        buf.write_uuid(id);
        assert_eq!(buf.read_uuid().unwrap(), id);
    }
}
