//! Little-endian primitives and framed-token helpers for the wire protocol.
//!
//! Every multi-byte integer on the wire is little-endian (spec §4.2). A
//! framed string is `u16 length || bytes`; every command begins with a `u32`
//! command token and, except `WRITE_POINTS`, ends with `DT_END`.

use crate::error::{Error, Result};
use crate::protocol::constants::DT_END;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A cursor over received bytes, with little-endian primitive readers.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Wrap a buffer of bytes for sequential little-endian reads.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::protocol(format!(
                "buffer underrun: need {n} bytes, have {}",
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        let v = (&self.data[self.pos..self.pos + 2]).get_u16_le();
        self.pos += 2;
        Ok(v)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        let v = (&self.data[self.pos..self.pos + 4]).get_u32_le();
        self.pos += 4;
        Ok(v)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.require(4)?;
        let v = (&self.data[self.pos..self.pos + 4]).get_i32_le();
        self.pos += 4;
        Ok(v)
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.require(8)?;
        let v = (&self.data[self.pos..self.pos + 8]).get_u64_le();
        self.pos += 8;
        Ok(v)
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.require(n)?;
        let b = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(b)
    }

    /// Read a framed string: `u16 length || bytes`, decoded as UTF-8.
    pub fn read_framed_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::protocol(format!("non-UTF-8 framed string: {e}")))
    }
}

/// A growable little-endian write buffer for building command frames.
pub struct WriteBuffer {
    data: BytesMut,
}

impl WriteBuffer {
    /// Create an empty write buffer.
    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(64),
        }
    }

    /// Write the `u32` command token that every command begins with.
    pub fn write_command(mut self, token: u32) -> Self {
        self.data.put_u32_le(token);
        self
    }

    /// Write a `u32` data token.
    pub fn write_token(&mut self, token: u32) -> &mut Self {
        self.data.put_u32_le(token);
        self
    }

    /// Write a little-endian `u16`.
    pub fn write_u16(&mut self, val: u16) -> &mut Self {
        self.data.put_u16_le(val);
        self
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&mut self, val: u32) -> &mut Self {
        self.data.put_u32_le(val);
        self
    }

    /// Write a little-endian `i32`.
    pub fn write_i32(&mut self, val: i32) -> &mut Self {
        self.data.put_i32_le(val);
        self
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&mut self, val: u64) -> &mut Self {
        self.data.put_u64_le(val);
        self
    }

    /// Write raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Write a framed string: `u16 length || bytes`.
    pub fn write_framed_string(&mut self, s: &str) -> &mut Self {
        self.write_u16(s.len() as u16);
        self.write_bytes(s.as_bytes());
        self
    }

    /// Write a `DT_X || framed string` pair, the shape every DATABASE/
    /// MEASUREMENT/SERIES/FIELD_LIST/TYPED_FIELDS field uses.
    pub fn write_framed_field(&mut self, token: u32, s: &str) -> &mut Self {
        self.write_token(token);
        self.write_framed_string(s);
        self
    }

    /// Append the terminating `DT_END` token and freeze into bytes.
    pub fn finish(mut self) -> Bytes {
        self.data.put_u32_le(DT_END);
        self.data.freeze()
    }

    /// Freeze without appending `DT_END` (used by `WRITE_POINTS`'s opening
    /// frame, which has no terminator until the caller decides to stop).
    pub fn finish_unterminated(self) -> Bytes {
        self.data.freeze()
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
