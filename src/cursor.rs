use byteorder::{BigEndian, ByteOrder};
use encoding::{DecoderTrap, EncodingRef};
use log::trace;

use crate::err::{Result, TemplateError};

/// A lightweight cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, intended for
/// parsing where the data is already in memory and we want explicit
/// bounds/offset control without IO-style error plumbing.
///
/// All reads are big-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    #[inline]
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Repositions the cursor. `pos == len` (EOF) is allowed, `pos > len` is not.
    pub fn set_position(&mut self, pos: usize, what: &'static str) -> Result<()> {
        if pos > self.buf.len() {
            return Err(TemplateError::OutOfData {
                what,
                offset: pos as u64,
                need: 0,
                have: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize, what: &'static str) -> Result<()> {
        let _ = self.take_bytes(n, what)?;
        Ok(())
    }

    #[inline]
    pub fn take_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        match self.buf.get(self.pos..self.pos + len) {
            Some(out) => {
                self.pos += len;
                Ok(out)
            }
            None => Err(TemplateError::OutOfData {
                what,
                offset: self.pos as u64,
                need: len,
                have: self.remaining(),
            }),
        }
    }

    #[inline]
    pub fn u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.take_bytes(1, what)?[0])
    }

    #[inline]
    pub fn i8(&mut self, what: &'static str) -> Result<i8> {
        Ok(self.u8(what)? as i8)
    }

    #[inline]
    pub fn u16(&mut self, what: &'static str) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take_bytes(2, what)?))
    }

    #[inline]
    pub fn i16(&mut self, what: &'static str) -> Result<i16> {
        Ok(self.u16(what)? as i16)
    }

    #[inline]
    pub fn u32(&mut self, what: &'static str) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take_bytes(4, what)?))
    }

    #[inline]
    pub fn i32(&mut self, what: &'static str) -> Result<i32> {
        Ok(self.u32(what)? as i32)
    }

    #[inline]
    pub fn u64(&mut self, what: &'static str) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take_bytes(8, what)?))
    }

    #[inline]
    pub fn i64(&mut self, what: &'static str) -> Result<i64> {
        Ok(self.u64(what)? as i64)
    }

    #[inline]
    pub fn f32_bits(&mut self, what: &'static str) -> Result<u32> {
        self.u32(what)
    }

    #[inline]
    pub fn f64_bits(&mut self, what: &'static str) -> Result<u64> {
        self.u64(what)
    }

    /// Reads an unsigned integer of `width` bytes (1, 2, 4 or 8).
    pub fn uint(&mut self, width: u8, what: &'static str) -> Result<u64> {
        match width {
            1 => self.u8(what).map(u64::from),
            2 => self.u16(what).map(u64::from),
            4 => self.u32(what).map(u64::from),
            8 => self.u64(what),
            _ => unreachable!("integer width {width} is not registered"),
        }
    }

    /// Reads a signed integer of `width` bytes, sign-extended to i64.
    pub fn int(&mut self, width: u8, what: &'static str) -> Result<i64> {
        match width {
            1 => self.i8(what).map(i64::from),
            2 => self.i16(what).map(i64::from),
            4 => self.i32(what).map(i64::from),
            8 => self.i64(what),
            _ => unreachable!("integer width {width} is not registered"),
        }
    }

    /// Reads a length-prefixed (u8) string decoded through `codec`.
    pub fn read_pstring(&mut self, codec: EncodingRef, what: &'static str) -> Result<String> {
        let len = self.u8(what)? as usize;
        trace!(
            "Offset `0x{offset:08x} ({offset})` reading a pstring of len {len}",
            offset = self.position() - 1,
        );
        let bytes = self.take_bytes(len, what)?;
        Ok(decode_bytes(bytes, codec))
    }

    /// Reads bytes up to (and consuming) a NUL terminator.
    pub fn read_cstring_bytes(&mut self, what: &'static str) -> Result<&'a [u8]> {
        let start = self.pos;
        match self.buf[start..].iter().position(|&b| b == 0) {
            Some(n) => {
                let out = &self.buf[start..start + n];
                self.pos = start + n + 1;
                Ok(out)
            }
            None => Err(TemplateError::OutOfData {
                what,
                offset: start as u64,
                need: 1,
                have: 0,
            }),
        }
    }
}

/// Decodes legacy single-byte text, substituting unmappable bytes.
pub(crate) fn decode_bytes(bytes: &[u8], codec: EncodingRef) -> String {
    match codec.decode(bytes, DecoderTrap::Replace) {
        Ok(s) => s,
        Err(_) => String::new(),
    }
}

/// Encodes text back to the legacy single-byte codec, substituting
/// unmappable characters.
pub(crate) fn encode_string(s: &str, codec: EncodingRef) -> Vec<u8> {
    codec
        .encode(s, encoding::EncoderTrap::Replace)
        .unwrap_or_default()
}

/// A growable big-endian byte sink with positional patching.
///
/// `write_*_at` exists for fields whose size must be back-filled after the
/// payload is known; everything else appends at the end.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends `n` zero bytes.
    pub fn pad(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    #[inline]
    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    #[inline]
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes an unsigned integer of `width` bytes (1, 2, 4 or 8),
    /// truncating to the field width.
    pub fn write_uint(&mut self, width: u8, v: u64) {
        match width {
            1 => self.write_u8(v as u8),
            2 => self.write_u16(v as u16),
            4 => self.write_u32(v as u32),
            8 => self.write_u64(v),
            _ => unreachable!("integer width {width} is not registered"),
        }
    }

    /// Writes a signed integer of `width` bytes, truncating to the field width.
    pub fn write_int(&mut self, width: u8, v: i64) {
        match width {
            1 => self.write_i8(v as i8),
            2 => self.write_i16(v as i16),
            4 => self.write_i32(v as i32),
            8 => self.write_i64(v),
            _ => unreachable!("integer width {width} is not registered"),
        }
    }

    /// Patches a byte at an already-written offset. Panics when the offset
    /// has not been written yet; callers only back-fill regions they emitted.
    pub fn write_u8_at(&mut self, v: u8, offset: usize) {
        self.buf[offset] = v;
    }

    pub fn write_u16_at(&mut self, v: u16, offset: usize) {
        self.buf[offset..offset + 2].copy_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32_at(&mut self, v: u32, offset: usize) {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_be_bytes());
    }
}
