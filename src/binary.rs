//! Sequential little-endian reader over a fixed byte buffer.
//!
//! The Argus wire format is a packed little-endian layout with fixed-capacity
//! UTF-16 text fields. [`ByteReader`] tracks an absolute offset and fails with
//! [`ArgusError::DecodeTruncation`] instead of reading past the end.
//!
//! String fields are decoded in two explicit steps:
//!
//! ```
//! use argus_daq::binary::{ByteReader, UINT16};
//!
//! # fn example(buf: &[u8]) -> argus_daq::Result<String> {
//! let mut r = ByteReader::new(buf);
//! let start = r.pos();
//! let label = r.utf16_string()?;
//! r.seek(start + 64 * UINT16)?;
//! # Ok(label)
//! # }
//! ```

use crate::error::{ArgusError, Result};

/// Width of a `u8` field in bytes.
pub const UINT8: usize = 1;
/// Width of a `u16` field in bytes.
pub const UINT16: usize = 2;
/// Width of a `u32` field in bytes.
pub const UINT32: usize = 4;
/// Width of a `u64` field in bytes.
pub const UINT64: usize = 8;
/// Width of an `f64` field in bytes.
pub const FLOAT64: usize = UINT64;

/// Offset-tracking cursor over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Current absolute offset.
    pub fn pos(&self) -> usize {
        self.off
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.off)
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Seeking exactly to the end is allowed; seeking past it is a
    /// truncation error.
    pub fn seek(&mut self, to: usize) -> Result<()> {
        if to > self.buf.len() {
            return Err(ArgusError::DecodeTruncation {
                offset: to,
                needed: 0,
                available: self.buf.len(),
            });
        }
        self.off = to;
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .off
            .checked_add(N)
            .and_then(|end| self.buf.get(self.off..end))
            .ok_or(ArgusError::DecodeTruncation {
                offset: self.off,
                needed: N,
                available: self.buf.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.off += N;
        Ok(out)
    }

    /// Read a `u8`.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<UINT8>()?[0])
    }

    /// Read a little-endian `u16`.
    pub fn u16(&mut self) -> Result<u16> {
        self.take::<UINT16>().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn u32(&mut self) -> Result<u32> {
        self.take::<UINT32>().map(u32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    pub fn u64(&mut self) -> Result<u64> {
        self.take::<UINT64>().map(u64::from_le_bytes)
    }

    /// Read a little-endian IEEE-754 `f64`.
    pub fn f64(&mut self) -> Result<f64> {
        self.u64().map(f64::from_bits)
    }

    /// Read UTF-16 code units up to a zero terminator.
    ///
    /// Stops early (without error) if the buffer runs out before a terminator
    /// is found. Unpaired surrogates decode to U+FFFD. The cursor is left
    /// immediately after the terminator, not at the end of the field.
    pub fn utf16_string(&mut self) -> Result<String> {
        let mut units = Vec::new();
        while self.remaining() >= UINT16 {
            let unit = self.u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }
}
