//! Advancing reader over a datagram payload.

/// A buffer plus an explicit read position.
///
/// The position may move past the end of the buffer (fixed-size skips do not
/// check bounds); every read treats that as "nothing left".
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Cursor at an explicit position.
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// True once the position has reached or passed the end.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Advance by `n` bytes without reading.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Byte at `position + offset`, without advancing.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos.checked_add(offset)?).copied()
    }

    /// Read one unsigned byte.
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek(0)?;
        self.pos += 1;
        Some(byte)
    }

    /// Read a signed big-endian integer of `width` bytes.
    ///
    /// Width 1 is a signed byte, widths 2 and 4 are network-order `i16`/`i32`.
    /// When the read would run past the buffer, or `width` is anything other
    /// than 1, 2 or 4, this returns 0 and leaves the position untouched.
    /// A 3-byte integer therefore desynchronizes everything read after it.
    pub fn read_number(&mut self, width: i32) -> i32 {
        let Ok(len) = usize::try_from(width) else {
            return 0;
        };
        let Some(bytes) = self
            .pos
            .checked_add(len)
            .and_then(|end| self.buf.get(self.pos..end))
        else {
            return 0;
        };

        let value = match *bytes {
            [b0] => i32::from(b0 as i8),
            [b0, b1] => i32::from(i16::from_be_bytes([b0, b1])),
            [b0, b1, b2, b3] => i32::from_be_bytes([b0, b1, b2, b3]),
            _ => return 0,
        };
        self.pos += len;
        value
    }

    /// Take up to `len` bytes, clipped to what is left, and advance by the
    /// full `len` regardless of how many bytes were available.
    pub fn take_clipped(&mut self, len: usize) -> &'a [u8] {
        let start = self.pos.min(self.buf.len());
        let end = self.pos.saturating_add(len).min(self.buf.len());
        self.skip(len);
        &self.buf[start..end]
    }
}
