use std::borrow::Cow;

use cesu8::{Cesu8DecodingError, from_java_cesu8};

use crate::error::{ParseError, ParseResult};

/// Bounds-checked big-endian cursor over an immutable class buffer.
#[derive(Clone, Debug)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor to an absolute offset previously obtained from
    /// [`ByteReader::position`] or computed from a declared length.
    pub(crate) fn seek(&mut self, pos: usize) -> ParseResult<()> {
        if pos > self.data.len() {
            return Err(ParseError::TruncatedInput {
                offset: self.pos,
                needed: pos.saturating_sub(self.pos),
                remaining: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn skip(&mut self, len: usize) -> ParseResult<()> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn read_u1(&mut self) -> ParseResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u2(&mut self) -> ParseResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u4(&mut self) -> ParseResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_i4(&mut self) -> ParseResult<i32> {
        Ok(self.read_u4()? as i32)
    }

    pub(crate) fn read_u64(&mut self) -> ParseResult<u64> {
        let high = self.read_u4()? as u64;
        let low = self.read_u4()? as u64;
        Ok((high << 32) | low)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> ParseResult<&'a [u8]> {
        self.take(len)
    }

    /// Read a length-prefixed constant string body encoded as modified UTF-8.
    pub(crate) fn read_utf8(&mut self, len: usize) -> ParseResult<String> {
        let offset = self.pos;
        let bytes = self.take(len)?;
        decode_modified_utf8(bytes).map_err(|err| {
            ParseError::malformed(format!("invalid modified UTF-8 at offset {offset}: {err}"))
        })
    }

    fn take(&mut self, len: usize) -> ParseResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(ParseError::TruncatedInput {
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

/// Decode JVM modified UTF-8: `C0 80` encodes NUL and supplementary characters
/// arrive as two three-byte surrogate halves.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Cesu8DecodingError> {
    from_java_cesu8(bytes).map(Cow::into_owned)
}
