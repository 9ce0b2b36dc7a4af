//! Bounds checked reading over MIDI bytes, and the sources those bytes can come from

use std::{convert::Infallible, io::Read};

use crate::error::{DecodeError, DecodeErrorKind};

/// Sequential reader over a borrowed byte buffer.
///
/// Every read checks the remaining length first and fails with
/// [`DecodeErrorKind::UnexpectedEndOfData`] instead of reading out of bounds; a failed read never
/// advances the cursor. A cursor may be given a `base` so that errors from a sub-slice (a chunk's
/// payload, say) still report offsets into the whole file.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    /// Bytes being read
    data: &'a [u8],
    /// Offset of the next unread byte within `data`
    position: usize,
    /// Absolute offset of `data[0]` in the original input
    base: usize,
}

impl<'a> ByteCursor<'a> {
    /// A cursor over `data`, reporting offsets relative to its start
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// A cursor over `data` where `data[0]` sits at absolute offset `base`
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self {
            data,
            position: 0,
            base,
        }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Absolute offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.base + self.position
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Builds an error of `kind` located at the current offset
    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.offset())
    }

    /// Returns the next `n` bytes without consuming them
    pub fn peek(&self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(self.error(DecodeErrorKind::UnexpectedEndOfData));
        }

        Ok(&self.data[self.position..self.position + n])
    }

    /// Returns the next `n` bytes and advances past them
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self.peek(n)?;
        self.position += n;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    /// Returns the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        Ok(self.peek(1)?[0])
    }

    /// Reads a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read(1)?[0])
    }

    /// Reads a big-endian u16
    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Reads a big-endian u32
    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Reads a big-endian u64, the width of a whole chunk header
    pub fn read_u64_be(&mut self) -> Result<u64, DecodeError> {
        self.read_array().map(u64::from_be_bytes)
    }
}

/// Trait that allows for different types to hand over a complete MIDI file as bytes
pub trait MidiReadable {
    /// Error type that may be returned while collecting the bytes
    type Error;
    /// Collects the full file into memory
    fn read_midi_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

impl MidiReadable for Vec<u8> {
    type Error = Infallible;
    fn read_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        Ok(self)
    }
}

impl MidiReadable for &[u8] {
    type Error = Infallible;
    fn read_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.to_vec())
    }
}

/// Wrapper struct to allow passing any [`Read`] implementor (a file, a socket, a
/// `Cursor`) to the `MidiReadable` trait
pub struct MidiSource<R>(pub R);

impl<R: Read> MidiReadable for MidiSource<R> {
    type Error = std::io::Error;
    fn read_midi_bytes(mut self) -> Result<Vec<u8>, Self::Error> {
        let mut bytes = vec![];
        self.0.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
