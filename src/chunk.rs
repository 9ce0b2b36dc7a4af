//! Chunk framing, and classification of framed chunks into parsed types

use header::FileInfo;
use track::Track;

use crate::{
    chunk::chunk_types::{HEADER_CHUNK, TRACK_DATA_CHUNK},
    error::{ChunkContext, DecodeError, DecodeErrorKind},
    reader::ByteCursor,
    Chunk,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod chunk_types;
pub mod header;
pub mod track;

/// A framed chunk: its header plus a borrowed view of exactly `length` payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Type tag and declared length
    pub chunk: Chunk,
    /// The payload, always exactly `chunk.len()` bytes
    pub payload: &'a [u8],
    /// Absolute offset of the first payload byte
    pub offset: usize,
    /// Position of this chunk in the file
    pub index: usize,
}

impl<'a> RawChunk<'a> {
    /// The chunk's type tag
    pub fn tag(&self) -> [u8; 4] {
        self.chunk.chunk_type
    }

    /// Diagnostic context for errors raised inside this chunk
    pub fn context(&self) -> ChunkContext {
        ChunkContext {
            index: self.index,
            tag: self.chunk.chunk_type,
        }
    }

    /// A cursor over the payload that reports absolute offsets
    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::with_base(self.payload, self.offset)
    }
}

/// Lazily frames a byte buffer into chunks.
///
/// Each item is one chunk, in file order. The sequence ends when the input is exhausted, and
/// stops for good after yielding an error since the next chunk boundary can't be known.
#[derive(Debug)]
pub struct ChunkReader<'a> {
    /// Position in the input
    cursor: ByteCursor<'a>,
    /// Index the next chunk will get
    index: usize,
    /// Set once an error was yielded
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    /// Frames the chunks of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            index: 0,
            failed: false,
        }
    }

    /// Bytes not yet framed
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Reads the 8 byte header and the payload it declares
    fn read_chunk(&mut self) -> Result<RawChunk<'a>, DecodeError> {
        let chunk: Chunk = self.cursor.read_u64_be()?.into();
        let context = ChunkContext {
            index: self.index,
            tag: chunk.chunk_type,
        };

        let available = self.cursor.remaining();
        if chunk.len() > available {
            let kind = DecodeErrorKind::TruncatedChunk {
                declared: chunk.declared_length(),
                available,
            };
            return Err(self.cursor.error(kind).with_chunk(context));
        }

        let offset = self.cursor.offset();
        let payload = self.cursor.read(chunk.len())?;
        let index = self.index;
        self.index += 1;

        Ok(RawChunk {
            chunk,
            payload,
            offset,
            index,
        })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_empty() {
            return None;
        }

        let chunk = self.read_chunk();
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

impl core::iter::FusedIterator for ChunkReader<'_> {}

/// Represents a parsed MIDI Chunk with its associated data.
/// A parsed chunk is classified based on its type, such as header or track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParsedChunk {
    /// A header chunk
    Header(FileInfo),
    /// A track chunk,
    Track(Track),
}

impl TryFrom<RawChunk<'_>> for ParsedChunk {
    type Error = DecodeError;
    fn try_from(value: RawChunk<'_>) -> Result<Self, Self::Error> {
        match value.chunk.chunk_type {
            HEADER_CHUNK => Ok(ParsedChunk::Header(FileInfo::try_from(&value)?)),
            TRACK_DATA_CHUNK => Ok(ParsedChunk::Track(Track::try_from(&value)?)),
            tag => Err(
                DecodeError::new(DecodeErrorKind::UnknownChunkType(tag), value.offset)
                    .with_chunk(value.context()),
            ),
        }
    }
}
