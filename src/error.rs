//! Errors produced while decoding a MIDI byte stream

use thiserror::Error;

use crate::chunk::chunk_types::TagDisplay;

/// Identifies the chunk a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkContext {
    /// Zero based position of the chunk in the file, the header being chunk 0
    pub index: usize,
    /// The chunk's type tag
    pub tag: [u8; 4],
}

impl core::fmt::Display for ChunkContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write![f, "chunk #{} ({})", self.index, TagDisplay(&self.tag)]
    }
}

/// The kind of failure a decode can run into
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A read ran past the end of the available bytes
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    /// A chunk declared more payload than the input holds
    #[error("chunk declares {declared} bytes but only {available} remain")]
    TruncatedChunk {
        /// Length from the chunk header
        declared: u32,
        /// Bytes actually left after the chunk header
        available: usize,
    },
    /// The `MThd` payload can't hold format, track count and division
    #[error("header chunk is {0} bytes, at least 6 are required")]
    HeaderTooShort(usize),
    /// A variable-length quantity ran longer than 4 bytes or was cut off
    #[error("malformed variable-length quantity")]
    MalformedVarLen,
    /// A data byte appeared where a status was needed and no status was carried
    #[error("no running status for implicit MIDI event")]
    NoRunningStatus,
    /// A track ran out of bytes before its end-of-track meta event
    #[error("track ended without an end-of-track meta event")]
    UnexpectedEndOfTrack,
    /// A chunk type that isn't decoded by this crate, callers may skip it and keep going
    #[error("unknown chunk type {}", TagDisplay(.0))]
    UnknownChunkType([u8; 4]),
    /// The stream doesn't start with an `MThd` chunk
    #[error("missing MThd header chunk")]
    MissingHeader,
    /// A second `MThd` chunk appeared after the header
    #[error("duplicate MThd header chunk")]
    DuplicateHeader,
    /// A system status byte that has no meaning inside a track
    #[error("invalid status byte {0:#04x} in track data")]
    InvalidStatus(u8),
    /// An end-of-track meta event that carries data
    #[error("end-of-track meta event has length {0}, expected 0")]
    InvalidEndOfTrack(u32),
}

/// A decode failure, with the byte offset it was detected at and the enclosing chunk if known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// What went wrong
    kind: DecodeErrorKind,
    /// Absolute offset into the input
    offset: usize,
    /// The chunk being decoded, if any
    chunk: Option<ChunkContext>,
}

impl DecodeError {
    /// Create a decode error at an absolute offset
    pub const fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            chunk: None,
        }
    }

    /// Attach chunk context, keeping any context that was already set closer to the failure
    pub fn with_chunk(mut self, chunk: ChunkContext) -> Self {
        self.chunk.get_or_insert(chunk);
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Returns the absolute byte offset where the error occurred
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the chunk the error occurred in
    pub fn chunk(&self) -> Option<ChunkContext> {
        self.chunk
    }

    /// True for the one recoverable condition, an unrecognized chunk type
    pub fn is_unknown_chunk(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::UnknownChunkType(_))
    }
}

// `Display` already renders the kind, so it isn't reported again as a source
impl core::error::Error for DecodeError {}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(chunk) = &self.chunk {
            write![f, "{chunk}, "]?;
        }
        write![f, "offset {:#x}: {}", self.offset, self.kind]
    }
}

#[cfg(test)]
mod tests {
    use core::error::Error;

    use super::{ChunkContext, DecodeError, DecodeErrorKind};

    #[test]
    fn display_includes_chunk_and_offset() {
        let err = DecodeError::new(DecodeErrorKind::NoRunningStatus, 0x341).with_chunk(
            ChunkContext {
                index: 2,
                tag: *b"MTrk",
            },
        );

        assert_eq!(
            err.to_string(),
            "chunk #2 (MTrk), offset 0x341: no running status for implicit MIDI event"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn inner_chunk_context_wins() {
        let inner = ChunkContext {
            index: 1,
            tag: *b"MTrk",
        };
        let outer = ChunkContext {
            index: 9,
            tag: *b"XXXX",
        };

        let err = DecodeError::new(DecodeErrorKind::UnexpectedEndOfData, 4)
            .with_chunk(inner)
            .with_chunk(outer);

        assert_eq!(err.chunk(), Some(inner))
    }

    #[test]
    fn unknown_chunk_is_recoverable() {
        let err = DecodeError::new(DecodeErrorKind::UnknownChunkType(*b"XFIH"), 0);

        assert!(err.is_unknown_chunk());
        assert_eq!(err.to_string(), "offset 0x0: unknown chunk type XFIH");
    }
}
