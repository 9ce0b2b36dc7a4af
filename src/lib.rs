//! # smf_decode
//!
//! A minimal dependency Standard MIDI File (SMF) decoder. The crate turns an in-memory byte
//! buffer into a [`FileInfo`] header plus an ordered list of [`Track`]s, each an ordered list of
//! `(delta_time, Event)` pairs.
//!
//! ## Overview
//!
//! MIDI files are structured as a series of chunks. Each chunk contains a 4-character ASCII
//! type identifier and a 32-bit big-endian length that specifies how many bytes of data follow.
//! The `MThd` chunk carries the file header, every `MTrk` chunk carries a stream of events whose
//! delta-times and lengths are encoded as MIDI variable-length quantities. Channel-voice events
//! may omit their status byte ("running status"), so decoding a track is a stateful scan.
//!
//! - **Minimal dependencies**: `thiserror` for errors and `tracing` for diagnostics. Opt in to
//!   serde support with the `serde` feature, and to multi-threaded track decoding with the
//!   `parallel` feature.
//! - **Borrowing reader**: every read goes through a bounds checked [`reader::ByteCursor`], so
//!   malformed input surfaces as a [`DecodeError`] carrying the byte offset and chunk that failed.
//!
//! ## Example Usage
//!
//! ```rust
//! use smf_decode::{chunk::track::Event, Division, Midi};
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 0x60,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 8,
//!     0x00, 0x90, 0x3C, 0x40,
//!     0x60, 0xFF, 0x2F, 0x00,
//! ];
//!
//! let midi = Midi::decode(&bytes).expect("Decode a single track file");
//! assert_eq!(midi.info().division(), Division::TicksPerQuarterNote(96));
//!
//! let track = &midi.tracks()[0];
//! assert!(matches!(track.events()[0].event(), Event::Midi(_)));
//! assert_eq!(track.duration_ticks(), 96);
//! ```
//!
//! Chunks can also be consumed lazily, one at a time, with [`chunk::ChunkReader`] and
//! [`chunk::ParsedChunk::try_from`].
//!
//! ## Library Structure
//!
//! - **[`reader`]**: the [`reader::ByteCursor`] every decoder reads through, and the
//!   [`reader::MidiReadable`] trait for sources that can hand over a whole file.
//! - **[`vlq`]**: MIDI variable-length quantities.
//! - **[`chunk`]**: chunk framing and classification, with `header` and `track` submodules
//!   holding the header decoder, the event decoder and the track assembler.
//! - **[`midi`]**: the whole-file driver tying everything together.
//! - **[`options`]** and **[`error`]**: decode configuration and the error taxonomy.

pub mod chunk;
pub mod error;
pub mod midi;
pub mod options;
pub mod reader;
pub mod vlq;

pub use chunk::header::{Division, FileInfo, Format, SmpteTicks};
pub use chunk::track::{Event, MTrkEvent, Track};
pub use error::{ChunkContext, DecodeError, DecodeErrorKind};
pub use midi::{LoadError, Midi, RawMidi, UnknownChunk};
pub use options::{DecodeOptions, UnknownChunkPolicy};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a raw MIDI Chunk header.
/// A MIDI Chunk consists of a 4-byte type identifier and a 32-bit unsigned integer specifying the
/// length of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// 4 byte chunk type, usually but not necessarily printable ASCII
    pub chunk_type: [u8; 4],
    /// Length of the data that follows
    length: u32,
}

impl Chunk {
    /// Creates a chunk header from its type tag and declared length
    pub const fn new(chunk_type: [u8; 4], length: u32) -> Self {
        Self { chunk_type, length }
    }

    /// Gets the length of the chunk as a usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns if the chunk has no attributed data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The declared length exactly as it appeared on the wire
    pub fn declared_length(&self) -> u32 {
        self.length
    }
}

impl From<u64> for Chunk {
    fn from(value: u64) -> Self {
        let high = (value >> 32) as u32;
        let low = value as u32;

        Self::new(high.to_be_bytes(), low)
    }
}
