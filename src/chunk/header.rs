//! Header Chunk decoding: format, track count and time division

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::RawChunk;
use crate::{
    error::{DecodeError, DecodeErrorKind},
    reader::ByteCursor,
};

/// Bytes of the header payload that carry data, anything past them is ignored
pub const HEADER_LEN: usize = 6;

/// Header chunk data, including format, ntrks and division as 3 16 bit unsigned integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileInfo {
    /// The MIDI format
    format: Format,
    /// Number of tracks
    ntrks: u16,
    /// Meaning of delta-times
    division: Division,
}

impl FileInfo {
    /// Decodes an `MThd` payload.
    ///
    /// Payloads longer than six bytes are accepted and their tail ignored, shorter ones fail with
    /// [`DecodeErrorKind::HeaderTooShort`].
    pub fn decode(mut cursor: ByteCursor<'_>) -> Result<Self, DecodeError> {
        if cursor.remaining() < HEADER_LEN {
            return Err(cursor.error(DecodeErrorKind::HeaderTooShort(cursor.remaining())));
        }

        let format = cursor.read_u16_be()?;
        let ntrks = cursor.read_u16_be()?;
        let division = cursor.read_u16_be()?;

        Ok(Self::from((format, ntrks, division)))
    }

    /// The MIDI format
    pub fn format(&self) -> Format {
        self.format
    }

    /// Count of `MTrk` chunks the header announces
    pub fn num_tracks(&self) -> u16 {
        self.ntrks
    }

    /// Time division
    pub fn division(&self) -> Division {
        self.division
    }
}

impl From<(u16, u16, u16)> for FileInfo {
    fn from(value: (u16, u16, u16)) -> Self {
        let (format, ntrks, division) = value;

        Self {
            format: format.into(),
            ntrks,
            division: division.into(),
        }
    }
}

impl TryFrom<&[u8]> for FileInfo {
    type Error = DecodeError;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::decode(ByteCursor::new(value))
    }
}

impl TryFrom<&RawChunk<'_>> for FileInfo {
    type Error = DecodeError;
    fn try_from(value: &RawChunk<'_>) -> Result<Self, Self::Error> {
        let info = Self::decode(value.cursor()).map_err(|e| e.with_chunk(value.context()))?;
        if value.payload.len() > HEADER_LEN {
            tracing::debug!(
                extra = value.payload.len() - HEADER_LEN,
                "ignoring trailing header bytes"
            );
        }

        tracing::debug!(
            format = info.format.as_u16(),
            tracks = info.ntrks,
            division = ?info.division,
            "decoded header"
        );
        Ok(info)
    }
}

/// The overall organization of the MIDI file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    SingleTrack,
    /// The file contains one or more simultaneous tracks (or MIDI outputs) of a sequence
    MultiTrack,
    /// The file contains one or more sequentially independent single-track patterns
    MultiSequence,
    /// Any other value, kept as-is
    Unknown(u16),
}

impl Format {
    /// The raw format number
    pub fn as_u16(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::MultiTrack => 1,
            Format::MultiSequence => 2,
            Format::Unknown(raw) => raw,
        }
    }
}

impl From<u16> for Format {
    fn from(value: u16) -> Self {
        match value {
            0 => Format::SingleTrack,
            1 => Format::MultiTrack,
            2 => Format::MultiSequence,
            other => Format::Unknown(other),
        }
    }
}

/// The meaning of the delta-times in the MIDI sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Division {
    /// When bit 15 is a 0, bits 14-0 represent ticks per quarter note
    TicksPerQuarterNote(u16),
    /// When bit 15 is 1, bits 14-8 represent the negative SMPTE format,
    /// and bits 7-0 represent ticks per frame
    SmpteFrames(SmpteTicks),
}

/// Division defined by time-code-based time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteTicks {
    /// Frames per second, conventionally 24, 25, 29 (drop frame) or 30
    pub frames_per_second: u8,
    /// Ticks per frame
    pub ticks_per_frame: u8,
}

impl From<u16> for Division {
    fn from(value: u16) -> Self {
        const MASK: u16 = 0x7FFF;

        if value >> 15 == 0 {
            return Division::TicksPerQuarterNote(value & MASK);
        }

        let [frames, ticks_per_frame] = value.to_be_bytes();
        // High byte is the frame rate negated, in two's complement
        let frames_per_second = (frames as i8).unsigned_abs();

        Division::SmpteFrames(SmpteTicks {
            frames_per_second,
            ticks_per_frame,
        })
    }
}
