//! Whole-file decoding: frame every chunk, decode the header, then assemble each track

use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{
        chunk_types::{TagDisplay, HEADER_CHUNK, TRACK_DATA_CHUNK},
        header::FileInfo,
        track::Track,
        ChunkReader, RawChunk,
    },
    error::{DecodeError, DecodeErrorKind},
    options::{DecodeOptions, UnknownChunkPolicy},
    reader::MidiReadable,
};

/// A chunk this crate doesn't decode, kept when [`UnknownChunkPolicy::Retain`] is set
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnknownChunk {
    /// The chunk's type tag
    pub tag: [u8; 4],
    /// Absolute offset of the payload
    pub offset: usize,
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl From<&RawChunk<'_>> for UnknownChunk {
    fn from(value: &RawChunk<'_>) -> Self {
        Self {
            tag: value.tag(),
            offset: value.offset,
            payload: value.payload.to_vec(),
        }
    }
}

/// A framed but not yet decoded file: the decoded header and every other chunk, borrowed
#[derive(Debug, Clone)]
pub struct RawMidi<'a> {
    /// The decoded `MThd` chunk
    info: FileInfo,
    /// Every chunk after the header, in file order
    chunks: Vec<RawChunk<'a>>,
}

impl<'a> RawMidi<'a> {
    /// Frames `bytes` into chunks and decodes the header, which must come first
    pub fn read(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = ChunkReader::new(bytes);

        let header = reader
            .next()
            .ok_or(DecodeError::new(DecodeErrorKind::MissingHeader, 0))??;
        if header.tag() != HEADER_CHUNK {
            return Err(DecodeError::new(DecodeErrorKind::MissingHeader, 0)
                .with_chunk(header.context()));
        }

        let info = FileInfo::try_from(&header)?;
        let chunks = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(Self { info, chunks })
    }

    /// The decoded header
    pub fn info(&self) -> FileInfo {
        self.info
    }

    /// Chunks following the header
    pub fn chunks(&self) -> &[RawChunk<'a>] {
        &self.chunks
    }

    /// Decodes every track chunk and applies the unknown chunk policy
    pub fn check_into_midi(self, options: &DecodeOptions) -> Result<Midi, DecodeError> {
        let mut track_chunks = Vec::with_capacity(self.info.num_tracks() as usize);
        let mut unknown_chunks = vec![];

        for chunk in &self.chunks {
            match chunk.tag() {
                HEADER_CHUNK => {
                    return Err(DecodeError::new(DecodeErrorKind::DuplicateHeader, chunk.offset)
                        .with_chunk(chunk.context()))
                }
                TRACK_DATA_CHUNK => track_chunks.push(chunk),
                tag => match options.unknown_chunks() {
                    UnknownChunkPolicy::Skip => warn!(
                        chunk = chunk.index,
                        tag = %TagDisplay(&tag),
                        length = chunk.payload.len(),
                        "skipping unknown chunk"
                    ),
                    UnknownChunkPolicy::Retain => unknown_chunks.push(UnknownChunk::from(chunk)),
                },
            }
        }

        if track_chunks.len() != self.info.num_tracks() as usize {
            warn!(
                declared = self.info.num_tracks(),
                found = track_chunks.len(),
                "track count doesn't match header"
            );
        }

        let tracks = decode_tracks(&track_chunks, options.parallel())?;

        Ok(Midi {
            info: self.info,
            tracks,
            unknown_chunks,
        })
    }
}

/// Decodes each track chunk, in parallel when requested and the `parallel` feature is on.
/// Output order always matches chunk order.
fn decode_tracks(chunks: &[&RawChunk<'_>], parallel: bool) -> Result<Vec<Track>, DecodeError> {
    debug!(tracks = chunks.len(), parallel, "decoding tracks");

    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;

            return chunks
                .par_iter()
                .map(|chunk| Track::try_from(*chunk))
                .collect();
        }
    }

    chunks.iter().map(|chunk| Track::try_from(*chunk)).collect()
}

/// A decoded MIDI file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Midi {
    /// Header information
    info: FileInfo,
    /// Tracks in file order
    tracks: Vec<Track>,
    /// Unrecognized chunks, only filled under [`UnknownChunkPolicy::Retain`]
    unknown_chunks: Vec<UnknownChunk>,
}

/// Failure loading a file from a [`MidiReadable`] source
#[derive(Debug, Error)]
pub enum LoadError<E> {
    /// The source couldn't produce its bytes
    #[error("failed to read MIDI bytes from source")]
    Source(#[source] E),
    /// The bytes didn't decode
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Midi {
    /// Decodes a complete file with default options
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with(bytes, &DecodeOptions::default())
    }

    /// Decodes a complete file
    pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        RawMidi::read(bytes)?.check_into_midi(options)
    }

    /// Collects a source's bytes and decodes them with default options
    pub fn load<S: MidiReadable>(source: S) -> Result<Self, LoadError<S::Error>> {
        let bytes = source.read_midi_bytes().map_err(LoadError::Source)?;
        Ok(Self::decode(&bytes)?)
    }

    /// Header information
    pub fn info(&self) -> FileInfo {
        self.info
    }

    /// Tracks in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Unrecognized chunks that were retained
    pub fn unknown_chunks(&self) -> &[UnknownChunk] {
        &self.unknown_chunks
    }

    /// Splits the file into header and tracks
    pub fn into_parts(self) -> (FileInfo, Vec<Track>) {
        (self.info, self.tracks)
    }
}
