//! Meta events, and their interpretation into typed values

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{DecodeError, DecodeErrorKind},
    reader::ByteCursor,
    vlq::read_vlq,
};

/// A meta event as found on the wire: subtype and raw payload.
///
/// The raw form is always kept. [`MetaEvent::value`] interprets it on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetaEvent {
    /// Meta event type byte
    subtype: u8,
    /// Payload
    data: Vec<u8>,
}

/// Errors interpreting a meta event's payload
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaError {
    /// A tempo of 0 microseconds per quarter note has no BPM
    #[error("tempo of 0 microseconds per quarter note")]
    InvalidTempo,
    /// The payload is shorter than the subtype requires
    #[error("meta event {subtype:#04x} needs {expected} bytes, found {found}")]
    PayloadTooShort {
        /// Meta event type byte
        subtype: u8,
        /// Bytes the subtype requires
        expected: usize,
        /// Bytes present
        found: usize,
    },
}

impl MetaEvent {
    /// Sequence number, tag 0x00
    pub const SEQUENCE_NUMBER: u8 = 0x00;
    /// Text metadata, tag 0x01
    pub const TEXT: u8 = 0x01;
    /// Copyright, tag 0x02
    pub const COPYRIGHT: u8 = 0x02;
    /// Track or sequence name, tag 0x03
    pub const TRACK_NAME: u8 = 0x03;
    /// Instrument name, tag 0x04
    pub const INSTRUMENT_NAME: u8 = 0x04;
    /// Lyric, tag 0x05
    pub const LYRIC: u8 = 0x05;
    /// Marker, tag 0x06
    pub const MARKER: u8 = 0x06;
    /// Cue point, tag 0x07
    pub const CUE_POINT: u8 = 0x07;
    /// MIDI channel prefix, tag 0x20
    pub const CHANNEL_PREFIX: u8 = 0x20;
    /// MIDI port, tag 0x21
    pub const PORT: u8 = 0x21;
    /// End of track, tag 0x2F
    pub const END_OF_TRACK: u8 = 0x2F;
    /// Tempo, tag 0x51
    pub const TEMPO: u8 = 0x51;
    /// SMPTE offset, tag 0x54
    pub const SMPTE_OFFSET: u8 = 0x54;
    /// Time signature, tag 0x58
    pub const TIME_SIGNATURE: u8 = 0x58;
    /// Key signature, tag 0x59
    pub const KEY_SIGNATURE: u8 = 0x59;
    /// Sequencer specific, tag 0x7F
    pub const SEQUENCER_SPECIFIC: u8 = 0x7F;

    /// Creates a meta event from its subtype and payload
    pub fn new(subtype: u8, data: Vec<u8>) -> Self {
        Self { subtype, data }
    }

    /// Reads subtype, variable-length length and payload; the `0xFF` prefix is already consumed
    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let subtype = cursor.read_u8()?;
        let length_offset = cursor.offset();
        let (length, _) = read_vlq(cursor)?;

        if subtype == Self::END_OF_TRACK && length != 0 {
            return Err(DecodeError::new(
                DecodeErrorKind::InvalidEndOfTrack(length),
                length_offset,
            ));
        }

        let data = cursor.read(length as usize)?.to_vec();
        Ok(Self { subtype, data })
    }

    /// Returns the specific event's tag
    pub fn subtype(&self) -> u8 {
        self.subtype
    }

    /// Raw payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True for end of track
    pub fn is_end_of_track(&self) -> bool {
        self.subtype == Self::END_OF_TRACK
    }

    /// Interprets the payload according to the subtype.
    ///
    /// Unrecognized subtypes come back as [`MetaValue::Unknown`]. Fixed size payloads longer than
    /// needed have their tail ignored, shorter ones fail with [`MetaError::PayloadTooShort`].
    pub fn value(&self) -> Result<MetaValue, MetaError> {
        let subtype = self.subtype;
        let data = self.data.as_slice();

        macro_rules! meta_value {
            ($len: literal, |$bytes: ident| $value: expr_2021) => {{
                let $bytes: [u8; $len] = fixed(subtype, data)?;
                Ok($value)
            }};
        }

        match subtype {
            Self::SEQUENCE_NUMBER => meta_value!(2, |bytes| MetaValue::SequenceNumber(
                u16::from_be_bytes(bytes)
            )),

            Self::TEXT..=Self::CUE_POINT => Ok(MetaValue::Text {
                kind: TextKind::from_subtype(subtype),
                text: String::from_utf8_lossy(data).into_owned(),
            }),

            Self::CHANNEL_PREFIX => meta_value!(1, |bytes| MetaValue::ChannelPrefix(bytes[0])),
            Self::PORT => meta_value!(1, |bytes| MetaValue::Port(bytes[0])),
            Self::END_OF_TRACK => Ok(MetaValue::EndOfTrack),

            Self::TEMPO => {
                let [high, mid, low]: [u8; 3] = fixed(subtype, data)?;
                let micros = u32::from_be_bytes([0, high, mid, low]);
                Ok(MetaValue::Tempo(Tempo::new(micros)?))
            }

            Self::SMPTE_OFFSET => meta_value!(5, |bytes| MetaValue::SmpteOffset(SmpteOffset {
                hours: bytes[0],
                minutes: bytes[1],
                seconds: bytes[2],
                frames: bytes[3],
                fractional_frames: bytes[4],
            })),

            Self::TIME_SIGNATURE => meta_value!(4, |bytes| MetaValue::TimeSignature(
                TimeSignature {
                    numerator: bytes[0],
                    denominator_power: bytes[1],
                    clocks_per_click: bytes[2],
                    notes_per_quarter: bytes[3],
                }
            )),

            Self::KEY_SIGNATURE => meta_value!(2, |bytes| MetaValue::KeySignature(KeySignature {
                sharps_flats: bytes[0] as i8,
                is_minor: bytes[1] != 0,
            })),

            Self::SEQUENCER_SPECIFIC => Ok(MetaValue::SequencerSpecific(self.data.clone())),

            _ => Ok(MetaValue::Unknown {
                subtype,
                data: self.data.clone(),
            }),
        }
    }
}

/// The first `N` payload bytes, or an error if there aren't that many
fn fixed<const N: usize>(subtype: u8, data: &[u8]) -> Result<[u8; N], MetaError> {
    let mut out = [0u8; N];
    let head = data.get(..N).ok_or(MetaError::PayloadTooShort {
        subtype,
        expected: N,
        found: data.len(),
    })?;

    out.copy_from_slice(head);
    Ok(out)
}

/// A meta event's payload, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetaValue {
    /// Sequence Number, tag 0x00
    SequenceNumber(u16),
    /// Any of the text events, tags 0x01 through 0x07
    Text {
        /// Which text event this is
        kind: TextKind,
        /// Best-effort decoding of the payload, invalid UTF-8 replaced
        text: String,
    },
    /// Midi Channel Prefix, tag 0x20
    ChannelPrefix(u8),
    /// MIDI port number, tag 0x21
    Port(u8),
    /// End of Track Identifier, tag 0x2F
    EndOfTrack,
    /// Tempo, tag 0x51
    Tempo(Tempo),
    /// Smpte Offset, tag 0x54
    SmpteOffset(SmpteOffset),
    /// Time signature, tag 0x58
    TimeSignature(TimeSignature),
    /// Key Signature, tag 0x59
    KeySignature(KeySignature),
    /// Sequencer Specific, tag 0x7f, opaque
    SequencerSpecific(Vec<u8>),
    /// A subtype with no interpretation
    Unknown {
        /// Meta event type byte
        subtype: u8,
        /// Raw payload
        data: Vec<u8>,
    },
}

/// Which text meta event a string came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextKind {
    /// Arbitrary text, tag 0x01
    Text,
    /// Copyright notice, tag 0x02
    Copyright,
    /// Track or sequence name, tag 0x03
    TrackName,
    /// Instrument name, tag 0x04
    InstrumentName,
    /// Lyric, tag 0x05
    Lyric,
    /// Marker, tag 0x06
    Marker,
    /// Cue point, tag 0x07
    CuePoint,
}

impl TextKind {
    /// Maps a text subtype to its kind, anything outside 0x02..=0x07 is plain text
    fn from_subtype(subtype: u8) -> Self {
        match subtype {
            MetaEvent::COPYRIGHT => TextKind::Copyright,
            MetaEvent::TRACK_NAME => TextKind::TrackName,
            MetaEvent::INSTRUMENT_NAME => TextKind::InstrumentName,
            MetaEvent::LYRIC => TextKind::Lyric,
            MetaEvent::MARKER => TextKind::Marker,
            MetaEvent::CUE_POINT => TextKind::CuePoint,
            _ => TextKind::Text,
        }
    }
}

/// A tempo, never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tempo {
    /// Microseconds per quarter note, 24 bits on the wire
    micros_per_quarter_note: u32,
}

impl Tempo {
    /// Microseconds in a minute
    const MICROS_PER_MINUTE: u32 = 60_000_000;

    /// Creates a tempo, rejecting 0
    pub fn new(micros_per_quarter_note: u32) -> Result<Self, MetaError> {
        if micros_per_quarter_note == 0 {
            return Err(MetaError::InvalidTempo);
        }

        Ok(Self {
            micros_per_quarter_note,
        })
    }

    /// Microseconds per quarter note
    pub fn micros_per_quarter_note(&self) -> u32 {
        self.micros_per_quarter_note
    }

    /// Beats per minute, rounded down
    pub fn bpm(&self) -> u32 {
        Self::MICROS_PER_MINUTE / self.micros_per_quarter_note
    }
}

/// A key signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeySignature {
    /// Sharps when positive, flats when negative
    pub sharps_flats: i8,
    /// True if minor, false if major
    pub is_minor: bool,
}

/// An SMPTE Offset, every field raw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteOffset {
    /// Hours of offset
    pub hours: u8,
    /// Minutes of offset
    pub minutes: u8,
    /// Seconds of offset
    pub seconds: u8,
    /// Frames of offset
    pub frames: u8,
    /// Hundredths of a frame
    pub fractional_frames: u8,
}

/// A Time Signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSignature {
    /// The time signature's numerator
    pub numerator: u8,
    /// The denominator as a power of two
    pub denominator_power: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note
    pub notes_per_quarter: u8,
}

impl TimeSignature {
    /// The actual denominator, `2^denominator_power`.
    ///
    /// Doubled step by step in 32 bits, so powers of 32 and above wrap to 0.
    pub fn denominator(&self) -> u32 {
        (0..self.denominator_power).fold(1u32, |denominator, _| denominator.wrapping_mul(2))
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::DecodeErrorKind, reader::ByteCursor};

    use super::{
        KeySignature, MetaError, MetaEvent, MetaValue, SmpteOffset, Tempo, TextKind,
        TimeSignature,
    };

    fn value(subtype: u8, data: &[u8]) -> Result<MetaValue, MetaError> {
        MetaEvent::new(subtype, data.to_vec()).value()
    }

    #[test]
    fn test_sequence_number() {
        assert_eq!(value(0x00, &[0x00, 0x01]), Ok(MetaValue::SequenceNumber(1)));
    }

    #[test]
    fn test_text_kinds() {
        for (subtype, kind) in [
            (0x01, TextKind::Text),
            (0x02, TextKind::Copyright),
            (0x03, TextKind::TrackName),
            (0x04, TextKind::InstrumentName),
            (0x05, TextKind::Lyric),
            (0x06, TextKind::Marker),
            (0x07, TextKind::CuePoint),
        ] {
            assert_eq!(
                value(subtype, b"Hello"),
                Ok(MetaValue::Text {
                    kind,
                    text: "Hello".to_string()
                })
            );
        }
    }

    #[test]
    fn text_is_best_effort() {
        assert_eq!(
            value(0x03, &[b'P', 0xFF, b'o']),
            Ok(MetaValue::Text {
                kind: TextKind::TrackName,
                text: "P\u{FFFD}o".to_string()
            })
        );
    }

    #[test]
    fn test_tempo_event() {
        let tempo = match value(0x51, &[0x07, 0xA1, 0x20]) {
            Ok(MetaValue::Tempo(tempo)) => tempo,
            other => panic!("Expected tempo, got {other:?}"),
        };

        assert_eq!(tempo.micros_per_quarter_note(), 500_000);
        assert_eq!(tempo.bpm(), 120);
    }

    #[test]
    fn zero_tempo_is_invalid() {
        assert_eq!(value(0x51, &[0x00, 0x00, 0x00]), Err(MetaError::InvalidTempo));
        assert_eq!(Tempo::new(0), Err(MetaError::InvalidTempo));
    }

    #[test]
    fn tempo_bpm_rounds_down() {
        let tempo = Tempo::new(0xFF_FFFF).expect("Slowest tempo");
        assert_eq!(tempo.bpm(), 3);
    }

    #[test]
    fn test_time_signature_event() {
        let result = value(0x58, &[0x06, 0x03, 0x24, 0x08]);
        let expected = TimeSignature {
            numerator: 6,
            denominator_power: 3,
            clocks_per_click: 36,
            notes_per_quarter: 8,
        };

        assert_eq!(result, Ok(MetaValue::TimeSignature(expected)));
        assert_eq!(expected.denominator(), 8);
    }

    #[test]
    fn denominator_wraps_like_repeated_doubling() {
        let signature = |denominator_power| TimeSignature {
            numerator: 4,
            denominator_power,
            clocks_per_click: 24,
            notes_per_quarter: 8,
        };

        assert_eq!(signature(0).denominator(), 1);
        assert_eq!(signature(31).denominator(), 0x8000_0000);
        assert_eq!(signature(32).denominator(), 0);
        assert_eq!(signature(255).denominator(), 0);
    }

    #[test]
    fn test_key_signature_event() {
        assert_eq!(
            value(0x59, &[0xFD, 0x01]),
            Ok(MetaValue::KeySignature(KeySignature {
                sharps_flats: -3,
                is_minor: true,
            }))
        );
    }

    #[test]
    fn test_smpte_offset_event() {
        assert_eq!(
            value(0x54, &[0x01, 0x20, 0x15, 0x10, 0x00]),
            Ok(MetaValue::SmpteOffset(SmpteOffset {
                hours: 1,
                minutes: 32,
                seconds: 21,
                frames: 16,
                fractional_frames: 0,
            }))
        );
    }

    #[test]
    fn port_and_channel_prefix() {
        assert_eq!(value(0x21, &[0x02]), Ok(MetaValue::Port(2)));
        assert_eq!(value(0x20, &[0x09]), Ok(MetaValue::ChannelPrefix(9)));
    }

    #[test]
    fn test_end_of_track_event() {
        let event = MetaEvent::new(0x2F, vec![]);

        assert!(event.is_end_of_track());
        assert_eq!(event.value(), Ok(MetaValue::EndOfTrack));
    }

    #[test]
    fn sequencer_specific_and_unknown_are_opaque() {
        assert_eq!(
            value(0x7F, &[0x00, 0x00, 0x41]),
            Ok(MetaValue::SequencerSpecific(vec![0x00, 0x00, 0x41]))
        );
        assert_eq!(
            value(0x99, &[0x01, 0x02, 0x03]),
            Ok(MetaValue::Unknown {
                subtype: 0x99,
                data: vec![0x01, 0x02, 0x03]
            })
        );
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(
            value(0x58, &[0x04, 0x02]),
            Err(MetaError::PayloadTooShort {
                subtype: 0x58,
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn longer_payloads_ignore_the_tail() {
        assert_eq!(value(0x21, &[0x03, 0xEE]), Ok(MetaValue::Port(3)));
    }

    #[test]
    fn decode_reads_variable_length_payload() {
        let data = [0x03, 0x05, b'P', b'i', b'a', b'n', b'o', 0x00];
        let mut cursor = ByteCursor::new(&data);

        let event = MetaEvent::decode(&mut cursor).expect("Track name");
        assert_eq!(event, MetaEvent::new(0x03, b"Piano".to_vec()));
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_out_of_space() {
        let data = [0x01, 0x05, b'H', b'i'];
        let mut cursor = ByteCursor::new(&data);

        let err = MetaEvent::decode(&mut cursor).expect_err("Payload cut short");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfData);
    }
}
