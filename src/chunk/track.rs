//! Track chunk decoding: the per-event state machine and the loop that assembles a track

use event::MidiEvent;
use meta::{MetaEvent, MetaValue, TextKind};
use sysex::{SysexEvent, SysexKind};
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::RawChunk;
use crate::{
    error::{DecodeError, DecodeErrorKind},
    reader::ByteCursor,
    vlq::read_vlq,
};

pub mod event;
pub mod meta;
pub mod sysex;

/// The last channel-voice status byte seen in a track.
///
/// Starts empty for every track. Only channel-voice events set it, meta and sysex events pass it
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunningStatus(Option<u8>);

impl RunningStatus {
    /// No status seen yet
    pub const NONE: Self = Self(None);

    /// The carried status byte, if any
    pub fn status(self) -> Option<u8> {
        self.0
    }
}

impl From<u8> for RunningStatus {
    fn from(status: u8) -> Self {
        Self(Some(status))
    }
}

/// Any event that may occur
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Event {
    /// A channel-voice MIDI event
    Midi(MidiEvent),
    /// A system exclusive event
    Sysex(SysexEvent),
    /// Specifies non-MIDI information useful to this format or to sequencers
    Meta(MetaEvent),
}

/// The result of decoding one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// The event itself
    pub event: Event,
    /// Bytes consumed, counting the status or type byte when one was present
    pub consumed: usize,
    /// Running status to hand to the next decode in the same track
    pub running_status: RunningStatus,
}

impl Event {
    /// Decodes one event at the cursor, whose delta-time has already been consumed.
    ///
    /// The first byte picks the branch: `0xFF` is meta, `0xF0`/`0xF7` sysex, `0x80..=0xEF` a
    /// channel-voice status, and anything below `0x80` is the first data byte of a channel-voice
    /// event reusing `running_status`.
    pub fn decode(
        cursor: &mut ByteCursor<'_>,
        running_status: RunningStatus,
    ) -> Result<DecodedEvent, DecodeError> {
        let start = cursor.position();
        let lead = cursor.peek_u8()?;

        let (event, running_status) = match lead {
            0xFF => {
                cursor.read_u8()?;
                (Event::Meta(MetaEvent::decode(cursor)?), running_status)
            }

            0xF0 | 0xF7 => {
                cursor.read_u8()?;
                let kind = if lead == 0xF0 {
                    SysexKind::F0
                } else {
                    SysexKind::F7
                };
                (Event::Sysex(SysexEvent::decode(kind, cursor)?), running_status)
            }

            0x80..=0xEF => {
                cursor.read_u8()?;
                (Event::Midi(MidiEvent::decode(lead, cursor)?), lead.into())
            }

            0x00..=0x7F => {
                // Status omitted, `lead` is already data and stays unread
                let status = running_status
                    .status()
                    .ok_or_else(|| cursor.error(DecodeErrorKind::NoRunningStatus))?;
                (Event::Midi(MidiEvent::decode(status, cursor)?), running_status)
            }

            other => return Err(cursor.error(DecodeErrorKind::InvalidStatus(other))),
        };

        Ok(DecodedEvent {
            event,
            consumed: cursor.position() - start,
            running_status,
        })
    }

    /// True for the end-of-track meta event
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Event::Meta(meta) if meta.is_end_of_track())
    }
}

/// A MIDI Event with a DeltaTime and an attached Event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MTrkEvent {
    /// Delta time is a variable-length representation of how much time to wait in ticks before the
    /// event follows.
    delta_time: u32,
    /// The event that occurs after the delta time is waited for
    event: Event,
}

impl MTrkEvent {
    /// Pairs an event with the ticks since the previous one
    pub fn new(delta_time: u32, event: Event) -> Self {
        Self { delta_time, event }
    }

    /// Ticks since the previous event in the track
    pub fn delta_time(&self) -> u32 {
        self.delta_time
    }

    /// The event
    pub fn event(&self) -> &Event {
        &self.event
    }
}

/// A track chunk's events, in wire order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    /// All associated track events to this chunk
    mtrk_events: Vec<MTrkEvent>,
}

impl Track {
    /// Assembles a track from the payload under `cursor`.
    ///
    /// Reads delta-time/event pairs until the end-of-track meta event. Running out of bytes
    /// before that fails with [`DecodeErrorKind::UnexpectedEndOfTrack`]. Bytes after the
    /// end-of-track event are ignored.
    pub fn decode(mut cursor: ByteCursor<'_>) -> Result<Self, DecodeError> {
        let mut mtrk_events = vec![];
        let mut running_status = RunningStatus::NONE;

        loop {
            if cursor.is_empty() {
                return Err(cursor.error(DecodeErrorKind::UnexpectedEndOfTrack));
            }

            let offset = cursor.offset();
            let (delta_time, _) = read_vlq(&mut cursor)?;
            if cursor.is_empty() {
                return Err(cursor.error(DecodeErrorKind::UnexpectedEndOfTrack));
            }
            let decoded = Event::decode(&mut cursor, running_status)?;
            running_status = decoded.running_status;

            trace!(offset, delta_time, event = ?decoded.event, "decoded event");

            let ended = decoded.event.is_end_of_track();
            mtrk_events.push(MTrkEvent::new(delta_time, decoded.event));

            if ended {
                break;
            }
        }

        if !cursor.is_empty() {
            warn!(
                offset = cursor.offset(),
                trailing = cursor.remaining(),
                "ignoring bytes after end of track"
            );
        }

        Ok(Self { mtrk_events })
    }

    /// Events in wire order
    pub fn events(&self) -> &[MTrkEvent] {
        &self.mtrk_events
    }

    /// Iterates the events in wire order
    pub fn iter(&self) -> core::slice::Iter<'_, MTrkEvent> {
        self.mtrk_events.iter()
    }

    /// Number of events, end-of-track included
    pub fn len(&self) -> usize {
        self.mtrk_events.len()
    }

    /// True if the track holds no events at all
    pub fn is_empty(&self) -> bool {
        self.mtrk_events.is_empty()
    }

    /// The first track name meta event's text
    pub fn name(&self) -> Option<String> {
        self.iter().find_map(|mtrk| match mtrk.event() {
            Event::Meta(meta) if meta.subtype() == MetaEvent::TRACK_NAME => match meta.value() {
                Ok(MetaValue::Text {
                    kind: TextKind::TrackName,
                    text,
                }) => Some(text),
                _ => None,
            },
            _ => None,
        })
    }

    /// Sum of every delta-time, saturating at `u64::MAX`
    pub fn duration_ticks(&self) -> u64 {
        self.iter()
            .fold(0u64, |total, mtrk| total.saturating_add(mtrk.delta_time as u64))
    }

    /// Events paired with their absolute tick, counted from the start of the track
    pub fn timed_events(&self) -> impl Iterator<Item = (u64, &Event)> + '_ {
        self.iter().scan(0u64, |tick, mtrk| {
            *tick = tick.saturating_add(mtrk.delta_time as u64);
            Some((*tick, mtrk.event()))
        })
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a MTrkEvent;
    type IntoIter = core::slice::Iter<'a, MTrkEvent>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl TryFrom<&[u8]> for Track {
    type Error = DecodeError;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::decode(ByteCursor::new(value))
    }
}

impl TryFrom<&RawChunk<'_>> for Track {
    type Error = DecodeError;
    fn try_from(value: &RawChunk<'_>) -> Result<Self, Self::Error> {
        let track = Self::decode(value.cursor()).map_err(|e| e.with_chunk(value.context()))?;
        debug!(chunk = value.index, events = track.len(), "decoded track");
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{
        event::MidiEvent, meta::MetaEvent, sysex::SysexKind, Event, MTrkEvent, RunningStatus,
        Track,
    };
    use crate::{error::DecodeErrorKind, reader::ByteCursor, vlq::to_midi_vlq};

    fn end_of_track() -> Event {
        Event::Meta(MetaEvent::new(MetaEvent::END_OF_TRACK, vec![]))
    }

    #[test]
    fn channel_voice_sets_running_status() {
        let data = [0x92, 0x40, 0x7F];
        let mut cursor = ByteCursor::new(&data);

        let decoded = Event::decode(&mut cursor, RunningStatus::NONE).expect("Note on");
        assert_eq!(
            decoded.event,
            Event::Midi(MidiEvent::new(0x92, vec![0x40, 0x7F]))
        );
        assert_eq!(decoded.consumed, 3);
        assert_eq!(decoded.running_status, RunningStatus::from(0x92));
    }

    #[test]
    fn one_byte_channel_messages() {
        let data = [0xC3, 0x05, 0xD3, 0x40];
        let mut cursor = ByteCursor::new(&data);

        let program = Event::decode(&mut cursor, RunningStatus::NONE).expect("Program change");
        assert_eq!(program.consumed, 2);
        let pressure =
            Event::decode(&mut cursor, program.running_status).expect("Channel pressure");
        assert_eq!(pressure.event, Event::Midi(MidiEvent::new(0xD3, vec![0x40])));
        assert!(cursor.is_empty());
    }

    #[test]
    fn data_byte_reuses_running_status() {
        let data = [0x41, 0x50];
        let mut cursor = ByteCursor::new(&data);

        let decoded =
            Event::decode(&mut cursor, RunningStatus::from(0x90)).expect("Implicit note on");
        assert_eq!(
            decoded.event,
            Event::Midi(MidiEvent::new(0x90, vec![0x41, 0x50]))
        );
        assert_eq!(decoded.consumed, 2);
        assert_eq!(decoded.running_status, RunningStatus::from(0x90));
    }

    #[test]
    fn data_byte_without_running_status_fails() {
        let data = [0x41, 0x50];
        let mut cursor = ByteCursor::with_base(&data, 0x341);

        let err = Event::decode(&mut cursor, RunningStatus::NONE).expect_err("Nothing to reuse");
        assert_eq!(err.kind(), &DecodeErrorKind::NoRunningStatus);
        assert_eq!(err.offset(), 0x341);
    }

    #[test]
    fn meta_and_sysex_leave_running_status_alone() {
        let data = [0xFF, 0x01, 0x02, b'h', b'i', 0xF0, 0x03, 0x7E, 0x00, 0xF7];
        let mut cursor = ByteCursor::new(&data);
        let status = RunningStatus::from(0xB1);

        let meta = Event::decode(&mut cursor, status).expect("Text meta event");
        assert_eq!(meta.consumed, 5);
        assert_eq!(meta.running_status, status);

        let sysex = Event::decode(&mut cursor, meta.running_status).expect("Sysex event");
        assert_eq!(sysex.consumed, 5);
        assert_eq!(sysex.running_status, status);
        match sysex.event {
            Event::Sysex(event) => {
                assert_eq!(event.kind(), SysexKind::F0);
                assert_eq!(event.data(), &[0x7E, 0x00, 0xF7]);
            }
            other => panic!("Expected sysex, got {other:?}"),
        }
    }

    #[test]
    fn long_meta_payload_uses_variable_length() {
        let text = vec![b'a'; 200];
        let mut data = vec![0xFF, 0x05];
        data.extend(to_midi_vlq(200));
        data.extend(&text);
        let mut cursor = ByteCursor::new(&data);

        let decoded = Event::decode(&mut cursor, RunningStatus::NONE).expect("Long lyric");
        assert_eq!(decoded.consumed, 4 + 200);
        assert_eq!(decoded.event, Event::Meta(MetaEvent::new(0x05, text)));
    }

    #[test]
    fn system_common_status_is_rejected() {
        let data = [0xF2, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);

        let err = Event::decode(&mut cursor, RunningStatus::NONE).expect_err("Song position");
        assert_eq!(err.kind(), &DecodeErrorKind::InvalidStatus(0xF2));
    }

    #[test]
    fn end_of_track_with_data_is_rejected() {
        let data = [0xFF, 0x2F, 0x01, 0x00];
        let mut cursor = ByteCursor::new(&data);

        let err = Event::decode(&mut cursor, RunningStatus::NONE).expect_err("EOT carries data");
        assert_eq!(err.kind(), &DecodeErrorKind::InvalidEndOfTrack(1));
    }

    #[test]
    fn track_decodes_running_status_sequence() {
        let data: &[u8] = &[
            0x00, 0x90, 0x40, 0x7F, //
            0x10, 0x41, 0x50, //
            0x81, 0x40, 0x80, 0x40, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ];

        let track = Track::try_from(&data[..]).expect("Decode track");
        let expected = vec![
            MTrkEvent::new(0, Event::Midi(MidiEvent::new(0x90, vec![0x40, 0x7F]))),
            MTrkEvent::new(0x10, Event::Midi(MidiEvent::new(0x90, vec![0x41, 0x50]))),
            MTrkEvent::new(192, Event::Midi(MidiEvent::new(0x80, vec![0x40, 0x00]))),
            MTrkEvent::new(0, end_of_track()),
        ];

        assert_eq!(track.events(), expected.as_slice());
        assert_eq!(track.duration_ticks(), 0x10 + 192);
    }

    #[test]
    fn track_without_end_of_track_fails() {
        let data: &[u8] = &[0x00, 0x90, 0x40, 0x7F];

        let err = Track::try_from(&data[..]).expect_err("No end of track");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfTrack);
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn track_cut_after_delta_time_fails() {
        let data: &[u8] = &[0x00, 0x90, 0x40, 0x7F, 0x00];

        let err = Track::try_from(data).expect_err("Delta-time with no event");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfTrack);
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn empty_track_fails() {
        let err = Track::try_from(&[0u8; 0][..]).expect_err("No events at all");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfTrack);
    }

    #[test]
    fn event_cut_short_is_end_of_data() {
        let data: &[u8] = &[0x00, 0x90, 0x40];

        let err = Track::try_from(&data[..]).expect_err("Note on missing velocity");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfData);
    }

    #[test]
    fn bytes_after_end_of_track_are_ignored() {
        let data: &[u8] = &[0x00, 0xFF, 0x2F, 0x00, 0x00, 0x90, 0x40, 0x7F];

        let track = Track::try_from(&data[..]).expect("Decode track");
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn track_name_and_timing() {
        let data: &[u8] = &[
            0x00, 0xFF, 0x03, 0x04, b'L', b'e', b'a', b'd', //
            0x60, 0x90, 0x3C, 0x40, //
            0x60, 0x3C, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ];

        let track = Track::try_from(&data[..]).expect("Decode track");
        assert_eq!(track.name().as_deref(), Some("Lead"));

        let ticks: Vec<u64> = track.timed_events().map(|(tick, _)| tick).collect();
        assert_eq!(ticks, vec![0, 96, 192, 192]);
    }
}
