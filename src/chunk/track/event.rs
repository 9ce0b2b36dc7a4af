//! Channel-voice MIDI events and their typed view

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::DecodeError, reader::ByteCursor};

/// A channel-voice event: the effective status byte (channel in the low nibble) and its 1 or 2
/// data bytes. Events decoded through running status carry the inherited status here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MidiEvent {
    /// Status byte, `0x80..=0xEF`
    status: u8,
    /// Data bytes following the status
    data: Vec<u8>,
}

impl MidiEvent {
    /// Creates an event from its status and data bytes
    pub fn new(status: u8, data: Vec<u8>) -> Self {
        Self { status, data }
    }

    /// Number of data bytes a status takes
    pub fn data_len(status: u8) -> usize {
        match status & 0xF0 {
            0xC0 | 0xD0 => 1,
            _ => 2,
        }
    }

    /// Reads the data bytes for `status` from the cursor
    pub(crate) fn decode(status: u8, cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let data = cursor.read(Self::data_len(status))?.to_vec();
        Ok(Self { status, data })
    }

    /// The status byte, channel nibble included
    pub fn status(&self) -> u8 {
        self.status
    }

    /// The channel, 0 based
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// The data bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Interprets the event, `None` if the status and data don't form a channel-voice message
    pub fn message(&self) -> Option<ChannelMessage> {
        let channel = self.channel();

        let message = match (self.status >> 4, self.data.as_slice()) {
            (0x8, &[key, velocity]) => ChannelMessage::NoteOff(channel, NoteMeta { key, velocity }),
            (0x9, &[key, velocity]) => ChannelMessage::NoteOn(channel, NoteMeta { key, velocity }),
            (0xA, &[key, velocity]) => {
                ChannelMessage::PolyphonicKeyPressure(channel, NoteMeta { key, velocity })
            }
            (0xB, &[controller_number, new_value]) => ChannelMessage::ControlChange(
                channel,
                ControlChange {
                    controller_number,
                    new_value,
                },
            ),
            (0xC, &[program]) => ChannelMessage::ProgramChange(channel, program),
            (0xD, &[pressure]) => ChannelMessage::ChannelPressure(channel, pressure),
            (0xE, &[lsb, msb]) => {
                const MASK: u8 = 0x7F;
                let value = (((msb & MASK) as u16) << 7) | (lsb & MASK) as u16;
                ChannelMessage::PitchWheelChange(channel, value)
            }
            _ => return None,
        };

        Some(message)
    }
}

/// A MIDI channel-voice message, each carrying its channel first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelMessage {
    /// Turn Off event
    /// This message is sent when a note is released
    NoteOff(u8, NoteMeta),
    /// Turn On event
    /// This message is sent when a note is depressed
    NoteOn(u8, NoteMeta),
    /// Polyphonic Key Pressure
    /// This message is most often sent by pressing down a key after it "bottoms out"
    PolyphonicKeyPressure(u8, NoteMeta),
    /// Control change
    /// This message is sent when a controller value changes. Controllers include devices such as
    /// pedals and levers. Certain controller numbers are reserved.
    ControlChange(u8, ControlChange),
    /// Program change.
    /// This message is sent when the patch number changes
    ProgramChange(u8, u8),
    /// Channel Pressure
    /// This message is most often sent by pressing down on a key after it "bottoms out"
    ChannelPressure(u8, u8),
    /// Pitch Wheel Change
    /// This message is sent to indicate a change in the pitch wheel as measured by a fourteen bit
    /// value, 0x2000 being centered.
    PitchWheelChange(u8, u16),
}

/// A note's key and velocity (or pressure, for polyphonic key pressure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoteMeta {
    /// Note key
    pub key: u8,
    /// Note velocity
    pub velocity: u8,
}

/// Metadata for changing a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlChange {
    /// Controller number
    pub controller_number: u8,
    /// New value
    pub new_value: u8,
}
