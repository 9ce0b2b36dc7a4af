//! System Exclusive Messages

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::DecodeError, reader::ByteCursor, vlq::read_vlq};

/// Which byte introduced the sysex event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SysexKind {
    /// `0xF0`, a complete message or the first packet of a split one
    F0,
    /// `0xF7`, a continuation packet or an "escape" carrying arbitrary bytes
    F7,
}

impl SysexKind {
    /// The byte this kind is written as
    pub fn as_u8(self) -> u8 {
        match self {
            SysexKind::F0 => 0xF0,
            SysexKind::F7 => 0xF7,
        }
    }
}

/// A midi system exclusive event, as stored in a track: the introducing byte and the
/// length-prefixed payload that followed it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SysexEvent {
    /// `0xF0` or `0xF7`
    kind: SysexKind,
    /// Payload, including any trailing `0xF7` the file stored
    data: Vec<u8>,
}

/// A manufacturer's ID. Can be either a 1 byte variant or 3 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ManufactureId {
    /// One byte ID
    OneByte(u8),
    /// Three byte ID, the first byte always being 0
    ThreeByte([u8; 3]),
}

impl SysexEvent {
    /// Creates a sysex event
    pub fn new(kind: SysexKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Reads the length-prefixed payload following the introducing byte
    pub(crate) fn decode(kind: SysexKind, cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let (length, _) = read_vlq(cursor)?;
        let data = cursor.read(length as usize)?.to_vec();

        Ok(Self { kind, data })
    }

    /// The introducing byte
    pub fn kind(&self) -> SysexKind {
        self.kind
    }

    /// Raw payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The manufacturer ID at the start of an `0xF0` message.
    ///
    /// `F7` packets have no ID of their own, and a payload too short to hold one yields `None`.
    pub fn manufacture_id(&self) -> Option<ManufactureId> {
        if self.kind != SysexKind::F0 {
            return None;
        }

        match self.data.as_slice() {
            [0x00, second, third, ..] => Some(ManufactureId::ThreeByte([0x00, *second, *third])),
            [0x00, ..] => None,
            [first, ..] => Some(ManufactureId::OneByte(*first)),
            [] => None,
        }
    }

    /// True if the payload finishes with the `0xF7` end-of-exclusive byte
    pub fn is_complete(&self) -> bool {
        self.data.last() == Some(&0xF7)
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::DecodeErrorKind, reader::ByteCursor};

    use super::{ManufactureId, SysexEvent, SysexKind};

    #[test]
    fn one_byte_manufature_id() {
        let sysex = SysexEvent::new(SysexKind::F0, vec![0x41, 0x10, 0x42, 0xF7]);

        assert_eq!(sysex.manufacture_id(), Some(ManufactureId::OneByte(0x41)));
        assert!(sysex.is_complete());
    }

    #[test]
    fn three_byte_manufature_id() {
        let sysex = SysexEvent::new(SysexKind::F0, vec![0x00, 0x20, 0x33, 0x01, 0xF7]);

        assert_eq!(
            sysex.manufacture_id(),
            Some(ManufactureId::ThreeByte([0x00, 0x20, 0x33]))
        );
    }

    #[test]
    fn escape_packets_have_no_manufacturer() {
        let sysex = SysexEvent::new(SysexKind::F7, vec![0x41, 0x10]);

        assert_eq!(sysex.kind().as_u8(), 0xF7);
        assert_eq!(SysexKind::F0.as_u8(), 0xF0);

        assert_eq!(sysex.manufacture_id(), None);
        assert!(!sysex.is_complete());
    }

    #[test]
    fn sys_ex_message_valid_parse() {
        let data = [0x04, 0x01, 0xFF, 0x00, 0xF7, 0x99];
        let mut cursor = ByteCursor::new(&data);

        let sysex = SysexEvent::decode(SysexKind::F0, &mut cursor).expect("Parse sysex payload");
        let expected = SysexEvent::new(SysexKind::F0, vec![0x01, 0xFF, 0x00, 0xF7]);

        assert_eq!(sysex, expected);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn sys_ex_message_invalid_parse_fails() {
        let data = [0x05, 0x01, 0xFF];
        let mut cursor = ByteCursor::new(&data);

        let err = SysexEvent::decode(SysexKind::F7, &mut cursor).expect_err("Payload cut short");
        assert_eq!(err.kind(), &DecodeErrorKind::UnexpectedEndOfData)
    }
}
