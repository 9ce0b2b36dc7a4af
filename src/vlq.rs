//! MIDI variable-length quantities.
//!
//! Delta-times and meta/sysex lengths are stored 7 bits per byte, most significant group first.
//! Every byte but the last has its high bit set. The format caps a quantity at 4 bytes, which
//! bounds the value to `0x0FFF_FFFF`.

use crate::{
    error::{DecodeError, DecodeErrorKind},
    reader::ByteCursor,
};

/// Longest legal encoding
pub const MAX_VLQ_BYTES: usize = 4;

/// Largest value a legal encoding can carry
pub const MAX_VLQ_VALUE: u32 = 0x0FFF_FFFF;

/// Decodes a variable-length quantity, returning the value and how many bytes it took.
///
/// Running out of bytes mid-sequence, or a fourth byte that still has its continuation bit set,
/// fails with [`DecodeErrorKind::MalformedVarLen`] located at the first byte of the quantity.
pub fn read_vlq(cursor: &mut ByteCursor<'_>) -> Result<(u32, usize), DecodeError> {
    const MASK: u8 = 0x7F;

    let start = cursor.offset();
    let malformed = || DecodeError::new(DecodeErrorKind::MalformedVarLen, start);

    let mut result: u32 = 0;
    for consumed in 1..=MAX_VLQ_BYTES {
        let byte = cursor.read_u8().map_err(|_| malformed())?;

        result <<= 7;
        result |= (byte & MASK) as u32;

        if !msb_is_one(byte) {
            return Ok((result, consumed));
        }
    }

    Err(malformed())
}

/// Returns true if the msb of a byte is 1
fn msb_is_one(byte: u8) -> bool {
    byte >> 7 == 1
}

/// Goes backwards from a value to its variable length encoding
#[cfg(test)]
pub(crate) fn to_midi_vlq(mut value: u32) -> Vec<u8> {
    let mut bytes = Vec::new();

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if !bytes.is_empty() {
            byte |= 0x80;
        }

        bytes.push(byte);

        if value == 0 {
            break;
        }
    }

    bytes.reverse();
    bytes
}
