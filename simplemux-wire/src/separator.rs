//! The per-packet length separator: a 1- or 2-byte self-delimiting prefix.
//!
//! Byte 0, bit numbering MSB-first (bit 7 is the most significant bit):
//!
//! - bit 7 (**MBB**): always 0 on the wire. A receiver that reads a 1 here
//!   treats the whole datagram as malformed.
//! - bit 6 (**PFF**): 0 selects the short (1-byte) form, 1 selects the long
//!   (2-byte) form.
//! - bits 5..0: the high six bits of the length in the long form, or the
//!   whole length in the short form.

use crate::error::{SeparatorError, SeparatorResult};

const MBB_MASK: u8 = 0b1000_0000;
const PFF_MASK: u8 = 0b0100_0000;
const SHORT_LEN_MASK: u8 = 0b0011_1111;

/// Maximum length representable by the short (1-byte) form.
pub const SHORT_MAX: usize = 0x3F;
/// Maximum length representable by the long (2-byte) form.
pub const LONG_MAX: usize = 0x3FFF;

/// An encoded separator, either one or two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Short form: `L` fits in six bits.
    Short([u8; 1]),
    /// Long form: `L` needs up to fourteen bits.
    Long([u8; 2]),
}

impl Separator {
    /// Encode the length `len` of the payload that follows.
    ///
    /// Fails with [`SeparatorError::LengthOutOfRange`] if `len > LONG_MAX`.
    pub fn encode(len: usize) -> SeparatorResult<Self> {
        if len <= SHORT_MAX {
            #[allow(clippy::cast_possible_truncation)]
            Ok(Self::Short([len as u8]))
        } else if len <= LONG_MAX {
            #[allow(clippy::cast_possible_truncation)]
            let high = ((len >> 8) & 0x3F) as u8;
            #[allow(clippy::cast_possible_truncation)]
            let low = (len & 0xFF) as u8;
            Ok(Self::Long([PFF_MASK | high, low]))
        } else {
            Err(SeparatorError::LengthOutOfRange)
        }
    }

    /// Borrow the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Short(b) => b.as_slice(),
            Self::Long(b) => b.as_slice(),
        }
    }

    /// Number of bytes this separator occupies on the wire (1 or 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Separators are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Decode a separator from the start of `buf`.
///
/// Returns the decoded length `L` and the number of bytes consumed (1 or 2).
///
/// # Errors
///
/// - [`SeparatorError::BadSeparator`] if `buf` is empty or the first byte's
///   MBB bit is set.
/// - [`SeparatorError::TruncatedSeparator`] if the long form is selected but
///   only one byte remains in `buf`.
pub fn decode(buf: &[u8]) -> SeparatorResult<(usize, usize)> {
    let &b0 = buf.first().ok_or(SeparatorError::BadSeparator)?;
    if b0 & MBB_MASK != 0 {
        return Err(SeparatorError::BadSeparator);
    }
    if b0 & PFF_MASK == 0 {
        let len = usize::from(b0 & SHORT_LEN_MASK);
        Ok((len, 1))
    } else {
        let &b1 = buf.get(1).ok_or(SeparatorError::TruncatedSeparator)?;
        let len = (usize::from(b0 & SHORT_LEN_MASK) << 8) | usize::from(b1);
        Ok((len, 2))
    }
}

/// Number of bytes [`Separator::encode`] would use for a payload of length `len`.
#[must_use]
pub fn encoded_len(len: usize) -> usize {
    if len <= SHORT_MAX { 1 } else { 2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_short_lengths() {
        for len in 0..=SHORT_MAX {
            let sep = Separator::encode(len).unwrap();
            assert_eq!(sep.len(), 1);
            let (decoded_len, consumed) = decode(sep.as_bytes()).unwrap();
            assert_eq!(decoded_len, len);
            assert_eq!(consumed, 1);
        }
    }

    #[test]
    fn round_trip_long_boundaries() {
        for len in [64, 100, 1000, 16383] {
            let sep = Separator::encode(len).unwrap();
            assert_eq!(sep.len(), 2);
            let (decoded_len, consumed) = decode(sep.as_bytes()).unwrap();
            assert_eq!(decoded_len, len);
            assert_eq!(consumed, 2);
        }
    }

    #[test]
    fn long_form_maximum_is_0x7fff() {
        let sep = Separator::encode(16383).unwrap();
        assert_eq!(sep.as_bytes(), &[0x7F, 0xFF]);
    }

    #[test]
    fn hundred_byte_payload_uses_0x40_0x64() {
        let sep = Separator::encode(100).unwrap();
        assert_eq!(sep.as_bytes(), &[0x40, 0x64]);
    }

    #[test]
    fn forty_byte_payload_is_short_form_0x28() {
        let sep = Separator::encode(40).unwrap();
        assert_eq!(sep.as_bytes(), &[0x28]);
    }

    #[test]
    fn encode_rejects_out_of_range() {
        assert_eq!(
            Separator::encode(16384).unwrap_err(),
            SeparatorError::LengthOutOfRange
        );
    }

    #[test]
    fn decode_rejects_mbb_set() {
        assert_eq!(decode(&[0x80]).unwrap_err(), SeparatorError::BadSeparator);
        assert_eq!(decode(&[0xFF, 0x00]).unwrap_err(), SeparatorError::BadSeparator);
    }

    #[test]
    fn decode_rejects_empty_buffer() {
        assert_eq!(decode(&[]).unwrap_err(), SeparatorError::BadSeparator);
    }

    #[test]
    fn decode_rejects_truncated_long_form() {
        assert_eq!(
            decode(&[0x40]).unwrap_err(),
            SeparatorError::TruncatedSeparator
        );
    }

    #[test]
    fn long_form_reads_high_byte_unsigned() {
        // byte1 = 0xFF would be read as -1 by a signed-byte decoder; this
        // length byte is unsigned, so 0xFF means 255, not a negative length.
        let (len, consumed) = decode(&[0x40, 0xFF]).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(len, 0xFF);
    }
}
