//! The bundle demultiplexer: splits one received datagram back into its
//! constituent packets.

use alloc::vec::Vec;

use crate::error::DemuxError;
use crate::separator;

/// Result of [`demux`].
pub struct DemuxOutcome<'a> {
    /// Payloads successfully decoded, in wire order, before any structural
    /// error (if any) was hit.
    pub packets: Vec<&'a [u8]>,
    /// Set if a structural error aborted the rest of the datagram.
    pub error: Option<DemuxError>,
}

/// Split `datagram` into its constituent payloads.
///
/// On a structural error (`BadSeparator` or a declared length running past
/// the end of the datagram), decoding stops immediately: whatever was
/// decoded before the error is still returned, but nothing after it is.
/// This matches the wire invariant that every separator's MBB bit is 0 — a
/// 1 there means the remainder of the datagram cannot be trusted.
#[must_use]
pub fn demux(datagram: &[u8]) -> DemuxOutcome<'_> {
    let mut packets = Vec::new();
    let mut pos = 0;

    while pos < datagram.len() {
        let (len, consumed) = match separator::decode(&datagram[pos..]) {
            Ok(decoded) => decoded,
            Err(_) => {
                return DemuxOutcome {
                    packets,
                    error: Some(DemuxError::BadSeparator),
                };
            }
        };

        let payload_start = pos + consumed;
        let payload_end = payload_start + len;
        let Some(payload) = datagram.get(payload_start..payload_end) else {
            return DemuxOutcome {
                packets,
                error: Some(DemuxError::BadLength),
            };
        };

        packets.push(payload);
        pos = payload_end;
    }

    DemuxOutcome {
        packets,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::bundle::BundleBuffer;

    #[test]
    fn round_trip_through_bundle_buffer() {
        let payloads: [&[u8]; 3] = [&[1u8; 10], &[2u8; 64], &[3u8; 3]];
        let mut buf = BundleBuffer::new(1472);
        for p in payloads {
            buf.append_now(p);
        }
        let bundle = buf.drain();

        let outcome = demux(&bundle);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.packets, payloads);
    }

    #[test]
    fn malformed_first_byte_yields_nothing_and_bad_separator() {
        let datagram = [0x80, 0x01, 0x02];
        let outcome = demux(&datagram);
        assert!(outcome.packets.is_empty());
        assert_eq!(outcome.error, Some(DemuxError::BadSeparator));
    }

    #[test]
    fn bad_separator_aborts_but_keeps_prior_packets() {
        let mut datagram = Vec::new();
        datagram.extend_from_slice(&[0x02, 0xAA, 0xBB]); // one valid 2-byte packet
        datagram.push(0x80); // then a malformed separator
        let outcome = demux(&datagram);
        assert_eq!(outcome.packets, vec![&[0xAAu8, 0xBB][..]]);
        assert_eq!(outcome.error, Some(DemuxError::BadSeparator));
    }

    #[test]
    fn declared_length_past_end_aborts_with_bad_length() {
        let datagram = [0x05, 0x01, 0x02]; // declares 5 bytes, only 2 remain
        let outcome = demux(&datagram);
        assert!(outcome.packets.is_empty());
        assert_eq!(outcome.error, Some(DemuxError::BadLength));
    }

    #[test]
    fn empty_datagram_yields_nothing() {
        let outcome = demux(&[]);
        assert!(outcome.packets.is_empty());
        assert!(outcome.error.is_none());
    }
}
