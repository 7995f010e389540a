#![doc = include_str!("../README.md")]

mod cid;
mod error;
mod ffi;
mod rohc;
mod trace;

pub use error::RohcError;
pub use rohc::{CompressOutcome, DecompressOutcome, RohcContext};

/// The packet header codec, tagged by whether compression is in effect.
///
/// A tagged variant rather than a trait object: there are exactly two
/// shapes (pass the packet through unchanged, or run it through librohc)
/// and no third is expected to show up.
pub enum HeaderCodec {
    /// Packets are multiplexed and demultiplexed unchanged.
    Passthrough,
    /// Packets are compressed/decompressed via ROHC before multiplexing.
    Rohc(RohcContext),
}

impl HeaderCodec {
    /// Build a passthrough codec.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::Passthrough
    }

    /// Build a ROHC codec, constructing the underlying compressor and
    /// decompressor.
    pub fn rohc(debug_level: u8) -> Result<Self, RohcError> {
        Ok(Self::Rohc(RohcContext::new(debug_level)?))
    }

    /// Compress (or pass through) a single IP packet read from the local
    /// virtual device, before it is appended to the outgoing bundle.
    #[must_use]
    pub fn compress(&mut self, ip_packet: &[u8]) -> CompressOutcome {
        match self {
            Self::Passthrough => CompressOutcome::Compressed(ip_packet.to_vec()),
            Self::Rohc(ctx) => ctx.compress(ip_packet),
        }
    }

    /// Decompress (or pass through) a single packet pulled out of an
    /// incoming bundle, before it is written to the local virtual device.
    #[must_use]
    pub fn decompress(&mut self, packet: &[u8]) -> DecompressOutcome {
        match self {
            Self::Passthrough => DecompressOutcome::Decompressed(packet.to_vec()),
            Self::Rohc(ctx) => ctx.decompress(packet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_compress_is_identity() {
        let mut codec = HeaderCodec::passthrough();
        let pkt = [1u8, 2, 3, 4, 5];
        match codec.compress(&pkt) {
            CompressOutcome::Compressed(bytes) => assert_eq!(bytes, pkt),
            _ => panic!("passthrough must always compress"),
        }
    }

    #[test]
    fn passthrough_decompress_is_identity() {
        let mut codec = HeaderCodec::passthrough();
        let pkt = [9u8, 8, 7];
        match codec.decompress(&pkt) {
            DecompressOutcome::Decompressed(bytes) => assert_eq!(bytes, pkt),
            _ => panic!("passthrough must always decompress"),
        }
    }
}
