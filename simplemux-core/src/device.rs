//! The local virtual network device abstraction.
//!
//! Kept as a trait so the event loop in [`crate::engine`] can be driven by
//! an in-memory fake in tests without opening a real tun/tap device — the
//! same reason `iptr-decoder`'s `HandlePacket` trait exists as a seam
//! between decoding logic and a concrete sink.

use std::os::fd::RawFd;

/// A packet-oriented local device: a tun (L3) or tap (L2) interface opened
/// in no-packet-information mode, or a test double standing in for one.
pub trait VirtualDevice {
    /// The raw file descriptor to register with the poller.
    fn raw_fd(&self) -> RawFd;

    /// Read one packet. Must only be called once the descriptor has been
    /// reported readable; must not block otherwise.
    fn read_packet(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Write one packet.
    fn write_packet(&mut self, packet: &[u8]) -> std::io::Result<()>;
}
