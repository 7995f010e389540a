//! An in-memory [`VirtualDevice`] used by `engine` tests, standing in for a
//! real tun/tap interface.

use std::collections::VecDeque;
use std::os::fd::RawFd;

use crate::device::VirtualDevice;

/// A fake device backed by two queues: packets waiting to be "read" by the
/// loop, and packets the loop has "written" out.
#[derive(Default)]
pub struct FakeDevice {
    inbound: VecDeque<Vec<u8>>,
    pub written: Vec<Vec<u8>>,
}

impl FakeDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a packet for the loop to read next.
    pub fn push_inbound(&mut self, packet: Vec<u8>) {
        self.inbound.push_back(packet);
    }

    #[must_use]
    pub fn has_inbound(&self) -> bool {
        !self.inbound.is_empty()
    }
}

impl VirtualDevice for FakeDevice {
    fn raw_fd(&self) -> RawFd {
        -1
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let Some(packet) = self.inbound.pop_front() else {
            return Ok(0);
        };
        let n = packet.len().min(buf.len());
        buf[..n].copy_from_slice(&packet[..n]);
        Ok(n)
    }

    fn write_packet(&mut self, packet: &[u8]) -> std::io::Result<()> {
        self.written.push(packet.to_vec());
        Ok(())
    }
}
