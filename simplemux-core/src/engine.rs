//! The event loop: single-threaded, one suspension point per iteration,
//! dispatching to the virtual device, the network socket, or the period
//! timer.

use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use mio::net::UdpSocket;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use simplemux_rohc::{CompressOutcome, DecompressOutcome};
use simplemux_wire::error::DemuxError;

use crate::context::{now_us, OptimizerContext};
use crate::device::VirtualDevice;
use crate::error::EngineError;
use crate::log_sink::{Action, Kind, LogEvent, Peer, Reason};

const DEVICE: Token = Token(0);
const SOCKET: Token = Token(1);

/// Drives the optimizer for one of the two peers: a virtual device, a
/// socket connected to the peer, and the runtime state in
/// [`OptimizerContext`].
pub struct Engine<D: VirtualDevice> {
    device: D,
    socket: UdpSocket,
    poll: Poll,
    events: Events,
    ctx: OptimizerContext,
    scratch: Vec<u8>,
}

impl<D: VirtualDevice> Engine<D> {
    /// Register `device` and `socket` with a fresh poller.
    pub fn new(mut device: D, mut socket: UdpSocket, ctx: OptimizerContext) -> io::Result<Self> {
        let poll = Poll::new()?;
        poll.registry().register(
            &mut SourceFd(&device.raw_fd()),
            DEVICE,
            Interest::READABLE,
        )?;
        poll.registry()
            .register(&mut socket, SOCKET, Interest::READABLE)?;
        let scratch = vec![0u8; ctx.config.mtu];
        Ok(Self {
            device,
            socket,
            poll,
            events: Events::with_capacity(2),
            ctx,
            scratch,
        })
    }

    /// Run forever. Returns only on an unrecoverable error: an
    /// unrecoverable wait failure is the only runtime error that unwinds
    /// the process.
    pub fn run(&mut self) -> Result<(), EngineError> {
        loop {
            self.run_once()?;
        }
    }

    /// One iteration of the loop. Exposed separately from [`Self::run`] so
    /// tests can drive the dispatch logic deterministically without an
    /// actual blocking wait.
    pub fn run_once(&mut self) -> Result<(), EngineError> {
        let remaining_us = self.ctx.clock.time_until_period();
        let timeout = Duration::from_micros(remaining_us);

        // `Poll::poll` retries internally on `EINTR`; a signal during the
        // wait never surfaces here as an error.
        if let Err(err) = self.poll.poll(&mut self.events, Some(timeout)) {
            if err.kind() == ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(EngineError::Poll(err));
        }

        let mut device_ready = false;
        let mut socket_ready = false;
        for event in self.events.iter() {
            match event.token() {
                DEVICE => device_ready = true,
                SOCKET => socket_ready = true,
                _ => {}
            }
        }

        // Network takes priority when both are ready.
        if socket_ready {
            self.dispatch_socket_readable()?;
        } else if device_ready {
            self.dispatch_device_readable()?;
        } else {
            self.dispatch_timeout();
        }
        Ok(())
    }

    /// Read one datagram from the socket; demultiplex or forward verbatim.
    pub fn dispatch_socket_readable(&mut self) -> Result<(), EngineError> {
        let mut buf = vec![0u8; self.ctx.config.mtu.max(self.scratch.len())];
        let (n, from) = match self.socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
            Err(err) => return Err(EngineError::SocketRead(err)),
        };
        let datagram = &buf[..n];
        let from_port = match from {
            SocketAddr::V4(addr) => addr.port(),
            SocketAddr::V6(_) => 0,
        };

        if from_port == self.ctx.config.mux_port {
            self.handle_muxed_datagram(datagram, from)
        } else {
            self.handle_native_passthrough(datagram, from)
        }
    }

    fn handle_muxed_datagram(
        &mut self,
        datagram: &[u8],
        from: SocketAddr,
    ) -> Result<(), EngineError> {
        let outcome = simplemux_wire::demux(datagram);
        let counter = self.ctx.next_rec_counter();
        self.log(LogEvent {
            timestamp_us: now_us(),
            action: Action::Rec,
            kind: Kind::Muxed,
            bytes: datagram.len(),
            counter,
            peer: Some(peer_from(from, false)),
            reasons: &[],
        });

        for payload in outcome.packets {
            match self.ctx.codec.decompress(payload) {
                DecompressOutcome::Decompressed(ip_packet) => {
                    self.device
                        .write_packet(&ip_packet)
                        .map_err(EngineError::DeviceWrite)?;
                    let counter = self.ctx.next_rec_counter();
                    self.log(LogEvent {
                        timestamp_us: now_us(),
                        action: Action::Forward,
                        kind: Kind::Demuxed,
                        bytes: ip_packet.len(),
                        counter,
                        peer: None,
                        reasons: &[],
                    });
                }
                DecompressOutcome::FeedbackOnly => {
                    let counter = self.ctx.next_rec_counter();
                    self.log(LogEvent {
                        timestamp_us: now_us(),
                        action: Action::Rec,
                        kind: Kind::RohcFeedback,
                        bytes: payload.len(),
                        counter,
                        peer: None,
                        reasons: &[],
                    });
                }
                DecompressOutcome::Error => {
                    let counter = self.ctx.next_rec_counter();
                    self.log(LogEvent {
                        timestamp_us: now_us(),
                        action: Action::Error,
                        kind: Kind::DecompFailed,
                        bytes: payload.len(),
                        counter,
                        peer: None,
                        reasons: &[],
                    });
                }
            }
        }

        if let Some(error) = outcome.error {
            let kind = match error {
                DemuxError::BadSeparator => Kind::BadSeparator,
                DemuxError::BadLength => Kind::DemuxBadLength,
            };
            let counter = self.ctx.next_rec_counter();
            self.log(LogEvent {
                timestamp_us: now_us(),
                action: Action::Error,
                kind,
                bytes: datagram.len(),
                counter,
                peer: None,
                reasons: &[],
            });
        }
        Ok(())
    }

    fn handle_native_passthrough(
        &mut self,
        datagram: &[u8],
        from: SocketAddr,
    ) -> Result<(), EngineError> {
        self.device
            .write_packet(datagram)
            .map_err(EngineError::DeviceWrite)?;
        let counter = self.ctx.next_rec_counter();
        self.log(LogEvent {
            timestamp_us: now_us(),
            action: Action::Forward,
            kind: Kind::Native,
            bytes: datagram.len(),
            counter,
            peer: Some(peer_from(from, false)),
            reasons: &[],
        });
        Ok(())
    }

    /// Read one packet from the virtual device; compress, append, and flush
    /// per any of the triggers.
    pub fn dispatch_device_readable(&mut self) -> Result<(), EngineError> {
        let n = self
            .device
            .read_packet(&mut self.scratch)
            .map_err(EngineError::DeviceRead)?;
        if n == 0 {
            return Ok(());
        }
        let packet = self.scratch[..n].to_vec();

        let payload = match self.ctx.codec.compress(&packet) {
            CompressOutcome::Compressed(bytes) => bytes,
            CompressOutcome::Segmented(bytes) => {
                let counter = self.ctx.next_rec_counter();
                self.log(LogEvent {
                    timestamp_us: now_us(),
                    action: Action::Rec,
                    kind: Kind::Native,
                    bytes: bytes.len(),
                    counter,
                    peer: None,
                    reasons: &[],
                });
                bytes
            }
            CompressOutcome::Error => {
                let counter = self.ctx.next_rec_counter();
                self.log(LogEvent {
                    timestamp_us: now_us(),
                    action: Action::Error,
                    kind: Kind::ComprFailed,
                    bytes: packet.len(),
                    counter,
                    peer: None,
                    reasons: &[],
                });
                return Ok(());
            }
        };

        if let simplemux_wire::AppendOutcome::Flushed(drained) = self.ctx.bundle.try_append(&payload) {
            self.send_bundle(drained, &[Reason::Mtu])?;
            self.ctx.bundle.append_now(&payload);
        }

        let reasons = self.ctx.clock.should_flush(self.ctx.bundle.count(), self.ctx.bundle.size());
        if !reasons.is_empty() {
            let drained = self.ctx.bundle.drain();
            let mapped: Vec<Reason> = reasons.into_iter().map(Reason::from).collect();
            self.send_bundle(drained, &mapped)?;
            self.ctx.clock.mark_sent();
        }
        Ok(())
    }

    /// Wait-timeout iteration: flush whatever is buffered, if anything is.
    pub fn dispatch_timeout(&mut self) {
        if self.ctx.bundle.count() > 0 {
            let drained = self.ctx.bundle.drain();
            let _ = self.send_bundle(drained, &[Reason::Period]);
        }
        self.ctx.clock.mark_sent();
    }

    fn send_bundle(&mut self, bundle: Vec<u8>, reasons: &[Reason]) -> Result<(), EngineError> {
        let len = bundle.len();
        match self.socket.send_to(&bundle, self.ctx.config.peer.into()) {
            Ok(_) => {
                let counter = self.ctx.next_sent_counter();
                self.log(LogEvent {
                    timestamp_us: now_us(),
                    action: Action::Sent,
                    kind: Kind::Muxed,
                    bytes: len,
                    counter,
                    peer: Some(Peer {
                        direction_is_to: true,
                        addr: peer_addr(self.ctx.config.peer),
                        port: self.ctx.config.peer.port(),
                    }),
                    reasons,
                });
            }
            Err(err) => {
                // Send failures are logged and the loop continues, no retry.
                let counter = self.ctx.next_sent_counter();
                self.log(LogEvent {
                    timestamp_us: now_us(),
                    action: Action::Error,
                    kind: Kind::Muxed,
                    bytes: len,
                    counter,
                    peer: None,
                    reasons,
                });
                let _ = err;
            }
        }
        Ok(())
    }

    fn log(&mut self, event: LogEvent<'_>) {
        let _ = self.ctx.log.append(&event);
    }
}

fn peer_addr(addr: std::net::SocketAddrV4) -> Ipv4Addr {
    *addr.ip()
}

fn peer_from(addr: SocketAddr, direction_is_to: bool) -> Peer {
    match addr {
        SocketAddr::V4(v4) => Peer {
            direction_is_to,
            addr: *v4.ip(),
            port: v4.port(),
        },
        SocketAddr::V6(_) => Peer {
            direction_is_to,
            addr: Ipv4Addr::UNSPECIFIED,
            port: 0,
        },
    }
}

#[cfg(test)]
impl<D: VirtualDevice> Engine<D> {
    /// Build an `Engine` without registering anything with the poller, for
    /// tests that drive `dispatch_*` directly instead of `run`/`run_once`.
    fn for_test(device: D, socket: UdpSocket, ctx: OptimizerContext) -> Self {
        Self {
            device,
            socket,
            poll: Poll::new().expect("create poll"),
            events: Events::with_capacity(2),
            scratch: vec![0u8; ctx.config.mtu],
            ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{SocketAddrV4, UdpSocket as StdUdpSocket};
    use std::time::Duration as StdDuration;

    use simplemux_rohc::HeaderCodec;
    use simplemux_wire::TriggersConfig;

    use super::*;
    use crate::clock::TriggerClock;
    use crate::context::OptimizerConfig;
    use crate::log_sink::LogSink;
    use crate::testing::FakeDevice;

    fn test_ctx(limit_packets: u32, peer: SocketAddrV4) -> OptimizerContext {
        let config = OptimizerConfig {
            mtu: 1500,
            mux_port: peer.port(),
            peer,
            debug_level: 0,
        };
        let triggers = TriggersConfig::resolve(limit_packets, 1472, 100_000_000, 100_000_000, 1500);
        OptimizerContext::new(
            config,
            TriggerClock::new(triggers),
            HeaderCodec::passthrough(),
            LogSink::discard(),
        )
    }

    #[test]
    fn device_readable_flushes_immediately_when_limit_is_one() {
        let recv = StdUdpSocket::bind("127.0.0.1:0").expect("bind recv");
        recv.set_read_timeout(Some(StdDuration::from_millis(200)))
            .unwrap();
        let recv_addr = match recv.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => unreachable!(),
        };

        let engine_socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).expect("bind engine socket");

        let mut device = FakeDevice::new();
        device.push_inbound(vec![1, 2, 3, 4]);

        let ctx = test_ctx(1, recv_addr);
        let mut engine = Engine::for_test(device, engine_socket, ctx);

        engine.dispatch_device_readable().expect("dispatch");

        let mut buf = [0u8; 1500];
        let n = recv.recv(&mut buf).expect("recv bundle");
        assert_eq!(&buf[..n], [0x04, 1, 2, 3, 4]);
    }

    #[test]
    fn timeout_with_nothing_buffered_sends_nothing() {
        let recv_addr: SocketAddrV4 = "127.0.0.1:9".parse().unwrap();
        let engine_socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).expect("bind");
        let device = FakeDevice::new();
        let ctx = test_ctx(3, recv_addr);
        let mut engine = Engine::for_test(device, engine_socket, ctx);

        engine.dispatch_timeout();
        assert_eq!(engine.ctx.bundle.count(), 0);
    }

    #[test]
    fn socket_readable_demuxes_a_multiplexed_datagram() {
        let sender = StdUdpSocket::bind("127.0.0.1:0").expect("bind sender");
        let engine_socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).expect("bind engine socket");
        let engine_addr = match engine_socket.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => unreachable!(),
        };
        let sender_port = sender.local_addr().unwrap().port();

        sender
            .send_to(&[0x04, 9, 9, 9, 9], engine_addr)
            .expect("send bundle");

        let device = FakeDevice::new();
        // Treat the sender's own port as the configured multiplex port so
        // this datagram is recognized as muxed rather than native.
        let mut ctx = test_ctx(3, engine_addr);
        ctx.config.mux_port = sender_port;
        let mut engine = Engine::for_test(device, engine_socket, ctx);

        engine.dispatch_socket_readable().expect("dispatch");
        assert_eq!(engine.device.written, vec![vec![9u8, 9, 9, 9]]);
    }
}
