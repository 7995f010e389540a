//! `OptimizerContext`: every piece of mutable runtime state the event loop
//! touches, owned by one value instead of scattered globals.

use std::net::SocketAddrV4;
use std::time::{SystemTime, UNIX_EPOCH};

use simplemux_rohc::HeaderCodec;
use simplemux_wire::BundleBuffer;

use crate::clock::TriggerClock;
use crate::log_sink::LogSink;

/// Configuration resolved once at startup and never mutated afterward.
pub struct OptimizerConfig {
    pub mtu: usize,
    pub mux_port: u16,
    pub peer: SocketAddrV4,
    pub debug_level: u8,
}

/// Owns the bundle buffer, codec, trigger clock, log sink, and the
/// per-process event counters, for the whole lifetime of the loop.
pub struct OptimizerContext {
    pub config: OptimizerConfig,
    pub bundle: BundleBuffer,
    pub codec: HeaderCodec,
    pub clock: TriggerClock,
    pub log: LogSink,
    rec_counter: u64,
    sent_counter: u64,
}

impl OptimizerContext {
    #[must_use]
    pub fn new(
        config: OptimizerConfig,
        clock: TriggerClock,
        codec: HeaderCodec,
        log: LogSink,
    ) -> Self {
        let mtu = config.mtu;
        Self {
            config,
            bundle: BundleBuffer::new(mtu),
            codec,
            clock,
            log,
            rec_counter: 0,
            sent_counter: 0,
        }
    }

    /// Next value for the `rec`-side counter field, post-incrementing.
    pub fn next_rec_counter(&mut self) -> u64 {
        self.rec_counter += 1;
        self.rec_counter
    }

    /// Next value for the `sent`-side counter field, post-incrementing.
    pub fn next_sent_counter(&mut self) -> u64 {
        self.sent_counter += 1;
        self.sent_counter
    }
}

/// Microsecond timestamp for a log line; every line begins with one.
#[must_use]
pub fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}
