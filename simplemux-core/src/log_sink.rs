//! The structured, tab-separated per-event log.
//!
//! This is distinct from the ambient `log`/`env_logger` diagnostics: those
//! cover startup and fatal errors, while this is a first-class domain
//! feature with its own wire format, hand-rolled the way `iptr-decoder`
//! hand-rolls `packet_handler/log.rs` for its own per-packet trace lines —
//! except this one owns its own file and flushes after every line so it
//! survives a `SIGTERM`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::path::Path;

use simplemux_wire::FlushReason;

/// Flush reason attached to a `sent muxed` line. Extends [`FlushReason`]
/// with `Mtu`, which is not a trigger at all but the bundle buffer's own
/// MTU-preemption flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    NumpacketLimit,
    SizeLimit,
    Timeout,
    Period,
    Mtu,
}

impl Reason {
    fn as_str(self) -> &'static str {
        match self {
            Self::NumpacketLimit => "numpacket_limit",
            Self::SizeLimit => "size_limit",
            Self::Timeout => "timeout",
            Self::Period => "period",
            Self::Mtu => "MTU",
        }
    }
}

impl From<FlushReason> for Reason {
    fn from(reason: FlushReason) -> Self {
        match reason {
            FlushReason::NumpacketLimit => Self::NumpacketLimit,
            FlushReason::SizeLimit => Self::SizeLimit,
            FlushReason::Timeout => Self::Timeout,
            FlushReason::Period => Self::Period,
        }
    }
}

/// `action` field of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rec,
    Sent,
    Forward,
    Error,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rec => "rec",
            Self::Sent => "sent",
            Self::Forward => "forward",
            Self::Error => "error",
        }
    }
}

/// `kind` field of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Native,
    Muxed,
    Demuxed,
    RohcFeedback,
    BadSeparator,
    DemuxBadLength,
    ComprFailed,
    DecompFailed,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Muxed => "muxed",
            Self::Demuxed => "demuxed",
            Self::RohcFeedback => "ROHC_feedback",
            Self::BadSeparator => "bad_separator",
            Self::DemuxBadLength => "demux_bad_length",
            Self::ComprFailed => "compr_failed",
            Self::DecompFailed => "decomp_failed",
        }
    }
}

/// The peer address attached to some log events.
#[derive(Debug, Clone, Copy)]
pub struct Peer {
    pub direction_is_to: bool,
    pub addr: Ipv4Addr,
    pub port: u16,
}

/// One line of the structured event log.
pub struct LogEvent<'a> {
    pub timestamp_us: u64,
    pub action: Action,
    pub kind: Kind,
    pub bytes: usize,
    pub counter: u64,
    pub peer: Option<Peer>,
    pub reasons: &'a [Reason],
}

/// An open, flush-on-every-write structured log file.
///
/// Constructing this with no path configured is a no-op sink: every
/// append silently does nothing, since the structured log file is
/// optional.
pub struct LogSink {
    file: Option<File>,
}

impl LogSink {
    /// Open (creating/truncating) a log file at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self { file: Some(file) })
    }

    /// A sink that discards every event (no `-l`/`-L` given).
    #[must_use]
    pub fn discard() -> Self {
        Self { file: None }
    }

    /// Append one line and flush immediately.
    pub fn append(&mut self, event: &LogEvent<'_>) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let mut line = format!(
            "{}\t{}\t{}\t{}\t{}",
            event.timestamp_us,
            event.action.as_str(),
            event.kind.as_str(),
            event.bytes,
            event.counter,
        );
        if let Some(peer) = event.peer {
            let direction = if peer.direction_is_to { "to" } else { "from" };
            line.push_str(&format!("\t{direction}\t{}\t{}", peer.addr, peer.port));
        }
        for reason in event.reasons {
            line.push('\t');
            line.push_str(reason.as_str());
        }
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_sink_never_errors() {
        let mut sink = LogSink::discard();
        let event = LogEvent {
            timestamp_us: 0,
            action: Action::Rec,
            kind: Kind::Native,
            bytes: 40,
            counter: 1,
            peer: None,
            reasons: &[],
        };
        assert!(sink.append(&event).is_ok());
    }

    #[test]
    fn writes_a_tab_separated_line() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("simplemux-log-sink-test-{:?}", std::thread::current().id()));
        let mut sink = LogSink::open(&path).unwrap();
        let event = LogEvent {
            timestamp_us: 123,
            action: Action::Sent,
            kind: Kind::Muxed,
            bytes: 92,
            counter: 2,
            peer: Some(Peer {
                direction_is_to: true,
                addr: Ipv4Addr::new(10, 0, 0, 1),
                port: 55555,
            }),
            reasons: &[Reason::NumpacketLimit],
        };
        sink.append(&event).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "123\tsent\tmuxed\t92\t2\tto\t10.0.0.1\t55555\tnumpacket_limit\n"
        );
        std::fs::remove_file(&path).ok();
    }
}
