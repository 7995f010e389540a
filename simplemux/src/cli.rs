//! The command-line surface, resolved into plain config structs so the
//! trigger-defaulting invariant stays testable independent of `clap` —
//! the same shape `tools/iptr-raw-logger`'s `Cmdline` has around the
//! library crates it wires together.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;
use simplemux_wire::triggers::SENTINEL_US;

/// Point-to-point UDP tunnel optimizer: multiplexes and optionally
/// ROHC-compresses packets from a local virtual device to a peer.
///
/// Set the environment variable `RUST_LOG` to control ambient diagnostics.
#[derive(Parser)]
#[command(name = "simplemux", version)]
pub struct Cmdline {
    /// Name of the local virtual network device (tun/tap) to use
    #[arg(short = 'i', long = "device")]
    pub device_name: String,

    /// Name of the local physical interface whose MTU bounds the bundle size
    #[arg(short = 'e', long = "interface")]
    pub physical_interface: String,

    /// Peer IPv4 address
    #[arg(short = 'c', long = "peer")]
    pub peer_addr: Ipv4Addr,

    /// UDP port used for the tunnel, on both ends
    #[arg(short = 'p', long = "port", default_value_t = 55555)]
    pub port: u16,

    /// Use a tap (layer 2) device instead of a tun (layer 3) device
    #[arg(short = 'a', long = "tap", conflicts_with = "tun")]
    pub tap: bool,

    /// Use a tun (layer 3) device; the default
    #[arg(short = 'u', long = "tun")]
    pub tun: bool,

    /// Enable the ROHC header codec
    #[arg(short = 'r', long = "rohc")]
    pub rohc: bool,

    /// Packet-count flush trigger (0 = unset; max 100)
    #[arg(short = 'n', long = "limit-packets", default_value_t = 0)]
    pub limit_packets: u32,

    /// Size-threshold flush trigger, in bytes
    #[arg(short = 'b', long = "size-threshold", default_value_t = 1472)]
    pub size_threshold: usize,

    /// Idle-timeout flush trigger, in microseconds
    #[arg(short = 't', long = "timeout", default_value_t = SENTINEL_US)]
    pub timeout_us: u64,

    /// Hard-period flush trigger, in microseconds
    #[arg(short = 'P', long = "period", default_value_t = SENTINEL_US)]
    pub period_us: u64,

    /// Path to a structured event log file
    #[arg(short = 'l', long = "log-file", conflicts_with = "auto_log_file")]
    pub log_file: Option<PathBuf>,

    /// Auto-name the structured event log file `YYYY-MM-DD_HH.MM.SS`
    #[arg(short = 'L', long = "auto-log-file")]
    pub auto_log_file: bool,

    /// Debug verbosity, clamped to 0..=3
    #[arg(short = 'd', long = "debug", default_value_t = 0)]
    pub debug_level: u8,
}

impl Cmdline {
    /// Clamp `-d` to the documented `0..=3` range.
    #[must_use]
    pub fn clamped_debug_level(&self) -> u8 {
        self.debug_level.min(3)
    }

    /// `true` if a tap device was requested; tun is the default otherwise.
    #[must_use]
    pub fn wants_tap(&self) -> bool {
        self.tap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_required_flags() {
        let cmd = Cmdline::parse_from([
            "simplemux", "-i", "tun0", "-e", "eth0", "-c", "10.0.0.2",
        ]);
        assert_eq!(cmd.device_name, "tun0");
        assert_eq!(cmd.physical_interface, "eth0");
        assert_eq!(cmd.peer_addr, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(cmd.port, 55555);
        assert!(!cmd.wants_tap());
        assert_eq!(cmd.limit_packets, 0);
        assert_eq!(cmd.size_threshold, 1472);
        assert_eq!(cmd.timeout_us, SENTINEL_US);
        assert_eq!(cmd.period_us, SENTINEL_US);
        assert_eq!(cmd.clamped_debug_level(), 0);
    }

    #[test]
    fn debug_level_is_clamped() {
        let cmd = Cmdline::parse_from([
            "simplemux", "-i", "tun0", "-e", "eth0", "-c", "10.0.0.2", "-d", "9",
        ]);
        assert_eq!(cmd.clamped_debug_level(), 3);
    }

    #[test]
    fn tap_and_tun_conflict() {
        let result = Cmdline::try_parse_from([
            "simplemux", "-i", "tun0", "-e", "eth0", "-c", "10.0.0.2", "-a", "-u",
        ]);
        assert!(result.is_err());
    }
}
