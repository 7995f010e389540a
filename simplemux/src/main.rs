//! Wires the CLI, virtual device, UDP socket, and [`simplemux_core::Engine`]
//! together, the way `tools/iptr-raw-logger/src/main.rs` wires `clap`,
//! `env_logger`, and the library crates for its own tool.

mod cli;
mod device;

use std::net::{SocketAddrV4, UdpSocket as StdUdpSocket};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use mio::net::UdpSocket;
use simplemux_core::context::{OptimizerConfig, OptimizerContext};
use simplemux_core::{clock::TriggerClock, log_sink::LogSink, Engine};
use simplemux_rohc::HeaderCodec;
use simplemux_wire::TriggersConfig;

use crate::cli::Cmdline;
use crate::device::{lookup_interface_mtu, TunTapDevice};

fn resolve_log_sink(cmd: &Cmdline) -> anyhow::Result<LogSink> {
    if let Some(path) = &cmd.log_file {
        return LogSink::open(path).with_context(|| format!("failed to open log file {path:?}"));
    }
    if cmd.auto_log_file {
        let path = auto_log_file_path();
        return LogSink::open(&path).with_context(|| format!("failed to open log file {path:?}"));
    }
    Ok(LogSink::discard())
}

fn auto_log_file_path() -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    // No chrono dependency pulled in for a name that only needs to be
    // distinct and roughly sortable.
    PathBuf::from(format!("simplemux_{secs}.log"))
}

fn run() -> anyhow::Result<()> {
    env_logger::init();

    let cmd = Cmdline::parse();

    let mtu = lookup_interface_mtu(&cmd.physical_interface)
        .with_context(|| format!("failed to resolve MTU of interface {:?}", cmd.physical_interface))?;

    let device = TunTapDevice::open(&cmd.device_name, cmd.wants_tap())
        .with_context(|| format!("failed to open virtual device {:?}", cmd.device_name))?;

    let peer = SocketAddrV4::new(cmd.peer_addr, cmd.port);

    // Left unconnected: a connected socket's `recv_from` only ever
    // delivers datagrams from the connected remote, which would silently
    // drop the native-passthrough path (any other source port, forwarded
    // to the virtual device verbatim).
    let std_socket =
        StdUdpSocket::bind(("0.0.0.0", cmd.port)).context("failed to bind UDP socket")?;
    std_socket
        .set_nonblocking(true)
        .context("failed to set UDP socket non-blocking")?;
    let socket = UdpSocket::from_std(std_socket);

    let debug_level = cmd.clamped_debug_level();
    let codec = if cmd.rohc {
        HeaderCodec::rohc(debug_level).context("failed to initialize ROHC codec")?
    } else {
        HeaderCodec::passthrough()
    };

    let triggers = TriggersConfig::resolve(
        cmd.limit_packets,
        cmd.size_threshold,
        cmd.timeout_us,
        cmd.period_us,
        mtu,
    );

    let config = OptimizerConfig {
        mtu,
        mux_port: cmd.port,
        peer,
        debug_level,
    };

    let log = resolve_log_sink(&cmd)?;
    let ctx = OptimizerContext::new(config, TriggerClock::new(triggers), codec, log);

    let mut engine = Engine::new(device, socket, ctx).context("failed to register event loop")?;
    engine.run().context("event loop terminated with a fatal error")?;
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
