//! Errors produced while driving the event loop.

use thiserror::Error;

/// Fatal error from the event loop. An unrecoverable wait failure is the
/// only thing besides startup errors allowed to unwind the process.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// `Poll::poll` returned an error other than `EINTR`.
    #[error("polling virtual device and socket failed")]
    Poll(#[source] std::io::Error),
    /// Reading from the virtual device failed.
    #[error("reading from virtual device failed")]
    DeviceRead(#[source] std::io::Error),
    /// Writing to the virtual device failed.
    #[error("writing to virtual device failed")]
    DeviceWrite(#[source] std::io::Error),
    /// Reading a datagram from the socket failed (not counting `WouldBlock`).
    #[error("reading from socket failed")]
    SocketRead(#[source] std::io::Error),
}
