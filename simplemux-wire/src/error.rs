//! This module contains definitions of errors produced while framing or
//! parsing bundles.

use core as std; // workaround so thiserror's derive resolves against core::error::Error

use thiserror::Error;

/// Error for [`crate::separator`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SeparatorError {
    /// `encode` was asked to encode a length outside `[0, 16383]`
    #[error("length out of range for a separator")]
    LengthOutOfRange,
    /// `decode` read a byte 0 whose MBB (bit 7) was set
    #[error("separator has MBB set, bundle is malformed")]
    BadSeparator,
    /// `decode` needs a second byte for the long form but the stream ended
    #[error("truncated long-form separator")]
    TruncatedSeparator,
}

/// Error for [`crate::demux`]'s structural (abort-the-datagram) failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DemuxError {
    /// The first byte of a separator had MBB set
    #[error("bad separator, MBB was set")]
    BadSeparator,
    /// The decoded length would run past the end of the datagram
    #[error("declared payload length exceeds remaining datagram bytes")]
    BadLength,
}

pub(crate) type SeparatorResult<T> = core::result::Result<T, SeparatorError>;
