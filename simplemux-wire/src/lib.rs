#![no_std]
#![doc = include_str!("../README.md")]

extern crate alloc;

pub mod bundle;
pub mod demux;
pub mod error;
pub mod separator;
pub mod triggers;

pub use bundle::{AppendOutcome, BundleBuffer};
pub use demux::{demux, DemuxOutcome};
pub use separator::Separator;
pub use triggers::{should_flush, time_until_period, FlushReason, TriggersConfig};
