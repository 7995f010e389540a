#![doc = include_str!("../README.md")]

pub mod clock;
pub mod context;
pub mod device;
pub mod engine;
pub mod error;
pub mod log_sink;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{OptimizerConfig, OptimizerContext};
pub use device::VirtualDevice;
pub use engine::Engine;
pub use error::EngineError;
