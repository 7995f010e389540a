//! Errors produced while setting up or driving the ROHC codec.

use thiserror::Error;

/// Error for [`crate::RohcContext::new`] and the underlying FFI calls.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RohcError {
    /// `rohc_comp_new2` returned a null pointer.
    #[error("failed to create ROHC compressor")]
    CompressorInit,
    /// `rohc_decomp_new2` returned a null pointer.
    #[error("failed to create ROHC decompressor")]
    DecompressorInit,
    /// A `rohc_comp_enable_profile`/`rohc_decomp_enable_profile` call failed.
    #[error("failed to enable ROHC profile {0:#06x}")]
    ProfileEnable(u32),
}
