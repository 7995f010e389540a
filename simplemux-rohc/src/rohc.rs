//! The safe wrapper around librohc's compressor and decompressor.

use std::ffi::c_void;

use crate::cid;
use crate::error::RohcError;
use crate::ffi::{
    self, rohc_comp, rohc_decomp, RohcStatus, ROHC_O_MODE, ROHC_PROFILE_ESP, ROHC_PROFILE_IP,
    ROHC_PROFILE_RTP, ROHC_PROFILE_TCP, ROHC_PROFILE_UDP, ROHC_PROFILE_UDPLITE,
    ROHC_PROFILE_UNCOMPRESSED, ROHC_SMALL_CID,
};
use crate::trace::{trace_callback, TraceContext};

/// Maximum CID the compressor and decompressor are configured for.
const MAX_CID: i32 = 15;

/// Profiles enabled on the compressor.
const COMPRESSOR_PROFILES: &[i32] = &[
    ROHC_PROFILE_UNCOMPRESSED,
    ROHC_PROFILE_IP,
    ROHC_PROFILE_UDP,
    ROHC_PROFILE_UDPLITE,
    ROHC_PROFILE_TCP,
];

/// Profiles enabled on the decompressor.
const DECOMPRESSOR_PROFILES: &[i32] = &[
    ROHC_PROFILE_UNCOMPRESSED,
    ROHC_PROFILE_UDP,
    ROHC_PROFILE_IP,
    ROHC_PROFILE_UDPLITE,
    ROHC_PROFILE_RTP,
    ROHC_PROFILE_ESP,
    ROHC_PROFILE_TCP,
];

/// Outcome of [`RohcContext::compress`].
pub enum CompressOutcome {
    /// The packet was compressed.
    Compressed(Vec<u8>),
    /// MRRU was exceeded; `bytes` is the original packet, sent verbatim.
    Segmented(Vec<u8>),
    /// The compressor failed; the packet should be dropped.
    Error,
}

/// Outcome of [`RohcContext::decompress`].
pub enum DecompressOutcome {
    /// An IP packet was produced.
    Decompressed(Vec<u8>),
    /// The ROHC packet was a segment or feedback-only; no IP packet results.
    FeedbackOnly,
    /// The decompressor failed; the packet should be dropped.
    Error,
}

/// A live ROHC compressor/decompressor pair.
pub struct RohcContext {
    comp: *mut rohc_comp,
    decomp: *mut rohc_decomp,
    // Boxed so the pointer handed to librohc as `priv_ctxt` stays valid for
    // the lifetime of `comp`/`decomp`.
    comp_trace_ctx: Box<TraceContext>,
    decomp_trace_ctx: Box<TraceContext>,
    cid_seed: u64,
}

// SAFETY: `simplemux-core`'s event loop is single-threaded and owns this
// context exclusively; librohc has no internal locking requirement beyond
// "don't call it concurrently from two threads", which we never do.
unsafe impl Send for RohcContext {}

impl RohcContext {
    /// Construct a compressor/decompressor pair.
    ///
    /// `debug_level` gates the trace callback (only level 3 logs anything).
    pub fn new(debug_level: u8) -> Result<Self, RohcError> {
        let cid_seed = cid::seed_from_wall_clock();

        let comp = unsafe {
            ffi::rohc_comp_new2(
                ROHC_SMALL_CID,
                MAX_CID,
                Some(cid::rand_callback),
                std::ptr::null(),
            )
        };
        if comp.is_null() {
            return Err(RohcError::CompressorInit);
        }
        for &profile in COMPRESSOR_PROFILES {
            #[allow(clippy::cast_sign_loss)]
            if !unsafe { ffi::rohc_comp_enable_profile(comp, profile) } {
                unsafe { ffi::rohc_comp_free(comp) };
                #[allow(clippy::cast_sign_loss)]
                return Err(RohcError::ProfileEnable(profile as u32));
            }
        }

        let decomp = unsafe { ffi::rohc_decomp_new2(ROHC_SMALL_CID, MAX_CID, ROHC_O_MODE) };
        if decomp.is_null() {
            unsafe { ffi::rohc_comp_free(comp) };
            return Err(RohcError::DecompressorInit);
        }
        for &profile in DECOMPRESSOR_PROFILES {
            if !unsafe { ffi::rohc_decomp_enable_profile(decomp, profile) } {
                unsafe {
                    ffi::rohc_comp_free(comp);
                    ffi::rohc_decomp_free(decomp);
                }
                #[allow(clippy::cast_sign_loss)]
                return Err(RohcError::ProfileEnable(profile as u32));
            }
        }

        let mut comp_trace_ctx = Box::new(TraceContext { debug_level });
        let mut decomp_trace_ctx = Box::new(TraceContext { debug_level });
        unsafe {
            ffi::rohc_comp_set_traces_cb2(
                comp,
                Some(trace_callback),
                (comp_trace_ctx.as_mut() as *mut TraceContext).cast::<c_void>(),
            );
            ffi::rohc_decomp_set_traces_cb2(
                decomp,
                Some(trace_callback),
                (decomp_trace_ctx.as_mut() as *mut TraceContext).cast::<c_void>(),
            );
        }

        Ok(Self {
            comp,
            decomp,
            comp_trace_ctx,
            decomp_trace_ctx,
            cid_seed,
        })
    }

    /// The seed used to initialize the CID allocator's PRNG, for logging.
    #[must_use]
    pub fn cid_seed(&self) -> u64 {
        self.cid_seed
    }

    /// Compress an IP packet.
    pub fn compress(&mut self, ip_packet: &[u8]) -> CompressOutcome {
        let mut uncomp = ip_packet.to_vec();
        let uncomp_buf = unsafe { ffi::rohc_buf_full(&mut uncomp) };

        let mut rohc_bytes = vec![0u8; ip_packet.len().max(256) + 128];
        let mut rohc_buf = unsafe { ffi::rohc_buf_full(&mut rohc_bytes) };

        let status = unsafe { ffi::rohc_compress4(self.comp, uncomp_buf, &mut rohc_buf) };
        match status {
            RohcStatus::Ok => {
                rohc_bytes.truncate(rohc_buf.len);
                CompressOutcome::Compressed(rohc_bytes)
            }
            RohcStatus::Segment => CompressOutcome::Segmented(uncomp),
            _ => CompressOutcome::Error,
        }
    }

    /// Decompress a ROHC packet.
    pub fn decompress(&mut self, rohc_packet: &[u8]) -> DecompressOutcome {
        let mut rohc_bytes = rohc_packet.to_vec();
        let rohc_buf = unsafe { ffi::rohc_buf_full(&mut rohc_bytes) };

        let mut ip_bytes = vec![0u8; rohc_packet.len().max(64) * 4 + 128];
        let mut ip_buf = unsafe { ffi::rohc_buf_full(&mut ip_bytes) };

        let status =
            unsafe { ffi::rohc_decompress3(self.decomp, rohc_buf, &mut ip_buf, std::ptr::null_mut(), std::ptr::null_mut()) };
        match status {
            RohcStatus::Ok => {
                if ip_buf.len == 0 {
                    DecompressOutcome::FeedbackOnly
                } else {
                    ip_bytes.truncate(ip_buf.len);
                    DecompressOutcome::Decompressed(ip_bytes)
                }
            }
            _ => DecompressOutcome::Error,
        }
    }
}

impl Drop for RohcContext {
    fn drop(&mut self) {
        unsafe {
            ffi::rohc_comp_free(self.comp);
            ffi::rohc_decomp_free(self.decomp);
        }
        // keep the trace contexts alive until after the frees above
        let _ = &self.comp_trace_ctx;
        let _ = &self.decomp_trace_ctx;
    }
}
