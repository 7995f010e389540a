//! The trace callback installed on both the compressor and decompressor.
//!
//! Trace callbacks are installed on both contexts; traces are discarded
//! unless the debug verbosity is at the highest level. Verbosity 3 is the
//! highest level on the `-d 0..3` CLI scale.

use std::ffi::{c_char, c_int, c_void, CStr};

use crate::ffi::{RohcTraceLevel, ROHC_TRACE_ERROR};

/// Wraps the debug level so it can be handed to librohc as an opaque
/// `priv_ctxt` pointer without any unsafe global state.
pub(crate) struct TraceContext {
    pub debug_level: u8,
}

/// The callback passed to `rohc_comp_set_traces_cb2`/`rohc_decomp_set_traces_cb2`.
///
/// # Safety
///
/// Called only by librohc with `priv_ctxt` pointing at a live
/// [`TraceContext`] (we own it for the lifetime of the compressor/
/// decompressor) and `message` a NUL-terminated string.
pub(crate) unsafe extern "C" fn trace_callback(
    priv_ctxt: *mut c_void,
    level: RohcTraceLevel,
    _entity: c_int,
    _profile: c_int,
    message: *const c_char,
) {
    let Some(ctx) = (unsafe { (priv_ctxt as *const TraceContext).as_ref() }) else {
        return;
    };
    if ctx.debug_level < 3 {
        return;
    }
    let msg = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    if level >= ROHC_TRACE_ERROR {
        log::warn!("ROHC trace: {msg}");
    } else {
        log::trace!("ROHC trace: {msg}");
    }
}
