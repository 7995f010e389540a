//! Raw bindings to the subset of librohc's public C API
//! (`rohc_comp.h`, `rohc_decomp.h`, `rohc_buf.h`, `rohc_profiles.h`) that
//! `simplemux-rohc` needs. This module stays `unsafe`-only and
//! thin-on-purpose; [`crate::rohc::RohcContext`] is the safe layer on top
//! that owns the compressor/decompressor and enforces the calling
//! conventions this module just exposes raw.

#![allow(non_camel_case_types, dead_code)]

use std::ffi::{c_char, c_int, c_void};
use std::os::raw::c_uchar;

/// `rohc_cid_type_t::ROHC_SMALL_CID`
pub const ROHC_SMALL_CID: c_int = 0;

/// `rohc_decomp_context_mode_t::ROHC_O_MODE` — bidirectional optimistic
pub const ROHC_O_MODE: c_int = 2;

/// `rohc_profile_t` values simplemux enables on both compressor and decompressor.
pub const ROHC_PROFILE_UNCOMPRESSED: c_int = 0x0000;
pub const ROHC_PROFILE_RTP: c_int = 0x0001;
pub const ROHC_PROFILE_UDP: c_int = 0x0002;
pub const ROHC_PROFILE_ESP: c_int = 0x0003;
pub const ROHC_PROFILE_IP: c_int = 0x0004;
pub const ROHC_PROFILE_TCP: c_int = 0x0006;
pub const ROHC_PROFILE_UDPLITE: c_int = 0x0008;

/// `rohc_status_t`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RohcStatus {
    Ok = 0,
    Segment = 3,
    Malformed = 4,
    NoContext = 5,
    BadCrc = 6,
    Error = 7,
}

/// `rohc_trace_level_t`
pub type RohcTraceLevel = c_int;
pub const ROHC_TRACE_DEBUG: RohcTraceLevel = 0;
pub const ROHC_TRACE_ERROR: RohcTraceLevel = 4;

/// Opaque compressor handle (`struct rohc_comp`).
#[repr(C)]
pub struct rohc_comp {
    _private: [u8; 0],
}

/// Opaque decompressor handle (`struct rohc_decomp`).
#[repr(C)]
pub struct rohc_decomp {
    _private: [u8; 0],
}

/// `struct rohc_buf`, describing a borrowed byte buffer with header room.
#[repr(C)]
pub struct rohc_buf {
    pub time: [u64; 2],
    pub data: *mut c_uchar,
    pub max_len: usize,
    pub offset: usize,
    pub len: usize,
}

/// Build a `rohc_buf` that fully covers `slice`, with no header offset.
///
/// # Safety
///
/// The returned `rohc_buf` borrows `slice`; it must not outlive it.
pub unsafe fn rohc_buf_full(slice: &mut [u8]) -> rohc_buf {
    rohc_buf {
        time: [0, 0],
        data: slice.as_mut_ptr(),
        max_len: slice.len(),
        offset: 0,
        len: slice.len(),
    }
}

pub type RohcRandCb =
    Option<unsafe extern "C" fn(user_context: *const c_void) -> c_int>;

/// Callback signature for `rohc_comp_set_traces_cb2`/`rohc_decomp_set_traces_cb2`.
///
/// librohc formats the variadic trace message internally before invoking the
/// callback, so the Rust side only ever sees the finished C string — this
/// sidesteps defining a variadic `extern "C" fn`, which needs the unstable
/// `c_variadic` feature.
pub type RohcTraceCb2 = Option<
    unsafe extern "C" fn(
        priv_ctxt: *mut c_void,
        level: RohcTraceLevel,
        entity: c_int,
        profile: c_int,
        message: *const c_char,
    ),
>;

unsafe extern "C" {
    pub fn rohc_comp_new2(
        cid_type: c_int,
        max_cid: c_int,
        rand_cb: RohcRandCb,
        rand_priv: *const c_void,
    ) -> *mut rohc_comp;
    pub fn rohc_comp_free(comp: *mut rohc_comp);
    pub fn rohc_comp_enable_profile(comp: *mut rohc_comp, profile: c_int) -> bool;
    pub fn rohc_comp_set_traces_cb2(
        comp: *mut rohc_comp,
        callback: RohcTraceCb2,
        priv_ctxt: *mut c_void,
    ) -> bool;
    pub fn rohc_compress4(
        comp: *mut rohc_comp,
        uncomp_packet: rohc_buf,
        rohc_packet: *mut rohc_buf,
    ) -> RohcStatus;

    pub fn rohc_decomp_new2(
        cid_type: c_int,
        max_cid: c_int,
        mode: c_int,
    ) -> *mut rohc_decomp;
    pub fn rohc_decomp_free(decomp: *mut rohc_decomp);
    pub fn rohc_decomp_enable_profile(decomp: *mut rohc_decomp, profile: c_int) -> bool;
    pub fn rohc_decomp_set_traces_cb2(
        decomp: *mut rohc_decomp,
        callback: RohcTraceCb2,
        priv_ctxt: *mut c_void,
    ) -> bool;
    pub fn rohc_decompress3(
        decomp: *mut rohc_decomp,
        rohc_packet: rohc_buf,
        uncomp_packet: *mut rohc_buf,
        rcvd_feedback: *mut rohc_buf,
        feedback_send: *mut rohc_buf,
    ) -> RohcStatus;
}
