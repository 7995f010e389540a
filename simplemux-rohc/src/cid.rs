//! Deterministic seeding for the CID allocator librohc drives through its
//! `rand_cb` callback. The generator is seeded once at startup from the
//! wall clock; from that point on the stream of values it produces is
//! reproducible given the seed.
//!
//! librohc's callback is a plain C function pointer with no closure
//! environment, so the generator lives behind a process-wide
//! [`std::sync::Mutex`] — the single-threaded event loop in
//! `simplemux-core::engine` is the only caller, so contention never happens
//! in practice, but the type has to be `Sync` to satisfy `extern "C"`.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

static GENERATOR: Mutex<Option<ChaCha8Rng>> = Mutex::new(None);

/// Seed the global CID generator from the wall clock.
///
/// Returns the seed used, so it can be logged for reproducing a run.
pub fn seed_from_wall_clock() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    seed_with(seed);
    seed
}

/// Seed the global CID generator from an explicit value (used by tests that
/// need a reproducible sequence).
pub fn seed_with(seed: u64) {
    let mut guard = GENERATOR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(ChaCha8Rng::seed_from_u64(seed));
}

/// The callback librohc calls whenever it needs a random `c_int`. Matches
/// [`crate::ffi::RohcRandCb`]'s signature.
///
/// # Safety
///
/// Called only by librohc, with whatever `user_context` was registered at
/// `rohc_comp_new2` time (unused here).
pub unsafe extern "C" fn rand_callback(_user_context: *const std::ffi::c_void) -> std::ffi::c_int {
    let mut guard = GENERATOR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let rng = guard.get_or_insert_with(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        ChaCha8Rng::seed_from_u64(seed)
    });
    #[allow(clippy::cast_possible_wrap)]
    {
        rng.next_u32() as std::ffi::c_int
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_the_same_stream() {
        seed_with(42);
        let a: Vec<u32> = (0..8)
            .map(|_| GENERATOR.lock().unwrap().as_mut().unwrap().next_u32())
            .collect();
        seed_with(42);
        let b: Vec<u32> = (0..8)
            .map(|_| GENERATOR.lock().unwrap().as_mut().unwrap().next_u32())
            .collect();
        assert_eq!(a, b);
    }
}
