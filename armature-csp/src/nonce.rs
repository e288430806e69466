//! Nonce generation

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Number of random bytes in a nonce
pub const NONCE_BYTES: usize = 16;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh base64 nonce from [`NONCE_BYTES`] random bytes.
///
/// Bytes come from the operating system CSPRNG. If that source fails, a
/// userspace generator seeded from the clock, the process id and a call
/// counter is used instead. That seed is guessable by an attacker who can
/// observe the process, so the fallback nonce is weaker.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        warn!(error = %e, "OS random source unavailable, using seeded fallback generator for nonce");
        fill_fallback(&mut bytes);
    }
    let nonce = STANDARD.encode(bytes);
    debug!("Generated CSP nonce");
    nonce
}

// Must not touch the OS source: `thread_rng` seeds itself from it.
fn fill_fallback(bytes: &mut [u8]) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = nanos
        ^ (u64::from(std::process::id()) << 32)
        ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed).fill_bytes(bytes);
}
