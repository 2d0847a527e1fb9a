//! Random reference tokens for migration units and dump snapshots.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

/// Generate a random, filename-safe reference token.
///
/// Produces `length` random bytes, base64-encoded, with `/` replaced by `_`
/// so the token can be embedded in file and directory names. Not required to
/// be cryptographically unpredictable; 6 or more bytes is enough to avoid
/// collisions in practice.
pub fn generate_reference(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(&bytes).replace('/', "_")
}
