//! Opaque refresh token generation, digesting, and format checks.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Generates `len` random bytes from the OS RNG, base64url-encoded without
/// padding.
pub fn generate_refresh_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 digest of a raw refresh token.
pub fn hash_refresh_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Whether `raw` could have been produced by [`generate_refresh_token`].
///
/// Rejects empty input, standard-alphabet or padding characters, and
/// anything that does not decode as unpadded base64url.
pub fn is_well_formed(raw: &str) -> bool {
    if raw.trim().is_empty() {
        return false;
    }
    if raw.contains(['+', '/', '=']) {
        return false;
    }
    URL_SAFE_NO_PAD.decode(raw).is_ok()
}
