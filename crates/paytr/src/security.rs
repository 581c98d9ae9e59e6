//! Timing-safe helpers shared by the client and the callback server.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time byte comparison that does not leak input lengths or content.
///
/// Both inputs are hashed to SHA-256 digests first, so the comparison always
/// runs over 32 bytes regardless of the caller's input lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// Render a secret for `Debug` output without revealing it.
pub(crate) fn redacted(secret: &[u8]) -> &'static str {
    if secret.is_empty() {
        "[EMPTY]"
    } else {
        "[REDACTED]"
    }
}
