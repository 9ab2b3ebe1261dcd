//! Streaming sidecar: one truncated HMAC per 64 KiB window of the signed blob
//!
//! ```text
//! signed blob = iv || ciphertext || mac
//! entry n     = HMAC-SHA256(blob[n*64K .. n*64K + 64K + 16], mac_key)[..10]
//! sidecar     = entry 0 || entry 1 || ...   (n = 0.. while n*64K < len)
//! ```
//!
//! Each window overlaps the next by 16 bytes so a receiver holding one
//! chunk plus the first AES block of the next can check it in isolation.

use crate::mac::{truncated_mac, verify_truncated_mac};
use crate::{KEY_SIZE, MAC_SIZE};

/// Stride between sidecar windows.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Extra bytes each window reaches into the next chunk.
pub const OVERLAP_SIZE: usize = 16;

/// Full window length (clipped at the end of the blob).
pub const WINDOW_SIZE: usize = CHUNK_SIZE + OVERLAP_SIZE;

/// Sidecar length for a signed blob of `blob_len` bytes.
pub fn sidecar_len(blob_len: usize) -> usize {
    blob_len.div_ceil(CHUNK_SIZE) * MAC_SIZE
}

/// The window covered by sidecar entry `n`, or `None` past the end of the blob.
pub fn sidecar_window(signed_blob: &[u8], n: usize) -> Option<&[u8]> {
    let start = n.checked_mul(CHUNK_SIZE)?;
    if start >= signed_blob.len() {
        return None;
    }
    let end = signed_blob.len().min(start + WINDOW_SIZE);
    Some(&signed_blob[start..end])
}

/// Generate the sidecar for `signed_blob`. Empty input yields an empty sidecar.
pub fn generate_sidecar(signed_blob: &[u8], mac_key: &[u8; KEY_SIZE]) -> Vec<u8> {
    let mut sidecar = Vec::with_capacity(sidecar_len(signed_blob.len()));
    let mut n = 0;
    while let Some(window) = sidecar_window(signed_blob, n) {
        if window.is_empty() {
            break;
        }
        sidecar.extend_from_slice(&truncated_mac(mac_key, &[window]));
        n += 1;
    }
    sidecar
}

/// Check one received window against sidecar entry `n` in constant time.
///
/// Returns `false` if the sidecar has no entry `n`.
pub fn verify_sidecar_chunk(
    sidecar: &[u8],
    n: usize,
    window: &[u8],
    mac_key: &[u8; KEY_SIZE],
) -> bool {
    let Some(start) = n.checked_mul(MAC_SIZE) else {
        return false;
    };
    match sidecar.get(start..start.saturating_add(MAC_SIZE)) {
        Some(entry) => verify_truncated_mac(mac_key, &[window], entry),
        None => false,
    }
}
