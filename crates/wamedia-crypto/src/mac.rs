//! Truncated HMAC-SHA256 tags
//!
//! Envelope tags and sidecar entries both keep only the first `MAC_SIZE`
//! bytes of HMAC-SHA256.

use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{KEY_SIZE, MAC_SIZE};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 keyed with a 32-byte MAC key.
///
/// HMAC zero-pads keys shorter than the hash block, so keying with the
/// padded 64-byte block is identical to keying with the raw 32 bytes.
fn keyed(mac_key: &[u8; KEY_SIZE]) -> HmacSha256 {
    let mut block = Key::<HmacSha256>::default();
    block[..KEY_SIZE].copy_from_slice(mac_key);
    <HmacSha256 as KeyInit>::new(&block)
}

fn keyed_over(mac_key: &[u8; KEY_SIZE], parts: &[&[u8]]) -> HmacSha256 {
    let mut mac = keyed(mac_key);
    for part in parts {
        mac.update(part);
    }
    mac
}

/// `HMAC-SHA256(parts[0] || parts[1] || ..., mac_key)[..MAC_SIZE]`
pub fn truncated_mac(mac_key: &[u8; KEY_SIZE], parts: &[&[u8]]) -> [u8; MAC_SIZE] {
    let full = keyed_over(mac_key, parts).finalize().into_bytes();
    let mut tag = [0u8; MAC_SIZE];
    tag.copy_from_slice(&full[..MAC_SIZE]);
    tag
}

/// Constant-time check of a truncated tag against the concatenated parts.
pub fn verify_truncated_mac(mac_key: &[u8; KEY_SIZE], parts: &[&[u8]], tag: &[u8]) -> bool {
    tag.len() == MAC_SIZE && keyed_over(mac_key, parts).verify_truncated_left(tag).is_ok()
}
