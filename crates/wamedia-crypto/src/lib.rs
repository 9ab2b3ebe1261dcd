//! wamedia-crypto: WhatsApp media transport encryption
//!
//! Pipeline: media key → HKDF-SHA256 split → AES-256-CBC → truncated HMAC → envelope (+ sidecar)
//!
//! Key material:
//! ```text
//! Media Key (32 bytes, random per upload)
//!   └── HKDF-SHA256(info = "WhatsApp <Category> Keys", len = 112)
//!       ├── IV          [0..16)
//!       ├── Cipher Key  [16..48)   AES-256-CBC, PKCS#7
//!       ├── MAC Key     [48..80)   HMAC-SHA256 over iv || ciphertext, first 10 bytes
//!       └── Ref Key     [80..112)  reserved
//! ```
//!
//! Video and audio additionally get a sidecar: one 10-byte MAC per 64 KiB
//! window of `iv || ciphertext || mac`, so receivers can check a download
//! as it streams in.

pub mod buffer;
pub mod envelope;
pub mod keys;
pub mod mac;
pub mod open;
pub mod seal;
pub mod sidecar;
mod stream;

pub use buffer::SpillBuffer;
pub use envelope::{open_envelope, seal_envelope, Envelope};
pub use keys::{derive_keys, DerivedKeys, MediaKey};
pub use open::{OpenPipeline, OpenState};
pub use seal::{SealPipeline, SealState};
pub use sidecar::{generate_sidecar, sidecar_len, verify_sidecar_chunk};
pub use wamedia_core::{BufferConfig, MediaCategory, MediaError, MediaResult};

/// Size of the media key and of each derived 256-bit key
pub const KEY_SIZE: usize = 32;

/// Size of the AES-CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of the truncated HMAC-SHA256 tag (envelope and sidecar entries)
pub const MAC_SIZE: usize = 10;

/// Result of sealing a payload in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMedia {
    /// `ciphertext || mac`, as uploaded
    pub envelope: Vec<u8>,
    /// Present for streamable categories only
    pub sidecar: Option<Vec<u8>>,
}

/// Seal an in-memory payload without going through a stream.
pub fn seal_bytes(
    plaintext: &[u8],
    media_key: &MediaKey,
    category: MediaCategory,
) -> MediaResult<SealedMedia> {
    let keys = derive_keys(media_key, category)?;
    let envelope = seal_envelope(&keys, plaintext)?;
    let sidecar = category
        .is_streamable()
        .then(|| generate_sidecar(&envelope.signed_blob(&keys), keys.mac_key()));
    Ok(SealedMedia {
        envelope: envelope.to_bytes(),
        sidecar,
    })
}

/// Verify and decrypt an in-memory envelope.
pub fn open_bytes(
    envelope: &[u8],
    media_key: &MediaKey,
    category: MediaCategory,
) -> MediaResult<Vec<u8>> {
    let keys = derive_keys(media_key, category)?;
    open_envelope(&keys, envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_roundtrip_all_categories() {
        let key = MediaKey::generate();
        for category in MediaCategory::ALL {
            let sealed = seal_bytes(b"one shot", &key, category).unwrap();
            assert_eq!(sealed.sidecar.is_some(), category.is_streamable());
            assert_eq!(open_bytes(&sealed.envelope, &key, category).unwrap(), b"one shot");
        }
    }

    #[test]
    fn test_one_shot_matches_pipeline() {
        let key = MediaKey::from_bytes([1u8; KEY_SIZE]);
        let sealed = seal_bytes(b"same bytes", &key, MediaCategory::Audio).unwrap();

        let mut pipeline =
            SealPipeline::new(std::io::Cursor::new(Vec::new()), &key, MediaCategory::Audio).unwrap();
        pipeline.write_plaintext(b"same bytes").unwrap();
        assert_eq!(pipeline.contents().unwrap(), sealed.envelope);
        assert_eq!(pipeline.sidecar().unwrap(), sealed.sidecar.as_deref());
    }
}
