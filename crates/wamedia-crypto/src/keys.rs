//! Media key handling: 32-byte media key → HKDF-SHA256 expansion → fixed key split
//!
//! Expanded layout (112 bytes, `info` = category label, no salt):
//! ```text
//! [0..16)   IV
//! [16..48)  cipher key (AES-256-CBC)
//! [48..80)  MAC key    (HMAC-SHA256)
//! [80..112) ref key    (reserved for out-of-band reference checks)
//! ```

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use wamedia_core::{MediaCategory, MediaError, MediaResult};

use crate::{IV_SIZE, KEY_SIZE};

/// Total HKDF output length.
pub const EXPANDED_KEY_SIZE: usize = IV_SIZE + 3 * KEY_SIZE;

/// The raw 32-byte media key shared between sender and receiver. Zeroized on drop.
#[derive(Clone)]
pub struct MediaKey {
    bytes: [u8; KEY_SIZE],
}

impl MediaKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Length-checked construction from an arbitrary slice.
    pub fn from_slice(bytes: &[u8]) -> MediaResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| MediaError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Generate a random media key for a new upload.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MediaKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Per-operation key set split out of the expanded media key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKeys {
    iv: [u8; IV_SIZE],
    cipher_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
    ref_key: [u8; KEY_SIZE],
}

impl DerivedKeys {
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    pub fn cipher_key(&self) -> &[u8; KEY_SIZE] {
        &self.cipher_key
    }

    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }

    /// Derived alongside the others but not used by the seal/open pipelines.
    pub fn ref_key(&self) -> &[u8; KEY_SIZE] {
        &self.ref_key
    }

    /// `iv || ciphertext || mac`: the byte layout the sidecar is computed over.
    pub fn signed_blob(&self, ciphertext: &[u8], mac: &[u8]) -> Vec<u8> {
        let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len() + mac.len());
        blob.extend_from_slice(&self.iv);
        blob.extend_from_slice(ciphertext);
        blob.extend_from_slice(mac);
        blob
    }
}

impl Drop for DerivedKeys {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.cipher_key.zeroize();
        self.mac_key.zeroize();
        self.ref_key.zeroize();
    }
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("iv", &"[REDACTED]")
            .field("cipher_key", &"[REDACTED]")
            .field("mac_key", &"[REDACTED]")
            .field("ref_key", &"[REDACTED]")
            .finish()
    }
}

/// Expand a media key for `category` via HKDF-SHA256 and split it.
///
/// Deterministic: the same key and category always yield the same key set.
pub fn derive_keys(media_key: &MediaKey, category: MediaCategory) -> MediaResult<DerivedKeys> {
    let hkdf = Hkdf::<Sha256>::new(None, media_key.as_bytes());
    let mut okm = [0u8; EXPANDED_KEY_SIZE];
    hkdf.expand(category.hkdf_label(), &mut okm)
        .map_err(|e| MediaError::KeyDerivationFailure(format!("HKDF expand failed: {e}")))?;

    let mut keys = DerivedKeys {
        iv: [0u8; IV_SIZE],
        cipher_key: [0u8; KEY_SIZE],
        mac_key: [0u8; KEY_SIZE],
        ref_key: [0u8; KEY_SIZE],
    };
    let (iv, rest) = okm.split_at(IV_SIZE);
    let (cipher_key, rest) = rest.split_at(KEY_SIZE);
    let (mac_key, ref_key) = rest.split_at(KEY_SIZE);
    keys.iv.copy_from_slice(iv);
    keys.cipher_key.copy_from_slice(cipher_key);
    keys.mac_key.copy_from_slice(mac_key);
    keys.ref_key.copy_from_slice(ref_key);
    okm.zeroize();

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn test_media_key() -> MediaKey {
        MediaKey::from_bytes([42u8; KEY_SIZE])
    }

    #[test]
    fn test_derive_deterministic() {
        for category in MediaCategory::ALL {
            let k1 = derive_keys(&test_media_key(), category).unwrap();
            let k2 = derive_keys(&test_media_key(), category).unwrap();
            assert_eq!(k1, k2, "derivation must be deterministic for {category}");
        }
    }

    #[test]
    fn test_known_answer_video_keys() {
        let key = MediaKey::from_bytes(std::array::from_fn(|i| i as u8));
        let keys = derive_keys(&key, MediaCategory::Video).unwrap();

        assert_eq!(keys.iv(), &hex!("f1dee5782cc4e2e7b07233b1e25de59b"));
        assert_eq!(
            keys.cipher_key(),
            &hex!("8564567ee06fa7006edab56a13c2b0a1431beb8efe698efad0f258e65feb5395")
        );
        assert_eq!(
            keys.mac_key(),
            &hex!("259ad46118adcf3cd134ae881831c6865db31a8fa0bbce7bc3bcb9fcf369fcda")
        );
        assert_eq!(
            keys.ref_key(),
            &hex!("9a63d5eb49eb03827d842400a27dbfb62efc9ebeb6f62b45df4575de4a871856")
        );
    }

    #[test]
    fn test_known_answer_image_keys() {
        let key = MediaKey::from_bytes(std::array::from_fn(|i| i as u8));
        let keys = derive_keys(&key, MediaCategory::Image).unwrap();

        assert_eq!(keys.iv(), &hex!("aa6a127218397cbd2383e4ccf7176a79"));
        assert_eq!(
            keys.cipher_key(),
            &hex!("008c9aea9b7c5d81eb56b3f530f87d42dcc92d27b11ad6b5bd66f0560d0d8c46")
        );
        assert_eq!(
            keys.mac_key(),
            &hex!("91d09ffec108833c1699574c52657923fb6e3e161d9698bc6b3a05fbc508a515")
        );
        assert_eq!(
            keys.ref_key(),
            &hex!("4d4981725e9eb39838fcff2130508f1360cbb319f99cef163d57ab7c050a667e")
        );
    }

    #[test]
    fn test_split_matches_raw_expansion() {
        let key = test_media_key();
        let keys = derive_keys(&key, MediaCategory::Video).unwrap();

        let mut okm = [0u8; EXPANDED_KEY_SIZE];
        Hkdf::<Sha256>::new(None, key.as_bytes())
            .expand(b"WhatsApp Video Keys", &mut okm)
            .unwrap();

        assert_eq!(keys.iv(), &okm[0..16]);
        assert_eq!(keys.cipher_key(), &okm[16..48]);
        assert_eq!(keys.mac_key(), &okm[48..80]);
        assert_eq!(keys.ref_key(), &okm[80..112]);
    }

    #[test]
    fn test_empty_salt_equals_no_salt() {
        let key = test_media_key();
        let keys = derive_keys(&key, MediaCategory::Audio).unwrap();

        let mut okm = [0u8; EXPANDED_KEY_SIZE];
        Hkdf::<Sha256>::new(Some(&[]), key.as_bytes())
            .expand(b"WhatsApp Audio Keys", &mut okm)
            .unwrap();

        assert_eq!(keys.iv(), &okm[0..16]);
    }

    #[test]
    fn test_categories_produce_different_keys() {
        let key = test_media_key();
        let image = derive_keys(&key, MediaCategory::Image).unwrap();
        let document = derive_keys(&key, MediaCategory::Document).unwrap();
        assert_ne!(image.cipher_key(), document.cipher_key());
        assert_ne!(image.mac_key(), document.mac_key());
    }

    #[test]
    fn test_media_key_from_slice_length_check() {
        assert!(MediaKey::from_slice(&[1u8; KEY_SIZE]).is_ok());
        let err = MediaKey::from_slice(&[1u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            MediaError::InvalidKeyLength { expected: 32, actual: 31 }
        ));
    }

    #[test]
    fn test_generated_keys_differ() {
        let k1 = MediaKey::generate();
        let k2 = MediaKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_debug_redacts_material() {
        let keys = derive_keys(&test_media_key(), MediaCategory::Image).unwrap();
        let rendered = format!("{keys:?} {:?}", test_media_key());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("42"));
    }

    #[test]
    fn test_signed_blob_layout() {
        let keys = derive_keys(&test_media_key(), MediaCategory::Video).unwrap();
        let blob = keys.signed_blob(b"cipher", b"0123456789");
        assert_eq!(&blob[..IV_SIZE], keys.iv());
        assert_eq!(&blob[IV_SIZE..IV_SIZE + 6], b"cipher");
        assert_eq!(&blob[IV_SIZE + 6..], b"0123456789");
    }
}
