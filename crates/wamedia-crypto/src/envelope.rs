//! AES-256-CBC + truncated HMAC-SHA256 envelope
//!
//! Envelope format (binary):
//! ```text
//! [N bytes: AES-256-CBC ciphertext, PKCS#7 padded][10 bytes: MAC]
//! MAC = HMAC-SHA256(iv || ciphertext, mac_key)[..10]
//! ```
//!
//! The IV is not transmitted; both sides derive it from the media key.
//! Opening verifies the MAC before any decryption is attempted.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use wamedia_core::{MediaError, MediaResult};

use crate::keys::DerivedKeys;
use crate::mac::{truncated_mac, verify_truncated_mac};
use crate::MAC_SIZE;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// A sealed payload, kept in parts so the sidecar can be computed without re-splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub ciphertext: Vec<u8>,
    pub mac: [u8; MAC_SIZE],
}

impl Envelope {
    /// Wire length: ciphertext plus tag.
    pub fn len(&self) -> usize {
        self.ciphertext.len() + MAC_SIZE
    }

    /// Always false: even an empty plaintext seals to a padding block and a tag.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `ciphertext || mac`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.mac);
        out
    }

    /// `iv || ciphertext || mac`, the input to the sidecar generator.
    pub fn signed_blob(&self, keys: &DerivedKeys) -> Vec<u8> {
        keys.signed_blob(&self.ciphertext, &self.mac)
    }
}

/// Encrypt and tag `plaintext`. An empty plaintext yields one padding block.
pub fn seal_envelope(keys: &DerivedKeys, plaintext: &[u8]) -> MediaResult<Envelope> {
    let cipher = Aes256CbcEnc::new_from_slices(keys.cipher_key(), keys.iv())
        .map_err(|e| MediaError::CipherFailure(format!("AES-256-CBC init failed: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mac = truncated_mac(keys.mac_key(), &[keys.iv().as_slice(), ciphertext.as_slice()]);
    Ok(Envelope { ciphertext, mac })
}

/// Verify and decrypt a wire envelope (`ciphertext || mac`).
pub fn open_envelope(keys: &DerivedKeys, envelope: &[u8]) -> MediaResult<Vec<u8>> {
    if envelope.len() < MAC_SIZE {
        return Err(MediaError::MalformedPayload {
            len: envelope.len(),
            min: MAC_SIZE,
        });
    }

    let (ciphertext, received_mac) = envelope.split_at(envelope.len() - MAC_SIZE);
    if !verify_truncated_mac(keys.mac_key(), &[keys.iv().as_slice(), ciphertext], received_mac) {
        return Err(MediaError::AuthenticationFailure);
    }

    let cipher = Aes256CbcDec::new_from_slices(keys.cipher_key(), keys.iv())
        .map_err(|e| MediaError::CipherFailure(format!("AES-256-CBC init failed: {e}")))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| MediaError::CipherFailure(format!("AES-256-CBC decryption failed: {e}")))
}
