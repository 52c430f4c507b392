//! AES-256-GCM sealing with a prepended random nonce.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::EnvelopeError;

/// Data key length in bytes.
pub const DATA_KEY_BYTES: usize = 32;

/// Nonce length in bytes.
pub const NONCE_BYTES: usize = 12;

/// Encrypt `plaintext` under `key`, returning `nonce || ciphertext || tag`.
///
/// No additional authenticated data is bound.
pub fn seal(key: &[u8; DATA_KEY_BYTES], plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EnvelopeError::SealFailed)?;

    let mut nonce_bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EnvelopeError::SealFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt the output of [`seal`].
pub fn open(key: &[u8; DATA_KEY_BYTES], sealed: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if sealed.len() < NONCE_BYTES {
        return Err(EnvelopeError::Malformed("ciphertext shorter than nonce"));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_BYTES);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EnvelopeError::OpenFailed)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EnvelopeError::OpenFailed)
}
