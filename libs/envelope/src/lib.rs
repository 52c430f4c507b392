//! Envelope encryption for feed responses.
//!
//! Every encrypted response is sealed under its own data key:
//! - Data key: fresh 256-bit key generated by a [`KeyService`] per response
//! - Wrapped key: the data key encrypted by the key service's master key
//!
//! Cipher: AES-256-GCM with a random 96-bit nonce prepended to the ciphertext.
//!
//! # Wire format
//!
//! ```text
//! base64(wrapped_key) "::" base64(nonce || ciphertext || tag)
//! ```
//!
//! Consumers split on `::`, ask the key service to unwrap the data key and
//! open the ciphertext with it.
//!
//! Key services: [`KmsKeyService`] for deployments, [`LocalKeyService`] for
//! development and tests.

mod aead;
mod envelope;
mod error;
mod key_service;
mod kms;

pub use aead::{open, seal, DATA_KEY_BYTES, NONCE_BYTES};
pub use envelope::{decrypt, encrypt, EncryptedEnvelope, SEPARATOR};
pub use error::{EnvelopeError, KeyServiceError};
pub use key_service::{
    normalize_key_alias, DataKey, KeyService, LocalKeyService, KEY_ALIAS_PREFIX,
};
pub use kms::KmsKeyService;
pub use zeroize::Zeroizing;
