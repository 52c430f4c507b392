//! Envelope and key service errors.

use thiserror::Error;

/// Errors raised by a key service.
#[derive(Debug, Error)]
pub enum KeyServiceError {
    /// No master key is registered under the alias.
    #[error("unknown key alias: {0}")]
    UnknownKey(String),

    /// The master key material is not a base64 encoded 256-bit key.
    #[error("invalid master key encoding")]
    InvalidMasterKey,

    /// The alias does not fit the wrapped key format.
    #[error("invalid key alias: {0}")]
    InvalidAlias(String),

    /// The wrapped key blob could not be parsed.
    #[error("malformed wrapped data key")]
    MalformedWrappedKey,

    /// Wrapping or unwrapping a data key failed.
    #[error("data key {0} failed")]
    Crypto(&'static str),

    /// The key service answered without a field the operation needs.
    #[error("key service response has no {0}")]
    IncompleteResponse(&'static str),

    /// The key service could not be reached.
    #[error("key service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while sealing or opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Generating or unwrapping the data key failed.
    #[error(transparent)]
    KeyService(#[from] KeyServiceError),

    /// The body does not have the `key::payload` shape.
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    /// One of the envelope parts is not valid base64.
    #[error("invalid envelope encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// AEAD encryption failed.
    #[error("payload encryption failed")]
    SealFailed,

    /// AEAD decryption failed (wrong key or tampered ciphertext).
    #[error("payload decryption failed")]
    OpenFailed,
}
