//! Response envelope encryption.
//!
//! The cipher is chosen once at startup: without a key alias every response
//! body is passed through untouched, with one every body is replaced by an
//! `esfeed_envelope` envelope sealed under a fresh data key.

use std::sync::Arc;

use bytes::Bytes;
use esfeed_envelope::{
    EnvelopeError, KeyService, KeyServiceError, KmsKeyService, LocalKeyService,
};
use thiserror::Error;
use tracing::info;

use crate::config::{EncryptionConfig, MasterKeySource};

#[derive(Debug, Error)]
pub enum CipherError {
    /// The key service could not produce a data key for the alias.
    #[error("key service unreachable for {alias}: {source}")]
    KeyUnreachable {
        alias: String,
        #[source]
        source: KeyServiceError,
    },

    /// Encrypting a response failed.
    #[error("response encryption failed: {0}")]
    Encrypt(#[from] EnvelopeError),

    /// The key service could not be built from configuration.
    #[error("invalid encryption configuration: {0}")]
    Config(String),
}

/// Transforms serialized documents into response bodies.
#[derive(Clone)]
pub enum EnvelopeCipher {
    /// Bodies are sent as serialized.
    Disabled,
    /// Bodies are sealed under a per-response data key.
    Enabled {
        key_service: Arc<dyn KeyService>,
        key_alias: String,
    },
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeCipher::Disabled => f.write_str("Disabled"),
            EnvelopeCipher::Enabled { key_alias, .. } => f
                .debug_struct("Enabled")
                .field("key_alias", key_alias)
                .finish_non_exhaustive(),
        }
    }
}

impl EnvelopeCipher {
    pub fn disabled() -> Self {
        EnvelopeCipher::Disabled
    }

    pub fn enabled(key_service: Arc<dyn KeyService>, key_alias: impl Into<String>) -> Self {
        EnvelopeCipher::Enabled {
            key_service,
            key_alias: key_alias.into(),
        }
    }

    /// Build the cipher from configuration.
    ///
    /// A configured master key selects the local key service, otherwise data
    /// keys come from KMS.
    pub async fn from_config(config: &EncryptionConfig) -> Result<Self, CipherError> {
        let Some(key_alias) = config.key_alias.as_deref() else {
            return Ok(Self::disabled());
        };

        let key_service: Arc<dyn KeyService> = match &config.master_key {
            Some(source) => {
                info!(key_alias = %key_alias, backend = "local", "Response encryption enabled");
                Arc::new(local_key_service(key_alias, source)?)
            }
            None => {
                info!(key_alias = %key_alias, backend = "kms", "Response encryption enabled");
                Arc::new(KmsKeyService::from_env().await)
            }
        };
        Ok(Self::enabled(key_service, key_alias))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, EnvelopeCipher::Enabled { .. })
    }

    /// Check that a data key can be generated under the configured alias.
    ///
    /// The generated key is discarded. Always succeeds when disabled.
    pub async fn check_health(&self) -> Result<(), CipherError> {
        match self {
            EnvelopeCipher::Disabled => Ok(()),
            EnvelopeCipher::Enabled {
                key_service,
                key_alias,
            } => key_service
                .generate_data_key(key_alias)
                .await
                .map(drop)
                .map_err(|source| CipherError::KeyUnreachable {
                    alias: key_alias.clone(),
                    source,
                }),
        }
    }

    /// Produce the response body for a serialized document.
    pub async fn transform(&self, document: Vec<u8>) -> Result<Bytes, CipherError> {
        match self {
            EnvelopeCipher::Disabled => Ok(Bytes::from(document)),
            EnvelopeCipher::Enabled {
                key_service,
                key_alias,
            } => {
                let envelope =
                    esfeed_envelope::encrypt(key_service.as_ref(), key_alias, &document).await?;
                Ok(Bytes::from(envelope.encode()))
            }
        }
    }
}

fn local_key_service(
    key_alias: &str,
    source: &MasterKeySource,
) -> Result<LocalKeyService, CipherError> {
    let encoded = source
        .load()
        .map_err(|e| CipherError::Config(format!("{e:#}")))?;
    LocalKeyService::new()
        .with_encoded_master_key(key_alias, &encoded)
        .map_err(|e| CipherError::Config(e.to_string()))
}
