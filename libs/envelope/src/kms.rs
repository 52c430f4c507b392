//! Key service backed by AWS KMS.
//!
//! Data keys are generated under a KMS key alias and unwrapped by KMS itself;
//! the wrapped form is the opaque `CiphertextBlob`, which names its own key.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::{error::DisplayErrorContext, primitives::Blob, types::DataKeySpec, Client};
use zeroize::Zeroizing;

use crate::{DataKey, KeyService, KeyServiceError, DATA_KEY_BYTES};

/// [`KeyService`] over a KMS client.
#[derive(Debug, Clone)]
pub struct KmsKeyService {
    client: Client,
}

impl KmsKeyService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client configured from the standard AWS environment (region,
    /// credentials chain, endpoint overrides).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&config))
    }
}

fn data_key_bytes(blob: &Blob) -> Result<Zeroizing<[u8; DATA_KEY_BYTES]>, KeyServiceError> {
    let key: [u8; DATA_KEY_BYTES] = blob
        .as_ref()
        .try_into()
        .map_err(|_| KeyServiceError::IncompleteResponse("256-bit Plaintext"))?;
    Ok(Zeroizing::new(key))
}

#[async_trait]
impl KeyService for KmsKeyService {
    async fn generate_data_key(&self, alias: &str) -> Result<DataKey, KeyServiceError> {
        let output = self
            .client
            .generate_data_key()
            .key_id(alias)
            .key_spec(DataKeySpec::Aes256)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(e) if e.is_not_found_exception() => {
                    KeyServiceError::UnknownKey(alias.to_string())
                }
                _ => KeyServiceError::Unavailable(DisplayErrorContext(&err).to_string()),
            })?;

        let plaintext = output
            .plaintext()
            .ok_or(KeyServiceError::IncompleteResponse("Plaintext"))
            .and_then(data_key_bytes)?;
        let wrapped = output
            .ciphertext_blob()
            .ok_or(KeyServiceError::IncompleteResponse("CiphertextBlob"))?
            .as_ref()
            .to_vec();

        Ok(DataKey::new(plaintext, wrapped))
    }

    async fn decrypt_data_key(
        &self,
        wrapped: &[u8],
    ) -> Result<Zeroizing<[u8; DATA_KEY_BYTES]>, KeyServiceError> {
        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(wrapped))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(e)
                    if e.is_invalid_ciphertext_exception() || e.is_incorrect_key_exception() =>
                {
                    KeyServiceError::Crypto("unwrap")
                }
                _ => KeyServiceError::Unavailable(DisplayErrorContext(&err).to_string()),
            })?;

        output
            .plaintext()
            .ok_or(KeyServiceError::IncompleteResponse("Plaintext"))
            .and_then(data_key_bytes)
    }
}
