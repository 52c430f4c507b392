//! Data key generation and unwrapping.

use std::collections::HashMap;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::{KeyServiceError, DATA_KEY_BYTES, NONCE_BYTES};

/// A freshly generated data key.
///
/// The plaintext half is wiped from memory when the key is dropped.
pub struct DataKey {
    plaintext: Zeroizing<[u8; DATA_KEY_BYTES]>,
    wrapped: Vec<u8>,
}

impl DataKey {
    pub fn new(plaintext: Zeroizing<[u8; DATA_KEY_BYTES]>, wrapped: Vec<u8>) -> Self {
        Self { plaintext, wrapped }
    }

    pub fn plaintext(&self) -> &[u8; DATA_KEY_BYTES] {
        &self.plaintext
    }

    /// The data key encrypted under the key service's master key.
    pub fn wrapped(&self) -> &[u8] {
        &self.wrapped
    }

    /// Drop the plaintext key, keeping only the wrapped form.
    pub fn into_wrapped(self) -> Vec<u8> {
        self.wrapped
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("plaintext", &"<redacted>")
            .field("wrapped_len", &self.wrapped.len())
            .finish()
    }
}

/// Prefix every key alias carries in the key service.
pub const KEY_ALIAS_PREFIX: &str = "alias/";

/// Normalize a configured key alias: blank means no alias, and the `alias/`
/// prefix is added when missing.
pub fn normalize_key_alias(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == KEY_ALIAS_PREFIX {
        return None;
    }
    if raw.starts_with(KEY_ALIAS_PREFIX) {
        Some(raw.to_string())
    } else {
        Some(format!("{KEY_ALIAS_PREFIX}{raw}"))
    }
}

/// The two primitives of a key-management service.
///
/// Implementations are shared by concurrent requests.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Generate a new 256-bit data key under the master key named by `alias`.
    async fn generate_data_key(&self, alias: &str) -> Result<DataKey, KeyServiceError>;

    /// Recover the plaintext of a data key produced by [`generate_data_key`].
    ///
    /// [`generate_data_key`]: KeyService::generate_data_key
    async fn decrypt_data_key(
        &self,
        wrapped: &[u8],
    ) -> Result<Zeroizing<[u8; DATA_KEY_BYTES]>, KeyServiceError>;
}

/// In-process key service holding master keys by alias.
///
/// Wrapped keys carry the alias they were generated under:
///
/// ```text
/// alias_len (u8) || alias || nonce (12) || AES-256-GCM(data key) with alias as AAD
/// ```
#[derive(Default)]
pub struct LocalKeyService {
    master_keys: HashMap<String, Zeroizing<[u8; DATA_KEY_BYTES]>>,
}

impl std::fmt::Debug for LocalKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut aliases: Vec<_> = self.master_keys.keys().collect();
        aliases.sort();
        f.debug_struct("LocalKeyService")
            .field("aliases", &aliases)
            .finish_non_exhaustive()
    }
}

impl LocalKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a master key under `alias`.
    pub fn with_master_key(mut self, alias: impl Into<String>, key: [u8; DATA_KEY_BYTES]) -> Self {
        self.master_keys.insert(alias.into(), Zeroizing::new(key));
        self
    }

    /// Register a base64 encoded master key under `alias`.
    pub fn with_encoded_master_key(
        self,
        alias: impl Into<String>,
        encoded: &str,
    ) -> Result<Self, KeyServiceError> {
        let bytes = Zeroizing::new(
            base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|_| KeyServiceError::InvalidMasterKey)?,
        );
        let key: [u8; DATA_KEY_BYTES] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyServiceError::InvalidMasterKey)?;
        Ok(self.with_master_key(alias, key))
    }

    fn master_key(&self, alias: &str) -> Result<Aes256Gcm, KeyServiceError> {
        let key = self
            .master_keys
            .get(alias)
            .ok_or_else(|| KeyServiceError::UnknownKey(alias.to_string()))?;
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| KeyServiceError::Crypto("wrap"))
    }
}

#[async_trait]
impl KeyService for LocalKeyService {
    async fn generate_data_key(&self, alias: &str) -> Result<DataKey, KeyServiceError> {
        let alias_len = u8::try_from(alias.len())
            .map_err(|_| KeyServiceError::InvalidAlias(alias.to_string()))?;
        let master = self.master_key(alias)?;

        let mut plaintext = Zeroizing::new([0u8; DATA_KEY_BYTES]);
        rand::rng().fill_bytes(plaintext.as_mut_slice());

        let mut nonce_bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = master
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext.as_slice(),
                    aad: alias.as_bytes(),
                },
            )
            .map_err(|_| KeyServiceError::Crypto("wrap"))?;

        let mut wrapped = Vec::with_capacity(1 + alias.len() + NONCE_BYTES + ciphertext.len());
        wrapped.push(alias_len);
        wrapped.extend_from_slice(alias.as_bytes());
        wrapped.extend_from_slice(&nonce_bytes);
        wrapped.extend_from_slice(&ciphertext);

        Ok(DataKey::new(plaintext, wrapped))
    }

    async fn decrypt_data_key(
        &self,
        wrapped: &[u8],
    ) -> Result<Zeroizing<[u8; DATA_KEY_BYTES]>, KeyServiceError> {
        let (&alias_len, rest) = wrapped
            .split_first()
            .ok_or(KeyServiceError::MalformedWrappedKey)?;
        let alias_len = usize::from(alias_len);
        if rest.len() < alias_len + NONCE_BYTES {
            return Err(KeyServiceError::MalformedWrappedKey);
        }
        let (alias, rest) = rest.split_at(alias_len);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_BYTES);
        let alias = std::str::from_utf8(alias).map_err(|_| KeyServiceError::MalformedWrappedKey)?;

        let master = self.master_key(alias)?;
        let plaintext = Zeroizing::new(
            master
                .decrypt(
                    Nonce::from_slice(nonce_bytes),
                    Payload {
                        msg: ciphertext,
                        aad: alias.as_bytes(),
                    },
                )
                .map_err(|_| KeyServiceError::Crypto("unwrap"))?,
        );

        let key: [u8; DATA_KEY_BYTES] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| KeyServiceError::MalformedWrappedKey)?;
        Ok(Zeroizing::new(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LocalKeyService {
        LocalKeyService::new().with_master_key("alias/feed", [1u8; DATA_KEY_BYTES])
    }

    #[tokio::test]
    async fn test_generated_key_unwraps_to_same_plaintext() {
        let service = service();
        let key = service.generate_data_key("alias/feed").await.unwrap();

        let unwrapped = service.decrypt_data_key(key.wrapped()).await.unwrap();
        assert_eq!(*unwrapped, *key.plaintext());
    }

    #[tokio::test]
    async fn test_each_generation_yields_a_new_key() {
        let service = service();
        let a = service.generate_data_key("alias/feed").await.unwrap();
        let b = service.generate_data_key("alias/feed").await.unwrap();
        assert_ne!(a.plaintext(), b.plaintext());
        assert_ne!(a.wrapped(), b.wrapped());
    }

    #[tokio::test]
    async fn test_unknown_alias_is_rejected() {
        let err = service().generate_data_key("alias/other").await.unwrap_err();
        assert!(matches!(err, KeyServiceError::UnknownKey(alias) if alias == "alias/other"));
    }

    #[tokio::test]
    async fn test_wrapped_key_from_other_service_fails() {
        let key = service().generate_data_key("alias/feed").await.unwrap();
        let other = LocalKeyService::new().with_master_key("alias/feed", [2u8; DATA_KEY_BYTES]);

        let err = other.decrypt_data_key(key.wrapped()).await.unwrap_err();
        assert!(matches!(err, KeyServiceError::Crypto("unwrap")));
    }

    #[tokio::test]
    async fn test_truncated_wrapped_key_is_malformed() {
        let service = service();
        assert!(matches!(
            service.decrypt_data_key(&[]).await,
            Err(KeyServiceError::MalformedWrappedKey)
        ));
        assert!(matches!(
            service.decrypt_data_key(&[10, b'a']).await,
            Err(KeyServiceError::MalformedWrappedKey)
        ));
    }

    #[test]
    fn test_encoded_master_key_must_be_256_bits() {
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        assert!(matches!(
            LocalKeyService::new().with_encoded_master_key("alias/feed", &short),
            Err(KeyServiceError::InvalidMasterKey)
        ));

        let ok = base64::engine::general_purpose::STANDARD.encode([0u8; 32]);
        assert!(LocalKeyService::new()
            .with_encoded_master_key("alias/feed", &ok)
            .is_ok());
    }

    #[test]
    fn test_normalize_key_alias() {
        assert_eq!(normalize_key_alias(""), None);
        assert_eq!(normalize_key_alias("   "), None);
        assert_eq!(normalize_key_alias("alias/"), None);
        assert_eq!(normalize_key_alias("feed").as_deref(), Some("alias/feed"));
        assert_eq!(normalize_key_alias(" feed ").as_deref(), Some("alias/feed"));
        assert_eq!(
            normalize_key_alias("alias/feed").as_deref(),
            Some("alias/feed")
        );
    }

    #[test]
    fn test_local_key_service_debug_lists_aliases_only() {
        let service = LocalKeyService::new()
            .with_master_key("alias/feed", [0xAB; DATA_KEY_BYTES])
            .with_master_key("alias/audit", [0xAB; DATA_KEY_BYTES]);
        let rendered = format!("{service:?}");

        assert_eq!(
            rendered,
            r#"LocalKeyService { aliases: ["alias/audit", "alias/feed"], .. }"#
        );
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let key = DataKey::new(Zeroizing::new([9u8; DATA_KEY_BYTES]), vec![1, 2, 3]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains('9'));
    }
}
