//! The `wrapped_key::payload` envelope.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{aead, EnvelopeError, KeyService};

/// Separator between the wrapped key and the sealed payload.
pub const SEPARATOR: &str = "::";

/// An encrypted response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Data key wrapped by the key service.
    pub wrapped_key: Vec<u8>,

    /// `nonce || ciphertext || tag`.
    pub sealed: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Render the envelope as `base64(wrapped_key)::base64(sealed)`.
    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            STANDARD.encode(&self.wrapped_key),
            STANDARD.encode(&self.sealed)
        )
    }

    /// Parse an encoded envelope.
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let body = std::str::from_utf8(body)
            .map_err(|_| EnvelopeError::Malformed("envelope is not valid UTF-8"))?;

        let (key_part, payload_part) = body
            .split_once(SEPARATOR)
            .ok_or(EnvelopeError::Malformed("missing key separator"))?;
        if payload_part.contains(SEPARATOR) {
            return Err(EnvelopeError::Malformed("more than two envelope parts"));
        }

        Ok(Self {
            wrapped_key: STANDARD.decode(key_part.trim())?,
            sealed: STANDARD.decode(payload_part.trim())?,
        })
    }
}

/// Seal `plaintext` under a fresh data key generated for `alias`.
///
/// The plaintext data key is wiped as soon as the payload is sealed.
pub async fn encrypt<K>(
    key_service: &K,
    alias: &str,
    plaintext: &[u8],
) -> Result<EncryptedEnvelope, EnvelopeError>
where
    K: KeyService + ?Sized,
{
    let data_key = key_service.generate_data_key(alias).await?;
    let sealed = aead::seal(data_key.plaintext(), plaintext)?;

    Ok(EncryptedEnvelope {
        wrapped_key: data_key.into_wrapped(),
        sealed,
    })
}

/// Open an encoded envelope produced by [`encrypt`].
pub async fn decrypt<K>(key_service: &K, body: &[u8]) -> Result<Vec<u8>, EnvelopeError>
where
    K: KeyService + ?Sized,
{
    let envelope = EncryptedEnvelope::parse(body)?;
    let data_key = key_service.decrypt_data_key(&envelope.wrapped_key).await?;
    aead::open(&data_key, &envelope.sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalKeyService, DATA_KEY_BYTES};
    use proptest::prelude::*;

    const ALIAS: &str = "alias/feed";

    fn service() -> LocalKeyService {
        LocalKeyService::new().with_master_key(ALIAS, [3u8; DATA_KEY_BYTES])
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt() {
        let service = service();
        let body = encrypt(&service, ALIAS, b"<feed>recent</feed>")
            .await
            .unwrap()
            .encode();

        assert_eq!(body.matches(SEPARATOR).count(), 1);
        assert_eq!(
            decrypt(&service, body.as_bytes()).await.unwrap(),
            b"<feed>recent</feed>"
        );
    }

    #[tokio::test]
    async fn test_encrypt_never_reuses_data_key() {
        let service = service();
        let a = encrypt(&service, ALIAS, b"x").await.unwrap();
        let b = encrypt(&service, ALIAS, b"x").await.unwrap();
        assert_ne!(a.wrapped_key, b.wrapped_key);
        assert_ne!(a.sealed, b.sealed);
    }

    #[tokio::test]
    async fn test_encrypt_fails_for_unknown_alias() {
        let err = encrypt(&service(), "alias/missing", b"x").await.unwrap_err();
        assert!(matches!(err, EnvelopeError::KeyService(_)));
    }

    #[test]
    fn test_parse_requires_separator() {
        assert!(matches!(
            EncryptedEnvelope::parse(b"<feed/>"),
            Err(EnvelopeError::Malformed(_))
        ));
        assert!(matches!(
            EncryptedEnvelope::parse(b"YQ==::Yg==::Yw=="),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(matches!(
            EncryptedEnvelope::parse(b"not base64!::YQ=="),
            Err(EnvelopeError::Encoding(_))
        ));
    }

    #[test]
    fn test_encode_parse_preserves_parts() {
        let envelope = EncryptedEnvelope {
            wrapped_key: vec![1, 2, 3],
            sealed: vec![4, 5, 6, 7],
        };
        assert_eq!(envelope.encode(), "AQID::BAUGBw==");
        assert_eq!(
            EncryptedEnvelope::parse(envelope.encode().as_bytes()).unwrap(),
            envelope
        );
    }

    proptest! {
        #[test]
        fn prop_decrypt_inverts_encrypt(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let service = service();
            let opened = rt.block_on(async {
                let body = encrypt(&service, ALIAS, &payload).await.unwrap().encode();
                decrypt(&service, body.as_bytes()).await.unwrap()
            });
            prop_assert_eq!(opened, payload);
        }
    }
}
