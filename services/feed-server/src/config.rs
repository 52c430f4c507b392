use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use esfeed_envelope::{normalize_key_alias, Zeroizing};

use crate::db::DbConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub health_listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub links: LinkConfig,
    pub encryption: EncryptionConfig,
    pub database: DbConfig,
}

/// Where link relations point.
///
/// The host can differ from the listen address when the feed is served through
/// a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// `host[:port]` written into every href.
    pub host: String,

    /// URL scheme written into every href.
    pub proto: String,
}

impl LinkConfig {
    pub fn new(host: impl Into<String>, proto: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            proto: proto.into(),
        }
    }

    /// Absolute URL for `path`.
    pub fn href(&self, path: &str) -> String {
        format!("{}://{}{}", self.proto, self.host, path)
    }
}

/// Response encryption settings. No key alias means responses are served in the clear.
///
/// With a key alias, a master key selects the local key service; without one
/// data keys come from KMS.
#[derive(Debug, Clone, Default)]
pub struct EncryptionConfig {
    pub key_alias: Option<String>,
    pub master_key: Option<MasterKeySource>,
}

/// Master key material for the local key service.
#[derive(Clone)]
pub enum MasterKeySource {
    /// Base64 encoded key.
    Inline(String),
    /// File holding the base64 encoded key.
    File(PathBuf),
}

impl std::fmt::Debug for MasterKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MasterKeySource::Inline(_) => f.write_str("Inline(<redacted>)"),
            MasterKeySource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl MasterKeySource {
    /// Read the base64 encoded key.
    pub fn load(&self) -> Result<Zeroizing<String>> {
        match self {
            MasterKeySource::Inline(encoded) => Ok(Zeroizing::new(encoded.clone())),
            MasterKeySource::File(path) => std::fs::read_to_string(path)
                .map(Zeroizing::new)
                .with_context(|| format!("failed to read master key file {}", path.display())),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// Every missing required value is reported, not just the first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut problems = Vec::new();

        let listen_addr = lookup("ESFEED_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .context("invalid ESFEED_LISTEN_ADDR")?;

        let health_listen_addr = lookup("ESFEED_HEALTH_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:4567".to_string())
            .parse()
            .context("invalid ESFEED_HEALTH_LISTEN_ADDR")?;

        let log_level = lookup("ESFEED_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dev_mode = lookup("ESFEED_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let link_host = lookup("ESFEED_LINK_HOST").unwrap_or_default();
        if link_host.trim().is_empty() {
            problems.push("missing ESFEED_LINK_HOST (host:port used in feed links)");
        }
        let link_proto = lookup("ESFEED_LINK_PROTO")
            .filter(|proto| !proto.trim().is_empty())
            .unwrap_or_else(|| "https".to_string());

        let key_alias = lookup("ESFEED_KEY_ALIAS")
            .as_deref()
            .and_then(normalize_key_alias);
        let master_key = lookup("ESFEED_KMS_MASTER_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(MasterKeySource::Inline)
            .or_else(|| {
                lookup("ESFEED_KMS_MASTER_KEY_FILE")
                    .filter(|path| !path.trim().is_empty())
                    .map(|path| MasterKeySource::File(PathBuf::from(path)))
            });
        if !problems.is_empty() {
            bail!("invalid configuration: {}", problems.join("; "));
        }

        Ok(Self {
            listen_addr,
            health_listen_addr,
            log_level,
            dev_mode,
            links: LinkConfig::new(link_host.trim(), link_proto.trim()),
            encryption: EncryptionConfig {
                key_alias,
                master_key,
            },
            database: DbConfig::from_lookup(&lookup),
        })
    }
}
