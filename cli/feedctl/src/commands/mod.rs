//! CLI commands.

mod event;
mod feed;
mod walk;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use esfeed_envelope::{
    normalize_key_alias, KeyService, KmsKeyService, LocalKeyService, Zeroizing,
};

use crate::client::FeedClient;
use crate::output::OutputFormat;

/// feedctl - Read the event store feed.
#[derive(Debug, Parser)]
#[command(name = "feedctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feed server base URL.
    #[arg(long, global = true, env = "ESFEED_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Key alias the server encrypts responses under. Enables decryption,
    /// through KMS unless a master key is given.
    #[arg(long, global = true, env = "ESFEED_KEY_ALIAS")]
    key_alias: Option<String>,

    /// Base64 encoded master key for the key alias (local key service).
    #[arg(long, global = true, env = "ESFEED_KMS_MASTER_KEY", hide_env_values = true)]
    master_key: Option<String>,

    /// File holding the base64 encoded master key.
    #[arg(long, global = true, env = "ESFEED_KMS_MASTER_KEY_FILE", conflicts_with = "master_key")]
    master_key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the recent page.
    Recent,

    /// Show an archive page.
    Archive(feed::ArchiveArgs),

    /// Show a single event.
    Event(event::EventArgs),

    /// Follow the archive chain to the first page and list every entry, oldest first.
    Walk(walk::WalkArgs),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let key_service = self.key_service().await?;
        let ctx = CommandContext {
            client: FeedClient::new(&self.url, key_service)?,
            format: self.format,
        };

        match self.command {
            Commands::Recent => feed::show_recent(ctx).await,
            Commands::Archive(args) => feed::show_archive(ctx, args).await,
            Commands::Event(args) => event::show_event(ctx, args).await,
            Commands::Walk(args) => walk::run(ctx, args).await,
            Commands::Version => {
                println!("feedctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }

    /// Key service for opening encrypted responses, when a key alias is given.
    async fn key_service(&self) -> Result<Option<Arc<dyn KeyService>>> {
        if self.key_alias.as_deref().and_then(normalize_key_alias).is_none() {
            return Ok(None);
        }
        let key_service: Arc<dyn KeyService> = match self.local_key_service()? {
            Some(local) => Arc::new(local),
            None => Arc::new(KmsKeyService::from_env().await),
        };
        Ok(Some(key_service))
    }

    /// Local key service, when a key alias and a master key are both given.
    fn local_key_service(&self) -> Result<Option<LocalKeyService>> {
        let Some(alias) = self.key_alias.as_deref().and_then(normalize_key_alias) else {
            return Ok(None);
        };

        let encoded = match (&self.master_key, &self.master_key_file) {
            (Some(key), _) => Zeroizing::new(key.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Zeroizing::new)
                .with_context(|| format!("Failed to read master key file {}", path.display()))?,
            (None, None) => return Ok(None),
        };

        let key_service = LocalKeyService::new()
            .with_encoded_master_key(alias, &encoded)
            .context("Invalid master key")?;
        Ok(Some(key_service))
    }
}

/// Shared command context.
pub struct CommandContext {
    pub client: FeedClient,
    pub format: OutputFormat,
}
