//! Error handling and display for the CLI.

use colored::Colorize;
use esfeed_atom::AtomError;
use esfeed_envelope::EnvelopeError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Server returned {status} for {path}")]
    Api { status: u16, path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decrypt response: {0}")]
    Decrypt(#[from] EnvelopeError),

    #[error("Failed to parse document: {0}")]
    Parse(#[from] AtomError),

    #[error("Response for {0} is not valid UTF-8")]
    NotUtf8(String),

    #[error("Archive chain loops back to {0}")]
    Cycle(String),

    #[error("Link does not point at a feed page: {0}")]
    ForeignLink(String),
}

impl CliError {
    pub fn api(status: u16, path: impl Into<String>) -> Self {
        Self::Api {
            status,
            path: path.into(),
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        let hint = match cli_err {
            CliError::Api { status: 400, .. } => {
                Some("Hint: event versions are non-negative integers.")
            }
            CliError::Api { status, .. } if *status >= 500 => {
                Some("Hint: the server could not reach its event store or key service; check its logs.")
            }
            CliError::Network(_) => Some("Hint: check --url (ESFEED_URL) and your network connection."),
            CliError::Decrypt(_) => {
                Some("Hint: --key-alias and the key service (KMS or --master-key) must match the server's.")
            }
            CliError::Parse(_) => Some("Hint: the response may be encrypted; pass --key-alias."),
            _ => None,
        };
        if let Some(hint) = hint {
            eprintln!("\n{}", hint.yellow());
        }
    }
}
