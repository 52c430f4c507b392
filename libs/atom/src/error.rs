//! Error types for document encoding.

use thiserror::Error;

/// Errors that can occur when encoding or parsing documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AtomError {
    /// The document could not be written as XML.
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    /// The input is not a well-formed document of the expected kind.
    #[error("failed to parse document: {0}")]
    Parse(String),
}
