//! Single event documents.

use serde::{Deserialize, Serialize};

use crate::AtomError;

/// XML namespace of event documents.
pub const EVENT_NAMESPACE: &str = "http://github.com/xtracdev/goes";

fn event_namespace() -> String {
    EVENT_NAMESPACE.to_string()
}

/// An event retrieved directly by aggregate id and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "event")]
pub struct EventDocument {
    #[serde(rename = "@xmlns", default = "event_namespace")]
    pub xmlns: String,

    #[serde(rename = "aggregateId")]
    pub aggregate_id: String,

    pub version: i32,

    /// RFC 3339 timestamp with nanosecond precision.
    pub published: String,

    #[serde(rename = "typecode")]
    pub type_code: String,

    /// Base64 encoded payload.
    pub content: String,
}

impl EventDocument {
    pub fn new(
        aggregate_id: impl Into<String>,
        version: i32,
        published: impl Into<String>,
        type_code: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            xmlns: event_namespace(),
            aggregate_id: aggregate_id.into(),
            version,
            published: published.into(),
            type_code: type_code.into(),
            content: content.into(),
        }
    }

    /// Serialize the document as XML.
    pub fn to_xml(&self) -> Result<String, AtomError> {
        quick_xml::se::to_string(self).map_err(|e| AtomError::Serialize(e.to_string()))
    }

    /// Parse a document from XML.
    pub fn from_xml(xml: &str) -> Result<Self, AtomError> {
        quick_xml::de::from_str(xml).map_err(|e| AtomError::Parse(e.to_string()))
    }
}
