//! Atom feed pages.

use serde::{Deserialize, Serialize};

use crate::AtomError;

/// Atom XML namespace.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Title carried by every feed page.
pub const FEED_TITLE: &str = "Event store feed";

/// Link relations used between feed pages (RFC 4287 / RFC 5005).
pub mod rel {
    pub const SELF: &str = "self";
    pub const RELATED: &str = "related";
    pub const PREV_ARCHIVE: &str = "prev-archive";
    pub const NEXT_ARCHIVE: &str = "next-archive";
}

fn atom_namespace() -> String {
    ATOM_NAMESPACE.to_string()
}

/// A feed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "feed")]
pub struct Feed {
    #[serde(rename = "@xmlns", default = "atom_namespace")]
    pub xmlns: String,

    pub title: String,

    /// Page identifier: `recent` or an archive feed id.
    pub id: String,

    #[serde(rename = "link", default)]
    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(rename = "entry", default)]
    pub entries: Vec<Entry>,
}

/// A link relation attached to a feed or entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "@rel")]
    pub rel: String,

    #[serde(rename = "@href")]
    pub href: String,
}

/// One published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub id: String,

    #[serde(rename = "link", default)]
    pub links: Vec<Link>,

    pub published: String,
    pub content: Content,
}

/// Entry content: the event type code and the base64 encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "@type")]
    pub kind: String,

    #[serde(rename = "$text", default)]
    pub body: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links
        .iter()
        .find(|link| link.rel == rel)
        .map(|link| link.href.as_str())
}

impl Feed {
    /// Create an empty page with the standard title.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            xmlns: atom_namespace(),
            title: FEED_TITLE.to_string(),
            id: id.into(),
            links: Vec::new(),
            updated: None,
            entries: Vec::new(),
        }
    }

    /// Href of the first link with the given relation.
    pub fn link(&self, rel: &str) -> Option<&str> {
        find_link(&self.links, rel)
    }

    /// Serialize the page as XML.
    pub fn to_xml(&self) -> Result<String, AtomError> {
        quick_xml::se::to_string(self).map_err(|e| AtomError::Serialize(e.to_string()))
    }

    /// Parse a page from XML.
    pub fn from_xml(xml: &str) -> Result<Self, AtomError> {
        quick_xml::de::from_str(xml).map_err(|e| AtomError::Parse(e.to_string()))
    }
}

impl Entry {
    /// Href of the first link with the given relation.
    pub fn link(&self, rel: &str) -> Option<&str> {
        find_link(&self.links, rel)
    }
}
