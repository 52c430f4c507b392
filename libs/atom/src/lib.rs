//! # esfeed-atom
//!
//! Wire documents served by the event store feed.
//!
//! ## Documents
//!
//! - [`Feed`]: an Atom feed page (the mutable `recent` page or an immutable
//!   archive page), linked to its neighbours with RFC 5005 relations
//! - [`EventDocument`]: a single event retrieved by aggregate id and version
//!
//! Both serialize to and parse from XML, so the same types back the publishing
//! server and feed consumers.

mod error;
mod event;
mod feed;

pub use error::AtomError;
pub use event::{EventDocument, EVENT_NAMESPACE};
pub use feed::{rel, Content, Entry, Feed, Link, ATOM_NAMESPACE, FEED_TITLE};

/// Media type for feed pages.
pub const ATOM_MEDIA_TYPE: &str = "application/atom+xml";

/// Media type for single event documents.
pub const XML_MEDIA_TYPE: &str = "application/xml";
