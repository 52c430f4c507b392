//! Output formatting for CLI commands.

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::ValueEnum;
use colored::Colorize;
use esfeed_atom::{rel, Entry, EventDocument, Feed};
use tabled::{Table, Tabled};

/// Longest payload preview shown in tables.
const PAYLOAD_PREVIEW_CHARS: usize = 48;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// Documents as served.
    Xml,
}

/// One feed entry.
#[derive(Debug, Clone, Tabled)]
pub struct EntryRow {
    #[tabled(rename = "Page")]
    pub page: String,

    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "Type")]
    pub kind: String,

    #[tabled(rename = "Published")]
    pub published: String,

    #[tabled(rename = "Payload")]
    pub payload: String,
}

impl EntryRow {
    pub fn new(page: &str, entry: &Entry) -> Self {
        Self {
            page: page.to_string(),
            id: entry.id.clone(),
            kind: entry.content.kind.clone(),
            published: entry.published.clone(),
            payload: describe_payload(&entry.content.body),
        }
    }
}

#[derive(Debug, Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,

    #[tabled(rename = "Value")]
    value: String,
}

/// Short rendering of a base64 payload: the text when it is printable UTF-8,
/// otherwise its size.
pub fn describe_payload(encoded: &str) -> String {
    let Ok(bytes) = STANDARD.decode(encoded.trim()) else {
        return "<invalid base64>".to_string();
    };
    match std::str::from_utf8(&bytes) {
        Ok(text) if !text.chars().any(char::is_control) => {
            if text.chars().count() > PAYLOAD_PREVIEW_CHARS {
                let preview: String = text.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
                format!("{preview}...")
            } else {
                text.to_string()
            }
        }
        _ => format!("<{} bytes>", bytes.len()),
    }
}

/// Print entries as a table.
pub fn print_entries(rows: &[EntryRow]) {
    if rows.is_empty() {
        println!("{}", "No entries.".dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print a page's id and archive links.
pub fn print_page_header(feed: &Feed) {
    println!("{} {}", "Page:".bold(), feed.id);
    if let Some(updated) = &feed.updated {
        println!("{} {}", "Updated:".bold(), updated);
    }
    for relation in [rel::PREV_ARCHIVE, rel::NEXT_ARCHIVE] {
        if let Some(href) = feed.link(relation) {
            println!("{} {}", format!("{relation}:").bold(), href);
        }
    }
}

/// Print a single event.
pub fn print_event(doc: &EventDocument) {
    let rows = [
        FieldRow {
            field: "Aggregate",
            value: doc.aggregate_id.clone(),
        },
        FieldRow {
            field: "Version",
            value: doc.version.to_string(),
        },
        FieldRow {
            field: "Type",
            value: doc.type_code.clone(),
        },
        FieldRow {
            field: "Published",
            value: doc.published.clone(),
        },
        FieldRow {
            field: "Payload",
            value: describe_payload(&doc.content),
        },
    ];
    println!("{}", Table::new(rows));
}
