//! Walk the archive chain.
//!
//! Starts at a page (normally `recent`) and follows `prev-archive` links until
//! a page without one, then replays every page oldest first.

use std::collections::HashSet;

use anyhow::Result;
use clap::Args;
use esfeed_atom::{rel, Feed};

use crate::client::FeedClient;
use crate::error::CliError;
use crate::output::{print_entries, EntryRow, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct WalkArgs {
    /// Page to start from.
    #[arg(long, default_value = "recent")]
    from: String,
}

pub async fn run(ctx: CommandContext, args: WalkArgs) -> Result<()> {
    let pages = walk_archives(&ctx.client, &args.from).await?;

    match ctx.format {
        OutputFormat::Xml => {
            for page in &pages {
                println!("{}", page.to_xml().map_err(CliError::from)?);
            }
        }
        OutputFormat::Table => {
            let rows: Vec<_> = pages
                .iter()
                .flat_map(|page| page.entries.iter().map(|entry| EntryRow::new(&page.id, entry)))
                .collect();
            print_entries(&rows);
        }
    }

    Ok(())
}

/// Fetch `start` and every page before it, returned oldest first.
pub async fn walk_archives(client: &FeedClient, start: &str) -> Result<Vec<Feed>, CliError> {
    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(start.to_string());

    while let Some(feed_id) = next.take() {
        if !visited.insert(feed_id.clone()) {
            return Err(CliError::Cycle(feed_id));
        }

        let page = client.feed(&feed_id).await?;
        next = page
            .link(rel::PREV_ARCHIVE)
            .map(|href| feed_id_from_href(href).map(str::to_string))
            .transpose()?;
        pages.push(page);
    }

    pages.reverse();
    Ok(pages)
}

/// Feed id at the end of a `/notifications/{id}` link.
///
/// Links carry the server's public host, which may differ from the URL the
/// client talks to, so only the id is taken from them.
pub fn feed_id_from_href(href: &str) -> Result<&str, CliError> {
    href.rsplit_once("/notifications/")
        .map(|(_, feed_id)| feed_id)
        .filter(|feed_id| !feed_id.is_empty() && !feed_id.contains('/'))
        .ok_or_else(|| CliError::ForeignLink(href.to_string()))
}
