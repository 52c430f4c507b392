//! Feed page commands.

use anyhow::Result;
use clap::Args;

use crate::output::{print_entries, print_page_header, EntryRow, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Archive feed id.
    feed_id: String,
}

pub async fn show_recent(ctx: CommandContext) -> Result<()> {
    show_page(ctx, "recent").await
}

pub async fn show_archive(ctx: CommandContext, args: ArchiveArgs) -> Result<()> {
    show_page(ctx, &args.feed_id).await
}

async fn show_page(ctx: CommandContext, feed_id: &str) -> Result<()> {
    match ctx.format {
        OutputFormat::Xml => {
            let xml = ctx.client.feed_xml(feed_id).await?;
            println!("{xml}");
        }
        OutputFormat::Table => {
            let feed = ctx.client.feed(feed_id).await?;
            print_page_header(&feed);
            let rows: Vec<_> = feed
                .entries
                .iter()
                .map(|entry| EntryRow::new(&feed.id, entry))
                .collect();
            println!();
            print_entries(&rows);
        }
    }

    Ok(())
}
