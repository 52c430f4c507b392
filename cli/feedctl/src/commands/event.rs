//! Event command.

use anyhow::Result;
use clap::Args;

use crate::output::{print_event, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct EventArgs {
    /// Aggregate id.
    aggregate_id: String,

    /// Event version.
    version: u32,
}

pub async fn show_event(ctx: CommandContext, args: EventArgs) -> Result<()> {
    match ctx.format {
        OutputFormat::Xml => {
            let xml = ctx
                .client
                .event_xml(&args.aggregate_id, args.version)
                .await?;
            println!("{xml}");
        }
        OutputFormat::Table => {
            let doc = ctx.client.event(&args.aggregate_id, args.version).await?;
            print_event(&doc);
        }
    }

    Ok(())
}
