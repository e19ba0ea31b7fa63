use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

pub mod delete;
pub mod download;
pub mod rename;

#[derive(Debug, Subcommand)]
pub enum EntriesCmd {
    /// Prefix or suffix text onto entry titles
    Rename(rename::RenameArgs),
    /// Delete or recycle entries by ID, with preview and typed confirmation
    Delete(delete::DeleteArgs),
    /// Download source media files for a set of entries
    Download(download::DownloadArgs),
}

pub async fn run(config: &Config, cmd: EntriesCmd) -> Result<()> {
    match cmd {
        EntriesCmd::Rename(args) => rename::run(config, args).await,
        EntriesCmd::Delete(args) => delete::run(config, args).await,
        EntriesCmd::Download(args) => download::run(config, args).await,
    }
}
