use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

pub mod add;
pub mod delete;

#[derive(Debug, Subcommand)]
pub enum CuePointsCmd {
    /// Add chapter markers from a CSV
    Add(add::AddArgs),
    /// Delete cue points of one type from a list of entries
    Delete(delete::DeleteArgs),
}

pub async fn run(config: &Config, cmd: CuePointsCmd) -> Result<()> {
    match cmd {
        CuePointsCmd::Add(args) => add::run(config, args).await,
        CuePointsCmd::Delete(args) => delete::run(config, args).await,
    }
}
