use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

pub mod convert;
pub mod download;
pub mod visibility;

#[derive(Debug, Subcommand)]
pub enum CaptionsCmd {
    /// Download caption files, optionally converting them to plain transcripts
    Download(download::DownloadArgs),
    /// Hide captions with a given label from the player
    Hide(visibility::HideArgs),
}

pub async fn run(config: &Config, cmd: CaptionsCmd) -> Result<()> {
    match cmd {
        CaptionsCmd::Download(args) => download::run(config, args).await,
        CaptionsCmd::Hide(args) => visibility::run(config, args).await,
    }
}
