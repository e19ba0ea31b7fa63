use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

pub mod count_duration;
pub mod retention;

#[derive(Debug, Subcommand)]
pub enum ReportCmd {
    /// Count entries and total duration over date windows
    CountDuration(count_duration::CountDurationArgs),
    /// Flag entries eligible for retention cleanup from a KMC export
    Retention(retention::RetentionArgs),
}

pub async fn run(config: &Config, cmd: ReportCmd) -> Result<()> {
    match cmd {
        ReportCmd::CountDuration(args) => count_duration::run(config, args).await,
        ReportCmd::Retention(args) => retention::run(config, args).await,
    }
}
