use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod audit;
mod captions;
mod channels;
mod config;
mod cuepoints;
mod duplicate;
mod entries;
mod flavors;
mod kaltura;
mod playlists;
mod report;
mod reports;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "kadmin", about = "Kaltura media admin toolkit")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// MediaSpace channel provisioning
    #[command(subcommand)]
    Channels(channels::ChannelsCmd),
    /// Bulk rename, delete, and download of media entries
    #[command(subcommand)]
    Entries(entries::EntriesCmd),
    /// Caption downloads and visibility
    #[command(subcommand)]
    Captions(captions::CaptionsCmd),
    /// Flavor asset housekeeping
    #[command(subcommand)]
    Flavors(flavors::FlavorsCmd),
    /// Chapter and quiz cue points
    #[command(subcommand)]
    Cuepoints(cuepoints::CuePointsCmd),
    /// Channel playlist duplication
    #[command(subcommand)]
    Playlists(playlists::PlaylistsCmd),
    /// Audit-trail reports
    #[command(subcommand)]
    Audit(audit::AuditCmd),
    /// Library-wide CSV reports
    #[command(subcommand)]
    Report(reports::ReportCmd),
    /// Cross-account entry duplication
    #[command(subcommand)]
    Duplicate(duplicate::DuplicateCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and KADMIN_LOG_FORMAT
    telemetry::config::init_tracing();

    let config = config::Config::from_env()?;

    match cli.command {
        Commands::Channels(cmd) => channels::run(&config, cmd).await?,
        Commands::Entries(cmd) => entries::run(&config, cmd).await?,
        Commands::Captions(cmd) => captions::run(&config, cmd).await?,
        Commands::Flavors(cmd) => flavors::run(&config, cmd).await?,
        Commands::Cuepoints(cmd) => cuepoints::run(&config, cmd).await?,
        Commands::Playlists(cmd) => playlists::run(&config, cmd).await?,
        Commands::Audit(cmd) => audit::run(&config, cmd).await?,
        Commands::Report(cmd) => reports::run(&config, cmd).await?,
        Commands::Duplicate(cmd) => duplicate::run(&config, cmd).await?,
    }

    Ok(())
}
