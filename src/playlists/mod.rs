use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::{env_or, Config};
use crate::kaltura::filters::MetadataFilter;
use crate::kaltura::types::{Metadata, METADATA_OBJECT_TYPE_CATEGORY};
use crate::kaltura::KalturaClient;
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::playlists::Phase};

pub mod metadata;

use metadata::{extract_playlist_ids, merge_playlist_ids};

#[derive(Debug, Subcommand)]
pub enum PlaylistsCmd {
    /// Clone one category's channel playlists into another category
    Duplicate(DuplicateArgs),
}

#[derive(Args, Debug)]
pub struct DuplicateArgs {
    /// Category ID holding the original playlists
    #[arg(long)]
    source: i64,
    /// Category ID to receive the cloned playlists
    #[arg(long)]
    dest: i64,
    /// Custom metadata profile ID
    /// (default: METADATA_PROFILE_ID from the environment)
    #[arg(long)]
    profile: Option<i64>,
}

#[derive(Serialize)]
struct DuplicateResult {
    playlists: usize,
    source_category: i64,
    destination_category: i64,
    report: String,
}

pub async fn run(config: &Config, cmd: PlaylistsCmd) -> Result<()> {
    match cmd {
        PlaylistsCmd::Duplicate(args) => duplicate(config, args).await,
    }
}

async fn duplicate(config: &Config, args: DuplicateArgs) -> Result<()> {
    let log = telemetry::playlists();
    let _root = log.root_span().entered();

    let profile_id = match args.profile {
        Some(id) => id,
        None => env_or("METADATA_PROFILE_ID", "")
            .parse::<i64>()
            .context("METADATA_PROFILE_ID must be set (env or --profile) and numeric")?,
    };

    let client = KalturaClient::login(config).await?;

    let (source_category, playlist_ids) = {
        let _span = log.span(&Phase::ReadMetadata).entered();
        let category = client.category_get(args.source).await?;
        let Some(metadata) = category_metadata(&client, profile_id, args.source).await? else {
            client.logout().await;
            bail!("no metadata found for source category {}", args.source);
        };
        let ids = extract_playlist_ids(&metadata.xml)?;
        (category, ids)
    };
    log.info(format!(
        "📋 {} playlists found on category {} ({})",
        playlist_ids.len(),
        source_category.id,
        source_category.name
    ));
    if playlist_ids.is_empty() {
        client.logout().await;
        return Ok(());
    }

    // (name, source id, cloned id)
    let mut cloned: Vec<(String, String, String)> = Vec::with_capacity(playlist_ids.len());
    {
        let _span = log.span(&Phase::Clone).entered();
        for pid in &playlist_ids {
            log.info(format!("⏩ Duplicating {}...", pid));
            let new_playlist = client.playlist_clone(pid).await?;
            let original = client.playlist_get(pid).await?;
            log.item(pid, "CLONED");
            cloned.push((original.name, pid.clone(), new_playlist.id));
        }
    }

    let destination_category = {
        let _span = log.span(&Phase::UpdateMetadata).entered();
        let category = client.category_get(args.dest).await?;
        let Some(dest_metadata) = category_metadata(&client, profile_id, args.dest).await? else {
            client.logout().await;
            bail!("no metadata found for destination category {}", args.dest);
        };
        let new_ids: Vec<String> = cloned.iter().map(|(_, _, new)| new.clone()).collect();
        let updated_xml = merge_playlist_ids(&dest_metadata.xml, &new_ids)?;
        client.metadata_update(dest_metadata.id, &updated_xml).await?;
        category
    };

    let report = {
        let _span = log.span(&Phase::Report).entered();
        let path = report_path(&config.reports_dir, "duplicate-playlists", "csv");
        let mut report = ReportWriter::create(
            path,
            &[
                "playlist_name",
                "source_category_id",
                "source_category_name",
                "source_playlist_id",
                "destination_category_id",
                "destination_category_name",
                "destination_playlist_id",
            ],
        )?;
        for (name, old_id, new_id) in &cloned {
            report.row([
                name.as_str(),
                source_category.id.to_string().as_str(),
                source_category.name.as_str(),
                old_id.as_str(),
                destination_category.id.to_string().as_str(),
                destination_category.name.as_str(),
                new_id.as_str(),
            ])?;
        }
        report.finish()?
    };

    log.info(format!(
        "✅ {} playlists added to category {} ({}). Results saved to {}.",
        cloned.len(),
        destination_category.name,
        destination_category.id,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&DuplicateResult {
            playlists: cloned.len(),
            source_category: args.source,
            destination_category: args.dest,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

async fn category_metadata(
    client: &KalturaClient,
    profile_id: i64,
    category_id: i64,
) -> Result<Option<Metadata>> {
    let filter = MetadataFilter {
        metadata_profile_id_equal: Some(profile_id),
        object_id_equal: Some(category_id.to_string()),
        metadata_object_type_equal: Some(METADATA_OBJECT_TYPE_CATEGORY.to_string()),
    };
    let mut objects = client.metadata_list(&filter).await?;
    Ok(if objects.is_empty() { None } else { Some(objects.remove(0)) })
}
