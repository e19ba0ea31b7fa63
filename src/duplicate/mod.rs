use std::collections::{HashMap, VecDeque};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::config::{env_opt, env_or, Config};
use crate::kaltura::filters::{CaptionAssetFilter, CuePointFilter, MediaEntryFilter};
use crate::kaltura::types::{MediaEntry, MEDIA_TYPE_IMAGE};
use crate::kaltura::KalturaClient;
use crate::report::{report_path, ReportWriter};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::duplicate::Duplicate;
use crate::telemetry::{self, ops::duplicate::Phase};

const CHAPTER_CUE_TYPE: &str = "thumbCuePoint.Thumb";

#[derive(Debug, Subcommand)]
pub enum DuplicateCmd {
    /// Copy entries (content, captions, chapters) into another partner account
    Entries(EntriesArgs),
}

#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Comma-delimited source entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select source entries by tag
    #[arg(long)]
    tag: Option<String>,
    /// Select source entries in a category subtree
    #[arg(long)]
    category: Option<String>,
    /// Owner for the copied entries
    /// (default: DEST_OWNER from the environment)
    #[arg(long)]
    owner: Option<String>,
    /// Comma-delimited co-editor user IDs for the copies
    #[arg(long)]
    coeditors: Option<String>,
    /// Comma-delimited co-publisher user IDs for the copies
    #[arg(long)]
    copublishers: Option<String>,
    /// Extra tag appended to every copied entry
    #[arg(long)]
    add_tag: Option<String>,
    /// Leave auto-generated captions behind
    #[arg(long)]
    skip_auto_captions: bool,
    /// Label that marks a caption as auto-generated
    #[arg(long, default_value = "English (auto-generated)")]
    caption_label: String,
}

/// Where the copies land. A second admin session, usually on another partner.
struct Destination {
    partner_id: i32,
    owner: String,
    coeditors: Option<String>,
    copublishers: Option<String>,
    add_tag: Option<String>,
}

impl Destination {
    fn from_env(config: &Config, args: &EntriesArgs) -> Result<(Self, DestCredentials)> {
        let partner_id: i32 = env_opt("DEST_PARTNER_ID")
            .context("DEST_PARTNER_ID must be set")?
            .parse()
            .context("DEST_PARTNER_ID must be numeric")?;
        let admin_secret =
            env_opt("DEST_ADMIN_SECRET").context("DEST_ADMIN_SECRET must be set")?;
        let owner = args
            .owner
            .clone()
            .or_else(|| env_opt("DEST_OWNER"))
            .context("destination owner must be set (--owner or DEST_OWNER)")?;
        let credentials = DestCredentials {
            service_url: env_or("DEST_SERVICE_URL", &config.service_url),
            admin_secret,
            user_id: env_or("DEST_USER_ID", &config.user_id),
        };
        Ok((
            Destination {
                partner_id,
                owner,
                coeditors: args.coeditors.clone().or_else(|| env_opt("DEST_COEDITORS")),
                copublishers: args.copublishers.clone().or_else(|| env_opt("DEST_COPUBLISHERS")),
                add_tag: args.add_tag.clone().or_else(|| env_opt("DEST_TAG")),
            },
            credentials,
        ))
    }
}

struct DestCredentials {
    service_url: String,
    admin_secret: String,
    user_id: String,
}

struct CopyOutcome {
    dest_id: String,
    captions_copied: usize,
    cue_points_copied: usize,
}

#[derive(Serialize)]
struct DuplicateResult {
    entries_selected: usize,
    entries_copied: usize,
    entries_failed: usize,
    destination_partner: i32,
    report: String,
}

pub async fn run(config: &Config, cmd: DuplicateCmd) -> Result<()> {
    match cmd {
        DuplicateCmd::Entries(args) => entries(config, args).await,
    }
}

async fn entries(config: &Config, args: EntriesArgs) -> Result<()> {
    let log = telemetry::duplicate();
    let _root = log.root_span().entered();

    let (dest, credentials) = Destination::from_env(config, &args)?;

    let mut filter = MediaEntryFilter::default();
    if let Some(ids) = &args.ids {
        filter.id_in = Some(ids.clone());
    } else if let Some(category) = &args.category {
        filter.category_ancestor_id_in = Some(category.clone());
    } else if let Some(tag) = &args.tag {
        filter.tags_like = Some(tag.clone());
    } else {
        bail!("select entries with one of --ids, --tag, or --category");
    }

    let source = KalturaClient::login(config).await?;
    let destination = KalturaClient::login_with(
        &credentials.service_url,
        dest.partner_id,
        &credentials.admin_secret,
        &credentials.user_id,
        &config.privileges,
    )
    .await?;

    let selected = {
        let _span = log.span(&Phase::Select).entered();
        let mut entries = source.base_entry_list(&filter, 500).await?;
        // parents first so children can point at their copied parent
        entries.sort_by_key(|e| usize::from(e.is_child()));
        entries
    };
    if selected.is_empty() {
        log.info("No entries matched the selection.");
        source.logout().await;
        destination.logout().await;
        return Ok(());
    }
    log.info(format!(
        "🚀 Duplicating {} entries from partner {} to partner {}",
        selected.len(),
        source.partner_id(),
        destination.partner_id()
    ));

    let mut report = ReportWriter::create(
        report_path(&config.reports_dir, "cross-account-duplication", "csv"),
        &[
            "source_entry_id", "title", "parent_entry_id", "destination_entry_id",
            "destination_owner", "captions_copied", "cue_points_copied", "status", "error",
        ],
    )?;

    // source id -> destination id, for parent remapping
    let mut id_mapping: HashMap<String, String> = HashMap::new();
    let mut copied = 0usize;
    let mut failed = 0usize;
    let selected_count = selected.len();

    let mut queue: VecDeque<MediaEntry> = selected.into();
    while let Some(entry) = queue.pop_front() {
        if id_mapping.contains_key(&entry.id) {
            continue;
        }
        log.info(format!("⏩ Copying {} ({})", entry.id, entry.name));
        match copy_entry(&log, &source, &destination, &dest, &args, &entry, &id_mapping).await {
            Ok(outcome) => {
                id_mapping.insert(entry.id.clone(), outcome.dest_id.clone());
                copied += 1;
                log.item(&entry.id, "COPIED");
                report.row([
                    entry.id.as_str(),
                    entry.name.as_str(),
                    entry.parent_entry_id.as_deref().unwrap_or(""),
                    outcome.dest_id.as_str(),
                    dest.owner.as_str(),
                    outcome.captions_copied.to_string().as_str(),
                    outcome.cue_points_copied.to_string().as_str(),
                    "COPIED",
                    "",
                ])?;
                // multi-stream children ride along even when not selected
                match source.media_children(&entry.id).await {
                    Ok(children) => queue.extend(children),
                    Err(err) => {
                        log.warn(format!("could not list children of {}: {}", entry.id, err))
                    }
                }
            }
            Err(err) => {
                failed += 1;
                log.item(&entry.id, "FAILED");
                report.row([
                    entry.id.as_str(),
                    entry.name.as_str(),
                    entry.parent_entry_id.as_deref().unwrap_or(""),
                    "",
                    dest.owner.as_str(),
                    "0",
                    "0",
                    "FAILED",
                    err.to_string().as_str(),
                ])?;
            }
        }
    }

    let report = report.finish()?;
    log.info(format!(
        "✅ {} copied, {} failed. Results saved to {}.",
        copied,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&DuplicateResult {
            entries_selected: selected_count,
            entries_copied: copied,
            entries_failed: failed,
            destination_partner: dest.partner_id,
            report: report.display().to_string(),
        })?;
    }
    source.logout().await;
    destination.logout().await;
    Ok(())
}

async fn copy_entry(
    log: &LogCtx<Duplicate>,
    source: &KalturaClient,
    destination: &KalturaClient,
    dest: &Destination,
    args: &EntriesArgs,
    entry: &MediaEntry,
    id_mapping: &HashMap<String, String>,
) -> Result<CopyOutcome> {
    let dest_entry = {
        let _span = log.span(&Phase::Create).entered();
        let mut payload = json!({
            "objectType": "KalturaMediaEntry",
            "name": entry.name,
            "description": entry.description.as_deref().unwrap_or(""),
            "tags": tags_with_extra(&entry.tags, dest.add_tag.as_deref()),
            "mediaType": entry.media_type,
            "userId": dest.owner,
        });
        if entry.media_type != MEDIA_TYPE_IMAGE {
            payload["blockAutoTranscript"] = json!(true);
        }
        if let Some(parent) = entry.parent_entry_id.as_deref() {
            if let Some(mapped) = id_mapping.get(parent) {
                payload["parentEntryId"] = json!(mapped);
            }
        }
        let dest_entry = destination.media_add(payload).await?;
        if dest.coeditors.is_some() || dest.copublishers.is_some() {
            let mut update = json!({ "objectType": "KalturaMediaEntry" });
            if let Some(coed) = &dest.coeditors {
                update["entitledUsersEdit"] = json!(coed);
            }
            if let Some(copub) = &dest.copublishers {
                update["entitledUsersPublish"] = json!(copub);
            }
            if let Err(err) = destination.base_entry_update(&dest_entry.id, update).await {
                log.warn(format!(
                    "could not assign co-editors/co-publishers on {}: {}",
                    dest_entry.id, err
                ));
            }
        }
        dest_entry
    };

    {
        let _span = log.span(&Phase::Content).entered();
        match content_url(source, entry).await? {
            Some(url) => {
                destination.media_add_content_from_url(&dest_entry.id, &url).await?;
            }
            None => log.warn(format!("no source content found for {}", entry.id)),
        }
    }

    let captions_copied = {
        let _span = log.span(&Phase::Captions).entered();
        copy_captions(log, source, destination, args, &entry.id, &dest_entry.id).await?
    };

    let cue_points_copied = {
        let _span = log.span(&Phase::CuePoints).entered();
        copy_chapters(log, source, destination, &entry.id, &dest_entry.id).await?
    };

    Ok(CopyOutcome { dest_id: dest_entry.id, captions_copied, cue_points_copied })
}

/// Best downloadable rendition: the image's download URL, or the original
/// flavor, or the largest one.
async fn content_url(source: &KalturaClient, entry: &MediaEntry) -> Result<Option<String>> {
    if entry.media_type == MEDIA_TYPE_IMAGE {
        return Ok(entry.download_url.clone());
    }
    let flavors = source.flavor_list(&entry.id).await?;
    let best = flavors
        .iter()
        .find(|f| f.is_original)
        .or_else(|| flavors.iter().max_by_key(|f| f.size));
    match best {
        Some(flavor) => Ok(Some(source.flavor_get_url(&flavor.id).await?)),
        None => Ok(None),
    }
}

async fn copy_captions(
    log: &LogCtx<Duplicate>,
    source: &KalturaClient,
    destination: &KalturaClient,
    args: &EntriesArgs,
    source_id: &str,
    dest_id: &str,
) -> Result<usize> {
    let filter = CaptionAssetFilter { entry_id_equal: Some(source_id.to_string()), ..Default::default() };
    let captions = source.caption_list(&filter).await?;
    let mut copied = 0usize;
    for caption in captions {
        if args.skip_auto_captions && caption.label == args.caption_label {
            log.info(format!("⏭️  Skipping auto-generated caption on {}", source_id));
            continue;
        }
        let payload = json!({
            "objectType": "KalturaCaptionAsset",
            "language": caption.language,
            "format": caption.format,
            "isDefault": caption.is_default,
            "label": caption.label,
            "displayOnPlayer": caption.display_on_player,
            "accuracy": caption.accuracy,
        });
        let result: Result<()> = async {
            let added = destination.caption_add(dest_id, payload).await?;
            let url = source.caption_get_url(&caption.id).await?;
            destination.caption_set_content_from_url(&added.id, &url).await?;
            Ok(())
        }
        .await;
        match result {
            Ok(()) => copied += 1,
            Err(err) => {
                log.warn(format!("failed to copy caption {} to {}: {}", caption.id, dest_id, err))
            }
        }
    }
    Ok(copied)
}

async fn copy_chapters(
    log: &LogCtx<Duplicate>,
    source: &KalturaClient,
    destination: &KalturaClient,
    source_id: &str,
    dest_id: &str,
) -> Result<usize> {
    let filter = CuePointFilter {
        entry_id_equal: Some(source_id.to_string()),
        cue_point_type_equal: Some(CHAPTER_CUE_TYPE.to_string()),
    };
    let cue_points = source.cue_point_list(&filter).await?;
    let mut copied = 0usize;
    for cue in cue_points {
        let mut payload = json!({
            "objectType": "KalturaThumbCuePoint",
            "cuePointType": CHAPTER_CUE_TYPE,
            "entryId": dest_id,
            "startTime": cue.start_time,
            "title": cue.title.as_deref().unwrap_or(""),
            "description": cue.description.as_deref().unwrap_or(""),
            "tags": cue.tags,
        });
        if let Some(user_id) = &cue.user_id {
            payload["userId"] = json!(user_id);
        }
        if let Some(sub_type) = cue.sub_type {
            payload["subType"] = json!(sub_type);
        }
        match destination.cue_point_add(payload).await {
            Ok(_) => copied += 1,
            Err(err) => {
                log.warn(format!("failed to copy cue point {} to {}: {}", cue.id, dest_id, err))
            }
        }
    }
    Ok(copied)
}

fn tags_with_extra(tags: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) if !extra.is_empty() => {
            if tags.is_empty() {
                extra.to_string()
            } else {
                format!("{},{}", tags, extra)
            }
        }
        _ => tags.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_tag_appends_without_a_leading_comma() {
        assert_eq!(tags_with_extra("a,b", Some("migrated")), "a,b,migrated");
        assert_eq!(tags_with_extra("", Some("migrated")), "migrated");
        assert_eq!(tags_with_extra("a,b", None), "a,b");
        assert_eq!(tags_with_extra("a,b", Some("")), "a,b");
    }
}
