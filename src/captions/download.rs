use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::config::{env_or, Config};
use crate::kaltura::filters::CaptionAssetFilter;
use crate::kaltura::types::{CaptionAsset, MediaEntry, CAPTION_STATUS_READY};
use crate::kaltura::{select, KalturaClient};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::captions::Phase};
use crate::util::fs::{create_unique, sanitize_filename};
use crate::util::time::fmt_epoch_utc_date;

use super::convert::transcript_from_captions;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select entries by tag
    #[arg(long)]
    tag: Option<String>,
    /// Select entries by category ID(s)
    #[arg(long)]
    category: Option<String>,
    /// Also scan subcategories of --category
    #[arg(long, default_value_t = false)]
    include_children: bool,
    /// Select entries by owner user ID
    #[arg(long)]
    owner: Option<String>,
    /// Skip multi-stream child entries
    #[arg(long, default_value_t = false)]
    skip_children: bool,
    /// Destination directory (default: CAPTIONS_DIR from the environment, else captions/)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Convert each caption to a plain-text transcript and drop the caption file
    #[arg(long, default_value_t = false)]
    to_text: bool,
}

#[derive(Serialize)]
struct CaptionsResult {
    entries: usize,
    saved: usize,
    skipped: usize,
    failed: usize,
    report: String,
}

pub async fn run(config: &Config, args: DownloadArgs) -> Result<()> {
    let log = telemetry::captions();
    let _root = log.root_span().entered();

    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(env_or("CAPTIONS_DIR", "captions")));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating captions directory {:?}", out_dir))?;

    let selection = select::Selection::from_options(
        args.ids.clone(),
        args.tag.clone(),
        args.category.clone(),
        args.include_children,
        args.owner.clone(),
    )?;
    let client = KalturaClient::login(config).await?;

    let entries: Vec<MediaEntry> = {
        let _span = log.span(&Phase::Select).entered();
        log.info(format!("🔎 Selecting entries by {}", selection.describe()));
        let entries = select::resolve_entries(&client, &selection).await?;
        if args.skip_children {
            entries.into_iter().filter(|e| !e.is_child()).collect()
        } else {
            entries
        }
    };
    log.info(format!("📼 {} entries to scan for captions", entries.len()));

    let path = report_path(&config.reports_dir, "download-captions", "csv");
    let mut report = ReportWriter::create(
        path,
        &["entry_id", "entry_name", "caption_id", "label", "file", "status", "error"],
    )?;
    let mut saved = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for entry in &entries {
        let captions = {
            let _span = log.span(&Phase::List).entered();
            let filter = CaptionAssetFilter {
                entry_id_equal: Some(entry.id.clone()),
                status_equal: Some(CAPTION_STATUS_READY),
            };
            match client.caption_list(&filter).await {
                Ok(captions) => captions,
                Err(err) => {
                    failed += 1;
                    log.item(&entry.id, "FAILED");
                    report.row([
                        entry.id.as_str(),
                        entry.name.as_str(),
                        "", "", "",
                        "FAILED",
                        err.to_string().as_str(),
                    ])?;
                    continue;
                }
            }
        };
        if captions.is_empty() {
            skipped += 1;
            log.item(&entry.id, "SKIPPED");
            report.row([entry.id.as_str(), entry.name.as_str(), "", "", "", "SKIPPED", "no ready captions"])?;
            continue;
        }
        for caption in &captions {
            match save_caption(&client, &out_dir, entry, caption, args.to_text, &log).await {
                Ok(file) => {
                    saved += 1;
                    let status = if args.to_text { "CONVERTED" } else { "SAVED" };
                    log.item(&caption.id, status);
                    report.row([
                        entry.id.as_str(),
                        entry.name.as_str(),
                        caption.id.as_str(),
                        caption.label.as_str(),
                        file.as_str(),
                        status,
                        "",
                    ])?;
                }
                Err(err) => {
                    failed += 1;
                    log.item(&caption.id, "FAILED");
                    report.row([
                        entry.id.as_str(),
                        entry.name.as_str(),
                        caption.id.as_str(),
                        caption.label.as_str(),
                        "",
                        "FAILED",
                        err.to_string().as_str(),
                    ])?;
                }
            }
        }
    }

    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };
    log.info(format!(
        "✅ {} captions saved ({} entries skipped, {} failures), report: {}",
        saved,
        skipped,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&CaptionsResult {
            entries: entries.len(),
            saved,
            skipped,
            failed,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

async fn save_caption(
    client: &KalturaClient,
    out_dir: &Path,
    entry: &MediaEntry,
    caption: &CaptionAsset,
    to_text: bool,
    log: &crate::telemetry::ctx::LogCtx<crate::telemetry::ops::captions::Captions>,
) -> Result<String> {
    let url = {
        let _span = log.span(&Phase::Fetch).entered();
        client.caption_get_url(&caption.id).await?
    };
    let body = client.http().get(&url).send().await?.error_for_status()?.text().await?;

    let ext = caption
        .file_ext
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| caption.format.to_lowercase());
    let filename = caption_filename(entry, caption, &ext);
    let (path, mut file) =
        create_unique(out_dir, &filename).with_context(|| format!("creating {:?}", filename))?;
    file.write_all(body.as_bytes()).with_context(|| format!("writing {:?}", path))?;
    drop(file);

    if !to_text {
        return Ok(path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string());
    }

    let _span = log.span(&Phase::Convert).entered();
    let transcript = transcript_from_captions(&body);
    let txt_name = match filename.rsplit_once('.') {
        Some((base, _)) => format!("{}.txt", base),
        None => format!("{}.txt", filename),
    };
    let (txt_path, mut txt_file) =
        create_unique(out_dir, &txt_name).with_context(|| format!("creating {:?}", txt_name))?;
    txt_file
        .write_all(transcript.as_bytes())
        .with_context(|| format!("writing {:?}", txt_path))?;
    drop(txt_file);
    // the caption file was only an intermediate
    std::fs::remove_file(&path).with_context(|| format!("removing {:?}", path))?;
    Ok(txt_path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string())
}

/// `{created}_{entryId}_{title}[_{label}].{ext}` — the label only appears when
/// an entry carries more than one caption language/track.
fn caption_filename(entry: &MediaEntry, caption: &CaptionAsset, ext: &str) -> String {
    let date = fmt_epoch_utc_date(entry.created_at);
    let title = sanitize_filename(&entry.name);
    if caption.label.is_empty() {
        format!("{}_{}_{}.{}", date, entry.id, title, ext)
    } else {
        format!("{}_{}_{}_{}.{}", date, entry.id, title, sanitize_filename(&caption.label), ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> MediaEntry {
        MediaEntry {
            id: "1_abc".to_string(),
            name: "Week 1: Intro".to_string(),
            user_id: String::new(),
            creator_id: String::new(),
            tags: String::new(),
            duration: 0,
            plays: 0,
            created_at: 1_716_000_000, // 2024-05-18 UTC
            updated_at: 0,
            last_played_at: 0,
            media_type: 1,
            parent_entry_id: None,
            root_entry_id: None,
            download_url: None,
            conversion_profile_id: None,
            ms_duration: None,
            description: None,
        }
    }

    fn caption(label: &str) -> CaptionAsset {
        CaptionAsset {
            id: "0_cap".to_string(),
            entry_id: "1_abc".to_string(),
            label: label.to_string(),
            language: "English".to_string(),
            format: "SRT".to_string(),
            is_default: true,
            display_on_player: true,
            accuracy: 90,
            file_ext: Some("srt".to_string()),
        }
    }

    #[test]
    fn filename_carries_date_id_and_title() {
        let name = caption_filename(&entry(), &caption(""), "srt");
        assert_eq!(name, "2024-05-18_1_abc_Week_1__Intro.srt");
    }

    #[test]
    fn filename_appends_label_when_present() {
        let name = caption_filename(&entry(), &caption("English (auto)"), "srt");
        assert_eq!(name, "2024-05-18_1_abc_Week_1__Intro_English__auto_.srt");
    }
}
