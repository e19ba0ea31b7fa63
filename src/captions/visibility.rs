use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::config::{env_or, Config};
use crate::kaltura::filters::CaptionAssetFilter;
use crate::kaltura::types::CaptionAsset;
use crate::kaltura::{select, KalturaClient};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::captions::Phase};
use crate::util::prompt::confirm_yes;

const DEFAULT_LABEL: &str = "English (auto-generated)";

#[derive(Args, Debug)]
pub struct HideArgs {
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select entries by tag
    #[arg(long)]
    tag: Option<String>,
    /// Select entries by category ID(s)
    #[arg(long)]
    category: Option<String>,
    /// Caption label to hide (default: CAPTION_LABEL from the environment,
    /// else "English (auto-generated)")
    #[arg(long)]
    label: Option<String>,
    /// Skip the confirmation prompt
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Serialize)]
struct HideResult {
    entries: usize,
    hidden: usize,
    unchanged: usize,
    failed: usize,
    report: String,
}

pub async fn run(config: &Config, args: HideArgs) -> Result<()> {
    let log = telemetry::captions();
    let _root = log.root_span().entered();

    let label = args.label.clone().unwrap_or_else(|| env_or("CAPTION_LABEL", DEFAULT_LABEL));
    let selection = select::Selection::from_options(args.ids, args.tag, args.category, false, None)?;
    let client = KalturaClient::login(config).await?;

    let entries = {
        let _span = log.span(&Phase::Select).entered();
        log.info(format!("🔎 Selecting entries by {}", selection.describe()));
        select::resolve_entries(&client, &selection).await?
    };

    // gather first so the prompt can state how many entries are affected
    let mut per_entry: Vec<(String, Vec<CaptionAsset>)> = Vec::new();
    {
        let _span = log.span(&Phase::List).entered();
        for entry in &entries {
            let filter =
                CaptionAssetFilter { entry_id_equal: Some(entry.id.clone()), status_equal: None };
            match client.caption_list(&filter).await {
                Ok(captions) => per_entry.push((entry.id.clone(), captions)),
                Err(err) => {
                    log.warn(format!("caption list for {} failed: {}", entry.id, err));
                    per_entry.push((entry.id.clone(), Vec::new()));
                }
            }
        }
    }
    let affected = per_entry
        .iter()
        .filter(|(_, caps)| caps.iter().any(|c| c.label == label && c.display_on_player))
        .count();
    log.info(format!("🫥 Label {:?} is visible on {} of {} entries", label, affected, entries.len()));

    if affected == 0 {
        log.info("✅ Nothing to hide.");
        client.logout().await;
        return Ok(());
    }
    if !confirm_yes(&format!("Hide {:?} captions on {} entries?", label, affected), args.yes)? {
        log.info("🚪 Aborted, nothing changed.");
        client.logout().await;
        return Ok(());
    }

    let path = report_path(&config.reports_dir, "hide-captions", "csv");
    let mut report =
        ReportWriter::create(path, &["entry_id", "caption_id", "label", "status", "error"])?;
    let mut hidden = 0usize;
    let mut unchanged = 0usize;
    let mut failed = 0usize;
    {
        let _span = log.span(&Phase::Update).entered();
        for (entry_id, captions) in &per_entry {
            for caption in captions {
                if caption.label != label {
                    unchanged += 1;
                    report.row([
                        entry_id.as_str(),
                        caption.id.as_str(),
                        caption.label.as_str(),
                        "UNCHANGED",
                        "",
                    ])?;
                    continue;
                }
                if !caption.display_on_player {
                    unchanged += 1;
                    log.item(&caption.id, "ALREADY_HIDDEN");
                    report.row([
                        entry_id.as_str(),
                        caption.id.as_str(),
                        caption.label.as_str(),
                        "ALREADY_HIDDEN",
                        "",
                    ])?;
                    continue;
                }
                match client.caption_set_visibility(&caption.id, false).await {
                    Ok(_) => {
                        hidden += 1;
                        log.item(&caption.id, "HIDDEN");
                        report.row([
                            entry_id.as_str(),
                            caption.id.as_str(),
                            caption.label.as_str(),
                            "HIDDEN",
                            "",
                        ])?;
                    }
                    Err(err) => {
                        failed += 1;
                        log.item(&caption.id, "FAILED");
                        report.row([
                            entry_id.as_str(),
                            caption.id.as_str(),
                            caption.label.as_str(),
                            "FAILED",
                            err.to_string().as_str(),
                        ])?;
                    }
                }
            }
        }
    }
    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };

    log.info(format!(
        "✅ Hid {} captions ({} unchanged, {} failed), report: {}",
        hidden,
        unchanged,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&HideResult {
            entries: entries.len(),
            hidden,
            unchanged,
            failed,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}
