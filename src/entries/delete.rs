use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::config::{env_csv, Config};
use crate::kaltura::types::MediaEntry;
use crate::kaltura::{select, KalturaClient, KalturaError};
use crate::report::{column_index, open_input_csv, report_path, ReportWriter};
use crate::telemetry::{self, ops::delete::Phase};
use crate::util::prompt::confirm_typed;
use crate::util::time::fmt_epoch_local;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Comma-delimited entry IDs (default: ENTRY_IDS_TO_DELETE from the environment)
    #[arg(long)]
    ids: Option<String>,
    /// Input CSV of entry IDs (takes priority over --ids)
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Column header carrying entry IDs in --csv
    #[arg(long, default_value = "entry_id")]
    csv_column: String,
    /// Recycle (restorable) instead of deleting outright
    #[arg(long, default_value_t = false)]
    recycle: bool,
    /// Skip the typed confirmation
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Serialize)]
struct DeletePlanSummary {
    requested: usize,
    found: usize,
    mode: &'static str,
    preview_report: String,
}

#[derive(Serialize)]
struct DeleteResult {
    deleted: usize,
    already_gone: usize,
    failed: usize,
    mode: &'static str,
    report: String,
}

pub async fn run(config: &Config, args: DeleteArgs) -> Result<()> {
    let log = telemetry::delete();
    let _root = log.root_span().entered();

    let (mode, keyword) = if args.recycle { ("recycle", "RECYCLE") } else { ("delete", "DELETE") };

    let ids = collect_ids(&args)?;
    if ids.is_empty() {
        bail!("no entry IDs given: use --csv, --ids, or ENTRY_IDS_TO_DELETE");
    }

    let client = KalturaClient::login(config).await?;

    // fetch metadata so the preview shows what would be lost
    let mut lookups: Vec<(String, Option<MediaEntry>)> = Vec::with_capacity(ids.len());
    {
        let _span = log.span(&Phase::Collect).entered();
        for id in &ids {
            match client.media_get(id).await {
                Ok(entry) => {
                    log.item(id, "FOUND");
                    lookups.push((id.clone(), Some(entry)));
                }
                Err(err) => {
                    log.item(id, "NOT FOUND");
                    log.debug(format!("media.get {} failed: {}", id, err));
                    lookups.push((id.clone(), None));
                }
            }
        }
    }

    let preview_path = {
        let _span = log.span(&Phase::Preview).entered();
        let path = report_path(&config.reports_dir, &format!("{}-entries-preview", mode), "csv");
        let mut report =
            ReportWriter::create(path, &["entry_id", "name", "owner", "created_at", "status"])?;
        for (id, entry) in &lookups {
            match entry {
                Some(e) => report.row([
                    id.as_str(),
                    e.name.as_str(),
                    e.user_id.as_str(),
                    fmt_epoch_local(e.created_at).as_str(),
                    "FOUND",
                ])?,
                None => report.row([id.as_str(), "", "", "", "NOT FOUND"])?,
            }
        }
        report.finish()?
    };

    let found = lookups.iter().filter(|(_, e)| e.is_some()).count();
    log.info(format!(
        "📝 {} of {} entries found (preview: {})",
        found,
        lookups.len(),
        preview_path.display()
    ));
    if telemetry::config::json_mode() {
        log.plan(&DeletePlanSummary {
            requested: lookups.len(),
            found,
            mode,
            preview_report: preview_path.display().to_string(),
        })?;
    }

    if found == 0 {
        log.info("✅ Nothing to do.");
        client.logout().await;
        return Ok(());
    }

    let confirmed = {
        let _span = log.span(&Phase::Confirm).entered();
        confirm_typed(
            &format!("⚠️  About to {} {} entries. This cannot be undone.", mode, found),
            keyword,
            args.yes,
        )?
    };
    if !confirmed {
        log.info("🚪 Aborted, nothing deleted.");
        client.logout().await;
        return Ok(());
    }

    let result_path = report_path(&config.reports_dir, &format!("{}-entries-result", mode), "csv");
    let mut report = ReportWriter::create(result_path, &["entry_id", "name", "status", "error"])?;
    let mut deleted = 0usize;
    let mut already_gone = 0usize;
    let mut failed = 0usize;
    {
        let _span = log.span(&Phase::Apply).entered();
        for (id, entry) in &lookups {
            let Some(e) = entry else {
                report.row([id.as_str(), "", "NOT FOUND", ""])?;
                continue;
            };
            let outcome = if args.recycle {
                client.base_entry_recycle(id).await.map(|_| ())
            } else {
                client.base_entry_delete(id).await.map(|_| ())
            };
            match outcome {
                Ok(()) => {
                    deleted += 1;
                    let status = if args.recycle { "RECYCLED" } else { "DELETED" };
                    log.item(id, status);
                    report.row([id.as_str(), e.name.as_str(), status, ""])?;
                }
                Err(err) if is_already_gone(&err) => {
                    already_gone += 1;
                    let status = if args.recycle { "ALREADY RECYCLED" } else { "ALREADY DELETED" };
                    log.item(id, status);
                    report.row([id.as_str(), e.name.as_str(), status, ""])?;
                }
                Err(err) => {
                    failed += 1;
                    log.item(id, "FAILED");
                    report.row([id.as_str(), e.name.as_str(), "FAILED", err.to_string().as_str()])?;
                }
            }
        }
    }
    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };

    log.info(format!(
        "✅ {}: {} done, {} already gone, {} failed, report: {}",
        mode,
        deleted,
        already_gone,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&DeleteResult {
            deleted,
            already_gone,
            failed,
            mode,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

fn collect_ids(args: &DeleteArgs) -> Result<Vec<String>> {
    if let Some(path) = &args.csv {
        let (headers, rows) = open_input_csv(path)?;
        let col = column_index(&headers, &args.csv_column)?;
        return Ok(rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect());
    }
    if let Some(raw) = &args.ids {
        return Ok(select::split_csv(raw));
    }
    Ok(env_csv("ENTRY_IDS_TO_DELETE"))
}

fn is_already_gone(err: &KalturaError) -> bool {
    matches!(err.api_code(), Some("ENTRY_ID_NOT_FOUND") | Some("INVALID_ENTRY_ID"))
}
