use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use rust_xlsxwriter::Workbook;
use serde::Serialize;

use crate::config::Config;
use crate::kaltura::filters::{AuditTrailFilter, MediaEntryFilter};
use crate::kaltura::types::AuditTrail;
use crate::kaltura::KalturaClient;
use crate::report::report_path;
use crate::telemetry::{self, ops::audit::Phase};
use crate::util::time::fmt_epoch_local;

const REPLACEMENT_ENTRY_POINT: &str = "media::updatecontent";

#[derive(Debug, Subcommand)]
pub enum AuditCmd {
    /// Report media-replacement events from the audit trail
    Replacements(ReplacementsArgs),
}

#[derive(Args, Debug)]
pub struct ReplacementsArgs {
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select entries by tag (multi-tag OR match)
    #[arg(long)]
    tag: Option<String>,
    /// Select entries in a category subtree
    #[arg(long)]
    category: Option<String>,
}

#[derive(Serialize)]
struct ReplacementsResult {
    entries_checked: usize,
    entries_with_replacements: usize,
    rows: usize,
    report: String,
}

pub async fn run(config: &Config, cmd: AuditCmd) -> Result<()> {
    match cmd {
        AuditCmd::Replacements(args) => replacements(config, args).await,
    }
}

async fn replacements(config: &Config, args: ReplacementsArgs) -> Result<()> {
    let log = telemetry::audit();
    let _root = log.root_span().entered();

    let mut filter = MediaEntryFilter::default();
    if let Some(ids) = &args.ids {
        filter.id_in = Some(ids.clone());
    } else if let Some(category) = &args.category {
        filter.category_ancestor_id_in = Some(category.clone());
    } else if let Some(tag) = &args.tag {
        filter.tags_multi_like_or = Some(tag.clone());
    } else {
        bail!("select entries with one of --ids, --tag, or --category");
    }

    let client = KalturaClient::login(config).await?;

    let entries = {
        let _span = log.span(&Phase::Select).entered();
        client.media_list(&filter, 100).await?
    };
    if entries.is_empty() {
        log.info("No entries found matching the criteria.");
        client.logout().await;
        return Ok(());
    }
    log.info(format!("🔎 Checking {} entries for content replacements", entries.len()));

    // (entry_id, title, action, user_id, timestamp)
    let mut rows: Vec<[String; 5]> = Vec::new();
    let mut entries_with_replacements = 0usize;
    {
        let _span = log.span(&Phase::Trail).entered();
        for entry in &entries {
            log.info(format!("Checking: {} ({})", entry.id, entry.name));
            let audit_filter =
                AuditTrailFilter { entry_id_equal: Some(entry.id.clone()) };
            let logs = client.audit_trail_list(&audit_filter).await?;
            let replacements: Vec<&AuditTrail> = logs
                .iter()
                .filter(|l| l.entry_point == REPLACEMENT_ENTRY_POINT && l.created_at > entry.created_at)
                .collect();
            if replacements.is_empty() {
                continue;
            }
            entries_with_replacements += 1;
            rows.push([
                entry.id.clone(),
                entry.name.clone(),
                "creation".to_string(),
                entry.creator_id.clone(),
                fmt_epoch_local(entry.created_at),
            ]);
            for log_row in replacements {
                rows.push([
                    entry.id.clone(),
                    entry.name.clone(),
                    "replacement".to_string(),
                    log_row.user_id.clone(),
                    fmt_epoch_local(log_row.created_at),
                ]);
            }
        }
    }

    let report = {
        let _span = log.span(&Phase::Report).entered();
        let path = report_path(&config.reports_dir, "ReplacementsAudit", "xlsx");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {:?}", parent))?;
        }
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in ["entry_id", "title", "action", "user_id", "timestamp"]
            .iter()
            .enumerate()
        {
            worksheet.write_string(0, col as u16, *header)?;
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string((i + 1) as u32, col as u16, value)?;
            }
        }
        workbook.save(&path)?;
        path
    };

    log.info(format!("✅ Exported replacements report to: {}", report.display()));
    if telemetry::config::json_mode() {
        log.result(&ReplacementsResult {
            entries_checked: entries.len(),
            entries_with_replacements,
            rows: rows.len(),
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}
