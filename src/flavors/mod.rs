use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::{env_csv, Config};
use crate::kaltura::types::MediaEntry;
use crate::kaltura::{select, KalturaClient};
use crate::report::{column_index, open_input_csv, report_path, ReportWriter};
use crate::telemetry::{self, ops::flavors::Phase};
use crate::util::prompt::confirm_typed;

pub mod plan;

use plan::{plan_entry, FlavorPlan, PlanOutcome};

#[derive(Debug, Subcommand)]
pub enum FlavorsCmd {
    /// Delete redundant flavors, keeping one per entry plus a configured keep-list
    Cleanup(CleanupArgs),
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Input CSV of entry IDs (takes priority over the other selectors)
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Column header carrying entry IDs in --csv
    #[arg(long, default_value = "entry_id")]
    csv_column: String,
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select entries by tag
    #[arg(long)]
    tag: Option<String>,
    /// Select entries by category ID(s)
    #[arg(long)]
    category: Option<String>,
    /// flavorParamsIds to keep in addition to the per-entry keeper
    /// (default: ADDITIONAL_FLAVORS_TO_KEEP from the environment)
    #[arg(long)]
    keep: Option<String>,
    /// Skip the typed DELETE confirmation
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Serialize)]
struct CleanupPlanSummary {
    entries: usize,
    flavors_to_delete: usize,
    mb_freed: f64,
    preview_report: String,
}

#[derive(Serialize)]
struct CleanupResult {
    entries: usize,
    deleted: usize,
    failed: usize,
    mb_freed: f64,
    report: String,
}

struct EntryPlan {
    entry: MediaEntry,
    outcome: PlanOutcome,
}

pub async fn run(config: &Config, cmd: FlavorsCmd) -> Result<()> {
    match cmd {
        FlavorsCmd::Cleanup(args) => cleanup(config, args).await,
    }
}

async fn cleanup(config: &Config, args: CleanupArgs) -> Result<()> {
    let log = telemetry::flavors();
    let _root = log.root_span().entered();

    let keep_params: Vec<i64> = match &args.keep {
        Some(raw) => select::split_csv(raw).iter().filter_map(|s| s.parse().ok()).collect(),
        None => env_csv("ADDITIONAL_FLAVORS_TO_KEEP")
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect(),
    };

    let client = KalturaClient::login(config).await?;

    let entries = {
        let _span = log.span(&Phase::Select).entered();
        let mut entries = match &args.csv {
            Some(path) => {
                let (headers, rows) = open_input_csv(path)?;
                let col = column_index(&headers, &args.csv_column)?;
                let ids: Vec<String> = rows
                    .iter()
                    .filter_map(|r| r.get(col))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                select::resolve_entries(&client, &select::Selection::Ids(ids)).await?
            }
            None => {
                let selection = select::Selection::from_options(
                    args.ids.clone(),
                    args.tag.clone(),
                    args.category.clone(),
                    false,
                    None,
                )?;
                log.info(format!("🔎 Selecting entries by {}", selection.describe()));
                select::resolve_entries(&client, &selection).await?
            }
        };
        // multi-stream children carry their own flavors, one level deep
        let parents: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        for parent_id in parents {
            let children = client.media_children(&parent_id).await?;
            entries.extend(children.into_iter().filter(|c| c.is_child()));
        }
        entries
    };
    log.info(format!("📼 {} entries to inspect (children included)", entries.len()));

    let mut plans: Vec<EntryPlan> = Vec::with_capacity(entries.len());
    {
        let _span = log.span(&Phase::Plan).entered();
        for entry in entries {
            let flavors = client.flavor_list(&entry.id).await?;
            let outcome = plan_entry(&flavors, &keep_params);
            match &outcome {
                PlanOutcome::SingleFlavor => log.item(&entry.id, "SKIPPED_SINGLE_FLAVOR"),
                PlanOutcome::NoKeeper => log.item(&entry.id, "SKIPPED_NO_SOURCE_DETECTED"),
                PlanOutcome::Plan(p) => log.item(
                    &entry.id,
                    &format!("READY keep={} ({}) delete={}", p.keeper.id, p.keep_reason, p.to_delete.len()),
                ),
            }
            plans.push(EntryPlan { entry, outcome });
        }
    }

    let preview_path = {
        let _span = log.span(&Phase::Preview).entered();
        let path = report_path(&config.reports_dir, "flavor-cleanup-preview", "csv");
        let mut report = ReportWriter::create(
            path,
            &["entry_id", "entry_name", "status", "flavor_id", "flavor_params_id", "size_mb", "tags", "role", "reason"],
        )?;
        for ep in &plans {
            match &ep.outcome {
                PlanOutcome::SingleFlavor => {
                    report.row([
                        ep.entry.id.as_str(),
                        ep.entry.name.as_str(),
                        "SKIPPED_SINGLE_FLAVOR",
                        "", "", "", "", "", "",
                    ])?;
                }
                PlanOutcome::NoKeeper => {
                    report.row([
                        ep.entry.id.as_str(),
                        ep.entry.name.as_str(),
                        "SKIPPED_NO_SOURCE_DETECTED",
                        "", "", "", "", "", "",
                    ])?;
                }
                PlanOutcome::Plan(p) => preview_plan_rows(&mut report, ep, p)?,
            }
        }
        report.finish()?
    };

    let to_delete: usize =
        plans.iter().filter_map(plan_of).map(|p| p.to_delete.len()).sum();
    let bytes: i64 = plans.iter().filter_map(plan_of).map(|p| p.bytes_freed).sum();
    let mb = bytes as f64 / (1024.0 * 1024.0);
    log.info(format!(
        "📝 Plan: {} flavors across {} entries, {:.1} MB to free (preview: {})",
        to_delete,
        plans.len(),
        mb,
        preview_path.display()
    ));
    if telemetry::config::json_mode() {
        log.plan(&CleanupPlanSummary {
            entries: plans.len(),
            flavors_to_delete: to_delete,
            mb_freed: mb,
            preview_report: preview_path.display().to_string(),
        })?;
    }

    if to_delete == 0 {
        log.info("✅ Nothing to delete.");
        client.logout().await;
        return Ok(());
    }

    let confirmed = {
        let _span = log.span(&Phase::Confirm).entered();
        confirm_typed(
            &format!("⚠️  About to delete {} flavors ({:.1} MB).", to_delete, mb),
            "DELETE",
            args.yes,
        )?
    };
    if !confirmed {
        log.info("🚪 Aborted, nothing deleted.");
        client.logout().await;
        return Ok(());
    }

    let result_path = report_path(&config.reports_dir, "flavor-cleanup-result", "csv");
    let mut report =
        ReportWriter::create(result_path, &["entry_id", "flavor_id", "status", "error"])?;
    let mut deleted = 0usize;
    let mut failed = 0usize;
    {
        let _span = log.span(&Phase::Delete).entered();
        for ep in &plans {
            let Some(p) = plan_of(ep) else { continue };
            for flavor in &p.to_delete {
                match client.flavor_delete(&flavor.id).await {
                    Ok(_) => {
                        deleted += 1;
                        log.item(&flavor.id, "DELETED");
                        report.row([ep.entry.id.as_str(), flavor.id.as_str(), "DELETED", ""])?;
                    }
                    Err(err) => {
                        failed += 1;
                        log.item(&flavor.id, "FAILED");
                        report.row([
                            ep.entry.id.as_str(),
                            flavor.id.as_str(),
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
        "✅ Deleted {} flavors ({} failed), report: {}",
        deleted,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&CleanupResult {
            entries: plans.len(),
            deleted,
            failed,
            mb_freed: mb,
            report: report.display().to_string(),
        })?;
    }

    client.logout().await;
    Ok(())
}

fn plan_of(ep: &EntryPlan) -> Option<&FlavorPlan> {
    match &ep.outcome {
        PlanOutcome::Plan(p) => Some(p),
        _ => None,
    }
}

fn preview_plan_rows(report: &mut ReportWriter, ep: &EntryPlan, p: &FlavorPlan) -> Result<()> {
    let mb = |bytes: i64| format!("{:.1}", bytes as f64 / (1024.0 * 1024.0));
    report.row([
        ep.entry.id.as_str(),
        ep.entry.name.as_str(),
        "READY",
        p.keeper.id.as_str(),
        p.keeper.flavor_params_id.to_string().as_str(),
        mb(p.keeper.size).as_str(),
        p.keeper.tags.as_str(),
        "KEEP",
        p.keep_reason,
    ])?;
    for f in &p.extra_kept {
        report.row([
            ep.entry.id.as_str(),
            ep.entry.name.as_str(),
            "READY",
            f.id.as_str(),
            f.flavor_params_id.to_string().as_str(),
            mb(f.size).as_str(),
            f.tags.as_str(),
            "KEEP",
            "keep-list",
        ])?;
    }
    for f in &p.to_delete {
        report.row([
            ep.entry.id.as_str(),
            ep.entry.name.as_str(),
            "READY",
            f.id.as_str(),
            f.flavor_params_id.to_string().as_str(),
            mb(f.size).as_str(),
            f.tags.as_str(),
            "DELETE",
            "",
        ])?;
    }
    Ok(())
}
