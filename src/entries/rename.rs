use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::kaltura::{select, KalturaClient};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::rename::Phase};
use crate::util::prompt::confirm_yes;

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: Option<String>,
    /// Select entries by tag
    #[arg(long)]
    tag: Option<String>,
    /// Select entries by category ID(s)
    #[arg(long)]
    category: Option<String>,
    /// Text to prepend to each title
    #[arg(long)]
    prefix: Option<String>,
    /// Text to append to each title
    #[arg(long)]
    suffix: Option<String>,
    /// Skip the confirmation prompt
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Serialize)]
struct RenameResult {
    renamed: usize,
    failed: usize,
    report: String,
}

pub async fn run(config: &Config, args: RenameArgs) -> Result<()> {
    let log = telemetry::rename();
    let _root = log.root_span().entered();

    let prefix = args.prefix.as_deref().unwrap_or("");
    let suffix = args.suffix.as_deref().unwrap_or("");
    if prefix.is_empty() && suffix.is_empty() {
        bail!("nothing to do: give --prefix and/or --suffix");
    }

    let selection =
        select::Selection::from_options(args.ids, args.tag, args.category, false, None)?;
    let client = KalturaClient::login(config).await?;

    let entries = {
        let _span = log.span(&Phase::Select).entered();
        log.info(format!("🔎 Selecting entries by {}", selection.describe()));
        select::resolve_entries(&client, &selection).await?
    };
    if entries.is_empty() {
        log.info("✅ No entries matched; nothing to rename.");
        client.logout().await;
        return Ok(());
    }

    let confirmed = {
        let _span = log.span(&Phase::Confirm).entered();
        for e in entries.iter().take(5) {
            log.info(format!("   {} → {}", e.name, affixed(&e.name, prefix, suffix)));
        }
        confirm_yes(&format!("✏️  Rename {} entries?", entries.len()), args.yes)?
    };
    if !confirmed {
        log.info("🚪 Aborted, nothing renamed.");
        client.logout().await;
        return Ok(());
    }

    let path = report_path(&config.reports_dir, "rename-entries", "csv");
    let mut report =
        ReportWriter::create(path, &["entry_id", "original_title", "new_title", "status"])?;
    let mut renamed = 0usize;
    let mut failed = 0usize;
    {
        let _span = log.span(&Phase::Update).entered();
        for entry in &entries {
            let new_name = affixed(&entry.name, prefix, suffix);
            match client.base_entry_rename(&entry.id, &new_name).await {
                Ok(_) => {
                    renamed += 1;
                    log.item(&entry.id, "RENAMED");
                    report.row([entry.id.as_str(), entry.name.as_str(), new_name.as_str(), "RENAMED"])?;
                }
                Err(err) => {
                    failed += 1;
                    log.item(&entry.id, "FAILED");
                    log.warn(format!("rename of {} failed: {}", entry.id, err));
                    report.row([entry.id.as_str(), entry.name.as_str(), new_name.as_str(), "FAILED"])?;
                }
            }
        }
    }
    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };

    log.info(format!("✅ Renamed {} entries ({} failed), report: {}", renamed, failed, report.display()));
    if telemetry::config::json_mode() {
        log.result(&RenameResult { renamed, failed, report: report.display().to_string() })?;
    }
    client.logout().await;
    Ok(())
}

fn affixed(name: &str, prefix: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, name, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affixes_apply_in_order() {
        assert_eq!(affixed("Lecture 1", "[OLD] ", ""), "[OLD] Lecture 1");
        assert_eq!(affixed("Lecture 1", "", " (archived)"), "Lecture 1 (archived)");
        assert_eq!(affixed("Lecture 1", "[OLD] ", " (archived)"), "[OLD] Lecture 1 (archived)");
    }
}
