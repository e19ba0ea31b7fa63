use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::kaltura::types::THUMB_CUE_SUBTYPE_CHAPTER;
use crate::kaltura::KalturaClient;
use crate::report::{open_input_csv, report_path, ReportWriter};
use crate::telemetry::{self, ops::cuepoints::Phase};

pub const EXPECTED_HEADERS: [&str; 5] =
    ["entry_id", "timecode", "chapter_title", "chapter_description", "search_tags"];

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Input CSV of chapters (headers must be exactly:
    /// entry_id, timecode, chapter_title, chapter_description, search_tags)
    #[arg(long)]
    csv: PathBuf,
}

#[derive(Serialize)]
struct AddResult {
    added: usize,
    invalid: usize,
    failed: usize,
    report: String,
}

pub async fn run(config: &Config, args: AddArgs) -> Result<()> {
    let log = telemetry::cuepoints();
    let _root = log.root_span().entered();

    let rows = {
        let _span = log.span(&Phase::Validate).entered();
        let (headers, rows) = open_input_csv(&args.csv)?;
        // spreadsheet exports often append empty trailing columns
        let actual: Vec<&str> =
            headers.iter().map(|h| h.as_str()).filter(|h| !h.trim().is_empty()).collect();
        if actual != EXPECTED_HEADERS {
            bail!("CSV headers must be exactly: {}", EXPECTED_HEADERS.join(", "));
        }
        rows
    };
    log.info(format!("📄 {} chapter rows in {}", rows.len(), args.csv.display()));

    let client = KalturaClient::login(config).await?;

    let path = report_path(&config.reports_dir, "add-chapters", "csv");
    let mut report = ReportWriter::create(
        path,
        &["entry_id", "timecode", "chapter_title", "status", "error"],
    )?;
    let mut added = 0usize;
    let mut invalid = 0usize;
    let mut failed = 0usize;
    {
        let _span = log.span(&Phase::Add).entered();
        for row in &rows {
            let entry_id = row.get(0).unwrap_or("").trim();
            let timecode = row.get(1).unwrap_or("").trim();
            let title = row.get(2).unwrap_or("").trim();
            let description = row.get(3).unwrap_or("").trim();
            let tags = row.get(4).unwrap_or("").trim();

            let Some(start_ms) = timecode_to_ms(timecode) else {
                invalid += 1;
                log.warn(format!("❌ Invalid timecode '{}' for entry {}; row skipped", timecode, entry_id));
                report.row([entry_id, timecode, title, "INVALID_TIMECODE", ""])?;
                continue;
            };

            let cue_point = json!({
                "objectType": "KalturaThumbCuePoint",
                "cuePointType": "thumbCuePoint.Thumb",
                "entryId": entry_id,
                "startTime": start_ms,
                "title": title,
                "description": description,
                "tags": tags,
                "subType": THUMB_CUE_SUBTYPE_CHAPTER,
                "userId": config.user_id,
            });
            match client.cue_point_add(cue_point).await {
                Ok(_) => {
                    added += 1;
                    log.info(format!("📍 Added chapter: {} | {} | {}", entry_id, timecode, title));
                    report.row([entry_id, timecode, title, "ADDED", ""])?;
                }
                Err(err) => {
                    failed += 1;
                    log.item(entry_id, "FAILED");
                    report.row([entry_id, timecode, title, "FAILED", err.to_string().as_str()])?;
                }
            }
        }
    }
    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };

    log.info(format!(
        "✅ Added {} chapters ({} invalid rows, {} failures), report: {}",
        added,
        invalid,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&AddResult { added, invalid, failed, report: report.display().to_string() })?;
    }
    client.logout().await;
    Ok(())
}

/// `HH:MM:SS` (two digits each) to milliseconds. Anything else is rejected.
pub fn timecode_to_ms(timecode: &str) -> Option<i64> {
    let re = Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").ok()?;
    let caps = re.captures(timecode)?;
    let hh: i64 = caps[1].parse().ok()?;
    let mm: i64 = caps[2].parse().ok()?;
    let ss: i64 = caps[3].parse().ok()?;
    Some(hh * 3_600_000 + mm * 60_000 + ss * 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timecode_converts_exactly() {
        assert_eq!(timecode_to_ms("00:00:00"), Some(0));
        assert_eq!(timecode_to_ms("00:01:30"), Some(90_000));
        assert_eq!(timecode_to_ms("01:02:03"), Some(3_723_000));
    }

    #[test]
    fn only_two_digit_hh_mm_ss_is_accepted() {
        assert_eq!(timecode_to_ms("1:02:03"), None);
        assert_eq!(timecode_to_ms("00:02"), None);
        assert_eq!(timecode_to_ms("00:02:03.5"), None);
        assert_eq!(timecode_to_ms("ab:cd:ef"), None);
        assert_eq!(timecode_to_ms(""), None);
    }
}
