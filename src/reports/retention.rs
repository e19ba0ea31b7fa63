use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::{env_or, Config};
use crate::kaltura::KalturaClient;
use crate::report::{open_input_csv, report_path, ReportWriter};
use crate::telemetry::{self, ops::report::Phase};
use crate::util::time::{day_end_utc, fmt_epoch_local, parse_date};

pub const SEC_PER_YEAR: i64 = 365 * 24 * 3600;
const SEC_2Y: i64 = 2 * SEC_PER_YEAR;
const SEC_4Y: i64 = 4 * SEC_PER_YEAR;

const OUTPUT_HEADERS: [&str; 12] = [
    "policy", "entry_id", "entry_name", "media_type", "created_on", "last_updated",
    "duration_seconds", "plays", "status", "owner", "lastPlayedAt", "reason",
];

#[derive(Args, Debug)]
pub struct RetentionArgs {
    /// KMC entries export to scan
    #[arg(long)]
    csv: PathBuf,
    /// Evaluate retention as of this date (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<String>,
    /// Concurrent lastPlayedAt lookups
    /// (default: REPORT_LOOKUP_WORKERS from the environment, else 8)
    #[arg(long)]
    workers: Option<usize>,
}

/// One retention candidate, ready to serialize.
struct Candidate {
    policy: &'static str,
    entry_id: String,
    entry_name: String,
    media_type: String,
    created_on: String,
    last_updated: String,
    duration_seconds: String,
    plays: String,
    status: String,
    owner: String,
    last_played_at: String,
    reason: &'static str,
}

struct LookupJob {
    entry_id: String,
    entry_name: String,
    media_type: String,
    created_epoch: i64,
    created_on: String,
    last_updated: String,
    duration_seconds: String,
    plays: String,
    status: String,
    owner: String,
}

#[derive(Serialize)]
struct RetentionResult {
    rows_scanned: usize,
    candidates: usize,
    lookup_errors: usize,
    report: String,
    error_log: String,
}

struct KmcColumns {
    entry: usize,
    title: Option<usize>,
    created: usize,
    plays: usize,
    media_type: Option<usize>,
    last_update: Option<usize>,
    status: Option<usize>,
    owner: Option<usize>,
    duration: Option<usize>,
}

pub async fn run(config: &Config, args: RetentionArgs) -> Result<()> {
    let log = telemetry::report();
    let _root = log.root_span().entered();

    let as_of_date = match &args.as_of {
        Some(raw) => parse_date(raw).context("--as-of must be in YYYY-MM-DD format")?,
        None => Local::now().date_naive(),
    };
    let as_of = day_end_utc(as_of_date).timestamp();
    let workers = args.workers.unwrap_or_else(|| {
        env_or("REPORT_LOOKUP_WORKERS", "8").parse().unwrap_or(8)
    });

    let (headers, records) = open_input_csv(&args.csv)?;
    let columns = resolve_columns(&headers)?;
    log.info(format!(
        "📄 Scanning {} rows from {} (as of {})",
        records.len(),
        args.csv.display(),
        as_of_date
    ));

    let mut error_log = ReportWriter::create(
        report_path(&config.reports_dir, "retention-errors", "csv"),
        &["timestamp", "entry_id", "stage", "error"],
    )?;

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut lookups: Vec<LookupJob> = Vec::new();
    {
        let _span = log.span(&Phase::Scan).entered();
        for record in &records {
            let entry_id = field(record, Some(columns.entry));
            if entry_id.is_empty() {
                continue;
            }
            let created_on = field(record, Some(columns.created));
            let Some(created_epoch) = parse_any_epoch(&created_on) else {
                error_row(&mut error_log, &entry_id, "parse_created", "unparseable creation date")?;
                continue;
            };
            // nothing younger than two years can be a candidate
            if as_of - created_epoch < SEC_2Y {
                continue;
            }

            let entry_name = field(record, columns.title);
            let media_type = field(record, columns.media_type);
            let last_updated = field(record, columns.last_update);
            let status = field(record, columns.status);
            let owner = field(record, columns.owner);
            let duration_seconds = field(record, columns.duration);
            let plays_raw = field(record, Some(columns.plays));
            let plays: i64 = plays_raw.trim().parse().unwrap_or(0);

            if !status.is_empty() && !status.trim().eq_ignore_ascii_case("ready") {
                candidates.push(Candidate {
                    policy: "nonready",
                    entry_id,
                    entry_name,
                    media_type,
                    created_on,
                    last_updated,
                    duration_seconds,
                    plays: plays_raw,
                    status,
                    owner,
                    last_played_at: String::new(),
                    reason: "non_ready_status",
                });
            } else if plays == 0 {
                if let Some(policy) = classify_policy(created_epoch, None, as_of) {
                    candidates.push(Candidate {
                        policy,
                        entry_id,
                        entry_name,
                        media_type,
                        created_on,
                        last_updated,
                        duration_seconds,
                        plays: "0".to_string(),
                        status,
                        owner,
                        last_played_at: String::new(),
                        reason: "zero_plays",
                    });
                }
            } else {
                lookups.push(LookupJob {
                    entry_id,
                    entry_name,
                    media_type,
                    created_epoch,
                    created_on,
                    last_updated,
                    duration_seconds,
                    plays: plays_raw,
                    status,
                    owner,
                });
            }
        }
    }
    log.info(format!(
        "{} candidates without lookups, {} entries need a lastPlayedAt check",
        candidates.len(),
        lookups.len()
    ));

    let mut lookup_errors = 0usize;
    if !lookups.is_empty() {
        let _span = log.span(&Phase::Lookup).entered();
        let client = Arc::new(KalturaClient::login(config).await?);
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::with_capacity(lookups.len());
        for job in lookups {
            let client = Arc::clone(&client);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => return (job, Err(err.to_string())),
                };
                let result = client
                    .media_get(&job.entry_id)
                    .await
                    .map(|entry| entry.last_played_at)
                    .map_err(|err| err.to_string());
                (job, result)
            }));
        }
        for handle in join_all(handles).await {
            let (job, result) = handle.context("lookup task panicked")?;
            match result {
                Ok(last_played_at) => {
                    let last_play = (last_played_at > 0).then_some(last_played_at);
                    if let Some(policy) = classify_policy(job.created_epoch, last_play, as_of) {
                        candidates.push(Candidate {
                            policy,
                            entry_id: job.entry_id,
                            entry_name: job.entry_name,
                            media_type: job.media_type,
                            created_on: job.created_on,
                            last_updated: job.last_updated,
                            duration_seconds: job.duration_seconds,
                            plays: job.plays,
                            status: job.status,
                            owner: job.owner,
                            last_played_at: last_play.map(fmt_epoch_local).unwrap_or_default(),
                            reason: "not_watched_within_window",
                        });
                    }
                }
                Err(err) => {
                    lookup_errors += 1;
                    error_row(&mut error_log, &job.entry_id, "media.get", &err)?;
                }
            }
        }
        client.logout().await;
    }

    let report = {
        let _span = log.span(&Phase::Write).entered();
        let mut report = ReportWriter::create(
            report_path(&config.reports_dir, "media-retention-report", "csv"),
            &OUTPUT_HEADERS,
        )?;
        for c in &candidates {
            report.row([
                c.policy,
                c.entry_id.as_str(),
                c.entry_name.as_str(),
                c.media_type.as_str(),
                c.created_on.as_str(),
                c.last_updated.as_str(),
                c.duration_seconds.as_str(),
                c.plays.as_str(),
                c.status.as_str(),
                c.owner.as_str(),
                c.last_played_at.as_str(),
                c.reason,
            ])?;
        }
        report.finish()?
    };
    let error_log_path = error_log.finish()?;

    log.info(format!(
        "✅ {} retention candidates written to {} ({} lookup errors logged to {})",
        candidates.len(),
        report.display(),
        lookup_errors,
        error_log_path.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&RetentionResult {
            rows_scanned: records.len(),
            candidates: candidates.len(),
            lookup_errors,
            report: report.display().to_string(),
            error_log: error_log_path.display().to_string(),
        })?;
    }
    Ok(())
}

/// Retention bucket for an entry, or None when it is still inside both windows.
pub fn classify_policy(
    created_at: i64,
    last_played_at: Option<i64>,
    as_of: i64,
) -> Option<&'static str> {
    let age = as_of - created_at;
    let last_gap = last_played_at.map(|lp| as_of - lp);
    if age >= SEC_4Y && last_gap.map_or(true, |gap| gap >= SEC_4Y) {
        return Some("4year");
    }
    if (SEC_2Y..SEC_4Y).contains(&age) && last_gap.map_or(true, |gap| gap >= SEC_2Y) {
        return Some("2year");
    }
    None
}

fn resolve_columns(headers: &[String]) -> Result<KmcColumns> {
    let entry = find_col(headers, &["entry id", "entryid", "id"]);
    let created = find_col(
        headers,
        &["creation date", "created at", "created on", "created_on", "created", "createdat", "creation time"],
    );
    let plays = find_col(headers, &["plays", "number of plays", "total plays"]);
    let (Some(entry), Some(created), Some(plays)) = (entry, created, plays) else {
        bail!(
            "input CSV is missing a required column (need entry ID, creation date, and plays); found: {}",
            headers.join(", ")
        );
    };
    Ok(KmcColumns {
        entry,
        created,
        plays,
        title: find_col(headers, &["title", "name"]),
        media_type: find_col(headers, &["media type", "type", "entry media type", "media"]),
        last_update: find_col(headers, &["last update date", "last updated", "last update", "update date"]),
        status: find_col(headers, &["status", "entry status"]),
        owner: find_col(headers, &["owner", "owner id", "creator", "user id"]),
        duration: find_col(headers, &["duration", "duration seconds", "duration (seconds)"]),
    })
}

fn find_col(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers.iter().position(|h| h.trim().eq_ignore_ascii_case(candidate))
    })
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Epoch seconds from whatever a KMC export puts in a date cell: raw epoch
/// (seconds or milliseconds) or a handful of date formats.
pub fn parse_any_epoch(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(if s.len() >= 13 { n / 1000 } else { n });
    }
    const DATETIME_FORMATS: [&str; 4] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M", "%m/%d/%y %H:%M"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
        }
    }
    None
}

fn error_row(log: &mut ReportWriter, entry_id: &str, stage: &str, error: &str) -> Result<()> {
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    log.row([stamp.as_str(), entry_id, stage, error])
}

#[cfg(test)]
mod tests {
    use super::*;

    const AS_OF: i64 = 20 * SEC_PER_YEAR;

    #[test]
    fn never_watched_buckets_by_age() {
        assert_eq!(classify_policy(AS_OF - SEC_4Y, None, AS_OF), Some("4year"));
        assert_eq!(classify_policy(AS_OF - SEC_2Y, None, AS_OF), Some("2year"));
        assert_eq!(classify_policy(AS_OF - SEC_2Y + 1, None, AS_OF), None);
    }

    #[test]
    fn recent_plays_keep_an_entry_out() {
        let created = AS_OF - SEC_4Y - 1;
        // watched last year: inside both windows
        assert_eq!(classify_policy(created, Some(AS_OF - SEC_PER_YEAR), AS_OF), None);
        // watched three years ago: too recent for 4year, too old for 2year's age band
        assert_eq!(classify_policy(created, Some(AS_OF - 3 * SEC_PER_YEAR), AS_OF), None);
        // not watched in over four years
        assert_eq!(classify_policy(created, Some(AS_OF - SEC_4Y), AS_OF), Some("4year"));
    }

    #[test]
    fn two_year_band_needs_a_two_year_gap() {
        let created = AS_OF - 3 * SEC_PER_YEAR;
        assert_eq!(classify_policy(created, Some(AS_OF - SEC_PER_YEAR), AS_OF), None);
        assert_eq!(classify_policy(created, Some(AS_OF - SEC_2Y), AS_OF), Some("2year"));
    }

    #[test]
    fn kmc_header_variants_resolve() {
        let headers: Vec<String> =
            ["Entry ID", "Name", "Creation Date", "Plays", "Media Type", "Status", "Duration"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        let columns = resolve_columns(&headers).unwrap();
        assert_eq!(columns.entry, 0);
        assert_eq!(columns.title, Some(1));
        assert_eq!(columns.created, 2);
        assert_eq!(columns.plays, 3);
        assert_eq!(columns.media_type, Some(4));
        assert_eq!(columns.status, Some(5));
        assert_eq!(columns.duration, Some(6));
        assert_eq!(columns.owner, None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let headers: Vec<String> =
            ["Name", "Plays"].iter().map(|s| s.to_string()).collect();
        assert!(resolve_columns(&headers).is_err());
    }

    #[test]
    fn epochs_parse_from_common_formats() {
        assert_eq!(parse_any_epoch("1716000000"), Some(1_716_000_000));
        assert_eq!(parse_any_epoch("1716000000000"), Some(1_716_000_000));
        assert_eq!(parse_any_epoch("2024-05-18 02:40:00"), Some(1_716_000_000));
        assert_eq!(parse_any_epoch("2024-05-18"), Some(1_715_990_400));
        assert_eq!(parse_any_epoch("05/18/2024"), Some(1_715_990_400));
        assert_eq!(parse_any_epoch("not a date"), None);
        assert_eq!(parse_any_epoch(""), None);
    }
}
