use anyhow::{bail, Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use regex::Regex;
use serde::Serialize;

use crate::config::Config;
use crate::kaltura::filters::MediaEntryFilter;
use crate::kaltura::types::{MediaEntry, MEDIA_TYPE_VIDEO};
use crate::kaltura::{KalturaClient, ERR_MAX_MATCHES};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::report::Phase};
use crate::util::time::{day_end_utc, day_start_utc, fmt_epoch_local, hhmmss, parse_date};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Interval {
    #[value(name = "yearly")]
    Yearly,
    #[value(name = "monthly")]
    Monthly,
    #[value(name = "weekly")]
    Weekly,
    #[value(name = "daily")]
    Daily,
}

impl Interval {
    fn label(self) -> &'static str {
        match self {
            Interval::Yearly => "year",
            Interval::Monthly => "month",
            Interval::Weekly => "week",
            Interval::Daily => "day",
        }
    }
}

#[derive(Args, Debug)]
pub struct CountDurationArgs {
    /// Restrict to entries carrying this tag
    #[arg(long)]
    tag: Option<String>,
    /// Restrict to entries in these category IDs
    #[arg(long)]
    category: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: String,
    /// End date (YYYY-MM-DD, default today)
    #[arg(long)]
    end: Option<String>,
    /// Query chunk size; shrink it when a window trips the result cap
    #[arg(long, value_enum, default_value_t = Interval::Monthly)]
    interval: Interval,
}

#[derive(Serialize)]
struct CountDurationResult {
    windows: usize,
    entries: usize,
    total_minutes: f64,
    summary_report: String,
    details_report: String,
}

pub async fn run(config: &Config, args: CountDurationArgs) -> Result<()> {
    let log = telemetry::report();
    let _root = log.root_span().entered();

    let start = parse_date(&args.start).context("START DATE must be in YYYY-MM-DD format")?;
    let end = match &args.end {
        Some(raw) => parse_date(raw).context("END DATE must be in YYYY-MM-DD format")?,
        None => Local::now().date_naive(),
    };
    if end < start {
        bail!("END DATE cannot be earlier than START DATE");
    }

    let windows = {
        let _span = log.span(&Phase::Chunk).entered();
        interval_ranges(start, end, args.interval)
    };
    log.info(format!("🗓️  {} query windows from {} to {}", windows.len(), start, end));

    let client = KalturaClient::login(config).await?;

    // (label, count, minutes)
    let mut summary: Vec<(String, usize, f64)> = Vec::with_capacity(windows.len());
    let mut details: Vec<[String; 8]> = Vec::new();
    {
        let _span = log.span(&Phase::Fetch).entered();
        for (win_start, win_end) in &windows {
            log.info(format!("Processing: {} to {}", win_start, win_end));
            let entries = fetch_window(&client, &args, *win_start, *win_end).await?;
            let count = entries.len();
            let duration: i64 = entries.iter().map(|e| e.duration).sum();
            for entry in &entries {
                let filename = source_filename(&client, entry).await.unwrap_or_default();
                details.push([
                    entry.id.clone(),
                    entry.name.clone(),
                    entry.duration.to_string(),
                    hhmmss(entry.duration),
                    fmt_epoch_local(entry.created_at),
                    fmt_epoch_local(entry.updated_at),
                    entry.user_id.clone(),
                    filename,
                ]);
            }
            summary.push((
                format!("{} to {}", win_start, win_end),
                count,
                duration as f64 / 60.0,
            ));
        }
    }

    let (total_entries, total_minutes) = {
        let _span = log.span(&Phase::Summarize).entered();
        let total_entries: usize = summary.iter().map(|(_, c, _)| c).sum();
        let total_minutes: f64 = summary.iter().map(|(_, _, m)| m).sum();
        log.info("--- Summary by Time Chunk ---");
        for (label, count, minutes) in &summary {
            log.info(format!("{}: {} entries, {:.2} minutes", label, count, minutes));
        }
        let hours = total_minutes / 60.0;
        let days = hours / 24.0;
        log.info(format!("Entries:          {}", total_entries));
        log.info(format!("Duration (mins):  {:.2}", total_minutes));
        log.info(format!("Duration (hours): {:.2}", hours));
        log.info(format!("Duration (days):  {:.2}", days));
        log.info(format!("Duration (months):{:.2}", days / 30.4375));
        log.info(format!("Duration (years): {:.2}", days / 365.25));
        (total_entries, total_minutes)
    };

    let (summary_path, details_path) = {
        let _span = log.span(&Phase::Write).entered();
        let tag_label = args
            .tag
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| t.replace(' ', "_"))
            .unwrap_or_else(|| "noTag".to_string());
        let cat_label = args
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "noCategory".to_string());
        let stem = format!("{}_{}_{}", tag_label, cat_label, args.interval.label());

        let mut summary_report = ReportWriter::create(
            report_path(&config.reports_dir, &format!("video-summary_{}", stem), "csv"),
            &["range", "entry_count", "total_duration_minutes"],
        )?;
        for (label, count, minutes) in &summary {
            summary_report.row([
                label.as_str(),
                count.to_string().as_str(),
                format!("{:.2}", minutes).as_str(),
            ])?;
        }
        let summary_path = summary_report.finish()?;

        let mut details_report = ReportWriter::create(
            report_path(&config.reports_dir, &format!("video-details_{}", stem), "csv"),
            &[
                "entryId", "name", "duration_sec", "duration",
                "created_at", "updated_at", "owner_id", "original_filename",
            ],
        )?;
        for row in &details {
            details_report.row(row.iter().map(|s| s.as_str()))?;
        }
        (summary_path, details_report.finish()?)
    };

    log.info(format!("✅ CSV files created:\n  - {}\n  - {}", summary_path.display(), details_path.display()));
    if telemetry::config::json_mode() {
        log.result(&CountDurationResult {
            windows: windows.len(),
            entries: total_entries,
            total_minutes,
            summary_report: summary_path.display().to_string(),
            details_report: details_path.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

async fn fetch_window(
    client: &KalturaClient,
    args: &CountDurationArgs,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<MediaEntry>> {
    let filter = MediaEntryFilter {
        media_type_equal: Some(MEDIA_TYPE_VIDEO),
        tags_like: args.tag.clone().filter(|t| !t.is_empty()),
        categories_ids_match_or: args.category.clone().filter(|c| !c.is_empty()),
        created_at_greater_than_or_equal: Some(day_start_utc(start).timestamp()),
        created_at_less_than_or_equal: Some(day_end_utc(end).timestamp()),
        ..Default::default()
    };
    match client.media_list(&filter, 500).await {
        Ok(entries) => Ok(entries),
        Err(err) if err.api_code() == Some(ERR_MAX_MATCHES) => bail!(
            "the window {} to {} exceeds the 10,000 match limit; \
             re-run with a smaller --interval (weekly or daily)",
            start,
            end
        ),
        Err(err) => Err(err.into()),
    }
}

/// Original upload filename, scraped from the source flavor's delivery URL.
async fn source_filename(client: &KalturaClient, entry: &MediaEntry) -> Option<String> {
    let flavors = match client.flavor_list(&entry.id).await {
        Ok(flavors) => flavors,
        Err(err) => {
            tracing::warn!("Error retrieving filename for entry {}: {}", entry.id, err);
            return None;
        }
    };
    let source = flavors.iter().find(|f| f.is_original)?;
    let url = match client.flavor_get_url(&source.id).await {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!("Error retrieving filename for entry {}: {}", entry.id, err);
            return None;
        }
    };
    filename_from_flavor_url(&url).map(|raw| clean_source_filename(&raw))
}

pub fn filename_from_flavor_url(url: &str) -> Option<String> {
    let re = Regex::new(r"/fileName/([^/]+)/").expect("static pattern");
    re.captures(url).map(|c| c[1].to_string())
}

/// Strip the " (Source)" suffix MediaSpace appends and any underscores left
/// dangling before the extension.
pub fn clean_source_filename(raw: &str) -> String {
    let no_source = Regex::new(r"\s*\(Source\)").expect("static pattern").replace_all(raw, "");
    let cleaned = Regex::new(r"_*\.mp4$").expect("static pattern").replace(&no_source, ".mp4");
    cleaned.trim().to_string()
}

/// Inclusive date windows covering [start, end] with no gaps or overlaps.
pub fn interval_ranges(
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Vec<(NaiveDate, NaiveDate)> {
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        let next = match interval {
            Interval::Yearly => {
                NaiveDate::from_ymd_opt(current.year(), 12, 31).unwrap_or(current)
            }
            Interval::Monthly => {
                // day 28 + 4 days always lands in the next month
                let into_next = current.with_day(28).unwrap_or(current) + Duration::days(4);
                into_next.with_day(1).unwrap_or(into_next) - Duration::days(1)
            }
            Interval::Weekly => current + Duration::days(6),
            Interval::Daily => current,
        };
        out.push((current, next.min(end)));
        current = next + Duration::days(1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assert_covers_exactly(ranges: &[(NaiveDate, NaiveDate)], start: NaiveDate, end: NaiveDate) {
        assert_eq!(ranges.first().unwrap().0, start);
        assert_eq!(ranges.last().unwrap().1, end);
        for window in ranges.windows(2) {
            assert_eq!(window[0].1 + Duration::days(1), window[1].0, "gap or overlap");
        }
        for (s, e) in ranges {
            assert!(s <= e);
        }
    }

    #[test]
    fn monthly_windows_end_on_month_boundaries() {
        let ranges = interval_ranges(d(2024, 1, 15), d(2024, 4, 10), Interval::Monthly);
        assert_eq!(ranges[0], (d(2024, 1, 15), d(2024, 1, 31)));
        assert_eq!(ranges[1], (d(2024, 2, 1), d(2024, 2, 29))); // leap year
        assert_eq!(ranges[2], (d(2024, 3, 1), d(2024, 3, 31)));
        assert_eq!(ranges[3], (d(2024, 4, 1), d(2024, 4, 10)));
        assert_covers_exactly(&ranges, d(2024, 1, 15), d(2024, 4, 10));
    }

    #[test]
    fn yearly_windows_end_on_dec_31() {
        let ranges = interval_ranges(d(2022, 6, 1), d(2024, 2, 1), Interval::Yearly);
        assert_eq!(ranges[0], (d(2022, 6, 1), d(2022, 12, 31)));
        assert_eq!(ranges[1], (d(2023, 1, 1), d(2023, 12, 31)));
        assert_eq!(ranges[2], (d(2024, 1, 1), d(2024, 2, 1)));
        assert_covers_exactly(&ranges, d(2022, 6, 1), d(2024, 2, 1));
    }

    #[test]
    fn daily_windows_are_single_days() {
        let ranges = interval_ranges(d(2024, 3, 1), d(2024, 3, 3), Interval::Daily);
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|(s, e)| s == e));
        assert_covers_exactly(&ranges, d(2024, 3, 1), d(2024, 3, 3));
    }

    #[test]
    fn weekly_windows_span_seven_days() {
        let ranges = interval_ranges(d(2024, 3, 1), d(2024, 3, 20), Interval::Weekly);
        assert_eq!(ranges[0], (d(2024, 3, 1), d(2024, 3, 7)));
        assert_covers_exactly(&ranges, d(2024, 3, 1), d(2024, 3, 20));
    }

    #[test]
    fn single_day_range_is_one_window() {
        for interval in [Interval::Yearly, Interval::Monthly, Interval::Weekly, Interval::Daily] {
            let ranges = interval_ranges(d(2024, 5, 5), d(2024, 5, 5), interval);
            assert_eq!(ranges, vec![(d(2024, 5, 5), d(2024, 5, 5))]);
        }
    }

    #[test]
    fn source_suffix_and_underscores_are_cleaned() {
        assert_eq!(clean_source_filename("lecture_1 (Source)"), "lecture_1");
        assert_eq!(clean_source_filename("talk__.mp4"), "talk.mp4");
        assert_eq!(clean_source_filename("talk (Source)_.mp4"), "talk.mp4");
        assert_eq!(clean_source_filename("plain.mp4"), "plain.mp4");
    }

    #[test]
    fn filename_scraped_from_delivery_url() {
        let url = "https://cdn.example.com/p/123/sp/0/flavorId/1_f/fileName/My_Talk.mp4/forceproxy/true";
        assert_eq!(filename_from_flavor_url(url), Some("My_Talk.mp4".to_string()));
        assert_eq!(filename_from_flavor_url("https://cdn.example.com/nothing"), None);
    }
}
