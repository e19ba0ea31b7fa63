use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use futures::future::join_all;
use reqwest::Client as HttpClient;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use crate::config::{env_or, Config};
use crate::kaltura::types::{FlavorAsset, MediaEntry, MEDIA_TYPE_IMAGE};
use crate::kaltura::{select, KalturaClient};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::download::Phase};
use crate::util::fs::{create_unique, filename_from_content_disposition, filename_from_url, sanitize_filename};

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
    /// Select entries by owner user ID
    #[arg(long)]
    owner: Option<String>,
    /// Destination directory (default: DOWNLOAD_DIR from the environment, else downloads/)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Concurrent downloads
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Do not fetch multi-stream child entries
    #[arg(long, default_value_t = false)]
    skip_children: bool,
}

#[derive(Serialize)]
struct DownloadResult {
    saved: usize,
    skipped: usize,
    failed: usize,
    out_dir: String,
    report: String,
}

struct Job {
    entry_id: String,
    name: String,
    kind: &'static str, // "entry" or "child"
    url: Option<String>,
    skip_reason: Option<String>,
}

pub async fn run(config: &Config, args: DownloadArgs) -> Result<()> {
    let log = telemetry::download();
    let _root = log.root_span().entered();

    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(env_or("DOWNLOAD_DIR", "downloads")));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating download directory {:?}", out_dir))?;

    let selection =
        select::Selection::from_options(args.ids, args.tag, args.category, false, args.owner)?;
    let client = KalturaClient::login(config).await?;

    let entries = {
        let _span = log.span(&Phase::Select).entered();
        log.info(format!("🔎 Selecting entries by {}", selection.describe()));
        select::resolve_entries(&client, &selection).await?
    };
    log.info(format!("📼 {} entries matched", entries.len()));

    let mut jobs: Vec<Job> = Vec::new();
    {
        let _span = log.span(&Phase::Resolve).entered();
        for entry in &entries {
            jobs.push(resolve_job(&client, entry, "entry").await);
            if !args.skip_children {
                match client.media_children(&entry.id).await {
                    Ok(children) => {
                        for child in children.iter().filter(|c| c.is_child()) {
                            jobs.push(resolve_job(&client, child, "child").await);
                        }
                    }
                    Err(err) => log.warn(format!("listing children of {} failed: {}", entry.id, err)),
                }
            }
        }
    }

    let path = report_path(&config.reports_dir, "download-entries", "csv");
    let mut report =
        ReportWriter::create(path, &["entry_id", "name", "kind", "file", "status", "error"])?;

    let rows = {
        let _span = log.span(&Phase::Fetch).entered();
        let semaphore = Arc::new(Semaphore::new(args.workers.max(1)));
        let http = client.http().clone();
        let out_dir = Arc::new(out_dir.clone());
        let tasks = jobs.into_iter().map(|job| {
            let semaphore = Arc::clone(&semaphore);
            let http = http.clone();
            let out_dir = Arc::clone(&out_dir);
            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        return Row {
                            entry_id: job.entry_id.clone(),
                            name: job.name.clone(),
                            kind: job.kind,
                            file: String::new(),
                            status: "FAILED",
                            error: format!("failed to acquire download permit: {}", err),
                        }
                    }
                };
                fetch_one(&http, &out_dir, job).await
            })
        });
        join_all(tasks).await
    };

    let mut saved = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for joined in rows {
        let row = joined.context("download task panicked")?;
        match row.status {
            "SAVED" => saved += 1,
            "SKIPPED" => skipped += 1,
            _ => failed += 1,
        }
        log.item(&row.entry_id, row.status);
        report.row([
            row.entry_id.as_str(),
            row.name.as_str(),
            row.kind,
            row.file.as_str(),
            row.status,
            row.error.as_str(),
        ])?;
    }
    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };

    log.info(format!(
        "✅ Saved {} files ({} skipped, {} failed) under {} — report: {}",
        saved,
        skipped,
        failed,
        out_dir.display(),
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&DownloadResult {
            saved,
            skipped,
            failed,
            out_dir: out_dir.display().to_string(),
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

/// Images carry their own downloadUrl; everything else goes through the
/// source flavor (original when present, else the largest).
async fn resolve_job(client: &KalturaClient, entry: &MediaEntry, kind: &'static str) -> Job {
    let mut job = Job {
        entry_id: entry.id.clone(),
        name: entry.name.clone(),
        kind,
        url: None,
        skip_reason: None,
    };
    if entry.media_type == MEDIA_TYPE_IMAGE {
        match &entry.download_url {
            Some(url) if !url.is_empty() => job.url = Some(url.clone()),
            _ => job.skip_reason = Some("image without downloadUrl".to_string()),
        }
        return job;
    }
    match client.flavor_list(&entry.id).await {
        Ok(flavors) => match best_source_flavor(&flavors) {
            Some(flavor) => match client.flavor_get_url(&flavor.id).await {
                Ok(url) => job.url = Some(url),
                Err(err) => job.skip_reason = Some(format!("flavorAsset.getUrl failed: {}", err)),
            },
            None => job.skip_reason = Some("no downloadable flavor".to_string()),
        },
        Err(err) => job.skip_reason = Some(format!("flavorAsset.list failed: {}", err)),
    }
    job
}

fn best_source_flavor(flavors: &[FlavorAsset]) -> Option<&FlavorAsset> {
    flavors.iter().find(|f| f.is_original).or_else(|| flavors.iter().max_by_key(|f| f.size))
}

struct Row {
    entry_id: String,
    name: String,
    kind: &'static str,
    file: String,
    status: &'static str,
    error: String,
}

async fn fetch_one(http: &HttpClient, out_dir: &Path, job: Job) -> Row {
    let mut row = Row {
        entry_id: job.entry_id.clone(),
        name: job.name.clone(),
        kind: job.kind,
        file: String::new(),
        status: "SKIPPED",
        error: String::new(),
    };
    let Some(url) = job.url else {
        row.error = job.skip_reason.unwrap_or_default();
        return row;
    };
    match save_url(http, out_dir, &url, &job.entry_id, &job.name).await {
        Ok(path) => {
            row.file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            row.status = "SAVED";
        }
        Err(err) => {
            row.status = "FAILED";
            row.error = err.to_string();
        }
    }
    row
}

async fn save_url(
    http: &HttpClient,
    out_dir: &Path,
    url: &str,
    entry_id: &str,
    name: &str,
) -> Result<PathBuf> {
    let mut response = http.get(url).send().await?.error_for_status()?;
    let filename = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| format!("{}_{}.mp4", entry_id, sanitize_filename(name)));
    let (path, file) = create_unique(out_dir, &filename)
        .with_context(|| format!("creating {:?} in {:?}", filename, out_dir))?;
    let mut file = tokio::fs::File::from_std(file);
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flavor(id: &str, size: i64, original: bool) -> FlavorAsset {
        FlavorAsset {
            id: id.to_string(),
            entry_id: "1_e".to_string(),
            flavor_params_id: 0,
            size,
            tags: String::new(),
            is_original: original,
            file_ext: None,
        }
    }

    #[test]
    fn original_flavor_preferred_over_largest() {
        let flavors = vec![flavor("f1", 10, false), flavor("f2", 5, true), flavor("f3", 99, false)];
        assert_eq!(best_source_flavor(&flavors).unwrap().id, "f2");
    }

    #[test]
    fn largest_when_no_original() {
        let flavors = vec![flavor("f1", 10, false), flavor("f3", 99, false)];
        assert_eq!(best_source_flavor(&flavors).unwrap().id, "f3");
        assert!(best_source_flavor(&[]).is_none());
    }
}
