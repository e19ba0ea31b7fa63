use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::kaltura::filters::CuePointFilter;
use crate::kaltura::{select, KalturaClient};
use crate::report::{report_path, ReportWriter};
use crate::telemetry::{self, ops::cuepoints::Phase};
use crate::util::prompt::confirm_yes;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum CueKind {
    #[value(name = "chapter")]
    Chapter,
    #[value(name = "quiz-question")]
    QuizQuestion,
    #[value(name = "quiz-answer")]
    QuizAnswer,
}

impl CueKind {
    /// The vendor cuePointType discriminator.
    pub fn type_equal(self) -> &'static str {
        match self {
            CueKind::Chapter => "thumbCuePoint.Thumb",
            CueKind::QuizQuestion => "quiz.QUIZ_QUESTION",
            CueKind::QuizAnswer => "quiz.QUIZ_ANSWER",
        }
    }
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Comma-delimited entry IDs
    #[arg(long)]
    ids: String,
    /// Cue point type to delete
    #[arg(long, value_enum, default_value_t = CueKind::Chapter)]
    kind: CueKind,
    /// Skip the per-entry confirmation
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Serialize)]
struct DeleteResult {
    entries: usize,
    deleted: usize,
    failed: usize,
    report: String,
}

pub async fn run(config: &Config, args: DeleteArgs) -> Result<()> {
    let log = telemetry::cuepoints();
    let _root = log.root_span().entered();

    let entry_ids = select::split_csv(&args.ids);
    if entry_ids.is_empty() {
        bail!("no valid entry IDs provided");
    }
    let cue_type = args.kind.type_equal();

    let client = KalturaClient::login(config).await?;

    let path = report_path(&config.reports_dir, "delete-cuepoints", "csv");
    let mut report = ReportWriter::create(
        path,
        &["entry_id", "cue_point_id", "cue_point_type", "status", "error"],
    )?;
    let mut deleted = 0usize;
    let mut failed = 0usize;

    for entry_id in &entry_ids {
        log.info(format!("🎬 Processing entry: {}", entry_id));
        let cue_points = {
            let _span = log.span(&Phase::List).entered();
            let filter = CuePointFilter {
                entry_id_equal: Some(entry_id.clone()),
                cue_point_type_equal: Some(cue_type.to_string()),
            };
            match client.cue_point_list(&filter).await {
                Ok(points) => points,
                Err(err) => {
                    failed += 1;
                    log.warn(format!("listing cue points for {} failed: {}", entry_id, err));
                    report.row([entry_id.as_str(), "", cue_type, "FAILED", err.to_string().as_str()])?;
                    continue;
                }
            }
        };
        if cue_points.is_empty() {
            log.info(format!("   No {} cue points found.", cue_type));
            report.row([entry_id.as_str(), "", cue_type, "NONE_FOUND", ""])?;
            continue;
        }

        let confirmed = {
            let _span = log.span(&Phase::Confirm).entered();
            confirm_yes(
                &format!("{} cue points of type {} found on {}. Delete them?", cue_points.len(), cue_type, entry_id),
                args.yes,
            )?
        };
        if !confirmed {
            log.info("   Skipping deletion for this entry.");
            for cp in &cue_points {
                report.row([entry_id.as_str(), cp.id.as_str(), cue_type, "SKIPPED", ""])?;
            }
            continue;
        }

        let _span = log.span(&Phase::Delete).entered();
        for cp in &cue_points {
            match client.cue_point_delete(&cp.id).await {
                Ok(_) => {
                    deleted += 1;
                    log.item(&cp.id, "DELETED");
                    report.row([entry_id.as_str(), cp.id.as_str(), cue_type, "DELETED", ""])?;
                }
                Err(err) => {
                    failed += 1;
                    log.item(&cp.id, "FAILED");
                    report.row([
                        entry_id.as_str(),
                        cp.id.as_str(),
                        cue_type,
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
        "✅ Deleted {} cue points across {} entries ({} failures), report: {}",
        deleted,
        entry_ids.len(),
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&DeleteResult {
            entries: entry_ids.len(),
            deleted,
            failed,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_kinds_map_to_vendor_types() {
        assert_eq!(CueKind::Chapter.type_equal(), "thumbCuePoint.Thumb");
        assert_eq!(CueKind::QuizQuestion.type_equal(), "quiz.QUIZ_QUESTION");
        assert_eq!(CueKind::QuizAnswer.type_equal(), "quiz.QUIZ_ANSWER");
    }
}
