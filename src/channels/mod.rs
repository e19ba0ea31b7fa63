use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::{env_or, Config};
use crate::kaltura::filters::CategoryFilter;
use crate::kaltura::types::{NewCategory, CATEGORY_USER_PERMISSION_MEMBER};
use crate::kaltura::KalturaClient;
use crate::report::{column_index, open_input_csv, report_path, ReportWriter};
use crate::telemetry::{self, ops::channels::Phase};

pub mod validate;

use validate::{channel_link, duplicate_names, last_segment, parse_row, ChannelRow};

#[derive(Debug, Subcommand)]
pub enum ChannelsCmd {
    /// Create MediaSpace channels in bulk from a CSV
    Create(CreateArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Input CSV with channel rows
    #[arg(long)]
    csv: PathBuf,
    /// Parent category ID for the new channels
    /// (default: PARENT_ID from the environment)
    #[arg(long)]
    parent: Option<i64>,
}

#[derive(Serialize)]
struct ChannelsResult {
    created: usize,
    members_added: usize,
    failed: usize,
    report: String,
}

struct ChannelSettings {
    parent_id: i64,
    full_name_prefix: String,
    mediaspace_base_url: String,
    privacy_context: String,
    user_join_policy: i32,
    appear_in_list: i32,
    inheritance_type: i32,
    default_permission_level: i32,
    contribution_policy: i32,
    moderation: i32,
}

impl ChannelSettings {
    fn from_env(parent_arg: Option<i64>) -> Result<Self> {
        let parent_id = match parent_arg {
            Some(id) => id,
            None => env_or("PARENT_ID", "")
                .parse::<i64>()
                .context("PARENT_ID must be set (env or --parent) and numeric")?,
        };
        let env_int = |name: &str, default: &str| -> Result<i32> {
            env_or(name, default)
                .parse::<i32>()
                .with_context(|| format!("{} must be numeric", name))
        };
        Ok(ChannelSettings {
            parent_id,
            full_name_prefix: env_or("FULL_NAME_PREFIX", "MediaSpace>site>channels>"),
            mediaspace_base_url: env_or(
                "MEDIA_SPACE_BASE_URL",
                "https://mediaspace.ucsd.edu/channel/",
            ),
            privacy_context: env_or("PRIVACY_CONTEXT", "MediaSpace"),
            user_join_policy: env_int("USER_JOIN_POLICY", "3")?,
            appear_in_list: env_int("APPEAR_IN_LIST", "3")?,
            inheritance_type: env_int("INHERITANCE_TYPE", "2")?,
            default_permission_level: env_int("DEFAULT_PERMISSION_LEVEL", "3")?,
            contribution_policy: env_int("CONTRIBUTION_POLICY", "2")?,
            moderation: env_int("MODERATION", "0")?,
        })
    }
}

pub async fn run(config: &Config, cmd: ChannelsCmd) -> Result<()> {
    match cmd {
        ChannelsCmd::Create(args) => create(config, args).await,
    }
}

async fn create(config: &Config, args: CreateArgs) -> Result<()> {
    let log = telemetry::channels();
    let _root = log.root_span().entered();

    let settings = ChannelSettings::from_env(args.parent)?;

    // column header names are site-specific and come from the environment
    let name_header = env_or("CHANNEL_NAME_HEADER", "channelName");
    let owner_header = env_or("OWNER_ID_HEADER", "owner");
    let members_header = env_or("CHANNEL_MEMBERS_HEADER", "members");
    let privacy_header = env_or("PRIVACY_SETTING_HEADER", "privacy");

    let rows = {
        let _span = log.span(&Phase::Validate).entered();
        let (headers, records) = open_input_csv(&args.csv)?;
        let name_col = column_index(&headers, &name_header)?;
        let owner_col = column_index(&headers, &owner_header)?;
        let privacy_col = column_index(&headers, &privacy_header)?;
        let members_col = headers.iter().position(|h| h == &members_header);

        let mut rows: Vec<ChannelRow> = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let row = parse_row(
                i + 2, // header is line 1
                record.get(name_col).unwrap_or(""),
                record.get(owner_col).unwrap_or(""),
                record.get(privacy_col).unwrap_or(""),
                members_col.and_then(|c| record.get(c)).unwrap_or(""),
            )?;
            if row.members.is_empty() {
                log.warn(format!("⚠️  Row {}: No members specified for channel '{}'.", i + 2, row.name));
            }
            rows.push(row);
        }
        rows
    };
    log.info(format!("📄 {} channel rows validated from {}", rows.len(), args.csv.display()));

    let client = KalturaClient::login(config).await?;

    {
        let _span = log.span(&Phase::Dedup).entered();
        let existing = existing_channel_names(&client, &settings.full_name_prefix).await?;
        let duplicates = duplicate_names(&rows, &existing);
        if !duplicates.is_empty() {
            log.error("🚫 The following channel names already exist and cannot be reused:");
            for name in &duplicates {
                log.error(format!("  - {}", name));
            }
            client.logout().await;
            bail!("duplicate channel names in input; no channels were created");
        }
    }

    let path = report_path(&config.reports_dir, "create-channels", "csv");
    let mut report = ReportWriter::create(
        path,
        &["channelName", "categoryId", "channelLink", "membersAdded", "owner", "status"],
    )?;
    let mut created = 0usize;
    let mut members_added = 0usize;
    let mut failed = 0usize;
    for row in &rows {
        let category = {
            let _span = log.span(&Phase::Create).entered();
            let payload = NewCategory {
                name: row.name.clone(),
                owner: row.owner.clone(),
                privacy: row.privacy,
                parent_id: settings.parent_id,
                privacy_context: settings.privacy_context.clone(),
                user_join_policy: settings.user_join_policy,
                appear_in_list: settings.appear_in_list,
                inheritance_type: settings.inheritance_type,
                default_permission_level: settings.default_permission_level,
                contribution_policy: settings.contribution_policy,
                moderation: settings.moderation,
            };
            match client.category_add(&payload).await {
                Ok(category) => category,
                Err(err) => {
                    failed += 1;
                    log.item(&row.name, "FAILED");
                    report.row([row.name.as_str(), "", "", "", row.owner.as_str(), "FAILED"])?;
                    log.warn(format!("category.add for '{}' failed: {}", row.name, err));
                    continue;
                }
            }
        };
        created += 1;
        log.info(format!("📺 Created channel: {} ({}) [Owner: {}]", category.id, row.name, row.owner));

        {
            let _span = log.span(&Phase::AddMembers).entered();
            for member in &row.members {
                match client
                    .category_user_add(category.id, member, CATEGORY_USER_PERMISSION_MEMBER)
                    .await
                {
                    Ok(_) => {
                        members_added += 1;
                        log.info(format!("   Added member: {}", member));
                    }
                    Err(err) => {
                        log.warn(format!("   Adding member {} to {} failed: {}", member, category.id, err))
                    }
                }
            }
        }

        report.row([
            row.name.as_str(),
            category.id.to_string().as_str(),
            channel_link(&settings.mediaspace_base_url, &row.name, category.id).as_str(),
            row.members.join(", ").as_str(),
            row.owner.as_str(),
            "CREATED",
        ])?;
    }

    let report = {
        let _span = log.span(&Phase::Report).entered();
        report.finish()?
    };
    log.info(format!(
        "✅ Created {} channels, {} members added ({} failed). Results saved to {}.",
        created,
        members_added,
        failed,
        report.display()
    ));
    if telemetry::config::json_mode() {
        log.result(&ChannelsResult {
            created,
            members_added,
            failed,
            report: report.display().to_string(),
        })?;
    }
    client.logout().await;
    Ok(())
}

/// Existing channel names under the configured prefix, keyed by the last
/// path segment of each category full name.
async fn existing_channel_names(
    client: &KalturaClient,
    prefix: &str,
) -> Result<HashSet<String>> {
    let filter =
        CategoryFilter { full_name_starts_with: Some(prefix.to_string()), ..Default::default() };
    let categories = client.category_list(&filter, 500).await?;
    Ok(categories
        .iter()
        .filter(|c| c.full_name.trim().starts_with(prefix))
        .map(|c| last_segment(&c.full_name))
        .collect())
}
