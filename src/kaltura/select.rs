use std::collections::HashSet;

use anyhow::{bail, Result};
use tracing::{info, warn};

use super::filters::{CategoryEntryFilter, CategoryFilter, MediaEntryFilter};
use super::types::MediaEntry;
use super::KalturaClient;

/// The fixed strategies every batch command uses to resolve its working set.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Explicit comma-delimited entry IDs; missing entries are skipped.
    Ids(Vec<String>),
    Tag(String),
    /// Category IDs, optionally expanded to all descendant categories first.
    Category { ids: Vec<String>, include_children: bool },
    Owner(String),
}

impl Selection {
    /// Build from mutually exclusive CLI options, in the priority order the
    /// original tools used: ids > category > tag > owner.
    pub fn from_options(
        ids: Option<String>,
        tag: Option<String>,
        category: Option<String>,
        include_children: bool,
        owner: Option<String>,
    ) -> Result<Self> {
        if let Some(raw) = ids {
            let list = split_csv(&raw);
            if list.is_empty() {
                bail!("--ids given but no entry IDs could be parsed");
            }
            return Ok(Selection::Ids(list));
        }
        if let Some(raw) = category {
            let list = split_csv(&raw);
            if list.is_empty() {
                bail!("--category given but no category IDs could be parsed");
            }
            return Ok(Selection::Category { ids: list, include_children });
        }
        if let Some(tag) = tag.filter(|t| !t.trim().is_empty()) {
            return Ok(Selection::Tag(tag.trim().to_string()));
        }
        if let Some(owner) = owner.filter(|o| !o.trim().is_empty()) {
            return Ok(Selection::Owner(owner.trim().to_string()));
        }
        bail!("select entries with one of --ids, --tag, --category, or --owner");
    }

    pub fn describe(&self) -> String {
        match self {
            Selection::Ids(ids) => format!("{} explicit entry IDs", ids.len()),
            Selection::Tag(tag) => format!("tag '{}'", tag),
            Selection::Category { ids, include_children } => format!(
                "category {} ({})",
                ids.join(","),
                if *include_children { "including subcategories" } else { "this category only" }
            ),
            Selection::Owner(owner) => format!("owner '{}'", owner),
        }
    }
}

/// Resolve the selection into entry objects. One bad ID never aborts the set.
pub async fn resolve_entries(
    client: &KalturaClient,
    selection: &Selection,
) -> Result<Vec<MediaEntry>> {
    match selection {
        Selection::Ids(ids) => fetch_by_ids(client, ids).await,
        Selection::Tag(tag) => {
            let filter =
                MediaEntryFilter { tags_like: Some(tag.clone()), ..Default::default() };
            Ok(client.base_entry_list(&filter, 100).await?)
        }
        Selection::Category { ids, include_children } => {
            if *include_children {
                let entry_ids = entry_ids_for_categories(client, ids, true).await?;
                fetch_by_ids(client, &entry_ids).await
            } else {
                let filter = MediaEntryFilter {
                    categories_ids_match_or: Some(ids.join(",")),
                    ..Default::default()
                };
                Ok(client.base_entry_list(&filter, 100).await?)
            }
        }
        Selection::Owner(owner) => {
            let filter =
                MediaEntryFilter { user_id_equal: Some(owner.clone()), ..Default::default() };
            Ok(client.base_entry_list(&filter, 100).await?)
        }
    }
}

async fn fetch_by_ids(client: &KalturaClient, ids: &[String]) -> Result<Vec<MediaEntry>> {
    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        match client.base_entry_get(id).await {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!("entry {} not found or not accessible: {}", id, err),
        }
    }
    Ok(entries)
}

/// Expand ancestor categories to all descendants, then list members one
/// category at a time with `categoryEntry.list`. Entry IDs are deduplicated
/// in first-seen order.
pub async fn entry_ids_for_categories(
    client: &KalturaClient,
    category_ids: &[String],
    include_children: bool,
) -> Result<Vec<String>> {
    let mut cat_ids: Vec<String> = Vec::new();
    let mut seen_cats: HashSet<String> = HashSet::new();

    for cid in category_ids {
        if seen_cats.insert(cid.clone()) {
            cat_ids.push(cid.clone());
        }
        if include_children {
            let filter =
                CategoryFilter { ancestor_id_in: Some(cid.clone()), ..Default::default() };
            match client.category_list(&filter, 500).await {
                Ok(descendants) => {
                    for cat in descendants {
                        let id = cat.id.to_string();
                        if seen_cats.insert(id.clone()) {
                            cat_ids.push(id);
                        }
                    }
                }
                Err(err) => warn!("expanding subcategories of {} failed: {}", cid, err),
            }
        }
    }
    info!("scanning {} categories for entries", cat_ids.len());

    let mut entry_ids: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for cid in &cat_ids {
        let Ok(id_num) = cid.parse::<i64>() else {
            warn!("skipping non-numeric category id {:?}", cid);
            continue;
        };
        let filter = CategoryEntryFilter { category_id_equal: Some(id_num) };
        match client.category_entry_list(&filter, 500).await {
            Ok(members) => {
                for m in members {
                    if seen.insert(m.entry_id.clone()) {
                        entry_ids.push(m.entry_id);
                    }
                }
            }
            Err(err) => warn!("categoryEntry.list failed for category {}: {}", cid, err),
        }
    }
    Ok(entry_ids)
}

pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_ids_category_tag_owner() {
        let sel = Selection::from_options(
            Some("1_a,1_b".into()),
            Some("lecture".into()),
            Some("123".into()),
            true,
            Some("prof".into()),
        )
        .unwrap();
        assert!(matches!(sel, Selection::Ids(ref ids) if ids.len() == 2));

        let sel = Selection::from_options(
            None,
            Some("lecture".into()),
            Some("123".into()),
            false,
            None,
        )
        .unwrap();
        assert!(matches!(sel, Selection::Category { ref ids, include_children: false } if ids == &["123"]));

        let sel = Selection::from_options(None, Some("lecture".into()), None, false, None).unwrap();
        assert!(matches!(sel, Selection::Tag(ref t) if t == "lecture"));

        let sel = Selection::from_options(None, None, None, false, Some("prof".into())).unwrap();
        assert!(matches!(sel, Selection::Owner(ref o) if o == "prof"));
    }

    #[test]
    fn empty_selection_is_an_error() {
        assert!(Selection::from_options(None, None, None, false, None).is_err());
        assert!(Selection::from_options(Some(" , ,".into()), None, None, false, None).is_err());
    }

    #[test]
    fn split_csv_trims_and_drops_blanks() {
        assert_eq!(split_csv("1_a, 1_b ,,1_c"), vec!["1_a", "1_b", "1_c"]);
    }
}
