use std::collections::HashSet;

use anyhow::{bail, Result};
use url::form_urlencoded;

/// One validated input row for channel creation.
#[derive(Debug, Clone)]
pub struct ChannelRow {
    pub name: String,
    pub owner: String,
    pub privacy: i32,
    pub members: Vec<String>,
}

/// Validate a raw row. `row_number` is the 1-based CSV line (header = line 1)
/// used in error messages.
pub fn parse_row(
    row_number: usize,
    name: &str,
    owner: &str,
    privacy: &str,
    members: &str,
) -> Result<ChannelRow> {
    let name = name.trim();
    let owner = owner.trim();
    let privacy = privacy.trim();

    let mut missing = Vec::new();
    if name.is_empty() {
        missing.push("channelName");
    }
    if owner.is_empty() {
        missing.push("owner");
    }
    if privacy.is_empty() {
        missing.push("privacy");
    }
    if !missing.is_empty() {
        bail!(
            "Row {}: Missing field(s): {} (channelName: '{}')",
            row_number,
            missing.join(", "),
            if name.is_empty() { "<unnamed>" } else { name }
        );
    }

    let privacy: i32 = match privacy {
        "1" => 1,
        "2" => 2,
        "3" => 3,
        other => bail!("Row {}: Invalid privacy value '{}'. Must be 1, 2, or 3.", row_number, other),
    };

    let members: Vec<String> = members
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    Ok(ChannelRow { name: name.to_string(), owner: owner.to_string(), privacy, members })
}

/// Input names that collide with channels already on the server. Any hit
/// halts the run before a single category is created.
pub fn duplicate_names(rows: &[ChannelRow], existing: &HashSet<String>) -> Vec<String> {
    rows.iter().filter(|r| existing.contains(&r.name)).map(|r| r.name.clone()).collect()
}

/// Last path segment of a `>`-delimited category full name.
pub fn last_segment(full_name: &str) -> String {
    full_name.trim().split('>').next_back().unwrap_or("").trim().to_string()
}

/// MediaSpace channel URL; the name is form-encoded twice because MediaSpace
/// decodes it twice on the way in.
pub fn channel_link(base_url: &str, name: &str, category_id: i64) -> String {
    format!("{}{}/{}", base_url, form_encode(&form_encode(name)), category_id)
}

fn form_encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_row_parses() {
        let row = parse_row(2, "Chem 101", "prof@ucsd.edu", "3", "ta1, ta2 ,").unwrap();
        assert_eq!(row.name, "Chem 101");
        assert_eq!(row.privacy, 3);
        assert_eq!(row.members, vec!["ta1", "ta2"]);
    }

    #[test]
    fn missing_fields_name_the_row() {
        let err = parse_row(4, "", "owner", "1", "").unwrap_err().to_string();
        assert!(err.contains("Row 4"));
        assert!(err.contains("channelName"));
        assert!(err.contains("<unnamed>"));
    }

    #[test]
    fn privacy_must_be_one_two_or_three() {
        assert!(parse_row(2, "c", "o", "0", "").is_err());
        assert!(parse_row(2, "c", "o", "4", "").is_err());
        assert!(parse_row(2, "c", "o", "public", "").is_err());
        assert_eq!(parse_row(2, "c", "o", "2", "").unwrap().privacy, 2);
    }

    #[test]
    fn duplicates_against_existing_names() {
        let rows = vec![
            parse_row(2, "Old Channel", "o", "1", "").unwrap(),
            parse_row(3, "New Channel", "o", "1", "").unwrap(),
        ];
        let existing: HashSet<String> = ["Old Channel".to_string()].into_iter().collect();
        assert_eq!(duplicate_names(&rows, &existing), vec!["Old Channel"]);
    }

    #[test]
    fn full_name_last_segment() {
        assert_eq!(last_segment("MediaSpace>site>channels>Chem 101 "), "Chem 101");
        assert_eq!(last_segment("solo"), "solo");
    }

    #[test]
    fn link_is_double_encoded() {
        let link = channel_link("https://mediaspace.example.edu/channel/", "My Channel", 42);
        assert_eq!(link, "https://mediaspace.example.edu/channel/My%2BChannel/42");
        let link = channel_link("https://mediaspace.example.edu/channel/", "Chem & Bio", 7);
        assert_eq!(link, "https://mediaspace.example.edu/channel/Chem%2B%2526%2BBio/7");
    }
}
