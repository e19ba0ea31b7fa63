use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use url::Url;

const MAX_NAME_LEN: usize = 100;

/// Collapse anything outside [A-Za-z0-9_-] to underscores and cap the length,
/// so entry titles and caption labels are safe as filename components.
pub fn sanitize_filename(name: &str) -> String {
    let re = Regex::new(r"[^A-Za-z0-9_-]").expect("static pattern");
    let cleaned = re.replace_all(name, "_").to_string();
    cleaned.chars().take(MAX_NAME_LEN).collect()
}

/// Filename advertised by a Content-Disposition header, if any.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let name = rest.trim().trim_matches('"').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Last path segment of a URL, used when no header names the file.
pub fn filename_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let name = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?.to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Claim a collision-free path by creating the file, suffixing `_1`, `_2`,
/// ... before the extension until creation succeeds. `create_new` makes the
/// claim atomic, so concurrent downloads racing for the same name each end up
/// with their own file.
pub fn create_unique(dir: &Path, filename: &str) -> io::Result<(PathBuf, File)> {
    let (base, ext) = match filename.rsplit_once('.') {
        Some((b, e)) => (b.to_string(), format!(".{}", e)),
        None => (filename.to_string(), String::new()),
    };
    let mut counter = 0;
    loop {
        let candidate = if counter == 0 {
            dir.join(filename)
        } else {
            dir.join(format!("{}_{}{}", base, counter, ext))
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("Week 3: Intro (part 1)"), "Week_3__Intro__part_1_");
        assert_eq!(sanitize_filename("already-safe_name"), "already-safe_name");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }

    #[test]
    fn content_disposition_parsing() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"lecture.mp4\""),
            Some("lecture.mp4".to_string())
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }

    #[test]
    fn url_fallback_takes_last_segment() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/p/123/fileName/talk.mp4"),
            Some("talk.mp4".to_string())
        );
        assert_eq!(filename_from_url("not a url"), None);
    }

    #[test]
    fn create_unique_suffixes_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_unique(dir.path(), "a.mp4").unwrap();
        assert_eq!(first.file_name().unwrap(), "a.mp4");
        let (second, _) = create_unique(dir.path(), "a.mp4").unwrap();
        assert_eq!(second.file_name().unwrap(), "a_1.mp4");
        let (bare, _) = create_unique(dir.path(), "noext").unwrap();
        assert_eq!(bare.file_name().unwrap(), "noext");
    }

    // claiming happens at creation, not first write: two callers resolving
    // the same name before either writes a byte still get distinct files
    #[test]
    fn create_unique_claims_paths_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let (first, f1) = create_unique(dir.path(), "a.mp4").unwrap();
        let (second, f2) = create_unique(dir.path(), "a.mp4").unwrap();
        assert_ne!(first, second);
        drop((f1, f2));
        assert!(first.exists());
        assert!(second.exists());
    }
}
