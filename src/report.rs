use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::time::now_stamp;

/// CSV report writer with a fixed column schema. The header row is written at
/// creation, so a run that produces zero data rows still leaves a valid file.
pub struct ReportWriter {
    inner: csv::Writer<File>,
    path: PathBuf,
}

impl ReportWriter {
    pub fn create(path: PathBuf, headers: &[&str]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {:?}", parent))?;
        }
        let file =
            File::create(&path).with_context(|| format!("creating report file {:?}", path))?;
        let mut inner = csv::Writer::from_writer(file);
        inner.write_record(headers)?;
        Ok(ReportWriter { inner, path })
    }

    pub fn row<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write_record(fields)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.inner.flush()?;
        Ok(self.path)
    }
}

/// `{reports_dir}/{YYYY-MM-DD-HHMM}_{name}.{ext}`
pub fn report_path(reports_dir: &Path, name: &str, ext: &str) -> PathBuf {
    reports_dir.join(format!("{}_{}.{}", now_stamp(), name, ext))
}

/// Open an input CSV with headers normalized: a UTF-8 BOM on the first header
/// and stray quotes/whitespace are stripped, matching how spreadsheet exports
/// tend to arrive.
pub fn open_input_csv(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("input CSV {:?} not found", path))?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim_matches('"').trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }
    Ok((headers, rows))
}

/// Column index by header name, fatal when absent.
pub fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("missing expected column header {:?} in input CSV", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let writer = ReportWriter::create(path.clone(), &["entry_id", "status"]).unwrap();
        let written = writer.finish().unwrap();
        let content = std::fs::read_to_string(written).unwrap();
        assert_eq!(content.trim(), "entry_id,status");
    }

    #[test]
    fn rows_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut writer = ReportWriter::create(path.clone(), &["id", "status"]).unwrap();
        writer.row(["1_a", "FOUND"]).unwrap();
        writer.row(["1_b", "NOT FOUND"]).unwrap();
        writer.finish().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["id,status", "1_a,FOUND", "1_b,NOT FOUND"]);
    }

    #[test]
    fn input_headers_lose_bom_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "\u{feff}entry_id,\"name\"\n1_a,Lecture 1\n").unwrap();
        drop(f);
        let (headers, rows) = open_input_csv(&path).unwrap();
        assert_eq!(headers, vec!["entry_id", "name"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(column_index(&headers, "entry_id").unwrap(), 0);
        assert!(column_index(&headers, "missing").is_err());
    }
}
