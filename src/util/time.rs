use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Report-name timestamp, e.g. 2025-08-28-1412 (24-hour clock).
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d-%H%M").to_string()
}

/// Epoch seconds rendered in the machine's local timezone.
pub fn fmt_epoch_local(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Epoch seconds as a UTC calendar date (used in download filenames).
pub fn fmt_epoch_utc_date(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Seconds as H:MM:SS, the way durations appear in the detail reports.
pub fn hhmmss(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{}:{:02}:{:02}", h, m, s)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
}

pub fn day_end_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(23, 59, 59).expect("end of day is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmmss_formats_durations() {
        assert_eq!(hhmmss(0), "0:00:00");
        assert_eq!(hhmmss(61), "0:01:01");
        assert_eq!(hhmmss(3661), "1:01:01");
        assert_eq!(hhmmss(-5), "0:00:00");
    }

    #[test]
    fn parse_date_accepts_iso_only() {
        assert_eq!(parse_date("2025-03-20"), NaiveDate::from_ymd_opt(2025, 3, 20));
        assert!(parse_date("03/20/2025").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let start = day_start_utc(d).timestamp();
        let end = day_end_utc(d).timestamp();
        assert_eq!(end - start, 86_399);
    }
}
