use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a publish date as stored in page metadata. Zone-less values are read as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// `DD-MM-YYYY`, or empty when the input does not parse.
pub fn format_day(raw: &str) -> String {
    parse_published(raw).map(|dt| dt.format("%d-%m-%Y").to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_layouts() {
        assert_eq!(format_day("2024-03-05T10:11:12Z"), "05-03-2024");
        assert_eq!(format_day("2024-03-05T23:30:00-05:00"), "06-03-2024");
        assert_eq!(format_day("Tue, 05 Mar 2024 10:11:12 +0000"), "05-03-2024");
        assert_eq!(format_day("2024-03-05 10:11:12"), "05-03-2024");
        assert_eq!(format_day("2024-03-05T10:11:12"), "05-03-2024");
        assert_eq!(format_day("2024-03-05"), "05-03-2024");
    }

    #[test]
    fn garbage_is_empty() {
        assert_eq!(format_day(""), "");
        assert_eq!(format_day("last tuesday"), "");
        assert!(parse_published("2024-13-40").is_none());
    }
}
