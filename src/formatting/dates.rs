//! Date helpers pinned to Africa/Nairobi (UTC+03:00, no daylight saving).

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};

const NAIROBI_OFFSET_SECS: i32 = 3 * 3600;
pub const INVALID_DATE: &str = "Invalid Date";

pub fn nairobi() -> FixedOffset {
    FixedOffset::east_opt(NAIROBI_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn now_nairobi() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&nairobi())
}

/// Current calendar date in Nairobi
pub fn today() -> NaiveDate {
    now_nairobi().date_naive()
}

/// Parses `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` (Nairobi local time)
pub fn parse_date_time(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&nairobi()));
    }
    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    nairobi().from_local_datetime(&naive).single()
}

/// `2024-01-15` -> `15 Jan 2024`
pub fn format_date(input: &str) -> String {
    parse_date_time(input)
        .map(|dt| dt.format("%-d %b %Y").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// `2024-01-15T11:30:00Z` -> `15 Jan 2024, 14:30`
pub fn format_date_time(input: &str) -> String {
    parse_date_time(input)
        .map(|dt| dt.format("%-d %b %Y, %H:%M").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// 24-hour Nairobi time, e.g. `14:30`
pub fn format_time(input: &str) -> String {
    parse_date_time(input)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

pub fn format_naive_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// Days from today until `due`; negative once the date has passed
pub fn days_until_due(due: NaiveDate) -> i64 {
    days_between(today(), due)
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn is_overdue(due: NaiveDate) -> bool {
    due < today()
}

/// Human description of `date` relative to today, e.g. `Yesterday` or `in 3 days`
pub fn relative_time(date: NaiveDate) -> String {
    relative_to(date, today())
}

pub fn relative_to(date: NaiveDate, today: NaiveDate) -> String {
    match days_between(today, date) {
        0 => "Today".to_string(),
        -1 => "Yesterday".to_string(),
        1 => "Tomorrow".to_string(),
        n if n < 0 => format!("{} days ago", -n),
        n => format!("in {} days", n),
    }
}

/// The Sunday that starts the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
