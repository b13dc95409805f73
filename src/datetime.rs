//! Date/time utilities for ghfeed.
//!
//! Item dates are shown twice in a message: as an absolute date formatted in
//! the configured timezone, and as a humanized relative time ("3 hours ago")
//! using the same rounding thresholds as moment.js.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format a DateTime<Utc> in the specified timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Asia/Tokyo", "UTC")
/// * `format` - strftime format string (e.g., "%Y/%m/%d %H:%M")
///
/// An unknown timezone falls back to UTC.
pub fn format_published(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Unit of a humanized duration, after rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Seconds,
    Minute,
    Minutes(i64),
    Hour,
    Hours(i64),
    Day,
    Days(i64),
    Month,
    Months(i64),
    Year,
    Years(i64),
}

/// Round an absolute duration in seconds to a display span.
fn span_for(secs: f64) -> Span {
    let seconds = secs.round() as i64;
    let minutes = (secs / 60.0).round() as i64;
    let hours = (secs / 3600.0).round() as i64;
    let days = (secs / 86_400.0).round() as i64;
    let months = (secs / 86_400.0 / 30.436875).round() as i64;
    let years = (secs / 86_400.0 / 365.2425).round() as i64;

    if seconds < 45 {
        Span::Seconds
    } else if minutes <= 1 {
        Span::Minute
    } else if minutes < 45 {
        Span::Minutes(minutes)
    } else if hours <= 1 {
        Span::Hour
    } else if hours < 22 {
        Span::Hours(hours)
    } else if days <= 1 {
        Span::Day
    } else if days < 26 {
        Span::Days(days)
    } else if months <= 1 {
        Span::Month
    } else if months < 11 {
        Span::Months(months)
    } else if years <= 1 {
        Span::Year
    } else {
        Span::Years(years)
    }
}

fn span_en(span: Span) -> String {
    match span {
        Span::Seconds => "a few seconds".to_string(),
        Span::Minute => "a minute".to_string(),
        Span::Minutes(n) => format!("{n} minutes"),
        Span::Hour => "an hour".to_string(),
        Span::Hours(n) => format!("{n} hours"),
        Span::Day => "a day".to_string(),
        Span::Days(n) => format!("{n} days"),
        Span::Month => "a month".to_string(),
        Span::Months(n) => format!("{n} months"),
        Span::Year => "a year".to_string(),
        Span::Years(n) => format!("{n} years"),
    }
}

fn span_ja(span: Span) -> String {
    match span {
        Span::Seconds => "数秒".to_string(),
        Span::Minute => "1分".to_string(),
        Span::Minutes(n) => format!("{n}分"),
        Span::Hour => "1時間".to_string(),
        Span::Hours(n) => format!("{n}時間"),
        Span::Day => "1日".to_string(),
        Span::Days(n) => format!("{n}日"),
        Span::Month => "1ヶ月".to_string(),
        Span::Months(n) => format!("{n}ヶ月"),
        Span::Year => "1年".to_string(),
        Span::Years(n) => format!("{n}年"),
    }
}

/// Humanize the time between `dt` and `now`.
///
/// Supported locales are `en` and `ja` (region suffixes such as `en-US` are
/// accepted); anything else is rendered in English.
pub fn time_ago(dt: &DateTime<Utc>, now: &DateTime<Utc>, locale: &str) -> String {
    let delta_ms = now.signed_duration_since(*dt).num_milliseconds();
    let future = delta_ms < 0;
    let span = span_for(delta_ms.unsigned_abs() as f64 / 1000.0);

    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match (language.as_str(), future) {
        ("ja", false) => format!("{}前", span_ja(span)),
        ("ja", true) => format!("{}後", span_ja(span)),
        (_, false) => format!("{} ago", span_en(span)),
        (_, true) => format!("in {}", span_en(span)),
    }
}
