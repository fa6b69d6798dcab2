use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

pub const DATE_TOOLTIP_FORMAT: &str = "ddd, MMM D, YYYY h:mm A";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Parse the date shapes the server emits: RFC 3339, `YYYY-MM-DD HH:MM:SS[.ffffff]`
/// (with or without the `T`) and bare dates. Offsets are dropped, wall time kept.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a date string with a `DD-MM-YYYY HH:mm:ss` style pattern.
/// Unparseable input renders as an empty string.
pub fn format_date(input: &str, pattern: &str) -> String {
    match parse_datetime(input) {
        Some(dt) => format_datetime(&dt, pattern),
        None => String::new(),
    }
}

const TOKENS: [&str; 19] = [
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "DD", "D", "dddd", "ddd", "HH", "H", "hh", "h", "mm",
    "m", "ss", "s", "A",
];

pub fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while !rest.is_empty() {
        // [literal] escapes
        if let Some(inner) = rest.strip_prefix('[') {
            if let Some(end) = inner.find(']') {
                out.push_str(&inner[..end]);
                rest = &inner[end + 1..];
                continue;
            }
        }

        let token = TOKENS.iter().find(|t| rest.starts_with(**t));
        match token {
            Some(token) => {
                out.push_str(&render_token(dt, token));
                rest = &rest[token.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    out
}

fn render_token(dt: &NaiveDateTime, token: &str) -> String {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let month = MONTHS[dt.month0() as usize];
    let weekday = WEEKDAYS[dt.weekday().num_days_from_monday() as usize];

    match token {
        "YYYY" => format!("{:04}", dt.year()),
        "YY" => format!("{:02}", dt.year().rem_euclid(100)),
        "MMMM" => month.to_string(),
        "MMM" => month[..3].to_string(),
        "MM" => format!("{:02}", dt.month()),
        "M" => dt.month().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "D" => dt.day().to_string(),
        "dddd" => weekday.to_string(),
        "ddd" => weekday[..3].to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "H" => dt.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "m" => dt.minute().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "s" => dt.second().to_string(),
        "A" => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
        _ => token.to_string(),
    }
}

const UNITS: [(&str, i64); 7] = [
    ("year", 60 * 60 * 24 * 365),
    ("month", 60 * 60 * 24 * 30),
    ("week", 60 * 60 * 24 * 7),
    ("day", 60 * 60 * 24),
    ("hour", 60 * 60),
    ("minute", 60),
    ("second", 1),
];

/// English relative time ("5 minutes ago", "in 2 hours", "yesterday").
///
/// Anything within five seconds of `now` is "now". Unparseable input renders
/// as an empty string.
pub fn time_ago(input: &str, now: NaiveDateTime) -> String {
    let Some(dt) = parse_datetime(input) else {
        return String::new();
    };

    let diff = (dt - now).num_seconds();
    if diff.abs() < 5 {
        return "now".to_string();
    }

    for (unit, secs) in UNITS {
        if diff.abs() >= secs || unit == "second" {
            let value = (diff as f64 / secs as f64).round() as i64;
            return relative(value, unit);
        }
    }
    String::new()
}

fn relative(value: i64, unit: &str) -> String {
    match (value, unit) {
        (0, "second") => return "now".to_string(),
        (0, u) => return format!("this {u}"),
        (1, "day") => return "tomorrow".to_string(),
        (-1, "day") => return "yesterday".to_string(),
        (1, "week" | "month" | "year") => return format!("next {unit}"),
        (-1, "week" | "month" | "year") => return format!("last {unit}"),
        _ => {}
    }

    let n = value.abs();
    let plural = if n == 1 { "" } else { "s" };
    if value > 0 {
        format!("in {n} {unit}{plural}")
    } else {
        format!("{n} {unit}{plural} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn parses_server_shapes() {
        assert!(parse_datetime("2024-03-05 14:07:09.123456").is_some());
        assert!(parse_datetime("2024-03-05T14:07:09").is_some());
        assert!(parse_datetime("2024-03-05T14:07:09+05:30").is_some());
        assert!(parse_datetime("2024-03-05").is_some());
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn default_patterns() {
        assert_eq!(format_date("2024-03-05 14:07:09", "DD-MM-YYYY HH:mm:ss"), "05-03-2024 14:07:09");
        assert_eq!(format_date("2024-03-05", "DD-MM-YYYY"), "05-03-2024");
    }

    #[test]
    fn tooltip_pattern() {
        assert_eq!(
            format_date("2024-03-05 14:07:09", DATE_TOOLTIP_FORMAT),
            "Tue, Mar 5, 2024 2:07 PM"
        );
    }

    #[test]
    fn bracket_literals() {
        assert_eq!(format_date("2024-03-05 00:30:00", "[Day] D [at] h A"), "Day 5 at 12 AM");
    }

    #[test]
    fn bad_input_is_blank() {
        assert_eq!(format_date("garbage", "DD-MM-YYYY"), "");
        assert_eq!(time_ago("garbage", at("2024-01-01")), "");
    }

    #[test]
    fn relative_past_and_future() {
        let now = at("2024-03-05 12:00:00");
        assert_eq!(time_ago("2024-03-05 11:55:00", now), "5 minutes ago");
        assert_eq!(time_ago("2024-03-05 13:00:00", now), "in 1 hour");
        assert_eq!(time_ago("2024-03-05 11:59:58", now), "now");
        assert_eq!(time_ago("2024-03-04 12:00:00", now), "yesterday");
        assert_eq!(time_ago("2024-03-12 12:00:00", now), "next week");
        assert_eq!(time_ago("2022-03-05 12:00:00", now), "2 years ago");
    }
}
