/// Compact duration for SLA timers: `1d 2h 3m 4s`, leading zero units dropped.
pub fn format_time(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let remaining = seconds % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 || days > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{remaining}s"));
    out
}

/// Call durations: hours are folded in, days are not.
pub fn seconds_to_duration(seconds: u64) -> String {
    let h = seconds / 3_600;
    let m = (seconds % 3_600) / 60;
    let s = seconds % 60;

    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}

pub fn convert_size(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes;
    let mut index = 0;
    while size > 1024.0 && index < UNITS.len() - 1 {
        size /= 1024.0;
        index += 1;
    }
    format!("{size:.2} {}", UNITS[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_drops_leading_zero_units() {
        assert_eq!(format_time(5), "5s");
        assert_eq!(format_time(65), "1m 5s");
        assert_eq!(format_time(3_600), "1h 0m 0s");
        assert_eq!(format_time(90_061), "1d 1h 1m 1s");
    }

    #[test]
    fn call_durations() {
        assert_eq!(seconds_to_duration(42), "42s");
        assert_eq!(seconds_to_duration(125), "2m 5s");
        assert_eq!(seconds_to_duration(3_725), "1h 2m 5s");
    }

    #[test]
    fn sizes() {
        assert_eq!(convert_size(512.0), "512.00 B");
        assert_eq!(convert_size(1024.0), "1024.00 B");
        assert_eq!(convert_size(1536.0), "1.50 KB");
        assert_eq!(convert_size(5.0 * 1024.0 * 1024.0), "5.00 MB");
    }
}
