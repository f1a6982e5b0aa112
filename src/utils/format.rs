use chrono::{DateTime, NaiveDate, Utc};

/// Normalize a guardian phone number to `(XXX) XXX-XXXX`. Inputs that
/// are not a ten-digit US number pass through untouched.
pub fn format_phone(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    let national: &[char] = match digits.len() {
        10 => &digits,
        11 if digits[0] == '1' => &digits[1..],
        _ => return raw.to_string(),
    };
    let part = |range: std::ops::Range<usize>| national[range].iter().collect::<String>();
    format!("({}) {}-{}", part(0..3), part(3..6), part(6..10))
}

/// Truncate to at most `max_len` characters, ellipsized when cut
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let mut out: String = s.chars().take(max_len - 3).collect();
    out.push_str("...");
    out
}

pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Date for detail panels, e.g. `Mar 02, 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Timestamp for message lists, e.g. `Mar 02, 09:15`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%b %d, %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("5559876543"), "(555) 987-6543");
        assert_eq!(format_phone("1-555-987-6543"), "(555) 987-6543");
        assert_eq!(format_phone("(555) 987-6543"), "(555) 987-6543");
        assert_eq!(format_phone("+44 20 7946 0958"), "+44 20 7946 0958");
        assert_eq!(format_phone("ext. 12"), "ext. 12");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("circle time", 20), "circle time");
        assert_eq!(truncate_string("built a tower of twelve blocks", 12), "built a t...");
        assert_eq!(truncate_string("nap", 3), "nap");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(format_date(date), "Mar 02, 2026");
    }
}
