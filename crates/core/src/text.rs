//! Text helpers for displaying messages

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Truncate to `max_len` characters, appending `...` when cut
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_len).collect();
    out.push_str("...");
    out
}

/// Decode HTML entities (`&amp;`, `&#39;`, ...) the server may have escaped
pub fn decode_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Timestamp as shown under a message in local time, e.g. `15 Jan 2024 10:30`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    format_timestamp_in(ts, &Local)
}

/// [`format_timestamp`] in an explicit zone
pub fn format_timestamp_in<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format("%-d %b %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 5), "Hello...");
        assert_eq!(truncate("", 10), "");
        assert_eq!(truncate("Hello", 5), "Hello");
    }

    #[test]
    fn test_decode_html() {
        assert_eq!(decode_html("&#39;"), "'");
        assert_eq!(decode_html("&amp;"), "&");
        assert_eq!(decode_html("&quot;"), "\"");
        assert_eq!(decode_html("&lt;"), "<");
        assert_eq!(decode_html("&gt;"), ">");
        assert_eq!(decode_html("It&#39;s &amp; cool"), "It's & cool");
        assert_eq!(decode_html("Hello World"), "Hello World");
        assert_eq!(decode_html(""), "");
    }

    #[test]
    fn test_format_timestamp_in_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 0).unwrap();
        assert_eq!(format_timestamp_in(&ts, &Utc), "5 Jan 2024 09:07");

        // UTC-5 (New York in winter)
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp_in(&ts, &new_york), "15 Jan 2024 05:30");

        // Crossing midnight moves the date too
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        assert_eq!(format_timestamp_in(&ts, &tokyo), "16 Jan 2024 05:00");
    }

    #[test]
    fn test_format_timestamp_uses_local_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), format_timestamp_in(&ts, &Local));
    }
}
