//! Formatting helpers for CLI output.

use chrono::{DateTime, Utc};
use comfy_table::{ColumnConstraint, ContentArrangement, Table, Width};

/// Create a borderless table that never wraps cell content.
pub fn new_table(headers: Option<&[&str]>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Disabled);
    table.load_preset(comfy_table::presets::NOTHING);
    if let Some(headers) = headers {
        table.set_header(headers);
    }
    table
}

/// Give existing columns minimum widths so that tables printed one after
/// another line up.
pub fn set_min_widths(table: &mut Table, widths: &[u16]) {
    for (column, width) in table.column_iter_mut().zip(widths) {
        column.set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(*width)));
    }
}

/// Cut `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Human-readable size using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Relative time such as "3 days ago", measured from `now`.
pub fn format_ago_from(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(*dt).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }

    let (count, unit) = match secs {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

/// Relative time measured from the current clock.
pub fn format_ago(dt: &DateTime<Utc>) -> String {
    format_ago_from(dt, Utc::now())
}

/// Digest shortened to its algorithm and first 12 hex characters.
pub fn short_digest(digest: &str) -> String {
    match digest.split_once(':') {
        Some((algorithm, hex)) => {
            let end = hex.char_indices().nth(12).map_or(hex.len(), |(i, _)| i);
            format!("{}:{}", algorithm, &hex[..end])
        }
        None => digest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(100 * 1024 * 1024), "100.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_bytes(2048 * 1024 * 1024 * 1024), "2.0 TB");
    }

    #[test]
    fn test_format_ago() {
        let now = Utc::now();
        assert_eq!(format_ago_from(&now, now), "0 seconds ago");
        assert_eq!(format_ago_from(&(now - Duration::seconds(1)), now), "1 second ago");
        assert_eq!(format_ago_from(&(now - Duration::minutes(5)), now), "5 minutes ago");
        assert_eq!(format_ago_from(&(now - Duration::hours(1)), now), "1 hour ago");
        assert_eq!(format_ago_from(&(now - Duration::days(29)), now), "29 days ago");
        assert_eq!(format_ago_from(&(now - Duration::days(60)), now), "2 months ago");
        assert_eq!(format_ago_from(&(now - Duration::days(730)), now), "2 years ago");
    }

    #[test]
    fn test_format_ago_future() {
        let now = Utc::now();
        assert_eq!(format_ago_from(&(now + Duration::hours(1)), now), "just now");
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(
            short_digest("sha256:0123456789abcdef0123456789abcdef"),
            "sha256:0123456789ab"
        );
        assert_eq!(short_digest("sha256:abc"), "sha256:abc");
        assert_eq!(short_digest("opaque"), "opaque");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("team/app", 20), "team/app");
        assert_eq!(truncate("abcdef", 6), "abcdef");
        assert_eq!(truncate("abcdefg", 6), "abcde…");
        assert_eq!(truncate("abc", 0), "…");
    }

    #[test]
    fn test_new_table_header_only() {
        let mut table = new_table(Some(&["REPOSITORY", "TAG"][..]));
        set_min_widths(&mut table, &[20, 10]);
        let output = table.to_string();
        assert!(output.contains("REPOSITORY"));
        assert!(output.contains("TAG"));
    }

    #[test]
    fn test_new_table_rows_without_header() {
        let mut table = new_table(None);
        table.add_row(["team/app", "v1"]);
        set_min_widths(&mut table, &[20, 10]);
        let output = table.to_string();
        assert!(output.contains("team/app"));
        assert!(!output.contains("REPOSITORY"));
    }
}
