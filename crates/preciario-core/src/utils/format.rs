/// Currency symbol used for every displayed price.
const CURRENCY_SYMBOL: char = '$';

/// Format a sheet price for display.
/// Strips one redundant leading symbol and prefixes exactly one; an empty
/// cell shows as `$0`.
pub fn format_price(raw: &str) -> String {
    let trimmed = raw.trim();
    let amount = trimmed
        .strip_prefix(CURRENCY_SYMBOL)
        .map(str::trim_start)
        .unwrap_or(trimmed);

    if amount.is_empty() {
        format!("{}0", CURRENCY_SYMBOL)
    } else {
        format!("{}{}", CURRENCY_SYMBOL, amount)
    }
}

/// Human-readable age for a snapshot, e.g. "5m ago" or "2d ago".
pub fn format_age(minutes: i64) -> String {
    if minutes < 1 {
        // Negative ages come from clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price("120"), "$120");
        assert_eq!(format_price("$120"), "$120");
        assert_eq!(format_price(" $ 1.250,50 "), "$1.250,50");
        assert_eq!(format_price(""), "$0");
        assert_eq!(format_price("$"), "$0");
        // Only one symbol is treated as redundant
        assert_eq!(format_price("$$5"), "$$5");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-3), "just now");
        assert_eq!(format_age(0), "just now");
        assert_eq!(format_age(45), "45m ago");
        assert_eq!(format_age(89), "1h ago");
        assert_eq!(format_age(90), "2h ago");
        assert_eq!(format_age(1440), "1d ago");
        assert_eq!(format_age(1440 + 12 * 60), "2d ago");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Lápiz negro", 6), "Láp...");
    }
}
