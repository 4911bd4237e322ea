// src/normalize.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Everything that is not a digit or a minus sign. Dashboard totals come as
/// grouped strings like "1,23,456" and labels sometimes carry stray text.
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d\-]").expect("valid regex"));

const MONTH_ABBREVS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Parse a raw cell or label into an integer. Thousands separators and any
/// other non-digit characters are stripped first. Anything that still does
/// not parse degrades to `None`; this never fails.
pub fn to_integer(raw: Option<&str>) -> Option<i64> {
    let cleaned = NON_NUMERIC.replace_all(raw?.trim(), "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok()
}

/// Month number (1-12) from a UI label, matched on the uppercased
/// three-letter prefix.
pub fn month_number(label: &str) -> Option<u32> {
    let key = label
        .trim()
        .chars()
        .take(3)
        .collect::<String>()
        .to_uppercase();
    MONTH_ABBREVS
        .iter()
        .position(|&abbrev| abbrev == key)
        .map(|idx| idx as u32 + 1)
}

/// Canonical `YYYY-MM-01` date for a year and month label, or `None` when
/// the label is not a recognizable month.
pub fn month_to_date(year: i32, label: &str) -> Option<String> {
    let month = month_number(label)?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(to_integer(Some("1,23,456")), Some(123_456));
        assert_eq!(to_integer(Some("1,234")), Some(1234));
    }

    #[test]
    fn keeps_leading_minus() {
        assert_eq!(to_integer(Some("-1,234")), Some(-1234));
    }

    #[test]
    fn stray_text_is_dropped() {
        assert_eq!(to_integer(Some(" 12,345 units ")), Some(12_345));
    }

    #[test]
    fn unparseable_input_degrades_to_none() {
        assert_eq!(to_integer(Some("")), None);
        assert_eq!(to_integer(Some("   ")), None);
        assert_eq!(to_integer(Some("TOTAL")), None);
        assert_eq!(to_integer(Some("-")), None);
        assert_eq!(to_integer(Some("12-34")), None);
    }

    #[test]
    fn absent_input_stays_absent() {
        assert_eq!(to_integer(None), None);
    }

    #[test]
    fn month_lookup_is_case_insensitive() {
        assert_eq!(month_to_date(2023, "January"), Some("2023-01-01".to_string()));
        assert_eq!(month_to_date(2023, "january"), Some("2023-01-01".to_string()));
        assert_eq!(month_to_date(2023, "JAN"), Some("2023-01-01".to_string()));
    }

    #[test]
    fn unknown_month_is_absent() {
        assert_eq!(month_to_date(2023, "Foo"), None);
        assert_eq!(month_number(""), None);
        assert_eq!(month_number("JA"), None);
    }

    #[test]
    fn all_twelve_months_resolve() {
        for (idx, abbrev) in MONTH_ABBREVS.iter().enumerate() {
            assert_eq!(month_number(abbrev), Some(idx as u32 + 1));
        }
        assert_eq!(month_to_date(2024, "DEC"), Some("2024-12-01".to_string()));
    }
}
