//! Date normalization.

use chrono::NaiveDate;

/// Accepted input formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// Re-serialize a date as `YYYY-MM-DD`, or return `fallback`.
///
/// Only four-digit years are accepted; `31/01/24` is left to the fallback.
pub fn to_iso_date(value: &str, fallback: &str) -> String {
    let value = value.trim();

    let has_full_year = value
        .split(|c: char| !c.is_ascii_digit())
        .any(|group| group.len() == 4);
    if !has_full_year {
        return fallback.to_string();
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_iso_date() {
        assert_eq!(to_iso_date("31/01/2024", "N/A"), "2024-01-31");
        assert_eq!(to_iso_date("31-01-2024", "N/A"), "2024-01-31");
        assert_eq!(to_iso_date("2024-01-31", "N/A"), "2024-01-31");
        assert_eq!(to_iso_date(" 5.2.2024 ", "N/A"), "2024-02-05");
    }

    #[test]
    fn test_to_iso_date_fallback() {
        assert_eq!(to_iso_date("not a date", "N/A"), "N/A");
        assert_eq!(to_iso_date("31/02/2024", "N/A"), "N/A");
        assert_eq!(to_iso_date("31/01/24", "31/01/24"), "31/01/24");
    }
}
