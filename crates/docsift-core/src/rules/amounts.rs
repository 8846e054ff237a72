//! Amount normalization.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::SIGNED_DECIMAL;

const CURRENCY_MARKERS: &[&str] = &["€", "$", "£", "Rs", "EUR", "USD", "MAD", "DH", "Dhs"];

/// Parse the first signed decimal in `value`, ignoring currency markers and
/// thousands separators.
///
/// Both `1,234.56` and `1.234,56` read as 1234.56; a lone comma followed by
/// one or two digits is a decimal comma (`45,00`). Returns `None` when no
/// number can be read.
pub fn to_amount(value: &str) -> Option<Decimal> {
    let mut cleaned = value.to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    let compact: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = normalize_separators(&compact);

    SIGNED_DECIMAL
        .find(&normalized)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
}

fn normalize_separators(s: &str) -> String {
    match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(comma), None) => {
            let decimals = s[comma + 1..]
                .chars()
                .take_while(char::is_ascii_digit)
                .count();
            if s.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        _ => s.to_string(),
    }
}
