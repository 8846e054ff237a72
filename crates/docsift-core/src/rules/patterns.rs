//! Common regex fragments and patterns shared by parsers and the table extractor.

use lazy_static::lazy_static;
use regex::Regex;

/// Captures a date token such as `31/01/2024`, `31-01-24`, `31.01.2024`
/// or `2024-01-31`.
pub const DATE: &str = r"\b(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}|\d{4}-\d{1,2}-\d{1,2})\b";

/// Captures an unsigned amount: `1 234,56`, `1,234.56`, `1200.00`, `45`.
pub const AMOUNT: &str =
    r"(\d{1,3}(?:[ ,.\u{00a0}]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)";

/// Captures an amount with an optional leading minus.
pub const SIGNED_AMOUNT: &str =
    r"(-?\s?(?:\d{1,3}(?:[ ,.\u{00a0}]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?))";

/// Optional `:` or `-` between a label and its value.
pub const LABEL_SEP: &str = r"\s*[:\-]?\s*";

lazy_static! {
    /// Line opening with a date (bank statement rows).
    pub static ref LEADING_DATE: Regex = Regex::new(
        r"^\s*\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}\b"
    ).unwrap();

    /// Quantity followed by two price-like numbers (invoice/receipt rows).
    pub static ref ITEM_ROW_SHAPE: Regex = Regex::new(
        r"\d{1,3}(?:[.,]\d{1,2})?\s+[\d.,]+\s+[\d.,]+"
    ).unwrap();

    /// Whole item line: a label cell, then quantity, price and a decimal total.
    pub static ref ITEM_ROW_LINE: Regex = Regex::new(
        r"^\s*\S.*?\s{2,}\d{1,3}(?:[.,]\d{1,2})?\s+[\d.,]+\s+\d[\d.,]*[.,]\d{2}\s*$"
    ).unwrap();

    /// Column delimiter: two or more whitespace characters, or a pipe.
    pub static ref COLUMN_DELIMITER: Regex = Regex::new(
        r"\s{2,}|\|"
    ).unwrap();

    /// Single-spaced bank row: date, description, amount.
    pub static ref BANK_ROW: Regex = Regex::new(
        r"^\s*(?P<date>\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})\s+(?P<description>.+?)\s+(?P<amount>-?\s?\d[\d,.]*[.,]\d{2})\b"
    ).unwrap();

    /// First signed decimal literal.
    pub static ref SIGNED_DECIMAL: Regex = Regex::new(
        r"-?\d+(?:\.\d+)?"
    ).unwrap();
}
