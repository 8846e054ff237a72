//! Till/payment receipt parser.

use lazy_static::lazy_static;

use super::DocumentParser;
use crate::models::config::DocsiftConfig;
use crate::models::{DocumentType, HeaderRecord, RowRecord};
use crate::ocr::RecognizedWord;
use crate::rules::{FieldRule, FieldTable, AMOUNT, DATE, LABEL_SEP};
use crate::table::{TableExtractor, TableSpec};

lazy_static! {
    static ref RECEIPT_FIELDS: FieldTable = FieldTable::new(
        DocumentType::Receipt,
        vec![
            FieldRule::new(
                "receipt_number",
                r"\b(?:receipt|ticket|invoice)\s*(?:no\.?|n°|number)?\s*#?\s*[:\-]?\s*([a-z0-9\-/]*\d[a-z0-9\-/]*)",
                1,
            ),
            FieldRule::new("date", &format!(r"\bdate{LABEL_SEP}{DATE}"), 1)
                .or(DATE, 1)
                .iso_date(),
            FieldRule::new(
                "time",
                r"\b(?:time|heure)\s*[:\-]?\s*(\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]m)?)",
                1,
            )
            .or(r"\b(\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]m)?)\b", 1),
            FieldRule::lines(
                "shop_name",
                r"^[ \t]*([^\n]*?\b(?:store|mart|shop|restaurant|bakery|pharmacy|pharmacie|caf[ée]|market|boulangerie)\b[^\n]*?)[ \t]*$",
                1,
            ),
            FieldRule::lines(
                "address",
                r"^[ \t]*(?:address|adresse)[ \t]*[:\-]?[ \t]*(.+?)[ \t]*$",
                1,
            ),
            FieldRule::new(
                "total_amount_paid",
                &format!(r"\b(?:total\s*paid|amount\s*paid|total\s*amount\s*paid|grand\s*total){LABEL_SEP}{AMOUNT}"),
                1,
            )
            .or(&format!(r"\btotal(?:\s*amount)?{LABEL_SEP}{AMOUNT}"), 1)
            .amount(),
            FieldRule::new(
                "payment_method",
                &format!(
                    r"\b(?:payment\s*method|paid\s*by|mode\s*de\s*(?:paiement|r[èe]glement)|pay[ée]\s*par){LABEL_SEP}(credit\s*card|debit\s*card|cash|card|credit|debit|esp[èe]ces|carte(?:\s*bancaire)?|ch[èe]que|visa|mastercard)"
                ),
                1,
            )
            .lowercase(),
        ],
    );
}

/// Receipt parser.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    table: TableExtractor,
}

impl ReceiptParser {
    pub fn new() -> Self {
        Self::from_config(&DocsiftConfig::default())
    }

    pub fn from_config(config: &DocsiftConfig) -> Self {
        Self {
            table: TableExtractor::new(TableSpec::receipt().with_config(&config.table)),
        }
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for ReceiptParser {
    fn document_type(&self) -> DocumentType {
        DocumentType::Receipt
    }

    fn parse_fields(&self, text: &str) -> HeaderRecord {
        RECEIPT_FIELDS.extract_header(text)
    }

    fn parse_transactions(&self, text: &str, _words: Option<&[RecognizedWord]>) -> Vec<RowRecord> {
        self.table.extract_from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_minimal_receipt() {
        let fields =
            ReceiptParser::new().parse_fields("RECEIPT #123\nPayment Method: Cash\nTotal Paid: 45.00");

        assert_eq!(fields.text("receipt_number"), Some("123"));
        assert_eq!(fields.text("payment_method"), Some("cash"));
        assert_eq!(
            fields.get("total_amount_paid"),
            Some(&FieldValue::Number(Decimal::new(4500, 2)))
        );
        assert!(fields.get("shop_name").unwrap().is_missing());
    }

    #[test]
    fn test_full_receipt() {
        let text = "GREEN LEAF BAKERY
Address: 4 Baker Street, London
Date: 07/06/2024  Time: 08:42
Receipt No: R-5531

Item  Qty  Price  Total
Croissant  2  1.20  2.40
Flat white  1  3.10  3.10
Subtotal  5.50
Total  5.50
Paid by Credit Card";

        let parsed = ReceiptParser::new().parse(text, None);
        let fields = &parsed.fields;

        assert_eq!(fields.text("shop_name"), Some("GREEN LEAF BAKERY"));
        assert_eq!(fields.text("address"), Some("4 Baker Street, London"));
        assert_eq!(fields.text("date"), Some("2024-06-07"));
        assert_eq!(fields.text("time"), Some("08:42"));
        assert_eq!(fields.text("receipt_number"), Some("R-5531"));
        assert_eq!(
            fields.get("total_amount_paid"),
            Some(&FieldValue::Number(Decimal::new(550, 2)))
        );
        assert_eq!(fields.text("payment_method"), Some("credit card"));

        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.transactions[1].text("label"), Some("Flat white"));
        assert_eq!(parsed.transactions[1].text("total_ht"), Some("3.10"));
    }

    #[test]
    fn test_total_without_amount_is_missing() {
        let fields = ReceiptParser::new().parse_fields("Receipt 9\nTotal: --");
        assert!(fields.get("total_amount_paid").unwrap().is_missing());
    }
}
