//! Bank statement (relevé bancaire) parser.

use lazy_static::lazy_static;

use super::DocumentParser;
use crate::models::config::DocsiftConfig;
use crate::models::{DocumentType, HeaderRecord, RowRecord};
use crate::ocr::RecognizedWord;
use crate::rules::{FieldRule, FieldTable, DATE, LABEL_SEP, SIGNED_AMOUNT};
use crate::table::{TableExtractor, TableSpec};

lazy_static! {
    static ref BANK_STATEMENT_FIELDS: FieldTable = FieldTable::new(
        DocumentType::BankStatement,
        vec![
            FieldRule::new(
                "statement_date",
                &format!(
                    r"\b(?:statement\s*date|date\s*(?:du\s*)?relev[ée]|date\s*d'[ée]dition){LABEL_SEP}{DATE}"
                ),
                1,
            )
            .iso_date(),
            FieldRule::lines(
                "period_covered",
                r"^[ \t]*(?:period\s*covered|statement\s*period|date\s*range|p[ée]riode)[ \t]*[:\-]?[ \t]*(.+?)[ \t]*$",
                1,
            ),
            FieldRule::new(
                "opening_balance",
                &format!(
                    r"\b(?:opening\s*balance|solde\s*(?:initial|d[ée]but|pr[ée]c[ée]dent|ancien)){LABEL_SEP}{SIGNED_AMOUNT}"
                ),
                1,
            )
            .amount(),
            FieldRule::new(
                "closing_balance",
                &format!(r"\b(?:closing\s*balance|solde\s*(?:final|fin|nouveau)){LABEL_SEP}{SIGNED_AMOUNT}"),
                1,
            )
            .amount(),
            FieldRule::new("currency", r"\b(?:currency|devise)\s*[:\-]?\s*([a-z]{3})\b", 1).uppercase(),
            FieldRule::lines(
                "account_number",
                r"^[ \t]*(?:account\s*(?:number|no\.?)|iban|rib|n°\s*de\s*compte|num[ée]ro\s*de\s*compte)[ \t]*[:\-]?[ \t]*([a-z0-9][a-z0-9\- ]{4,}?)[ \t]*$",
                1,
            )
            .or(r"\b([a-z]{2}\d{2}(?: ?[a-z0-9]{4}){3,7}(?: ?[a-z0-9]{1,4})?)\b", 1),
            FieldRule::lines(
                "account_holder",
                r"^[ \t]*(?:account\s*holder|client\s*name|titulaire(?:\s*du\s*compte)?|nom\s*du\s*client)[ \t]*[:\-]?[ \t]*(.+?)[ \t]*$",
                1,
            ),
        ],
    );
}

/// Bank statement parser.
#[derive(Debug, Clone)]
pub struct BankStatementParser {
    table: TableExtractor,
}

impl BankStatementParser {
    pub fn new() -> Self {
        Self::from_config(&DocsiftConfig::default())
    }

    pub fn from_config(config: &DocsiftConfig) -> Self {
        Self {
            table: TableExtractor::new(TableSpec::bank_statement().with_config(&config.table)),
        }
    }
}

impl Default for BankStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for BankStatementParser {
    fn document_type(&self) -> DocumentType {
        DocumentType::BankStatement
    }

    fn parse_fields(&self, text: &str) -> HeaderRecord {
        BANK_STATEMENT_FIELDS.extract_header(text)
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

    const STATEMENT: &str = "NORTHERN BANK - Bank Statement
Account Holder: Jane Doe
Account Number: FR76 3000 6000 0112 3456 7890 189
Statement Date: 31/01/2024
Period Covered: 01/01/2024 - 31/01/2024
Currency: eur
Opening Balance: 1,200.00

Date  Description  Amount  Balance
02/01/2024  Salary January  2,500.00  3,700.00
05/01/2024  Card payment  -54.20  3,645.80
  Supermarket Lyon
08/01/2024 Transfer to savings -500.00
Closing Balance: 3,145.80";

    #[test]
    fn test_statement_fields() {
        let fields = BankStatementParser::new().parse_fields(STATEMENT);

        assert_eq!(fields.text("account_holder"), Some("Jane Doe"));
        assert_eq!(
            fields.text("account_number"),
            Some("FR76 3000 6000 0112 3456 7890 189")
        );
        assert_eq!(fields.text("statement_date"), Some("2024-01-31"));
        assert_eq!(fields.text("period_covered"), Some("01/01/2024 - 31/01/2024"));
        assert_eq!(fields.text("currency"), Some("EUR"));
        assert_eq!(
            fields.get("opening_balance"),
            Some(&FieldValue::Number(Decimal::new(120000, 2)))
        );
        assert_eq!(
            fields.get("closing_balance"),
            Some(&FieldValue::Number(Decimal::new(314580, 2)))
        );
    }

    #[test]
    fn test_negative_balance() {
        let fields = BankStatementParser::new().parse_fields("Solde final : -12,50");
        assert_eq!(
            fields.get("closing_balance"),
            Some(&FieldValue::Number(Decimal::new(-1250, 2)))
        );
    }

    #[test]
    fn test_statement_transactions() {
        let rows = BankStatementParser::new().parse_transactions(STATEMENT, None);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].text("type"), Some("credit"));
        assert_eq!(rows[1].text("description"), Some("Card payment"));
        assert_eq!(rows[1].text("amount"), Some("-54.20"));
        assert_eq!(rows[1].text("type"), Some("debit"));
        assert_eq!(rows[2].text("description"), Some("Transfer to savings"));
        assert_eq!(rows[2].text("amount"), Some("-500.00"));
    }
}
