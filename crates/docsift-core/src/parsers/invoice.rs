//! Invoice (facture) parser.
//!
//! Line items are read from layout lines when word boxes are available and
//! from the plain OCR lines otherwise.

use lazy_static::lazy_static;
use tracing::debug;

use super::DocumentParser;
use crate::models::config::DocsiftConfig;
use crate::models::{DocumentType, HeaderRecord, RowRecord};
use crate::ocr::{LayoutReconstructor, RecognizedWord};
use crate::rules::{FieldRule, FieldTable, AMOUNT, DATE, LABEL_SEP};
use crate::table::{TableExtractor, TableSpec};

lazy_static! {
    static ref INVOICE_FIELDS: FieldTable = FieldTable::new(
        DocumentType::Invoice,
        vec![
            FieldRule::new(
                "invoice_number",
                r"\b(?:facture|invoice)\s*(?:n°|no\.?|num[ée]ro|number|#)?\s*[:\-]?\s*([a-z0-9/\-]*\d[a-z0-9/\-]*)",
                1,
            ),
            FieldRule::new(
                "invoice_date",
                &format!(
                    r"\b(?:date\s*(?:de\s*)?facture|date\s*of\s*invoice|invoice\s*date|casablanca\s*,?\s*le){LABEL_SEP}{DATE}"
                ),
                1,
            )
            .or(&format!(r"\bdate{LABEL_SEP}{DATE}"), 1)
            .or(DATE, 1)
            .iso_date(),
            FieldRule::new(
                "delivery_date",
                &format!(r"\b(?:livraison\s*le|date\s*de\s*livraison|delivery\s*date){LABEL_SEP}{DATE}"),
                1,
            )
            .iso_date(),
            FieldRule::new(
                "due_date",
                &format!(r"(?:date\s*d'\s*)?\b(?:[ée]ch[ée]ance|due\s*date){LABEL_SEP}{DATE}"),
                1,
            )
            .iso_date(),
            FieldRule::lines(
                "client_name",
                r"^[ \t]*(?:nom\s*(?:du\s*)?client|client(?:\s*name)?|bill\s*to|factur[ée]\s*[àa])[ \t]*[:\-][ \t]*(.+?)[ \t]*$",
                1,
            )
            .or(r"\bclient\s*[:\-]?\s*((?-i:[A-Z][A-Z0-9&'.\-]*(?: [A-Z0-9&'.\-]+)*))", 1),
            FieldRule::lines(
                "client_address",
                r"^[ \t]*(?:adresse\s*(?:du\s*)?client|client\s*address|billing\s*address)[ \t]*[:\-][ \t]*(.+?)[ \t]*$",
                1,
            ),
            FieldRule::new(
                "client_ice_or_if",
                r"\b(?:ice|if)\s*(?:du\s*)?client\s*[:\-]?\s*(\d+)",
                1,
            )
            .or(r"\b(?:ice|if)\b\s*[:\-]?\s*(\d+)", 1),
            FieldRule::lines(
                "provider_name",
                r"^[ \t]*(?:fournisseur|provider|issuer|seller|vendeur|from)[ \t]*[:\-][ \t]*(.+?)[ \t]*$",
                1,
            )
            .or(r"\b(?:fourni\w*|issuer|from)\s*[:\-]?\s*((?-i:[A-Z][a-zA-Z&]*(?: [A-Z][a-zA-Z&]*)*))", 1),
            FieldRule::lines(
                "provider_address",
                r"^[ \t]*(?:adresse\s*(?:du\s*)?fournisseur|provider\s*address|seller\s*address)[ \t]*[:\-][ \t]*(.+?)[ \t]*$",
                1,
            ),
            FieldRule::new(
                "provider_ice_or_if",
                r"\b(?:ice|if)\s*(?:du\s*)?(?:fournisseur|provider)\s*[:\-]?\s*(\d+)",
                1,
            )
            .or(r"\b(?:ice|if)\b\s*[:\-]?\s*(\d+)", 1),
            FieldRule::new(
                "sub_total_ht",
                &format!(r"\b(?:sous[\s\-]*total\s*ht|sub[\s\-]*total|total\s*ht){LABEL_SEP}{AMOUNT}"),
                1,
            )
            .amount(),
            FieldRule::new(
                "vat_amount",
                &format!(r"\b(?:montant\s*(?:de\s*la\s*)?tva|total\s*tva|vat\s*amount){LABEL_SEP}{AMOUNT}"),
                1,
            )
            .amount(),
            FieldRule::new(
                "vat_percent",
                r"\b(?:tva|vat)\s*[:\-]?\s*(\d{1,2}(?:[.,]\d+)?)\s*%",
                1,
            ),
            FieldRule::new(
                "total_ttc",
                &format!(
                    r"\b(?:total\s*ttc|net\s*[àa]\s*payer|total\s*amount(?:\s*incl\.?\s*tax)?|grand\s*total){LABEL_SEP}{AMOUNT}"
                ),
                1,
            )
            .amount(),
            FieldRule::new("discount", &format!(r"\b(?:remise|discount){LABEL_SEP}{AMOUNT}"), 1).amount(),
            FieldRule::new(
                "delivery_fee",
                &format!(r"\b(?:frais\s*de\s*livraison|delivery\s*fee){LABEL_SEP}{AMOUNT}"),
                1,
            )
            .amount(),
            FieldRule::new(
                "other_charges",
                &format!(r"\b(?:frais\s*divers|other\s*charges){LABEL_SEP}{AMOUNT}"),
                1,
            )
            .amount(),
        ],
    );
}

/// Invoice parser.
#[derive(Debug, Clone)]
pub struct InvoiceParser {
    table: TableExtractor,
    layout: LayoutReconstructor,
}

impl InvoiceParser {
    pub fn new() -> Self {
        Self::from_config(&DocsiftConfig::default())
    }

    pub fn from_config(config: &DocsiftConfig) -> Self {
        Self {
            table: TableExtractor::new(TableSpec::invoice().with_config(&config.table)),
            layout: LayoutReconstructor::from_config(&config.layout),
        }
    }
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for InvoiceParser {
    fn document_type(&self) -> DocumentType {
        DocumentType::Invoice
    }

    fn parse_fields(&self, text: &str) -> HeaderRecord {
        INVOICE_FIELDS.extract_header(text)
    }

    fn parse_transactions(&self, text: &str, words: Option<&[RecognizedWord]>) -> Vec<RowRecord> {
        if let Some(words) = words.filter(|w| !w.is_empty()) {
            let lines = self.layout.reconstruct(words);
            let rows = self.table.extract(&lines);
            if !rows.is_empty() {
                return rows;
            }
            debug!("layout lines yielded no invoice rows, using plain lines");
        }

        self.table.extract_from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const FACTURE: &str = "SARL ATLAS FOURNITURES
Fournisseur : Atlas Fournitures SARL
ICE fournisseur : 001234567000089
FACTURE N° 2024-017
Casablanca le 15/03/2024
Livraison le 18/03/2024
Échéance : 15/04/2024
Client : Café Central
Adresse client : 12 rue des Fleurs, Rabat
ICE client : 002998877000011

Désignation  Qté  PU  Montant
Chaise bureau  2  150.00  300.00
Table réunion  1  420.00  420.00

Sous-total HT : 720,00
TVA 20 %
Montant TVA : 144,00
Total TTC : 864,00
Frais de livraison : 30,00";

    fn number(cents: i64) -> FieldValue {
        FieldValue::Number(Decimal::new(cents, 2))
    }

    #[test]
    fn test_invoice_fields() {
        let fields = InvoiceParser::new().parse_fields(FACTURE);

        assert_eq!(fields.text("invoice_number"), Some("2024-017"));
        assert_eq!(fields.text("invoice_date"), Some("2024-03-15"));
        assert_eq!(fields.text("delivery_date"), Some("2024-03-18"));
        assert_eq!(fields.text("due_date"), Some("2024-04-15"));
        assert_eq!(fields.text("client_name"), Some("Café Central"));
        assert_eq!(fields.text("client_address"), Some("12 rue des Fleurs, Rabat"));
        assert_eq!(fields.text("client_ice_or_if"), Some("002998877000011"));
        assert_eq!(fields.text("provider_name"), Some("Atlas Fournitures SARL"));
        assert_eq!(fields.text("provider_ice_or_if"), Some("001234567000089"));
        assert_eq!(fields.get("sub_total_ht"), Some(&number(72000)));
        assert_eq!(fields.get("vat_amount"), Some(&number(14400)));
        assert_eq!(fields.text("vat_percent"), Some("20"));
        assert_eq!(fields.get("total_ttc"), Some(&number(86400)));
        assert_eq!(fields.get("delivery_fee"), Some(&number(3000)));
        assert!(fields.get("discount").unwrap().is_missing());
        assert!(fields.get("other_charges").unwrap().is_missing());
    }

    #[test]
    fn test_invoice_date_falls_back_to_first_date() {
        let fields = InvoiceParser::new().parse_fields("Invoice INV-9\nIssued 02.01.2024");
        assert_eq!(fields.text("invoice_number"), Some("INV-9"));
        assert_eq!(fields.text("invoice_date"), Some("2024-01-02"));
    }

    #[test]
    fn test_plain_line_transactions() {
        let rows = InvoiceParser::new().parse_transactions(FACTURE, None);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("label"), Some("Chaise bureau"));
        assert_eq!(rows[1].text("item_total_ht"), Some("420.00"));
        assert_eq!(rows[1].text("tax_percentage"), Some("N/A"));
    }

    #[test]
    fn test_layout_transactions() {
        let words = vec![
            RecognizedWord::new("Désignation", 10, 100),
            RecognizedWord::new("Qté", 200, 101),
            RecognizedWord::new("PU", 260, 99),
            RecognizedWord::new("Montant", 330, 100),
            RecognizedWord::new("Lampe", 10, 130),
            RecognizedWord::new("3", 200, 131),
            RecognizedWord::new("25.00", 260, 129),
            RecognizedWord::new("75.00", 330, 130),
        ];

        let rows = InvoiceParser::new().parse_transactions("", Some(&words));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("label"), Some("Lampe"));
        assert_eq!(rows[0].text("quantity"), Some("3"));
        assert_eq!(rows[0].text("item_total_ht"), Some("75.00"));
    }

    #[test]
    fn test_layout_without_rows_falls_back_to_text() {
        let words = vec![RecognizedWord::new("Logo", 10, 10)];
        let rows = InvoiceParser::new().parse_transactions(FACTURE, Some(&words));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_empty_text() {
        let parsed = InvoiceParser::new().parse("", None);
        assert_eq!(parsed.fields.len(), DocumentType::Invoice.header_fields().len());
        assert_eq!(parsed.fields.resolved_count(), 0);
        assert!(parsed.transactions.is_empty());
    }
}
