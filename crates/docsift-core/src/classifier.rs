//! Document type classification from OCR text.
//!
//! Three tiers, first decisive one wins:
//! 1. strong indicators: a primary term plus one corroborating term;
//! 2. keyword scoring: the type with strictly the most keywords present,
//!    equal scores resolved by [`DocumentType::SCORING_PRIORITY`];
//! 3. nothing matched: [`DocumentType::Unknown`].
//!
//! Matching runs on lowercased text. Primary terms and scoring keywords are
//! plain substrings; corroborating terms must stand as whole words, since
//! short ones like "ice" would otherwise fire inside "service".

use serde::Serialize;
use tracing::debug;

use crate::models::DocumentType;
use crate::rules::contains_keyword;

/// A primary term and the terms that corroborate it.
struct StrongIndicator {
    document_type: DocumentType,
    primary: &'static [&'static str],
    corroborating: &'static [&'static str],
}

/// Evaluated in order: receipt, invoice, bank statement.
const STRONG_INDICATORS: &[StrongIndicator] = &[
    StrongIndicator {
        document_type: DocumentType::Receipt,
        primary: &["receipt"],
        corroborating: &["payment method", "transaction id", "provider info", "date of receipt"],
    },
    StrongIndicator {
        document_type: DocumentType::Invoice,
        primary: &["invoice"],
        corroborating: &["invoice no", "facture", "client info", "date of invoice"],
    },
    StrongIndicator {
        document_type: DocumentType::Invoice,
        primary: &["facture"],
        corroborating: &["facture n", "date facture", "client", "ice"],
    },
    StrongIndicator {
        document_type: DocumentType::BankStatement,
        primary: &["bank statement"],
        corroborating: &[
            "rib",
            "solde",
            "bank name",
            "account number",
            "statement of account",
            "releve bancaire",
        ],
    },
    StrongIndicator {
        document_type: DocumentType::BankStatement,
        primary: &["relevé bancaire", "releve bancaire", "relevé de compte"],
        corroborating: &["rib", "solde", "iban", "compte"],
    },
];

const INVOICE_KEYWORDS: &[&str] = &[
    "invoice",
    "facture",
    "invoice no",
    "vat",
    "tva",
    "total ttc",
    "pro forma invoice",
    "subtotal",
    "freight",
    "tax rate",
];

const RECEIPT_KEYWORDS: &[&str] = &["cash", "amount paid", "till", "credit card", "customer copy"];

const BANK_KEYWORDS: &[&str] = &["date valeur", "date operation", "credit", "debit"];

fn keywords(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::Invoice => INVOICE_KEYWORDS,
        DocumentType::Receipt => RECEIPT_KEYWORDS,
        DocumentType::BankStatement => BANK_KEYWORDS,
        DocumentType::Unknown => &[],
    }
}

/// Which tier decided a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Evidence {
    StrongIndicator {
        primary: &'static str,
        corroborating: &'static str,
    },
    KeywordScore {
        invoice: usize,
        receipt: usize,
        bank_statement: usize,
    },
    Fallback,
}

/// A document type with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub evidence: Evidence,
}

/// Rule-based document classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentClassifier;

impl DocumentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Document type of `text`.
    pub fn classify(&self, text: &str) -> DocumentType {
        self.explain(text).document_type
    }

    /// Classify and report which rule fired.
    pub fn explain(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();

        if let Some(classification) = Self::strong_indicator(&lowered) {
            return classification;
        }

        let score = |t: DocumentType| keywords(t).iter().filter(|k| lowered.contains(*k)).count();
        let (invoice, receipt, bank_statement) = (
            score(DocumentType::Invoice),
            score(DocumentType::Receipt),
            score(DocumentType::BankStatement),
        );
        debug!(
            "keyword scores: invoice={}, receipt={}, bank_statement={}",
            invoice, receipt, bank_statement
        );

        let mut best = (DocumentType::Unknown, 0);
        for document_type in DocumentType::SCORING_PRIORITY {
            let s = score(document_type);
            if s > best.1 {
                best = (document_type, s);
            }
        }

        let evidence = if best.1 > 0 {
            Evidence::KeywordScore {
                invoice,
                receipt,
                bank_statement,
            }
        } else {
            debug!("no keywords matched, classified as unknown");
            Evidence::Fallback
        };

        Classification {
            document_type: best.0,
            evidence,
        }
    }

    fn strong_indicator(lowered: &str) -> Option<Classification> {
        STRONG_INDICATORS.iter().find_map(|indicator| {
            let primary = indicator.primary.iter().copied().find(|p| lowered.contains(p))?;
            let corroborating = indicator
                .corroborating
                .iter()
                .copied()
                .find(|c| contains_keyword(lowered, c))?;

            debug!(
                "strong indicator '{}' + '{}' -> {}",
                primary, corroborating, indicator.document_type
            );
            Some(Classification {
                document_type: indicator.document_type,
                evidence: Evidence::StrongIndicator {
                    primary,
                    corroborating,
                },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(text: &str) -> DocumentType {
        DocumentClassifier::new().classify(text)
    }

    #[test]
    fn test_strong_indicators() {
        assert_eq!(
            classify("RECEIPT #123\nPayment Method: Cash\nTotal Paid: 45.00"),
            DocumentType::Receipt
        );
        assert_eq!(classify("INVOICE\nInvoice No: 42"), DocumentType::Invoice);
        assert_eq!(classify("FACTURE N° 12\nClient: ACME"), DocumentType::Invoice);
        assert_eq!(
            classify("Bank Statement\nAccount Number: 123456"),
            DocumentType::BankStatement
        );
        assert_eq!(classify("RELEVÉ BANCAIRE\nRIB: 0123"), DocumentType::BankStatement);
    }

    #[test]
    fn test_strong_indicator_dominates_scoring() {
        // Bank keywords outnumber receipt keywords, but the receipt indicator fires first.
        let text = "Receipt\nPayment method: card\ncredit\ndebit\ndate valeur\ndate operation";
        let classification = DocumentClassifier::new().explain(text);

        assert_eq!(classification.document_type, DocumentType::Receipt);
        assert_eq!(
            classification.evidence,
            Evidence::StrongIndicator {
                primary: "receipt",
                corroborating: "payment method",
            }
        );
    }

    #[test]
    fn test_keyword_scoring() {
        assert_eq!(classify("Cash\nAmount paid 12.00\nCustomer copy"), DocumentType::Receipt);
        assert_eq!(classify("Date valeur  Débit  Credit"), DocumentType::BankStatement);
        assert_eq!(classify("Subtotal 10\nTVA 20%\nTotal TTC 12"), DocumentType::Invoice);
    }

    #[test]
    fn test_ties_follow_priority() {
        // One invoice keyword (vat) and one receipt keyword (cash).
        assert_eq!(classify("VAT included, paid in cash"), DocumentType::Invoice);
        // One receipt keyword (till) and one bank keyword (credit).
        assert_eq!(classify("till 3, credit"), DocumentType::Receipt);
    }

    #[test]
    fn test_unknown() {
        let classification = DocumentClassifier::new().explain("Hello world");
        assert_eq!(classification.document_type, DocumentType::Unknown);
        assert_eq!(classification.evidence, Evidence::Fallback);
        assert_eq!(classify(""), DocumentType::Unknown);
    }

    #[test]
    fn test_french_statement_mentioning_facture() {
        let text = "RELEVÉ BANCAIRE
RIB : 0123 4567
05/01/2024  Prélèvement facture électricité  -54.20
06/01/2024  Frais de service  -3.00";
        let classification = DocumentClassifier::new().explain(text);

        assert_eq!(classification.document_type, DocumentType::BankStatement);
        assert_eq!(
            classification.evidence,
            Evidence::StrongIndicator {
                primary: "relevé bancaire",
                corroborating: "rib",
            }
        );
    }

    #[test]
    fn test_corroborating_terms_need_word_boundaries() {
        // "ice" inside "office" does not corroborate "facture".
        assert_eq!(
            DocumentClassifier::new().explain("Facture jointe\nOffice supplies").evidence,
            Evidence::KeywordScore {
                invoice: 1,
                receipt: 0,
                bank_statement: 0,
            }
        );
    }
}
