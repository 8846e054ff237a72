//! Table and transaction extraction from text lines.
//!
//! Documents carry no table markup, so the tabular region is located
//! heuristically: first by a header spread over a few consecutive lines,
//! otherwise by the first line shaped like a row. From there, lines are
//! grouped into row buffers (a row-shaped line opens a new buffer, other
//! lines continue it) until a stop keyword ends the table. Each buffer is
//! split into columns on wide whitespace or pipes and mapped positionally
//! onto the column vocabulary of the document type.

use tracing::debug;

use crate::models::config::TableConfig;
use crate::models::{DocumentType, FieldValue, Record, RowRecord};
use crate::rules::{
    contains_keyword, normalize, BANK_ROW, COLUMN_DELIMITER, ITEM_ROW_LINE, ITEM_ROW_SHAPE,
    LEADING_DATE,
};

/// Shape of a line that opens a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStart {
    /// Line begins with a date (bank statements).
    LeadingDate,
    /// Quantity followed by price-like numbers (invoices, receipts).
    ItemShape,
}

impl RowStart {
    fn matches(&self, line: &str) -> bool {
        match self {
            RowStart::LeadingDate => LEADING_DATE.is_match(line),
            RowStart::ItemShape => ITEM_ROW_SHAPE.is_match(line),
        }
    }

    /// Stricter check for the first row when no header was found.
    fn opens_table(&self, line: &str) -> bool {
        match self {
            RowStart::LeadingDate => LEADING_DATE.is_match(line),
            RowStart::ItemShape => ITEM_ROW_LINE.is_match(line),
        }
    }
}

/// Per-document-type table extraction settings.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub document_type: DocumentType,
    pub header_keywords: Vec<&'static str>,
    pub min_header_matches: usize,
    pub header_window: usize,
    pub row_start: RowStart,
    pub stop_keywords: Vec<&'static str>,
    /// A blank line closes the table once rows have started.
    pub stop_on_blank: bool,
    pub min_columns: usize,
    /// Columns filled positionally from the split cells.
    pub positional_columns: Vec<&'static str>,
    /// Derive a `type` column (`debit`/`credit`) from the amount's sign.
    pub infer_transaction_type: bool,
    /// Retry single-spaced rows with the date/description/amount pattern.
    pub row_pattern_fallback: bool,
}

impl TableSpec {
    pub fn invoice() -> Self {
        Self {
            document_type: DocumentType::Invoice,
            header_keywords: vec![
                "désignation", "designation", "description", "qté", "qte", "quantité",
                "quantite", "qty", "quantity", "pu", "p.u", "prix", "unit price", "montant",
                "amount", "total",
            ],
            min_header_matches: 3,
            header_window: 3,
            row_start: RowStart::ItemShape,
            stop_keywords: vec![
                "total", "sous total", "signature", "merci", "arrêtée", "arretee", "thank you",
            ],
            stop_on_blank: true,
            min_columns: 3,
            positional_columns: DocumentType::Invoice.columns().to_vec(),
            infer_transaction_type: false,
            row_pattern_fallback: false,
        }
    }

    pub fn receipt() -> Self {
        Self {
            document_type: DocumentType::Receipt,
            header_keywords: vec![
                "item", "description", "qty", "quantity", "unit", "price", "total", "article",
                "qté", "prix", "amount",
            ],
            min_header_matches: 3,
            header_window: 3,
            row_start: RowStart::ItemShape,
            stop_keywords: vec![
                "subtotal", "sub total", "total", "tax", "vat", "thank you", "merci",
            ],
            stop_on_blank: false,
            min_columns: 3,
            positional_columns: DocumentType::Receipt.columns().to_vec(),
            infer_transaction_type: false,
            row_pattern_fallback: false,
        }
    }

    pub fn bank_statement() -> Self {
        Self {
            document_type: DocumentType::BankStatement,
            header_keywords: vec![
                "date", "description", "libellé", "libelle", "amount", "montant", "debit",
                "débit", "credit", "crédit", "balance", "solde", "valeur", "operation",
                "opération",
            ],
            min_header_matches: 3,
            header_window: 3,
            row_start: RowStart::LeadingDate,
            stop_keywords: vec!["closing balance", "total", "solde final"],
            stop_on_blank: false,
            min_columns: 3,
            positional_columns: vec!["date", "description", "amount"],
            infer_transaction_type: true,
            row_pattern_fallback: true,
        }
    }

    /// Settings for a known type, `None` for [`DocumentType::Unknown`].
    pub fn for_document(document_type: DocumentType) -> Option<Self> {
        match document_type {
            DocumentType::Invoice => Some(Self::invoice()),
            DocumentType::Receipt => Some(Self::receipt()),
            DocumentType::BankStatement => Some(Self::bank_statement()),
            DocumentType::Unknown => None,
        }
    }

    /// Override the thresholds from configuration.
    pub fn with_config(mut self, config: &TableConfig) -> Self {
        self.min_columns = config.min_columns;
        self.header_window = config.header_window.max(1);
        self.min_header_matches = config.min_header_matches;
        self
    }
}

/// Extracts row records according to a [`TableSpec`].
#[derive(Debug, Clone)]
pub struct TableExtractor {
    spec: TableSpec,
}

impl TableExtractor {
    pub fn new(spec: TableSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Header keywords found in `line` that are not in `matched` yet.
    fn add_keywords(&self, line: &str, matched: &mut Vec<&'static str>) -> usize {
        let before = matched.len();
        for &keyword in &self.spec.header_keywords {
            if !matched.contains(&keyword) && contains_keyword(line, keyword) {
                matched.push(keyword);
            }
        }
        matched.len() - before
    }

    /// Index of the first line past a header spread over the window.
    ///
    /// Once the window holds enough keywords, the header keeps growing over
    /// following lines that add new keywords and are not row-shaped.
    fn header_end<S: AsRef<str>>(&self, lines: &[S]) -> Option<usize> {
        let lowered: Vec<String> = lines.iter().map(|l| l.as_ref().to_lowercase()).collect();

        for start in 0..lowered.len() {
            let mut matched: Vec<&'static str> = Vec::new();
            let end = (start + self.spec.header_window).min(lowered.len());

            for index in start..end {
                let added = self.add_keywords(&lowered[index], &mut matched);
                if added == 0 || matched.len() < self.spec.min_header_matches {
                    continue;
                }

                let mut last = index;
                while let Some(next) = lowered.get(last + 1) {
                    if self.spec.row_start.matches(next) || self.add_keywords(next, &mut matched) == 0 {
                        break;
                    }
                    last += 1;
                }

                debug!(
                    "{} table header at lines {}..={} ({:?})",
                    self.spec.document_type, start, last, matched
                );
                return Some(last + 1);
            }
        }
        None
    }

    /// Index of the first line belonging to the table body.
    ///
    /// Without a header, the first line that looks like a complete row.
    pub fn find_region<S: AsRef<str>>(&self, lines: &[S]) -> Option<usize> {
        self.header_end(lines).or_else(|| {
            lines
                .iter()
                .position(|line| self.spec.row_start.opens_table(line.as_ref()))
        })
    }

    fn is_stop_line(&self, line: &str) -> bool {
        let lowered = normalize(&line.to_lowercase());
        self.spec
            .stop_keywords
            .iter()
            .any(|keyword| contains_keyword(&lowered, keyword))
    }

    /// Turn a finished row buffer into a record, if it is a usable row.
    fn flush(&self, buffer: &mut Vec<&str>, rows: &mut Vec<RowRecord>, leading: &mut bool) {
        if buffer.is_empty() {
            return;
        }
        let lines = std::mem::take(buffer);

        // Text between a bank header and the first dated line is not a transaction.
        if std::mem::replace(leading, false)
            && self.spec.row_start == RowStart::LeadingDate
            && !self.spec.row_start.matches(lines[0])
        {
            debug!("skipping undated lines before the first transaction: {:?}", lines);
            return;
        }

        if let Some(cells) = self.cells(&lines) {
            rows.push(self.to_record(cells));
        }
    }

    /// Group table lines into row buffers and convert them to records.
    fn rows<S: AsRef<str>>(&self, lines: &[S]) -> Vec<RowRecord> {
        let mut rows = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut leading = true;

        for line in lines {
            let line: &str = line.as_ref();
            if line.trim().is_empty() {
                if self.spec.stop_on_blank {
                    self.flush(&mut current, &mut rows, &mut leading);
                    if !rows.is_empty() {
                        break;
                    }
                }
                continue;
            }

            if self.is_stop_line(line) {
                break;
            }

            if self.spec.row_start.matches(line) {
                self.flush(&mut current, &mut rows, &mut leading);
            }
            current.push(line);
        }

        self.flush(&mut current, &mut rows, &mut leading);
        rows
    }

    /// Split a row buffer into cells.
    fn cells(&self, buffer: &[&str]) -> Option<Vec<String>> {
        let joined = buffer.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" ");

        let cells: Vec<String> = COLUMN_DELIMITER
            .split(&joined)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        if cells.len() >= self.spec.min_columns {
            return Some(cells);
        }

        if self.spec.row_pattern_fallback {
            if let Some(caps) = BANK_ROW.captures(&joined) {
                return Some(vec![
                    caps["date"].to_string(),
                    caps["description"].trim().to_string(),
                    caps["amount"].replace(' ', ""),
                ]);
            }
        }

        debug!(
            "dropping {} row with {} columns: {:?}",
            self.spec.document_type,
            cells.len(),
            joined
        );
        None
    }

    fn to_record(&self, cells: Vec<String>) -> RowRecord {
        let mut record = Record::with_fields(self.spec.document_type.columns());

        for (&column, cell) in self.spec.positional_columns.iter().zip(cells) {
            record.set(column, FieldValue::Text(cell));
        }

        if self.spec.infer_transaction_type {
            let debit = record.text("amount").is_some_and(|a| a.contains('-'));
            record.set("type", FieldValue::text(if debit { "debit" } else { "credit" }));
        }

        record
    }

    /// Rows of the table found in `lines`; empty when no table is found.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Vec<RowRecord> {
        let Some(start) = self.find_region(lines) else {
            debug!("no {} table found", self.spec.document_type);
            return Vec::new();
        };

        let rows = self.rows(&lines[start..]);

        debug!("extracted {} {} rows", rows.len(), self.spec.document_type);
        rows
    }

    /// Rows of the table found in `text`, split on line breaks.
    pub fn extract_from_text(&self, text: &str) -> Vec<RowRecord> {
        let lines: Vec<&str> = text.lines().collect();
        self.extract(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(row: &RowRecord) -> Vec<String> {
        row.iter().map(|(_, v)| v.to_string()).collect()
    }

    #[test]
    fn test_invoice_rows_after_header() {
        let text = "FACTURE N° 2024-001
Désignation  Qté  PU  Montant
Chaise bureau  2  150.00  300.00
Table  1  420.00  420.00
Total HT  720.00";

        let rows = TableExtractor::new(TableSpec::invoice()).extract_from_text(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            texts(&rows[0]),
            vec!["Chaise bureau", "2", "150.00", "300.00", "N/A", "N/A"]
        );
        assert_eq!(rows[1].text("label"), Some("Table"));
    }

    #[test]
    fn test_header_spread_over_window() {
        let lines = vec![
            "Désignation",
            "Qté",
            "Prix",
            "Widget  3  5.00  15.00",
        ];

        let extractor = TableExtractor::new(TableSpec::invoice());
        assert_eq!(extractor.find_region(&lines), Some(3));
        assert_eq!(extractor.extract(&lines).len(), 1);

        let narrow = TableExtractor::new(TableSpec::invoice().with_config(&TableConfig {
            header_window: 2,
            ..TableConfig::default()
        }));
        // With a two-line window no header is found; the first row-shaped line starts the table.
        assert_eq!(narrow.find_region(&lines), Some(3));
    }

    #[test]
    fn test_continuation_lines_join_the_row() {
        let text = "Item  Qty  Price  Total
Coffee beans  1  12.00  12.00
  organic, 500g
Milk  2  1.50  3.00
Subtotal  15.00";

        let rows = TableExtractor::new(TableSpec::receipt()).extract_from_text(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("discount"), Some("N/A"));
        assert_eq!(rows[0].text("unit_price"), Some("12.00"));
        assert_eq!(rows[0].text("total_ht"), Some("12.00 organic, 500g"));
    }

    #[test]
    fn test_rows_below_min_columns_are_dropped() {
        let text = "Item  Qty  Price
Pen 1 2.00 2.00
Book  1  9.00  9.00";

        let rows = TableExtractor::new(TableSpec::receipt()).extract_from_text(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("label"), Some("Book"));
    }

    #[test]
    fn test_blank_line_closes_invoice_table() {
        let text = "Désignation  Qté  PU  Montant

Chaise  2  150.00  300.00

Garantie  1  0.00  0.00";

        let rows = TableExtractor::new(TableSpec::invoice()).extract_from_text(text);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_no_table_region() {
        let rows = TableExtractor::new(TableSpec::invoice()).extract_from_text("Bonjour\nMerci");
        assert!(rows.is_empty());
        assert!(TableExtractor::new(TableSpec::receipt()).extract::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_bank_rows_with_type() {
        let text = "Date  Description  Amount  Balance
02/01/2024  Salary January  2,500.00  3,700.00
05/01/2024  Card payment  -54.20  3,645.80
08/01/2024 Grocery store -12.50
Closing balance  3,633.30";

        let rows = TableExtractor::new(TableSpec::bank_statement()).extract_from_text(text);
        assert_eq!(rows.len(), 3);
        assert_eq!(texts(&rows[0]), vec!["02/01/2024", "Salary January", "2,500.00", "credit"]);
        assert_eq!(texts(&rows[1]), vec!["05/01/2024", "Card payment", "-54.20", "debit"]);
        assert_eq!(texts(&rows[2]), vec!["08/01/2024", "Grocery store", "-12.50", "debit"]);
    }

    #[test]
    fn test_bank_header_block_above_table() {
        let text = "Statement Date: 31/01/2024
Opening Balance: 1,200.00
Available Credit: 500.00
Date  Description  Amount
02/01/2024  Salary January  2,500.00
05/01/2024  Card payment  -54.20";

        let extractor = TableExtractor::new(TableSpec::bank_statement());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(extractor.find_region(&lines), Some(4));

        let rows = extractor.extract(&lines);
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["02/01/2024", "Salary January", "2,500.00", "credit"]);
        assert_eq!(texts(&rows[1]), vec!["05/01/2024", "Card payment", "-54.20", "debit"]);
    }

    #[test]
    fn test_undated_lines_before_first_transaction_are_skipped() {
        // The column header adds no new keywords, so it lands in the table body.
        let text = "Date: 31/01/2024
Balance  Credit limit
Date  Balance  Credit
02/01/2024  Salary  2,500.00
05/01/2024  Rent  -800.00";

        let rows = TableExtractor::new(TableSpec::bank_statement()).extract_from_text(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("description"), Some("Salary"));
        assert_eq!(rows[1].text("type"), Some("debit"));
    }

    #[test]
    fn test_headerless_invoice_ignores_phone_number() {
        let text = "SARL ATLAS
Tél : 05 22 33 44 55

Chaise bureau  2  150.00  300.00
Table  1  420.00  420.00";

        let extractor = TableExtractor::new(TableSpec::invoice());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(extractor.find_region(&lines), Some(3));

        let rows = extractor.extract(&lines);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("label"), Some("Chaise bureau"));
        assert_eq!(rows[1].text("item_total_ht"), Some("420.00"));
    }

    #[test]
    fn test_blank_line_after_dropped_row_keeps_scanning() {
        let text = "Désignation  Qté  PU  Montant
Remarque

Chaise  2  150.00  300.00

Garantie  1  0.00  0.00";

        let rows = TableExtractor::new(TableSpec::invoice()).extract_from_text(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("label"), Some("Chaise"));
    }
}
