//! Document data model: types, header/row records and the final output.

use std::fmt;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel for a field no rule could resolve.
pub const NOT_AVAILABLE: &str = "N/A";

const INVOICE_FIELDS: &[&str] = &[
    "invoice_number",
    "invoice_date",
    "delivery_date",
    "due_date",
    "client_name",
    "client_address",
    "client_ice_or_if",
    "provider_name",
    "provider_address",
    "provider_ice_or_if",
    "sub_total_ht",
    "vat_amount",
    "vat_percent",
    "total_ttc",
    "discount",
    "delivery_fee",
    "other_charges",
];

const RECEIPT_FIELDS: &[&str] = &[
    "receipt_number",
    "date",
    "time",
    "shop_name",
    "address",
    "total_amount_paid",
    "payment_method",
];

const BANK_STATEMENT_FIELDS: &[&str] = &[
    "statement_date",
    "period_covered",
    "opening_balance",
    "closing_balance",
    "currency",
    "account_number",
    "account_holder",
];

const INVOICE_COLUMNS: &[&str] = &[
    "label",
    "quantity",
    "unit_price",
    "item_total_ht",
    "item_discount",
    "tax_percentage",
];

const RECEIPT_COLUMNS: &[&str] = &[
    "label",
    "quantity",
    "unit_price",
    "total_ht",
    "tax_percent",
    "discount",
];

const BANK_STATEMENT_COLUMNS: &[&str] = &["date", "description", "amount", "type"];

/// Kind of business document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Invoice (facture).
    Invoice,
    /// Till or payment receipt.
    Receipt,
    /// Bank statement (relevé bancaire).
    BankStatement,
    /// Nothing matched.
    Unknown,
}

impl DocumentType {
    /// Order in which equal keyword scores are resolved.
    pub const SCORING_PRIORITY: [DocumentType; 3] = [
        DocumentType::Invoice,
        DocumentType::Receipt,
        DocumentType::BankStatement,
    ];

    /// Stable snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Header fields every record of this type carries.
    pub fn header_fields(&self) -> &'static [&'static str] {
        match self {
            DocumentType::Invoice => INVOICE_FIELDS,
            DocumentType::Receipt => RECEIPT_FIELDS,
            DocumentType::BankStatement => BANK_STATEMENT_FIELDS,
            DocumentType::Unknown => &[],
        }
    }

    /// Column vocabulary of this type's line items.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            DocumentType::Invoice => INVOICE_COLUMNS,
            DocumentType::Receipt => RECEIPT_COLUMNS,
            DocumentType::BankStatement => BANK_STATEMENT_COLUMNS,
            DocumentType::Unknown => &[],
        }
    }

    /// Whether this type is handled by a parser.
    pub fn is_known(&self) -> bool {
        !matches!(self, DocumentType::Unknown)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text as captured, or the `"N/A"` sentinel.
    Text(String),
    /// Parsed monetary amount, serialized as a JSON number.
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
}

impl FieldValue {
    /// The `"N/A"` sentinel.
    pub fn missing() -> Self {
        FieldValue::Text(NOT_AVAILABLE.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s == NOT_AVAILABLE)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Ordered field map with a fixed vocabulary.
///
/// Used both for header records and for row records. Every vocabulary key
/// is present from construction on; unresolved keys hold the sentinel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: Vec<(&'static str, FieldValue)>,
}

/// Document-wide fields (dates, totals, parties).
pub type HeaderRecord = Record;

/// One line item or transaction.
pub type RowRecord = Record;

impl Record {
    /// Record with every field set to `"N/A"`.
    pub fn with_fields(fields: &[&'static str]) -> Self {
        Self {
            entries: fields.iter().map(|f| (*f, FieldValue::missing())).collect(),
        }
    }

    /// Set a field, appending it if it is not part of the vocabulary yet.
    pub fn set(&mut self, field: &'static str, value: FieldValue) {
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Text of a field, `None` for numbers and unknown keys.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields holding something other than the sentinel.
    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| !v.is_missing()).count()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Where and when a document was extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Base name of the source file.
    pub source_file: String,
    /// Local extraction time.
    #[serde(serialize_with = "serialize_timestamp")]
    pub extracted_on: NaiveDateTime,
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Final structured record for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    document_type: DocumentType,
    metadata: Metadata,
    fields: HeaderRecord,
    transactions: Vec<RowRecord>,
}

impl OutputDocument {
    /// Assemble the output, stamped with the current local time.
    pub fn new(
        document_type: DocumentType,
        source_file: &str,
        fields: HeaderRecord,
        transactions: Vec<RowRecord>,
    ) -> Self {
        Self::with_timestamp(
            document_type,
            source_file,
            fields,
            transactions,
            Local::now().naive_local(),
        )
    }

    /// Assemble the output with an explicit extraction time.
    pub fn with_timestamp(
        document_type: DocumentType,
        source_file: &str,
        fields: HeaderRecord,
        transactions: Vec<RowRecord>,
        extracted_on: NaiveDateTime,
    ) -> Self {
        let source_file = Path::new(source_file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(source_file)
            .to_string();

        Self {
            document_type,
            metadata: Metadata {
                source_file,
                extracted_on,
            },
            fields,
            transactions,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn fields(&self) -> &HeaderRecord {
        &self.fields
    }

    pub fn transactions(&self) -> &[RowRecord] {
        &self.transactions
    }

    /// `<type>_output_<YYYY-MM-DD_HH-MM-SS>.json`
    pub fn default_file_name(&self) -> String {
        format!(
            "{}_output_{}.json",
            self.document_type,
            self.metadata.extracted_on.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}
