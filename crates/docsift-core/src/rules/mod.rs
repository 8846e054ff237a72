//! Rule-based field extraction.
//!
//! A [`FieldRule`] holds an ordered chain of regex alternatives for one
//! header field; the first alternative producing a non-empty capture wins.
//! A [`FieldTable`] applies one rule per field of a document type and
//! returns a fully populated [`HeaderRecord`].

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::to_amount;
pub use dates::to_iso_date;
pub use patterns::*;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::models::{DocumentType, FieldValue, HeaderRecord, Record};

/// Collapse every whitespace run (newlines included) into a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `keyword` occurs in `haystack` delimited by non-alphanumeric characters.
///
/// Both arguments are expected in lowercase.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Compile a field pattern: case-insensitive, `^`/`$` anchored per line.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

/// Trimmed capture `group` of the first match, or `fallback`.
///
/// An empty capture or a group index the pattern does not have also yield
/// the fallback.
pub fn extract(pattern: &Regex, text: &str, group: usize, fallback: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Trimmed capture `group` of every non-overlapping match, in order.
pub fn extract_all(pattern: &Regex, text: &str, group: usize) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(group))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Text a pattern alternative runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Whitespace-normalized single line.
    Normalized,
    /// Raw multi-line text; `^` and `$` anchor at line boundaries.
    Lines,
}

/// Post-processing applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    Lowercase,
    Uppercase,
    /// Parse into a number; unparseable captures become `"N/A"`.
    Amount,
    /// Re-serialize as `YYYY-MM-DD`; unparseable captures are kept as is.
    IsoDate,
}

#[derive(Debug, Clone)]
struct Alternative {
    pattern: Regex,
    group: usize,
    scope: Scope,
}

/// Extraction rule for a single header field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    alternatives: Vec<Alternative>,
    transform: Transform,
}

impl FieldRule {
    /// Rule matching `pattern` against normalized text.
    ///
    /// # Panics
    ///
    /// Rule tables are built from constant patterns; an invalid one panics.
    pub fn new(field: &'static str, pattern: &str, group: usize) -> Self {
        Self {
            field,
            alternatives: Vec::new(),
            transform: Transform::None,
        }
        .push(pattern, group, Scope::Normalized)
    }

    /// Rule matching `pattern` line by line against raw text.
    pub fn lines(field: &'static str, pattern: &str, group: usize) -> Self {
        Self {
            field,
            alternatives: Vec::new(),
            transform: Transform::None,
        }
        .push(pattern, group, Scope::Lines)
    }

    /// Fallback alternative against normalized text.
    pub fn or(self, pattern: &str, group: usize) -> Self {
        self.push(pattern, group, Scope::Normalized)
    }

    /// Fallback alternative against raw lines.
    pub fn or_lines(self, pattern: &str, group: usize) -> Self {
        self.push(pattern, group, Scope::Lines)
    }

    pub fn lowercase(self) -> Self {
        self.with_transform(Transform::Lowercase)
    }

    pub fn uppercase(self) -> Self {
        self.with_transform(Transform::Uppercase)
    }

    pub fn amount(self) -> Self {
        self.with_transform(Transform::Amount)
    }

    pub fn iso_date(self) -> Self {
        self.with_transform(Transform::IsoDate)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    fn push(mut self, pattern: &str, group: usize, scope: Scope) -> Self {
        let pattern = compile(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for field {}: {}", self.field, e));
        self.alternatives.push(Alternative {
            pattern,
            group,
            scope,
        });
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// First non-empty capture across the alternatives, before transformation.
    pub fn capture(&self, normalized: &str, raw: &str) -> Option<String> {
        self.alternatives.iter().find_map(|alt| {
            let text = match alt.scope {
                Scope::Normalized => normalized,
                Scope::Lines => raw,
            };
            let value = extract(&alt.pattern, text, alt.group, "");
            (!value.is_empty()).then_some(value)
        })
    }

    /// Resolve the field, always producing a value.
    pub fn apply(&self, normalized: &str, raw: &str) -> FieldValue {
        let Some(value) = self.capture(normalized, raw) else {
            return FieldValue::missing();
        };

        match self.transform {
            Transform::None => FieldValue::Text(value),
            Transform::Lowercase => FieldValue::Text(value.to_lowercase()),
            Transform::Uppercase => FieldValue::Text(value.to_uppercase()),
            Transform::Amount => to_amount(&value)
                .map(FieldValue::Number)
                .unwrap_or_else(FieldValue::missing),
            Transform::IsoDate => FieldValue::Text(to_iso_date(&value, &value)),
        }
    }
}

/// Ordered rule set for one document type.
#[derive(Debug, Clone)]
pub struct FieldTable {
    document_type: DocumentType,
    rules: Vec<FieldRule>,
}

impl FieldTable {
    pub fn new(document_type: DocumentType, rules: Vec<FieldRule>) -> Self {
        Self {
            document_type,
            rules,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Header record with every vocabulary field present.
    pub fn extract_header(&self, text: &str) -> HeaderRecord {
        let normalized = normalize(text);
        let mut record = Record::with_fields(self.document_type.header_fields());

        for rule in &self.rules {
            record.set(rule.field(), rule.apply(&normalized, text));
        }

        debug!(
            "{}: resolved {}/{} header fields",
            self.document_type,
            record.resolved_count(),
            record.len()
        );

        record
    }
}
