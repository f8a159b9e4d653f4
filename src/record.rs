//! Value types flowing through the verification pipeline.
//!
//! Everything here is a transient value object: created fresh for one
//! submission, rendered, and discarded. Nothing is persisted and nothing has
//! identity beyond its field values, so every type is a plain data struct
//! with `Serialize` for the `--json` output path.

use crate::compare::NOT_PROVIDED;
use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ── Fields ───────────────────────────────────────────────────────────────

/// The four known mark-sheet fields, in their fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "Name")]
    Name,
    #[serde(rename = "Roll No.")]
    RollNo,
    #[serde(rename = "Examination Year")]
    ExaminationYear,
    #[serde(rename = "Result")]
    Result,
}

impl Field {
    /// All fields in comparison order. The order is part of the contract:
    /// a comparison always yields rows Name, Roll No., Examination Year,
    /// Result, in that order.
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::RollNo,
        Field::ExaminationYear,
        Field::Result,
    ];

    /// The label used both for display and as the JSON key the model is
    /// instructed to emit.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::RollNo => "Roll No.",
            Field::ExaminationYear => "Examination Year",
            Field::Result => "Result",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Extracted record ─────────────────────────────────────────────────────

/// The mapping recovered from the model's reply, keys kept exactly as the
/// model produced them.
///
/// No key validation and no type coercion happen at parse time — the model
/// may rename, omit, or invent keys, and consumers must handle absence.
/// [`MarksheetRecord::field_text`] is the defensive accessor the comparator
/// uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarksheetRecord(Map<String, Value>);

impl MarksheetRecord {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw access to whatever the model emitted under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of keys the model emitted (not necessarily 4).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text value for a known field, if the model provided one.
    ///
    /// Models occasionally emit a bare number for the year field; scalar
    /// values are rendered with their JSON text form so `2021` still matches
    /// a manually typed "2021". Arrays and objects carry no usable field
    /// text and are treated as absent.
    pub fn field_text(&self, field: Field) -> Option<String> {
        match self.0.get(field.label()) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for MarksheetRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

// ── Manual entry ─────────────────────────────────────────────────────────

/// The four user-typed ground-truth fields.
///
/// All fields are optional plain strings; an empty string means the user
/// did not provide the field, and renders as "Not Provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub name: String,
    pub roll_no: String,
    pub examination_year: String,
    pub result: String,
}

impl ManualEntry {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::RollNo => &self.roll_no,
            Field::ExaminationYear => &self.examination_year,
            Field::Result => &self.result,
        }
    }
}

// ── Comparison output ────────────────────────────────────────────────────

/// Per-field match verdict.
///
/// `Yes` only when both trimmed values are non-empty and equal under
/// case-insensitive comparison. Two empty values are `No` — an explicit
/// policy: absence on both sides is not evidence of agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchVerdict {
    Yes,
    No,
}

impl MatchVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchVerdict::Yes)
    }
}

impl fmt::Display for MatchVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchVerdict::Yes => "Yes",
            MatchVerdict::No => "No",
        })
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub field: Field,
    /// Trimmed manual value, or "Not Provided" when empty.
    pub manual: String,
    /// Trimmed extracted value, or "Not Provided" when empty or absent.
    pub extracted: String,
    #[serde(rename = "match")]
    pub verdict: MatchVerdict,
}

impl ComparisonRow {
    /// True when neither side carries a real value.
    pub fn both_missing(&self) -> bool {
        self.manual == NOT_PROVIDED && self.extracted == NOT_PROVIDED
    }
}

// ── Outcome & stats ──────────────────────────────────────────────────────

/// Result of one extraction: a record or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// The model reply contained a recoverable JSON object.
    Extracted { record: MarksheetRecord },
    /// Transport failure, blank reply, or unrecoverable reply text.
    Failed { error: ExtractionError },
}

impl ExtractionOutcome {
    pub fn record(&self) -> Option<&MarksheetRecord> {
        match self {
            ExtractionOutcome::Extracted { record } => Some(record),
            ExtractionOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            ExtractionOutcome::Extracted { .. } => None,
            ExtractionOutcome::Failed { error } => Some(error),
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted { .. })
    }
}

impl From<Result<MarksheetRecord, ExtractionError>> for ExtractionOutcome {
    fn from(res: Result<MarksheetRecord, ExtractionError>) -> Self {
        match res {
            Ok(record) => ExtractionOutcome::Extracted { record },
            Err(error) => ExtractionOutcome::Failed { error },
        }
    }
}

/// Timing and token accounting for one extraction round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Model that served the request.
    pub model: String,
    /// Wall-clock duration of the provider call, in milliseconds.
    pub duration_ms: u64,
    /// Prompt tokens reported by the API (0 when not reported).
    pub prompt_tokens: u32,
    /// Completion tokens reported by the API (0 when not reported).
    pub completion_tokens: u32,
}

/// Output of [`crate::extract_marksheet`]: the outcome plus stats.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub outcome: ExtractionOutcome,
    pub stats: ExtractionStats,
}

/// Output of [`crate::verify_marksheet`]: the outcome, the comparison rows
/// (present only when extraction succeeded — no partial table is ever
/// produced for a failed extraction), and the stats.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutput {
    pub outcome: ExtractionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<ComparisonRow>>,
    pub stats: ExtractionStats,
}

impl VerificationOutput {
    /// True when extraction succeeded and every field matched.
    pub fn all_match(&self) -> bool {
        self.rows
            .as_deref()
            .is_some_and(|rows| rows.iter().all(|r| r.verdict.is_match()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> MarksheetRecord {
        match value {
            Value::Object(map) => MarksheetRecord::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn field_order_is_fixed() {
        let labels: Vec<&str> = Field::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(
            labels,
            vec!["Name", "Roll No.", "Examination Year", "Result"]
        );
    }

    #[test]
    fn field_text_reads_strings() {
        let r = record(json!({"Name": "A. Candidate", "Roll No.": "42"}));
        assert_eq!(r.field_text(Field::Name).as_deref(), Some("A. Candidate"));
        assert_eq!(r.field_text(Field::RollNo).as_deref(), Some("42"));
        assert_eq!(r.field_text(Field::Result), None);
    }

    #[test]
    fn field_text_renders_scalar_year() {
        let r = record(json!({"Examination Year": 2021}));
        assert_eq!(
            r.field_text(Field::ExaminationYear).as_deref(),
            Some("2021")
        );
    }

    #[test]
    fn field_text_ignores_structured_values() {
        let r = record(json!({"Name": ["a", "b"], "Result": {"value": "Pass"}}));
        assert_eq!(r.field_text(Field::Name), None);
        assert_eq!(r.field_text(Field::Result), None);
    }

    #[test]
    fn outcome_is_a_tagged_union() {
        let ok: ExtractionOutcome = Ok(record(json!({"Name": "X"}))).into();
        assert!(ok.is_extracted());
        assert!(ok.error().is_none());

        let err: ExtractionOutcome = Err(ExtractionError::EmptyResponse).into();
        assert!(!err.is_extracted());
        assert!(err.record().is_none());

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "failed");
    }

    #[test]
    fn comparison_row_serialises_match_key() {
        let row = ComparisonRow {
            field: Field::RollNo,
            manual: "12".into(),
            extracted: "12".into(),
            verdict: MatchVerdict::Yes,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["field"], "Roll No.");
        assert_eq!(json["match"], "Yes");
    }
}
