//! Field comparison: normalise manual and extracted values, compute verdicts.
//!
//! A pure function with no side effects: the same `(manual, extracted)` pair
//! always yields the same four rows, in the same order. All normalisation is
//! deliberately minimal — trim and case-fold, nothing else. "2021 " matches
//! "2021"; "Passed" does not match "Pass". Fuzzier matching would hide real
//! transcription discrepancies, which is exactly what this tool exists to
//! surface.

use crate::record::{ComparisonRow, Field, ManualEntry, MarksheetRecord, MatchVerdict};

/// Display sentinel for a field with no usable value on one side.
pub const NOT_PROVIDED: &str = "Not Provided";

/// Compare the manual entry against the extracted record.
///
/// Produces exactly four rows in the fixed order Name, Roll No.,
/// Examination Year, Result. For each field:
///
/// 1. Both values are trimmed of leading/trailing whitespace. A key the
///    model omitted behaves identically to an empty extracted value.
/// 2. The verdict is [`MatchVerdict::Yes`] only if both trimmed values are
///    non-empty **and** equal case-insensitively. Two empty values are `No`:
///    agreeing on absence is not a match.
/// 3. The display value is the trimmed text, or the "Not Provided" sentinel
///    when empty.
pub fn compare(manual: &ManualEntry, extracted: &MarksheetRecord) -> Vec<ComparisonRow> {
    Field::ALL
        .iter()
        .map(|&field| compare_field(field, manual.value(field), extracted.field_text(field)))
        .collect()
}

fn compare_field(field: Field, manual_raw: &str, extracted_raw: Option<String>) -> ComparisonRow {
    let manual = manual_raw.trim();
    let extracted_owned = extracted_raw.unwrap_or_default();
    let extracted = extracted_owned.trim();

    let verdict = if !manual.is_empty()
        && !extracted.is_empty()
        && manual.to_lowercase() == extracted.to_lowercase()
    {
        MatchVerdict::Yes
    } else {
        MatchVerdict::No
    };

    ComparisonRow {
        field,
        manual: display_value(manual),
        extracted: display_value(extracted),
        verdict,
    }
}

fn display_value(trimmed: &str) -> String {
    if trimmed.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        trimmed.to_string()
    }
}
