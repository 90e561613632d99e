use std::collections::HashSet;
use std::path::Path;

use crate::errors::SchemaError;

pub const IMPORT_HEADINGS: [&str; 13] = [
    "Operator ID",
    "Operator Business Name",
    "HCA Miles",
    "% Total Onshore Miles",
    "Baseline Miles Completed in Year",
    "Reassessment Miles Completed in Year",
    "Total Assessments Completed in Year",
    "HCA Immediate Repairs",
    "HCA Scheduled Repairs",
    "HCA Pressure Test Failure Repairs",
    "Total HCA Repairs",
    "State Name",
    "Pdf Link",
];

pub const EXPORT_HEADINGS: [&str; 6] = [
    "Operator ID",
    "Operator Business Name",
    "Pipeline Miles",
    "HCA Miles",
    "Total Assessments Completed in Year",
    "Total HCA Repairs",
];

/// Checks that `headers` is a permutation of [`IMPORT_HEADINGS`].
///
/// Column order is irrelevant. A repeated column is reported as unexpected,
/// so a header row can only pass with exactly thirteen distinct names.
pub fn validate<S: AsRef<str>>(headers: &[S], file: &Path) -> Result<(), SchemaError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(headers.len());
    let mut unexpected = Vec::new();

    for heading in headers.iter().map(|heading| heading.as_ref()) {
        if !IMPORT_HEADINGS.contains(&heading) || !seen.insert(heading) {
            unexpected.push(heading.to_string());
        }
    }

    let missing: Vec<String> = IMPORT_HEADINGS
        .iter()
        .filter(|heading| !seen.contains(*heading))
        .map(|heading| heading.to_string())
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    Err(SchemaError {
        file: file.to_path_buf(),
        expected: IMPORT_HEADINGS.to_vec(),
        missing,
        unexpected,
    })
}
