use std::path::{Path, PathBuf};

use pipecsv_parser::TableReader;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::error::Result;
use crate::outputs::write_summary;

/// What one successfully processed file produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_read: usize,
    pub operators_written: usize,
}

/// Load, validate, aggregate and write one input file.
///
/// A header mismatch returns [`ProcessError::SchemaMismatch`] before any
/// output is written. `out_path` is overwritten when it already exists.
pub fn process(in_path: &Path, out_path: &Path) -> Result<FileSummary> {
    let reader = TableReader::open(in_path)?;
    debug!(file = %in_path.display(), columns = reader.headers().len(), "loaded header row");

    // Header validation happens inside `into_table`; a mismatch maps to
    // `ProcessError::SchemaMismatch` through `From<ParserError>`.
    let table = reader.into_table()?;
    let rows_read = table.len();
    debug!(file = %in_path.display(), rows = rows_read, "validated table");

    let output = aggregate(table);
    write_summary(&output, out_path)?;

    info!(
        input = %in_path.display(),
        output = %out_path.display(),
        rows = rows_read,
        operators = output.len(),
        "wrote operator summary"
    );

    Ok(FileSummary {
        input: in_path.to_path_buf(),
        output: out_path.to_path_buf(),
        rows_read,
        operators_written: output.len(),
    })
}
