use std::path::{Path, PathBuf};

use thiserror::Error;

/// Header row of an input file did not match the import schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unexpected headings in {}: missing {missing:?}, unexpected {unexpected:?}",
    .file.display()
)]
pub struct SchemaError {
    pub file: PathBuf,
    pub expected: Vec<&'static str>,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl SchemaError {
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Message shown to whoever decides whether the file is dropped from the batch.
    pub fn prompt(&self) -> String {
        let bullets: String = self
            .expected
            .iter()
            .map(|heading| format!(" - {heading}\n"))
            .collect();
        format!(
            "Unexpected headings in {} . Expected:\n{}\nDo you wish to remove this file from the analysis and retry?",
            self.file.display(),
            bullets
        )
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
