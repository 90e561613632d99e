use std::path::PathBuf;

use pipecsv_parser::{ParserError, SchemaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// Recoverable: the caller may drop the file and carry on with the batch.
    #[error(transparent)]
    SchemaMismatch(SchemaError),

    #[error("File I/O error on {}: {source}", .path.display())]
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
}

impl ProcessError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProcessError::SchemaMismatch(_))
    }
}

impl From<ParserError> for ProcessError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::Schema(schema) => ProcessError::SchemaMismatch(schema),
            ParserError::Io { path, source } => ProcessError::Io { path, source },
            ParserError::Csv { path, source } => ProcessError::Csv { path, source },
        }
    }
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("batch stopped at {}: {source}", .file.display())]
    Fatal {
        file: PathBuf,
        #[source]
        source: ProcessError,
    },
}

pub type Result<T> = std::result::Result<T, ProcessError>;
