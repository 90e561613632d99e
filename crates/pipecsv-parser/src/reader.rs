use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::errors::{ParserError, SchemaError};
use crate::model::{RawRecord, RawTable};
use crate::schema;

/// An opened input file whose header row has been read but not yet checked.
pub struct TableReader<R> {
    source: PathBuf,
    headers: Vec<String>,
    inner: csv::Reader<R>,
}

impl TableReader<File> {
    pub fn open(path: &Path) -> Result<Self, ParserError> {
        let file = File::open(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path, file)
    }
}

impl<R: Read> TableReader<R> {
    /// Wraps any byte source. `source` only labels errors and the loaded table.
    pub fn from_reader(source: impl Into<PathBuf>, rdr: R) -> Result<Self, ParserError> {
        let source = source.into();
        let mut inner = Self::reader_builder().from_reader(rdr);
        let headers = inner
            .headers()
            .map_err(|err| ParserError::Csv {
                path: source.clone(),
                source: err,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            source,
            headers,
            inner,
        })
    }

    fn reader_builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.has_headers(true).quote(b'"');
        builder
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        schema::validate(&self.headers, &self.source)
    }

    /// Validates the header row, then deserializes every data row.
    ///
    /// The first row that does not fit [`RawRecord`] fails the whole file.
    pub fn into_table(mut self) -> Result<RawTable, ParserError> {
        self.validate()?;

        let mut records = Vec::new();
        for result in self.inner.deserialize::<RawRecord>() {
            let record = result.map_err(|err| ParserError::Csv {
                path: self.source.clone(),
                source: err,
            })?;
            records.push(record);
        }

        Ok(RawTable::new(self.source, records))
    }
}

pub fn load_table(path: &Path) -> Result<RawTable, ParserError> {
    TableReader::open(path)?.into_table()
}
