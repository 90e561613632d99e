pub mod errors;
pub mod model;
mod reader;
pub mod schema;

pub use errors::{ParserError, SchemaError};
pub use model::{OperatorId, RawRecord, RawTable, SummaryRecord};
pub use reader::{load_table, TableReader};
pub use schema::{validate, EXPORT_HEADINGS, IMPORT_HEADINGS};
