pub mod aggregate;
pub mod batch;
pub mod error;
pub mod outputs;
pub mod runner;

pub use aggregate::{aggregate, group_by_operator, OperatorGroup, OutputTable};
pub use batch::{default_output_dir, run_batch, BatchHost, BatchReport, BatchState, MismatchDecision};
pub use error::{BatchError, ProcessError};
pub use runner::{process, FileSummary};

pub use pipecsv_parser as parser;
