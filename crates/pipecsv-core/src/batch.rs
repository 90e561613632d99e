use std::path::{Path, PathBuf};

use pipecsv_parser::SchemaError;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{BatchError, ProcessError};
use crate::outputs::output_path;
use crate::runner::{process, FileSummary};

/// The files still to be processed and where their summaries go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchState {
    files: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl BatchState {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            files: Vec::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.add_files(files);
        self
    }

    /// Appends to the end of the batch, keeping the given order.
    pub fn add_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
    }

    pub fn remove(mut self, file: &Path) -> Self {
        self.files.retain(|candidate| candidate != file);
        self
    }

    pub fn clear(mut self) -> Self {
        self.files.clear();
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        output_path(&self.output_dir, input)
    }
}

/// Directory of the last file, used when no output directory was chosen.
pub fn default_output_dir(files: &[PathBuf]) -> Option<PathBuf> {
    let parent = files.last()?.parent()?;
    if parent.as_os_str().is_empty() {
        Some(PathBuf::from("."))
    } else {
        Some(parent.to_path_buf())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchDecision {
    /// Remove the file from the batch and go on with the next one.
    DropAndContinue,
    Abort,
}

/// The party driving a batch: answers mismatch questions and hears progress.
pub trait BatchHost {
    fn resolve_mismatch(&mut self, error: &SchemaError) -> MismatchDecision;

    fn file_processed(&mut self, _summary: &FileSummary) {}

    /// Called once, after the last file or after an abort decision.
    fn batch_complete(&mut self, _report: &BatchReport) {}
}

/// A fixed answer to every mismatch, for unattended runs.
impl BatchHost for MismatchDecision {
    fn resolve_mismatch(&mut self, _error: &SchemaError) -> MismatchDecision {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<FileSummary>,
    pub dropped: Vec<PathBuf>,
    /// Files not yet written. Empty unless the batch was aborted, in which
    /// case it starts with the file that triggered the abort.
    pub remaining: BatchState,
    pub aborted: bool,
}

/// Runs every file in `state` through [`process`], one at a time.
///
/// Each file leaves the state once written or dropped. Header mismatches go
/// to `host`. Any other failure stops the batch with [`BatchError::Fatal`]
/// and no completion notice.
pub fn run_batch<H>(mut state: BatchState, host: &mut H) -> Result<BatchReport, BatchError>
where
    H: BatchHost + ?Sized,
{
    let mut processed = Vec::new();
    let mut dropped = Vec::new();
    let mut aborted = false;

    while let Some(input) = state.files().first().cloned() {
        let output = state.output_path_for(&input);
        match process(&input, &output) {
            Ok(summary) => {
                state = state.remove(&input);
                host.file_processed(&summary);
                processed.push(summary);
            }
            Err(ProcessError::SchemaMismatch(mismatch)) => {
                match host.resolve_mismatch(&mismatch) {
                    MismatchDecision::DropAndContinue => {
                        warn!(file = %input.display(), "dropping file with unexpected headings");
                        state = state.remove(&input);
                        dropped.push(input);
                    }
                    MismatchDecision::Abort => {
                        warn!(file = %input.display(), "batch aborted on unexpected headings");
                        aborted = true;
                        break;
                    }
                }
            }
            Err(source) => return Err(BatchError::Fatal { file: input, source }),
        }
    }

    info!(
        processed = processed.len(),
        dropped = dropped.len(),
        aborted,
        "batch finished"
    );

    let report = BatchReport {
        processed,
        dropped,
        remaining: state,
        aborted,
    };
    host.batch_complete(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_returns_state_without_the_file() {
        let state = BatchState::new("out").with_files(["a.csv", "b.csv", "c.csv"]);
        let state = state.remove(Path::new("b.csv"));

        assert_eq!(state.files(), [PathBuf::from("a.csv"), PathBuf::from("c.csv")]);
        assert_eq!(state.output_dir(), Path::new("out"));
    }

    #[test]
    fn add_files_appends_in_order_and_clear_empties() {
        let mut state = BatchState::new("out").with_files(["b.csv"]);
        state.add_files(["a.csv", "c.csv"]);
        assert_eq!(
            state.files(),
            [
                PathBuf::from("b.csv"),
                PathBuf::from("a.csv"),
                PathBuf::from("c.csv")
            ]
        );

        let state = state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn output_path_lands_in_output_dir() {
        let state = BatchState::new("/srv/reports");
        assert_eq!(
            state.output_path_for(Path::new("/data/ks_2022.csv")),
            PathBuf::from("/srv/reports/ks_2022_processed.csv")
        );
    }

    #[test]
    fn default_output_dir_is_parent_of_last_file() {
        let files = vec![PathBuf::from("/a/one.csv"), PathBuf::from("/b/two.csv")];
        assert_eq!(default_output_dir(&files), Some(PathBuf::from("/b")));
        assert_eq!(
            default_output_dir(&[PathBuf::from("bare.csv")]),
            Some(PathBuf::from("."))
        );
        assert_eq!(default_output_dir(&[]), None);
    }

    #[test]
    fn empty_batch_still_completes_once() {
        struct Counting(usize);
        impl BatchHost for Counting {
            fn resolve_mismatch(&mut self, _error: &SchemaError) -> MismatchDecision {
                MismatchDecision::Abort
            }
            fn batch_complete(&mut self, _report: &BatchReport) {
                self.0 += 1;
            }
        }

        let mut host = Counting(0);
        let report = run_batch(BatchState::new("out"), &mut host).unwrap();
        assert_eq!(host.0, 1);
        assert!(report.processed.is_empty());
        assert!(report.remaining.is_empty());
        assert!(!report.aborted);
    }
}
