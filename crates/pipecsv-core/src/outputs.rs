use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pipecsv_parser::EXPORT_HEADINGS;

use crate::aggregate::OutputTable;
use crate::error::{ProcessError, Result};

/// `<output_dir>/<input_stem>_processed.csv`
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{stem}_processed.csv"))
}

/// Serializes `table` as CSV. The header row is written even when there are no rows.
pub fn write_csv<W: Write>(table: &OutputTable, writer: W) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(EXPORT_HEADINGS)?;
    for row in table.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `table` to `path`, replacing any existing file.
///
/// The CSV is staged next to the destination and renamed into place, so a
/// failed write never leaves a truncated output behind.
pub fn write_summary(table: &OutputTable, path: &Path) -> Result<()> {
    let staging = staging_path(path);

    let outcome = fs::File::create(&staging)
        .map_err(|source| ProcessError::Io {
            path: staging.clone(),
            source,
        })
        .and_then(|file| {
            write_csv(table, file).map_err(|source| ProcessError::Csv {
                path: path.to_path_buf(),
                source,
            })
        })
        .and_then(|()| {
            fs::rename(&staging, path).map_err(|source| ProcessError::Io {
                path: path.to_path_buf(),
                source,
            })
        });

    if outcome.is_err() {
        let _ = fs::remove_file(&staging);
    }
    outcome
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_uses_input_stem() {
        let path = output_path(Path::new("/reports/out"), Path::new("/data/in/tx_2023.csv"));
        assert_eq!(path, PathBuf::from("/reports/out/tx_2023_processed.csv"));

        let path = output_path(Path::new("out"), Path::new("archive.2021.csv"));
        assert_eq!(path, PathBuf::from("out/archive.2021_processed.csv"));
    }

    #[test]
    fn empty_table_still_writes_header() {
        let mut buffer = Vec::new();
        write_csv(&OutputTable::default(), &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Operator ID,Operator Business Name,Pipeline Miles,HCA Miles,\
             Total Assessments Completed in Year,Total HCA Repairs\n"
        );
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing_dir").join("out.csv");

        let err = write_summary(&OutputTable::default(), &target).unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        assert!(!target.exists());
        assert!(!staging_path(&target).exists());
    }
}
