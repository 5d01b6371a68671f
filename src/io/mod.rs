mod csv_io;
mod excel_io;
mod json_io;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RoyaltyError;
use crate::models::{RoyaltyCalculationInput, RoyaltyRecord};

pub use csv_io::{
    read_blast_log_csv, read_blast_log_csv_from_bytes, write_records_csv, write_records_csv_to,
};
pub use excel_io::{read_blast_log_excel, write_records_excel};
pub use json_io::{read_blast_log_json, read_blast_log_json_from_bytes, write_records_json};

/// One blast from a blast log: the three measurements plus an optional label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastLogRow {
    #[serde(default)]
    pub label: Option<String>,
    pub water_gel: f64,
    pub nh4no3: f64,
    pub powder_factor: f64,
}

impl BlastLogRow {
    pub fn input(&self) -> RoyaltyCalculationInput {
        RoyaltyCalculationInput::new(self.water_gel, self.nh4no3, self.powder_factor)
    }
}

/// Prefix an input error with the 1-based row it came from.
pub(crate) fn row_error(row: usize, err: RoyaltyError) -> RoyaltyError {
    match err {
        RoyaltyError::InvalidInput(msg) => RoyaltyError::InvalidInput(format!("Row {row}: {msg}")),
        other => other,
    }
}

/// Fail on the first row whose measurements are not usable.
pub(crate) fn validate_rows(rows: &[BlastLogRow]) -> Result<(), RoyaltyError> {
    for (i, row) in rows.iter().enumerate() {
        row.input().validate().map_err(|e| row_error(i + 1, e))?;
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Read a blast log, choosing the format from the file extension.
pub fn read_blast_log(path: impl AsRef<Path>) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let path = path.as_ref();
    reader_for_path(path)?.read(path)
}

/// Trait for reading blast logs from a file.
pub trait BlastLogReader {
    fn read(&self, path: &Path) -> Result<Vec<BlastLogRow>, RoyaltyError>;
}

/// Trait for writing saved royalty records to a file.
pub trait RecordWriter {
    fn write(&self, records: &[RoyaltyRecord], path: &Path) -> Result<(), RoyaltyError>;
}

/// CSV format reader/writer.
pub struct CsvFormat;

impl BlastLogReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<Vec<BlastLogRow>, RoyaltyError> {
        read_blast_log_csv(path)
    }
}

impl RecordWriter for CsvFormat {
    fn write(&self, records: &[RoyaltyRecord], path: &Path) -> Result<(), RoyaltyError> {
        write_records_csv(records, path)
    }
}

/// JSON format reader/writer.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl BlastLogReader for JsonFormat {
    fn read(&self, path: &Path) -> Result<Vec<BlastLogRow>, RoyaltyError> {
        read_blast_log_json(path)
    }
}

impl RecordWriter for JsonFormat {
    fn write(&self, records: &[RoyaltyRecord], path: &Path) -> Result<(), RoyaltyError> {
        write_records_json(records, path, self.pretty)
    }
}

/// Excel (.xlsx) format reader/writer.
pub struct ExcelFormat;

impl BlastLogReader for ExcelFormat {
    fn read(&self, path: &Path) -> Result<Vec<BlastLogRow>, RoyaltyError> {
        read_blast_log_excel(path)
    }
}

impl RecordWriter for ExcelFormat {
    fn write(&self, records: &[RoyaltyRecord], path: &Path) -> Result<(), RoyaltyError> {
        write_records_excel(records, path)
    }
}

fn reader_for_path(path: &Path) -> Result<Box<dyn BlastLogReader>, RoyaltyError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat::default())),
        "xlsx" => Ok(Box::new(ExcelFormat)),
        other => Err(RoyaltyError::InvalidInput(format!(
            "Unsupported blast log format '{other}' (expected csv, json or xlsx)"
        ))),
    }
}

/// Pick a record writer from the output file extension.
pub fn writer_for_path(path: &Path, pretty: bool) -> Result<Box<dyn RecordWriter>, RoyaltyError> {
    match extension(path).as_str() {
        "csv" => Ok(Box::new(CsvFormat)),
        "json" => Ok(Box::new(JsonFormat { pretty })),
        "xlsx" => Ok(Box::new(ExcelFormat)),
        other => Err(RoyaltyError::InvalidInput(format!(
            "Unsupported export format '{other}' (expected csv, json or xlsx)"
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_records;
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("blasts.CSV");
        std::fs::write(&csv_path, "water_gel,nh4no3,powder_factor\n100,50,0.4\n").unwrap();
        let json_path = dir.path().join("blasts.json");
        std::fs::write(
            &json_path,
            r#"[{"water_gel": 100, "nh4no3": 50, "powder_factor": 0.4}]"#,
        )
        .unwrap();

        let from_csv = read_blast_log(&csv_path).unwrap();
        let from_json = read_blast_log(&json_path).unwrap();
        assert_eq!(from_csv, from_json);
        assert_eq!(from_csv[0].input(), RoyaltyCalculationInput::new(100.0, 50.0, 0.4));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_blast_log("blasts.txt").unwrap_err();
        assert!(err.to_string().contains("Unsupported blast log format 'txt'"));
        assert!(writer_for_path(Path::new("out.pdf"), false).is_err());
    }

    #[test]
    fn test_validate_rows_reports_first_bad_row() {
        let rows = vec![
            BlastLogRow {
                label: None,
                water_gel: 1.0,
                nh4no3: 1.0,
                powder_factor: 0.4,
            },
            BlastLogRow {
                label: None,
                water_gel: 1.0,
                nh4no3: -2.0,
                powder_factor: 0.4,
            },
            BlastLogRow {
                label: None,
                water_gel: f64::NAN,
                nh4no3: 1.0,
                powder_factor: 0.4,
            },
        ];
        let err = validate_rows(&rows).unwrap_err();
        assert!(err.to_string().contains("Row 2: nh4no3 must not be negative"));
    }

    #[test]
    fn test_writer_trait_objects() {
        let records = sample_records();
        let dir = tempfile::tempdir().unwrap();
        for name in ["out.csv", "out.json", "out.xlsx"] {
            let path = dir.path().join(name);
            let writer = writer_for_path(&path, true).unwrap();
            writer.write(&records, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_json_format_default() {
        assert!(!JsonFormat::default().pretty);
    }
}
