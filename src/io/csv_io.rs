use std::io::{Read, Write};
use std::path::Path;

use super::{validate_rows, BlastLogRow};
use crate::error::RoyaltyError;
use crate::models::RoyaltyRecord;

fn blast_log_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn parse_blast_log<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<BlastLogRow>, csv::Error>>()?;
    validate_rows(&rows)?;
    Ok(rows)
}

/// Read a blast log from a CSV file with a `water_gel,nh4no3,powder_factor`
/// header and an optional `label` column.
pub fn read_blast_log_csv(path: impl AsRef<Path>) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_blast_log(&mut blast_log_reader(file))
}

/// Read a blast log from CSV bytes.
pub fn read_blast_log_csv_from_bytes(data: &[u8]) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    parse_blast_log(&mut blast_log_reader(data))
}

/// Write saved records as CSV to any writer, one row per record.
pub fn write_records_csv_to<W: Write>(
    records: &[RoyaltyRecord],
    writer: W,
) -> Result<(), RoyaltyError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write saved records to a CSV file.
pub fn write_records_csv(
    records: &[RoyaltyRecord],
    path: impl AsRef<Path>,
) -> Result<(), RoyaltyError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_records_csv_to(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_support::sample_records;

    #[test]
    fn test_read_with_and_without_labels() {
        let data = b"label,water_gel,nh4no3,powder_factor\n\
                     Bench 1, 100 ,50,0.4\n\
                     ,20,10,0\n";
        let rows = read_blast_log_csv_from_bytes(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label.as_deref(), Some("Bench 1"));
        assert_eq!(rows[0].water_gel, 100.0);
        assert_eq!(rows[1].label, None);
        assert_eq!(rows[1].powder_factor, 0.0);

        let unlabeled = read_blast_log_csv_from_bytes(b"water_gel,nh4no3,powder_factor\n1,2,3\n")
            .unwrap();
        assert_eq!(unlabeled[0].label, None);
    }

    #[test]
    fn test_negative_value_reports_row() {
        let data = b"water_gel,nh4no3,powder_factor\n1,2,0.4\n1,2,0.4\n-5,2,0.4\n";
        let err = read_blast_log_csv_from_bytes(data).unwrap_err();
        assert!(matches!(err, RoyaltyError::InvalidInput(_)));
        assert!(err.to_string().contains("Row 3: water_gel"));
    }

    #[test]
    fn test_non_numeric_value_is_csv_error() {
        let data = b"water_gel,nh4no3,powder_factor\nabc,2,0.4\n";
        let err = read_blast_log_csv_from_bytes(data).unwrap_err();
        assert!(matches!(err, RoyaltyError::Csv(_)));
    }

    #[test]
    fn test_empty_log_is_empty() {
        let rows = read_blast_log_csv_from_bytes(b"water_gel,nh4no3,powder_factor\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_records_has_header_and_rows() {
        let mut buf = Vec::new();
        write_records_csv_to(&sample_records(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,miner_id,water_gel,nh4no3,powder_factor"));
        assert!(header.ends_with("calculation_date,payment_due_date"));
        assert_eq!(lines.count(), 2);
        assert!(text.contains("ML-001"));
        assert!(text.contains("2024-03-04T10:15:00Z"));
    }

    #[test]
    fn test_write_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        write_records_csv(&sample_records(), &path).unwrap();
        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.records().count(), 2);
    }
}
