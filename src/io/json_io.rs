use std::path::Path;

use super::{validate_rows, BlastLogRow};
use crate::error::RoyaltyError;
use crate::models::RoyaltyRecord;

/// Read a blast log from a JSON file holding an array of rows.
pub fn read_blast_log_json(path: impl AsRef<Path>) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let content = std::fs::read(path.as_ref())?;
    read_blast_log_json_from_bytes(&content)
}

/// Read a blast log from JSON bytes.
pub fn read_blast_log_json_from_bytes(data: &[u8]) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let content = std::str::from_utf8(data)
        .map_err(|e| RoyaltyError::ParseError(format!("Invalid UTF-8: {e}")))?;
    let rows: Vec<BlastLogRow> = serde_json::from_str(content)?;
    validate_rows(&rows)?;
    Ok(rows)
}

/// Write saved records to a JSON file as an array.
pub fn write_records_json(
    records: &[RoyaltyRecord],
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), RoyaltyError> {
    let content = if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}
