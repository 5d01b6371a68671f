use std::path::Path;

use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use chrono::SecondsFormat;
use rust_xlsxwriter::Workbook;

use super::{row_error, BlastLogRow};
use crate::error::RoyaltyError;
use crate::models::RoyaltyRecord;

const RECORD_HEADERS: [&str; 13] = [
    "id",
    "miner_id",
    "water_gel",
    "nh4no3",
    "powder_factor",
    "total_explosive_quantity",
    "basic_volume",
    "blasted_rock_volume",
    "base_royalty",
    "royalty_with_sscl",
    "total_amount",
    "calculation_date",
    "payment_due_date",
];

struct BlastColumns {
    water_gel: usize,
    nh4no3: usize,
    powder_factor: usize,
    label: Option<usize>,
}

impl BlastColumns {
    fn from_header(header: &[Data]) -> Result<Self, RoyaltyError> {
        let find = |name: &str| {
            header.iter().position(|cell| {
                cell.as_string()
                    .is_some_and(|s| s.trim().eq_ignore_ascii_case(name))
            })
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                RoyaltyError::Excel(format!("Blast log sheet is missing the '{name}' column"))
            })
        };
        Ok(Self {
            water_gel: require("water_gel")?,
            nh4no3: require("nh4no3")?,
            powder_factor: require("powder_factor")?,
            label: find("label"),
        })
    }
}

fn number_cell(row: &[Data], idx: usize, name: &str, row_no: usize) -> Result<f64, RoyaltyError> {
    row.get(idx)
        .filter(|c| !c.is_empty())
        .and_then(|c| c.as_f64())
        .ok_or_else(|| {
            RoyaltyError::InvalidInput(format!("Row {row_no}: {name} must be a number"))
        })
}

/// Read a blast log from the first sheet of an Excel (.xlsx) workbook.
///
/// The first row is a header naming `water_gel`, `nh4no3` and `powder_factor`
/// (any order, any case) and optionally `label`. Blank rows are skipped.
pub fn read_blast_log_excel(path: impl AsRef<Path>) -> Result<Vec<BlastLogRow>, RoyaltyError> {
    let mut workbook: Xlsx<_> = open_workbook(path.as_ref())?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| RoyaltyError::Excel("No sheets found in workbook".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = BlastColumns::from_header(header)?;

    // Row numbers count data rows below the header, blank ones included, so
    // they match what the user sees in the sheet.
    let mut log = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        let row_no = i + 1;
        let blast = BlastLogRow {
            label: columns
                .label
                .and_then(|idx| row.get(idx))
                .and_then(|c| c.as_string())
                .filter(|s| !s.trim().is_empty()),
            water_gel: number_cell(row, columns.water_gel, "water_gel", row_no)?,
            nh4no3: number_cell(row, columns.nh4no3, "nh4no3", row_no)?,
            powder_factor: number_cell(row, columns.powder_factor, "powder_factor", row_no)?,
        };
        blast.input().validate().map_err(|e| row_error(row_no, e))?;
        log.push(blast);
    }

    Ok(log)
}

/// Write saved records to an Excel (.xlsx) file, one row per record.
pub fn write_records_excel(
    records: &[RoyaltyRecord],
    path: impl AsRef<Path>,
) -> Result<(), RoyaltyError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Royalties")?;

    for (col, header) in RECORD_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, record.id.to_string())?;
        worksheet.write_string(row, 1, &record.miner_id)?;
        let numbers = [
            record.water_gel,
            record.nh4no3,
            record.powder_factor,
            record.total_explosive_quantity,
            record.basic_volume,
            record.blasted_rock_volume,
            record.base_royalty,
            record.royalty_with_sscl,
            record.total_amount,
        ];
        for (offset, value) in numbers.into_iter().enumerate() {
            worksheet.write_number(row, 2 + offset as u16, value)?;
        }
        worksheet.write_string(
            row,
            11,
            record
                .calculation_date
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        worksheet.write_string(
            row,
            12,
            record
                .payment_due_date
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
    }

    workbook.save(path.as_ref())?;
    Ok(())
}
