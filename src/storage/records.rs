use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::RoyaltyError;
use crate::models::RoyaltyRecord;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS royalty (
    id                       TEXT PRIMARY KEY,
    miner_id                 TEXT NOT NULL,
    water_gel                REAL NOT NULL,
    nh4no3                   REAL NOT NULL,
    powder_factor            REAL NOT NULL,
    total_explosive_quantity REAL NOT NULL,
    basic_volume             REAL NOT NULL,
    blasted_rock_volume      REAL NOT NULL,
    base_royalty             REAL NOT NULL,
    royalty_with_sscl        REAL NOT NULL,
    total_amount             REAL NOT NULL,
    calculation_date         TEXT NOT NULL,
    payment_due_date         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS royalty_miner_idx ON royalty (miner_id);
";

const COLUMNS: &str = "id, miner_id, water_gel, nh4no3, powder_factor, \
    total_explosive_quantity, basic_volume, blasted_rock_volume, base_royalty, \
    royalty_with_sscl, total_amount, calculation_date, payment_due_date";

/// SQLite-backed store of saved royalty calculations.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

/// Row as stored; text columns still need parsing.
struct RawRecord {
    id: String,
    miner_id: String,
    numbers: [f64; 9],
    calculation_date: String,
    payment_due_date: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            miner_id: row.get(1)?,
            numbers: [
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ],
            calculation_date: row.get(11)?,
            payment_due_date: row.get(12)?,
        })
    }

    fn into_record(self) -> Result<RoyaltyRecord, RoyaltyError> {
        let [
            water_gel,
            nh4no3,
            powder_factor,
            total_explosive_quantity,
            basic_volume,
            blasted_rock_volume,
            base_royalty,
            royalty_with_sscl,
            total_amount,
        ] = self.numbers;
        Ok(RoyaltyRecord {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| RoyaltyError::ParseError(format!("Invalid record id: {e}")))?,
            miner_id: self.miner_id,
            water_gel,
            nh4no3,
            powder_factor,
            total_explosive_quantity,
            basic_volume,
            blasted_rock_volume,
            base_royalty,
            royalty_with_sscl,
            total_amount,
            calculation_date: parse_timestamp(&self.calculation_date)?,
            payment_due_date: parse_timestamp(&self.payment_due_date)?,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed width so text ordering matches chronological ordering.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RoyaltyError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RoyaltyError::ParseError(format!("Invalid timestamp '{s}': {e}")))
}

impl RecordStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RoyaltyError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, RoyaltyError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, RoyaltyError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Save a record. Rejects a second record for the same miner with the same
    /// measurements and total.
    pub fn insert(&self, record: &RoyaltyRecord) -> Result<(), RoyaltyError> {
        let conn = self.lock();
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM royalty
             WHERE miner_id = ?1 AND water_gel = ?2 AND nh4no3 = ?3
               AND powder_factor = ?4 AND total_amount = ?5",
            params![
                record.miner_id,
                record.water_gel,
                record.nh4no3,
                record.powder_factor,
                record.total_amount
            ],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(RoyaltyError::Duplicate(
                "This calculation has already been saved".to_string(),
            ));
        }

        conn.execute(
            &format!(
                "INSERT INTO royalty ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                record.id.to_string(),
                record.miner_id,
                record.water_gel,
                record.nh4no3,
                record.powder_factor,
                record.total_explosive_quantity,
                record.basic_volume,
                record.blasted_rock_volume,
                record.base_royalty,
                record.royalty_with_sscl,
                record.total_amount,
                format_timestamp(&record.calculation_date),
                format_timestamp(&record.payment_due_date),
            ],
        )?;
        info!(id = %record.id, miner_id = %record.miner_id, "royalty record saved");
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<RoyaltyRecord>, RoyaltyError> {
        let conn = self.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM royalty WHERE id = ?1"),
                params![id.to_string()],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// All records, newest calculation first, optionally for one miner.
    pub fn list(&self, miner_id: Option<&str>) -> Result<Vec<RoyaltyRecord>, RoyaltyError> {
        let conn = self.lock();
        let raws = match miner_id {
            Some(miner) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM royalty WHERE miner_id = ?1
                     ORDER BY calculation_date DESC"
                ))?;
                let rows = stmt.query_map(params![miner], RawRecord::from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM royalty ORDER BY calculation_date DESC"
                ))?;
                let rows = stmt.query_map([], RawRecord::from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        raws.into_iter().map(RawRecord::into_record).collect()
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete(&self, id: Uuid) -> Result<bool, RoyaltyError> {
        let conn = self.lock();
        let removed = conn.execute("DELETE FROM royalty WHERE id = ?1", params![id.to_string()])?;
        if removed > 0 {
            info!(%id, "royalty record deleted");
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(miner: &str, water_gel: f64, day: u32) -> RoyaltyRecord {
        let date = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
        RoyaltyRecord {
            id: Uuid::new_v4(),
            miner_id: miner.to_string(),
            water_gel,
            nh4no3: 50.0,
            powder_factor: 0.4,
            total_explosive_quantity: water_gel * 1.2 + 50.0,
            basic_volume: 425.0,
            blasted_rock_volume: 240.28,
            base_royalty: 57667.2,
            royalty_with_sscl: 59143.48032,
            total_amount: 69789.3067776 + water_gel,
            calculation_date: date,
            payment_due_date: date + Duration::days(14),
        }
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();
        let r = record("m-1", 100.0, 1);
        store.insert(&r).unwrap();
        let loaded = store.get(r.id).unwrap().unwrap();
        assert_eq!(loaded, r);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = RecordStore::open_in_memory().unwrap();
        let r = record("m-1", 100.0, 1);
        store.insert(&r).unwrap();

        let again = RoyaltyRecord {
            id: Uuid::new_v4(),
            ..r.clone()
        };
        let err = store.insert(&again).unwrap_err();
        assert!(matches!(err, RoyaltyError::Duplicate(_)));
        assert_eq!(store.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_same_blast_for_other_miner_allowed() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert(&record("m-1", 100.0, 1)).unwrap();
        store.insert(&record("m-2", 100.0, 1)).unwrap();
        assert_eq!(store.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_list_filters_and_orders_newest_first() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert(&record("m-1", 10.0, 3)).unwrap();
        store.insert(&record("m-1", 20.0, 9)).unwrap();
        store.insert(&record("m-2", 30.0, 5)).unwrap();

        let m1 = store.list(Some("m-1")).unwrap();
        assert_eq!(m1.len(), 2);
        assert_eq!(m1[0].water_gel, 20.0);
        assert_eq!(m1[1].water_gel, 10.0);

        let all = store.list(None).unwrap();
        let gels: Vec<f64> = all.iter().map(|r| r.water_gel).collect();
        assert_eq!(gels, vec![20.0, 30.0, 10.0]);
    }

    #[test]
    fn test_delete() {
        let store = RecordStore::open_in_memory().unwrap();
        let r = record("m-1", 10.0, 1);
        store.insert(&r).unwrap();
        assert!(store.delete(r.id).unwrap());
        assert!(!store.delete(r.id).unwrap());
        assert!(store.get(r.id).unwrap().is_none());
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("royalties.db");
        let r = record("m-9", 42.0, 2);
        {
            let store = RecordStore::open(&path).unwrap();
            store.insert(&r).unwrap();
        }
        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.list(Some("m-9")).unwrap(), vec![r]);
    }
}
