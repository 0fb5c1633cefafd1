use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info};
use crate::error::{EtlError, Result};
use crate::models::CarListing;
use crate::services::transform::ListingBatch;

pub const TABLE_NAME: &str = "fact_cars";

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS fact_cars (
    id               TEXT PRIMARY KEY,
    make             TEXT,
    model            TEXT,
    price            REAL    CHECK (price IS NULL OR price >= 0),
    distance         REAL    CHECK (distance IS NULL OR distance >= 0),
    price_per_1000km REAL    CHECK (price_per_1000km IS NULL OR price_per_1000km >= 0),
    model_year       INTEGER CHECK (model_year IS NULL OR model_year >= 1900),
    fuel             TEXT,
    body_type        TEXT,
    horsepower       INTEGER CHECK (horsepower IS NULL OR horsepower >= 0),
    registration     TEXT,
    load_ts          TEXT NOT NULL
)";

const UPSERT_SQL: &str = "
INSERT INTO fact_cars (
    id, make, model, price, distance, price_per_1000km,
    model_year, fuel, body_type, horsepower, registration, load_ts
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
ON CONFLICT(id) DO UPDATE SET
    make = excluded.make,
    model = excluded.model,
    price = excluded.price,
    distance = excluded.distance,
    price_per_1000km = excluded.price_per_1000km,
    model_year = excluded.model_year,
    fuel = excluded.fuel,
    body_type = excluded.body_type,
    horsepower = excluded.horsepower,
    registration = excluded.registration,
    load_ts = excluded.load_ts";

const SELECT_COLUMNS: &str = "id, make, model, price, distance, price_per_1000km, \
     model_year, fuel, body_type, horsepower, registration";

/// Owns the SQLite connection for the length of a run.
pub struct ListingStore {
    conn: Connection,
}

impl ListingStore {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening database {}", path.display());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                EtlError::StoreWrite(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            EtlError::from(e)
        })?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory database");
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(30))?;
        // journal_mode answers with the resulting mode ("memory" for in-memory databases).
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("journal_mode={}", mode);
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    pub fn init_schema(&self) -> Result<()> {
        debug!("Create table SQL: {}", CREATE_TABLE_SQL);
        self.conn.execute_batch(CREATE_TABLE_SQL).map_err(|e| {
            error!("Failed to create table {}: {}", TABLE_NAME, e);
            EtlError::from(e)
        })
    }

    /// Inserts new ids and overwrites every field of existing ones. Each statement commits
    /// on its own; a failure stops the load and leaves earlier rows in place.
    /// `load_ts` is stamped per call, so reloading the same batch changes only that column.
    /// Returns the number of records sent.
    pub fn upsert_batch(&self, batch: &ListingBatch) -> Result<usize> {
        let load_ts = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        info!("Load: upserting {} records into {}", batch.len(), TABLE_NAME);

        let mut stmt = self.conn.prepare_cached(UPSERT_SQL)?;
        let mut affected = 0;
        for listing in batch {
            stmt.execute(params![
                listing.id,
                listing.make,
                listing.model,
                listing.price,
                listing.distance,
                listing.price_per_1000km,
                listing.model_year,
                listing.fuel,
                listing.body_type,
                listing.horsepower,
                listing.registration,
                load_ts,
            ])
            .map_err(|e| {
                error!("Failed to upsert listing {}: {}", listing.id, e);
                EtlError::from(e)
            })?;
            affected += 1;
        }

        info!("Load: {} records upserted", affected);
        Ok(affected)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM fact_cars", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get(&self, id: &str) -> Result<Option<CarListing>> {
        let sql = format!("SELECT {} FROM fact_cars WHERE id = ?1", SELECT_COLUMNS);
        Ok(self.conn.query_row(&sql, [id], listing_from_row).optional()?)
    }

    pub fn fetch_all(&self) -> Result<Vec<CarListing>> {
        let sql = format!("SELECT {} FROM fact_cars ORDER BY id", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], listing_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn load_ts(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT load_ts FROM fact_cars WHERE id = ?1", [id], |row| row.get(0))
            .optional()?)
    }
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<CarListing> {
    Ok(CarListing {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        price: row.get(3)?,
        distance: row.get(4)?,
        price_per_1000km: row.get(5)?,
        model_year: row.get(6)?,
        fuel: row.get(7)?,
        body_type: row.get(8)?,
        horsepower: row.get(9)?,
        registration: row.get(10)?,
    })
}
