//! Local record store for carelog.
//!
//! This module defines the [`RecordStore`] contract consumed by the
//! resolver and aggregator, and provides the `SQLite`-based on-device
//! implementation backing it. All state is local-device persisted state;
//! no synchronization to any remote system happens here.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{EntityKind, InsuranceCard, Measurement, StoredRecord};
use crate::validate::{validate_card, validate_measurement};

/// The asynchronous keyed store of clinical entities.
///
/// Implementations are queryable by record id and by patient id, and
/// persist via insert-or-update semantics. Saving validates the record
/// against its instrument domain first; validation failures are surfaced
/// to the caller, never recovered locally.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a single record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record exists under the id, or a
    /// store error if the underlying local I/O fails.
    async fn find(&self, id: &str) -> Result<StoredRecord>;

    /// Fetch all records of the given kind belonging to a patient.
    ///
    /// # Errors
    ///
    /// Returns a store error if the underlying local I/O fails.
    async fn query_by_patient(
        &self,
        patient_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<StoredRecord>>;

    /// Persist a record: insert if the id is new, update otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the record fails its instrument
    /// domain check, or a store error if persisting fails.
    async fn save(&self, record: StoredRecord) -> Result<StoredRecord>;

    /// Delete a record by id.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns a store error if the underlying local I/O fails.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// `SQLite`-backed record store.
///
/// Access is serialized through a mutex-guarded connection; each store
/// operation completes fully before its result is produced, so no partial
/// reads are ever exposed.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a record database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening record database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Record database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count all records of the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, kind: EntityKind) -> Result<i64> {
        let table = table_for(kind);
        let count: i64 =
            self.conn()
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_measurement(&self, id: &str) -> Result<Option<Measurement>> {
        let result = self
            .conn()
            .query_row(
                r"
                SELECT id, patient_id, measurement_type, target, side, value,
                       recorded_at, recorded_by
                FROM measurements WHERE id = ?1
                ",
                [id],
                row_to_measurement,
            )
            .optional()?;
        Ok(result)
    }

    fn find_card(&self, id: &str) -> Result<Option<InsuranceCard>> {
        let result = self
            .conn()
            .query_row(
                r"
                SELECT id, patient_id, provider, policy_number, plan, expires_at, updated_at
                FROM insurance_cards WHERE id = ?1
                ",
                [id],
                row_to_card,
            )
            .optional()?;
        Ok(result)
    }

    fn insert_measurement(&self, measurement: &Measurement) -> Result<()> {
        self.conn().execute(
            r"
            INSERT OR REPLACE INTO measurements
                (id, patient_id, measurement_type, target, side, value, recorded_at, recorded_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                measurement.id,
                measurement.patient_id,
                measurement.measurement_type.to_string(),
                measurement.target,
                measurement.side.to_string(),
                measurement.value,
                measurement.recorded_at.to_rfc3339(),
                measurement.recorded_by,
            ],
        )?;
        Ok(())
    }

    fn insert_card(&self, card: &InsuranceCard) -> Result<()> {
        self.conn().execute(
            r"
            INSERT OR REPLACE INTO insurance_cards
                (id, patient_id, provider, policy_number, plan, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                card.id,
                card.patient_id,
                card.provider,
                card.policy_number,
                card.plan,
                card.expires_at.map(|t| t.to_rfc3339()),
                card.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find(&self, id: &str) -> Result<StoredRecord> {
        if let Some(measurement) = self.find_measurement(id)? {
            return Ok(StoredRecord::Measurement(measurement));
        }
        if let Some(card) = self.find_card(id)? {
            return Ok(StoredRecord::InsuranceCard(card));
        }
        Err(Error::not_found(id))
    }

    async fn query_by_patient(
        &self,
        patient_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<StoredRecord>> {
        match kind {
            EntityKind::Measurement => {
                let conn = self.conn();
                let mut stmt = conn.prepare(
                    r"
                    SELECT id, patient_id, measurement_type, target, side, value,
                           recorded_at, recorded_by
                    FROM measurements WHERE patient_id = ?1
                    ORDER BY recorded_at ASC, id ASC
                    ",
                )?;
                let measurements = stmt
                    .query_map([patient_id], row_to_measurement)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(measurements
                    .into_iter()
                    .map(StoredRecord::Measurement)
                    .collect())
            }
            EntityKind::InsuranceCard => {
                let conn = self.conn();
                let mut stmt = conn.prepare(
                    r"
                    SELECT id, patient_id, provider, policy_number, plan, expires_at, updated_at
                    FROM insurance_cards WHERE patient_id = ?1
                    ORDER BY updated_at DESC, id ASC
                    ",
                )?;
                let cards = stmt
                    .query_map([patient_id], row_to_card)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(cards.into_iter().map(StoredRecord::InsuranceCard).collect())
            }
        }
    }

    async fn save(&self, record: StoredRecord) -> Result<StoredRecord> {
        match &record {
            StoredRecord::Measurement(measurement) => {
                validate_measurement(measurement)?;
                self.insert_measurement(measurement)?;
                debug!("Saved measurement {}", measurement.id);
            }
            StoredRecord::InsuranceCard(card) => {
                validate_card(card)?;
                self.insert_card(card)?;
                debug!("Saved insurance card {}", card.id);
            }
        }
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM measurements WHERE id = ?1", [id])?;
        if affected > 0 {
            return Ok(true);
        }
        let affected = self
            .conn()
            .execute("DELETE FROM insurance_cards WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Measurement => "measurements",
        EntityKind::InsuranceCard => "insurance_cards",
    }
}

/// Convert a database row to a Measurement.
fn row_to_measurement(row: &rusqlite::Row) -> rusqlite::Result<Measurement> {
    let measurement_type: String = row.get(2)?;
    let side: String = row.get(4)?;
    let recorded_at: String = row.get(6)?;

    Ok(Measurement {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        measurement_type: parse_column(2, &measurement_type)?,
        target: row.get(3)?,
        side: parse_column(4, &side)?,
        value: row.get(5)?,
        recorded_at: parse_timestamp(6, &recorded_at)?,
        recorded_by: row.get(7)?,
    })
}

/// Convert a database row to an `InsuranceCard`.
fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<InsuranceCard> {
    let expires_at: Option<String> = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(InsuranceCard {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        provider: row.get(2)?,
        policy_number: row.get(3)?,
        plan: row.get(4)?,
        expires_at: expires_at
            .as_deref()
            .map(|raw| parse_timestamp(5, raw))
            .transpose()?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

fn parse_column<T: std::str::FromStr<Err = Error>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    raw.parse().map_err(|err: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}
