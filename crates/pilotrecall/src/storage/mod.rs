//! Storage layer for pilotrecall.
//!
//! This module provides `SQLite`-based persistent storage for recall items
//! and flight lists. It is the synchronous substrate underneath
//! [`crate::repository`]: it assigns identifiers, stamps timestamps and
//! stores whatever it is given without validation.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    now_millis, Attachment, FlightList, FlightListChanges, FlightListDraft, FlightStatus,
    RecallItem, RecallItemChanges, RecallItemDraft, RememberedFlight,
};
use crate::phase::FlightPhase;

/// Metadata key recording whether durable storage was granted.
const PERSISTENCE_KEY: &str = "persistence_granted";

/// Metadata key remembering the last active flight.
const ACTIVE_FLIGHT_KEY: &str = "active_flight_id";
const NO_ACTIVE_FLIGHT: &str = "none";

const RECALL_COLUMNS: &str = "id, title, description, phases, reference, threats, is_tier1, \
     is_deeplink, attachment_type, attachment, created_at, updated_at";

const FLIGHT_COLUMNS: &str = "id, from_airport, to_airport, departure_time, arrival_time, \
     title, status, active_item_ids, notes, created_at, updated_at";

/// Storage engine for recall items and flight lists.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
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
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Recall items ===

    /// Insert a recall item, stamping both timestamps with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_recall_item(&self, draft: &RecallItemDraft) -> Result<i64> {
        let now = now_millis();
        let (attachment_type, attachment) = split_attachment(draft.attachment.as_ref());

        self.conn.execute(
            r"
            INSERT INTO recall_items (title, description, phases, reference, threats,
                is_tier1, is_deeplink, attachment_type, attachment, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ",
            params![
                draft.title,
                draft.description,
                serde_json::to_string(&draft.phases)?,
                draft.reference,
                serde_json::to_string(&draft.threats)?,
                draft.is_tier1,
                draft.is_deeplink,
                attachment_type,
                attachment,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted recall item with id {}", id);
        Ok(id)
    }

    /// Get a recall item by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row cannot be decoded.
    pub fn get_recall_item(&self, id: i64) -> Result<Option<RecallItem>> {
        self.conn
            .query_row(
                &format!("SELECT {RECALL_COLUMNS} FROM recall_items WHERE id = ?1"),
                [id],
                RecallRow::from_row,
            )
            .optional()?
            .map(RecallRow::decode)
            .transpose()
    }

    /// Get every recall item, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row cannot be decoded.
    pub fn all_recall_items(&self) -> Result<Vec<RecallItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {RECALL_COLUMNS} FROM recall_items ORDER BY id"))?;

        let rows = stmt
            .query_map([], RecallRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(RecallRow::decode).collect()
    }

    /// Merge `changes` into a stored recall item and refresh `updated_at`.
    ///
    /// Returns the updated record, or `None` if the ID does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_recall_item(
        &self,
        id: i64,
        changes: &RecallItemChanges,
    ) -> Result<Option<RecallItem>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(mut item) = self.get_recall_item(id)? else {
            return Ok(None);
        };

        changes.apply_to(&mut item);
        item.updated_at = now_millis().max(item.created_at);
        let (attachment_type, attachment) = split_attachment(item.attachment.as_ref());

        tx.execute(
            r"
            UPDATE recall_items SET title = ?2, description = ?3, phases = ?4, reference = ?5,
                threats = ?6, is_tier1 = ?7, is_deeplink = ?8, attachment_type = ?9,
                attachment = ?10, updated_at = ?11
            WHERE id = ?1
            ",
            params![
                id,
                item.title,
                item.description,
                serde_json::to_string(&item.phases)?,
                item.reference,
                serde_json::to_string(&item.threats)?,
                item.is_tier1,
                item.is_deeplink,
                attachment_type,
                attachment,
                item.updated_at,
            ],
        )?;
        tx.commit()?;

        debug!("Updated recall item {}", id);
        Ok(Some(item))
    }

    /// Delete a recall item by ID.
    ///
    /// Returns `true` if an item was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_recall_item(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM recall_items WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count stored recall items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_recall_items(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM recall_items", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Flight lists ===

    /// Insert a flight list, stamping both timestamps with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_flight_list(&self, draft: &FlightListDraft) -> Result<i64> {
        let now = now_millis();

        self.conn.execute(
            r"
            INSERT INTO flight_lists (from_airport, to_airport, departure_time, arrival_time,
                title, status, active_item_ids, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ",
            params![
                draft.from_airport,
                draft.to_airport,
                draft.departure_time,
                draft.arrival_time,
                draft.title,
                draft.status.as_str(),
                serde_json::to_string(&draft.active_item_ids)?,
                draft.notes,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted flight list with id {}", id);
        Ok(id)
    }

    /// Get a flight list by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row cannot be decoded.
    pub fn get_flight_list(&self, id: i64) -> Result<Option<FlightList>> {
        self.conn
            .query_row(
                &format!("SELECT {FLIGHT_COLUMNS} FROM flight_lists WHERE id = ?1"),
                [id],
                FlightRow::from_row,
            )
            .optional()?
            .map(FlightRow::decode)
            .transpose()
    }

    /// Get every flight list, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row cannot be decoded.
    pub fn all_flight_lists(&self) -> Result<Vec<FlightList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FLIGHT_COLUMNS} FROM flight_lists ORDER BY id"))?;

        let rows = stmt
            .query_map([], FlightRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(FlightRow::decode).collect()
    }

    /// Merge `changes` into a stored flight list and refresh `updated_at`.
    ///
    /// Returns the updated record, or `None` if the ID does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_flight_list(
        &self,
        id: i64,
        changes: &FlightListChanges,
    ) -> Result<Option<FlightList>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(mut flight) = self.get_flight_list(id)? else {
            return Ok(None);
        };

        changes.apply_to(&mut flight);
        flight.updated_at = now_millis().max(flight.created_at);

        tx.execute(
            r"
            UPDATE flight_lists SET from_airport = ?2, to_airport = ?3, departure_time = ?4,
                arrival_time = ?5, title = ?6, status = ?7, active_item_ids = ?8, notes = ?9,
                updated_at = ?10
            WHERE id = ?1
            ",
            params![
                id,
                flight.from_airport,
                flight.to_airport,
                flight.departure_time,
                flight.arrival_time,
                flight.title,
                flight.status.as_str(),
                serde_json::to_string(&flight.active_item_ids)?,
                flight.notes,
                flight.updated_at,
            ],
        )?;
        tx.commit()?;

        debug!("Updated flight list {}", id);
        Ok(Some(flight))
    }

    /// Delete a flight list by ID.
    ///
    /// Returns `true` if a flight was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_flight_list(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM flight_lists WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count stored flight lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_flight_lists(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM flight_lists", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Maintenance ===

    /// Delete every recall item and flight list in one transaction.
    ///
    /// Identifiers are not reused afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let items = tx.execute("DELETE FROM recall_items", [])?;
        let flights = tx.execute("DELETE FROM flight_lists", [])?;
        tx.commit()?;

        info!("Cleared {} recall items and {} flight lists", items, flights);
        Ok(())
    }

    /// Record whether durable storage was granted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_persistence_granted(&self, granted: bool) -> Result<()> {
        self.set_metadata(PERSISTENCE_KEY, Some(&granted.to_string()))
    }

    /// Whether durable storage was granted, or `None` if never requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn persistence_granted(&self) -> Result<Option<bool>> {
        Ok(self.metadata(PERSISTENCE_KEY)?.map(|v| v == "true"))
    }

    /// Remember which flight was last made active. `None` records that the
    /// active flight was cleared on purpose.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_active_flight_id(&self, id: Option<i64>) -> Result<()> {
        let value = id.map_or_else(|| NO_ACTIVE_FLIGHT.to_string(), |id| id.to_string());
        self.set_metadata(ACTIVE_FLIGHT_KEY, Some(&value))
    }

    /// Forget the remembered active flight entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn forget_active_flight_id(&self) -> Result<()> {
        self.set_metadata(ACTIVE_FLIGHT_KEY, None)
    }

    /// The remembered active flight. The flight itself may no longer exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn active_flight_id(&self) -> Result<RememberedFlight> {
        let Some(value) = self.metadata(ACTIVE_FLIGHT_KEY)? else {
            return Ok(RememberedFlight::Unset);
        };
        if value == NO_ACTIVE_FLIGHT {
            return Ok(RememberedFlight::Cleared);
        }
        match value.parse() {
            Ok(id) => Ok(RememberedFlight::Flight(id)),
            Err(_) => {
                warn!("Ignoring unreadable active flight id: {}", value);
                Ok(RememberedFlight::Unset)
            }
        }
    }

    fn metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_metadata(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.conn.execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                (key, value),
            )?,
            None => self
                .conn
                .execute("DELETE FROM metadata WHERE key = ?1", [key])?,
        };
        Ok(())
    }

    /// Whether the database lives in memory and vanishes on close.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            recall_items: self.count_recall_items()?,
            flight_lists: self.count_flight_lists()?,
            schema_version: migrations::schema_version(&self.conn)?,
            persistence_granted: self.persistence_granted()?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of recall items stored.
    pub recall_items: i64,
    /// Number of flight lists stored.
    pub flight_lists: i64,
    /// Schema version recorded in the database.
    pub schema_version: i32,
    /// Durable-storage grant, if it was ever requested.
    pub persistence_granted: Option<bool>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn split_attachment(attachment: Option<&Attachment>) -> (Option<&str>, Option<&[u8]>) {
    attachment.map_or((None, None), |a| {
        (Some(a.media_type.as_str()), Some(a.data.as_slice()))
    })
}

fn decode_json<T: DeserializeOwned>(
    table: &'static str,
    id: i64,
    column: &str,
    raw: &str,
) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::corrupt(table, id, format!("{column}: {e}")))
}

/// Raw column values of a `recall_items` row.
struct RecallRow {
    id: i64,
    title: String,
    description: String,
    phases: String,
    reference: String,
    threats: String,
    is_tier1: bool,
    is_deeplink: bool,
    attachment_type: Option<String>,
    attachment: Option<Vec<u8>>,
    created_at: i64,
    updated_at: i64,
}

impl RecallRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            phases: row.get(3)?,
            reference: row.get(4)?,
            threats: row.get(5)?,
            is_tier1: row.get(6)?,
            is_deeplink: row.get(7)?,
            attachment_type: row.get(8)?,
            attachment: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn decode(self) -> Result<RecallItem> {
        let phases: Vec<FlightPhase> =
            decode_json("recall_items", self.id, "phases", &self.phases)?;
        let threats: Vec<String> = decode_json("recall_items", self.id, "threats", &self.threats)?;

        let attachment = match (self.attachment_type, self.attachment) {
            (Some(media_type), Some(data)) => Some(Attachment { media_type, data }),
            (None, Some(data)) => Some(Attachment::new("application/octet-stream", data)),
            _ => None,
        };

        Ok(RecallItem {
            id: self.id,
            title: self.title,
            description: self.description,
            phases,
            reference: self.reference,
            threats,
            is_tier1: self.is_tier1,
            is_deeplink: self.is_deeplink,
            attachment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Raw column values of a `flight_lists` row.
struct FlightRow {
    id: i64,
    from_airport: String,
    to_airport: String,
    departure_time: i64,
    arrival_time: i64,
    title: String,
    status: String,
    active_item_ids: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl FlightRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            from_airport: row.get(1)?,
            to_airport: row.get(2)?,
            departure_time: row.get(3)?,
            arrival_time: row.get(4)?,
            title: row.get(5)?,
            status: row.get(6)?,
            active_item_ids: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn decode(self) -> Result<FlightList> {
        let active_item_ids: Vec<i64> =
            decode_json("flight_lists", self.id, "active_item_ids", &self.active_item_ids)?;

        let status = self.status.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown flight status '{}' on flight {}, defaulting to live",
                self.status, self.id
            );
            FlightStatus::Live
        });

        Ok(FlightList {
            id: self.id,
            from_airport: self.from_airport,
            to_airport: self.to_airport,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            title: self.title,
            status,
            active_item_ids,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
