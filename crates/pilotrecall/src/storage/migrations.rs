//! Schema versioning for the pilotrecall database.
//!
//! Opening a database creates any missing tables, then applies every
//! migration newer than the version recorded in `metadata`, in order, inside
//! one transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

type Migration = fn(&Connection) -> Result<()>;

/// Ordered migrations; entry `n` brings the schema to version `n + 1`.
const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Create the schema and bring it up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if schema creation fails, the stored version cannot be
/// read, or the database is newer than this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for statement in SCHEMA_STATEMENTS {
        tx.execute(statement, [])?;
    }

    let version = schema_version(&tx)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for (index, migration) in MIGRATIONS.iter().enumerate().skip(to_index(version)) {
        let target = i32::try_from(index + 1).unwrap_or(i32::MAX);
        debug!("Applying schema migration to version {}", target);
        migration(&tx)?;
        set_schema_version(&tx, target)?;
    }

    tx.commit()?;
    if version < CURRENT_VERSION {
        info!("Database schema at version {}", CURRENT_VERSION);
    }
    Ok(())
}

/// Read the schema version; 0 for a fresh database.
pub(crate) fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value.map_or(Ok(0), |value| {
        value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        })
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn to_index(version: i32) -> usize {
    usize::try_from(version).unwrap_or(0)
}

/// Version 1 is the base schema created by `SCHEMA_STATEMENTS`.
fn migrate_v1(_conn: &Connection) -> Result<()> {
    Ok(())
}
