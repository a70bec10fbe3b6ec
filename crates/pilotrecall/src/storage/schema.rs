//! `SQLite` schema definitions for pilotrecall.
//!
//! List-valued fields (phases, threats, active item ids) are stored as JSON
//! text. Identifiers are auto-incrementing and never reused.

/// SQL statement to create the recall items table.
pub const CREATE_RECALL_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS recall_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    phases TEXT NOT NULL,
    reference TEXT NOT NULL DEFAULT '',
    threats TEXT NOT NULL DEFAULT '[]',
    is_tier1 INTEGER NOT NULL DEFAULT 0,
    is_deeplink INTEGER NOT NULL DEFAULT 0,
    attachment_type TEXT,
    attachment BLOB,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
";

/// SQL statement to create the flight lists table.
pub const CREATE_FLIGHT_LISTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_airport TEXT NOT NULL,
    to_airport TEXT NOT NULL,
    departure_time INTEGER NOT NULL,
    arrival_time INTEGER NOT NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'live',
    active_item_ids TEXT NOT NULL DEFAULT '[]',
    notes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
";

/// SQL statement to create an index on departure time for listing flights.
pub const CREATE_DEPARTURE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_lists_departure ON flight_lists(departure_time)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RECALL_ITEMS_TABLE,
    CREATE_FLIGHT_LISTS_TABLE,
    CREATE_DEPARTURE_INDEX,
    CREATE_METADATA_TABLE,
];
