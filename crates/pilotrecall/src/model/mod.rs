//! Core record types for pilotrecall.
//!
//! Recall items and flight lists each come in three shapes: the persisted
//! record (with id and timestamps), a draft (what gets inserted), and a
//! changeset (a partial update where every field is an optional override).

mod flight;
mod recall;

pub use flight::{
    FlightList, FlightListChanges, FlightListDraft, FlightStatus, RememberedFlight,
};
pub use recall::{Attachment, RecallItem, RecallItemChanges, RecallItemDraft};

use chrono::Utc;

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
