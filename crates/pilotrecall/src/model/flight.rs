//! Flight list records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a flight is in progress or finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    /// Planned or in progress.
    #[default]
    Live,
    /// Flown and closed out.
    Completed,
}

impl FlightStatus {
    /// Persisted form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Completed => "completed",
        }
    }
}

/// What is remembered about the active flight between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RememberedFlight {
    /// Nothing was ever chosen, or the choice was forgotten.
    #[default]
    Unset,
    /// The active flight was cleared on purpose.
    Cleared,
    /// This flight was the active one.
    Flight(i64),
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown flight status: {other}")),
        }
    }
}

/// A persisted flight with its own subset of recall items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightList {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Origin airport code.
    pub from_airport: String,
    /// Destination airport code.
    pub to_airport: String,
    /// Departure instant, epoch milliseconds.
    pub departure_time: i64,
    /// Arrival instant, epoch milliseconds. Always after departure.
    pub arrival_time: i64,
    /// Display title, e.g. `JFK-LAX 0900`.
    pub title: String,
    /// Live or completed.
    pub status: FlightStatus,
    /// Recall items associated with this flight. May contain ids that no
    /// longer resolve.
    pub active_item_ids: Vec<i64>,
    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last modification time, epoch milliseconds.
    pub updated_at: i64,
}

impl FlightList {
    /// Build a record from a draft plus the storage-assigned fields.
    #[must_use]
    pub fn from_draft(id: i64, draft: FlightListDraft, created_at: i64, updated_at: i64) -> Self {
        Self {
            id,
            from_airport: draft.from_airport,
            to_airport: draft.to_airport,
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
            title: draft.title,
            status: draft.status,
            active_item_ids: draft.active_item_ids,
            notes: draft.notes,
            created_at,
            updated_at,
        }
    }

    /// Whether the flight has been closed out.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == FlightStatus::Completed
    }

    /// Whether `item_id` is associated with this flight.
    #[must_use]
    pub fn contains_item(&self, item_id: i64) -> bool {
        self.active_item_ids.contains(&item_id)
    }
}

/// A flight list that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightListDraft {
    /// Origin airport code.
    pub from_airport: String,
    /// Destination airport code.
    pub to_airport: String,
    /// Departure instant, epoch milliseconds.
    pub departure_time: i64,
    /// Arrival instant, epoch milliseconds.
    pub arrival_time: i64,
    /// Display title.
    pub title: String,
    /// Initial status.
    pub status: FlightStatus,
    /// Initial item associations.
    pub active_item_ids: Vec<i64>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A partial update to a flight list. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightListChanges {
    /// New origin.
    pub from_airport: Option<String>,
    /// New destination.
    pub to_airport: Option<String>,
    /// New departure instant.
    pub departure_time: Option<i64>,
    /// New arrival instant.
    pub arrival_time: Option<i64>,
    /// New title.
    pub title: Option<String>,
    /// New status.
    pub status: Option<FlightStatus>,
    /// Replacement item association list.
    pub active_item_ids: Option<Vec<i64>>,
    /// `Some(None)` removes the notes.
    pub notes: Option<Option<String>>,
}

impl FlightListChanges {
    /// Changeset that only replaces the associated item ids.
    #[must_use]
    pub fn active_items(ids: Vec<i64>) -> Self {
        Self {
            active_item_ids: Some(ids),
            ..Self::default()
        }
    }

    /// Changeset that only sets the status.
    #[must_use]
    pub fn status(status: FlightStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether the changeset overrides nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the overrides into `flight`. Timestamps are left to the caller.
    pub fn apply_to(&self, flight: &mut FlightList) {
        if let Some(from) = &self.from_airport {
            flight.from_airport.clone_from(from);
        }
        if let Some(to) = &self.to_airport {
            flight.to_airport.clone_from(to);
        }
        if let Some(departure) = self.departure_time {
            flight.departure_time = departure;
        }
        if let Some(arrival) = self.arrival_time {
            flight.arrival_time = arrival;
        }
        if let Some(title) = &self.title {
            flight.title.clone_from(title);
        }
        if let Some(status) = self.status {
            flight.status = status;
        }
        if let Some(ids) = &self.active_item_ids {
            flight.active_item_ids.clone_from(ids);
        }
        if let Some(notes) = &self.notes {
            flight.notes.clone_from(notes);
        }
    }
}
