//! Validation and sanitization of user input.
//!
//! Everything that originates from a form passes through here before it
//! reaches the repository. The functions return fully-populated drafts or
//! cleaned changesets; the repository trusts them and stores them verbatim.

use chrono::DateTime;
use thiserror::Error;

use crate::deeplink::is_deeplink;
use crate::model::{
    Attachment, FlightList, FlightListChanges, FlightListDraft, FlightStatus, RecallItemChanges,
    RecallItemDraft,
};
use crate::phase::FlightPhase;

/// A local, recoverable rejection of user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A new recall item has a blank title.
    #[error("Title is required")]
    EmptyTitle,

    /// An update would blank an existing title.
    #[error("Title cannot be empty")]
    ClearedTitle,

    /// A recall item would have no phases.
    #[error("At least one flight phase must be selected")]
    EmptyPhases,

    /// An origin or destination code is blank.
    #[error("Airport codes are required")]
    MissingAirport,

    /// Departure is not strictly before arrival.
    #[error("Departure time must be before arrival time")]
    InvalidSchedule,
}

/// Raw recall item input as collected from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecallItemInput {
    /// Title as typed.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Selected phases.
    pub phases: Vec<FlightPhase>,
    /// Optional manual reference.
    pub reference: Option<String>,
    /// Optional threat list.
    pub threats: Option<Vec<String>>,
    /// Tier-1 flag, defaults to false.
    pub is_tier1: Option<bool>,
    /// Explicit deep-link flag; computed from the title when absent.
    pub is_deeplink: Option<bool>,
    /// Optional attachment.
    pub attachment: Option<Attachment>,
}

/// Raw flight input as collected from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightInput {
    /// Origin code as typed.
    pub from_airport: String,
    /// Destination code as typed.
    pub to_airport: String,
    /// Departure, epoch milliseconds.
    pub departure_time: i64,
    /// Arrival, epoch milliseconds.
    pub arrival_time: i64,
    /// Optional notes.
    pub notes: Option<String>,
    /// Items to associate from the start.
    pub active_item_ids: Vec<i64>,
}

/// Validate and clean a new recall item.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] or [`ValidationError::EmptyPhases`].
pub fn sanitize_recall_item(input: RecallItemInput) -> Result<RecallItemDraft, ValidationError> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let phases = dedup_phases(input.phases);
    if phases.is_empty() {
        return Err(ValidationError::EmptyPhases);
    }

    let is_deeplink = input.is_deeplink.unwrap_or_else(|| is_deeplink(&title));

    Ok(RecallItemDraft {
        title,
        description: trimmed_or_empty(input.description.as_deref()),
        phases,
        reference: trimmed_or_empty(input.reference.as_deref()),
        threats: input.threats.map(clean_threats).unwrap_or_default(),
        is_tier1: input.is_tier1.unwrap_or(false),
        is_deeplink,
        attachment: input.attachment,
    })
}

/// Validate and clean a recall item changeset.
///
/// Supplied fields are trimmed the same way as on creation. A changeset may
/// not blank the title or empty the phase list.
///
/// # Errors
///
/// Returns [`ValidationError::ClearedTitle`] or [`ValidationError::EmptyPhases`].
pub fn sanitize_recall_changes(
    changes: RecallItemChanges,
) -> Result<RecallItemChanges, ValidationError> {
    let title = match changes.title {
        Some(title) => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ValidationError::ClearedTitle);
            }
            Some(title)
        }
        None => None,
    };

    let phases = match changes.phases {
        Some(phases) => {
            let phases = dedup_phases(phases);
            if phases.is_empty() {
                return Err(ValidationError::EmptyPhases);
            }
            Some(phases)
        }
        None => None,
    };

    let is_deeplink = changes
        .is_deeplink
        .or_else(|| title.as_deref().map(is_deeplink));

    Ok(RecallItemChanges {
        title,
        description: changes.description.map(|s| s.trim().to_string()),
        phases,
        reference: changes.reference.map(|s| s.trim().to_string()),
        threats: changes.threats.map(clean_threats),
        is_tier1: changes.is_tier1,
        is_deeplink,
        attachment: changes.attachment,
    })
}

/// Validate and clean a new flight.
///
/// Airport codes are trimmed and upper-cased and the title is derived from
/// the route and the departure time.
///
/// # Errors
///
/// Returns [`ValidationError::MissingAirport`] or
/// [`ValidationError::InvalidSchedule`].
pub fn sanitize_flight(input: FlightInput) -> Result<FlightListDraft, ValidationError> {
    let from_airport = airport_code(&input.from_airport)?;
    let to_airport = airport_code(&input.to_airport)?;

    if input.departure_time >= input.arrival_time {
        return Err(ValidationError::InvalidSchedule);
    }
    let title = flight_title(&from_airport, &to_airport, input.departure_time)?;

    Ok(FlightListDraft {
        from_airport,
        to_airport,
        departure_time: input.departure_time,
        arrival_time: input.arrival_time,
        title,
        status: FlightStatus::Live,
        active_item_ids: input.active_item_ids,
        notes: clean_notes(input.notes),
    })
}

/// Validate and clean a flight changeset against the stored record.
///
/// When the route or departure changes and no explicit title is supplied,
/// the title is regenerated.
///
/// # Errors
///
/// Returns [`ValidationError::MissingAirport`] or
/// [`ValidationError::InvalidSchedule`].
pub fn sanitize_flight_changes(
    changes: FlightListChanges,
    current: &FlightList,
) -> Result<FlightListChanges, ValidationError> {
    let from_airport = changes.from_airport.as_deref().map(airport_code).transpose()?;
    let to_airport = changes.to_airport.as_deref().map(airport_code).transpose()?;

    let departure = changes.departure_time.unwrap_or(current.departure_time);
    let arrival = changes.arrival_time.unwrap_or(current.arrival_time);
    if departure >= arrival {
        return Err(ValidationError::InvalidSchedule);
    }

    let route_changed =
        from_airport.is_some() || to_airport.is_some() || changes.departure_time.is_some();
    let title = match changes.title {
        Some(title) if !title.trim().is_empty() => Some(title.trim().to_string()),
        _ if route_changed => Some(flight_title(
            from_airport.as_deref().unwrap_or(&current.from_airport),
            to_airport.as_deref().unwrap_or(&current.to_airport),
            departure,
        )?),
        _ => None,
    };

    Ok(FlightListChanges {
        from_airport,
        to_airport,
        departure_time: changes.departure_time,
        arrival_time: changes.arrival_time,
        title,
        status: changes.status,
        active_item_ids: changes.active_item_ids,
        notes: changes.notes.map(clean_notes),
    })
}

/// Display title for a flight: `FROM-TO HHMM`, departure time in UTC.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidSchedule`] if the departure instant is
/// out of range.
pub fn flight_title(from: &str, to: &str, departure_ms: i64) -> Result<String, ValidationError> {
    let departure =
        DateTime::from_timestamp_millis(departure_ms).ok_or(ValidationError::InvalidSchedule)?;
    Ok(format!("{from}-{to} {}", departure.format("%H%M")))
}

fn airport_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(ValidationError::MissingAirport);
    }
    Ok(code)
}

fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn clean_threats(threats: Vec<String>) -> Vec<String> {
    threats
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

fn dedup_phases(phases: Vec<FlightPhase>) -> Vec<FlightPhase> {
    let mut seen = Vec::with_capacity(phases.len());
    for phase in phases {
        if !seen.contains(&phase) {
            seen.push(phase);
        }
    }
    seen
}
