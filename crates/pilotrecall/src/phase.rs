//! Flight phases.
//!
//! A flight moves through nine phases in a fixed order. Recall items are
//! tagged with the phases in which they apply, and the view steps through
//! phases sequentially.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stage of a flight's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum FlightPhase {
    /// On the ground before engine start.
    #[default]
    Preflight,
    /// Moving on the ground to or from the runway.
    Taxi,
    /// Takeoff roll and initial climb-out.
    Takeoff,
    /// Climb to cruising altitude.
    Climb,
    /// Level flight en route.
    Cruise,
    /// Descent from cruising altitude.
    Descent,
    /// Approach to the destination runway.
    Approach,
    /// Touchdown and rollout.
    Landing,
    /// Parked, engines off.
    Shutdown,
}

/// Returned when a string does not name a flight phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flight phase: {0}")]
pub struct UnknownPhase(pub String);

impl FlightPhase {
    /// Every phase, in flight order.
    pub const ALL: [Self; 9] = [
        Self::Preflight,
        Self::Taxi,
        Self::Takeoff,
        Self::Climb,
        Self::Cruise,
        Self::Descent,
        Self::Approach,
        Self::Landing,
        Self::Shutdown,
    ];

    /// Position of this phase in flight order, starting at 0.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The phase that follows this one, or `None` after `Shutdown`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The phase that precedes this one, or `None` before `Preflight`.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Canonical name, also used as the persisted form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preflight => "Preflight",
            Self::Taxi => "Taxi",
            Self::Takeoff => "Takeoff",
            Self::Climb => "Climb",
            Self::Cruise => "Cruise",
            Self::Descent => "Descent",
            Self::Approach => "Approach",
            Self::Landing => "Landing",
            Self::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FlightPhase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_flight_order() {
        for (i, phase) in FlightPhase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
        assert!(FlightPhase::Preflight < FlightPhase::Shutdown);
    }

    #[test]
    fn test_next_and_previous() {
        assert_eq!(FlightPhase::Preflight.next(), Some(FlightPhase::Taxi));
        assert_eq!(FlightPhase::Landing.next(), Some(FlightPhase::Shutdown));
        assert_eq!(FlightPhase::Shutdown.next(), None);

        assert_eq!(FlightPhase::Taxi.previous(), Some(FlightPhase::Preflight));
        assert_eq!(FlightPhase::Preflight.previous(), None);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for phase in FlightPhase::ALL {
            assert_eq!(phase.to_string().parse::<FlightPhase>(), Ok(phase));
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("taxi".parse::<FlightPhase>(), Ok(FlightPhase::Taxi));
        assert_eq!(" APPROACH ".parse::<FlightPhase>(), Ok(FlightPhase::Approach));
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "Hover".parse::<FlightPhase>().unwrap_err();
        assert_eq!(err.to_string(), "unknown flight phase: Hover");
    }

    #[test]
    fn test_default_is_preflight() {
        assert_eq!(FlightPhase::default(), FlightPhase::Preflight);
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let json = serde_json::to_string(&FlightPhase::Cruise).unwrap();
        assert_eq!(json, "\"Cruise\"");
        let parsed: FlightPhase = serde_json::from_str("\"Descent\"").unwrap();
        assert_eq!(parsed, FlightPhase::Descent);
    }
}
