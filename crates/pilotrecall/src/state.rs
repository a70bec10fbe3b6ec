//! View state.
//!
//! [`ViewState`] is a plain value holding the current phase, the critical
//! mode flag, the active flight and cached copies of both collections. Every
//! transition consumes the state and returns the next one. [`StateStore`] is
//! the single container the composition root holds on to.

use serde::Serialize;

use crate::filter::{filter_items, is_visible};
use crate::model::{FlightList, RecallItem};
use crate::phase::FlightPhase;

/// Snapshot of what the checklist view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Phase being flown.
    pub current_phase: FlightPhase,
    /// Only tier-1 items are shown when set.
    pub critical_only: bool,
    /// Flight whose item list new items join.
    pub active_flight_id: Option<i64>,
    /// Cached recall items.
    pub recall_items: Vec<RecallItem>,
    /// Cached flight lists.
    pub flight_lists: Vec<FlightList>,
}

impl ViewState {
    /// Initial state with the given phase and critical mode.
    #[must_use]
    pub fn new(current_phase: FlightPhase, critical_only: bool) -> Self {
        Self {
            current_phase,
            critical_only,
            ..Self::default()
        }
    }

    /// Move to `phase`.
    #[must_use]
    pub fn with_phase(self, phase: FlightPhase) -> Self {
        Self {
            current_phase: phase,
            ..self
        }
    }

    /// Advance one phase, staying put at `Shutdown`.
    #[must_use]
    pub fn next_phase(self) -> Self {
        let phase = self.current_phase.next().unwrap_or(self.current_phase);
        self.with_phase(phase)
    }

    /// Go back one phase, staying put at `Preflight`.
    #[must_use]
    pub fn previous_phase(self) -> Self {
        let phase = self.current_phase.previous().unwrap_or(self.current_phase);
        self.with_phase(phase)
    }

    /// Set critical mode.
    #[must_use]
    pub fn with_critical_only(self, critical_only: bool) -> Self {
        Self {
            critical_only,
            ..self
        }
    }

    /// Flip critical mode.
    #[must_use]
    pub fn toggle_critical(self) -> Self {
        let critical_only = !self.critical_only;
        self.with_critical_only(critical_only)
    }

    /// Set or clear the active flight.
    #[must_use]
    pub fn with_active_flight(self, active_flight_id: Option<i64>) -> Self {
        Self {
            active_flight_id,
            ..self
        }
    }

    /// Replace the cached recall items wholesale.
    #[must_use]
    pub fn with_recall_items(self, recall_items: Vec<RecallItem>) -> Self {
        Self {
            recall_items,
            ..self
        }
    }

    /// Replace the cached flight lists wholesale.
    #[must_use]
    pub fn with_flight_lists(self, flight_lists: Vec<FlightList>) -> Self {
        Self {
            flight_lists,
            ..self
        }
    }

    /// Append a recall item to the cache.
    #[must_use]
    pub fn insert_recall_item(mut self, item: RecallItem) -> Self {
        self.recall_items.push(item);
        self
    }

    /// Replace the cached copy of `item` in place. Unknown ids are ignored.
    #[must_use]
    pub fn replace_recall_item(mut self, item: RecallItem) -> Self {
        if let Some(slot) = self.recall_items.iter_mut().find(|i| i.id == item.id) {
            *slot = item;
        }
        self
    }

    /// Drop a recall item from the cache.
    #[must_use]
    pub fn remove_recall_item(mut self, id: i64) -> Self {
        self.recall_items.retain(|i| i.id != id);
        self
    }

    /// Append a flight list to the cache.
    #[must_use]
    pub fn insert_flight_list(mut self, flight: FlightList) -> Self {
        self.flight_lists.push(flight);
        self
    }

    /// Replace the cached copy of `flight` in place. Unknown ids are ignored.
    #[must_use]
    pub fn replace_flight_list(mut self, flight: FlightList) -> Self {
        if let Some(slot) = self.flight_lists.iter_mut().find(|f| f.id == flight.id) {
            *slot = flight;
        }
        self
    }

    /// Drop a flight list from the cache, clearing it as active flight.
    #[must_use]
    pub fn remove_flight_list(mut self, id: i64) -> Self {
        self.flight_lists.retain(|f| f.id != id);
        if self.active_flight_id == Some(id) {
            self.active_flight_id = None;
        }
        self
    }

    /// Items shown for the current phase and critical mode.
    #[must_use]
    pub fn visible_items(&self) -> Vec<&RecallItem> {
        filter_items(self.current_phase, &self.recall_items, self.critical_only)
    }

    /// The cached active flight, if any.
    #[must_use]
    pub fn active_flight(&self) -> Option<&FlightList> {
        let id = self.active_flight_id?;
        self.flight_list(id)
    }

    /// A cached flight list by id.
    #[must_use]
    pub fn flight_list(&self, id: i64) -> Option<&FlightList> {
        self.flight_lists.iter().find(|f| f.id == id)
    }

    /// A cached recall item by id.
    #[must_use]
    pub fn recall_item(&self, id: i64) -> Option<&RecallItem> {
        self.recall_items.iter().find(|i| i.id == id)
    }

    /// Cached items associated with the active flight, dropping dangling ids.
    #[must_use]
    pub fn active_flight_items(&self) -> Vec<&RecallItem> {
        self.active_flight().map_or_else(Vec::new, |flight| {
            self.recall_items
                .iter()
                .filter(|item| flight.contains_item(item.id))
                .collect()
        })
    }

    /// The active flight's own items shown for the current phase and
    /// critical mode. Empty when no flight is active.
    #[must_use]
    pub fn visible_flight_items(&self) -> Vec<&RecallItem> {
        self.active_flight_items()
            .into_iter()
            .filter(|item| is_visible(item, self.current_phase, self.critical_only))
            .collect()
    }
}

/// The container holding the process-wide [`ViewState`].
#[derive(Debug, Default)]
pub struct StateStore {
    state: ViewState,
}

impl StateStore {
    /// Create a store holding `state`.
    #[must_use]
    pub fn new(state: ViewState) -> Self {
        Self { state }
    }

    /// Borrow the current state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Clone the current state.
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.state.clone()
    }

    /// Apply a transition.
    pub fn update(&mut self, transition: impl FnOnce(ViewState) -> ViewState) {
        let current = std::mem::take(&mut self.state);
        self.state = transition(current);
    }

    /// Swap in a new state, returning the old one.
    pub fn replace(&mut self, state: ViewState) -> ViewState {
        std::mem::replace(&mut self.state, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlightListDraft, RecallItemDraft};

    fn item(id: i64, phases: &[FlightPhase], is_tier1: bool) -> RecallItem {
        let draft = RecallItemDraft {
            is_tier1,
            ..RecallItemDraft::new(format!("Item {id}"), phases.to_vec())
        };
        RecallItem::from_draft(id, draft, 0, 0)
    }

    fn flight(id: i64, item_ids: Vec<i64>) -> FlightList {
        let draft = FlightListDraft {
            from_airport: "JFK".to_string(),
            to_airport: "LAX".to_string(),
            arrival_time: 1,
            active_item_ids: item_ids,
            ..FlightListDraft::default()
        };
        FlightList::from_draft(id, draft, 0, 0)
    }

    #[test]
    fn test_default_state() {
        let state = ViewState::default();
        assert_eq!(state.current_phase, FlightPhase::Preflight);
        assert!(!state.critical_only);
        assert!(state.active_flight_id.is_none());
        assert!(state.recall_items.is_empty());
    }

    #[test]
    fn test_phase_navigation_clamps() {
        let state = ViewState::default().previous_phase();
        assert_eq!(state.current_phase, FlightPhase::Preflight);

        let state = state.next_phase().next_phase();
        assert_eq!(state.current_phase, FlightPhase::Takeoff);

        let state = state.with_phase(FlightPhase::Shutdown).next_phase();
        assert_eq!(state.current_phase, FlightPhase::Shutdown);
    }

    #[test]
    fn test_toggle_critical() {
        let state = ViewState::default().toggle_critical();
        assert!(state.critical_only);
        assert!(!state.toggle_critical().critical_only);
    }

    #[test]
    fn test_visible_items_follow_phase_and_mode() {
        let state = ViewState::default().with_recall_items(vec![
            item(1, &[FlightPhase::Taxi], false),
            item(2, &[FlightPhase::Takeoff], false),
            item(3, &[FlightPhase::Taxi, FlightPhase::Takeoff], false),
            item(4, &[FlightPhase::Approach], true),
        ]);

        let taxi = state.clone().with_phase(FlightPhase::Taxi);
        assert_eq!(
            taxi.visible_items().iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let approach = state
            .with_phase(FlightPhase::Approach)
            .with_critical_only(true);
        assert_eq!(
            approach.visible_items().iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![4]
        );
    }

    #[test]
    fn test_cache_patches() {
        let state = ViewState::default()
            .insert_recall_item(item(1, &[FlightPhase::Taxi], false))
            .insert_recall_item(item(2, &[FlightPhase::Taxi], false));

        let mut changed = item(1, &[FlightPhase::Cruise], true);
        changed.title = "Changed".to_string();
        let state = state.replace_recall_item(changed);
        assert_eq!(state.recall_item(1).unwrap().title, "Changed");
        assert_eq!(state.recall_items[0].id, 1);

        let state = state.replace_recall_item(item(9, &[FlightPhase::Taxi], false));
        assert!(state.recall_item(9).is_none());

        let state = state.remove_recall_item(1);
        assert_eq!(state.recall_items.len(), 1);
        assert!(state.recall_item(1).is_none());
    }

    #[test]
    fn test_removing_active_flight_clears_it() {
        let state = ViewState::default()
            .insert_flight_list(flight(1, vec![]))
            .insert_flight_list(flight(2, vec![]))
            .with_active_flight(Some(1));
        assert_eq!(state.active_flight().map(|f| f.id), Some(1));

        let state = state.remove_flight_list(2);
        assert_eq!(state.active_flight_id, Some(1));

        let state = state.remove_flight_list(1);
        assert!(state.active_flight_id.is_none());
        assert!(state.active_flight().is_none());
    }

    #[test]
    fn test_active_flight_items_drop_dangling() {
        let state = ViewState::default()
            .with_recall_items(vec![
                item(1, &[FlightPhase::Taxi], false),
                item(2, &[FlightPhase::Taxi], false),
            ])
            .with_flight_lists(vec![flight(5, vec![2, 44])])
            .with_active_flight(Some(5));

        let ids: Vec<i64> = state.active_flight_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(ViewState::default().active_flight_items().is_empty());
    }

    #[test]
    fn test_visible_flight_items_stay_within_flight() {
        let state = ViewState::default()
            .with_recall_items(vec![
                item(1, &[FlightPhase::Taxi], false),
                item(2, &[FlightPhase::Taxi], true),
                item(3, &[FlightPhase::Cruise], true),
            ])
            .with_flight_lists(vec![flight(5, vec![1]), flight(6, vec![2, 3])])
            .with_active_flight(Some(6))
            .with_phase(FlightPhase::Taxi);

        let ids = |s: &ViewState| {
            s.visible_flight_items()
                .iter()
                .map(|i| i.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&state), vec![2]);
        assert_eq!(state.visible_items().len(), 2);

        let state = state.with_active_flight(Some(5));
        assert_eq!(ids(&state), vec![1]);
        assert!(ids(&state.clone().with_critical_only(true)).is_empty());
        assert!(ids(&state.with_active_flight(None)).is_empty());
    }

    #[test]
    fn test_store_update_and_replace() {
        let mut store = StateStore::default();
        store.update(|s| s.with_phase(FlightPhase::Cruise).toggle_critical());
        assert_eq!(store.state().current_phase, FlightPhase::Cruise);
        assert!(store.state().critical_only);

        let snapshot = store.snapshot();
        let old = store.replace(ViewState::default());
        assert_eq!(old, snapshot);
        assert_eq!(store.state(), &ViewState::default());
    }
}
