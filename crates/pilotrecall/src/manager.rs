//! Store-aware operations.
//!
//! [`RecallManager`] is the composition root: it owns a [`Repository`] and
//! the [`StateStore`], and funnels every mutation through
//! validation, then the repository, then a patch of the cached state. Multi-step
//! sequences such as "delete an item, then unlink it from the active flight"
//! are not transactional; a failure between steps leaves a dangling id that
//! the lenient joins tolerate.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    FlightList, FlightListChanges, FlightStatus, RecallItem, RecallItemChanges, RememberedFlight,
};
use crate::phase::FlightPhase;
use crate::repository::Repository;
use crate::state::{StateStore, ViewState};
use crate::validation::{
    sanitize_flight, sanitize_flight_changes, sanitize_recall_changes, sanitize_recall_item,
    FlightInput, RecallItemInput,
};

/// Recall item and flight operations kept in sync with the view state.
#[derive(Debug)]
pub struct RecallManager<R> {
    repo: R,
    store: StateStore,
}

impl<R: Repository> RecallManager<R> {
    /// Create a manager with an initial, not yet hydrated, view state.
    #[must_use]
    pub fn new(repo: R, initial: ViewState) -> Self {
        Self {
            repo,
            store: StateStore::new(initial),
        }
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// The current view state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        self.store.state()
    }

    /// Hydrate the cache at startup.
    ///
    /// Optionally asks for durable storage first; the answer is logged and
    /// never blocks loading. The remembered active flight is restored if it
    /// still exists. A flight cleared with `set_active_flight(None)` stays
    /// cleared; otherwise the first flight becomes active.
    ///
    /// # Errors
    ///
    /// Returns an error if either collection cannot be loaded.
    pub async fn bootstrap(&mut self, request_persistence: bool) -> Result<()> {
        if request_persistence {
            let granted = self.repo.request_persistent_storage().await;
            debug!("Persistent storage granted: {}", granted);
        }

        self.reload().await?;

        let remembered = self.repo.remembered_active_flight().await?;
        let state = self.state();
        let first = state.flight_lists.first().map(|f| f.id);
        let active = match remembered {
            RememberedFlight::Flight(id) if state.flight_list(id).is_some() => Some(id),
            RememberedFlight::Cleared => None,
            RememberedFlight::Flight(_) | RememberedFlight::Unset => first,
        };
        self.store.update(|s| s.with_active_flight(active));

        let state = self.state();
        info!(
            "Loaded {} recall items and {} flight lists",
            state.recall_items.len(),
            state.flight_lists.len()
        );
        Ok(())
    }

    /// Reload both cached collections from the repository.
    ///
    /// An active flight that no longer exists is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if either collection cannot be loaded.
    pub async fn reload(&mut self) -> Result<()> {
        let items = self.repo.get_all_recall_items().await?;
        let flights = self.repo.get_all_flight_lists().await?;

        self.store.update(|s| {
            let active = s
                .active_flight_id
                .filter(|id| flights.iter().any(|f| f.id == *id));
            s.with_recall_items(items)
                .with_flight_lists(flights)
                .with_active_flight(active)
        });
        Ok(())
    }

    // === Recall items ===

    /// Validate and store a new recall item, then attach it to the active
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input (nothing is stored) or a
    /// storage error if a repository call fails.
    pub async fn add_recall_item(&mut self, input: RecallItemInput) -> Result<RecallItem> {
        let draft = sanitize_recall_item(input)?;
        let id = self.repo.add_recall_item(draft).await?;
        let item = self
            .repo
            .get_recall_item(id)
            .await?
            .ok_or_else(|| Error::internal(format!("recall item {id} missing after insert")))?;

        self.store.update(|s| s.insert_recall_item(item.clone()));

        if let Some(flight_id) = self.state().active_flight_id {
            self.link_item(flight_id, id).await?;
        }

        debug!("Added recall item {} ({})", id, item.title);
        Ok(item)
    }

    /// Validate and apply changes to a recall item.
    ///
    /// Returns `Ok(None)` if the item does not exist.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the changes would clear a mandatory
    /// field (nothing is stored) or a storage error if the update fails.
    pub async fn update_recall_item(
        &mut self,
        id: i64,
        changes: RecallItemChanges,
    ) -> Result<Option<RecallItem>> {
        let changes = sanitize_recall_changes(changes)?;
        let updated = self.repo.update_recall_item(id, changes).await?;

        if let Some(item) = &updated {
            self.store.update(|s| s.replace_recall_item(item.clone()));
        }
        Ok(updated)
    }

    /// Delete a recall item and unlink it from the active flight.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a repository call fails.
    pub async fn delete_recall_item(&mut self, id: i64) -> Result<()> {
        self.repo.delete_recall_item(id).await?;
        self.store.update(|s| s.remove_recall_item(id));

        if let Some(flight_id) = self.state().active_flight_id {
            self.unlink_item(flight_id, id).await?;
        }
        Ok(())
    }

    // === Flights ===

    /// Validate and store a new flight, then make it the active flight.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input (nothing is stored) or a
    /// storage error if a repository call fails.
    pub async fn create_flight(&mut self, input: FlightInput) -> Result<FlightList> {
        let draft = sanitize_flight(input)?;
        let id = self.repo.add_flight_list(draft).await?;
        self.repo.remember_active_flight(Some(id)).await?;

        let flights = self.repo.get_all_flight_lists().await?;
        let flight = flights
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| Error::internal(format!("flight list {id} missing after insert")))?;

        self.store
            .update(|s| s.with_flight_lists(flights).with_active_flight(Some(id)));

        info!("Created flight {} ({})", id, flight.title);
        Ok(flight)
    }

    /// Validate and apply changes to a flight.
    ///
    /// Returns `Ok(None)` if the flight does not exist.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank airport or an inverted
    /// schedule, or a storage error if a repository call fails.
    pub async fn update_flight(
        &mut self,
        id: i64,
        changes: FlightListChanges,
    ) -> Result<Option<FlightList>> {
        let Some(current) = self.repo.get_flight_list(id).await? else {
            return Ok(None);
        };
        let changes = sanitize_flight_changes(changes, &current)?;
        let updated = self.repo.update_flight_list(id, changes).await?;

        if let Some(flight) = &updated {
            self.store.update(|s| s.replace_flight_list(flight.clone()));
        }
        Ok(updated)
    }

    /// Mark a flight as completed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a repository call fails.
    pub async fn complete_flight(&mut self, id: i64) -> Result<Option<FlightList>> {
        self.update_flight(id, FlightListChanges::status(FlightStatus::Completed))
            .await
    }

    /// Delete a flight. Its recall items are kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository call fails.
    pub async fn delete_flight(&mut self, id: i64) -> Result<()> {
        self.repo.delete_flight_list(id).await?;
        if self.state().active_flight_id == Some(id) {
            self.repo.forget_active_flight().await?;
        }
        self.store.update(|s| s.remove_flight_list(id));
        Ok(())
    }

    /// Make `id` the active flight, or clear it with `None`.
    ///
    /// Returns `false` and leaves the state alone if the flight does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the flight has to be looked up and the
    /// lookup fails.
    pub async fn set_active_flight(&mut self, id: Option<i64>) -> Result<bool> {
        let Some(id) = id else {
            self.repo.remember_active_flight(None).await?;
            self.store.update(|s| s.with_active_flight(None));
            return Ok(true);
        };

        if self.state().flight_list(id).is_none() {
            match self.repo.get_flight_list(id).await? {
                Some(flight) => self.store.update(|s| s.insert_flight_list(flight)),
                None => return Ok(false),
            }
        }

        self.repo.remember_active_flight(Some(id)).await?;
        self.store.update(|s| s.with_active_flight(Some(id)));
        Ok(true)
    }

    // === View ===

    /// Move to `phase`.
    pub fn set_phase(&mut self, phase: FlightPhase) {
        self.store.update(|s| s.with_phase(phase));
    }

    /// Advance one phase; returns the phase now current.
    pub fn next_phase(&mut self) -> FlightPhase {
        self.store.update(ViewState::next_phase);
        self.state().current_phase
    }

    /// Go back one phase; returns the phase now current.
    pub fn previous_phase(&mut self) -> FlightPhase {
        self.store.update(ViewState::previous_phase);
        self.state().current_phase
    }

    /// Set critical mode.
    pub fn set_critical_only(&mut self, critical_only: bool) {
        self.store.update(|s| s.with_critical_only(critical_only));
    }

    /// Flip critical mode; returns the new value.
    pub fn toggle_critical(&mut self) -> bool {
        self.store.update(ViewState::toggle_critical);
        self.state().critical_only
    }

    /// Items shown for the current phase and critical mode.
    #[must_use]
    pub fn visible_items(&self) -> Vec<&RecallItem> {
        self.state().visible_items()
    }

    /// Cached items associated with the active flight.
    #[must_use]
    pub fn active_flight_items(&self) -> Vec<&RecallItem> {
        self.state().active_flight_items()
    }

    /// The active flight's items shown for the current phase and critical
    /// mode.
    #[must_use]
    pub fn visible_flight_items(&self) -> Vec<&RecallItem> {
        self.state().visible_flight_items()
    }

    /// Wipe all stored data and empty the cache. Phase and critical mode
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository call fails.
    pub async fn reset(&mut self) -> Result<()> {
        self.repo.clear_all_data().await?;
        self.repo.forget_active_flight().await?;
        self.store.update(|s| {
            s.with_recall_items(Vec::new())
                .with_flight_lists(Vec::new())
                .with_active_flight(None)
        });
        info!("All recall items and flight lists deleted");
        Ok(())
    }

    async fn link_item(&mut self, flight_id: i64, item_id: i64) -> Result<()> {
        let Some(flight) = self.repo.get_flight_list(flight_id).await? else {
            warn!("Active flight {} no longer exists", flight_id);
            return Ok(());
        };

        let mut ids = flight.active_item_ids;
        ids.push(item_id);
        self.patch_flight_items(flight_id, ids).await
    }

    async fn unlink_item(&mut self, flight_id: i64, item_id: i64) -> Result<()> {
        let Some(flight) = self.repo.get_flight_list(flight_id).await? else {
            warn!("Active flight {} no longer exists", flight_id);
            return Ok(());
        };

        let ids: Vec<i64> = flight
            .active_item_ids
            .into_iter()
            .filter(|id| *id != item_id)
            .collect();
        self.patch_flight_items(flight_id, ids).await
    }

    async fn patch_flight_items(&mut self, flight_id: i64, ids: Vec<i64>) -> Result<()> {
        let updated = self
            .repo
            .update_flight_list(flight_id, FlightListChanges::active_items(ids))
            .await?;
        if let Some(flight) = updated {
            self.store.update(|s| s.replace_flight_list(flight));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::model::{FlightListDraft, RecallItemDraft};
    use crate::repository::SqliteRepository;
    use crate::validation::ValidationError;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    // 2024-01-15T09:00:00Z
    const DEPARTURE: i64 = 1_705_309_200_000;

    fn manager() -> RecallManager<SqliteRepository> {
        let repo = SqliteRepository::open_in_memory().expect("failed to create test repository");
        RecallManager::new(repo, ViewState::default())
    }

    fn input(title: &str, phases: &[FlightPhase]) -> RecallItemInput {
        RecallItemInput {
            title: title.to_string(),
            phases: phases.to_vec(),
            ..RecallItemInput::default()
        }
    }

    fn tier1(title: &str, phases: &[FlightPhase]) -> RecallItemInput {
        RecallItemInput {
            is_tier1: Some(true),
            ..input(title, phases)
        }
    }

    fn flight_input(from: &str, to: &str) -> FlightInput {
        FlightInput {
            from_airport: from.to_string(),
            to_airport: to.to_string(),
            departure_time: DEPARTURE,
            arrival_time: DEPARTURE + 5 * HOUR_MS,
            ..FlightInput::default()
        }
    }

    fn visible_ids<R: Repository>(manager: &RecallManager<R>) -> Vec<i64> {
        manager.visible_items().iter().map(|i| i.id).collect()
    }

    /// Repository whose every call fails as if storage were unavailable.
    #[derive(Debug)]
    struct FailingRepository;

    fn fault<T>() -> Result<T> {
        Err(Error::storage_unavailable("quota exceeded"))
    }

    #[async_trait]
    impl Repository for FailingRepository {
        async fn add_recall_item(&self, _draft: RecallItemDraft) -> Result<i64> {
            fault()
        }
        async fn get_recall_item(&self, _id: i64) -> Result<Option<RecallItem>> {
            fault()
        }
        async fn update_recall_item(
            &self,
            _id: i64,
            _changes: RecallItemChanges,
        ) -> Result<Option<RecallItem>> {
            fault()
        }
        async fn delete_recall_item(&self, _id: i64) -> Result<()> {
            fault()
        }
        async fn get_all_recall_items(&self) -> Result<Vec<RecallItem>> {
            fault()
        }
        async fn add_flight_list(&self, _draft: FlightListDraft) -> Result<i64> {
            fault()
        }
        async fn get_flight_list(&self, _id: i64) -> Result<Option<FlightList>> {
            fault()
        }
        async fn get_all_flight_lists(&self) -> Result<Vec<FlightList>> {
            fault()
        }
        async fn update_flight_list(
            &self,
            _id: i64,
            _changes: FlightListChanges,
        ) -> Result<Option<FlightList>> {
            fault()
        }
        async fn delete_flight_list(&self, _id: i64) -> Result<()> {
            fault()
        }
        async fn clear_all_data(&self) -> Result<()> {
            fault()
        }
        async fn request_persistent_storage(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_add_sanitizes_and_caches() {
        let mut manager = manager();
        let item = manager
            .add_recall_item(input("  Foo  ", &[FlightPhase::Taxi]))
            .await
            .unwrap();

        assert_eq!(item.title, "Foo");
        assert_eq!(manager.state().recall_items, vec![item.clone()]);
        let stored = manager.repository().get_recall_item(item.id).await.unwrap();
        assert_eq!(stored, Some(item));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_title_without_storing() {
        let mut manager = manager();
        let err = manager
            .add_recall_item(input("   ", &[FlightPhase::Taxi]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(ValidationError::EmptyTitle)));
        assert!(manager.repository().get_all_recall_items().await.unwrap().is_empty());
        assert!(manager.state().recall_items.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_empty_phases() {
        let mut manager = manager();
        let err = manager.add_recall_item(input("Foo", &[])).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyPhases)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_storage() {
        let mut manager = RecallManager::new(FailingRepository, ViewState::default());
        let err = manager.add_recall_item(input("", &[FlightPhase::Taxi])).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_storage_faults_propagate() {
        let mut manager = RecallManager::new(FailingRepository, ViewState::default());

        let err = manager
            .add_recall_item(input("Foo", &[FlightPhase::Taxi]))
            .await
            .unwrap_err();
        assert!(err.is_storage_fault());
        assert!(manager.state().recall_items.is_empty());

        assert!(manager.bootstrap(true).await.unwrap_err().is_storage_fault());
        assert!(manager.delete_recall_item(1).await.unwrap_err().is_storage_fault());
        assert!(manager.reset().await.unwrap_err().is_storage_fault());
    }

    #[tokio::test]
    async fn test_add_links_to_active_flight() {
        let mut manager = manager();
        let flight = manager.create_flight(flight_input("jfk", "lax")).await.unwrap();
        assert_eq!(manager.state().active_flight_id, Some(flight.id));

        let item = manager
            .add_recall_item(input("Deicing", &[FlightPhase::Taxi]))
            .await
            .unwrap();

        let stored = manager.repository().get_flight_list(flight.id).await.unwrap().unwrap();
        assert_eq!(stored.active_item_ids, vec![item.id]);
        assert_eq!(manager.state().active_flight().unwrap().active_item_ids, vec![item.id]);
        assert_eq!(
            manager.active_flight_items().iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![item.id]
        );
    }

    #[tokio::test]
    async fn test_add_without_active_flight_links_nothing() {
        let mut manager = manager();
        manager.add_recall_item(input("A", &[FlightPhase::Taxi])).await.unwrap();
        assert!(manager.state().flight_lists.is_empty());
        assert!(manager.active_flight_items().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_clearing_title_and_keeps_record() {
        let mut manager = manager();
        let item = manager.add_recall_item(input("Keep", &[FlightPhase::Taxi])).await.unwrap();

        let changes = RecallItemChanges {
            title: Some(String::new()),
            ..RecallItemChanges::default()
        };
        let err = manager.update_recall_item(item.id, changes).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::ClearedTitle)));

        let changes = RecallItemChanges {
            phases: Some(vec![]),
            ..RecallItemChanges::default()
        };
        let err = manager.update_recall_item(item.id, changes).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyPhases)));

        let stored = manager.repository().get_recall_item(item.id).await.unwrap();
        assert_eq!(stored, Some(item));
    }

    #[tokio::test]
    async fn test_update_patches_cache() {
        let mut manager = manager();
        let item = manager.add_recall_item(input("Old", &[FlightPhase::Taxi])).await.unwrap();

        let changes = RecallItemChanges {
            title: Some(" New ".to_string()),
            phases: Some(vec![FlightPhase::Cruise]),
            ..RecallItemChanges::default()
        };
        let updated = manager.update_recall_item(item.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.created_at, item.created_at);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(manager.state().recall_item(item.id), Some(&updated));
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let mut manager = manager();
        let result = manager
            .update_recall_item(404, RecallItemChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_unlinks_from_active_flight() {
        let mut manager = manager();
        manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        let a = manager.add_recall_item(input("A", &[FlightPhase::Preflight])).await.unwrap();
        let b = manager.add_recall_item(input("B", &[FlightPhase::Taxi])).await.unwrap();

        manager.delete_recall_item(a.id).await.unwrap();

        let flight = manager.state().active_flight().unwrap();
        assert_eq!(flight.active_item_ids, vec![b.id]);
        assert!(manager.state().recall_item(a.id).is_none());
        assert!(manager.repository().get_recall_item(a.id).await.unwrap().is_none());

        manager.delete_recall_item(a.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_flight_rejects_inverted_schedule() {
        let mut manager = manager();
        let err = manager
            .create_flight(FlightInput {
                arrival_time: DEPARTURE,
                ..flight_input("JFK", "LAX")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(ValidationError::InvalidSchedule)));
        assert!(manager.repository().get_all_flight_lists().await.unwrap().is_empty());
        assert!(manager.state().active_flight_id.is_none());
    }

    #[tokio::test]
    async fn test_create_flight_title_and_activation() {
        let mut manager = manager();
        let first = manager.create_flight(flight_input("jfk", "lax")).await.unwrap();
        let second = manager.create_flight(flight_input("sfo", "nyc")).await.unwrap();

        assert_eq!(first.title, "JFK-LAX 0900");
        assert_eq!(second.title, "SFO-NYC 0900");
        assert_eq!(manager.state().active_flight_id, Some(second.id));
        assert_eq!(manager.state().flight_lists.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_flight() {
        let mut manager = manager();
        let flight = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();

        let completed = manager.complete_flight(flight.id).await.unwrap().unwrap();
        assert!(completed.is_completed());
        assert_eq!(completed.title, flight.title);
        assert!(manager.state().active_flight().unwrap().is_completed());

        assert!(manager.complete_flight(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_flight_rejects_inverted_schedule() {
        let mut manager = manager();
        let flight = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();

        let changes = FlightListChanges {
            arrival_time: Some(flight.departure_time - 1),
            ..FlightListChanges::default()
        };
        let err = manager.update_flight(flight.id, changes).await.unwrap_err();
        assert!(err.is_validation());
        let stored = manager.repository().get_flight_list(flight.id).await.unwrap();
        assert_eq!(stored, Some(flight));
    }

    #[tokio::test]
    async fn test_delete_active_flight_clears_selection() {
        let mut manager = manager();
        let flight = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        let item = manager.add_recall_item(input("A", &[FlightPhase::Taxi])).await.unwrap();

        manager.delete_flight(flight.id).await.unwrap();
        assert!(manager.state().active_flight_id.is_none());
        assert!(manager.state().flight_lists.is_empty());
        assert!(manager.repository().get_recall_item(item.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_active_flight() {
        let mut manager = manager();
        let a = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        manager.create_flight(flight_input("SFO", "NYC")).await.unwrap();

        assert!(manager.set_active_flight(Some(a.id)).await.unwrap());
        assert_eq!(manager.state().active_flight_id, Some(a.id));

        assert!(!manager.set_active_flight(Some(999)).await.unwrap());
        assert_eq!(manager.state().active_flight_id, Some(a.id));

        assert!(manager.set_active_flight(None).await.unwrap());
        assert!(manager.state().active_flight_id.is_none());
    }

    #[tokio::test]
    async fn test_set_active_flight_loads_uncached_flight() {
        let mut manager = manager();
        let id = manager
            .repository()
            .add_flight_list(FlightListDraft {
                from_airport: "BOS".to_string(),
                to_airport: "ORD".to_string(),
                arrival_time: HOUR_MS,
                title: "BOS-ORD 0000".to_string(),
                ..FlightListDraft::default()
            })
            .await
            .unwrap();

        assert!(manager.set_active_flight(Some(id)).await.unwrap());
        assert_eq!(manager.state().active_flight().map(|f| f.id), Some(id));
    }

    #[tokio::test]
    async fn test_bootstrap_hydrates_and_activates_first_flight() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let item_id = repo
            .add_recall_item(RecallItemDraft::new("Item 1", vec![FlightPhase::Preflight]))
            .await
            .unwrap();
        repo.add_recall_item(RecallItemDraft::new("Item 2", vec![FlightPhase::Taxi]))
            .await
            .unwrap();
        let first_flight = repo
            .add_flight_list(FlightListDraft {
                from_airport: "JFK".to_string(),
                to_airport: "LAX".to_string(),
                arrival_time: HOUR_MS,
                title: "JFK-LAX 0000".to_string(),
                active_item_ids: vec![item_id],
                ..FlightListDraft::default()
            })
            .await
            .unwrap();
        repo.add_flight_list(FlightListDraft {
            from_airport: "SFO".to_string(),
            to_airport: "NYC".to_string(),
            arrival_time: HOUR_MS,
            title: "SFO-NYC 0000".to_string(),
            ..FlightListDraft::default()
        })
        .await
        .unwrap();

        let mut manager = RecallManager::new(repo, ViewState::default());
        manager.bootstrap(true).await.unwrap();

        assert_eq!(manager.state().recall_items.len(), 2);
        assert_eq!(manager.state().flight_lists.len(), 2);
        assert_eq!(manager.state().active_flight_id, Some(first_flight));
        assert_eq!(visible_ids(&manager), vec![item_id]);
    }

    #[tokio::test]
    async fn test_bootstrap_restores_remembered_flight() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let mut first = RecallManager::new(repo.clone(), ViewState::default());
        let a = first.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        let b = first.create_flight(flight_input("SFO", "NYC")).await.unwrap();
        assert!(first.set_active_flight(Some(a.id)).await.unwrap());

        let mut second = RecallManager::new(repo.clone(), ViewState::default());
        second.bootstrap(false).await.unwrap();
        assert_eq!(second.state().active_flight_id, Some(a.id));

        second.delete_flight(a.id).await.unwrap();
        let mut third = RecallManager::new(repo, ViewState::default());
        third.bootstrap(false).await.unwrap();
        assert_eq!(third.state().active_flight_id, Some(b.id));
    }

    #[tokio::test]
    async fn test_flight_checklist_only_shows_its_own_items() {
        let mut manager = manager();
        let a = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        let x = manager.add_recall_item(input("X", &[FlightPhase::Taxi])).await.unwrap();
        let b = manager.create_flight(flight_input("SFO", "SEA")).await.unwrap();
        let y = manager.add_recall_item(input("Y", &[FlightPhase::Taxi])).await.unwrap();
        manager.set_phase(FlightPhase::Taxi);

        let flight_ids = |m: &RecallManager<SqliteRepository>| {
            m.visible_flight_items().iter().map(|i| i.id).collect::<Vec<_>>()
        };
        assert_eq!(manager.state().active_flight_id, Some(b.id));
        assert_eq!(flight_ids(&manager), vec![y.id]);
        assert_eq!(visible_ids(&manager), vec![x.id, y.id]);

        assert!(manager.set_active_flight(Some(a.id)).await.unwrap());
        assert_eq!(flight_ids(&manager), vec![x.id]);

        manager.set_phase(FlightPhase::Cruise);
        assert!(flight_ids(&manager).is_empty());
    }

    #[tokio::test]
    async fn test_cleared_active_flight_stays_cleared() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let mut first = RecallManager::new(repo.clone(), ViewState::default());
        first.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        assert!(first.set_active_flight(None).await.unwrap());

        let mut second = RecallManager::new(repo.clone(), ViewState::default());
        second.bootstrap(false).await.unwrap();
        assert!(second.state().active_flight_id.is_none());

        second.reset().await.unwrap();
        let draft = sanitize_flight(flight_input("SFO", "SEA")).unwrap();
        let kept = second.repository().add_flight_list(draft).await.unwrap();

        let mut third = RecallManager::new(repo, ViewState::default());
        third.bootstrap(false).await.unwrap();
        assert_eq!(third.state().active_flight_id, Some(kept));
    }

    #[tokio::test]
    async fn test_bootstrap_empty_database() {
        let mut manager = manager();
        manager.bootstrap(false).await.unwrap();
        assert!(manager.state().active_flight_id.is_none());
        assert!(manager.visible_items().is_empty());
    }

    #[tokio::test]
    async fn test_phase_navigation_changes_visible_items() {
        let mut manager = manager();
        let taxi = manager.add_recall_item(input("Taxi", &[FlightPhase::Taxi])).await.unwrap();
        let takeoff = manager
            .add_recall_item(tier1("Rejected Takeoff", &[FlightPhase::Takeoff]))
            .await
            .unwrap();

        assert!(visible_ids(&manager).is_empty());
        assert_eq!(manager.next_phase(), FlightPhase::Taxi);
        assert_eq!(visible_ids(&manager), vec![taxi.id]);
        assert_eq!(manager.next_phase(), FlightPhase::Takeoff);
        assert_eq!(visible_ids(&manager), vec![takeoff.id]);
        assert_eq!(manager.previous_phase(), FlightPhase::Taxi);

        assert!(manager.toggle_critical());
        assert!(visible_ids(&manager).is_empty());
        manager.set_phase(FlightPhase::Takeoff);
        assert_eq!(visible_ids(&manager), vec![takeoff.id]);

        manager.set_critical_only(false);
        assert!(!manager.state().critical_only);
    }

    #[tokio::test]
    async fn test_reset_clears_data_but_keeps_view_settings() {
        let mut manager = manager();
        manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        manager.add_recall_item(input("A", &[FlightPhase::Cruise])).await.unwrap();
        manager.set_phase(FlightPhase::Cruise);
        manager.set_critical_only(true);

        manager.reset().await.unwrap();

        assert!(manager.state().recall_items.is_empty());
        assert!(manager.state().flight_lists.is_empty());
        assert!(manager.state().active_flight_id.is_none());
        assert_eq!(manager.state().current_phase, FlightPhase::Cruise);
        assert!(manager.state().critical_only);
        assert!(manager.repository().get_all_recall_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reload_drops_vanished_active_flight() {
        let mut manager = manager();
        let flight = manager.create_flight(flight_input("JFK", "LAX")).await.unwrap();
        manager.repository().delete_flight_list(flight.id).await.unwrap();

        manager.reload().await.unwrap();
        assert!(manager.state().active_flight_id.is_none());
    }
}
