//! Asynchronous repository over the storage substrate.
//!
//! [`Repository`] is the persistence contract the rest of the crate talks
//! to. Each call is atomic from the caller's point of view. Missing records
//! come back as `None`; storage faults come back as errors and are never
//! swallowed. No validation happens here.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    FlightList, FlightListChanges, FlightListDraft, RecallItem, RecallItemChanges,
    RecallItemDraft, RememberedFlight,
};
use crate::storage::{Storage, StorageStats};

/// Persistence contract for recall items and flight lists.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Store a new recall item and return its identifier.
    async fn add_recall_item(&self, draft: RecallItemDraft) -> Result<i64>;

    /// Fetch a recall item.
    async fn get_recall_item(&self, id: i64) -> Result<Option<RecallItem>>;

    /// Merge changes into a recall item, refreshing `updated_at`.
    async fn update_recall_item(
        &self,
        id: i64,
        changes: RecallItemChanges,
    ) -> Result<Option<RecallItem>>;

    /// Remove a recall item. Removing a missing item is not an error.
    async fn delete_recall_item(&self, id: i64) -> Result<()>;

    /// Every stored recall item, ordered by identifier.
    async fn get_all_recall_items(&self) -> Result<Vec<RecallItem>>;

    /// Store a new flight list and return its identifier.
    async fn add_flight_list(&self, draft: FlightListDraft) -> Result<i64>;

    /// Fetch a flight list.
    async fn get_flight_list(&self, id: i64) -> Result<Option<FlightList>>;

    /// Every stored flight list, ordered by identifier.
    async fn get_all_flight_lists(&self) -> Result<Vec<FlightList>>;

    /// Merge changes into a flight list, refreshing `updated_at`.
    async fn update_flight_list(
        &self,
        id: i64,
        changes: FlightListChanges,
    ) -> Result<Option<FlightList>>;

    /// Remove a flight list. Removing a missing flight is not an error.
    async fn delete_flight_list(&self, id: i64) -> Result<()>;

    /// Wipe both collections.
    async fn clear_all_data(&self) -> Result<()>;

    /// Ask for durable storage. Best-effort: a refusal or failure yields
    /// `false` and never an error.
    async fn request_persistent_storage(&self) -> bool;

    /// Remember the active flight across sessions. Stores that cannot
    /// remember anything keep the default no-op.
    async fn remember_active_flight(&self, _id: Option<i64>) -> Result<()> {
        Ok(())
    }

    /// Drop whatever [`Repository::remember_active_flight`] stored.
    async fn forget_active_flight(&self) -> Result<()> {
        Ok(())
    }

    /// The flight remembered by [`Repository::remember_active_flight`].
    async fn remembered_active_flight(&self) -> Result<RememberedFlight> {
        Ok(RememberedFlight::Unset)
    }

    /// Recall items associated with a flight.
    ///
    /// Identifiers that no longer resolve are dropped silently and an
    /// unknown flight yields an empty list. Items come back in stored order.
    async fn get_flight_list_items(&self, flight_id: i64) -> Result<Vec<RecallItem>> {
        let Some(flight) = self.get_flight_list(flight_id).await? else {
            return Ok(Vec::new());
        };

        let items: Vec<RecallItem> = self
            .get_all_recall_items()
            .await?
            .into_iter()
            .filter(|item| flight.contains_item(item.id))
            .collect();

        let dangling = count_dangling(&flight.active_item_ids, &items);
        if dangling > 0 {
            debug!(
                "Flight {} references {} recall items that no longer exist",
                flight_id, dangling
            );
        }
        Ok(items)
    }
}

/// Number of `ids` with no matching item. Repeated ids count each time.
fn count_dangling(ids: &[i64], items: &[RecallItem]) -> usize {
    ids.iter()
        .filter(|id| !items.iter().any(|item| item.id == **id))
        .count()
}

/// [`Repository`] backed by a `SQLite` [`Storage`].
///
/// Calls run on tokio's blocking pool and are serialized through a mutex, so
/// operations issued from one logical flow complete in issue order.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    storage: Arc<Mutex<Storage>>,
}

impl SqliteRepository {
    /// Wrap an open storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Open a repository on the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Storage::open(path).map(Self::new)
    }

    /// Open a repository on a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Storage::open_in_memory().map(Self::new)
    }

    /// Storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn stats(&self) -> Result<StorageStats> {
        self.with_storage(|storage| storage.stats()).await
    }

    async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::storage_unavailable("storage lock poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::storage_unavailable(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn add_recall_item(&self, draft: RecallItemDraft) -> Result<i64> {
        self.with_storage(move |s| s.insert_recall_item(&draft)).await
    }

    async fn get_recall_item(&self, id: i64) -> Result<Option<RecallItem>> {
        self.with_storage(move |s| s.get_recall_item(id)).await
    }

    async fn update_recall_item(
        &self,
        id: i64,
        changes: RecallItemChanges,
    ) -> Result<Option<RecallItem>> {
        self.with_storage(move |s| s.update_recall_item(id, &changes))
            .await
    }

    async fn delete_recall_item(&self, id: i64) -> Result<()> {
        let existed = self.with_storage(move |s| s.delete_recall_item(id)).await?;
        if !existed {
            debug!("Recall item {} already absent", id);
        }
        Ok(())
    }

    async fn get_all_recall_items(&self) -> Result<Vec<RecallItem>> {
        self.with_storage(Storage::all_recall_items).await
    }

    async fn add_flight_list(&self, draft: FlightListDraft) -> Result<i64> {
        self.with_storage(move |s| s.insert_flight_list(&draft)).await
    }

    async fn get_flight_list(&self, id: i64) -> Result<Option<FlightList>> {
        self.with_storage(move |s| s.get_flight_list(id)).await
    }

    async fn get_all_flight_lists(&self) -> Result<Vec<FlightList>> {
        self.with_storage(Storage::all_flight_lists).await
    }

    async fn update_flight_list(
        &self,
        id: i64,
        changes: FlightListChanges,
    ) -> Result<Option<FlightList>> {
        self.with_storage(move |s| s.update_flight_list(id, &changes))
            .await
    }

    async fn delete_flight_list(&self, id: i64) -> Result<()> {
        let existed = self.with_storage(move |s| s.delete_flight_list(id)).await?;
        if !existed {
            debug!("Flight list {} already absent", id);
        }
        Ok(())
    }

    async fn clear_all_data(&self) -> Result<()> {
        self.with_storage(Storage::clear_all).await
    }

    async fn remember_active_flight(&self, id: Option<i64>) -> Result<()> {
        self.with_storage(move |s| s.set_active_flight_id(id)).await
    }

    async fn forget_active_flight(&self) -> Result<()> {
        self.with_storage(Storage::forget_active_flight_id).await
    }

    async fn remembered_active_flight(&self) -> Result<RememberedFlight> {
        self.with_storage(Storage::active_flight_id).await
    }

    async fn request_persistent_storage(&self) -> bool {
        let result = self
            .with_storage(|s| {
                let granted = !s.is_in_memory();
                s.set_persistence_granted(granted)?;
                Ok(granted)
            })
            .await;

        match result {
            Ok(true) => {
                info!("Persistent storage granted");
                true
            }
            Ok(false) => {
                warn!("Persistent storage not granted - data is kept in memory only");
                false
            }
            Err(e) => {
                warn!("Error requesting persistent storage: {}", e);
                false
            }
        }
    }
}
