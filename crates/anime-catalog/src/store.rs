//! Catalog store.
//!
//! [`CatalogStore`] is the in-memory state behind one mounted view: the
//! records returned by the gateway, the user's favorite ids and own ratings.
//! It never performs I/O itself. [`SharedCatalog`] wraps it together with the
//! pending-mutation ledger and owns the load protocol:
//!
//! 1. Fetch the record list and the favorites concurrently
//! 2. Replace the store wholesale
//! 3. Replay changes confirmed while the fetch was in flight
//! 4. Lay any in-flight optimistic changes back on top
//!
//! A failed favorites fetch degrades to an empty favorite set with a warning;
//! a failed record fetch leaves the store untouched.

use crate::error::{GatewayError, LoadError, LoadWarning};
use crate::gateway::CatalogGateway;
use crate::pending::{CommitLog, MutationSlot, PendingLedger};
use chrono::{DateTime, Utc};
use shared::AnimeRecord;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Which gateway list populated the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Listing {
    #[default]
    All,
    Recent,
    Top,
    Favorites,
}

impl Listing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::All => "all",
            Listing::Recent => "recent",
            Listing::Top => "top",
            Listing::Favorites => "favorites",
        }
    }
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records, favorites and own ratings for one view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStore {
    listing: Listing,
    records: Vec<AnimeRecord>,
    /// id -> position in `records`
    index: HashMap<String, usize>,
    favorites: HashSet<String>,
    /// Bumped on every replace or clear
    version: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all records and favorites with a freshly fetched listing
    ///
    /// Records keep the order the gateway returned them in. A repeated id
    /// keeps its first occurrence.
    pub(crate) fn replace(
        &mut self,
        listing: Listing,
        records: Vec<AnimeRecord>,
        favorites: HashSet<String>,
    ) {
        let mut index = HashMap::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());

        for record in records {
            if index.contains_key(&record.id) {
                warn!(anime_id = %record.id, "Duplicate anime id in listing, keeping first");
                continue;
            }
            index.insert(record.id.clone(), unique.len());
            unique.push(record);
        }

        self.listing = listing;
        self.records = unique;
        self.index = index;
        self.favorites = favorites;
        self.version += 1;
        self.loaded_at = Some(Utc::now());
    }

    /// Drop all data, keeping the version counter monotonic
    pub(crate) fn clear(&mut self) {
        self.listing = Listing::default();
        self.records.clear();
        self.index.clear();
        self.favorites.clear();
        self.version += 1;
        self.loaded_at = None;
    }

    /// Set favorite membership for one id (memory only)
    pub fn apply_favorite_delta(&mut self, anime_id: &str, is_now_favorite: bool) {
        if is_now_favorite {
            self.favorites.insert(anime_id.to_string());
        } else {
            self.favorites.remove(anime_id);
        }
    }

    /// Set the user's own rating for one record; None marks it unrated
    ///
    /// Returns false if the record is not in the store.
    pub fn apply_rating_delta(&mut self, anime_id: &str, rating: Option<u8>) -> bool {
        match self.record_mut(anime_id) {
            Some(record) => {
                record.current_user_rating = rating;
                true
            }
            None => false,
        }
    }

    /// Replace the aggregate rating for one record
    pub fn apply_global_rating(&mut self, anime_id: &str, rating: Option<f64>) -> bool {
        match self.record_mut(anime_id) {
            Some(record) => {
                record.global_rating = rating;
                true
            }
            None => false,
        }
    }

    fn record_mut(&mut self, anime_id: &str) -> Option<&mut AnimeRecord> {
        let position = *self.index.get(anime_id)?;
        self.records.get_mut(position)
    }

    /// Records in gateway order
    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    pub fn record(&self, anime_id: &str) -> Option<&AnimeRecord> {
        self.index
            .get(anime_id)
            .and_then(|&position| self.records.get(position))
    }

    pub fn contains(&self, anime_id: &str) -> bool {
        self.index.contains_key(anime_id)
    }

    pub fn is_favorite(&self, anime_id: &str) -> bool {
        self.favorites.contains(anime_id)
    }

    pub fn favorites(&self) -> &HashSet<String> {
        &self.favorites
    }

    pub fn listing(&self) -> Listing {
        self.listing
    }

    /// Catalog version; changes whenever the record set is replaced
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of a load that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No user id was available; nothing was fetched
    NoUser,
    Loaded(LoadSummary),
}

/// Statistics for a completed load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub listing: Listing,
    pub version: u64,
    pub records: usize,
    pub favorites: usize,
    /// Changes confirmed during the fetch, replayed over the fresh data
    pub replayed: usize,
    /// Pending optimistic changes laid back on top of the fresh data
    pub reapplied: usize,
    pub warning: Option<LoadWarning>,
}

/// Data fetched for one load, before it touches the store
struct Fetched {
    records: Vec<AnimeRecord>,
    favorites: HashSet<String>,
    warning: Option<LoadWarning>,
}

/// Store plus the pending ledger, guarded together
#[derive(Debug, Default)]
pub(crate) struct CatalogState {
    pub(crate) store: CatalogStore,
    pub(crate) pending: PendingLedger,
    pub(crate) commits: CommitLog,
    /// Bumped when the session ends; in-flight work from an older
    /// generation must not touch the store
    pub(crate) generation: u64,
}

impl CatalogState {
    fn reconcile(&mut self, listing: Listing, fetched: Fetched, started: u64) -> LoadSummary {
        self.store
            .replace(listing, fetched.records, fetched.favorites);
        let replayed = self.commits.replay(started, &mut self.store);

        let mut reapplied = 0;
        for mutation in self.pending.iter_mut() {
            mutation.rebase(&mut self.store);
            reapplied += 1;
        }

        LoadSummary {
            listing,
            version: self.store.version(),
            records: self.store.len(),
            favorites: self.store.favorites().len(),
            replayed,
            reapplied,
            warning: fetched.warning,
        }
    }
}

/// Shared handle to the catalog state of one session
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<Mutex<CatalogState>>,
}

impl SharedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state; never held across an await
    pub(crate) fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against the store
    pub fn read<R>(&self, f: impl FnOnce(&CatalogStore) -> R) -> R {
        f(&self.lock().store)
    }

    /// Owned copy of the current store
    pub fn snapshot(&self) -> CatalogStore {
        self.read(CatalogStore::clone)
    }

    pub fn is_pending(&self, slot: &MutationSlot) -> bool {
        self.lock().pending.is_pending(slot)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Load the full catalog and the user's favorites
    pub async fn load<G: CatalogGateway>(
        &self,
        gateway: &G,
        user_id: &str,
    ) -> Result<LoadOutcome, LoadError> {
        self.load_listing(gateway, user_id, Listing::All).await
    }

    /// Load one listing and the user's favorites
    pub async fn load_listing<G: CatalogGateway>(
        &self,
        gateway: &G,
        user_id: &str,
        listing: Listing,
    ) -> Result<LoadOutcome, LoadError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            warn!(listing = %listing, "No user id available, skipping catalog load");
            return Ok(LoadOutcome::NoUser);
        }

        let ticket = LoadTicket::issue(self);
        debug!(user_id = user_id, listing = %listing, "Loading catalog");

        let fetched = fetch_listing(gateway, user_id, listing).await?;

        let mut state = self.lock();
        if state.generation != ticket.generation {
            info!(listing = %listing, "Session ended during load, discarding result");
            return Err(LoadError::Abandoned);
        }

        let summary = state.reconcile(listing, fetched, ticket.started);
        info!(
            user_id = user_id,
            listing = %listing,
            version = summary.version,
            records = summary.records,
            favorites = summary.favorites,
            replayed = summary.replayed,
            reapplied = summary.reapplied,
            "Catalog loaded"
        );

        Ok(LoadOutcome::Loaded(summary))
    }

    /// Throw away the store and abandon every pending mutation
    pub fn discard(&self) {
        let mut state = self.lock();
        let abandoned = state.pending.len();
        state.store.clear();
        state.pending.clear();
        state.commits.clear();
        state.generation += 1;
        info!(abandoned = abandoned, "Catalog discarded");
    }
}

/// Registers an in-flight load with the commit log until dropped
struct LoadTicket<'a> {
    catalog: &'a SharedCatalog,
    generation: u64,
    started: u64,
}

impl<'a> LoadTicket<'a> {
    fn issue(catalog: &'a SharedCatalog) -> Self {
        let mut state = catalog.lock();
        let started = state.commits.begin_load();
        Self {
            catalog,
            generation: state.generation,
            started,
        }
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        self.catalog.lock().commits.finish_load(self.started);
    }
}

async fn fetch_records<G: CatalogGateway>(
    gateway: &G,
    user_id: &str,
    listing: Listing,
) -> Result<Vec<AnimeRecord>, GatewayError> {
    match listing {
        Listing::All => gateway.fetch_catalog(user_id).await,
        Listing::Recent => gateway.fetch_recent(user_id).await,
        Listing::Top => gateway.fetch_top(user_id).await,
        Listing::Favorites => gateway.fetch_favorites(user_id).await,
    }
}

fn favorite_ids(records: &[AnimeRecord]) -> HashSet<String> {
    records.iter().map(|record| record.id.clone()).collect()
}

async fn fetch_listing<G: CatalogGateway>(
    gateway: &G,
    user_id: &str,
    listing: Listing,
) -> Result<Fetched, LoadError> {
    // The favorites listing is its own favorite set
    if listing == Listing::Favorites {
        let records = fetch_records(gateway, user_id, listing)
            .await
            .map_err(|source| load_failed(listing, source))?;
        let favorites = favorite_ids(&records);
        return Ok(Fetched {
            records,
            favorites,
            warning: None,
        });
    }

    let (records, favorites) = futures::join!(
        fetch_records(gateway, user_id, listing),
        gateway.fetch_favorites(user_id)
    );

    let records = records.map_err(|source| load_failed(listing, source))?;

    let (favorites, warning) = match favorites {
        Ok(favorites) => (favorite_ids(&favorites), None),
        Err(e) => {
            warn!(
                user_id = user_id,
                error = %e,
                "Failed to fetch favorites, continuing with none"
            );
            (HashSet::new(), Some(LoadWarning::FavoritesUnavailable(e)))
        }
    };

    Ok(Fetched {
        records,
        favorites,
        warning,
    })
}

fn load_failed(listing: Listing, source: GatewayError) -> LoadError {
    warn!(listing = %listing, error = %source, "Failed to fetch listing");
    LoadError::Catalog { listing, source }
}
