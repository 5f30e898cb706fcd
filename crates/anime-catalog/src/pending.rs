//! Pending optimistic mutations.
//!
//! Each in-flight favorite toggle or rating occupies one [`MutationSlot`]. The
//! ledger holds at most one [`PendingMutation`] per slot; the mutation keeps
//! the snapshot needed to restore the store exactly if the gateway call fails.
//! Confirmed changes go to the [`CommitLog`] while a load is in flight, so
//! the load can replay them over data fetched before the commit.

use crate::store::CatalogStore;
use chrono::{DateTime, Utc};
use shared::{MutationKind, SlotKind};
use std::collections::HashMap;

/// `(user, anime, kind)` tuple serializing mutation attempts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationSlot {
    pub user_id: String,
    pub anime_id: String,
    pub kind: SlotKind,
}

impl MutationSlot {
    pub fn new(user_id: &str, anime_id: &str, kind: SlotKind) -> Self {
        Self {
            user_id: user_id.to_string(),
            anime_id: anime_id.to_string(),
            kind,
        }
    }
}

/// Value of a slot before or after a mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingValue {
    /// Favorite membership
    Favorite(bool),
    /// Own rating, None = unrated
    Rating(Option<u8>),
}

impl PendingValue {
    /// Current value of the slot in the store
    pub(crate) fn read(kind: SlotKind, anime_id: &str, store: &CatalogStore) -> Self {
        match kind {
            SlotKind::Favorite => PendingValue::Favorite(store.is_favorite(anime_id)),
            SlotKind::Rating => PendingValue::Rating(
                store
                    .record(anime_id)
                    .and_then(|record| record.current_user_rating),
            ),
        }
    }

    pub(crate) fn write(self, anime_id: &str, store: &mut CatalogStore) {
        match self {
            PendingValue::Favorite(is_favorite) => {
                store.apply_favorite_delta(anime_id, is_favorite)
            }
            PendingValue::Rating(rating) => {
                store.apply_rating_delta(anime_id, rating);
            }
        }
    }
}

/// Lifecycle of a mutation slot: Pending, then Committed or RolledBack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Committed,
    RolledBack,
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationStatus::Pending => write!(f, "pending"),
            MutationStatus::Committed => write!(f, "committed"),
            MutationStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// An optimistic change waiting for gateway confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub slot: MutationSlot,
    pub kind: MutationKind,
    /// Snapshot restored on rollback
    pub previous: PendingValue,
    /// Value shown while the call is in flight
    pub optimistic: PendingValue,
    pub status: MutationStatus,
    pub started_at: DateTime<Utc>,
}

impl PendingMutation {
    /// Snapshot the slot's current value and record the intended one
    pub fn begin(
        slot: MutationSlot,
        kind: MutationKind,
        optimistic: PendingValue,
        store: &CatalogStore,
    ) -> Self {
        let previous = PendingValue::read(slot.kind, &slot.anime_id, store);
        Self {
            slot,
            kind,
            previous,
            optimistic,
            status: MutationStatus::Pending,
            started_at: Utc::now(),
        }
    }

    /// Show the optimistic value in the store
    pub fn apply(&self, store: &mut CatalogStore) {
        self.optimistic.write(&self.slot.anime_id, store);
    }

    /// Restore the snapshot and mark the mutation rolled back
    pub fn roll_back(&mut self, store: &mut CatalogStore) {
        self.previous.write(&self.slot.anime_id, store);
        self.status = MutationStatus::RolledBack;
    }

    pub fn commit(&mut self) {
        self.status = MutationStatus::Committed;
    }

    /// Re-base onto freshly loaded data
    ///
    /// The loaded value becomes the rollback target and the optimistic value
    /// is laid back on top, so a reload never clobbers an in-flight change.
    pub fn rebase(&mut self, store: &mut CatalogStore) {
        self.previous = PendingValue::read(self.slot.kind, &self.slot.anime_id, store);
        self.apply(store);
    }
}

/// At most one pending mutation per slot
#[derive(Debug, Clone, Default)]
pub struct PendingLedger {
    entries: HashMap<MutationSlot, PendingMutation>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, slot: &MutationSlot) -> bool {
        self.entries.contains_key(slot)
    }

    /// Record a mutation; hands it back if the slot is already taken
    pub fn insert(&mut self, mutation: PendingMutation) -> Result<(), PendingMutation> {
        if self.entries.contains_key(&mutation.slot) {
            return Err(mutation);
        }
        self.entries.insert(mutation.slot.clone(), mutation);
        Ok(())
    }

    /// Take a mutation out of the ledger once its call has resolved
    pub fn remove(&mut self, slot: &MutationSlot) -> Option<PendingMutation> {
        self.entries.remove(slot)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PendingMutation> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A confirmed change and the commit epoch it was made in
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommittedChange {
    pub(crate) epoch: u64,
    pub(crate) slot: MutationSlot,
    pub(crate) value: PendingValue,
    /// Aggregate returned with a rating, if any
    pub(crate) global_rating: Option<f64>,
}

impl CommittedChange {
    fn apply(&self, store: &mut CatalogStore) {
        self.value.write(&self.slot.anime_id, store);
        if self.global_rating.is_some() {
            store.apply_global_rating(&self.slot.anime_id, self.global_rating);
        }
    }
}

/// Changes confirmed while at least one load is in flight
///
/// Each load notes the epoch it started at. Commits after that epoch may be
/// missing from what the load fetched and are replayed over it. Entries no
/// in-flight load can need are pruned.
#[derive(Debug, Default)]
pub(crate) struct CommitLog {
    epoch: u64,
    entries: Vec<CommittedChange>,
    /// Start epochs of in-flight loads
    loads: Vec<u64>,
}

impl CommitLog {
    pub(crate) fn begin_load(&mut self) -> u64 {
        self.loads.push(self.epoch);
        self.epoch
    }

    pub(crate) fn finish_load(&mut self, started: u64) {
        if let Some(position) = self.loads.iter().position(|&epoch| epoch == started) {
            self.loads.swap_remove(position);
        }
        match self.loads.iter().min() {
            Some(&oldest) => self.entries.retain(|entry| entry.epoch > oldest),
            None => self.entries.clear(),
        }
    }

    pub(crate) fn record(
        &mut self,
        slot: MutationSlot,
        value: PendingValue,
        global_rating: Option<f64>,
    ) {
        self.epoch += 1;
        if self.loads.is_empty() {
            return;
        }
        self.entries.push(CommittedChange {
            epoch: self.epoch,
            slot,
            value,
            global_rating,
        });
    }

    /// Re-apply every change committed after `started`; returns how many
    pub(crate) fn replay(&self, started: u64, store: &mut CatalogStore) -> usize {
        let mut replayed = 0;
        for entry in self.entries.iter().filter(|entry| entry.epoch > started) {
            entry.apply(store);
            replayed += 1;
        }
        replayed
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
