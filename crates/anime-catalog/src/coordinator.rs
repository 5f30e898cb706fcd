//! Optimistic favorite and rating mutations.
//!
//! Every mutation follows the same protocol: snapshot the slot, show the
//! optimistic value, call the gateway without holding the lock, then commit
//! or restore the snapshot. A second call on a slot that is still in flight
//! is rejected rather than queued.

use crate::error::{GatewayError, MutationError};
use crate::gateway::CatalogGateway;
use crate::pending::{MutationSlot, PendingMutation, PendingValue};
use crate::store::{CatalogStore, SharedCatalog};
use shared::{AnimeRecord, MutationKind, RatingReceipt, SlotKind, Stars};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Confirmed result of a favorite toggle
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteChange {
    pub anime_id: String,
    pub is_favorite: bool,
    /// Record echoed by the gateway on add, if it sent one; None on remove
    pub record: Option<AnimeRecord>,
}

/// Runs favorite toggles and rating submissions against one catalog
pub struct MutationCoordinator<G> {
    gateway: Arc<G>,
    catalog: SharedCatalog,
}

impl<G> Clone for MutationCoordinator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            catalog: self.catalog.clone(),
        }
    }
}

impl<G: CatalogGateway> MutationCoordinator<G> {
    pub fn new(gateway: Arc<G>, catalog: SharedCatalog) -> Self {
        Self { gateway, catalog }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// Flip favorite membership for one anime
    pub async fn toggle_favorite(
        &self,
        user_id: &str,
        anime_id: &str,
    ) -> Result<FavoriteChange, MutationError> {
        let user_id = require_user(user_id)?;
        let slot = MutationSlot::new(user_id, anime_id, SlotKind::Favorite);

        let (kind, generation) = self.begin(&slot, |store| {
            if store.is_favorite(anime_id) {
                (MutationKind::FavoriteRemove, PendingValue::Favorite(false))
            } else {
                (MutationKind::FavoriteAdd, PendingValue::Favorite(true))
            }
        })?;

        let is_favorite = kind == MutationKind::FavoriteAdd;
        let result = if is_favorite {
            self.gateway.add_favorite(user_id, anime_id).await
        } else {
            self.gateway
                .remove_favorite(user_id, anime_id)
                .await
                .map(|()| None)
        };

        let record = self.resolve(&slot, kind, generation, result, |_, _| None)?;

        Ok(FavoriteChange {
            anime_id: anime_id.to_string(),
            is_favorite,
            record,
        })
    }

    /// Submit the user's own rating for one anime
    ///
    /// `stars` outside 1..=5 is rejected before anything else happens.
    pub async fn rate_anime(
        &self,
        user_id: &str,
        anime_id: &str,
        stars: i64,
    ) -> Result<RatingReceipt, MutationError> {
        let stars = Stars::new(stars).ok_or(MutationError::InvalidRating { stars })?;
        let user_id = require_user(user_id)?;
        let slot = MutationSlot::new(user_id, anime_id, SlotKind::Rating);

        let (kind, generation) = self.begin(&slot, |_| {
            (
                MutationKind::Rating,
                PendingValue::Rating(Some(stars.get())),
            )
        })?;

        let result = self.gateway.submit_rating(user_id, anime_id, stars).await;

        self.resolve(&slot, kind, generation, result, |store, receipt| {
            // The server's view of the user's rating wins over ours
            if let Some(rating) = receipt.current_user_rating {
                store.apply_rating_delta(anime_id, Some(rating));
            }
            if receipt.global_rating.is_some() {
                store.apply_global_rating(anime_id, receipt.global_rating);
            }
            receipt.global_rating
        })
    }

    /// Validate, snapshot and apply the optimistic value
    ///
    /// Returns the mutation kind and the session generation it started in.
    fn begin(
        &self,
        slot: &MutationSlot,
        decide: impl FnOnce(&CatalogStore) -> (MutationKind, PendingValue),
    ) -> Result<(MutationKind, u64), MutationError> {
        let mut guard = self.catalog.lock();
        let state = &mut *guard;

        if !state.store.contains(&slot.anime_id) {
            return Err(MutationError::UnknownAnime {
                anime_id: slot.anime_id.clone(),
            });
        }

        if state.pending.is_pending(slot) {
            warn!(
                user_id = %slot.user_id,
                anime_id = %slot.anime_id,
                kind = %slot.kind,
                "Mutation already in flight, rejecting"
            );
            return Err(MutationError::ConcurrentMutation {
                anime_id: slot.anime_id.clone(),
                kind: slot.kind,
            });
        }

        let (kind, optimistic) = decide(&state.store);
        let mutation = PendingMutation::begin(slot.clone(), kind, optimistic, &state.store);
        mutation.apply(&mut state.store);
        debug!(
            anime_id = %slot.anime_id,
            kind = %kind,
            previous = ?mutation.previous,
            optimistic = ?mutation.optimistic,
            "Applied optimistic change"
        );

        state
            .pending
            .insert(mutation)
            .map_err(|rejected| MutationError::ConcurrentMutation {
                anime_id: rejected.slot.anime_id,
                kind: rejected.slot.kind,
            })?;

        Ok((kind, state.generation))
    }

    /// Commit or roll back once the gateway has answered
    ///
    /// `on_commit` applies the gateway's answer and returns the new aggregate
    /// rating, if the answer carried one.
    fn resolve<T>(
        &self,
        slot: &MutationSlot,
        kind: MutationKind,
        generation: u64,
        result: Result<T, GatewayError>,
        on_commit: impl FnOnce(&mut CatalogStore, &T) -> Option<f64>,
    ) -> Result<T, MutationError> {
        let mut guard = self.catalog.lock();
        let state = &mut *guard;

        let abandoned = || MutationError::Abandoned {
            anime_id: slot.anime_id.clone(),
        };

        if state.generation != generation {
            info!(
                anime_id = %slot.anime_id,
                kind = %kind,
                "Session ended while mutation was in flight, dropping result"
            );
            return Err(abandoned());
        }

        let Some(mut mutation) = state.pending.remove(slot) else {
            return Err(abandoned());
        };

        match result {
            Ok(value) => {
                mutation.commit();
                let global_rating = on_commit(&mut state.store, &value);
                let confirmed = PendingValue::read(slot.kind, &slot.anime_id, &state.store);
                state.commits.record(slot.clone(), confirmed, global_rating);
                info!(
                    user_id = %slot.user_id,
                    anime_id = %slot.anime_id,
                    kind = %kind,
                    status = %mutation.status,
                    "Mutation confirmed"
                );
                Ok(value)
            }
            Err(source) => {
                mutation.roll_back(&mut state.store);
                warn!(
                    user_id = %slot.user_id,
                    anime_id = %slot.anime_id,
                    kind = %kind,
                    status = %mutation.status,
                    error = %source,
                    "Mutation failed, rolled back"
                );
                Err(MutationError::Failed {
                    kind: kind.slot(),
                    source,
                })
            }
        }
    }
}

fn require_user(user_id: &str) -> Result<&str, MutationError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Err(MutationError::NoUser)
    } else {
        Ok(user_id)
    }
}
