//! Error types for catalog loads, gateway calls and mutations.

use crate::store::Listing;
use shared::SlotKind;
use thiserror::Error;

/// Failure reported by a catalog gateway call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("server error (status {0})")]
    ServerError(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure loading a listing into the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The record source failed; nothing to show for this view
    #[error("failed to load {listing} listing: {source}")]
    Catalog {
        listing: Listing,
        #[source]
        source: GatewayError,
    },

    /// The session ended while the load was in flight
    #[error("session ended before the load completed")]
    Abandoned,
}

/// Non-fatal problem encountered during a load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    #[error("favorites unavailable ({0}), showing catalog without favorites")]
    FavoritesUnavailable(GatewayError),
}

/// Failure of a favorite or rating mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("rating must be between 1 and 5, got {stars}")]
    InvalidRating { stars: i64 },

    #[error("no user is logged in")]
    NoUser,

    #[error("anime {anime_id} is not in the loaded catalog")]
    UnknownAnime { anime_id: String },

    #[error("a {kind} change for anime {anime_id} is already in flight")]
    ConcurrentMutation { anime_id: String, kind: SlotKind },

    /// The gateway rejected the change; local state was rolled back
    #[error("{kind} change failed: {source}")]
    Failed {
        kind: SlotKind,
        #[source]
        source: GatewayError,
    },

    #[error("session ended before the change to anime {anime_id} was confirmed")]
    Abandoned { anime_id: String },
}

impl MutationError {
    /// Whether retrying the same action may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MutationError::Failed { .. } | MutationError::ConcurrentMutation { .. }
        )
    }
}
