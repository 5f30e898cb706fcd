//! Engine facade tying a gateway, a session and one catalog together.

use crate::coordinator::{FavoriteChange, MutationCoordinator};
use crate::error::{GatewayError, LoadError, MutationError};
use crate::gateway::CatalogGateway;
use crate::session::SessionGate;
use crate::store::{CatalogStore, Listing, LoadOutcome, SharedCatalog};
use shared::{AnimeRecord, RatingReceipt};
use std::sync::Arc;
use tracing::debug;

/// Catalog engine for one front end
///
/// The user id is read from the session on every call, so ending the
/// session takes effect immediately.
pub struct CatalogEngine<G, S> {
    gateway: Arc<G>,
    session: S,
    coordinator: MutationCoordinator<G>,
}

impl<G: CatalogGateway, S: SessionGate> CatalogEngine<G, S> {
    pub fn new(gateway: G, session: S) -> Self {
        let gateway = Arc::new(gateway);
        let coordinator = MutationCoordinator::new(Arc::clone(&gateway), SharedCatalog::new());
        Self {
            gateway,
            session,
            coordinator,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        self.coordinator.catalog()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn coordinator(&self) -> &MutationCoordinator<G> {
        &self.coordinator
    }

    fn user_id(&self) -> String {
        self.session.current_user_id().unwrap_or_default()
    }

    /// Load a listing for the current user
    pub async fn load(&self, listing: Listing) -> Result<LoadOutcome, LoadError> {
        let user_id = self.user_id();
        self.catalog()
            .load_listing(self.gateway.as_ref(), &user_id, listing)
            .await
    }

    pub async fn toggle_favorite(&self, anime_id: &str) -> Result<FavoriteChange, MutationError> {
        let user_id = self.user_id();
        self.coordinator.toggle_favorite(&user_id, anime_id).await
    }

    pub async fn rate_anime(
        &self,
        anime_id: &str,
        stars: i64,
    ) -> Result<RatingReceipt, MutationError> {
        let user_id = self.user_id();
        self.coordinator.rate_anime(&user_id, anime_id, stars).await
    }

    /// Fetch one record for the detail page
    ///
    /// The detail endpoint is not user-scoped, so the user's own rating is
    /// taken from the store when the response lacks it.
    pub async fn anime_details(&self, anime_id: &str) -> Result<AnimeRecord, GatewayError> {
        let mut record = self.gateway.fetch_anime(anime_id).await?;
        if record.current_user_rating.is_none() {
            record.current_user_rating = self.catalog().read(|store| {
                store
                    .record(anime_id)
                    .and_then(|local| local.current_user_rating)
            });
        }
        debug!(anime_id = anime_id, title = %record.title, "Fetched anime details");
        Ok(record)
    }

    /// Drop the store and abandon in-flight mutations
    pub fn on_session_end(&self) {
        self.catalog().discard();
    }

    pub fn read<R>(&self, f: impl FnOnce(&CatalogStore) -> R) -> R {
        self.catalog().read(f)
    }
}
