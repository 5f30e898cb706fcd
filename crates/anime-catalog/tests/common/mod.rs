//! In-memory catalog gateway for integration tests.
#![allow(dead_code)]

use anime_catalog::{CatalogGateway, GatewayError};
use shared::{AnimeRecord, RatingReceipt, Stars};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// Gateway operation, used to inject failures and hold calls open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Catalog,
    Favorites,
    Recent,
    Top,
    Anime,
    AddFavorite,
    RemoveFavorite,
    Rate,
}

#[derive(Default)]
struct FakeState {
    catalog: Vec<AnimeRecord>,
    favorites: HashSet<String>,
    recent: Vec<AnimeRecord>,
    top: Vec<AnimeRecord>,
    receipt: Option<RatingReceipt>,
    /// Answer adds with an empty body
    quiet_adds: bool,
    failures: HashMap<Op, GatewayError>,
    holds: HashSet<Op>,
    calls: HashMap<Op, usize>,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
    release: Notify,
}

pub fn anime(id: &str, title: &str, genre: &str) -> AnimeRecord {
    AnimeRecord {
        id: id.to_string(),
        title: title.to_string(),
        genre: genre.to_string(),
        description: format!("{} description", title),
        year: 2004,
        image_url: None,
        global_rating: None,
        current_user_rating: None,
    }
}

impl FakeGateway {
    pub fn new(catalog: Vec<AnimeRecord>) -> Self {
        let gateway = Self::default();
        gateway.state().catalog = catalog;
        gateway
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_favorites(self, ids: &[&str]) -> Self {
        self.state().favorites = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_recent(self, records: Vec<AnimeRecord>) -> Self {
        self.state().recent = records;
        self
    }

    pub fn with_top(self, records: Vec<AnimeRecord>) -> Self {
        self.state().top = records;
        self
    }

    pub fn set_catalog(&self, records: Vec<AnimeRecord>) {
        self.state().catalog = records;
    }

    /// Change the server-side favorites behind the engine's back
    pub fn set_favorites(&self, ids: &[&str]) {
        self.state().favorites = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn set_quiet_adds(&self, quiet: bool) {
        self.state().quiet_adds = quiet;
    }

    pub fn set_receipt(&self, receipt: RatingReceipt) {
        self.state().receipt = Some(receipt);
    }

    pub fn server_favorites(&self) -> HashSet<String> {
        self.state().favorites.clone()
    }

    pub fn fail(&self, op: Op, error: GatewayError) {
        self.state().failures.insert(op, error);
    }

    pub fn recover(&self, op: Op) {
        self.state().failures.remove(&op);
    }

    /// Block calls to `op` until [`FakeGateway::release`]
    pub fn hold(&self, op: Op) {
        self.state().holds.insert(op);
    }

    pub fn release(&self, op: Op) {
        self.state().holds.remove(&op);
        self.release.notify_waiters();
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    /// Count the call, wait while held, then report any injected failure
    async fn enter(&self, op: Op) -> Result<(), GatewayError> {
        *self.state().calls.entry(op).or_default() += 1;

        loop {
            let notified = self.release.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.state().holds.contains(&op) {
                break;
            }
            notified.await;
        }

        match self.state().failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn find(&self, anime_id: &str) -> Result<AnimeRecord, GatewayError> {
        self.state()
            .catalog
            .iter()
            .find(|record| record.id == anime_id)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}

impl CatalogGateway for FakeGateway {
    async fn fetch_catalog(&self, _user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        self.enter(Op::Catalog).await?;
        Ok(self.state().catalog.clone())
    }

    async fn fetch_favorites(&self, _user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        self.enter(Op::Favorites).await?;
        let state = self.state();
        Ok(state
            .catalog
            .iter()
            .filter(|record| state.favorites.contains(&record.id))
            .cloned()
            .collect())
    }

    async fn fetch_recent(&self, _user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        self.enter(Op::Recent).await?;
        Ok(self.state().recent.clone())
    }

    async fn fetch_top(&self, _user_id: &str) -> Result<Vec<AnimeRecord>, GatewayError> {
        self.enter(Op::Top).await?;
        Ok(self.state().top.clone())
    }

    async fn fetch_anime(&self, anime_id: &str) -> Result<AnimeRecord, GatewayError> {
        self.enter(Op::Anime).await?;
        self.find(anime_id)
    }

    async fn add_favorite(
        &self,
        _user_id: &str,
        anime_id: &str,
    ) -> Result<Option<AnimeRecord>, GatewayError> {
        self.enter(Op::AddFavorite).await?;
        let record = self.find(anime_id)?;
        let mut state = self.state();
        state.favorites.insert(anime_id.to_string());
        Ok((!state.quiet_adds).then_some(record))
    }

    async fn remove_favorite(&self, _user_id: &str, anime_id: &str) -> Result<(), GatewayError> {
        self.enter(Op::RemoveFavorite).await?;
        self.state().favorites.remove(anime_id);
        Ok(())
    }

    async fn submit_rating(
        &self,
        _user_id: &str,
        anime_id: &str,
        stars: Stars,
    ) -> Result<RatingReceipt, GatewayError> {
        self.enter(Op::Rate).await?;
        let mut state = self.state();
        if let Some(record) = state.catalog.iter_mut().find(|record| record.id == anime_id) {
            record.current_user_rating = Some(stars.get());
        }
        Ok(state.receipt.clone().unwrap_or(RatingReceipt {
            current_user_rating: Some(stars.get()),
            global_rating: None,
        }))
    }
}
