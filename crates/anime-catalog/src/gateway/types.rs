//! Catalog API request bodies.
//!
//! Response bodies decode straight into [`shared::AnimeRecord`] and
//! [`shared::RatingReceipt`].

use serde::Serialize;
use shared::Stars;

/// Body of `POST /favorites/{animeId}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest<'a> {
    pub user_id: &'a str,
}

/// Body of `POST /animes/{animeId}/rate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest<'a> {
    pub user_id: &'a str,
    pub stars: Stars,
}
