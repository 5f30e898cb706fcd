//! Remote catalog gateway.
//!
//! The engine talks to the catalog service only through [`CatalogGateway`].
//! [`HttpGateway`] implements it against the catalog REST API; tests plug in
//! in-memory fakes.

pub mod client;
pub mod types;

pub use client::HttpGateway;
pub use types::*;

use crate::error::GatewayError;
use shared::{AnimeRecord, RatingReceipt, Stars};
use std::future::Future;

/// Operations the engine needs from the catalog service
pub trait CatalogGateway: Send + Sync {
    /// Full catalog, with the user's own ratings filled in.
    fn fetch_catalog(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, GatewayError>> + Send;

    /// Records the user has favorited.
    fn fetch_favorites(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, GatewayError>> + Send;

    /// Recently added records, newest first as decided by the server.
    fn fetch_recent(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, GatewayError>> + Send;

    /// Top-rated records. Ordering is not trusted; views re-sort.
    fn fetch_top(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, GatewayError>> + Send;

    /// Single record for the detail page.
    fn fetch_anime(
        &self,
        anime_id: &str,
    ) -> impl Future<Output = Result<AnimeRecord, GatewayError>> + Send;

    /// Returns the record if the server echoed one back.
    fn add_favorite(
        &self,
        user_id: &str,
        anime_id: &str,
    ) -> impl Future<Output = Result<Option<AnimeRecord>, GatewayError>> + Send;

    fn remove_favorite(
        &self,
        user_id: &str,
        anime_id: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn submit_rating(
        &self,
        user_id: &str,
        anime_id: &str,
        stars: Stars,
    ) -> impl Future<Output = Result<RatingReceipt, GatewayError>> + Send;
}
