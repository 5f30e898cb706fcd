//! Data models for the catalog.
//!
//! This module defines the anime record as served by the catalog API, the
//! validated star rating, and the mutation kinds tracked by the engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Anime entry from the catalog API
///
/// Endpoints disagree on rating field names and some send several at once,
/// so decoding goes through `WireAnimeRecord` and picks the first present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireAnimeRecord")]
pub struct AnimeRecord {
    pub id: String,
    pub title: String,

    /// Comma-separated tags; the first one is the primary genre
    pub genre: String,
    pub description: String,
    pub year: i32,
    pub image_url: Option<String>,

    /// Average across all users (0-5), None if nobody rated it
    pub global_rating: Option<f64>,

    /// The current user's own score (1-5), None if not rated
    pub current_user_rating: Option<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnimeRecord {
    id: String,
    title: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    image_url: Option<String>,

    #[serde(default)]
    global_rating: Option<f64>,
    #[serde(default)]
    average_rating: Option<f64>,
    #[serde(default)]
    rating: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_user_rating")]
    current_user_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    current_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    user_rating: Option<u8>,
}

impl From<WireAnimeRecord> for AnimeRecord {
    fn from(wire: WireAnimeRecord) -> Self {
        Self {
            id: wire.id,
            title: wire.title,
            genre: wire.genre,
            description: wire.description,
            year: wire.year,
            image_url: wire.image_url,
            global_rating: wire.global_rating.or(wire.average_rating).or(wire.rating),
            current_user_rating: wire
                .current_user_rating
                .or(wire.current_rating)
                .or(wire.user_rating),
        }
    }
}

impl AnimeRecord {
    /// The primary genre as written, e.g. "Action" for "Action, Shounen"
    pub fn primary_genre(&self) -> &str {
        self.genre.split(',').next().unwrap_or_default().trim()
    }

    /// Normalized primary genre used as a grouping key
    pub fn genre_key(&self) -> String {
        self.primary_genre().to_lowercase()
    }

    /// All genre tags, primary first
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.genre
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }
}

/// A star rating in the range 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw rating; None if it falls outside 1..=5
    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Stars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a confirmed rating submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireRatingReceipt")]
pub struct RatingReceipt {
    pub current_user_rating: Option<u8>,
    pub global_rating: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRatingReceipt {
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    current_user_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    current_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    stars: Option<u8>,

    #[serde(default)]
    global_rating: Option<f64>,
    #[serde(default)]
    average_rating: Option<f64>,
}

impl From<WireRatingReceipt> for RatingReceipt {
    fn from(wire: WireRatingReceipt) -> Self {
        Self {
            current_user_rating: wire
                .current_user_rating
                .or(wire.current_rating)
                .or(wire.stars),
            global_rating: wire.global_rating.or(wire.average_rating),
        }
    }
}

/// Which slot a mutation occupies
///
/// Adding and removing a favorite share one slot; ratings have their own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Favorite,
    Rating,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Favorite => write!(f, "favorite"),
            SlotKind::Rating => write!(f, "rating"),
        }
    }
}

/// Kind of optimistic mutation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    FavoriteAdd,
    FavoriteRemove,
    Rating,
}

impl MutationKind {
    pub fn slot(&self) -> SlotKind {
        match self {
            MutationKind::FavoriteAdd | MutationKind::FavoriteRemove => SlotKind::Favorite,
            MutationKind::Rating => SlotKind::Rating,
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::FavoriteAdd => write!(f, "favorite_add"),
            MutationKind::FavoriteRemove => write!(f, "favorite_remove"),
            MutationKind::Rating => write!(f, "rating"),
        }
    }
}

/// Accept integer or float scores; anything outside (0, 5] counts as unrated
fn deserialize_user_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .map(f64::round)
        .filter(|value| *value > 0.0 && *value <= f64::from(Stars::MAX))
        .map(|value| value as u8))
}
