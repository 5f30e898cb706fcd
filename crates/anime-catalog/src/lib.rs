//! Catalog view-state engine for the anime catalog client.
//!
//! This library keeps the fetched catalog and the user's favorites and
//! ratings in memory, applies favorite/rating changes optimistically with
//! rollback on failure, and derives the list views the front end renders.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod pending;
pub mod session;
pub mod store;
pub mod views;

pub use coordinator::{FavoriteChange, MutationCoordinator};
pub use engine::CatalogEngine;
pub use error::{GatewayError, LoadError, LoadWarning, MutationError};
pub use gateway::{CatalogGateway, HttpGateway};
pub use pending::{MutationSlot, MutationStatus, PendingLedger, PendingMutation, PendingValue};
pub use session::{SessionGate, StaticSession};
pub use store::{CatalogStore, Listing, LoadOutcome, LoadSummary, SharedCatalog};
pub use views::ViewQuery;
