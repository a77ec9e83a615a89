//! The trip/search store the engine consumes: read access to active trips
//! and standing searches, write access limited to saved-match rows.

#[cfg(feature = "test-helpers")]
mod memory;
mod postgres;

#[cfg(feature = "test-helpers")]
pub use memory::InMemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{DriverTrip, RiderSearch, SavedMatch};
use crate::error::Error;

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_trip(&self, id: Uuid) -> Result<Option<DriverTrip>, Error>;

    async fn active_searches(&self) -> Result<Vec<RiderSearch>, Error>;

    async fn match_exists(&self, search_id: Uuid, trip_id: Uuid) -> Result<bool, Error>;

    /// Insert a saved match, returning false when one already exists for
    /// the (search, trip) pair.
    async fn insert_match(&self, saved: &SavedMatch) -> Result<bool, Error>;
}

pub type DynMatchStore = Arc<dyn MatchStore>;
