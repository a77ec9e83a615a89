use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{DriverTrip, MatchResult, PassengerRoute};
use crate::error::Error;

/// Synchronous search surface used by the live ride-search endpoints.
/// Results come back ranked by score descending; how many to display is
/// the caller's policy, the engine only enforces its own admission floor.
#[async_trait]
pub trait MatchAPI {
    async fn find_matching_rides(
        &self,
        passenger: &PassengerRoute,
        candidates: Vec<DriverTrip>,
    ) -> Result<Vec<MatchResult>, Error>;
}

/// Fire-and-forget surface invoked after a trip is durably persisted.
/// Returns how many standing searches gained a saved match; failures are
/// logged internally and never surface to the trip-creation path.
#[async_trait]
pub trait NotifyAPI {
    async fn on_trip_created(&self, trip_id: Uuid) -> usize;
}

pub trait API: MatchAPI + NotifyAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
