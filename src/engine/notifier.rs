use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::Engine;
use crate::api::{MatchAPI, NotifyAPI, API};
use crate::entities::{DriverTrip, MatchResult, PassengerRoute, RiderSearch, SavedMatch};
use crate::error::Error;
use crate::store::DynMatchStore;

/// Standing-search workflow: whenever a new driver trip appears, re-score
/// every open rider search against it and persist the ones that qualify.
pub struct Notifier {
    engine: Arc<Engine>,
    store: DynMatchStore,
}

impl Notifier {
    pub fn new(engine: Arc<Engine>, store: DynMatchStore) -> Self {
        Self { engine, store }
    }

    /// Run the workflow decoupled from the caller, so trip creation never
    /// waits on it.
    pub fn spawn(self: &Arc<Self>, trip_id: Uuid) {
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            notifier.on_trip_created(trip_id).await;
        });
    }

    async fn notify(&self, trip_id: Uuid) -> Result<usize, Error> {
        let trip = match self.store.find_trip(trip_id).await? {
            Some(trip) if trip.status.is_active() => trip,
            // Unknown or inactive trips are a no-op, not an error.
            _ => return Ok(0),
        };

        let mut saved = 0;

        for search in self.store.active_searches().await? {
            // Cheap reject before any route lookups.
            if !search.route.schedule.shares_day(&trip.schedule) {
                continue;
            }

            match self.evaluate_search(&search, &trip).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(search_id = %search.id, error = ?e, "search evaluation skipped");
                }
            }
        }

        Ok(saved)
    }

    async fn evaluate_search(
        &self,
        search: &RiderSearch,
        trip: &DriverTrip,
    ) -> Result<bool, Error> {
        let matches = self
            .engine
            .rank_candidates(
                &search.route,
                vec![trip.clone()],
                self.engine.policy.notify_floor,
            )
            .await?;

        let best = match matches.first() {
            Some(best) => best,
            None => return Ok(false),
        };

        // Pre-check before the insert; the store's composite key backstops
        // racing writers.
        if self.store.match_exists(search.id, trip.id).await? {
            return Ok(false);
        }

        self.store
            .insert_match(&SavedMatch::new(search.id, trip.id, best.score))
            .await
    }
}

#[async_trait]
impl NotifyAPI for Notifier {
    #[tracing::instrument(skip(self))]
    async fn on_trip_created(&self, trip_id: Uuid) -> usize {
        match self.notify(trip_id).await {
            Ok(saved) => {
                tracing::info!(%trip_id, saved, "standing searches evaluated");
                saved
            }
            Err(e) => {
                tracing::warn!(%trip_id, error = ?e, "standing search evaluation failed");
                0
            }
        }
    }
}

#[async_trait]
impl MatchAPI for Notifier {
    async fn find_matching_rides(
        &self,
        passenger: &PassengerRoute,
        candidates: Vec<DriverTrip>,
    ) -> Result<Vec<MatchResult>, Error> {
        self.engine.find_matching_rides(passenger, candidates).await
    }
}

impl API for Notifier {}

#[cfg(test)]
mod tests {
    use chrono::Weekday::{Mon, Thu, Wed};
    use uuid::Uuid;

    use super::*;
    use crate::entities::{
        Coordinates, DriverMeta, MatchStatus, Schedule, SearchStatus, TripStatus,
    };
    use crate::routing::StaticRouteSource;
    use crate::store::InMemoryStore;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    fn timisoara_trip() -> DriverTrip {
        DriverTrip {
            id: Uuid::new_v4(),
            pickup: point(45.7489, 21.2083),
            dropoff: point(45.7650, 21.2300),
            schedule: Schedule::new(vec![Wed, Thu], "8:10 AM").unwrap(),
            price: 15.0,
            seats_available: 3,
            driver: DriverMeta {
                name: "Andrei".into(),
                rating: Some(4.8),
            },
            status: TripStatus::Active,
        }
    }

    fn commuter_search(days: Vec<chrono::Weekday>, time: &str) -> RiderSearch {
        RiderSearch {
            id: Uuid::new_v4(),
            passenger_id: Uuid::new_v4(),
            route: PassengerRoute {
                pickup: point(45.7536, 21.2257),
                dropoff: point(45.7608, 21.2264),
                schedule: Schedule::new(days, time).unwrap(),
            },
            status: SearchStatus::Active,
        }
    }

    fn notifier_with(store: Arc<InMemoryStore>) -> Notifier {
        let engine = Arc::new(Engine::new(Arc::new(StaticRouteSource::new())));
        Notifier::new(engine, store)
    }

    #[tokio::test]
    async fn qualifying_search_gets_a_saved_match() {
        let store = Arc::new(InMemoryStore::new());
        let trip = timisoara_trip();
        store.add_trip(trip.clone());
        let search = commuter_search(vec![Wed], "8:00 AM");
        store.add_search(search.clone());

        let notifier = notifier_with(store.clone());
        let saved = notifier.on_trip_created(trip.id).await;

        assert_eq!(saved, 1);

        let matches = store.saved_matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].search_id, search.id);
        assert_eq!(matches[0].trip_id, trip.id);
        assert_eq!(matches[0].status, MatchStatus::New);
        assert!(matches[0].score >= 40);
    }

    #[tokio::test]
    async fn repeated_notification_never_duplicates_a_match() {
        let store = Arc::new(InMemoryStore::new());
        let trip = timisoara_trip();
        store.add_trip(trip.clone());
        store.add_search(commuter_search(vec![Wed], "8:00 AM"));

        let notifier = notifier_with(store.clone());
        assert_eq!(notifier.on_trip_created(trip.id).await, 1);
        assert_eq!(notifier.on_trip_created(trip.id).await, 0);

        assert_eq!(store.saved_matches().len(), 1);
    }

    #[tokio::test]
    async fn unknown_or_inactive_trips_are_a_no_op() {
        let store = Arc::new(InMemoryStore::new());
        store.add_search(commuter_search(vec![Wed], "8:00 AM"));

        let notifier = notifier_with(store.clone());
        assert_eq!(notifier.on_trip_created(Uuid::new_v4()).await, 0);

        let mut cancelled = timisoara_trip();
        cancelled.status = TripStatus::Cancelled;
        store.add_trip(cancelled.clone());
        assert_eq!(notifier.on_trip_created(cancelled.id).await, 0);

        assert!(store.saved_matches().is_empty());
    }

    #[tokio::test]
    async fn day_mismatch_skips_scoring_entirely() {
        let store = Arc::new(InMemoryStore::new());
        let trip = timisoara_trip();
        store.add_trip(trip.clone());
        store.add_search(commuter_search(vec![Mon], "8:00 AM"));

        let routes = Arc::new(StaticRouteSource::new());
        let engine = Arc::new(Engine::new(routes.clone()));
        let notifier = Notifier::new(engine, store.clone());

        assert_eq!(notifier.on_trip_created(trip.id).await, 0);
        assert_eq!(routes.calls(), 0);
    }

    #[tokio::test]
    async fn notify_floor_admits_matches_the_live_search_would_not() {
        let store = Arc::new(InMemoryStore::new());
        let trip = timisoara_trip();
        store.add_trip(trip.clone());

        // Degraded scoring lands this at 45: below the live floor of 50,
        // above the notification floor of 40.
        let mut search = commuter_search(vec![Wed], "11:10 AM");
        search.route.pickup = point(45.75373, 21.21481);
        search.route.dropoff = point(45.7837, 21.2235);
        store.add_search(search);

        let engine = Arc::new(Engine::new(Arc::new(StaticRouteSource::empty())));
        let notifier = Notifier::new(engine, store.clone());

        assert_eq!(notifier.on_trip_created(trip.id).await, 1);
        assert_eq!(store.saved_matches()[0].score, 45);
    }
}
