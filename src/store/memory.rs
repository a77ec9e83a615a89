//! In-memory store for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{DriverTrip, RiderSearch, SavedMatch};
use crate::error::{unexpected_error, Error};
use crate::store::MatchStore;

#[derive(Default)]
pub struct InMemoryStore {
    trips: RwLock<HashMap<Uuid, DriverTrip>>,
    searches: RwLock<Vec<RiderSearch>>,
    matches: RwLock<HashMap<(Uuid, Uuid), SavedMatch>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trip(&self, trip: DriverTrip) {
        if let Ok(mut trips) = self.trips.write() {
            trips.insert(trip.id, trip);
        }
    }

    pub fn add_search(&self, search: RiderSearch) {
        if let Ok(mut searches) = self.searches.write() {
            searches.push(search);
        }
    }

    pub fn saved_matches(&self) -> Vec<SavedMatch> {
        self.matches
            .read()
            .map(|matches| matches.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn find_trip(&self, id: Uuid) -> Result<Option<DriverTrip>, Error> {
        let trips = self.trips.read().map_err(|_| unexpected_error())?;
        Ok(trips.get(&id).cloned())
    }

    async fn active_searches(&self) -> Result<Vec<RiderSearch>, Error> {
        let searches = self.searches.read().map_err(|_| unexpected_error())?;
        Ok(searches
            .iter()
            .filter(|search| search.status.is_active())
            .cloned()
            .collect())
    }

    async fn match_exists(&self, search_id: Uuid, trip_id: Uuid) -> Result<bool, Error> {
        let matches = self.matches.read().map_err(|_| unexpected_error())?;
        Ok(matches.contains_key(&(search_id, trip_id)))
    }

    async fn insert_match(&self, saved: &SavedMatch) -> Result<bool, Error> {
        let mut matches = self.matches.write().map_err(|_| unexpected_error())?;
        let key = (saved.search_id, saved.trip_id);

        if matches.contains_key(&key) {
            return Ok(false);
        }

        matches.insert(key, saved.clone());
        Ok(true)
    }
}
