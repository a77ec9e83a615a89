use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use crate::entities::{Coordinates, RouteGeometry};
use crate::error::Error;
use crate::routing::{route_key, DynRouteSource, RouteSource};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 512;

/// Memoizing decorator around any [`RouteSource`]. Entries expire hard at
/// the TTL and are bounded by an LRU capacity. The lock is held only
/// around map operations, never across the provider call, and a fetched
/// route is inserted in a single operation, so concurrent callers either
/// see a complete entry or none. Overwrites of the same key are idempotent.
pub struct CachingRouteSource {
    inner: DynRouteSource,
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry>>,
}

struct CacheEntry {
    stored_at: Instant,
    route: RouteGeometry,
}

impl CachingRouteSource {
    pub fn new(inner: DynRouteSource) -> Self {
        Self::with_policy(inner, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_policy(inner: DynRouteSource, ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lookup(&self, key: &str) -> Option<RouteGeometry> {
        let mut entries = self.entries.lock().ok()?;

        if let Some(entry) = entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.route.clone());
            }
            // Hard expiry: a stale entry must never be served.
            entries.pop(key);
        }

        None
    }

    fn store(&self, key: String, route: &RouteGeometry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key,
                CacheEntry {
                    stored_at: Instant::now(),
                    route: route.clone(),
                },
            );
        }
    }
}

#[async_trait]
impl RouteSource for CachingRouteSource {
    async fn route_via(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
    ) -> Result<RouteGeometry, Error> {
        let key = route_key(origin, waypoints, destination);

        if let Some(route) = self.lookup(&key) {
            tracing::debug!(%key, "route cache hit");
            return Ok(route);
        }

        let route = self.inner.route_via(origin, waypoints, destination).await?;
        self.store(key, &route);

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::routing::StaticRouteSource;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    #[tokio::test]
    async fn hit_is_identical_and_fetches_once() {
        let fake = Arc::new(StaticRouteSource::new());
        let cache = CachingRouteSource::new(fake.clone());

        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);

        let first = cache.route(origin, destination).await.unwrap();
        let second = cache.route(origin, destination).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let fake = Arc::new(StaticRouteSource::new());
        let cache = CachingRouteSource::with_policy(fake.clone(), Duration::ZERO, 16);

        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);

        cache.route(origin, destination).await.unwrap();
        cache.route(origin, destination).await.unwrap();

        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn waypoint_queries_key_separately_from_plain_routes() {
        let fake = Arc::new(StaticRouteSource::new());
        let cache = CachingRouteSource::new(fake.clone());

        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);
        let stop = point(45.76, 21.22);

        cache.route(origin, destination).await.unwrap();
        cache.route_via(origin, &[stop], destination).await.unwrap();
        assert_eq!(fake.calls(), 2);

        // The empty-waypoint form shares the plain route's entry.
        cache.route_via(origin, &[], destination).await.unwrap();
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn capacity_bound_evicts_least_recent() {
        let fake = Arc::new(StaticRouteSource::new());
        let cache = CachingRouteSource::with_policy(fake.clone(), DEFAULT_TTL, 1);

        let a = point(45.75, 21.20);
        let b = point(45.77, 21.24);
        let c = point(45.80, 21.30);

        cache.route(a, b).await.unwrap();
        cache.route(a, c).await.unwrap();
        cache.route(a, b).await.unwrap();

        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test]
    async fn provider_failures_are_not_cached() {
        let fake = Arc::new(StaticRouteSource::empty());
        let cache = CachingRouteSource::new(fake.clone());

        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);

        assert!(cache.route(origin, destination).await.is_err());
        assert!(cache.route(origin, destination).await.is_err());
        assert_eq!(fake.calls(), 2);
    }
}
