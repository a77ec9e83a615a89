//! Deterministic in-memory route source for tests: synthesizes straight-line
//! routes at a nominal driving speed, with per-key overrides and failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::entities::{Coordinates, RouteGeometry, RouteLeg};
use crate::error::{route_unavailable_error, Error};
use crate::geo::haversine_km;
use crate::routing::{route_key, RouteSource};

const NOMINAL_SPEED_KMH: f64 = 40.0;
const VERTICES_PER_LEG: usize = 16;

pub struct StaticRouteSource {
    overrides: Mutex<HashMap<String, RouteGeometry>>,
    failures: Mutex<HashSet<String>>,
    synthesize: bool,
    calls: AtomicUsize,
}

impl StaticRouteSource {
    /// A source that synthesizes a straight-line route for any query.
    pub fn new() -> Self {
        Self {
            overrides: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            synthesize: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that fails every query it has no explicit route for.
    pub fn empty() -> Self {
        Self {
            synthesize: false,
            ..Self::new()
        }
    }

    pub fn insert_route(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
        route: RouteGeometry,
    ) {
        if let Ok(mut overrides) = self.overrides.lock() {
            overrides.insert(route_key(origin, waypoints, destination), route);
        }
    }

    /// Force the given query to report route-unavailable.
    pub fn fail_route(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
    ) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(route_key(origin, waypoints, destination));
        }
    }

    /// Number of route fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn synthesize_route(points: &[Coordinates]) -> RouteGeometry {
        let mut polyline = Vec::new();
        let mut legs = Vec::new();

        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let distance_km = haversine_km(&start, &end);

            legs.push(RouteLeg {
                distance_km,
                duration_min: distance_km / NOMINAL_SPEED_KMH * 60.0,
                start,
                end,
            });

            for step in 0..VERTICES_PER_LEG {
                let t = step as f64 / VERTICES_PER_LEG as f64;
                polyline.push(Coordinates {
                    latitude: start.latitude + t * (end.latitude - start.latitude),
                    longitude: start.longitude + t * (end.longitude - start.longitude),
                });
            }
        }

        if let Some(last) = points.last() {
            polyline.push(*last);
        }

        RouteGeometry {
            distance_km: legs.iter().map(|leg| leg.distance_km).sum(),
            duration_min: legs.iter().map(|leg| leg.duration_min).sum(),
            polyline,
            legs,
        }
    }
}

impl Default for StaticRouteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    async fn route_via(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
    ) -> Result<RouteGeometry, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let key = route_key(origin, waypoints, destination);

        if self
            .failures
            .lock()
            .map(|failures| failures.contains(&key))
            .unwrap_or(false)
        {
            return Err(route_unavailable_error());
        }

        if let Ok(overrides) = self.overrides.lock() {
            if let Some(route) = overrides.get(&key) {
                return Ok(route.clone());
            }
        }

        if !self.synthesize {
            return Err(route_unavailable_error());
        }

        let mut points = Vec::with_capacity(waypoints.len() + 2);
        points.push(origin);
        points.extend_from_slice(waypoints);
        points.push(destination);

        Ok(Self::synthesize_route(&points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    #[tokio::test]
    async fn synthesized_route_spans_the_endpoints() {
        let source = StaticRouteSource::new();
        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);

        let route = source.route(origin, destination).await.unwrap();

        assert_eq!(route.polyline.first(), Some(&origin));
        assert_eq!(route.polyline.last(), Some(&destination));
        assert_eq!(route.legs.len(), 1);
        assert!((route.distance_km - haversine_km(&origin, &destination)).abs() < 1e-9);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn waypoints_produce_one_leg_per_hop() {
        let source = StaticRouteSource::new();
        let route = source
            .route_via(
                point(45.75, 21.20),
                &[point(45.755, 21.22), point(45.76, 21.23)],
                point(45.77, 21.24),
            )
            .await
            .unwrap();

        assert_eq!(route.legs.len(), 3);
    }

    #[tokio::test]
    async fn forced_failures_and_empty_mode_report_unavailable() {
        let source = StaticRouteSource::new();
        let origin = point(45.75, 21.20);
        let destination = point(45.77, 21.24);
        source.fail_route(origin, &[], destination);

        let err = source.route(origin, destination).await.unwrap_err();
        assert!(err.is_recoverable());

        let empty = StaticRouteSource::empty();
        assert!(empty.route(origin, destination).await.is_err());
    }
}
