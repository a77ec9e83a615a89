//! The route-provider capability: a trait any directions backend can
//! implement, a memoizing decorator, and a deterministic fake for tests.

mod cache;
#[cfg(feature = "test-helpers")]
mod fake;

pub use cache::CachingRouteSource;
#[cfg(feature = "test-helpers")]
pub use fake::StaticRouteSource;

use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{Coordinates, RouteGeometry};
use crate::error::Error;

/// A source of driving routes. Failures to produce a route are reported
/// with recoverable errors so callers can degrade to straight-line
/// geometry instead of aborting a batch.
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Route through the given waypoints, in order. An empty waypoint list
    /// is exactly a two-point route.
    async fn route_via(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
    ) -> Result<RouteGeometry, Error>;

    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteGeometry, Error> {
        self.route_via(origin, &[], destination).await
    }
}

pub type DynRouteSource = Arc<dyn RouteSource>;

/// Canonical cache key: coordinates rounded to five decimals (about a
/// metre), waypoints in order. An empty waypoint list keys identically to
/// the plain two-point form.
pub fn route_key(origin: Coordinates, waypoints: &[Coordinates], destination: Coordinates) -> String {
    let mut key = format!("{}->", format_point(origin));
    for waypoint in waypoints {
        key.push_str(&format_point(*waypoint));
        key.push_str("->");
    }
    key.push_str(&format_point(destination));
    key
}

fn format_point(point: Coordinates) -> String {
    format!("{:.5},{:.5}", point.latitude, point.longitude)
}
