//! The route-compatibility engine: order classification, scoring and
//! ranking, standing-search notification, and the route diagnostics.

mod notifier;
mod order;
mod scoring;

pub use notifier::Notifier;
pub use scoring::{DetourBand, ScoringPolicy, TimeBand};

use crate::entities::Coordinates;
use crate::error::Error;
use crate::geo;
use crate::routing::DynRouteSource;

/// Overlap diagnostic threshold: a sampled point within 100 m of the other
/// route counts as shared path.
const OVERLAP_THRESHOLD_KM: f64 = 0.1;

pub struct Engine {
    routes: DynRouteSource,
    pub policy: ScoringPolicy,
}

impl Engine {
    pub fn new(routes: DynRouteSource) -> Self {
        Self::with_policy(routes, ScoringPolicy::default())
    }

    pub fn with_policy(routes: DynRouteSource, policy: ScoringPolicy) -> Self {
        Self { routes, policy }
    }

    pub(crate) fn routes(&self) -> &DynRouteSource {
        &self.routes
    }

    /// Diagnostic: whether `point` lies within the on-route threshold of the
    /// driving route between `origin` and `destination`.
    #[tracing::instrument(skip(self))]
    pub async fn point_on_route(
        &self,
        point: Coordinates,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<bool, Error> {
        let route = self.routes.route(origin, destination).await?;

        Ok(geo::is_point_on_route(
            &point,
            &route.polyline,
            self.policy.on_route_threshold_km,
        ))
    }

    /// Diagnostic: percentage of the first trip's route lying within 100 m
    /// of the second trip's route.
    #[tracing::instrument(skip(self))]
    pub async fn route_overlap_percent(
        &self,
        a_origin: Coordinates,
        a_destination: Coordinates,
        b_origin: Coordinates,
        b_destination: Coordinates,
    ) -> Result<f64, Error> {
        let a = self.routes.route(a_origin, a_destination).await?;
        let b = self.routes.route(b_origin, b_destination).await?;

        Ok(geo::route_overlap_percent(
            &a.polyline,
            &b.polyline,
            OVERLAP_THRESHOLD_KM,
        ))
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
    async fn point_on_route_uses_the_live_route() {
        let engine = Engine::new(Arc::new(StaticRouteSource::new()));

        let origin = point(45.7489, 21.2083);
        let destination = point(45.7650, 21.2300);

        let near = point(45.7536, 21.2257);
        let far = point(45.9000, 21.5000);

        assert!(engine.point_on_route(near, origin, destination).await.unwrap());
        assert!(!engine.point_on_route(far, origin, destination).await.unwrap());
    }

    #[tokio::test]
    async fn identical_trips_overlap_fully() {
        let engine = Engine::new(Arc::new(StaticRouteSource::new()));

        let origin = point(45.7489, 21.2083);
        let destination = point(45.7650, 21.2300);

        let overlap = engine
            .route_overlap_percent(origin, destination, origin, destination)
            .await
            .unwrap();
        assert!((overlap - 100.0).abs() < 1e-9);

        let disjoint = engine
            .route_overlap_percent(origin, destination, point(46.5, 22.0), point(46.6, 22.1))
            .await
            .unwrap();
        assert_eq!(disjoint, 0.0);
    }
}
