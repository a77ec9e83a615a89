use super::Engine;

use crate::entities::{Coordinates, OrderCheckResult};
use crate::error::Error;
use crate::geo::{
    distance_to_polyline_km, distance_to_segment_km, nearest_vertex, segment_projection,
};

impl Engine {
    /// Classify where a rider's stops sit on a driver's route and whether
    /// the pickup comes strictly before the dropoff along it.
    ///
    /// When the provider cannot produce a route, degrades to the straight
    /// origin-destination segment; the degraded result has the same shape
    /// and feeds the scoring engine unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn check_route_order(
        &self,
        pickup: Coordinates,
        dropoff: Coordinates,
        driver_origin: Coordinates,
        driver_destination: Coordinates,
    ) -> Result<OrderCheckResult, Error> {
        let threshold = self.policy.on_route_threshold_km;

        match self.routes().route(driver_origin, driver_destination).await {
            Ok(route) if route.polyline.len() >= 2 => {
                Ok(classify_along(&route.polyline, pickup, dropoff, threshold))
            }
            // A degenerate path carries no order information.
            Ok(_) => Ok(straight_segment_check(
                pickup,
                dropoff,
                driver_origin,
                driver_destination,
                threshold,
            )),
            Err(e) if e.is_recoverable() => {
                tracing::debug!("route lookup failed, classifying against the straight segment");
                Ok(straight_segment_check(
                    pickup,
                    dropoff,
                    driver_origin,
                    driver_destination,
                    threshold,
                ))
            }
            Err(e) => Err(e),
        }
    }
}

fn classify_along(
    polyline: &[Coordinates],
    pickup: Coordinates,
    dropoff: Coordinates,
    threshold_km: f64,
) -> OrderCheckResult {
    let pickup_vertex = nearest_vertex(&pickup, polyline);
    let dropoff_vertex = nearest_vertex(&dropoff, polyline);

    // Strict: a tied vertex means the pickup does not precede the dropoff.
    let is_valid_order = match (pickup_vertex, dropoff_vertex) {
        (Some(p), Some(d)) => p < d,
        _ => false,
    };

    let pickup_distance_km = distance_to_polyline_km(&pickup, polyline);
    let dropoff_distance_km = distance_to_polyline_km(&dropoff, polyline);

    OrderCheckResult {
        is_valid_order,
        pickup_distance_km,
        dropoff_distance_km,
        pickup_on_route: pickup_distance_km <= threshold_km,
        dropoff_on_route: dropoff_distance_km <= threshold_km,
    }
}

/// Degraded classification against the straight origin-destination segment:
/// distances and on-route flags come from the segment scan, order validity
/// from comparing projection parameters along it. Shared with the scoring
/// engine's degraded pass so both use one fallback policy.
pub(crate) fn straight_segment_check(
    pickup: Coordinates,
    dropoff: Coordinates,
    origin: Coordinates,
    destination: Coordinates,
    threshold_km: f64,
) -> OrderCheckResult {
    let pickup_distance_km = distance_to_segment_km(&pickup, &origin, &destination);
    let dropoff_distance_km = distance_to_segment_km(&dropoff, &origin, &destination);

    let pickup_t = segment_projection(&pickup, &origin, &destination);
    let dropoff_t = segment_projection(&dropoff, &origin, &destination);

    OrderCheckResult {
        is_valid_order: pickup_t < dropoff_t,
        pickup_distance_km,
        dropoff_distance_km,
        pickup_on_route: pickup_distance_km <= threshold_km,
        dropoff_on_route: dropoff_distance_km <= threshold_km,
    }
}
