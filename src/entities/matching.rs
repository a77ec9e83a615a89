use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, RouteGeometry, RouteSummary};

/// Where a rider's stops sit relative to a driver's route, and whether the
/// pickup comes strictly before the dropoff along it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderCheckResult {
    pub is_valid_order: bool,
    pub pickup_distance_km: f64,
    pub dropoff_distance_km: f64,
    pub pickup_on_route: bool,
    pub dropoff_on_route: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendedRoute {
    pub distance_km: f64,
    pub duration_min: f64,
    pub legs: Vec<LabeledLeg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledLeg {
    pub label: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub start: Coordinates,
    pub end: Coordinates,
}

const LEG_LABELS: [&str; 4] = [
    "Driver start to passenger pickup",
    "Passenger pickup to passenger dropoff",
    "Passenger dropoff to driver destination",
    "Remaining leg",
];

impl RecommendedRoute {
    /// Label the legs of a waypoint route in driver-origin, pickup, dropoff,
    /// destination order.
    pub fn from_geometry(route: &RouteGeometry) -> Self {
        let legs = route
            .legs
            .iter()
            .enumerate()
            .map(|(i, leg)| LabeledLeg {
                label: LEG_LABELS[i.min(LEG_LABELS.len() - 1)].into(),
                distance_km: leg.distance_km,
                duration_min: leg.duration_min,
                start: leg.start,
                end: leg.end,
            })
            .collect();

        Self {
            distance_km: route.distance_km,
            duration_min: route.duration_min,
            legs,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    pub trip_id: Uuid,
    pub score: i32,
    pub reasons: Vec<String>,
    pub pickup_distance_km: f64,
    pub dropoff_distance_km: f64,
    pub is_valid_order: bool,
    pub time_difference_min: i64,
    pub recommended_route: Option<RecommendedRoute>,
    pub original_route: Option<RouteSummary>,
    pub detour_distance_km: f64,
    pub detour_duration_min: f64,
}

/// The persisted subset of a match, written by the standing-search notifier.
/// At most one row exists per (search, trip) pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedMatch {
    pub search_id: Uuid,
    pub trip_id: Uuid,
    pub score: i32,
    pub status: MatchStatus,
}

impl SavedMatch {
    pub fn new(search_id: Uuid, trip_id: Uuid, score: i32) -> Self {
        Self {
            search_id,
            trip_id,
            score,
            status: MatchStatus::New,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    New,
    Viewed,
    Dismissed,
}

impl MatchStatus {
    pub fn name(&self) -> String {
        match self {
            Self::New => "new".into(),
            Self::Viewed => "viewed".into(),
            Self::Dismissed => "dismissed".into(),
        }
    }
}
