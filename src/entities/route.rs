use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub distance_km: f64,
    pub duration_min: f64,
    pub polyline: Vec<Coordinates>,
    pub legs: Vec<RouteLeg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_min: f64,
    pub start: Coordinates,
    pub end: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
}

impl RouteGeometry {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            distance_km: self.distance_km,
            duration_min: self.duration_min,
        }
    }
}
