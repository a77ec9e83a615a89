use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, Schedule};
use crate::error::{invalid_route_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverTrip {
    pub id: Uuid,
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub schedule: Schedule,
    pub price: f64,
    pub seats_available: u32,
    pub driver: DriverMeta,
    pub status: TripStatus,
}

/// Display metadata carried through untouched; the engine never reads it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverMeta {
    pub name: String,
    pub rating: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Active,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn name(&self) -> String {
        match self {
            Self::Active => "active".into(),
            Self::Completed => "completed".into(),
            Self::Cancelled => "cancelled".into(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassengerRoute {
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub schedule: Schedule,
}

impl PassengerRoute {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.pickup.is_valid() || !self.dropoff.is_valid() {
            return Err(invalid_route_error());
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiderSearch {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub route: PassengerRoute,
    pub status: SearchStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Active,
    Fulfilled,
    Closed,
}

impl SearchStatus {
    pub fn name(&self) -> String {
        match self {
            Self::Active => "active".into(),
            Self::Fulfilled => "fulfilled".into(),
            Self::Closed => "closed".into(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}
