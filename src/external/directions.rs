//! HTTP client for the directions provider, speaking the usual
//! `status` / `routes[0].legs[]` / `overview_polyline` envelope.

use serde::Deserialize;
use std::env;

use async_trait::async_trait;

use crate::entities::{Coordinates, RouteGeometry, RouteLeg};
use crate::error::{invalid_input_error, route_unavailable_error, Error};
use crate::external::polyline::decode_polyline;
use crate::routing::RouteSource;

/// Network-backed [`RouteSource`]. Wrap it in a
/// [`CachingRouteSource`](crate::routing::CachingRouteSource) before handing
/// it to the engine.
#[derive(Debug, Clone)]
pub struct DirectionsService {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl DirectionsService {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        let api_base = env::var("DIRECTIONS_API_BASE")?;
        let api_key = env::var("DIRECTIONS_API_KEY")?;

        Ok(Self::new(api_base, api_key))
    }
}

#[derive(Clone, Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<ProviderRoute>,
}

#[derive(Clone, Debug, Deserialize)]
struct ProviderRoute {
    overview_polyline: EncodedPolyline,
    legs: Vec<ProviderLeg>,
}

#[derive(Clone, Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ProviderLeg {
    distance: ProviderQuantity,
    duration: ProviderQuantity,
    start_location: LatLng,
    end_location: LatLng,
}

/// Provider-native unit holder; `value` is metres for distances and seconds
/// for durations.
#[derive(Clone, Debug, Deserialize)]
struct ProviderQuantity {
    value: f64,
}

#[derive(Clone, Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<LatLng> for Coordinates {
    fn from(location: LatLng) -> Self {
        Coordinates {
            latitude: location.lat,
            longitude: location.lng,
        }
    }
}

fn convert_response(data: DirectionsResponse) -> Result<RouteGeometry, Error> {
    if data.status != "OK" {
        return Err(route_unavailable_error());
    }

    let route = data
        .routes
        .into_iter()
        .next()
        .ok_or_else(route_unavailable_error)?;

    let polyline = decode_polyline(&route.overview_polyline.points)?;

    let legs: Vec<RouteLeg> = route
        .legs
        .into_iter()
        .map(|leg| RouteLeg {
            distance_km: leg.distance.value / 1000.0,
            duration_min: leg.duration.value / 60.0,
            start: leg.start_location.into(),
            end: leg.end_location.into(),
        })
        .collect();

    Ok(RouteGeometry {
        distance_km: legs.iter().map(|leg| leg.distance_km).sum(),
        duration_min: legs.iter().map(|leg| leg.duration_min).sum(),
        polyline,
        legs,
    })
}

#[async_trait]
impl RouteSource for DirectionsService {
    #[tracing::instrument(skip(self))]
    async fn route_via(
        &self,
        origin: Coordinates,
        waypoints: &[Coordinates],
        destination: Coordinates,
    ) -> Result<RouteGeometry, Error> {
        let url = format!("https://{}/maps/api/directions/json", self.api_base);

        let origin_param: String = origin.into();
        let destination_param: String = destination.into();

        let mut request = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(&[("origin", origin_param)])
            .query(&[("destination", destination_param)]);

        if !waypoints.is_empty() {
            let joined = waypoints
                .iter()
                .map(|waypoint| String::from(*waypoint))
                .collect::<Vec<_>>()
                .join("|");
            request = request.query(&[("waypoints", joined)]);
        }

        let res = request.send().await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(route_unavailable_error());
        }

        let data: DirectionsResponse = res.json().await?;

        convert_response(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "status": "OK",
        "routes": [{
            "overview_polyline": { "points": "_p~iF~ps|U_ulLnnqC_mqNvxq`@" },
            "legs": [
                {
                    "distance": { "text": "1.5 km", "value": 1500 },
                    "duration": { "text": "3 mins", "value": 180 },
                    "start_location": { "lat": 45.7489, "lng": 21.2083 },
                    "end_location": { "lat": 45.7536, "lng": 21.2257 }
                },
                {
                    "distance": { "text": "0.8 km", "value": 800 },
                    "duration": { "text": "2 mins", "value": 120 },
                    "start_location": { "lat": 45.7536, "lng": 21.2257 },
                    "end_location": { "lat": 45.7650, "lng": 21.2300 }
                }
            ]
        }]
    }"#;

    #[test]
    fn converts_provider_units_and_decodes_the_path() {
        let data: DirectionsResponse = serde_json::from_str(RESPONSE).unwrap();
        let route = convert_response(data).unwrap();

        assert!((route.distance_km - 2.3).abs() < 1e-9);
        assert!((route.duration_min - 5.0).abs() < 1e-9);
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.polyline.len(), 3);
        assert!((route.legs[0].start.latitude - 45.7489).abs() < 1e-9);
    }

    #[test]
    fn non_ok_status_maps_to_route_unavailable() {
        let data: DirectionsResponse =
            serde_json::from_str(r#"{ "status": "ZERO_RESULTS", "routes": [] }"#).unwrap();

        let err = convert_response(data).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn ok_status_with_no_routes_is_still_unavailable() {
        let data: DirectionsResponse =
            serde_json::from_str(r#"{ "status": "OK", "routes": [] }"#).unwrap();

        assert!(convert_response(data).is_err());
    }
}
