//! Planar and great-circle geometry shared by the order classifier, the
//! scoring engine, and the standalone route diagnostics.

use crate::entities::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Degree-to-kilometre factor for the planar segment math. Good enough at
/// the scale of a single metro area; do not use across continental spans.
pub const KM_PER_DEGREE: f64 = 111.0;

pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Parameter of the projection of `point` onto the infinite line through
/// `start` and `end`, in degree space. 0 lands on `start`, 1 on `end`;
/// values outside [0,1] fall beyond the segment. A degenerate segment
/// projects everything onto `start`.
pub fn segment_projection(point: &Coordinates, start: &Coordinates, end: &Coordinates) -> f64 {
    let dx = end.longitude - start.longitude;
    let dy = end.latitude - start.latitude;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return 0.0;
    }

    ((point.longitude - start.longitude) * dx + (point.latitude - start.latitude) * dy) / len_sq
}

/// Distance from `point` to the segment `start`..`end`, in kilometres. The
/// projection parameter is clamped to [0,1], so beyond either end the
/// distance to that endpoint is used.
pub fn distance_to_segment_km(
    point: &Coordinates,
    start: &Coordinates,
    end: &Coordinates,
) -> f64 {
    let t = segment_projection(point, start, end).clamp(0.0, 1.0);

    let nearest_lon = start.longitude + t * (end.longitude - start.longitude);
    let nearest_lat = start.latitude + t * (end.latitude - start.latitude);

    let dx = point.longitude - nearest_lon;
    let dy = point.latitude - nearest_lat;

    (dx * dx + dy * dy).sqrt() * KM_PER_DEGREE
}

pub fn is_point_on_segment(
    point: &Coordinates,
    start: &Coordinates,
    end: &Coordinates,
    threshold_km: f64,
) -> bool {
    distance_to_segment_km(point, start, end) <= threshold_km
}

/// Minimum distance from `point` to any segment of `polyline`, in
/// kilometres. An empty polyline yields infinity; a single vertex yields
/// the haversine distance to it.
pub fn distance_to_polyline_km(point: &Coordinates, polyline: &[Coordinates]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => haversine_km(point, only),
        _ => polyline
            .windows(2)
            .map(|pair| distance_to_segment_km(point, &pair[0], &pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

pub fn is_point_on_route(point: &Coordinates, polyline: &[Coordinates], threshold_km: f64) -> bool {
    distance_to_polyline_km(point, polyline) <= threshold_km
}

/// Index of the polyline vertex nearest to `point` by great-circle
/// distance. Earlier vertices win ties, which keeps tied pickup/dropoff
/// projections classified as invalid order.
pub fn nearest_vertex(point: &Coordinates, polyline: &[Coordinates]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, vertex) in polyline.iter().enumerate() {
        let distance = haversine_km(point, vertex);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }

    best.map(|(index, _)| index)
}

/// Percentage of route `a`'s vertices lying within `threshold_km` of route
/// `b`, for the route-overlap diagnostic. Returns 0 for an empty `a`.
pub fn route_overlap_percent(a: &[Coordinates], b: &[Coordinates], threshold_km: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let covered = a
        .iter()
        .filter(|vertex| is_point_on_route(vertex, b, threshold_km))
        .count();

    covered as f64 / a.len() as f64 * 100.0
}
