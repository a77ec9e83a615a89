use super::order::straight_segment_check;
use super::Engine;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use uuid::Uuid;

use crate::api::MatchAPI;
use crate::entities::{
    DriverTrip, MatchResult, OrderCheckResult, PassengerRoute, RecommendedRoute,
};
use crate::error::{invalid_route_error, Error};
use crate::geo::haversine_km;

/// Score contribution for a departure-time difference up to
/// `max_diff_min` minutes.
#[derive(Clone, Debug)]
pub struct TimeBand {
    pub max_diff_min: i64,
    pub points: i32,
}

/// Score contribution for a detour up to `max_km` kilometres.
#[derive(Clone, Debug)]
pub struct DetourBand {
    pub max_km: f64,
    pub points: i32,
}

/// All scoring weights and thresholds in one reviewable place. The engine
/// never reads a score constant from anywhere else.
#[derive(Clone, Debug)]
pub struct ScoringPolicy {
    /// A stop within this distance of the route counts as on-route.
    pub on_route_threshold_km: f64,
    pub near_route_threshold_km: f64,
    pub close_route_threshold_km: f64,
    /// A stop within this distance is an exact location hit.
    pub exact_match_threshold_km: f64,
    /// Straight-line pre-filter: both stops farther than this from the
    /// trip's own stops and the candidate is dropped without route lookups.
    pub quick_filter_km: f64,
    /// Minimum score for a live search result.
    pub admission_floor: i32,
    /// Minimum score for a standing-search notification, deliberately more
    /// permissive than the live floor.
    pub notify_floor: i32,
    pub time_window_min: i64,
    pub time_bands: Vec<TimeBand>,
    pub time_mismatch_penalty: i32,
    pub day_match_bonus: i32,
    pub day_mismatch_penalty: i32,
    pub detour_bands: Vec<DetourBand>,
    pub detour_penalty: i32,
    pub perfect_alignment_bonus: i32,
    pub both_on_route_bonus: i32,
    pub single_on_route_bonus: i32,
    pub exact_location_bonus: i32,
    pub near_route_bonus: i32,
    pub close_route_penalty: i32,
    pub far_route_penalty: i32,
    pub neither_on_route_penalty: i32,
    pub invalid_order_penalty: i32,
    pub degraded_on_route_bonus: i32,
    pub degraded_time_bonus: i32,
    pub degraded_day_bonus: i32,
    /// Candidates evaluated concurrently per search.
    pub max_concurrency: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            on_route_threshold_km: 1.0,
            near_route_threshold_km: 2.0,
            close_route_threshold_km: 5.0,
            exact_match_threshold_km: 0.1,
            quick_filter_km: 20.0,
            admission_floor: 50,
            notify_floor: 40,
            time_window_min: 60,
            time_bands: vec![
                TimeBand { max_diff_min: 0, points: 25 },
                TimeBand { max_diff_min: 15, points: 10 },
                TimeBand { max_diff_min: 30, points: 6 },
                TimeBand { max_diff_min: 60, points: 2 },
                TimeBand { max_diff_min: 90, points: -5 },
            ],
            time_mismatch_penalty: -15,
            day_match_bonus: 15,
            day_mismatch_penalty: -5,
            detour_bands: vec![
                DetourBand { max_km: 0.1, points: 10 },
                DetourBand { max_km: 0.5, points: 5 },
                DetourBand { max_km: 1.0, points: 3 },
                DetourBand { max_km: 2.0, points: 1 },
                DetourBand { max_km: 3.0, points: -2 },
                DetourBand { max_km: 5.0, points: -5 },
            ],
            detour_penalty: -10,
            perfect_alignment_bonus: 50,
            both_on_route_bonus: 20,
            single_on_route_bonus: 10,
            exact_location_bonus: 10,
            near_route_bonus: 5,
            close_route_penalty: -3,
            far_route_penalty: -10,
            neither_on_route_penalty: -20,
            invalid_order_penalty: -30,
            degraded_on_route_bonus: 30,
            degraded_time_bonus: 25,
            degraded_day_bonus: 15,
            max_concurrency: 4,
        }
    }
}

/// Outcome of one candidate evaluation. Errors never cross this boundary:
/// recoverable ones degrade, the rest are logged and skipped.
enum Evaluation {
    Scored(MatchResult),
    Degraded(MatchResult),
    Skipped { trip_id: Uuid, reason: String },
}

#[async_trait]
impl MatchAPI for Engine {
    async fn find_matching_rides(
        &self,
        passenger: &PassengerRoute,
        candidates: Vec<DriverTrip>,
    ) -> Result<Vec<MatchResult>, Error> {
        self.rank_candidates(passenger, candidates, self.policy.admission_floor)
            .await
    }
}

impl Engine {
    /// Score and rank `candidates` against the passenger's route, admitting
    /// results at or above `floor`. Output order is score descending with a
    /// trip-id tiebreak, independent of evaluation completion order.
    #[tracing::instrument(skip_all, fields(candidates = candidates.len()))]
    pub(crate) async fn rank_candidates(
        &self,
        passenger: &PassengerRoute,
        candidates: Vec<DriverTrip>,
        floor: i32,
    ) -> Result<Vec<MatchResult>, Error> {
        passenger.validate()?;

        let shortlist: Vec<DriverTrip> = candidates
            .into_iter()
            .filter(|trip| self.passes_quick_filter(passenger, trip))
            .collect();

        let evaluations: Vec<Evaluation> = stream::iter(shortlist)
            .map(|trip| self.evaluate(passenger, trip))
            .buffer_unordered(self.policy.max_concurrency.max(1))
            .collect()
            .await;

        let mut matches = Vec::new();
        for evaluation in evaluations {
            match evaluation {
                Evaluation::Scored(result) | Evaluation::Degraded(result) => {
                    if result.score >= floor {
                        matches.push(result);
                    }
                }
                Evaluation::Skipped { trip_id, reason } => {
                    tracing::warn!(%trip_id, %reason, "candidate skipped");
                }
            }
        }

        matches.sort_by(|a, b| b.score.cmp(&a.score).then(a.trip_id.cmp(&b.trip_id)));

        Ok(matches)
    }

    /// Both stop pairs beyond the straight-line radius means the candidate
    /// cannot score, so skip its route lookups entirely.
    fn passes_quick_filter(&self, passenger: &PassengerRoute, trip: &DriverTrip) -> bool {
        haversine_km(&passenger.pickup, &trip.pickup) <= self.policy.quick_filter_km
            || haversine_km(&passenger.dropoff, &trip.dropoff) <= self.policy.quick_filter_km
    }

    async fn evaluate(&self, passenger: &PassengerRoute, trip: DriverTrip) -> Evaluation {
        let trip_id = trip.id;

        match self.score_candidate(passenger, &trip).await {
            Ok(result) => Evaluation::Scored(result),
            Err(e) if e.is_recoverable() => {
                tracing::debug!(%trip_id, "scoring degraded to straight-line geometry");
                Evaluation::Degraded(self.score_degraded(passenger, &trip))
            }
            Err(e) => Evaluation::Skipped {
                trip_id,
                reason: e.message,
            },
        }
    }

    async fn score_candidate(
        &self,
        passenger: &PassengerRoute,
        trip: &DriverTrip,
    ) -> Result<MatchResult, Error> {
        if !trip.pickup.is_valid() || !trip.dropoff.is_valid() {
            return Err(invalid_route_error());
        }

        let order = self
            .check_route_order(passenger.pickup, passenger.dropoff, trip.pickup, trip.dropoff)
            .await?;

        let original = self.routes().route(trip.pickup, trip.dropoff).await?;

        let diverted = order.is_valid_order || (order.pickup_on_route && order.dropoff_on_route);
        let recommended = if diverted {
            match self
                .routes()
                .route_via(
                    trip.pickup,
                    &[passenger.pickup, passenger.dropoff],
                    trip.dropoff,
                )
                .await
            {
                Ok(route) => Some(route),
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(trip_id = %trip.id, "no recommended route available");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let (detour_distance_km, detour_duration_min) = recommended
            .as_ref()
            .map(|route| {
                (
                    route.distance_km - original.distance_km,
                    route.duration_min - original.duration_min,
                )
            })
            .unwrap_or((0.0, 0.0));

        let mut score = 0;
        let mut reasons = Vec::new();

        let (alignment_points, alignment_reasons) = self.alignment_contribution(&order);
        score += alignment_points;
        reasons.extend(alignment_reasons);

        if !order.is_valid_order {
            score += self.policy.invalid_order_penalty;
            reasons.push("Dropoff would come before pickup along the driver's route".into());
        }

        let time_difference_min = passenger.schedule.minutes_between(&trip.schedule);
        let (time_points, time_reason) = time_contribution(&self.policy, time_difference_min);
        score += time_points;
        reasons.push(time_reason);

        if passenger.schedule.shares_day(&trip.schedule) {
            score += self.policy.day_match_bonus;
            reasons.push("Travels on a shared day".into());
        } else {
            score += self.policy.day_mismatch_penalty;
            reasons.push("No shared travel days".into());
        }

        let (detour_points, detour_reason) = detour_contribution(&self.policy, detour_distance_km);
        score += detour_points;
        reasons.push(detour_reason);

        Ok(MatchResult {
            trip_id: trip.id,
            score,
            reasons,
            pickup_distance_km: order.pickup_distance_km,
            dropoff_distance_km: order.dropoff_distance_km,
            is_valid_order: order.is_valid_order,
            time_difference_min,
            recommended_route: recommended.as_ref().map(RecommendedRoute::from_geometry),
            original_route: Some(original.summary()),
            detour_distance_km,
            detour_duration_min,
        })
    }

    fn alignment_contribution(&self, order: &OrderCheckResult) -> (i32, Vec<String>) {
        let policy = &self.policy;
        let mut points = 0;
        let mut reasons = Vec::new();

        let pickup_exact = order.pickup_distance_km <= policy.exact_match_threshold_km;
        let dropoff_exact = order.dropoff_distance_km <= policy.exact_match_threshold_km;

        match (order.pickup_on_route, order.dropoff_on_route) {
            (true, true) if order.is_valid_order => {
                points += policy.perfect_alignment_bonus;
                reasons.push(
                    "Perfect route alignment: pickup and dropoff both sit on the driver's route, in order"
                        .into(),
                );
                if pickup_exact {
                    points += policy.exact_location_bonus;
                    reasons.push(format!(
                        "Pickup is right on the driver's path ({:.2} km away)",
                        order.pickup_distance_km
                    ));
                }
                if dropoff_exact {
                    points += policy.exact_location_bonus;
                    reasons.push(format!(
                        "Dropoff is right on the driver's path ({:.2} km away)",
                        order.dropoff_distance_km
                    ));
                }
            }
            (true, true) => {
                points += policy.both_on_route_bonus;
                reasons.push("Both stops are on the driver's route".into());
                if pickup_exact {
                    points += policy.near_route_bonus;
                    reasons.push("Pickup is right on the driver's path".into());
                }
                if dropoff_exact {
                    points += policy.near_route_bonus;
                    reasons.push("Dropoff is right on the driver's path".into());
                }
            }
            (true, false) | (false, true) => {
                points += policy.single_on_route_bonus;

                let (on_label, off_label, off_distance_km) = if order.pickup_on_route {
                    ("Pickup", "dropoff", order.dropoff_distance_km)
                } else {
                    ("Dropoff", "pickup", order.pickup_distance_km)
                };
                reasons.push(format!("{on_label} is on the driver's route"));

                if off_distance_km <= policy.near_route_threshold_km {
                    points += policy.near_route_bonus;
                    reasons.push(format!(
                        "The {off_label} is near the route ({off_distance_km:.1} km)"
                    ));
                } else if off_distance_km <= policy.close_route_threshold_km {
                    points += policy.close_route_penalty;
                    reasons.push(format!(
                        "The {off_label} is {off_distance_km:.1} km from the route"
                    ));
                } else {
                    points += policy.far_route_penalty;
                    reasons.push(format!(
                        "The {off_label} is far from the route ({off_distance_km:.1} km)"
                    ));
                }
            }
            (false, false) => {
                points += policy.neither_on_route_penalty;
                reasons.push("Neither stop is close to the driver's route".into());
            }
        }

        (points, reasons)
    }

    /// Lower-fidelity pass used when the route provider is unavailable:
    /// straight-segment geometry, schedule checks, and a smaller score
    /// band. Total by construction, so a degraded candidate always yields
    /// a result for the admission filter to judge.
    fn score_degraded(&self, passenger: &PassengerRoute, trip: &DriverTrip) -> MatchResult {
        let policy = &self.policy;

        let order = straight_segment_check(
            passenger.pickup,
            passenger.dropoff,
            trip.pickup,
            trip.dropoff,
            policy.on_route_threshold_km,
        );

        let mut score = 0;
        let mut reasons =
            vec!["Estimated from straight-line geometry (live route unavailable)".to_string()];

        if order.pickup_on_route {
            score += policy.degraded_on_route_bonus;
            reasons.push("Pickup is close to the driver's direct path".into());
        }
        if order.dropoff_on_route {
            score += policy.degraded_on_route_bonus;
            reasons.push("Dropoff is close to the driver's direct path".into());
        }

        let time_difference_min = passenger.schedule.minutes_between(&trip.schedule);
        if time_difference_min <= policy.time_window_min {
            score += policy.degraded_time_bonus;
            reasons.push(format!("Departure times {time_difference_min} min apart"));
        }

        if passenger.schedule.shares_day(&trip.schedule) {
            score += policy.degraded_day_bonus;
            reasons.push("Travels on a shared day".into());
        }

        MatchResult {
            trip_id: trip.id,
            score,
            reasons,
            pickup_distance_km: order.pickup_distance_km,
            dropoff_distance_km: order.dropoff_distance_km,
            is_valid_order: order.is_valid_order,
            time_difference_min,
            recommended_route: None,
            original_route: None,
            detour_distance_km: 0.0,
            detour_duration_min: 0.0,
        }
    }
}

fn time_contribution(policy: &ScoringPolicy, diff_min: i64) -> (i32, String) {
    for band in &policy.time_bands {
        if diff_min <= band.max_diff_min {
            let reason = if band.max_diff_min == 0 {
                "Exact departure time match".into()
            } else {
                format!("Departure times {diff_min} min apart")
            };
            return (band.points, reason);
        }
    }

    (
        policy.time_mismatch_penalty,
        format!("Departure times {diff_min} min apart"),
    )
}

fn detour_contribution(policy: &ScoringPolicy, detour_km: f64) -> (i32, String) {
    if let Some((first, rest)) = policy.detour_bands.split_first() {
        if detour_km <= first.max_km {
            return (first.points, "No meaningful detour".into());
        }
        for band in rest {
            if detour_km < band.max_km {
                return (band.points, format!("Detour of {detour_km:.1} km"));
            }
        }
    }

    (
        policy.detour_penalty,
        format!("Detour of {detour_km:.1} km"),
    )
}
