mod coordinates;
mod matching;
mod route;
mod schedule;
mod trip;

pub use coordinates::Coordinates;
pub use matching::{LabeledLeg, MatchResult, MatchStatus, OrderCheckResult, RecommendedRoute, SavedMatch};
pub use route::{RouteGeometry, RouteLeg, RouteSummary};
pub use schedule::{is_day_match, is_time_match, parse_clock_time, Schedule};
pub use trip::{DriverMeta, DriverTrip, PassengerRoute, RiderSearch, SearchStatus, TripStatus};
