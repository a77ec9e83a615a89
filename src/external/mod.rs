pub mod directions;
pub mod polyline;

pub use directions::DirectionsService;
pub use polyline::decode_polyline;
