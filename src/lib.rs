pub mod api;
pub mod engine;
pub mod entities;
pub mod error;
pub mod external;
pub mod geo;
pub mod routing;
pub mod store;
