use std::env;
use std::fmt::Debug;

/// Crate-wide error, carried as a numeric code plus a human-readable message.
///
/// Codes below 100 are internal faults, codes from 100 up are caller faults.
/// Route-provider failures (codes 3 and 4) are recoverable: the engine falls
/// back to straight-line heuristics instead of failing the batch.
#[derive(Debug, Clone)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    /// True when the error came from the route provider and the caller
    /// should degrade to straight-line geometry rather than propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.code, 3 | 4)
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transport_error(err)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        invalid_schedule_error(err)
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(_: T) -> Error {
    Error {
        code: 2,
        message: "database error".into(),
    }
}

/// Network or timeout failure talking to the route provider.
pub fn transport_error(_: reqwest::Error) -> Error {
    Error {
        code: 3,
        message: "route provider unreachable".into(),
    }
}

/// The provider answered but could not produce a route.
pub fn route_unavailable_error() -> Error {
    Error {
        code: 4,
        message: "no route available".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

/// Missing or out-of-range pickup/dropoff coordinates.
pub fn invalid_route_error() -> Error {
    Error {
        code: 102,
        message: "invalid route coordinates".into(),
    }
}

pub fn invalid_schedule_error<T: Debug>(_: T) -> Error {
    Error {
        code: 103,
        message: "invalid schedule".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_recoverable() {
        assert!(route_unavailable_error().is_recoverable());
        assert!(!invalid_route_error().is_recoverable());
        assert!(!unexpected_error().is_recoverable());
    }
}
