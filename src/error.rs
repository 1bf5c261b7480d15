//! Unified error handling for the voyage engine.
//!
//! Geometry problems inside a valid route never surface as errors; the
//! segmenter falls back to defined defaults. Errors are reserved for
//! dataset validation and for intents that reference things that do not exist.

use std::fmt;

/// Unified error type for voyage-engine operations.
#[derive(Debug, Clone, PartialEq)]
pub enum VoyageError {
    /// Route has too few waypoints to form a segment
    InsufficientWaypoints {
        route_id: u32,
        waypoint_count: usize,
        minimum_required: usize,
    },
    /// A waypoint lies outside the valid latitude/longitude range
    InvalidCoordinates {
        route_id: u32,
        index: usize,
        message: String,
    },
    /// Route id is not part of the loaded dataset
    UnknownRoute { route_id: u32 },
    /// No aggregated location carries this name
    UnknownLocation { name: String },
    /// Dataset is structurally unusable (empty, gaps in ids, ...)
    InvalidDataset { message: String },
    /// JSON decoding/encoding failed
    Serialization { message: String },
}

impl fmt::Display for VoyageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoyageError::InsufficientWaypoints {
                route_id,
                waypoint_count,
                minimum_required,
            } => {
                write!(
                    f,
                    "Route {} has {} waypoints, minimum {} required",
                    route_id, waypoint_count, minimum_required
                )
            }
            VoyageError::InvalidCoordinates {
                route_id,
                index,
                message,
            } => {
                write!(
                    f,
                    "Route {} waypoint {} has invalid coordinates: {}",
                    route_id, index, message
                )
            }
            VoyageError::UnknownRoute { route_id } => {
                write!(f, "Unknown route: {}", route_id)
            }
            VoyageError::UnknownLocation { name } => {
                write!(f, "Unknown location: '{}'", name)
            }
            VoyageError::InvalidDataset { message } => {
                write!(f, "Invalid dataset: {}", message)
            }
            VoyageError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for VoyageError {}

impl From<serde_json::Error> for VoyageError {
    fn from(err: serde_json::Error) -> Self {
        VoyageError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for voyage-engine operations.
pub type Result<T> = std::result::Result<T, VoyageError>;

/// Extension trait for converting Option to VoyageError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an unknown route error.
    fn ok_or_unknown_route(self, route_id: u32) -> Result<T>;

    /// Convert Option to Result with an unknown location error.
    fn ok_or_unknown_location(self, name: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_route(self, route_id: u32) -> Result<T> {
        self.ok_or(VoyageError::UnknownRoute { route_id })
    }

    fn ok_or_unknown_location(self, name: &str) -> Result<T> {
        self.ok_or_else(|| VoyageError::UnknownLocation {
            name: name.to_string(),
        })
    }
}
