//! # Algorithm Toolbox
//!
//! Direct access to the pure geodesic and aggregation functions, for hosts
//! that want them without the playback state machine.
//!
//! ## Geodesy
//!
//! - **Great-circle interpolation**: slerp between two coordinates
//! - **Haversine distance**: great-circle distance in km
//! - **Initial bearing**: compass heading from one point toward another
//!
//! ## Routes
//!
//! - **Round-trip segmentation**: outbound plus reversed return leg
//! - **Great-circle resampling**: evenly spaced points along a route
//! - **Location aggregation**: visits grouped per named stop
//!
//! # Example
//!
//! ```rust
//! use voyage_engine::algorithms::{haversine_distance_km, interpolate_great_circle, GeoPoint};
//!
//! let nanjing = GeoPoint::new(32.06, 118.80);
//! let calicut = GeoPoint::new(11.25, 75.78);
//! let halfway = interpolate_great_circle(nanjing, calicut, 0.5);
//! let d = haversine_distance_km(nanjing, halfway) + haversine_distance_km(halfway, calicut);
//! assert!((d - haversine_distance_km(nanjing, calicut)).abs() < 1e-6);
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{GeoPoint, Route, Waypoint, WaypointKind};

// =============================================================================
// Geodesy
// =============================================================================

pub use crate::geodesy::{
    haversine_distance_km, initial_bearing_deg, interpolate_great_circle, normalize_bearing,
    route_length_km, EARTH_RADIUS_KM,
};

// =============================================================================
// Segmentation
// =============================================================================

/// Segmented round trip with cumulative distances.
pub use crate::segmenter::RoundTrip;
/// Build the `path ++ reverse(path)[1..]` node sequence.
pub use crate::segmenter::round_trip_nodes;

// =============================================================================
// Aggregation
// =============================================================================

/// Group stops by name across routes, most recent route first.
pub use crate::aggregate::aggregate_locations;
/// Copy of aggregated locations with active flags for one route.
pub use crate::aggregate::with_active_route;

// =============================================================================
// Resampling
// =============================================================================

/// Resample a polyline to a fixed number of points along great circles.
///
/// Output points are evenly spaced by great-circle distance and always
/// include the first and last input points. Useful for densifying sparse
/// routes before drawing them as straight screen-space segments.
///
/// # Example
/// ```rust
/// use voyage_engine::algorithms::{resample_great_circle, GeoPoint};
///
/// let route = vec![
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 30.0),
///     GeoPoint::new(0.0, 90.0),
/// ];
/// let resampled = resample_great_circle(&route, 4);
/// assert_eq!(resampled.len(), 4);
/// assert!((resampled[1].lng - 30.0).abs() < 1e-9);
/// assert!((resampled[2].lng - 60.0).abs() < 1e-9);
/// ```
pub fn resample_great_circle(points: &[GeoPoint], count: usize) -> Vec<GeoPoint> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return vec![];
    };
    if count == 0 {
        return vec![];
    }
    if points.len() == 1 || count == 1 {
        return vec![first];
    }

    let total_length = route_length_km(points);
    if total_length == 0.0 {
        return vec![first; count];
    }

    let spacing = total_length / (count - 1) as f64;
    let mut result = Vec::with_capacity(count);
    result.push(first);

    let mut walked = 0.0;
    let mut target = spacing;

    for pair in points.windows(2) {
        let seg_len = haversine_distance_km(pair[0], pair[1]);

        while walked + seg_len >= target && result.len() < count - 1 {
            let ratio = (target - walked) / seg_len;
            result.push(interpolate_great_circle(pair[0], pair[1], ratio));
            target += spacing;
        }

        walked += seg_len;
    }

    // Floating error can leave the tail short
    while result.len() < count {
        result.push(last);
    }
    result
}
