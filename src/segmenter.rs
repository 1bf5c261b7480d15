//! Round-trip segmentation of a route.
//!
//! A route is animated as a closed loop: the outbound waypoints followed by
//! the same waypoints in reverse, sharing the turnaround point once. Each edge
//! of that loop becomes a [`Segment`] carrying its length and the distance
//! covered before it, so a scalar progress maps to a position uniformly in
//! real-world distance rather than in waypoint count.

use serde::{Deserialize, Serialize};

use crate::geodesy::{haversine_distance_km, initial_bearing_deg, interpolate_great_circle};
use crate::{GeoPoint, Route};

/// Minimum number of waypoints needed to form a segment.
pub const MIN_WAYPOINTS: usize = 2;

/// One edge of the round-trip node sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: GeoPoint,
    pub end: GeoPoint,
    /// Great-circle length in km
    pub length_km: f64,
    /// Distance covered by all preceding segments in km
    pub cumulative_before_km: f64,
}

impl Segment {
    /// Distance covered once this segment is finished.
    pub fn cumulative_after_km(&self) -> f64 {
        self.cumulative_before_km + self.length_km
    }

    /// Whether an absolute distance along the loop falls on this segment.
    pub fn contains(&self, distance_km: f64) -> bool {
        distance_km >= self.cumulative_before_km && distance_km <= self.cumulative_after_km()
    }
}

/// Position and heading resolved for a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipFix {
    pub position: GeoPoint,
    /// Compass bearing in [0, 360)
    pub heading: f64,
}

/// Build the round-trip node sequence `path ++ reverse(path)[1..]`.
///
/// For `n` input points this yields `2n - 1` nodes whose first and last
/// entries are the departure point.
///
/// # Example
/// ```
/// use voyage_engine::{round_trip_nodes, GeoPoint};
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 10.0);
/// let c = GeoPoint::new(5.0, 20.0);
/// assert_eq!(round_trip_nodes(&[a, b, c]), vec![a, b, c, b, a]);
/// ```
pub fn round_trip_nodes(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut nodes = Vec::with_capacity((points.len() * 2).saturating_sub(1));
    nodes.extend_from_slice(points);
    nodes.extend(points.iter().rev().skip(1).copied());
    nodes
}

/// Segmented round trip for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub route_id: u32,
    /// Outbound nodes followed by the return leg
    pub nodes: Vec<GeoPoint>,
    /// `2 * (n - 1)` segments for `n` waypoints
    pub segments: Vec<Segment>,
    /// Sum of all segment lengths in km
    pub total_distance_km: f64,
}

impl RoundTrip {
    /// Segment a route's waypoints.
    pub fn from_route(route: &Route) -> Self {
        Self::from_points(route.id, &route.points())
    }

    /// Segment a sequence of points as a round trip.
    ///
    /// Fewer than 2 points give a trip with no segments and zero total
    /// distance, which [`Self::locate`] resolves to the final node.
    pub fn from_points(route_id: u32, points: &[GeoPoint]) -> Self {
        let nodes = round_trip_nodes(points);
        let mut segments = Vec::with_capacity(nodes.len().saturating_sub(1));
        let mut total_distance_km = 0.0;

        for pair in nodes.windows(2) {
            let length_km = haversine_distance_km(pair[0], pair[1]);
            segments.push(Segment {
                start: pair[0],
                end: pair[1],
                length_km,
                cumulative_before_km: total_distance_km,
            });
            total_distance_km += length_km;
        }

        Self {
            route_id,
            nodes,
            segments,
            total_distance_km,
        }
    }

    /// The departure point (also where the loop ends).
    pub fn start(&self) -> GeoPoint {
        self.nodes.first().copied().unwrap_or_default()
    }

    /// The last node of the loop.
    pub fn final_node(&self) -> GeoPoint {
        self.nodes.last().copied().unwrap_or_default()
    }

    /// The segment covering an absolute distance along the loop.
    ///
    /// Zero-length segments are skipped so a shared boundary resolves to a
    /// segment with a direction. A distance that matches nothing (floating
    /// error past the end) resolves to the last segment.
    pub fn segment_at(&self, distance_km: f64) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| s.length_km > 0.0 && s.contains(distance_km))
            .or_else(|| self.segments.last())
    }

    /// Resolve a progress value in [0, 1] to a position and heading.
    ///
    /// Progress outside [0, 1] is clamped. The heading points from the
    /// position toward a point `lookahead` further along the same segment.
    /// A loop with zero total length resolves to its final node with heading 0.
    pub fn locate(&self, progress: f64, lookahead: f64) -> ShipFix {
        let fallback = ShipFix {
            position: self.final_node(),
            heading: 0.0,
        };
        if self.total_distance_km <= 0.0 || !progress.is_finite() {
            return fallback;
        }

        let distance_km = progress.clamp(0.0, 1.0) * self.total_distance_km;
        let Some(segment) = self.segment_at(distance_km) else {
            return fallback;
        };

        let fraction = if segment.length_km > 0.0 {
            ((distance_km - segment.cumulative_before_km) / segment.length_km).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let position = interpolate_great_circle(segment.start, segment.end, fraction);
        let ahead = interpolate_great_circle(segment.start, segment.end, fraction + lookahead);

        ShipFix {
            position,
            heading: initial_bearing_deg(position, ahead),
        }
    }
}
