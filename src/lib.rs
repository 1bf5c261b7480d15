//! # Voyage Engine
//!
//! Geodesic path engine for animating historical sea voyages on a globe.
//!
//! This library provides:
//! - Great-circle interpolation, haversine distance and bearings
//! - Distance-weighted round-trip segmentation of multi-stop routes
//! - A tick-driven playback state machine with single-route looping and
//!   multi-route sequencing
//! - Cross-route aggregation of visits per named location
//! - Outbound/inbound path descriptors with styling hints for a renderer
//!
//! Rendering, camera control and UI events belong to the host. The engine
//! consumes a static route dataset plus user intents and produces plain,
//! serializable values.
//!
//! ## Quick Start
//!
//! ```rust
//! use voyage_engine::{
//!     GeoPoint, ManualScheduler, PlaybackConfig, Route, RouteCatalog, VoyagePlayer, Waypoint,
//! };
//!
//! let route = Route::new(
//!     1,
//!     "First voyage",
//!     vec![
//!         Waypoint::stop("Nanjing", GeoPoint::new(32.06, 118.80)),
//!         Waypoint::turn(GeoPoint::new(25.0, 121.0)),
//!         Waypoint::stop("Calicut", GeoPoint::new(11.25, 75.78)),
//!     ],
//! );
//!
//! let catalog = RouteCatalog::new(vec![route]).unwrap();
//! let mut player =
//!     VoyagePlayer::new(catalog, PlaybackConfig::default(), ManualScheduler::default()).unwrap();
//!
//! player.toggle_play();
//! let ship = player.advance_frame(std::time::Duration::from_millis(16)).unwrap();
//! println!("Ship at {:?}, heading {:.1}°", ship.position, ship.heading);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, VoyageError};

// Great-circle math (interpolation, distance, bearing)
pub mod geodesy;
pub use geodesy::{haversine_distance_km, initial_bearing_deg, interpolate_great_circle};

// Round-trip segmentation and progress resolution
pub mod segmenter;
pub use segmenter::{round_trip_nodes, RoundTrip, Segment, ShipFix};

// Cross-route location aggregation
pub mod aggregate;
pub use aggregate::{aggregate_locations, AggregatedLocation, LocationIndex, Visit};

// Path descriptors and styling hints for the renderer
pub mod paths;
pub use paths::{build_visual_paths, MarkerStyle, PathDirection, PathStyle, VisualPath};

// LRU cache for derived per-route data
pub mod lru_cache;

// Validated route dataset
pub mod catalog;
pub use catalog::{RouteBounds, RouteCatalog};

// Frame scheduling seam
pub mod scheduler;
pub use scheduler::{FrameScheduler, ManualScheduler};

// Playback state machine
pub mod player;
pub use player::{
    Header, LocationPanel, PanelVisit, PlayMode, PlaybackState, TimelineStop, VoyagePlayer,
};

// Algorithm toolbox - standalone access to the pure functions
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in degrees.
///
/// # Example
/// ```
/// use voyage_engine::GeoPoint;
/// let calicut = GeoPoint::new(11.25, 75.78);
/// assert!(calicut.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Coord { x: p.lng, y: p.lat }
    }
}

/// Role of a waypoint along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaypointKind {
    /// Departure port; aggregated like a stop
    Start,
    /// Named historical stop with event metadata
    #[default]
    Stop,
    /// Navigation-only point that keeps the ship on water
    Turn,
}

impl WaypointKind {
    /// Whether waypoints of this kind are real places (aggregated, carry metadata).
    pub fn is_stop(self) -> bool {
        !matches!(self, WaypointKind::Turn)
    }
}

/// Icon category used by the renderer to theme markers and panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IconCategory {
    Fleet,
    Battle,
    Diplomacy,
    Trade,
    Giraffe,
    #[default]
    Map,
}

/// A single point on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Place name; empty for navigation points
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub position: GeoPoint,
    #[serde(rename = "type", default)]
    pub kind: WaypointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    /// Trade goods, possibly several joined by `、` or commas
    #[serde(rename = "trade", default, skip_serializing_if = "Option::is_none")]
    pub trade_goods: Option<String>,
    #[serde(rename = "diplomacy", default, skip_serializing_if = "Option::is_none")]
    pub diplomacy_note: Option<String>,
    #[serde(rename = "iconType", default)]
    pub icon: IconCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Waypoint {
    /// A named stop without metadata.
    pub fn stop(name: &str, position: GeoPoint) -> Self {
        Self {
            name: name.to_string(),
            position,
            kind: WaypointKind::Stop,
            event_label: None,
            trade_goods: None,
            diplomacy_note: None,
            icon: IconCategory::default(),
            image_url: None,
        }
    }

    /// An unnamed navigation point.
    pub fn turn(position: GeoPoint) -> Self {
        Self {
            kind: WaypointKind::Turn,
            ..Self::stop("", position)
        }
    }

    pub fn with_event(mut self, label: &str) -> Self {
        self.event_label = Some(label.to_string());
        self
    }

    pub fn with_trade(mut self, goods: &str) -> Self {
        self.trade_goods = Some(goods.to_string());
        self
    }

    pub fn with_diplomacy(mut self, note: &str) -> Self {
        self.diplomacy_note = Some(note.to_string());
        self
    }

    pub fn with_icon(mut self, icon: IconCategory) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_image(mut self, url: &str) -> Self {
        self.image_url = Some(url.to_string());
        self
    }
}

/// One complete outbound expedition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// 1-based ordinal, globally ordered
    pub id: u32,
    pub title: String,
    /// Display year range, e.g. "1405 - 1407"
    #[serde(default)]
    pub years: String,
    #[serde(default)]
    pub description: String,
    /// CSS hex colour, e.g. "#eab308"
    #[serde(default)]
    pub color: String,
    #[serde(rename = "path")]
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    /// Create a route with empty display metadata.
    pub fn new(id: u32, title: &str, waypoints: Vec<Waypoint>) -> Self {
        Self {
            id,
            title: title.to_string(),
            years: String::new(),
            description: String::new(),
            color: String::new(),
            waypoints,
        }
    }

    /// Waypoint positions in path order.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.waypoints.iter().map(|w| w.position).collect()
    }
}

/// Ship placement for the renderer.
///
/// The heading is a compass bearing in degrees, applied as a rotation about
/// the local "up" axis after orienting the model to the sphere normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub position: GeoPoint,
    /// Height above the globe surface in globe-radius units
    pub altitude: f64,
    /// Compass bearing in [0, 360)
    pub heading: f64,
}

/// Camera placement handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Default per-frame progress increment for fixed stepping.
pub const DEFAULT_PROGRESS_STEP: f64 = 0.0008;

/// How much progress a single tick adds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// Constant increment per tick, independent of frame timing.
    /// Speed follows the display refresh rate.
    Fixed(f64),
    /// Increment scaled by the elapsed time since the previous frame.
    Elapsed { progress_per_second: f64 },
}

impl StepMode {
    /// Progress increment for a frame that took `elapsed`.
    pub fn increment(&self, elapsed: Duration) -> f64 {
        match *self {
            StepMode::Fixed(step) => step,
            StepMode::Elapsed {
                progress_per_second,
            } => progress_per_second * elapsed.as_secs_f64(),
        }
    }
}

/// Configuration for playback and rendering hints.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Progress increment policy.
    /// Default: `Fixed(0.0008)` (one round trip in 1250 frames)
    pub step_mode: StepMode,

    /// Forward look-ahead (fraction of a segment) used to derive the heading.
    /// Default: 0.01
    pub heading_lookahead: f64,

    /// Ship altitude above the globe surface.
    /// Default: 0.005
    pub ship_altitude: f64,

    /// Altitude of rendered route lines.
    /// Default: 0.002
    pub path_altitude: f64,

    /// Camera placement for the overview of all routes.
    /// Default: lat 15, lng 85, altitude 1.8
    pub overview_viewpoint: Viewpoint,

    /// Number of route segmentations kept in the cache.
    /// Default: 16
    pub segment_cache_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_mode: StepMode::Fixed(DEFAULT_PROGRESS_STEP),
            heading_lookahead: 0.01,
            ship_altitude: 0.005,
            path_altitude: 0.002,
            overview_viewpoint: Viewpoint {
                lat: 15.0,
                lng: 85.0,
                altitude: 1.8,
            },
            segment_cache_capacity: 16,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(11.25, 75.78).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_waypoint_builders() {
        let wp = Waypoint::stop("Malacca", GeoPoint::new(2.2, 102.25))
            .with_event("Warehouse built")
            .with_trade("tin")
            .with_icon(IconCategory::Trade);
        assert!(wp.kind.is_stop());
        assert_eq!(wp.trade_goods.as_deref(), Some("tin"));
        assert_eq!(wp.icon, IconCategory::Trade);

        let turn = Waypoint::turn(GeoPoint::new(1.4, 104.5));
        assert!(turn.name.is_empty());
        assert!(!turn.kind.is_stop());
    }

    #[test]
    fn test_waypoint_json_shape() {
        let json = r#"{"name":"Calicut","lat":11.25,"lng":75.78,"type":"STOP","trade":"pepper","iconType":"TRADE"}"#;
        let wp: Waypoint = serde_json::from_str(json).unwrap();
        assert_eq!(wp.position, GeoPoint::new(11.25, 75.78));
        assert_eq!(wp.icon, IconCategory::Trade);
        assert_eq!(wp.trade_goods.as_deref(), Some("pepper"));
        assert!(wp.image_url.is_none());

        let turn: Waypoint =
            serde_json::from_str(r#"{"name":"","lat":6.0,"lng":95.2,"type":"TURN"}"#).unwrap();
        assert_eq!(turn.kind, WaypointKind::Turn);
        assert_eq!(turn.icon, IconCategory::Map);
    }

    #[test]
    fn test_step_mode_increment() {
        let frame = Duration::from_millis(500);
        assert_eq!(StepMode::Fixed(0.01).increment(frame), 0.01);
        let elapsed = StepMode::Elapsed {
            progress_per_second: 0.1,
        };
        assert!((elapsed.increment(frame) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.step_mode, StepMode::Fixed(DEFAULT_PROGRESS_STEP));
        assert_eq!(config.overview_viewpoint.altitude, 1.8);
    }
}
