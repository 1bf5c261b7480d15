//! Route line descriptors and styling hints for the renderer.
//!
//! Every route is drawn twice: the outbound leg as recorded and the inbound
//! leg as its reverse. Styling is a pure function of the playback state so the
//! renderer can re-query it whenever the selection or overview flag changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedLocation;
use crate::player::PlaybackState;
use crate::Route;

/// Accent colour for the focused route and active markers.
pub const ROYAL_GOLD: &str = "#D4AF37";

/// Which leg of the round trip a path draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PathDirection {
    Outbound,
    Inbound,
}

/// A point of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

/// One leg of one route, ready for line rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualPath {
    pub route_id: u32,
    pub route_title: String,
    pub base_color: String,
    pub direction: PathDirection,
    pub points: Vec<PathPoint>,
}

impl VisualPath {
    /// Hover label, e.g. "Outbound (First Voyage)".
    pub fn label(&self) -> String {
        let direction = match self.direction {
            PathDirection::Outbound => "Outbound",
            PathDirection::Inbound => "Return",
        };
        format!("{} ({})", direction, self.route_title)
    }
}

/// Build outbound and inbound descriptors for every route, in route order.
///
/// # Example
/// ```
/// use voyage_engine::{build_visual_paths, GeoPoint, PathDirection, Route, Waypoint};
///
/// let route = Route::new(1, "First", vec![
///     Waypoint::stop("Nanjing", GeoPoint::new(32.06, 118.8)),
///     Waypoint::stop("Calicut", GeoPoint::new(11.25, 75.78)),
/// ]);
/// let paths = build_visual_paths(&[route], 0.002);
/// assert_eq!(paths.len(), 2);
/// assert_eq!(paths[1].direction, PathDirection::Inbound);
/// assert_eq!(paths[1].points[0].lat, 11.25);
/// ```
pub fn build_visual_paths<'a, I>(routes: I, altitude: f64) -> Vec<VisualPath>
where
    I: IntoIterator<Item = &'a Route>,
{
    let mut paths = Vec::new();
    for route in routes {
        let outbound: Vec<PathPoint> = route
            .waypoints
            .iter()
            .map(|w| PathPoint {
                lat: w.position.lat,
                lng: w.position.lng,
                altitude,
            })
            .collect();
        let inbound: Vec<PathPoint> = outbound.iter().rev().copied().collect();

        for (direction, points) in [
            (PathDirection::Outbound, outbound),
            (PathDirection::Inbound, inbound),
        ] {
            paths.push(VisualPath {
                route_id: route.id,
                route_title: route.title.clone(),
                base_color: route.color.clone(),
                direction,
                points,
            });
        }
    }
    paths
}

// ============================================================================
// Colours
// ============================================================================

/// An sRGB colour with alpha, rendered as a CSS `rgba(...)` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str, alpha: f64) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: alpha,
        })
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Apply an alpha to a hex colour. Unparseable colours pass through unchanged.
pub fn with_alpha(hex: &str, alpha: f64) -> String {
    Rgba::from_hex(hex, alpha)
        .map(|c| c.to_string())
        .unwrap_or_else(|| hex.to_string())
}

// ============================================================================
// Styles
// ============================================================================

/// Line styling for one [`VisualPath`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: String,
    pub stroke: f64,
    /// Dash length as a fraction of the line; 1 with gap 0 is solid
    pub dash_length: f64,
    pub dash_gap: f64,
    /// Dash flow period in ms; 0 freezes the line
    pub dash_animate_ms: u32,
}

impl PathStyle {
    /// Style a path for the current playback state.
    ///
    /// Overview shows every route equally with a fast flow. Otherwise the
    /// selected route is gold and flowing while the rest are dimmed and
    /// frozen. Inbound legs are always dashed.
    pub fn for_path(path: &VisualPath, state: &PlaybackState) -> Self {
        let is_selected = path.route_id == state.selected_route_id;
        let outbound = path.direction == PathDirection::Outbound;

        let (color, stroke, dash_animate_ms) = if state.is_overview {
            (with_alpha(&path.base_color, 0.6), 1.5, 6000)
        } else if is_selected && outbound {
            (ROYAL_GOLD.to_string(), 3.0, 3000)
        } else if is_selected {
            (with_alpha(ROYAL_GOLD, 0.6), 2.0, 3000)
        } else {
            (with_alpha(&path.base_color, 0.3), 1.0, 0)
        };

        let (dash_length, dash_gap) = if outbound { (1.0, 0.0) } else { (0.2, 0.1) };

        Self {
            color,
            stroke,
            dash_length,
            dash_gap,
            dash_animate_ms,
        }
    }
}

/// Marker styling for one [`AggregatedLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub opacity: f64,
    pub scale: f64,
    /// Draw with the gold accent (border, glow, dot)
    pub accented: bool,
}

impl MarkerStyle {
    /// Style a marker. `location.is_active_in_selected_route` must already
    /// reflect the current selection.
    pub fn for_location(
        location: &AggregatedLocation,
        state: &PlaybackState,
        selected_location: Option<&str>,
    ) -> Self {
        let is_active = location.is_active_in_selected_route;
        let (opacity, scale) = if selected_location == Some(location.name.as_str()) {
            (1.0, 1.0)
        } else if !state.is_overview && is_active {
            (1.0, 0.8)
        } else if state.is_overview {
            (0.5, 0.5)
        } else {
            (0.2, 0.3)
        };

        Self {
            opacity,
            scale,
            accented: is_active || state.is_overview,
        }
    }
}
