//! # Voyage Player
//!
//! Playback state machine for the voyage animation.
//!
//! ## Architecture
//!
//! The player owns all mutable state of the animation:
//! - Playback state (selected route, progress, mode, overview flag)
//! - The ship placement emitted on every tick
//! - The selected location for the detail panel
//!
//! Every transition is a `&mut self` method that runs to completion, so a tick
//! can never observe a half-applied transition. Frames are requested through
//! an injected [`FrameScheduler`]; a tick delivered after playback stopped is
//! ignored.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::aggregate::{with_active_route, AggregatedLocation, Visit};
use crate::catalog::RouteCatalog;
use crate::error::{OptionExt, Result};
use crate::paths::{build_visual_paths, MarkerStyle, PathStyle, VisualPath};
use crate::scheduler::{FrameScheduler, ManualScheduler};
use crate::segmenter::RoundTrip;
use crate::{GeoPoint, IconCategory, PlaybackConfig, Route, ShipState, Viewpoint};

// ============================================================================
// Core Types
// ============================================================================

/// What happens when a route's round trip completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayMode {
    /// Loop the selected route forever
    Single,
    /// Continue with the next route; stop after the last one
    #[default]
    Sequence,
}

/// Playback state shared with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub selected_route_id: u32,
    /// Fraction of the selected route's round trip, in [0, 1]
    pub progress: f64,
    pub is_playing: bool,
    pub mode: PlayMode,
    /// All routes shown at once with none highlighted
    pub is_overview: bool,
}

/// A visit as shown in the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVisit {
    #[serde(flatten)]
    pub visit: Visit,
    /// Visit belongs to the selected route
    pub is_current: bool,
}

/// Detail panel content for the selected location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPanel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_image: Option<String>,
    pub header_icon: IconCategory,
    /// Same order as the location's visits: most recent route first
    pub visits: Vec<PanelVisit>,
}

/// Title block above the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

/// One route's dot on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStop {
    pub route_id: u32,
    /// First year of the route's year range
    pub start_year: String,
    pub is_active: bool,
    pub is_past: bool,
}

const OVERVIEW_TITLE: &str = "All Voyages";
const OVERVIEW_SUBTITLE: &str = "Global Overview";
const OVERVIEW_DESCRIPTION: &str = "Press play to explore the voyages.";

// ============================================================================
// Voyage Player
// ============================================================================

/// The playback state machine.
pub struct VoyagePlayer<S: FrameScheduler> {
    catalog: RouteCatalog,
    config: PlaybackConfig,
    scheduler: S,

    state: PlaybackState,
    ship: ShipState,
    selected_location: Option<String>,

    // Segmentation of the selected route
    round_trip: Arc<RoundTrip>,
}

impl<S: FrameScheduler> VoyagePlayer<S> {
    /// Create a paused player in overview mode with the first route selected.
    pub fn new(catalog: RouteCatalog, config: PlaybackConfig, scheduler: S) -> Result<Self> {
        let mut catalog = catalog.with_cache_capacity(config.segment_cache_capacity);
        let first = catalog.first_id();
        let round_trip = catalog.round_trip(first)?;

        let ship = ShipState {
            position: round_trip.start(),
            altitude: config.ship_altitude,
            heading: 0.0,
        };

        info!("[VoyagePlayer] Initialized with {} routes", catalog.len());

        Ok(Self {
            catalog,
            config,
            scheduler,
            state: PlaybackState {
                selected_route_id: first,
                progress: 0.0,
                is_playing: false,
                mode: PlayMode::default(),
                is_overview: true,
            },
            ship,
            selected_location: None,
            round_trip,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn ship(&self) -> &ShipState {
        &self.ship
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The selected route.
    pub fn current_route(&self) -> Option<&Route> {
        self.catalog.get(self.state.selected_route_id)
    }

    /// Segmentation of the selected route.
    pub fn round_trip(&self) -> &RoundTrip {
        &self.round_trip
    }

    pub fn selected_location_name(&self) -> Option<&str> {
        self.selected_location.as_deref()
    }

    /// The ship is hidden while the overview is shown.
    pub fn ship_visible(&self) -> bool {
        !self.state.is_overview
    }

    /// Position of the selected route on the route timeline, in [0, 1].
    pub fn timeline_fraction(&self) -> f64 {
        let last = self.catalog.last_id();
        if self.state.is_overview || last <= 1 {
            return 0.0;
        }
        (self.state.selected_route_id - 1) as f64 / (last - 1) as f64
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Toggle between playing and paused.
    ///
    /// Leaves the overview first if it is shown. Playing a finished
    /// play-through starts the selected route over.
    pub fn toggle_play(&mut self) {
        if self.state.is_overview {
            self.state.is_overview = false;
            self.rewind();
        }

        if self.state.is_playing {
            self.stop();
            info!(
                "[VoyagePlayer] Paused route {} at {:.3}",
                self.state.selected_route_id, self.state.progress
            );
        } else {
            if self.state.progress >= 1.0 {
                self.rewind();
            }
            self.state.is_playing = true;
            self.scheduler.schedule();
            info!(
                "[VoyagePlayer] Playing route {} ({:?})",
                self.state.selected_route_id, self.state.mode
            );
        }
    }

    /// Select a route.
    ///
    /// Stops playback, leaves the overview, clears the selected location and
    /// puts the ship at the route's first waypoint with heading 0. Unknown
    /// ids are rejected without any state change.
    pub fn select_route(&mut self, route_id: u32) -> Result<()> {
        let round_trip = match self.catalog.round_trip(route_id) {
            Ok(trip) => trip,
            Err(err) => {
                warn!("[VoyagePlayer] Rejected route selection: {}", err);
                return Err(err);
            }
        };

        self.stop();
        self.state.is_overview = false;
        self.state.selected_route_id = route_id;
        self.round_trip = round_trip;
        self.selected_location = None;
        self.rewind();

        info!("[VoyagePlayer] Selected route {}", route_id);
        Ok(())
    }

    /// Change what happens at the end of a route.
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.state.mode = mode;
        debug!("[VoyagePlayer] Mode set to {:?}", mode);
    }

    /// Return to the overview of all routes.
    ///
    /// Stops playback, selects the first route, clears the selected location
    /// and returns the camera viewpoint the renderer should fly to.
    pub fn reset_to_overview(&mut self) -> Viewpoint {
        self.stop();
        self.state.is_overview = true;
        self.selected_location = None;

        let first = self.catalog.first_id();
        match self.catalog.round_trip(first) {
            Ok(trip) => {
                self.state.selected_route_id = first;
                self.round_trip = trip;
            }
            Err(err) => warn!("[VoyagePlayer] Could not reselect first route: {}", err),
        }
        self.rewind();

        info!("[VoyagePlayer] Reset to overview");
        self.config.overview_viewpoint
    }

    /// Select a location by name for the detail panel.
    pub fn select_location(&mut self, name: &str) -> Result<()> {
        self.catalog
            .locations()
            .iter()
            .find(|l| l.name == name)
            .ok_or_unknown_location(name)?;
        self.selected_location = Some(name.to_string());
        Ok(())
    }

    /// Close the detail panel.
    pub fn deselect_location(&mut self) {
        self.selected_location = None;
    }

    /// Select the location nearest to a clicked globe point, if one is within
    /// `radius_degrees`. Returns the selected name.
    pub fn pick_location(&mut self, point: GeoPoint, radius_degrees: f64) -> Option<&str> {
        let idx = self.catalog.location_index().pick(point, radius_degrees)?;
        let name = self.catalog.locations()[idx].name.clone();
        self.selected_location = Some(name);
        self.selected_location.as_deref()
    }

    fn stop(&mut self) {
        self.state.is_playing = false;
        self.scheduler.cancel();
    }

    /// Progress back to 0 with the ship at the start of the selected route.
    fn rewind(&mut self) {
        self.state.progress = 0.0;
        self.ship = ShipState {
            position: self.round_trip.start(),
            altitude: self.config.ship_altitude,
            heading: 0.0,
        };
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Advance the animation by one frame.
    ///
    /// Returns the new ship state, or `None` if playback is stopped (a frame
    /// that was already queued when playback stopped).
    pub fn tick(&mut self, elapsed: Duration) -> Option<ShipState> {
        if !self.state.is_playing {
            debug!("[VoyagePlayer] Ignoring tick while stopped");
            return None;
        }

        self.state.progress += self.config.step_mode.increment(elapsed);

        if self.state.progress >= 1.0 {
            match self.state.mode {
                PlayMode::Sequence => match self.catalog.next_id(self.state.selected_route_id) {
                    Some(next) => self.advance_to(next),
                    None => self.finish(),
                },
                PlayMode::Single => self.state.progress = 0.0,
            }
        }

        let fix = self
            .round_trip
            .locate(self.state.progress, self.config.heading_lookahead);
        self.ship = ShipState {
            position: fix.position,
            altitude: self.config.ship_altitude,
            heading: fix.heading,
        };

        if self.state.is_playing {
            self.scheduler.schedule();
        }
        Some(self.ship)
    }

    /// Move on to the next route in sequence mode, keeping playback running.
    fn advance_to(&mut self, next: u32) {
        match self.catalog.round_trip(next) {
            Ok(trip) => {
                self.round_trip = trip;
                self.state.selected_route_id = next;
                self.state.progress = 0.0;
                info!("[VoyagePlayer] Sequence advanced to route {}", next);
            }
            Err(err) => {
                warn!("[VoyagePlayer] Could not advance to route {}: {}", next, err);
                self.finish();
            }
        }
    }

    /// End of the last route: clamp and stop.
    fn finish(&mut self) {
        self.state.progress = 1.0;
        self.stop();
        info!(
            "[VoyagePlayer] Finished at route {}",
            self.state.selected_route_id
        );
    }

    // ========================================================================
    // Render Outputs
    // ========================================================================

    /// All locations with the active flag set for the selected route.
    pub fn locations(&self) -> Vec<AggregatedLocation> {
        with_active_route(self.catalog.locations(), self.state.selected_route_id)
    }

    /// Locations paired with their marker style.
    pub fn styled_locations(&self) -> Vec<(AggregatedLocation, MarkerStyle)> {
        let selected = self.selected_location_name();
        self.locations()
            .into_iter()
            .map(|loc| {
                let style = MarkerStyle::for_location(&loc, &self.state, selected);
                (loc, style)
            })
            .collect()
    }

    /// Route lines paired with their style.
    pub fn styled_paths(&self) -> Vec<(VisualPath, PathStyle)> {
        build_visual_paths(self.catalog.routes(), self.config.path_altitude)
            .into_iter()
            .map(|path| {
                let style = PathStyle::for_path(&path, &self.state);
                (path, style)
            })
            .collect()
    }

    /// Detail panel for the selected location.
    pub fn location_panel(&self) -> Option<LocationPanel> {
        let name = self.selected_location.as_deref()?;
        let location = self.catalog.locations().iter().find(|l| l.name == name)?;
        let selected_route = self.state.selected_route_id;

        Some(LocationPanel {
            name: location.name.clone(),
            representative_image: location.representative_image.clone(),
            header_icon: location.header_icon(),
            visits: location
                .visits
                .iter()
                .map(|visit| PanelVisit {
                    is_current: visit.route_id == selected_route,
                    visit: visit.clone(),
                })
                .collect(),
        })
    }

    /// Header text for the overview or the selected route.
    pub fn header(&self) -> Header {
        match self.current_route() {
            Some(route) if !self.state.is_overview => Header {
                title: route.title.clone(),
                subtitle: route.years.clone(),
                description: route.description.clone(),
            },
            _ => Header {
                title: OVERVIEW_TITLE.to_string(),
                subtitle: OVERVIEW_SUBTITLE.to_string(),
                description: OVERVIEW_DESCRIPTION.to_string(),
            },
        }
    }

    /// Timeline dots in route order. Nothing is active or past in overview.
    pub fn timeline(&self) -> Vec<TimelineStop> {
        let focused = !self.state.is_overview;
        let selected = self.state.selected_route_id;
        self.catalog
            .routes()
            .iter()
            .map(|route| TimelineStop {
                route_id: route.id,
                start_year: route
                    .years
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                is_active: focused && route.id == selected,
                is_past: focused && route.id < selected,
            })
            .collect()
    }

    /// Playback state as JSON.
    pub fn state_json(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Locations (with active flags) as JSON.
    pub fn locations_json(&self) -> String {
        serde_json::to_string(&self.locations()).unwrap_or_else(|_| "[]".to_string())
    }
}

impl VoyagePlayer<ManualScheduler> {
    /// Deliver the pending frame, if one was requested.
    pub fn advance_frame(&mut self, elapsed: Duration) -> Option<ShipState> {
        if !self.scheduler.take_pending() {
            return None;
        }
        self.tick(elapsed)
    }
}

impl<S: FrameScheduler> Drop for VoyagePlayer<S> {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
