//! Validated, read-only route dataset.
//!
//! The catalog is loaded once at startup. Everything derived from it is either
//! memoised for the catalog's lifetime (location aggregation, which does not
//! depend on the selected route) or cached per route id (segmentations).

use std::sync::Arc;

use geo::{BoundingRect, LineString};
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_locations, AggregatedLocation, LocationIndex};
use crate::error::{OptionExt, Result, VoyageError};
use crate::lru_cache::LruCache;
use crate::segmenter::{RoundTrip, MIN_WAYPOINTS};
use crate::{GeoPoint, Route};

/// Default number of cached segmentations.
const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Bounding box of a route's waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub center: GeoPoint,
}

/// Ordered route dataset with ids `1..=N`.
pub struct RouteCatalog {
    routes: Vec<Route>,
    locations: OnceCell<Vec<AggregatedLocation>>,
    location_index: OnceCell<LocationIndex>,
    round_trips: LruCache<u32, Arc<RoundTrip>>,
}

impl RouteCatalog {
    /// Validate and wrap a set of routes.
    ///
    /// Routes may be given in any order; they are sorted by id. Ids must be
    /// contiguous from 1 and every waypoint must have valid coordinates.
    /// Routes with fewer than 2 waypoints are kept and logged.
    pub fn new(mut routes: Vec<Route>) -> Result<Self> {
        if routes.is_empty() {
            return Err(VoyageError::InvalidDataset {
                message: "no routes".to_string(),
            });
        }

        routes.sort_by_key(|r| r.id);
        for (i, route) in routes.iter().enumerate() {
            let expected = i as u32 + 1;
            if route.id != expected {
                return Err(VoyageError::InvalidDataset {
                    message: format!("expected route id {}, found {}", expected, route.id),
                });
            }
            validate_route(route)?;
        }

        info!("[RouteCatalog] Loaded {} routes", routes.len());

        Ok(Self {
            routes,
            locations: OnceCell::new(),
            location_index: OnceCell::new(),
            round_trips: LruCache::new(DEFAULT_CACHE_CAPACITY),
        })
    }

    /// Load routes from a JSON array.
    ///
    /// # Example
    /// ```
    /// use voyage_engine::RouteCatalog;
    ///
    /// let json = r##"[{
    ///     "id": 1, "title": "First", "years": "1405 - 1407", "color": "#eab308",
    ///     "path": [
    ///         {"name": "Nanjing", "lat": 32.06, "lng": 118.8, "type": "START", "iconType": "FLEET"},
    ///         {"name": "", "lat": 25.0, "lng": 121.0, "type": "TURN"},
    ///         {"name": "Calicut", "lat": 11.25, "lng": 75.78, "type": "STOP", "trade": "pepper"}
    ///     ]
    /// }]"##;
    /// let catalog = RouteCatalog::from_json(json).unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let routes: Vec<Route> = serde_json::from_str(json)?;
        Self::new(routes)
    }

    /// Replace the segmentation cache with one of the given capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.round_trips = LruCache::new(capacity);
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, route_id: u32) -> Option<&Route> {
        route_id
            .checked_sub(1)
            .and_then(|idx| self.routes.get(idx as usize))
    }

    pub fn contains(&self, route_id: u32) -> bool {
        self.get(route_id).is_some()
    }

    pub fn first_id(&self) -> u32 {
        1
    }

    pub fn last_id(&self) -> u32 {
        self.routes.len() as u32
    }

    /// The route after `route_id`, if any.
    pub fn next_id(&self, route_id: u32) -> Option<u32> {
        let next = route_id.checked_add(1)?;
        self.contains(next).then_some(next)
    }

    /// Aggregated locations for the whole dataset.
    ///
    /// Computed on first use; the active flag is left unset.
    pub fn locations(&self) -> &[AggregatedLocation] {
        self.locations.get_or_init(|| {
            let locations = aggregate_locations(&self.routes);
            debug!(
                "[RouteCatalog] Aggregated {} locations across {} routes",
                locations.len(),
                self.routes.len()
            );
            locations
        })
    }

    /// Spatial index over [`Self::locations`], for marker picking.
    pub fn location_index(&self) -> &LocationIndex {
        self.location_index
            .get_or_init(|| LocationIndex::new(self.locations()))
    }

    /// Segmented round trip for a route, served from the cache when possible.
    pub fn round_trip(&mut self, route_id: u32) -> Result<Arc<RoundTrip>> {
        let route = route_id
            .checked_sub(1)
            .and_then(|idx| self.routes.get(idx as usize))
            .ok_or_unknown_route(route_id)?;

        self.round_trips.get_or_try_insert_with(route_id, || {
            let trip = RoundTrip::from_route(route);
            debug!(
                "[RouteCatalog] Segmented route {}: {} segments, {:.0} km",
                route_id,
                trip.segments.len(),
                trip.total_distance_km
            );
            Ok(Arc::new(trip))
        })
    }

    /// Number of segmentations currently cached.
    pub fn cached_round_trips(&self) -> usize {
        self.round_trips.len()
    }

    /// Bounding box and centre of a route, for camera framing.
    pub fn bounds(&self, route_id: u32) -> Result<RouteBounds> {
        let route = self.get(route_id).ok_or_unknown_route(route_id)?;
        let line: LineString<f64> = route.points().into();
        let rect = line.bounding_rect().ok_or(VoyageError::InsufficientWaypoints {
            route_id,
            waypoint_count: route.waypoints.len(),
            minimum_required: MIN_WAYPOINTS,
        })?;
        let center = rect.center();

        Ok(RouteBounds {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
            center: GeoPoint::new(center.y, center.x),
        })
    }
}

fn validate_route(route: &Route) -> Result<()> {
    if route.waypoints.len() < MIN_WAYPOINTS {
        // Still loadable: the ship parks on the final node
        warn!(
            "[RouteCatalog] Route {} has {} waypoints, needs {} to animate",
            route.id,
            route.waypoints.len(),
            MIN_WAYPOINTS
        );
    }
    if let Some((index, waypoint)) = route
        .waypoints
        .iter()
        .enumerate()
        .find(|(_, w)| !w.position.is_valid())
    {
        return Err(VoyageError::InvalidCoordinates {
            route_id: route.id,
            index,
            message: format!("({}, {})", waypoint.position.lat, waypoint.position.lng),
        });
    }
    Ok(())
}
