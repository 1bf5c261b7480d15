//! Cross-route location aggregation.
//!
//! Many voyages call at the same ports. The aggregator collapses every named
//! stop across all routes into a single [`AggregatedLocation`] whose visit
//! history is ordered most recent route first. The aggregation depends only on
//! the dataset; the "active in selected route" flag is applied afterwards.

use std::collections::HashMap;

use log::debug;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::geodesy::haversine_distance_km;
use crate::{GeoPoint, IconCategory, Route};

/// Label used when a stop has no event label.
pub const DEFAULT_EVENT_LABEL: &str = "Fleet Arrival";

/// Note used when a stop has no diplomatic note.
pub const DEFAULT_DIPLOMACY_NOTE: &str = "Diplomatic Visit";

/// Placeholder the dataset uses for "nothing recorded".
const EMPTY_PLACEHOLDER: &str = "—";

/// One call at a location by one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub route_id: u32,
    pub route_title: String,
    pub years: String,
    pub event_label: String,
    pub diplomacy_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_goods: Option<String>,
    pub icon: IconCategory,
}

impl Visit {
    /// Individual trade goods, split on `、` and commas.
    ///
    /// The `—` placeholder and empty entries are dropped.
    pub fn trade_items(&self) -> Vec<&str> {
        self.trade_goods
            .as_deref()
            .map(|goods| {
                goods
                    .split(['、', ',', '，'])
                    .map(str::trim)
                    .filter(|item| !item.is_empty() && *item != EMPTY_PLACEHOLDER)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// All visits to one uniquely named place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedLocation {
    pub name: String,
    pub position: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_image: Option<String>,
    /// Sorted by route id, most recent first
    pub visits: Vec<Visit>,
    pub is_active_in_selected_route: bool,
}

impl AggregatedLocation {
    /// Whether the given route called at this location.
    pub fn was_visited_by(&self, route_id: u32) -> bool {
        self.visits.iter().any(|v| v.route_id == route_id)
    }

    /// Most recent visit.
    pub fn latest_visit(&self) -> Option<&Visit> {
        self.visits.first()
    }

    /// Icon for the location header: the theme of its most recent visit.
    pub fn header_icon(&self) -> IconCategory {
        self.latest_visit()
            .map(|v| v.icon)
            .unwrap_or(IconCategory::Trade)
    }
}

/// Aggregate every stop across all routes by name.
///
/// Locations appear in the order their names are first seen. Each location's
/// visits are collected in (route, path) order and then stably sorted by
/// route id descending, so repeated calls within one route keep their path
/// order. Position and image come from the first occurrence that has them.
/// Navigation points (`TURN`) are skipped. The input is never modified.
///
/// # Example
/// ```
/// use voyage_engine::{aggregate_locations, GeoPoint, Route, Waypoint};
///
/// let calicut = GeoPoint::new(11.25, 75.78);
/// let routes = vec![
///     Route::new(1, "First", vec![Waypoint::stop("Nanjing", GeoPoint::new(32.06, 118.8)), Waypoint::stop("Calicut", calicut)]),
///     Route::new(7, "Last", vec![Waypoint::stop("Nanjing", GeoPoint::new(32.06, 118.8)), Waypoint::stop("Calicut", calicut)]),
/// ];
///
/// let locations = aggregate_locations(&routes);
/// let visits: Vec<u32> = locations[1].visits.iter().map(|v| v.route_id).collect();
/// assert_eq!(visits, vec![7, 1]);
/// ```
pub fn aggregate_locations<'a, I>(routes: I) -> Vec<AggregatedLocation>
where
    I: IntoIterator<Item = &'a Route>,
{
    let mut locations: Vec<AggregatedLocation> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for route in routes {
        for waypoint in route.waypoints.iter().filter(|w| w.kind.is_stop()) {
            let idx = *index_by_name
                .entry(waypoint.name.clone())
                .or_insert_with(|| {
                    locations.push(AggregatedLocation {
                        name: waypoint.name.clone(),
                        position: waypoint.position,
                        representative_image: None,
                        visits: Vec::new(),
                        is_active_in_selected_route: false,
                    });
                    locations.len() - 1
                });

            let location = &mut locations[idx];
            if location.representative_image.is_none() {
                location.representative_image = waypoint
                    .image_url
                    .as_ref()
                    .filter(|url| !url.is_empty())
                    .cloned();
            }

            location.visits.push(Visit {
                route_id: route.id,
                route_title: route.title.clone(),
                years: route.years.clone(),
                event_label: non_empty_or(&waypoint.event_label, DEFAULT_EVENT_LABEL),
                diplomacy_note: non_empty_or(&waypoint.diplomacy_note, DEFAULT_DIPLOMACY_NOTE),
                trade_goods: waypoint.trade_goods.clone(),
                icon: waypoint.icon,
            });
        }
    }

    for location in &mut locations {
        // Stable: same-route visits keep path order
        location.visits.sort_by(|a, b| b.route_id.cmp(&a.route_id));
    }

    debug!("[Aggregate] {} unique locations", locations.len());
    locations
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Recompute the active flag against the selected route.
pub fn mark_active(locations: &mut [AggregatedLocation], selected_route_id: u32) {
    for location in locations {
        location.is_active_in_selected_route = location.was_visited_by(selected_route_id);
    }
}

/// Copy of `locations` with the active flag set for the selected route.
pub fn with_active_route(
    locations: &[AggregatedLocation],
    selected_route_id: u32,
) -> Vec<AggregatedLocation> {
    let mut marked = locations.to_vec();
    mark_active(&mut marked, selected_route_id);
    marked
}

// ============================================================================
// Spatial picking
// ============================================================================

type IndexedLocation = GeomWithData<[f64; 2], usize>;

/// R-tree over location positions for marker picking.
///
/// Coordinates are indexed as `[lng, lat]`; candidates are gathered in degree
/// space and ranked by great-circle distance.
pub struct LocationIndex {
    tree: RTree<IndexedLocation>,
    positions: Vec<GeoPoint>,
}

impl LocationIndex {
    /// Index the given locations. Picks return indices into this slice.
    pub fn new(locations: &[AggregatedLocation]) -> Self {
        let entries: Vec<IndexedLocation> = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| GeomWithData::new([loc.position.lng, loc.position.lat], i))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            positions: locations.iter().map(|l| l.position).collect(),
        }
    }

    /// Index of the closest location within `radius_degrees` of `point`.
    ///
    /// Clicks near the antimeridian also search the wrapped longitude, so a
    /// marker at 179.6° is found from -179.8°.
    pub fn pick(&self, point: GeoPoint, radius_degrees: f64) -> Option<usize> {
        let mut queries = vec![point.lng];
        if point.lng + radius_degrees > 180.0 {
            queries.push(point.lng - 360.0);
        }
        if point.lng - radius_degrees < -180.0 {
            queries.push(point.lng + 360.0);
        }

        let max_distance_2 = radius_degrees * radius_degrees;
        queries
            .into_iter()
            .flat_map(|lng| {
                self.tree
                    .locate_within_distance([lng, point.lat], max_distance_2)
                    .map(|entry| entry.data)
            })
            .min_by(|&a, &b| {
                let da = haversine_distance_km(point, self.positions[a]);
                let db = haversine_distance_km(point, self.positions[b]);
                da.total_cmp(&db)
            })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
