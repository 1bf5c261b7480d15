//! Playback integration tests.
//!
//! Drives the full pipeline: JSON dataset -> catalog -> player -> render
//! outputs, delivering frames by hand through the manual scheduler.

use std::time::Duration;

use voyage_engine::{
    GeoPoint, ManualScheduler, PlayMode, PlaybackConfig, Route, RouteCatalog, StepMode,
    VoyageError, VoyagePlayer, Waypoint,
};

const VOYAGES_JSON: &str = include_str!("fixtures/voyages.json");
const FRAME: Duration = Duration::from_millis(16);

/// Helper: player over the fixture dataset with a fixed per-frame step.
fn fixture_player(step: f64) -> VoyagePlayer<ManualScheduler> {
    let catalog = RouteCatalog::from_json(VOYAGES_JSON).expect("fixture should load");
    player_for(catalog, StepMode::Fixed(step))
}

fn player_for(catalog: RouteCatalog, step_mode: StepMode) -> VoyagePlayer<ManualScheduler> {
    let config = PlaybackConfig {
        step_mode,
        ..PlaybackConfig::default()
    };
    VoyagePlayer::new(catalog, config, ManualScheduler::default()).expect("player should build")
}

fn equator_player(step: f64) -> VoyagePlayer<ManualScheduler> {
    let route = Route::new(
        1,
        "Equator",
        vec![
            Waypoint::stop("West", GeoPoint::new(0.0, 0.0)),
            Waypoint::stop("East", GeoPoint::new(0.0, 90.0)),
        ],
    );
    let catalog = RouteCatalog::new(vec![route]).expect("route should validate");
    player_for(catalog, StepMode::Fixed(step))
}

fn assert_close(a: f64, b: f64, eps: f64) {
    let diff = (a - b).abs();
    assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
}

/// Deliver frames until playback stops, returning the number delivered.
fn run_to_completion(player: &mut VoyagePlayer<ManualScheduler>, limit: usize) -> usize {
    let mut frames = 0;
    while player.advance_frame(FRAME).is_some() {
        frames += 1;
        assert!(frames <= limit, "playback did not stop within {limit} frames");
    }
    frames
}

// ============================================================================
// Dataset
// ============================================================================

#[test]
fn test_fixture_loads() {
    let catalog = RouteCatalog::from_json(VOYAGES_JSON).unwrap();
    assert_eq!(catalog.len(), 7);
    assert_eq!(catalog.get(1).unwrap().title, "First Voyage");
    assert_eq!(catalog.get(7).unwrap().years, "1431 - 1433");
    assert_eq!(catalog.locations().len(), 8);
}

#[test]
fn test_invalid_dataset_rejected() {
    let bad_coords = r#"[{"id": 1, "title": "A", "path": [{"lat": 0.0, "lng": 0.0}, {"lat": 95.0, "lng": 1.0}]}]"#;
    assert!(matches!(
        RouteCatalog::from_json(bad_coords),
        Err(VoyageError::InvalidCoordinates { route_id: 1, index: 1, .. })
    ));

    let gap = r#"[
        {"id": 1, "title": "A", "path": [{"lat": 0.0, "lng": 0.0}, {"lat": 1.0, "lng": 1.0}]},
        {"id": 3, "title": "C", "path": [{"lat": 0.0, "lng": 0.0}, {"lat": 1.0, "lng": 1.0}]}
    ]"#;
    assert!(matches!(
        RouteCatalog::from_json(gap),
        Err(VoyageError::InvalidDataset { .. })
    ));
}

#[test]
fn test_single_waypoint_route_parks_ship() {
    let json = r#"[
        {"id": 1, "title": "A", "path": [{"name": "Nanjing", "lat": 32.06, "lng": 118.8}, {"name": "Champa", "lat": 13.77, "lng": 109.22}]},
        {"id": 2, "title": "B", "path": [{"name": "Suva", "lat": -18.14, "lng": 178.44}]}
    ]"#;
    let catalog = RouteCatalog::from_json(json).unwrap();
    let mut player = player_for(catalog, StepMode::Fixed(0.25));

    // Route 1 still plays and hands over to the short route
    player.toggle_play();
    for _ in 0..4 {
        player.advance_frame(FRAME).unwrap();
    }
    assert_eq!(player.state().selected_route_id, 2);

    let ship = player.advance_frame(FRAME).unwrap();
    assert_eq!(ship.position, GeoPoint::new(-18.14, 178.44));
    assert_eq!(ship.heading, 0.0);

    let frames = run_to_completion(&mut player, 10);
    assert_eq!(frames, 3);
    assert_eq!(player.state().progress, 1.0);
    assert!(!player.state().is_playing);
}

// ============================================================================
// Position Resolution
// ============================================================================

#[test]
fn test_equator_route_positions() {
    let mut player = equator_player(0.125);
    player.toggle_play();

    // Progress 0.25: midway out, heading east
    player.advance_frame(FRAME);
    let ship = player.advance_frame(FRAME).unwrap();
    assert_close(player.state().progress, 0.25, 1e-12);
    assert_close(ship.position.lat, 0.0, 1e-9);
    assert_close(ship.position.lng, 45.0, 1e-6);
    assert_close(ship.heading, 90.0, 1e-6);

    // Progress 0.5: at the turnaround, on the equator between 0 and 90
    player.advance_frame(FRAME);
    let ship = player.advance_frame(FRAME).unwrap();
    assert_close(player.state().progress, 0.5, 1e-12);
    assert_close(ship.position.lat, 0.0, 1e-9);
    assert!(ship.position.lng >= -1e-9 && ship.position.lng <= 90.0 + 1e-9);

    // Progress 0.75: midway back, heading west
    player.advance_frame(FRAME);
    let ship = player.advance_frame(FRAME).unwrap();
    assert_close(ship.position.lng, 45.0, 1e-6);
    assert_close(ship.heading, 270.0, 1e-6);
}

#[test]
fn test_heading_always_normalised() {
    let mut player = fixture_player(0.01);
    player.set_mode(PlayMode::Single);
    player.toggle_play();
    for _ in 0..250 {
        let ship = player.advance_frame(FRAME).unwrap();
        assert!((0.0..360.0).contains(&ship.heading), "heading {}", ship.heading);
        assert!(ship.position.is_valid());
        assert_eq!(ship.altitude, 0.005);
    }
}

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn test_sequence_stops_on_last_route() {
    let mut player = fixture_player(0.25);
    player.select_route(7).unwrap();
    player.toggle_play();

    let frames = run_to_completion(&mut player, 10);
    assert_eq!(frames, 4);

    let state = player.state();
    assert_eq!(state.selected_route_id, 7);
    assert_eq!(state.progress, 1.0);
    assert!(!state.is_playing);
    assert!(!player.scheduler().is_pending());
}

#[test]
fn test_single_mode_wraps_and_keeps_playing() {
    let mut player = fixture_player(0.25);
    player.select_route(3).unwrap();
    player.set_mode(PlayMode::Single);
    player.toggle_play();

    for _ in 0..4 {
        player.advance_frame(FRAME).unwrap();
    }

    let state = player.state();
    assert_eq!(state.selected_route_id, 3);
    assert_eq!(state.progress, 0.0);
    assert!(state.is_playing);
    assert!(player.scheduler().is_pending());
}

#[test]
fn test_sequence_plays_every_route() {
    let mut player = fixture_player(0.5);
    player.toggle_play();

    let mut seen = vec![player.state().selected_route_id];
    let mut frames = 0;
    while player.advance_frame(FRAME).is_some() {
        frames += 1;
        let id = player.state().selected_route_id;
        if seen.last() != Some(&id) {
            seen.push(id);
        }
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(frames, 14);
    assert_eq!(player.state().progress, 1.0);
}

#[test]
fn test_route_change_resets_progress_and_ship() {
    let mut player = fixture_player(0.1);
    player.toggle_play();
    for _ in 0..3 {
        player.advance_frame(FRAME);
    }

    player.select_route(5).unwrap();
    assert_eq!(player.state().progress, 0.0);
    assert!(!player.state().is_playing);
    assert_eq!(player.ship().heading, 0.0);
    assert_eq!(player.ship().position, GeoPoint::new(32.06, 118.8));
    assert_eq!(player.round_trip().route_id, 5);
}

#[test]
fn test_unknown_route_leaves_state_untouched() {
    let mut player = fixture_player(0.1);
    player.select_route(2).unwrap();
    let before = *player.state();

    let err = player.select_route(8).unwrap_err();
    assert_eq!(err, VoyageError::UnknownRoute { route_id: 8 });
    assert_eq!(*player.state(), before);
    assert_eq!(player.round_trip().route_id, 2);
}

#[test]
fn test_frame_after_pause_is_ignored() {
    let mut player = fixture_player(0.1);
    player.toggle_play();
    player.advance_frame(FRAME);

    // Pause while a frame is outstanding; the host fires it anyway
    player.toggle_play();
    let before = *player.state();
    assert!(player.tick(FRAME).is_none());
    assert_eq!(*player.state(), before);
    assert!(player.scheduler().cancel_count() >= 1);
}

// ============================================================================
// Stepping
// ============================================================================

#[test]
fn test_fixed_step_ignores_frame_timing() {
    let mut player = fixture_player(0.0008);
    player.toggle_play();
    player.advance_frame(Duration::from_millis(16));
    player.advance_frame(Duration::from_millis(100));
    assert_close(player.state().progress, 0.0016, 1e-12);
}

#[test]
fn test_elapsed_step_scales_with_frame_timing() {
    let catalog = RouteCatalog::from_json(VOYAGES_JSON).unwrap();
    let mut player = player_for(
        catalog,
        StepMode::Elapsed {
            progress_per_second: 0.5,
        },
    );
    player.toggle_play();
    player.advance_frame(Duration::from_millis(100));
    assert_close(player.state().progress, 0.05, 1e-12);
    player.advance_frame(Duration::from_millis(300));
    assert_close(player.state().progress, 0.2, 1e-12);
}

// ============================================================================
// Aggregation & Panel
// ============================================================================

#[test]
fn test_calicut_visits_most_recent_first() {
    let mut player = fixture_player(0.1);
    let calicut = player
        .catalog()
        .locations()
        .iter()
        .find(|l| l.name == "Calicut")
        .unwrap()
        .clone();

    let ids: Vec<u32> = calicut.visits.iter().map(|v| v.route_id).collect();
    assert_eq!(ids, vec![7, 1]);
    assert_eq!(calicut.visits[1].trade_items(), vec!["pepper", "gems"]);
    assert!(calicut.visits[0].trade_items().is_empty());
    assert_eq!(calicut.visits[0].event_label, "Fleet Arrival");
    assert_eq!(calicut.visits[1].event_label, "Stele Erected");

    player.select_route(1).unwrap();
    player.select_location("Calicut").unwrap();
    let panel = player.location_panel().unwrap();
    let current: Vec<(u32, bool)> = panel
        .visits
        .iter()
        .map(|v| (v.visit.route_id, v.is_current))
        .collect();
    assert_eq!(current, vec![(7, false), (1, true)]);
}

#[test]
fn test_departure_port_aggregated_with_image() {
    let player = fixture_player(0.1);
    let nanjing = &player.catalog().locations()[0];
    assert_eq!(nanjing.name, "Nanjing");
    assert_eq!(nanjing.visits.len(), 7);
    assert_eq!(
        nanjing.representative_image.as_deref(),
        Some("https://example.org/nanjing.jpg")
    );
}

#[test]
fn test_active_locations_follow_route() {
    let mut player = fixture_player(0.1);
    player.select_route(7).unwrap();
    let active: Vec<String> = player
        .locations()
        .into_iter()
        .filter(|l| l.is_active_in_selected_route)
        .map(|l| l.name)
        .collect();
    assert_eq!(active, vec!["Nanjing", "Calicut", "Hormuz"]);
}

#[test]
fn test_overview_round_trip() {
    let mut player = fixture_player(0.1);
    player.select_route(4).unwrap();
    player.select_location("Hormuz").unwrap();
    assert_close(player.timeline_fraction(), 0.5, 1e-12);

    let view = player.reset_to_overview();
    assert_eq!((view.lat, view.lng, view.altitude), (15.0, 85.0, 1.8));
    assert!(player.state().is_overview);
    assert!(!player.ship_visible());
    assert!(player.location_panel().is_none());

    let json: serde_json::Value = serde_json::from_str(&player.state_json()).unwrap();
    assert_eq!(json["selectedRouteId"], 1);
    assert_eq!(json["isPlaying"], false);
}

#[test]
fn test_route_bounds() {
    let catalog = RouteCatalog::from_json(VOYAGES_JSON).unwrap();
    let bounds = catalog.bounds(7).unwrap();
    assert_eq!(bounds.min_lng, 56.5);
    assert_eq!(bounds.max_lng, 118.8);
    assert_eq!(bounds.min_lat, 11.25);
    assert_eq!(bounds.max_lat, 32.06);
}
