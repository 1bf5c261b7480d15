//! Great-circle math on a spherical Earth.
//!
//! All functions are pure and take/return degrees. Distances use a mean
//! Earth radius of 6371 km; bearings come from `geo`'s haversine model.

use geo::{Bearing, Haversine, Point};

use crate::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Below this angular separation (radians) two points are treated as coincident.
const COINCIDENT_EPSILON: f64 = 1e-12;

/// Convert a point to a unit vector (x toward 0°E, z toward the north pole).
pub fn to_unit_vector(p: GeoPoint) -> [f64; 3] {
    let lat = p.lat.to_radians();
    let lng = p.lng.to_radians();
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Convert a (not necessarily normalized) vector back to a point.
pub fn from_unit_vector(v: [f64; 3]) -> GeoPoint {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm == 0.0 {
        return GeoPoint::default();
    }
    let z = (v[2] / norm).clamp(-1.0, 1.0);
    GeoPoint::new(z.asin().to_degrees(), v[1].atan2(v[0]).to_degrees())
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Point at fraction `t` along the minor great-circle arc from `a` to `b`.
///
/// Uses spherical linear interpolation of the unit vectors, so equal steps in
/// `t` cover equal arc lengths. `t == 0` returns `a` and `t == 1` returns `b`
/// exactly. Values outside [0, 1] continue along the same great circle.
/// Coincident points return `a`; exact antipodes have no unique arc and also
/// return `a`.
///
/// # Example
/// ```
/// use voyage_engine::{interpolate_great_circle, GeoPoint};
///
/// let mid = interpolate_great_circle(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 90.0), 0.5);
/// assert!(mid.lat.abs() < 1e-9);
/// assert!((mid.lng - 45.0).abs() < 1e-9);
/// ```
pub fn interpolate_great_circle(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    if t == 0.0 {
        return a;
    }
    if t == 1.0 {
        return b;
    }

    let va = to_unit_vector(a);
    let vb = to_unit_vector(b);
    let omega = dot(va, vb).clamp(-1.0, 1.0).acos();
    let sin_omega = omega.sin();
    if sin_omega.abs() < COINCIDENT_EPSILON {
        return a;
    }

    let wa = ((1.0 - t) * omega).sin() / sin_omega;
    let wb = (t * omega).sin() / sin_omega;
    from_unit_vector([
        wa * va[0] + wb * vb[0],
        wa * va[1] + wb * vb[1],
        wa * va[2] + wb * vb[2],
    ])
}

/// Great-circle distance in kilometres (haversine formula).
///
/// # Example
/// ```
/// use voyage_engine::{haversine_distance_km, GeoPoint};
///
/// let d = haversine_distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 90.0));
/// assert!((d - 10007.5).abs() < 1.0);
/// ```
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial compass bearing from `a` toward `b`, in [0, 360).
///
/// Coincident points have no direction and yield 0.
pub fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }
    normalize_bearing(Haversine::bearing(to_point(a), to_point(b)))
}

fn to_point(p: GeoPoint) -> Point<f64> {
    Point::new(p.lng, p.lat)
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Total great-circle length of a polyline in kilometres.
pub fn route_length_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance_km(w[0], w[1]))
        .sum()
}
