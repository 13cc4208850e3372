//! Great-circle navigation math and leg recomputation.
//!
//! Ground speed uses a simplified model: TAS minus the headwind component.
//! Wind correction angle and drift are not modelled.

use crate::interpolation::normalize_degrees;
use crate::models::{GeoPoint, Leg, WeatherSample, WeatherSnapshot, Waypoint};
use serde::{Deserialize, Serialize};

/// Mean earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3_440.065;

/// Below this central angle (radians) two points are treated as coincident.
const MIN_ANGULAR_SEPARATION: f64 = 1e-12;

/// Great-circle distance in nautical miles (haversine formula).
pub fn distance_nm(a: GeoPoint, b: GeoPoint) -> f64 {
    EARTH_RADIUS_NM * central_angle(a, b)
}

fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial great-circle bearing from `a` to `b`, degrees true in `[0, 360)`.
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_degrees(x.atan2(y).to_degrees())
}

/// Bearing on arrival at `b` when flying the great circle from `a`.
pub fn final_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    normalize_degrees(bearing_deg(b, a) + 180.0)
}

/// Wind component along the track. Positive is headwind, negative tailwind.
pub fn headwind_component(track_deg: f64, wind_dir_deg: f64, wind_speed_kt: f64) -> f64 {
    wind_speed_kt * (wind_dir_deg - track_deg).to_radians().cos()
}

/// Wind component across the track. Positive is wind from the right.
pub fn crosswind_component(track_deg: f64, wind_dir_deg: f64, wind_speed_kt: f64) -> f64 {
    wind_speed_kt * (wind_dir_deg - track_deg).to_radians().sin()
}

/// Simplified ground speed: TAS minus headwind, never negative.
pub fn ground_speed(tas_kt: f64, track_deg: f64, wind_dir_deg: f64, wind_speed_kt: f64) -> f64 {
    (tas_kt - headwind_component(track_deg, wind_dir_deg, wind_speed_kt)).max(0.0)
}

/// Point at `fraction` of the way along the great circle from `a` to `b`.
///
/// Falls back to planar interpolation when the points are coincident or
/// antipodal, where the spherical formula is undefined.
pub fn interpolate_great_circle(a: GeoPoint, b: GeoPoint, fraction: f64) -> GeoPoint {
    if fraction <= 0.0 {
        return a;
    }
    if fraction >= 1.0 {
        return b;
    }

    let d = central_angle(a, b);
    let sin_d = d.sin();
    if d.abs() < MIN_ANGULAR_SEPARATION || sin_d.abs() < MIN_ANGULAR_SEPARATION {
        return GeoPoint::new(
            a.lat + (b.lat - a.lat) * fraction,
            a.lon + (b.lon - a.lon) * fraction,
        );
    }

    let phi1 = a.lat.to_radians();
    let lambda1 = a.lon.to_radians();
    let phi2 = b.lat.to_radians();
    let lambda2 = b.lon.to_radians();

    let wa = ((1.0 - fraction) * d).sin() / sin_d;
    let wb = (fraction * d).sin() / sin_d;

    let x = wa * phi1.cos() * lambda1.cos() + wb * phi2.cos() * lambda2.cos();
    let y = wa * phi1.cos() * lambda1.sin() + wb * phi2.cos() * lambda2.sin();
    let z = wa * phi1.sin() + wb * phi2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    GeoPoint::new(lat.to_degrees(), lon.to_degrees())
}

/// Recompute the derived leg of every waypoint.
///
/// The first waypoint has its leg cleared. Each later waypoint gets the leg
/// flown from its predecessor; the wind used is the destination's forecast,
/// else the origin's, else none.
pub fn recompute_legs(waypoints: &mut [Waypoint], tas_kt: f64, weather: &WeatherSnapshot) {
    if let Some(first) = waypoints.first_mut() {
        first.leg = None;
    }

    for idx in 1..waypoints.len() {
        let from = waypoints[idx - 1].position;
        let to = waypoints[idx].position;
        let bearing = bearing_deg(from, to);
        let distance = distance_nm(from, to);

        let wind = weather
            .get(&waypoints[idx].id)
            .and_then(leg_wind)
            .or_else(|| weather.get(&waypoints[idx - 1].id).and_then(leg_wind));

        let gs = match wind {
            Some((speed, direction)) => ground_speed(tas_kt, bearing, direction, speed),
            None => tas_kt.max(0.0),
        };
        let ete = if gs > 0.0 {
            Some(distance / gs * 60.0)
        } else {
            None
        };

        waypoints[idx].leg = Some(Leg {
            bearing_deg: bearing,
            distance_nm: distance,
            ground_speed_kt: gs,
            ete_min: ete,
        });
    }
}

fn leg_wind(sample: &WeatherSample) -> Option<(f64, f64)> {
    let speed = sample.wind_reading().as_option()?;
    let direction = sample.wind_direction_deg.filter(|d| d.is_finite()).unwrap_or(0.0);
    Some((speed, direction))
}

/// Whole-route distance and time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteTotals {
    pub distance_nm: f64,
    /// Absent if any leg has no ETE
    pub ete_min: Option<f64>,
}

/// Sum the legs computed by [`recompute_legs`].
pub fn route_totals(waypoints: &[Waypoint]) -> RouteTotals {
    let mut distance_nm = 0.0;
    let mut ete_min = Some(0.0);
    for leg in waypoints.iter().skip(1).filter_map(|wp| wp.leg.as_ref()) {
        distance_nm += leg.distance_nm;
        ete_min = ete_min.zip(leg.ete_min).map(|(total, ete)| total + ete);
    }
    RouteTotals { distance_nm, ete_min }
}
