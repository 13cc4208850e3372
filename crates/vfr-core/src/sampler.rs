//! Dense great-circle sampling of a waypoint route for terrain lookup.

use crate::error::RouteError;
use crate::models::{GeoPoint, Waypoint, METERS_TO_FEET};
use crate::navigation::{distance_nm, interpolate_great_circle};
use serde::{Deserialize, Serialize};

/// Interior points closer than this to the leg end are not emitted; the
/// terminal waypoint covers that position.
const LEG_END_EPSILON: f64 = 1e-9;

/// Finest sampling interval accepted, NM.
pub const MIN_INTERVAL_NM: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledPoint {
    pub position: GeoPoint,
    /// Cumulative distance from the first waypoint, NM
    pub distance_nm: f64,
    /// Index into the waypoint list when this point is a waypoint
    pub waypoint_index: Option<usize>,
    /// Terrain elevation in feet MSL, once attached
    pub elevation_ft: Option<f64>,
}

impl SampledPoint {
    fn new(position: GeoPoint, distance_nm: f64, waypoint_index: Option<usize>) -> Self {
        Self {
            position,
            distance_nm,
            waypoint_index,
            elevation_ft: None,
        }
    }
}

/// Sample the route every `interval_nm` along each leg.
///
/// Every waypoint is emitted and tagged with its index, even when it falls
/// closer than `interval_nm` to the previous point. Routes with fewer than
/// two waypoints yield no points. Intervals that are not finite or are
/// below [`MIN_INTERVAL_NM`] are rejected.
pub fn sample_route(waypoints: &[Waypoint], interval_nm: f64) -> Result<Vec<SampledPoint>, RouteError> {
    if !interval_nm.is_finite() || interval_nm < MIN_INTERVAL_NM {
        return Err(RouteError::InvalidInterval(interval_nm));
    }
    if waypoints.len() < 2 {
        return Ok(Vec::new());
    }

    let mut points = vec![SampledPoint::new(waypoints[0].position, 0.0, Some(0))];
    let mut cumulative_nm = 0.0;

    for (idx, pair) in waypoints.windows(2).enumerate() {
        let from = pair[0].position;
        let to = pair[1].position;
        let leg_nm = distance_nm(from, to);

        if leg_nm > 0.0 {
            let count = (leg_nm / interval_nm).floor() as usize;
            for step in 1..=count {
                let offset_nm = step as f64 * interval_nm;
                let fraction = offset_nm / leg_nm;
                if fraction >= 1.0 - LEG_END_EPSILON {
                    break;
                }
                points.push(SampledPoint::new(
                    interpolate_great_circle(from, to, fraction),
                    cumulative_nm + offset_nm,
                    None,
                ));
            }
        }

        cumulative_nm += leg_nm;
        points.push(SampledPoint::new(to, cumulative_nm, Some(idx + 1)));
    }

    Ok(points)
}

/// Positions to send to the elevation provider, in sample order.
pub fn sample_positions(points: &[SampledPoint]) -> Vec<GeoPoint> {
    points.iter().map(|p| p.position).collect()
}

/// Attach provider elevations (meters MSL) to the samples, converting to feet.
///
/// Missing, short or non-finite entries leave the sample without terrain.
pub fn attach_elevations(points: &mut [SampledPoint], elevations_m: &[Option<f64>]) {
    for (idx, point) in points.iter_mut().enumerate() {
        point.elevation_ft = elevations_m
            .get(idx)
            .copied()
            .flatten()
            .filter(|m| m.is_finite())
            .map(|m| m * METERS_TO_FEET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Waypoint `nm` nautical miles north of the origin.
    fn north_of_origin(id: &str, nm: f64) -> Waypoint {
        let deg_per_nm = 1.0 / (crate::navigation::EARTH_RADIUS_NM * std::f64::consts::PI / 180.0);
        Waypoint::new(id, nm * deg_per_nm, 0.0)
    }

    #[test]
    fn rejects_bad_interval() {
        let wps = vec![north_of_origin("A", 0.0), north_of_origin("B", 10.0)];
        assert_eq!(sample_route(&wps, 0.0), Err(RouteError::InvalidInterval(0.0)));
        assert!(sample_route(&wps, f64::NAN).is_err());
        assert!(sample_route(&wps, -5.0).is_err());
        assert_eq!(sample_route(&wps, 1e-9), Err(RouteError::InvalidInterval(1e-9)));
        assert_eq!(sample_route(&wps, MIN_INTERVAL_NM).unwrap().len(), 1001);
    }

    #[test]
    fn short_routes_yield_nothing() {
        assert!(sample_route(&[], 5.0).unwrap().is_empty());
        assert!(sample_route(&[north_of_origin("A", 0.0)], 5.0).unwrap().is_empty());
    }

    #[test]
    fn single_leg_density() {
        let wps = vec![north_of_origin("A", 0.0), north_of_origin("B", 23.0)];
        let points = sample_route(&wps, 5.0).unwrap();

        assert_eq!(points.len(), 6);
        assert_eq!(points[0].waypoint_index, Some(0));
        assert_eq!(points[5].waypoint_index, Some(1));
        let interior: Vec<f64> = points[1..5].iter().map(|p| p.distance_nm).collect();
        for (actual, expected) in interior.iter().zip([5.0, 10.0, 15.0, 20.0]) {
            assert!((actual - expected).abs() < 1e-9);
        }
        assert!(points[1..5].iter().all(|p| p.waypoint_index.is_none()));
        assert!(points.windows(2).all(|w| w[0].distance_nm < w[1].distance_nm));
        assert!((points[5].distance_nm - 23.0).abs() < 1e-6);
    }

    #[test]
    fn interior_points_lie_on_the_leg() {
        let wps = vec![Waypoint::new("A", 37.0, -122.0), Waypoint::new("B", 38.0, -120.0)];
        let points = sample_route(&wps, 10.0).unwrap();
        for point in &points[1..points.len() - 1] {
            let from_start = distance_nm(wps[0].position, point.position);
            assert!((from_start - point.distance_nm).abs() < 1e-6);
        }
    }

    #[test]
    fn waypoints_are_never_skipped() {
        let wps = vec![
            north_of_origin("A", 0.0),
            north_of_origin("B", 2.0),
            north_of_origin("B2", 2.0),
            north_of_origin("C", 10.0),
        ];
        let points = sample_route(&wps, 5.0).unwrap();
        let tagged: Vec<usize> = points.iter().filter_map(|p| p.waypoint_index).collect();
        assert_eq!(tagged, vec![0, 1, 2, 3]);
        // Leg of exactly 8 NM gets one interior point at 5 NM.
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn exact_multiple_leg_has_no_duplicate_at_end() {
        let wps = vec![north_of_origin("A", 0.0), north_of_origin("B", 20.0)];
        let points = sample_route(&wps, 5.0).unwrap();
        // 5, 10, 15; the point at 20 NM is the waypoint itself.
        let interior: Vec<f64> = points
            .iter()
            .filter(|p| p.waypoint_index.is_none())
            .map(|p| p.distance_nm)
            .collect();
        assert_eq!(interior.len(), 3);
        assert!((interior[2] - 15.0).abs() < 1e-9);
        assert_eq!(points.len(), 5);
        assert!(points.windows(2).all(|w| w[0].distance_nm < w[1].distance_nm));
    }

    #[test]
    fn attaches_elevations_in_feet() {
        let wps = vec![north_of_origin("A", 0.0), north_of_origin("B", 12.0)];
        let mut points = sample_route(&wps, 5.0).unwrap();
        assert_eq!(points.len(), 4);

        attach_elevations(&mut points, &[Some(100.0), None, Some(f64::NAN)]);
        assert!((points[0].elevation_ft.unwrap() - 328.084).abs() < 1e-9);
        assert!(points[1].elevation_ft.is_none());
        assert!(points[2].elevation_ft.is_none());
        assert!(points[3].elevation_ft.is_none());
        assert_eq!(sample_positions(&points).len(), 4);
    }
}
