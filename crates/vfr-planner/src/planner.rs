//! End-to-end planning: navigation, weather, terrain, fusion, classification.

use crate::providers::{ElevationProvider, WeatherProvider};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use vfr_core::vertical_wind::apply_altitude_wind;
use vfr_core::{
    attach_elevations, fuse_profile_with_minimums, recompute_legs, route_totals, sample_positions,
    sample_route, summarize, ProfilePoint, ProfileSummary, Route, RouteError, RouteTotals,
    VfrMinimums, Waypoint, WeatherSnapshot,
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid route: {0}")]
    InvalidRoute(String),
    #[error(transparent)]
    Route(#[from] RouteError),
}

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub route: Route,
    pub tas_kt: f64,
    /// Cruise altitude for waypoints without their own, feet MSL
    pub default_altitude_ft: f64,
    pub departure: DateTime<Utc>,
    pub sample_interval_nm: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaypointReport {
    #[serde(flatten)]
    pub waypoint: Waypoint,
    pub eta: Option<DateTime<Utc>>,
    pub has_weather: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub name: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub departure: DateTime<Utc>,
    pub tas_kt: f64,
    pub totals: RouteTotals,
    pub waypoints: Vec<WaypointReport>,
    pub weather: WeatherSnapshot,
    pub profile: Vec<ProfilePoint>,
    pub summary: ProfileSummary,
    /// Provider failures that degraded the plan without stopping it
    pub warnings: Vec<String>,
}

/// Arrival time at each waypoint from departure and the legs' ETEs.
///
/// Once a leg has no ETE, or the elapsed time no longer fits a timestamp,
/// every later waypoint's ETA is unknown.
pub fn waypoint_etas(waypoints: &[Waypoint], departure: DateTime<Utc>) -> Vec<Option<DateTime<Utc>>> {
    let mut elapsed_min = Some(0.0);
    waypoints
        .iter()
        .enumerate()
        .map(|(idx, wp)| {
            if idx > 0 {
                let leg_ete = wp.leg.and_then(|leg| leg.ete_min);
                elapsed_min = elapsed_min.zip(leg_ete).map(|(total, ete)| total + ete);
            }
            elapsed_min.and_then(|minutes| offset_by_minutes(departure, minutes))
        })
        .collect()
}

fn offset_by_minutes(start: DateTime<Utc>, minutes: f64) -> Option<DateTime<Utc>> {
    let millis = (minutes * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    start.checked_add_signed(delta)
}

pub struct Planner<W, E> {
    weather: W,
    elevation: E,
    minimums: VfrMinimums,
}

impl<W, E> Planner<W, E>
where
    W: WeatherProvider,
    E: ElevationProvider,
{
    pub fn new(weather: W, elevation: E) -> Self {
        Self {
            weather,
            elevation,
            minimums: VfrMinimums::default(),
        }
    }

    pub fn with_minimums(mut self, minimums: VfrMinimums) -> Self {
        self.minimums = minimums;
        self
    }

    pub fn weather(&self) -> &W {
        &self.weather
    }

    pub fn elevation(&self) -> &E {
        &self.elevation
    }

    pub async fn plan(&self, request: PlanRequest) -> Result<PlanReport, PlanError> {
        validate(&request)?;
        let PlanRequest {
            route,
            tas_kt,
            default_altitude_ft,
            departure,
            sample_interval_nm,
        } = request;
        let mut waypoints = route.waypoints;
        let mut warnings = Vec::new();

        // Still-air timing decides which forecast hour each waypoint gets.
        recompute_legs(&mut waypoints, tas_kt, &WeatherSnapshot::empty());
        let forecast_times = waypoint_etas(&waypoints, departure);

        let fetches = waypoints.iter().zip(&forecast_times).map(|(wp, eta)| {
            let at = eta.unwrap_or(departure);
            async move { (wp, self.weather.fetch_weather(wp.position, at).await) }
        });
        let mut samples = HashMap::new();
        for (wp, result) in join_all(fetches).await {
            match result {
                Ok(mut sample) => {
                    let altitude_ft = wp.altitude_ft.unwrap_or(default_altitude_ft);
                    if !apply_altitude_wind(&mut sample, altitude_ft) {
                        tracing::debug!("No vertical wind profile for {}, using surface wind", wp.id);
                    }
                    samples.insert(wp.id.clone(), sample);
                }
                Err(err) => {
                    tracing::warn!("Weather fetch failed for {}: {}", wp.id, err);
                    warnings.push(format!("weather for {}: {}", wp.id, err));
                }
            }
        }
        let snapshot = WeatherSnapshot::new(Utc::now(), samples);
        recompute_legs(&mut waypoints, tas_kt, &snapshot);

        let mut points = sample_route(&waypoints, sample_interval_nm)?;
        if !points.is_empty() {
            match self.elevation.fetch_elevations(&sample_positions(&points)).await {
                Ok(elevations) => attach_elevations(&mut points, &elevations),
                Err(err) => {
                    tracing::warn!("Elevation fetch failed, profile has no terrain: {}", err);
                    warnings.push(format!("terrain: {}", err));
                }
            }
        }

        let profile =
            fuse_profile_with_minimums(&waypoints, &snapshot, default_altitude_ft, &points, &self.minimums);
        let summary = summarize(&profile);
        let totals = route_totals(&waypoints);
        tracing::info!(
            "Planned {} waypoints, {:.1} NM, {} profile points, overall {:?}",
            waypoints.len(),
            totals.distance_nm,
            profile.len(),
            summary.overall
        );

        let etas = waypoint_etas(&waypoints, departure);
        let waypoints = waypoints
            .into_iter()
            .zip(etas)
            .map(|(waypoint, eta)| WaypointReport {
                has_weather: snapshot.get(&waypoint.id).is_some(),
                waypoint,
                eta,
            })
            .collect();

        Ok(PlanReport {
            name: route.name,
            generated_at: Utc::now(),
            departure,
            tas_kt,
            totals,
            waypoints,
            weather: snapshot,
            profile,
            summary,
            warnings,
        })
    }
}

fn validate(request: &PlanRequest) -> Result<(), PlanError> {
    if request.route.waypoints.is_empty() {
        return Err(PlanError::InvalidRoute("route has no waypoints".to_string()));
    }
    if !request.tas_kt.is_finite() || request.tas_kt <= 0.0 {
        return Err(PlanError::InvalidRoute(format!(
            "true airspeed must be positive, got {}",
            request.tas_kt
        )));
    }
    if !request.default_altitude_ft.is_finite() {
        return Err(PlanError::InvalidRoute("default altitude must be finite".to_string()));
    }
    if let Some(bad) = request.route.waypoints.iter().find(|wp| !wp.position.is_finite()) {
        return Err(PlanError::InvalidRoute(format!("waypoint {} has invalid coordinates", bad.id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vfr_core::Leg;

    fn leg(ete_min: Option<f64>) -> Option<Leg> {
        Some(Leg {
            bearing_deg: 0.0,
            distance_nm: 10.0,
            ground_speed_kt: 100.0,
            ete_min,
        })
    }

    #[test]
    fn etas_accumulate_leg_times() {
        let departure = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut wps = vec![
            Waypoint::new("A", 0.0, 0.0),
            Waypoint::new("B", 0.1, 0.0),
            Waypoint::new("C", 0.2, 0.0),
            Waypoint::new("D", 0.3, 0.0),
        ];
        wps[1].leg = leg(Some(30.0));
        wps[2].leg = leg(Some(15.5));
        wps[3].leg = leg(None);

        let etas = waypoint_etas(&wps, departure);
        assert_eq!(etas[0], Some(departure));
        assert_eq!(etas[1], Some(departure + TimeDelta::minutes(30)));
        assert_eq!(etas[2], Some(departure + TimeDelta::seconds(45 * 60 + 30)));
        assert_eq!(etas[3], None);
    }

    #[test]
    fn etas_past_the_calendar_are_unknown() {
        let departure = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut wps = vec![
            Waypoint::new("A", 0.0, 0.0),
            Waypoint::new("B", 0.1, 0.0),
            Waypoint::new("C", 0.2, 0.0),
        ];
        // Ten billion years, then anything after it.
        wps[1].leg = leg(Some(5.3e15));
        wps[2].leg = leg(Some(1.0));
        assert_eq!(waypoint_etas(&wps, departure), vec![Some(departure), None, None]);

        wps[1].leg = leg(Some(f64::MAX));
        assert_eq!(waypoint_etas(&wps, departure)[1], None);
        assert_eq!(offset_by_minutes(departure, f64::INFINITY), None);
    }

    #[test]
    fn validation_rejects_unusable_requests() {
        let request = |waypoints: Vec<Waypoint>, tas_kt: f64| PlanRequest {
            route: Route {
                name: None,
                waypoints,
            },
            tas_kt,
            default_altitude_ft: 4500.0,
            departure: Utc::now(),
            sample_interval_nm: 5.0,
        };
        assert!(validate(&request(vec![], 100.0)).is_err());
        assert!(validate(&request(vec![Waypoint::new("A", 0.0, 0.0)], 0.0)).is_err());
        assert!(validate(&request(vec![Waypoint::new("A", f64::NAN, 0.0)], 100.0)).is_err());
        assert!(validate(&request(vec![Waypoint::new("A", 0.0, 0.0)], 100.0)).is_ok());
    }
}
