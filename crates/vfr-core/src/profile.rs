//! Fusion of waypoints, forecast weather and sampled terrain into one
//! ordered altitude profile.

use crate::conditions::{classify_with_minimums, VfrMinimums};
use crate::interpolation::{bracket, lerp, lerp_angle};
use crate::models::{
    ConditionTier, GeoPoint, ProfilePoint, WeatherSample, WeatherSnapshot, Waypoint, WindReading,
};
use crate::navigation::{bearing_deg, crosswind_component, distance_nm, headwind_component};
use crate::sampler::SampledPoint;
use serde::{Deserialize, Serialize};

/// Assumed cloud layer thickness used to draw a cloud top. Not forecast data.
pub const CLOUD_THICKNESS_FT: f64 = 3000.0;

/// Per-waypoint values shared by every point on the profile.
struct RouteAxis {
    cumulative_nm: Vec<f64>,
    /// Bearing of the leg flown into each waypoint; `None` for the first
    incoming_track: Vec<Option<f64>>,
    altitude_ft: Vec<f64>,
}

impl RouteAxis {
    fn new(waypoints: &[Waypoint], default_altitude_ft: f64) -> Self {
        let mut cumulative_nm = Vec::with_capacity(waypoints.len());
        let mut incoming_track = Vec::with_capacity(waypoints.len());
        let mut total = 0.0;
        for (idx, wp) in waypoints.iter().enumerate() {
            if idx == 0 {
                cumulative_nm.push(0.0);
                incoming_track.push(None);
                continue;
            }
            let prev = waypoints[idx - 1].position;
            total += distance_nm(prev, wp.position);
            cumulative_nm.push(total);
            incoming_track.push(Some(bearing_deg(prev, wp.position)));
        }
        let altitude_ft = waypoints
            .iter()
            .map(|wp| wp.altitude_ft.filter(|a| a.is_finite()).unwrap_or(default_altitude_ft))
            .collect();
        Self {
            cumulative_nm,
            incoming_track,
            altitude_ft,
        }
    }
}

/// Wind values taken from one side of a leg.
struct SideWind {
    speed_kt: Option<f64>,
    direction_deg: Option<f64>,
    headwind_kt: Option<f64>,
    crosswind_kt: Option<f64>,
}

impl SideWind {
    fn from_sample(sample: &WeatherSample, track_deg: f64) -> Self {
        let speed = sample.wind_reading().as_option();
        let direction = sample.wind_direction_deg.filter(|d| d.is_finite());
        let components = speed.map(|s| {
            let dir = direction.unwrap_or(0.0);
            (
                headwind_component(track_deg, dir, s),
                crosswind_component(track_deg, dir, s),
            )
        });
        Self {
            speed_kt: speed,
            direction_deg: direction,
            headwind_kt: components.map(|c| c.0),
            crosswind_kt: components.map(|c| c.1),
        }
    }

    fn empty() -> Self {
        Self {
            speed_kt: None,
            direction_deg: None,
            headwind_kt: None,
            crosswind_kt: None,
        }
    }
}

/// Build the profile with the default VFR minimums.
pub fn fuse_profile(
    waypoints: &[Waypoint],
    weather: &WeatherSnapshot,
    default_altitude_ft: f64,
    samples: &[SampledPoint],
) -> Vec<ProfilePoint> {
    fuse_profile_with_minimums(waypoints, weather, default_altitude_ft, samples, &VfrMinimums::default())
}

/// Build the ordered profile for a route.
///
/// With terrain samples, the profile follows the samples (which include every
/// waypoint). Without them it has one point per waypoint. Only waypoint
/// points are classified.
pub fn fuse_profile_with_minimums(
    waypoints: &[Waypoint],
    weather: &WeatherSnapshot,
    default_altitude_ft: f64,
    samples: &[SampledPoint],
    minimums: &VfrMinimums,
) -> Vec<ProfilePoint> {
    if waypoints.is_empty() {
        return Vec::new();
    }
    let axis = RouteAxis::new(waypoints, default_altitude_ft);
    let fusion = Fusion {
        waypoints,
        weather,
        axis: &axis,
        minimums,
    };

    if samples.is_empty() {
        return waypoints
            .iter()
            .enumerate()
            .map(|(idx, wp)| {
                fusion.waypoint_point(idx, axis.cumulative_nm[idx], wp.elevation_ft, wp.position)
            })
            .collect();
    }

    samples
        .iter()
        .map(|sample| match sample.waypoint_index.filter(|idx| *idx < waypoints.len()) {
            Some(idx) => fusion.waypoint_point(
                idx,
                sample.distance_nm,
                sample.elevation_ft.or(waypoints[idx].elevation_ft),
                sample.position,
            ),
            None => fusion.terrain_point(sample),
        })
        .collect()
}

struct Fusion<'a> {
    waypoints: &'a [Waypoint],
    weather: &'a WeatherSnapshot,
    axis: &'a RouteAxis,
    minimums: &'a VfrMinimums,
}

impl Fusion<'_> {
    fn waypoint_point(
        &self,
        idx: usize,
        distance_nm: f64,
        terrain_ft: Option<f64>,
        position: GeoPoint,
    ) -> ProfilePoint {
        let wp = &self.waypoints[idx];
        let altitude_ft = self.axis.altitude_ft[idx];
        let sample = self.weather.get(&wp.id);
        let terrain_ft = terrain_ft.filter(|t| t.is_finite());

        let wind = sample.map(WeatherSample::wind_reading).unwrap_or(WindReading::Unknown);
        let wind_direction_deg = sample
            .and_then(|s| s.wind_direction_deg)
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);
        let (headwind_kt, crosswind_kt) = match self.axis.incoming_track[idx] {
            Some(track) => (
                headwind_component(track, wind_direction_deg, wind.knots()),
                crosswind_component(track, wind_direction_deg, wind.knots()),
            ),
            None => (0.0, 0.0),
        };

        let cloud_base_ft = sample
            .and_then(WeatherSample::cloud_base_ft_agl)
            .map(|agl| agl + terrain_ft.unwrap_or(0.0));

        let mut point = ProfilePoint {
            position,
            distance_nm,
            altitude_ft,
            terrain_ft,
            cloud_base_ft,
            cloud_top_ft: cloud_base_ft.map(|base| base + CLOUD_THICKNESS_FT),
            headwind_kt,
            crosswind_kt,
            wind,
            wind_direction_deg,
            waypoint_id: Some(wp.id.clone()),
            condition: None,
        };

        let is_terminal = idx == 0 || idx + 1 == self.waypoints.len();
        point.condition = Some(classify_with_minimums(
            &point,
            altitude_ft,
            sample,
            is_terminal,
            self.minimums,
        ));
        point
    }

    fn terrain_point(&self, sample: &SampledPoint) -> ProfilePoint {
        let b = bracket(&self.axis.cumulative_nm, sample.distance_nm);
        let (lo, hi, t) = if b.lower == b.upper {
            (b.lower, b.lower, 0.0)
        } else {
            (b.lower, b.upper, b.fraction)
        };

        let altitude_ft = lerp(
            Some(self.axis.altitude_ft[lo]),
            Some(self.axis.altitude_ft[hi]),
            t,
        )
        .unwrap_or(self.axis.altitude_ft[lo]);

        let track = self.axis.incoming_track[hi].unwrap_or_else(|| {
            self.waypoints
                .get(hi + 1)
                .map(|next| bearing_deg(self.waypoints[hi].position, next.position))
                .unwrap_or(0.0)
        });
        let side = |idx: usize| {
            self.weather
                .get(&self.waypoints[idx].id)
                .map(|s| SideWind::from_sample(s, track))
                .unwrap_or_else(SideWind::empty)
        };
        let lo_wind = side(lo);
        let hi_wind = side(hi);

        let speed = lerp(lo_wind.speed_kt, hi_wind.speed_kt, t);
        let direction = match (lo_wind.direction_deg, hi_wind.direction_deg) {
            (Some(a), Some(b)) => Some(lerp_angle(a, b, t)),
            (a, b) => a.or(b),
        };

        ProfilePoint {
            position: sample.position,
            distance_nm: sample.distance_nm,
            altitude_ft,
            terrain_ft: sample.elevation_ft.filter(|e| e.is_finite()),
            cloud_base_ft: None,
            cloud_top_ft: None,
            headwind_kt: lerp(lo_wind.headwind_kt, hi_wind.headwind_kt, t).unwrap_or(0.0),
            crosswind_kt: lerp(lo_wind.crosswind_kt, hi_wind.crosswind_kt, t).unwrap_or(0.0),
            wind: WindReading::from_knots(speed),
            wind_direction_deg: direction.unwrap_or(0.0),
            waypoint_id: None,
            condition: None,
        }
    }
}

/// Route-level roll-up of a fused profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Worst assessed tier; `Unknown` only when no waypoint could be assessed
    pub overall: ConditionTier,
    pub good: usize,
    pub marginal: usize,
    pub poor: usize,
    pub unknown: usize,
    pub max_terrain_ft: Option<f64>,
    /// Smallest altitude above terrain anywhere on the profile
    pub min_terrain_clearance_ft: Option<f64>,
}

pub fn summarize(points: &[ProfilePoint]) -> ProfileSummary {
    let mut summary = ProfileSummary {
        overall: ConditionTier::Unknown,
        good: 0,
        marginal: 0,
        poor: 0,
        unknown: 0,
        max_terrain_ft: None,
        min_terrain_clearance_ft: None,
    };

    for point in points {
        if let Some(terrain) = point.terrain_ft {
            summary.max_terrain_ft = Some(summary.max_terrain_ft.map_or(terrain, |m| m.max(terrain)));
            let clearance = point.altitude_ft - terrain;
            summary.min_terrain_clearance_ft = Some(
                summary
                    .min_terrain_clearance_ft
                    .map_or(clearance, |m| m.min(clearance)),
            );
        }

        let Some(condition) = &point.condition else {
            continue;
        };
        match condition.tier {
            ConditionTier::Good => summary.good += 1,
            ConditionTier::Marginal => summary.marginal += 1,
            ConditionTier::Poor => summary.poor += 1,
            ConditionTier::Unknown => summary.unknown += 1,
        }
        summary.overall = summary.overall.worst(condition.tier);
    }

    summary
}
