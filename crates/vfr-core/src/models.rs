//! Core data models for VFR route planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feet per meter.
pub const METERS_TO_FEET: f64 = 3.28084;

/// Knots per meter/second.
pub const MPS_TO_KNOTS: f64 = 1.943_844;

/// A position on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    Airport,
    Vor,
    Ndb,
    Intersection,
    #[default]
    User,
}

/// Navigation figures for the leg that ends at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Initial great-circle bearing from the previous waypoint, degrees true
    pub bearing_deg: f64,
    pub distance_nm: f64,
    pub ground_speed_kt: f64,
    /// Estimated time en-route for this leg; absent when ground speed is zero
    pub ete_min: Option<f64>,
}

/// A route waypoint.
///
/// `leg` is derived by [`crate::navigation::recompute_legs`] and is always
/// `None` on the first waypoint of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    #[serde(default)]
    pub kind: WaypointKind,
    #[serde(flatten)]
    pub position: GeoPoint,
    /// Planned altitude in feet MSL
    #[serde(default)]
    pub altitude_ft: Option<f64>,
    /// Ground elevation in feet MSL
    #[serde(default)]
    pub elevation_ft: Option<f64>,
    #[serde(default)]
    pub leg: Option<Leg>,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            kind: WaypointKind::User,
            position: GeoPoint::new(lat, lon),
            altitude_ft: None,
            elevation_ft: None,
            leg: None,
        }
    }

    pub fn with_altitude(mut self, altitude_ft: f64) -> Self {
        self.altitude_ft = Some(altitude_ft);
        self
    }

    pub fn with_elevation(mut self, elevation_ft: f64) -> Self {
        self.elevation_ft = Some(elevation_ft);
        self
    }
}

/// A named, ordered list of waypoints as loaded from a plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub name: Option<String>,
    pub waypoints: Vec<Waypoint>,
}

/// Forecast wind at one pressure level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalWindSample {
    pub level: String,
    pub altitude_ft: f64,
    pub speed_kt: f64,
    /// Direction the wind blows from, degrees true
    pub direction_deg: f64,
}

/// Forecast weather at a single location and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub wind_speed_kt: Option<f64>,
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
    /// Pressure level the wind was resolved at, if altitude-specific
    #[serde(default)]
    pub wind_level: Option<String>,
    #[serde(default)]
    pub gust_kt: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub dew_point_c: Option<f64>,
    #[serde(default)]
    pub pressure_hpa: Option<f64>,
    /// Cloud base in meters AGL. `None` means clear sky, not missing data.
    #[serde(default)]
    pub cloud_base_m: Option<f64>,
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub visibility_km: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
    /// Sorted ascending by altitude
    #[serde(default)]
    pub vertical_winds: Vec<VerticalWindSample>,
}

impl WeatherSample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            wind_speed_kt: None,
            wind_direction_deg: None,
            wind_level: None,
            gust_kt: None,
            temperature_c: None,
            dew_point_c: None,
            pressure_hpa: None,
            cloud_base_m: None,
            humidity_pct: None,
            visibility_km: None,
            precipitation_mm: None,
            vertical_winds: Vec::new(),
        }
    }

    pub fn wind_reading(&self) -> WindReading {
        WindReading::from_knots(self.wind_speed_kt)
    }

    /// Cloud base in feet AGL, only when the forecast defines a usable base.
    pub fn cloud_base_ft_agl(&self) -> Option<f64> {
        self.cloud_base_m
            .filter(|base| base.is_finite() && *base > 0.0)
            .map(|base| base * METERS_TO_FEET)
    }
}

/// Wind speed reading that keeps "no data" distinct from "calm".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "knots", rename_all = "lowercase")]
pub enum WindReading {
    Unknown,
    Calm,
    Measured(f64),
}

impl WindReading {
    pub fn from_knots(speed_kt: Option<f64>) -> Self {
        match speed_kt {
            Some(speed) if !speed.is_finite() => Self::Unknown,
            Some(speed) if speed == 0.0 => Self::Calm,
            Some(speed) => Self::Measured(speed),
            None => Self::Unknown,
        }
    }

    /// Numeric speed; zero for both `Unknown` and `Calm`.
    pub fn knots(self) -> f64 {
        match self {
            Self::Measured(speed) => speed,
            Self::Unknown | Self::Calm => 0.0,
        }
    }

    pub fn as_option(self) -> Option<f64> {
        match self {
            Self::Measured(speed) => Some(speed),
            Self::Calm => Some(0.0),
            Self::Unknown => None,
        }
    }
}

/// Immutable per-refresh map of waypoint id to its forecast.
///
/// Refreshing weather means building a new snapshot; entries are never
/// merged into an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    fetched_at: DateTime<Utc>,
    samples: HashMap<String, WeatherSample>,
}

impl WeatherSnapshot {
    pub fn new(fetched_at: DateTime<Utc>, samples: HashMap<String, WeatherSample>) -> Self {
        Self { fetched_at, samples }
    }

    pub fn empty() -> Self {
        Self::new(Utc::now(), HashMap::new())
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn get(&self, waypoint_id: &str) -> Option<&WeatherSample> {
        self.samples.get(waypoint_id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// VFR condition tier. Assessed tiers order as `Poor > Marginal > Good`;
/// `Unknown` means required input was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionTier {
    Good,
    Marginal,
    Poor,
    Unknown,
}

impl ConditionTier {
    /// Rank of an assessed tier, `None` for `Unknown`.
    pub fn severity(self) -> Option<u8> {
        match self {
            Self::Good => Some(0),
            Self::Marginal => Some(1),
            Self::Poor => Some(2),
            Self::Unknown => None,
        }
    }

    /// The more severe of two tiers. An assessed tier wins over `Unknown`.
    pub fn worst(self, other: Self) -> Self {
        match (self.severity(), other.severity()) {
            (Some(a), Some(b)) if b > a => other,
            (Some(_), _) => self,
            (None, _) => other,
        }
    }
}

/// Classification result for one profile point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub tier: ConditionTier,
    pub reasons: Vec<String>,
}

impl Condition {
    pub fn new(tier: ConditionTier, reasons: Vec<String>) -> Self {
        Self { tier, reasons }
    }
}

/// One point of the fused altitude/terrain/weather profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub position: GeoPoint,
    /// Cumulative distance along the route, NM
    pub distance_nm: f64,
    /// Feet MSL
    pub altitude_ft: f64,
    /// Feet MSL
    pub terrain_ft: Option<f64>,
    /// Feet MSL; present only when the forecast had a cloud base
    pub cloud_base_ft: Option<f64>,
    /// Feet MSL; present only when the forecast had a cloud base
    pub cloud_top_ft: Option<f64>,
    /// Positive is headwind
    pub headwind_kt: f64,
    /// Positive is wind from the right
    pub crosswind_kt: f64,
    pub wind: WindReading,
    pub wind_direction_deg: f64,
    pub waypoint_id: Option<String>,
    /// Present only on waypoint points
    pub condition: Option<Condition>,
}

impl ProfilePoint {
    pub fn is_waypoint(&self) -> bool {
        self.waypoint_id.is_some()
    }
}
