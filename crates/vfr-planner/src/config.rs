//! Planner configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub weather_provider_url: String,
    pub elevation_provider_url: String,
    pub request_timeout_s: u64,
    pub elevation_max_points_per_request: usize,
    pub elevation_cache_ttl_s: u64,
    pub elevation_cache_max_entries: usize,
    pub sample_interval_nm: f64,
    pub default_tas_kt: f64,
    pub default_altitude_ft: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_provider_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            elevation_provider_url: "https://api.open-meteo.com/v1/elevation".to_string(),
            request_timeout_s: 15,
            elevation_max_points_per_request: 100,
            elevation_cache_ttl_s: 3600,
            elevation_cache_max_entries: 50_000,
            sample_interval_nm: 5.0,
            default_tas_kt: 100.0,
            default_altitude_ft: 4500.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            weather_provider_url: env::var("VFR_WEATHER_URL")
                .unwrap_or(defaults.weather_provider_url),
            elevation_provider_url: env::var("VFR_ELEVATION_URL")
                .unwrap_or(defaults.elevation_provider_url),
            request_timeout_s: parse_env("VFR_REQUEST_TIMEOUT_S").unwrap_or(defaults.request_timeout_s),
            elevation_max_points_per_request: parse_env("VFR_ELEVATION_MAX_POINTS")
                .unwrap_or(defaults.elevation_max_points_per_request),
            elevation_cache_ttl_s: parse_env("VFR_ELEVATION_CACHE_TTL_S")
                .unwrap_or(defaults.elevation_cache_ttl_s),
            elevation_cache_max_entries: parse_env("VFR_ELEVATION_CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.elevation_cache_max_entries),
            sample_interval_nm: parse_env::<f64>("VFR_SAMPLE_INTERVAL_NM")
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(defaults.sample_interval_nm),
            default_tas_kt: parse_env::<f64>("VFR_DEFAULT_TAS_KT")
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(defaults.default_tas_kt),
            default_altitude_ft: parse_env::<f64>("VFR_DEFAULT_ALTITUDE_FT")
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.default_altitude_ft),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
